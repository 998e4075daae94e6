use alloc::{boxed::Box, rc::Rc};
use core::{
    cell::{Ref, RefCell},
    fmt,
    ops::{Neg, Range},
};

use super::{CLOSED, Ownership, TextProvider, extract_from};
use crate::{
    chunk::{ChunkBuffer, ChunkView},
    compose::composed_sequence_range,
    error::{ProviderError, Result, check_range},
    options::ProviderOptions,
    resource::{MutableTextResource, TextResource, copy_units},
    temp_buffer::TempBuffer,
};

/// Writable provider over a resource shared with the caller.
///
/// The caller keeps its own `Rc` and may read the resource between provider
/// calls. Holding a `RefCell` borrow across a provider call makes that call
/// fail with [`ProviderError::ResourceBusy`].
pub struct MutableProvider<R> {
    resource: Option<Rc<RefCell<R>>>,
    chunk: ChunkBuffer<'static>,
    native_length: usize,
    options: ProviderOptions,
}

/// Binds a mutable resource for reading and in-place replacement.
///
/// # Errors
///
/// [`ProviderError::ResourceBusy`] when the resource is mutably borrowed.
pub fn bind_mutable<R: MutableTextResource>(
    resource: Rc<RefCell<R>>,
) -> Result<MutableProvider<R>> {
    bind_mutable_with_options(resource, ProviderOptions::default())
}

/// [`bind_mutable`] with explicit chunking options.
///
/// # Errors
///
/// [`ProviderError::ResourceBusy`] when the resource is mutably borrowed.
pub fn bind_mutable_with_options<R: MutableTextResource>(
    resource: Rc<RefCell<R>>,
    options: ProviderOptions,
) -> Result<MutableProvider<R>> {
    let native_length = resource
        .try_borrow()
        .map_err(|_| ProviderError::ResourceBusy)?
        .len_utf16();
    tracing::debug!(native_length, ownership = ?Ownership::MutableOwning, "bound text resource");
    Ok(MutableProvider {
        resource: Some(resource),
        chunk: ChunkBuffer::owned(),
        native_length,
        options,
    })
}

impl<R: MutableTextResource> MutableProvider<R> {
    /// The shared resource, or `None` once closed.
    #[must_use]
    pub fn resource(&self) -> Option<&Rc<RefCell<R>>> {
        self.resource.as_ref()
    }

    fn borrow(&self) -> Result<Ref<'_, R>> {
        self.resource
            .as_ref()
            .ok_or(CLOSED)?
            .try_borrow()
            .map_err(|_| ProviderError::ResourceBusy)
    }

    #[cfg(any(test, feature = "fuzzing"))]
    fn verify(&self) {
        if !self.options.check_invariants {
            return;
        }
        self.chunk.assert_invariants(self.native_length);
        if let Ok(text) = self.borrow() {
            assert_eq!(
                text.len_utf16(),
                self.native_length,
                "cached length out of sync with resource"
            );
        }
    }

    #[cfg(not(any(test, feature = "fuzzing")))]
    fn verify(&self) {}
}

/// `inserted - removed` as a signed delta.
fn length_delta(removed: usize, inserted: usize) -> Option<isize> {
    if inserted >= removed {
        isize::try_from(inserted - removed).ok()
    } else {
        isize::try_from(removed - inserted).ok().map(Neg::neg)
    }
}

impl<'a, R: MutableTextResource + 'a> TextProvider<'a> for MutableProvider<R> {
    fn ownership(&self) -> Ownership {
        Ownership::MutableOwning
    }

    fn native_length(&self) -> usize {
        self.native_length
    }

    fn access(&mut self, native_index: usize, forward: bool) -> Result<bool> {
        let Some(resource) = &self.resource else {
            return Ok(false);
        };
        let text = resource
            .try_borrow()
            .map_err(|_| ProviderError::ResourceBusy)?;
        let more = self.chunk.access(
            &*text,
            self.native_length,
            native_index,
            forward,
            &self.options,
            false,
        )?;
        drop(text);
        self.verify();
        Ok(more)
    }

    fn chunk(&self) -> ChunkView<'_> {
        self.chunk.view(None)
    }

    fn extract(&self, range: Range<usize>, dest: &mut [u16]) -> Result<usize> {
        extract_from(&*self.borrow()?, self.native_length, range, dest)
    }

    fn replace(&mut self, range: Range<usize>, units: &[u16]) -> Result<isize> {
        let resource = self.resource.as_ref().ok_or(CLOSED)?;
        let len = self.native_length;
        check_range(&range, len)?;
        let delta = length_delta(range.len(), units.len())
            .ok_or(ProviderError::range(&range, len))?;

        resource
            .try_borrow_mut()
            .map_err(|_| ProviderError::ResourceBusy)?
            .replace_units(range.clone(), units)?;

        // Chunks that end at or before the edit still hold valid units.
        if self.chunk.native_limit() > range.start {
            self.chunk.invalidate();
        }
        self.native_length = len - range.len() + units.len();
        tracing::debug!(
            start = range.start,
            end = range.end,
            inserted = units.len(),
            native_length = self.native_length,
            "replaced range"
        );
        self.verify();
        Ok(delta)
    }

    fn copy(&mut self, range: Range<usize>, dest_index: usize, move_text: bool) -> Result<()> {
        let len = self.native_length;
        check_range(&range, len)?;
        if dest_index > len || (range.start < dest_index && dest_index < range.end) {
            return Err(ProviderError::OutOfRange {
                start: dest_index,
                end: dest_index,
                len,
            });
        }

        let staged = {
            let text = self.borrow()?;
            let mut staged = TempBuffer::zeroed(range.len())?;
            text.read_units(range.start, &mut staged)?;
            staged
        };

        if !move_text {
            self.replace(dest_index..dest_index, &staged)?;
        } else if dest_index <= range.start {
            self.replace(range.clone(), &[])?;
            self.replace(dest_index..dest_index, &staged)?;
        } else {
            self.replace(dest_index..dest_index, &staged)?;
            self.replace(range, &[])?;
        }
        Ok(())
    }

    fn composed_range(&self, index: usize) -> Result<Range<usize>> {
        composed_sequence_range(&*self.borrow()?, index)
    }

    fn clone_provider(&self, deep: bool) -> Result<Box<dyn TextProvider<'a> + 'a>> {
        let resource = self.resource.as_ref().ok_or(CLOSED)?;
        tracing::debug!(ownership = ?Ownership::MutableOwning, deep, "cloned provider");
        if deep {
            let units = copy_units(&*self.borrow()?, 0..self.native_length)?;
            let copy = bind_mutable_with_options(Rc::new(RefCell::new(units)), self.options)?;
            return Ok(Box::new(copy));
        }
        Ok(Box::new(MutableProvider {
            resource: Some(Rc::clone(resource)),
            chunk: ChunkBuffer::owned(),
            native_length: self.native_length,
            options: self.options,
        }))
    }

    fn close(&mut self) {
        if self.resource.take().is_none() {
            return;
        }
        self.chunk.release();
        self.native_length = 0;
        tracing::debug!(ownership = ?Ownership::MutableOwning, "closed provider");
    }

    fn is_closed(&self) -> bool {
        self.resource.is_none()
    }
}

impl<R> fmt::Debug for MutableProvider<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableProvider")
            .field("native_length", &self.native_length)
            .field(
                "chunk",
                &(self.chunk.native_start()..self.chunk.native_limit()),
            )
            .field("closed", &self.resource.is_none())
            .finish_non_exhaustive()
    }
}
