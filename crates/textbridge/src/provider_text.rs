//! The reverse adapter: a provider viewed as a string resource.

use core::{fmt, ops::Range};

use crate::{
    error::Result,
    provider::TextProvider,
    resource::{MutableTextResource, TextResource},
};

/// Presents any [`TextProvider`] as a [`TextResource`].
///
/// Reads go through [`TextProvider::extract`] and edits through
/// [`TextProvider::replace`], so a read-only provider yields a resource whose
/// [`replace_units`](MutableTextResource::replace_units) fails with
/// [`ProviderError::NotWritable`](crate::ProviderError::NotWritable).
///
/// ```rust
/// use std::sync::Arc;
///
/// use textbridge::{ProviderText, TextResource, bind_immutable};
///
/// let units: Vec<u16> = "wrapped".encode_utf16().collect();
/// let text = ProviderText::new(bind_immutable(Arc::new(units)));
/// assert_eq!(text.len_utf16(), 7);
/// assert_eq!(text.to_string(), "wrapped");
/// ```
#[derive(Debug)]
pub struct ProviderText<P> {
    provider: P,
}

impl<P> ProviderText<P> {
    /// Wraps `provider`.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the wrapped provider, e.g. to drive chunk access
    /// directly.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Unwraps the provider.
    pub fn into_inner(self) -> P {
        self.provider
    }
}

impl<'a, P: TextProvider<'a>> TextResource for ProviderText<P> {
    fn len_utf16(&self) -> usize {
        self.provider.native_length()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        let range = start..start.saturating_add(dest.len());
        self.provider.extract(range, dest).map(|_| ())
    }
}

impl<'a, P: TextProvider<'a>> MutableTextResource for ProviderText<P> {
    fn replace_units(&mut self, range: Range<usize>, units: &[u16]) -> Result<()> {
        self.provider.replace(range, units).map(|_| ())
    }
}

impl<'a, P: TextProvider<'a>> fmt::Display for ProviderText<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_string_lossy().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
