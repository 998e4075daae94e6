/// Smallest chunk a provider will stage: room for one surrogate pair.
pub const MIN_CHUNK_UNITS: usize = 2;

/// Chunk-sizing configuration shared by all providers.
///
/// Resources that expose contiguous storage
/// ([`TextResource::as_contiguous`](crate::TextResource::as_contiguous)) are
/// served as a single zero-copy chunk by read-only providers and ignore these
/// options. Everything else is copied into the provider's chunk buffer:
/// short texts in one piece, long texts through a sliding window that is
/// widened or narrowed so that it starts and ends on composed-sequence
/// boundaries.
///
/// # Examples
///
/// ```rust
/// use textbridge::ProviderOptions;
///
/// let options = ProviderOptions {
///     chunk_units: 64,
///     ..Default::default()
/// };
/// assert_eq!(options.whole_text_limit, 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProviderOptions {
    /// Size of the staging window for texts longer than `whole_text_limit`.
    ///
    /// Values below [`MIN_CHUNK_UNITS`] are treated as [`MIN_CHUNK_UNITS`].
    /// A borrowing provider never stages more than its caller buffer holds.
    ///
    /// # Default
    ///
    /// `256`
    pub chunk_units: usize,

    /// Texts of at most this many code units are staged as a single chunk.
    ///
    /// # Default
    ///
    /// `1024`
    pub whole_text_limit: usize,

    #[cfg(any(test, feature = "fuzzing"))]
    #[cfg_attr(feature = "serde", serde(skip))]
    /// Re-check the chunk and length invariants after every operation and
    /// panic when they do not hold.
    ///
    /// Enabled only in test and fuzzing builds.
    pub check_invariants: bool,
}

impl ProviderOptions {
    pub(crate) fn window(&self) -> usize {
        self.chunk_units.max(MIN_CHUNK_UNITS)
    }
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            chunk_units: 256,
            whole_text_limit: 1024,
            #[cfg(any(test, feature = "fuzzing"))]
            check_invariants: false,
        }
    }
}
