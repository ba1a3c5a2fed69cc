use crate::spectrum::FormatError;

/// Errors raised while computing spans or padding spectra
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Record decode or validation failure
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Span or alignment requested over an empty identifier list
    #[error("empty spectrum list")]
    EmptyList,

    /// Padded rows disagree in length and cannot stack
    #[error("aligned row {row} has length {len}, expected {expected}")]
    LengthMismatch {
        /// Index of the offending row
        row: usize,
        /// Its padded length
        len: usize,
        /// Length of the first row
        expected: usize,
    },
}
