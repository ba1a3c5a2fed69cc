/// Errors raised while decoding, validating, or repacking spectrum records
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension or cell type the loader does not recognize
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Required column missing or non-monotonic wavelength axis
    #[error("malformed spectrum: {0}")]
    MalformedSpectrum(String),

    /// Structurally invalid serialized payload
    #[error("corrupt payload: {0}")]
    Corrupt(String),
}
