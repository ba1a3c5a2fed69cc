/// Errors raised while packing, unpacking, or parsing identifiers
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// A bit-field constraint was violated during pack/unpack
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// The wire form of an identifier list could not be parsed
    #[error("unparseable identifier: {0}")]
    Unparseable(String),
}
