use crate::catalog::CatalogError;
use crate::id::IdError;
use crate::spectrum::FormatError;

/// Errors that can occur during dataset operations
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Identifier pack/unpack/parse failure
    #[error(transparent)]
    Id(#[from] IdError),

    /// Spectrum decode or validation failure
    #[error(transparent)]
    Format(#[from] FormatError),

    /// External catalog failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// File locator exhausted every candidate path
    #[error("not found: {0}")]
    NotFound(String),

    /// Wildcard expansion with neither plate nor mjd pinned
    #[error("underconstrained wildcard: {0}")]
    UnderconstrainedWildcard(String),

    /// No dataset context registered under the requested name
    #[error("unknown context: {0}")]
    UnknownContext(String),
}
