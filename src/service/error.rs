use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::align::AlignError;
use crate::dataset::DatasetError;
use crate::render::RenderError;
use crate::spectrum::FormatError;

/// Request-level failures, converted to the text bodies of the wire
/// protocol.
///
/// Parameter failures answer 200 with a `Param Error:` body; that shape
/// predates this implementation and is preserved for wire
/// compatibility.  Data-layer failures answer 404/500 with an `Error:`
/// body.
#[derive(Debug, thiserror::Error)]
pub enum SvcError {
    /// Malformed request parameters
    #[error("Param Error: {0}")]
    Param(String),

    /// The data layer exhausted all candidates
    #[error("Error: {0}")]
    NotFound(String),

    /// Any other data-layer failure
    #[error("Error: {0}")]
    Internal(String),
}

impl IntoResponse for SvcError {
    fn into_response(self) -> Response {
        let status = match &self {
            SvcError::Param(_) => StatusCode::OK,
            SvcError::NotFound(_) => StatusCode::NOT_FOUND,
            SvcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::warn!("request failed: {self}");
        (status, self.to_string()).into_response()
    }
}

impl From<DatasetError> for SvcError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::NotFound(m) => SvcError::NotFound(m),
            DatasetError::Id(e) => SvcError::Param(e.to_string()),
            DatasetError::UnknownContext(m) => SvcError::Param(format!("unknown context: {m}")),
            DatasetError::UnderconstrainedWildcard(m) => {
                SvcError::Param(format!("underconstrained wildcard: {m}"))
            }
            DatasetError::Format(e) => SvcError::Internal(e.to_string()),
            DatasetError::Catalog(e) => SvcError::Internal(e.to_string()),
        }
    }
}

impl From<AlignError> for SvcError {
    fn from(e: AlignError) -> Self {
        match e {
            AlignError::EmptyList => SvcError::Param("empty identifier list".into()),
            other => SvcError::Internal(other.to_string()),
        }
    }
}

impl From<RenderError> for SvcError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Invalid(m) => SvcError::Param(m),
            RenderError::Align(e) => e.into(),
            other => SvcError::Internal(other.to_string()),
        }
    }
}

impl From<FormatError> for SvcError {
    fn from(e: FormatError) -> Self {
        SvcError::Internal(e.to_string())
    }
}

impl From<std::io::Error> for SvcError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => SvcError::NotFound(e.to_string()),
            _ => SvcError::Internal(e.to_string()),
        }
    }
}
