use thiserror::Error;

/// Failure of a single upstream provider call.
///
/// The aggregator and comparison engine recover from every variant locally;
/// only single-provider lookups (event detail) surface it to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Decode(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised by lookups keyed on a normalized event id.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("invalid event id format: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
