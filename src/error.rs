use thiserror::Error;

/// Failure taxonomy for the fetch/action boundary. Aggregations never raise
/// these for ordinary data variation (empty series, zero volumes); bad records
/// are skipped at the point of use instead.
#[derive(Debug, Error)]
pub enum SimVizError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed payload from {endpoint}: {detail}")]
    Payload {
        endpoint: &'static str,
        detail: String,
    },

    #[error("action {action} rejected: {detail}")]
    Action { action: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, SimVizError>;
