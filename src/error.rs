use thiserror::Error;

/// Application-level result used by the CLI, server and content loading.
pub type Result<T> = anyhow::Result<T>;

/// Failures caught at the API client boundary.
///
/// None of these escape the client: every operation folds them into an
/// [`Envelope`](crate::api::Envelope) carrying the rendered message.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is already the user-facing text.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// User input rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a model and enter horizon days")]
    MissingSelection,

    #[error("Please enter a valid number of horizon days (1 or more)")]
    InvalidHorizon,
}
