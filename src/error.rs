use thiserror::Error;

/// Errors that can occur when converting an editor/backend flow document
/// into a canonical `FlowDocument`.
#[derive(Error, Debug, Clone)]
pub enum FlowConversionError {
    #[error("Failed to parse flow JSON: {0}")]
    JsonParse(String),

    #[error("Invalid flow data: {0}")]
    Validation(String),
}

/// Fatal initialization errors. These are the only errors that should be
/// surfaced to the end user as a visible message; everything else is
/// recoverable or absorbed.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to fetch the flow document: {0}")]
    FlowFetch(#[from] TransportError),

    #[error(transparent)]
    FlowConversion(#[from] FlowConversionError),

    #[error("No start node could be identified in the flow")]
    StartNodeNotFound,
}

/// Recoverable validation errors raised by the interaction handlers.
///
/// These never mutate conversation state; the embedding UI renders them
/// inline next to the offending control and lets the user retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error("Please fill in all required fields: {}", fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    #[error("Please enter a value")]
    EmptyInput,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
}

/// Errors from the backend gateway. All call sites treat these as
/// best-effort: they are logged and never alter local traversal state.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend responded with status {0}")]
    Status(u16),

    #[error("Transport is disabled")]
    Disabled,
}

/// Errors from the local session store. Best-effort as well: a failed
/// cache read or write is logged and ignored.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store entry could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
}
