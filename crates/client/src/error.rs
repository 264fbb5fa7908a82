use chess_core::board::BoardError;

/// Failure of a single request/response call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status. `message` is the server-supplied text when the
    /// body carried one.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        TransportError::Rejected {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Decode(e.to_string())
    }
}

/// Caller misuse and unhandled transport failures. Handled request failures
/// are reported through the controllers' outcome enums instead.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("No promotion choice is pending")]
    NoPromotionPending,

    #[error("No variation menu is open")]
    NoVariationMenu,

    #[error("Variation {index} is out of range ({count} available)")]
    VariationOutOfRange { index: usize, count: usize },

    #[error("No game is loaded in the replay view")]
    NoReplayLoaded,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
