//! Error taxonomy shared by the gateway, the framework and every adapter.

/// Errors that can occur while talking to a source or interpreting its payloads
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// Network failure, non-2xx status or an undecodable body
    #[error("Transport error (status {status:?}): {cause}")]
    Transport { status: Option<u16>, cause: String },

    /// Payload or locator shape not recognized
    #[error("Parse error: {message} [{locator}]")]
    Parse { message: String, locator: String },

    /// Empty result where at least one item was expected
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ParserError {
    pub fn transport(status: Option<u16>, cause: impl Into<String>) -> Self {
        Self::Transport {
            status,
            cause: cause.into(),
        }
    }

    pub fn parse(message: impl Into<String>, locator: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            locator: locator.into(),
        }
    }

    /// HTTP status attached to a transport failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ParserError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            status: e.status().map(|s| s.as_u16()),
            cause: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;
