use std::time::Duration;

/// Every way a session can end other than `quit` or a rejected secret.
/// All of them tear the connection down immediately.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection failure: {0}")]
    ConnectionFailure(#[from] std::io::Error),

    #[error("stream ended inside a command sequence ({pending} bytes pending)")]
    ProtocolTruncation { pending: usize },

    #[error("no input received for {0:?}")]
    IdleTimeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(String),

    #[error("invalid value {value:?} for [{section}] {key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

impl From<ini::ParseError> for ConfigError {
    fn from(err: ini::ParseError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
