//! Error types for DishaNav

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DishaNav error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Actuator never confirmed completion of a commanded motion
    #[error("{what} did not complete within {waited_ms} ms")]
    MotionTimeout {
        /// Which motion stalled
        what: &'static str,
        /// How long we waited
        waited_ms: u64,
    },

    /// Actuator fault
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
