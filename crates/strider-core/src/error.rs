use thiserror::Error;

/// Top-level error type for strider-core.
#[derive(Debug, Error)]
pub enum StriderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Leg error: {0}")]
    Leg(#[from] LegError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Duplicate leg name: {0}")]
    DuplicateLeg(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Per-leg setup errors.
///
/// These never abort the controller: the affected leg is disabled for its
/// lifetime and the error is kept on the leg for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegError {
    #[error("leg '{leg}' has no foot target assigned")]
    MissingFootTarget { leg: String },
}
