use thiserror::Error;

/// The unified error type for pipeline configuration handling.
///
/// `Invalid` marks a persisted configuration that is absent, empty, or
/// fails baseline validation; it is always recoverable by regenerating the
/// document and never escapes `ensure_pipeline`. Everything else is
/// terminal for the invocation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {reason}")]
    Invalid { reason: String },

    #[error("failed to assemble pipeline configuration: {message}")]
    Generation { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Create a recoverable validation error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Create a terminal generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Whether regenerating the document can recover from this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_is_recoverable() {
        assert!(ConfigError::invalid("missing file").is_recoverable());
        assert!(!ConfigError::generation("bad step").is_recoverable());
    }

    #[test]
    fn error_messages_carry_reason() {
        let err = ConfigError::invalid("prefix mismatch");
        assert_eq!(err.to_string(), "configuration error: prefix mismatch");
    }
}
