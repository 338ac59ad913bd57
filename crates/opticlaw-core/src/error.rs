use thiserror::Error;

/// Authorization failure raised by the policy gate.
///
/// Fatal to the handling of the current event and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionDenied {
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Capability {capability} requires tier {required}, got {actual}")]
    InsufficientTier {
        capability: String,
        required: u8,
        actual: u8,
    },
}

/// Top-level error type for the OptiClaw runtime.
///
/// Subsystem crates define their own error enums and wrap the variants they
/// share with this one through `#[from]`, so `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptiClawError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[from] PermissionDenied),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for OptiClawError {
    fn from(err: toml::de::Error) -> Self {
        OptiClawError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OptiClawError {
    fn from(err: toml::ser::Error) -> Self {
        OptiClawError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OptiClawError {
    fn from(err: serde_json::Error) -> Self {
        OptiClawError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for OptiClaw operations.
pub type Result<T> = std::result::Result<T, OptiClawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_display() {
        let err = PermissionDenied::UnsupportedSource("irc".to_string());
        assert_eq!(err.to_string(), "Unsupported source: irc");

        let err = PermissionDenied::InsufficientTier {
            capability: "tool.execute".to_string(),
            required: 1,
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "Capability tool.execute requires tier 1, got 0"
        );
    }

    #[test]
    fn test_permission_denied_conversion() {
        let err: OptiClawError = PermissionDenied::UnsupportedSource("irc".into()).into();
        assert!(matches!(err, OptiClawError::PermissionDenied(_)));
        assert_eq!(err.to_string(), "Permission denied: Unsupported source: irc");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OptiClawError = io_err.into();
        assert!(matches!(err, OptiClawError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: OptiClawError = parsed.unwrap_err().into();
        assert!(matches!(err, OptiClawError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: OptiClawError = parsed.unwrap_err().into();
        assert!(matches!(err, OptiClawError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<&'static str> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success")
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
