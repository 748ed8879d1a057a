use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Field key '{0}' is not defined")]
    FieldNotDefined(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ParamsError {
    pub(crate) fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ParamsError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
