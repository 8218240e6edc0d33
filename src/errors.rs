pub type AuthzResult<T> = Result<T, AuthzError>;

#[derive(thiserror::Error, Debug)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid context: {0}")]
    InvalidContext(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthzError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn invalid_context(message: impl Into<String>) -> Self {
        Self::InvalidContext(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short machine-readable tag, used by the CLI's JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::Forbidden(_) => "forbidden",
            AuthzError::InvalidContext(_) => "invalid_context",
            AuthzError::Configuration(_) => "configuration",
            AuthzError::Io(_) => "io",
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for AuthzError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        Self::InvalidContext(format!("{} at `{}`", err.inner(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_message_is_prefixed() {
        let err = AuthzError::forbidden("DeleteNote for role baseline");
        assert_eq!(err.to_string(), "forbidden: DeleteNote for role baseline");
        assert_eq!(err.kind(), "forbidden");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AuthzError = io.into();
        assert_eq!(err.kind(), "io");
    }
}
