use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the message can be shown without leaking driver internals.
    pub fn is_display_safe(&self) -> bool {
        match self {
            Self::Database(_)
            | Self::Network(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Anyhow(_) => false,
            Self::InvalidInput(_) | Self::Config(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_display_safe() {
            self.to_string()
        } else {
            match self {
                Self::Database(_) => "Local storage operation failed".to_string(),
                Self::Network(_) => "Network request failed".to_string(),
                Self::Serialization(_) => "Stored data could not be read".to_string(),
                Self::Io(_) => "File operation failed".to_string(),
                _ => "Operation failed".to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_string_hides_internal_errors() {
        let err = AppError::from(anyhow::anyhow!("sqlite at /home/user/secret.db is locked"));
        assert!(!err.is_display_safe());
        assert_eq!(err.to_safe_string(), "Operation failed");
    }

    #[test]
    fn test_safe_string_keeps_user_errors() {
        let err = AppError::config("classes endpoint is empty");
        assert!(err.is_display_safe());
        assert_eq!(
            err.to_safe_string(),
            "Configuration error: classes endpoint is empty"
        );
    }

    #[test]
    fn test_serialization_error_conversion() {
        let parse = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err: AppError = parse.into();
        assert!(matches!(err, AppError::Serialization(_)));
        assert_eq!(err.to_safe_string(), "Stored data could not be read");
    }
}
