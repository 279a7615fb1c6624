use thiserror::Error;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Configuration errors. These abort the run before any job starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable '{name}' is required")]
    Missing {
        name: String,
    },

    #[error("Environment variable '{name}' has an invalid value '{value}': {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },

    #[error("We are not supporting the '{0}' file format")]
    UnsupportedFormat(String),

    #[error("'{0}' is not a valid write location")]
    UnsupportedDestination(String),
}

impl ConfigError {
    pub fn missing(name: &str) -> Self {
        Self::Missing {
            name: name.to_string(),
        }
    }

    pub fn invalid(name: &str, value: &str, reason: &str) -> Self {
        Self::Invalid {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Service-level errors surfaced to the operator
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_reaches_the_operator_unchanged() {
        let error: ServiceError = ConfigError::missing("DATABASE_URL").into();
        assert!(matches!(error, ServiceError::Config(ConfigError::Missing { .. })));
        assert_eq!(
            error.to_string(),
            "Configuration error: Environment variable 'DATABASE_URL' is required"
        );
    }
}
