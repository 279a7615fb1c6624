mod error;

pub use error::{ConfigError, DbError, ServiceError};

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
