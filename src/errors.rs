use std::fmt;

/// Error types for the parts of the engine that can actually fail.
///
/// The search itself never errors: running out of time degrades to a static
/// evaluation and an empty move list is reported as `None`. Only the edges
/// (FEN parsing, replaying game records, configuration) return these.
#[derive(Debug, Clone)]
pub enum ChessEngineError {
    /// Invalid chess position (bad FEN, unreachable board)
    InvalidPosition(String),
    /// Move is not legal in the position it was played in
    InvalidMove(String),
    /// Configuration error
    ConfigurationError(String),
    /// File I/O operation failed
    IoError(String),
    /// Validation error with context
    ValidationError {
        field: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ChessEngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChessEngineError::InvalidPosition(msg) => write!(f, "Invalid position: {}", msg),
            ChessEngineError::InvalidMove(msg) => write!(f, "Invalid move: {}", msg),
            ChessEngineError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            ChessEngineError::IoError(msg) => write!(f, "I/O error: {}", msg),
            ChessEngineError::ValidationError {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Validation failed for field '{}': got '{}', expected '{}'",
                    field, value, expected
                )
            }
        }
    }
}

impl std::error::Error for ChessEngineError {}

// Convenience type alias
pub type Result<T> = std::result::Result<T, ChessEngineError>;

impl From<std::io::Error> for ChessEngineError {
    fn from(error: std::io::Error) -> Self {
        ChessEngineError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for ChessEngineError {
    fn from(error: serde_json::Error) -> Self {
        ChessEngineError::ConfigurationError(format!("JSON serialization error: {}", error))
    }
}

impl From<chess::Error> for ChessEngineError {
    fn from(error: chess::Error) -> Self {
        ChessEngineError::InvalidPosition(error.to_string())
    }
}

// Helper macros for error creation
#[macro_export]
macro_rules! invalid_position {
    ($msg:expr) => {
        $crate::errors::ChessEngineError::InvalidPosition($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::ChessEngineError::InvalidPosition(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! invalid_move {
    ($msg:expr) => {
        $crate::errors::ChessEngineError::InvalidMove($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::ChessEngineError::InvalidMove(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::errors::ChessEngineError::ConfigurationError($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::ChessEngineError::ConfigurationError(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($field:expr, $value:expr, $expected:expr) => {
        $crate::errors::ChessEngineError::ValidationError {
            field: $field.to_string(),
            value: $value.to_string(),
            expected: $expected.to_string(),
        }
    };
}
