use std::io;

use thiserror::Error;

/// Everything that can go wrong in a run. The arithmetic itself never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AltsumError {
    #[error("invalid input for '{name}': '{value}' is not an integer")]
    InvalidInput { name: String, value: String },

    #[error("input ended before '{name}' was read")]
    MissingInput { name: String },

    #[error("console I/O failed: {0}")]
    Io(String),

    #[error("gcd({a}, {b}) did not converge within {limit} subtraction steps")]
    GcdStepLimit { a: i64, b: i64, limit: u64 },

    #[error("invalid log filter: {0}")]
    InvalidLogFilter(String),
}

pub type AltsumResult<T> = Result<T, AltsumError>;

impl AltsumError {
    /// The closest `std::io::ErrorKind` for this error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AltsumError::InvalidInput { .. } | AltsumError::MissingInput { .. } => {
                io::ErrorKind::InvalidInput
            }
            AltsumError::Io(_) => io::ErrorKind::Other,
            AltsumError::GcdStepLimit { .. } => io::ErrorKind::TimedOut,
            AltsumError::InvalidLogFilter(_) => io::ErrorKind::InvalidInput,
        }
    }

    /// Name of the bound involved, if the error is about reading one.
    pub fn bound_name(&self) -> Option<&str> {
        match self {
            AltsumError::InvalidInput { name, .. } | AltsumError::MissingInput { name } => {
                Some(name)
            }
            _ => None,
        }
    }
}

impl From<io::Error> for AltsumError {
    fn from(err: io::Error) -> Self {
        AltsumError::Io(err.to_string())
    }
}

impl From<AltsumError> for io::Error {
    fn from(err: AltsumError) -> Self {
        io::Error::new(err.kind(), err.to_string())
    }
}

/// A one-line hint to print under an error, where there's something useful to say.
pub fn error_suggestion(error: &AltsumError) -> Option<&'static str> {
    match error {
        AltsumError::InvalidInput { .. } => {
            Some("Both bounds must be whole numbers in the signed 64-bit range, e.g. `1 4`.")
        }
        AltsumError::MissingInput { .. } => {
            Some("Provide two integers on standard input, separated by whitespace or newlines.")
        }
        AltsumError::GcdStepLimit { .. } => Some(
            "Subtraction GCD only converges for positive inputs; raise --gcd-limit or use positive bounds.",
        ),
        AltsumError::InvalidLogFilter(_) => {
            Some("Use a level (off, error, warn, info, debug, trace) or target=level pairs.")
        }
        AltsumError::Io(_) => None,
    }
}
