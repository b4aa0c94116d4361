use std::path::PathBuf;

/// Fatal error carried up to `main`, which prints it and exits with `exit_code`.
///
/// Exit codes:
/// - `2`: input, filesystem, or usage problem
/// - `3`: no data to work with
/// - `4`: internal failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A source file that could not be read or decoded.
///
/// Never fatal on its own: the pipeline skips the file and keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse '{}': {}", self.path.display(), self.message)
    }
}

impl std::error::Error for ParseError {}

/// A single field that failed canonicalization. The owning row is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingValue { column: &'static str },
    UnparseableDate { value: String },
    NonNumericPrice { column: &'static str, value: String },
    NegativePrice { column: &'static str, value: String },
    PriceOutOfRange { column: &'static str, value: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingValue { column } => {
                write!(f, "Missing required value: `{column}`")
            }
            ValidationError::UnparseableDate { value } => {
                write!(f, "Invalid `purchase-date` '{value}'")
            }
            ValidationError::NonNumericPrice { column, value } => {
                write!(f, "Non-numeric `{column}` '{value}'")
            }
            ValidationError::NegativePrice { column, value } => {
                write!(f, "Negative `{column}` '{value}'")
            }
            ValidationError::PriceOutOfRange { column, value } => {
                write!(f, "`{column}` '{value}' is too large to keep two decimal places")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
