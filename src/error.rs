//! The structured error taxonomy of this crate.
//!
//! Every fallible entry point returns [`Error`]. `main` sorts variants into
//! the three buckets of the error-handling design: user-input validation,
//! syntax and consistency errors are logged and the process still exits 0;
//! anything else (an [`Error::Io`] from a resource the process cannot run
//! without) propagates and exits non-zero.

use std::fmt;
use std::io;

/// A single error from any layer of the engine.
#[derive(Debug)]
pub enum Error {
    /// A user-supplied value failed validation (bad PC number, non-bag
    /// character, geometry not divisible by 4, missing CSV columns, ...).
    Validation(String),
    /// The wanted-save expression could not be tokenized or parsed.
    Syntax { expression: String, message: String },
    /// A regex literal inside a wanted-save expression does not compile.
    Regex { expression: String, message: String },
    /// The path table is internally inconsistent (e.g. a queue does not
    /// start with the expected leftover remainder, or a bag slice repeats
    /// a piece).
    Consistency { queue: String, message: String },
    /// A fumen string could not be decoded, or lacked the comment this
    /// crate relies on to attribute it to a save.
    Fumen { fumen: String, message: String },
    /// An internal invariant was violated; this should never happen and
    /// indicates a bug in this crate rather than bad input.
    Internal(String),
    /// Wraps an I/O error from a resource the caller cannot recover from
    /// (e.g. the log file itself could not be opened).
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{}", message),
            Self::Syntax { expression, message } => {
                write!(f, "could not parse wanted-save expression '{}': {}", expression, message)
            }
            Self::Regex { expression, message } => {
                write!(f, "invalid regex in expression '{}': {}", expression, message)
            }
            Self::Consistency { queue, message } => {
                write!(f, "path table inconsistent for queue '{}': {}", queue, message)
            }
            Self::Fumen { fumen, message } => write!(f, "fumen '{}': {}", fumen, message),
            Self::Internal(message) => write!(f, "internal error: {}", message),
            Self::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Validation(format!("could not read path table: {}", err))
    }
}

impl Error {
    /// `true` for the variants that the CLI prints and recovers from
    /// (exit code 0), `false` for the ones that should propagate.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}
