//! Bridge error types

use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while unpacking or dispatching a call.
///
/// Only malformed calls end up here. An invalid handle, an empty key or a
/// missing value are not errors; those paths return the caller's default.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Value has the wrong runtime type
    #[error("expected {expected}, got {actual}")]
    Type {
        expected: &'static str,
        actual: &'static str,
    },

    /// Number does not fit the target type
    #[error("{value} is not a valid {target}")]
    Range { target: &'static str, value: String },

    /// BigInt does not convert losslessly into 64 bits
    #[error("BigInt {value} does not fit in {target} without loss of precision")]
    LossyBigInt { target: &'static str, value: String },

    /// Problem with a specific call argument
    #[error("Invalid argument '{name}': {source}")]
    Argument {
        name: &'static str,
        #[source]
        source: Box<BridgeError>,
    },

    #[error("Unknown op: {0}")]
    UnknownOp(String),

    #[error("Op already registered: {0}")]
    DuplicateOp(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        BridgeError::Type { expected, actual }
    }

    pub fn argument(name: &'static str, source: BridgeError) -> Self {
        BridgeError::Argument {
            name,
            source: Box::new(source),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BridgeError::Internal(message.into())
    }

    /// Which script error constructor this maps to
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Type { .. } => ErrorKind::TypeError,
            BridgeError::Range { .. } | BridgeError::LossyBigInt { .. } => ErrorKind::RangeError,
            BridgeError::Argument { source, .. } => source.kind(),
            BridgeError::UnknownOp(_) | BridgeError::DuplicateOp(_) | BridgeError::Internal(_) => {
                ErrorKind::Error
            }
        }
    }

    pub fn to_js_error(&self) -> JsError {
        JsError::new(self.kind(), self.to_string())
    }
}

/// Script error constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Error => f.write_str("Error"),
            ErrorKind::TypeError => f.write_str("TypeError"),
            ErrorKind::RangeError => f.write_str("RangeError"),
        }
    }
}

/// An exception as seen by script code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsError {
    pub kind: ErrorKind,
    pub message: String,
}

impl JsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for JsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
