//! Errors and the status codes they map to
use thiserror::Error;

/// Every way an operation of this crate can fail. On error, no output buffer has been written.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("insufficient randomness: need {needed} bytes, got {actual}")]
    InsufficientRandomness { needed: usize, actual: usize },

    #[error("malformed key blob: {0}")]
    MalformedKey(String),

    #[error("internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The status code corresponding to this error
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidParameter(_) => Status::InvalidParameter,
            Error::InsufficientRandomness { .. } => Status::InsufficientRandomness,
            Error::MalformedKey(_) => Status::MalformedKey,
            Error::Internal(_) => Status::InternalError,
        }
    }
}

/// Flat status taxonomy with stable numeric codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    InvalidParameter = 1,
    InsufficientRandomness = 2,
    MalformedKey = 3,
    InternalError = 4,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Ok,
        Status::InvalidParameter,
        Status::InsufficientRandomness,
        Status::MalformedKey,
        Status::InternalError,
    ];

    /// Human-readable identifier of the status
    pub const fn name(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::InvalidParameter => "INVALID_PARAMETER",
            Status::InsufficientRandomness => "INSUFFICIENT_RANDOMNESS",
            Status::MalformedKey => "MALFORMED_KEY",
            Status::InternalError => "INTERNAL_ERROR",
        }
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Collapse the outcome of any operation into its status
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
