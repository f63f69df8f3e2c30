//! Error types for timestamp conversion
//!
//! Only [`ConvertError`] is fatal. [`LineError`] and [`AnchorError`] describe
//! why a single line could not be used and are absorbed by the caller.

use thiserror::Error;

/// Fatal conversion errors
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("no reference line found: no line carries a parseable `{marker}` timestamp")]
    NoReferenceFound { marker: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fatal conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Why a `>[seconds.micros]` token could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("no `>[` token")]
    MissingToken,

    #[error("`>[` token is not closed by `]`")]
    UnclosedToken,

    #[error("token `{0}` is not of the form seconds.micros")]
    MalformedToken(String),

    #[error("invalid number `{0}` in token")]
    InvalidNumber(String),

    #[error("converted timestamp out of range")]
    Overflow,

    #[error("cannot render timestamp with format `{0}`")]
    Format(String),

    #[error("anchor line rejected: {0}")]
    Anchor(#[from] AnchorError),
}

/// Why a line carrying the marker could not serve as an anchor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("marker not present")]
    NoMarker,

    #[error("relative timestamp: {0}")]
    Token(Box<LineError>),

    #[error("no parenthesized date near the marker")]
    MissingDate,

    #[error("parenthesized date `{0}` is shorter than its tail")]
    DateTooShort(String),

    #[error("cannot parse date `{text}`: {reason}")]
    BadDate { text: String, reason: String },
}

impl From<LineError> for AnchorError {
    fn from(err: LineError) -> Self {
        AnchorError::Token(Box::new(err))
    }
}
