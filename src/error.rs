//! Error handling for pdfbind

use std::io;
use thiserror::Error;

/// The main error type for pdfbind operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input to a decoder (illegal character, bad end marker,
    /// out-of-range group). Non-recoverable for that stream.
    #[error("Format error: {0}")]
    Format(String),
    /// A filter or object was configured with parameters it does not support
    #[error("Invalid argument: {0}")]
    Argument(String),
    /// The document graph is inconsistent (dangling reference, missing root)
    #[error("Structure error: {0}")]
    Structure(String),
    /// I/O failure while writing output
    #[error("System error: {0}")]
    System(#[from] io::Error),
}

impl Error {
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        Error::Argument(msg.into())
    }
    pub fn structure<S: Into<String>>(msg: S) -> Self {
        Error::Structure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
