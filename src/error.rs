//! Error types for the wordify library.

use std::io;
use thiserror::Error;

/// Result type alias for wordify operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during a conversion session.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The upload is not one of the supported file types (pdf, png, jpg).
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The uploaded blob cannot be parsed as its declared type.
    /// Fatal for the session; no partial output is produced.
    #[error("Source cannot be read: {0}")]
    SourceUnreadable(String),

    /// Error extracting native text from the PDF text layer.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error rasterizing a page for OCR.
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// Error from the OCR engine.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Document serialization failed. Fatal for the request.
    #[error("Document writer error: {0}")]
    Writer(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A session operation was called in the wrong state.
    #[error("Invalid session state: expected {expected}, session is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::SourceUnreadable(err.to_string()),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::TextExtract(err.to_string())
    }
}
