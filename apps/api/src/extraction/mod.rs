//! Text extraction: turns uploaded documents and scraped job postings into plain text.
//!
//! Every extractor returns an `ExtractionResult`. A successful result is never empty:
//! content under the caller's minimum length is reported as `TooShort`.

pub mod document;
pub mod handlers;
pub mod normalize;
pub mod scraper;

use thiserror::Error;

/// Minimum length of a scraped job posting, in characters.
pub const MIN_JOB_POSTING_CHARS: usize = 100;
/// Minimum length of text extracted from a PDF cover letter, in characters.
pub const MIN_PDF_LETTER_CHARS: usize = 50;

pub type ExtractionResult = Result<String, ExtractionError>;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid URL. Please provide a complete URL including http:// or https://")]
    InvalidUrl(String),

    #[error("Failed to access the URL. Status code: {0}")]
    HttpStatus(u16),

    #[error("Request timed out. The website took too long to respond.")]
    Timeout,

    #[error("Error accessing URL: {0}")]
    Network(String),

    #[error("{message}")]
    TooShort {
        chars: usize,
        min: usize,
        message: String,
    },

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("Error processing file: {0}")]
    Parse(String),
}

impl ExtractionError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::InvalidUrl(_) => "INVALID_URL",
            ExtractionError::HttpStatus(_) => "HTTP_ERROR",
            ExtractionError::Timeout => "TIMEOUT",
            ExtractionError::Network(_) => "NETWORK_ERROR",
            ExtractionError::TooShort { .. } => "TOO_SHORT",
            ExtractionError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ExtractionError::Parse(_) => "PARSE_ERROR",
        }
    }
}

/// Reclassifies blank or undersized text as `TooShort`.
pub(crate) fn ensure_min_chars(text: String, min: usize, message: &str) -> ExtractionResult {
    let chars = text.chars().count();
    if text.trim().is_empty() || chars < min {
        return Err(ExtractionError::TooShort {
            chars,
            min,
            message: message.to_string(),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_min_chars_rejects_blank() {
        let err = ensure_min_chars("   \n ".to_string(), 1, "empty").unwrap_err();
        assert!(matches!(err, ExtractionError::TooShort { min: 1, .. }));
        assert_eq!(err.to_string(), "empty");
    }

    #[test]
    fn test_ensure_min_chars_counts_chars_not_bytes() {
        // 4 chars, 8 bytes
        let text = "éééé".to_string();
        assert!(ensure_min_chars(text.clone(), 4, "short").is_ok());
        assert!(ensure_min_chars(text, 5, "short").is_err());
    }
}
