//! Document text extraction for uploaded files.
//!
//! Plain text and markdown are decoded as UTF-8 and returned untouched. PDFs are
//! extracted page by page and normalized. Word documents are not supported.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, warn};

use crate::extraction::normalize::normalize_pdf_pages;
use crate::extraction::{ensure_min_chars, ExtractionError, ExtractionResult, MIN_PDF_LETTER_CHARS};

/// Upload format, detected from the declared filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    WordProcessor,
    Unknown,
}

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt" | "md" | "markdown" | "rtf") => DocumentFormat::PlainText,
            Some("pdf") => DocumentFormat::Pdf,
            Some("docx" | "doc" | "odt") => DocumentFormat::WordProcessor,
            _ => DocumentFormat::Unknown,
        }
    }
}

/// Extracts text from an uploaded document.
///
/// Never panics: decode failures and PDF parser faults both come back as `Parse`.
pub fn extract_document(bytes: &[u8], filename: &str) -> ExtractionResult {
    match DocumentFormat::from_filename(filename) {
        DocumentFormat::PlainText => {
            let text = decode_utf8(bytes)?;
            ensure_min_chars(text, 1, "The uploaded file is empty.")
        }
        DocumentFormat::Pdf => {
            let text = extract_pdf_text(bytes)?;
            ensure_min_chars(text, 1, "Could not extract any text from this PDF.")
        }
        DocumentFormat::WordProcessor => Err(ExtractionError::UnsupportedFormat(
            "Word documents are not supported. Please save the file as PDF or plain text and upload it again."
                .to_string(),
        )),
        DocumentFormat::Unknown => Err(ExtractionError::UnsupportedFormat(
            "Unsupported file format. Please upload a PDF, TXT, or MD file.".to_string(),
        )),
    }
}

/// Extracts a cover letter from a PDF upload. Only `.pdf` files are accepted and the
/// result must be long enough to plausibly be a letter.
pub fn extract_pdf_letter(bytes: &[u8], filename: &str) -> ExtractionResult {
    if DocumentFormat::from_filename(filename) != DocumentFormat::Pdf {
        return Err(ExtractionError::UnsupportedFormat(
            "Please upload a PDF file.".to_string(),
        ));
    }
    let text = extract_pdf_text(bytes)?;
    ensure_min_chars(
        text,
        MIN_PDF_LETTER_CHARS,
        "Could not extract text properly from this PDF.",
    )
}

fn decode_utf8(bytes: &[u8]) -> ExtractionResult {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ExtractionError::Parse(format!("file is not valid UTF-8 text: {e}")))
}

fn extract_pdf_text(bytes: &[u8]) -> ExtractionResult {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| {
        warn!("PDF parser panicked on a {} byte upload", bytes.len());
        ExtractionError::Parse("the PDF could not be read".to_string())
    })?
    .map_err(|e| ExtractionError::Parse(format!("the PDF could not be read: {e}")))?;

    if pages.is_empty() {
        return Err(ExtractionError::Parse("the PDF has no pages".to_string()));
    }
    debug!("Extracted {} PDF pages", pages.len());
    Ok(normalize_pdf_pages(&pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_filename("Letter.PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("jd.Md"), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_filename("notes.txt"), DocumentFormat::PlainText);
        assert_eq!(
            DocumentFormat::from_filename("cv.docx"),
            DocumentFormat::WordProcessor
        );
        assert_eq!(DocumentFormat::from_filename("archive.zip"), DocumentFormat::Unknown);
        assert_eq!(DocumentFormat::from_filename("no_extension"), DocumentFormat::Unknown);
    }

    #[test]
    fn test_plain_text_is_returned_unchanged() {
        let inputs = [
            "Dear Hiring Manager,\n\n  I am   excited to apply.\n",
            "# Senior Engineer\n\n- Rust\n- develop-\nment\nPage 1 of 2\n",
            "Unicode: naïve café — 日本語",
        ];
        for input in inputs {
            let text = extract_document(input.as_bytes(), "letter.txt").unwrap();
            assert_eq!(text, input);
        }
    }

    #[test]
    fn test_markdown_is_not_normalized() {
        let input = "develop-\nment";
        assert_eq!(extract_document(input.as_bytes(), "jd.md").unwrap(), input);
    }

    #[test]
    fn test_empty_plain_text_is_too_short() {
        let err = extract_document(b"  \n", "letter.txt").unwrap_err();
        assert!(matches!(err, ExtractionError::TooShort { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = extract_document(&[0xff, 0xfe, 0x00, 0xc3], "letter.txt").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[test]
    fn test_docx_is_unsupported() {
        let err = extract_document(b"PK\x03\x04", "letter.docx").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_unknown_format_is_unsupported() {
        let err = extract_document(b"data", "letter.bin").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_garbage_pdf_is_parse_error() {
        let inputs: [&[u8]; 3] = [b"", b"not a pdf at all", b"%PDF-1.4\n%%EOF"];
        for input in inputs {
            let err = extract_document(input, "letter.pdf").unwrap_err();
            assert!(
                matches!(err, ExtractionError::Parse(_)),
                "expected parse error, got {err:?}"
            );
        }
    }

    #[test]
    fn test_pdf_letter_rejects_other_extensions() {
        let err = extract_pdf_letter(b"Dear Hiring Manager", "letter.txt").unwrap_err();
        assert_eq!(err.to_string(), "Please upload a PDF file.");
    }

    #[test]
    fn test_pdf_letter_garbage_is_parse_error() {
        let err = extract_pdf_letter(b"garbage", "letter.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    /// Builds a minimal PDF with one Helvetica text line per entry, page by page.
    fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            String::new(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        let mut kids = Vec::new();
        for lines in pages {
            let page_id = objects.len() + 1;
            let mut content = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    content.push_str("0 -14 Td\n");
                }
                content.push_str(&format!("({line}) Tj\n"));
            }
            content.push_str("ET");
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
            kids.push(format!("{page_id} 0 R"));
        }
        objects[1] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        );

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_at = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }

    fn two_page_letter() -> Vec<u8> {
        pdf_with_pages(&[
            &["Dear team, I would love to develop-", "ment your platform."],
            &["Sincerely, Ada Lovelace"],
        ])
    }

    #[test]
    fn test_pdf_pages_are_normalized_and_joined() {
        let text = extract_document(&two_page_letter(), "letter.pdf").unwrap();
        assert!(text.starts_with("Dear team,"), "got {text:?}");
        assert!(text.contains("development your platform."), "got {text:?}");
        assert!(!text.contains("develop-"));
        assert!(text.ends_with("platform.\n\nSincerely, Ada Lovelace"), "got {text:?}");
    }

    #[test]
    fn test_pdf_letter_extracts_long_enough_letter() {
        let text = extract_pdf_letter(&two_page_letter(), "Letter.PDF").unwrap();
        assert!(text.chars().count() >= MIN_PDF_LETTER_CHARS);
        assert!(text.contains("Sincerely, Ada Lovelace"));
    }

    #[test]
    fn test_pdf_letter_with_little_text_is_too_short() {
        let pdf = pdf_with_pages(&[&["Hi there"]]);
        let err = extract_pdf_letter(&pdf, "letter.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::TooShort { min: MIN_PDF_LETTER_CHARS, .. }));
    }

    #[test]
    fn test_pdf_without_text_is_too_short() {
        let pdf = pdf_with_pages(&[&[]]);
        let err = extract_document(&pdf, "scan.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::TooShort { .. }), "got {err:?}");
    }
}
