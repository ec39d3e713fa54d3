//! PDF text extraction.
//!
//! `PdfTextExtractor` wraps `pdf-extract`, which walks the page tree in order
//! and concatenates each page's text. The library panics on some malformed
//! inputs, so every call is fenced with `catch_unwind`.

use std::panic;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("file is empty")]
    Empty,

    #[error("could not parse PDF: {0}")]
    Malformed(String),

    #[error("PDF contains no extractable text")]
    NoText,
}

/// Turns a binary document into plain text. Implementations must be pure:
/// the same bytes always yield the same result.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, content: &[u8]) -> Result<String, ExtractError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, content: &[u8]) -> Result<String, ExtractError> {
        if content.is_empty() {
            return Err(ExtractError::Empty);
        }

        let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(content))
            .map_err(|payload| ExtractError::Malformed(panic_message(payload.as_ref())))?
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;

        require_text(text)
    }
}

/// Only an empty string counts as "no text"; whitespace is passed through.
fn require_text(text: String) -> Result<String, ExtractError> {
    if text.is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "PDF parser panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::testing::minimal_pdf;

    #[test]
    fn test_extracts_text_from_single_page_pdf() {
        let pdf = minimal_pdf(&["Grace Hopper"]);
        let text = PdfTextExtractor.extract(&pdf).unwrap();
        assert!(text.contains("Grace"), "extracted: {text:?}");
        assert!(text.contains("Hopper"), "extracted: {text:?}");
    }

    #[test]
    fn test_pages_are_concatenated_in_order() {
        let pdf = minimal_pdf(&["Experience", "Education"]);
        let text = PdfTextExtractor.extract(&pdf).unwrap();
        let first = text.find("Experience").expect("page 1 text");
        let second = text.find("Education").expect("page 2 text");
        assert!(first < second);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let pdf = minimal_pdf(&["Rust", "Kubernetes"]);
        let a = PdfTextExtractor.extract(&pdf).unwrap();
        let b = PdfTextExtractor.extract(&pdf).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(PdfTextExtractor.extract(&[]), Err(ExtractError::Empty));
    }

    #[test]
    fn test_only_empty_text_counts_as_no_text() {
        assert_eq!(require_text(String::new()), Err(ExtractError::NoText));
        assert_eq!(require_text(" \n\t".to_string()), Ok(" \n\t".to_string()));
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        let err = PdfTextExtractor
            .extract(b"this is definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn test_panic_message_handles_both_payload_kinds() {
        let owned: Box<dyn std::any::Any + Send> = Box::new("boom".to_string());
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("bang");
        assert_eq!(panic_message(owned.as_ref()), "boom");
        assert_eq!(panic_message(borrowed.as_ref()), "bang");
    }
}
