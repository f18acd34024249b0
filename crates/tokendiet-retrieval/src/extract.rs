// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text extraction from uploaded documents.
//!
//! PDF and plain text are supported. The MIME type is guessed from the file
//! extension; anything else is rejected with `UnsupportedDocument`.

use std::path::Path;

use tokendiet_core::TokenDietError;
use tracing::debug;

/// MIME type of PDF documents.
pub const MIME_PDF: &str = "application/pdf";
/// MIME type of plain-text documents.
pub const MIME_TEXT: &str = "text/plain";

/// Extract text from in-memory document bytes of the given MIME type.
///
/// `origin` names the document in error messages.
pub fn extract_text(bytes: &[u8], mime: &str, origin: &str) -> Result<String, TokenDietError> {
    match mime {
        MIME_PDF => {
            let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
                TokenDietError::Extraction {
                    path: origin.to_string(),
                    message: e.to_string(),
                }
            })?;
            debug!(origin, chars = text.chars().count(), "extracted PDF text");
            Ok(text)
        }
        MIME_TEXT => String::from_utf8(bytes.to_vec()).map_err(|e| TokenDietError::Extraction {
            path: origin.to_string(),
            message: format!("not valid UTF-8: {e}"),
        }),
        other => Err(TokenDietError::UnsupportedDocument {
            mime: other.to_string(),
        }),
    }
}

/// Guess the MIME type of a file from its extension.
pub fn detect_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read a file from disk and extract its text.
pub async fn extract_text_from_file(path: &Path) -> Result<String, TokenDietError> {
    let mime = detect_mime(path);
    // Reject before reading so unsupported files fail without I/O.
    if mime != MIME_PDF && mime != MIME_TEXT {
        return Err(TokenDietError::UnsupportedDocument { mime });
    }

    let origin = path.display().to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| TokenDietError::Extraction {
            path: origin.clone(),
            message: e.to_string(),
        })?;

    // PDF parsing is CPU-bound.
    let text = tokio::task::spawn_blocking(move || extract_text(&bytes, &mime, &origin))
        .await
        .map_err(|e| TokenDietError::Internal(format!("extraction task failed: {e}")))??;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text(b"Paris is the capital of France.", MIME_TEXT, "mem").unwrap();
        assert_eq!(text, "Paris is the capital of France.");
    }

    #[test]
    fn invalid_utf8_is_extraction_error() {
        let err = extract_text(&[0xff, 0xfe, 0x00], MIME_TEXT, "bad.txt").unwrap_err();
        assert!(matches!(err, TokenDietError::Extraction { path, .. } if path == "bad.txt"));
    }

    #[test]
    fn unsupported_mime_rejected() {
        let err = extract_text(b"\x89PNG", "image/png", "x.png").unwrap_err();
        assert!(matches!(err, TokenDietError::UnsupportedDocument { mime } if mime == "image/png"));
    }

    #[test]
    fn corrupt_pdf_is_extraction_error() {
        let err = extract_text(b"not a pdf", MIME_PDF, "broken.pdf").unwrap_err();
        assert!(matches!(err, TokenDietError::Extraction { .. }));
    }

    #[test]
    fn mime_detection_by_extension() {
        assert_eq!(detect_mime(Path::new("report.pdf")), MIME_PDF);
        assert_eq!(detect_mime(Path::new("notes.txt")), MIME_TEXT);
        assert_eq!(detect_mime(Path::new("photo.png")), "image/png");
        assert_eq!(detect_mime(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn reads_text_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "hello from disk").unwrap();
        assert_eq!(extract_text_from_file(&path).await.unwrap(), "hello from disk");
    }

    #[tokio::test]
    async fn unsupported_file_rejected_without_reading() {
        let err = extract_text_from_file(Path::new("/nonexistent/image.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenDietError::UnsupportedDocument { .. }));
    }
}
