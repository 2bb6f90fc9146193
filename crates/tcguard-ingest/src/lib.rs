//! Ingestion: turn a URL, PDF or DOCX upload into whitespace-normalised contract text.

mod document;
mod html;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

pub use document::{docx_text, pdf_text};
pub use html::html_to_text;

pub const DEFAULT_MAX_PDF_PAGES: usize = 50;
pub const PREVIEW_CHARS: usize = 200;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Filename is required")]
    MissingFilename,
    #[error("Unsupported file type {0:?}. Only PDF and DOCX are supported.")]
    UnsupportedFileType(String),
    #[error("PDF too large: {pages} pages. Max allowed is {max}.")]
    TooManyPages { pages: usize, max: usize },
    #[error("failed to read PDF: {0}")]
    Pdf(String),
    #[error("failed to read DOCX: {0}")]
    Docx(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}")]
    Status { status: u16 },
    #[error("HTML cleanup failed: {0}")]
    Html(#[from] regex_lite::Error),
}

/// Collapse every whitespace run to a single space and trim.
pub fn sanitize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Response body shared by the ingestion endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub status: String,
    /// Length in characters.
    pub text_length: usize,
    pub preview: String,
    pub text: String,
}

impl IngestResult {
    pub fn success(text: String) -> Self {
        Self {
            status: "success".to_string(),
            text_length: text.chars().count(),
            preview: text.chars().take(PREVIEW_CHARS).collect(),
            text,
        }
    }
}

/// Extracts contract text from remote pages and uploaded documents.
pub struct Ingestor {
    client: reqwest::Client,
    max_pdf_pages: usize,
}

impl Ingestor {
    pub fn new(max_pdf_pages: usize) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            max_pdf_pages,
        })
    }

    pub fn max_pdf_pages(&self) -> usize {
        self.max_pdf_pages
    }

    /// Fetch a page and reduce its HTML to text.
    pub async fn extract_from_url(&self, url: &str) -> Result<String, IngestError> {
        info!(url = %url, "extracting text from url");
        let resp = self.client.get(url).send().await.inspect_err(|e| {
            error!(url = %url, error = %e, "url fetch failed");
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        let text = sanitize_text(&html_to_text(&body)?);
        info!(url = %url, chars = text.len(), "extracted text from url");
        Ok(text)
    }

    /// Dispatch on the (case-insensitive) file extension.
    pub fn extract_from_file(
        &self,
        filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, IngestError> {
        let filename = filename
            .filter(|f| !f.trim().is_empty())
            .ok_or(IngestError::MissingFilename)?;
        let lower = filename.to_ascii_lowercase();

        let raw = if lower.ends_with(".pdf") {
            info!(filename, bytes = bytes.len(), "extracting text from pdf");
            pdf_text(bytes, self.max_pdf_pages)?
        } else if lower.ends_with(".docx") {
            info!(filename, bytes = bytes.len(), "extracting text from docx");
            docx_text(bytes)?
        } else {
            return Err(IngestError::UnsupportedFileType(filename.to_string()));
        };

        let text = sanitize_text(&raw);
        info!(filename, chars = text.len(), "extracted text from file");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize_text("  Terms\n\n of\tService  "), "Terms of Service");
        assert_eq!(sanitize_text(" \n\t"), "");
    }

    #[test]
    fn result_preview_is_char_bounded() {
        let text = "é".repeat(250);
        let result = IngestResult::success(text.clone());
        assert_eq!(result.status, "success");
        assert_eq!(result.text_length, 250);
        assert_eq!(result.preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(result.text, text);

        let short = IngestResult::success("short".into());
        assert_eq!(short.preview, "short");
    }

    #[test]
    fn file_requires_name() {
        let ingestor = Ingestor::new(DEFAULT_MAX_PDF_PAGES).unwrap();
        assert!(matches!(
            ingestor.extract_from_file(None, b"data"),
            Err(IngestError::MissingFilename)
        ));
        assert!(matches!(
            ingestor.extract_from_file(Some("  "), b"data"),
            Err(IngestError::MissingFilename)
        ));
    }

    #[test]
    fn unsupported_extension_rejected() {
        let ingestor = Ingestor::new(DEFAULT_MAX_PDF_PAGES).unwrap();
        assert!(matches!(
            ingestor.extract_from_file(Some("terms.txt"), b"plain"),
            Err(IngestError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let ingestor = Ingestor::new(DEFAULT_MAX_PDF_PAGES).unwrap();
        assert!(matches!(
            ingestor.extract_from_file(Some("TERMS.PDF"), b"not a pdf"),
            Err(IngestError::Pdf(_))
        ));
        assert!(matches!(
            ingestor.extract_from_file(Some("Terms.DocX"), b"not a docx"),
            Err(IngestError::Docx(_))
        ));
    }

    #[tokio::test]
    async fn malformed_url_is_an_error() {
        let ingestor = Ingestor::new(DEFAULT_MAX_PDF_PAGES).unwrap();
        assert!(matches!(
            ingestor.extract_from_url("not a url").await,
            Err(IngestError::Http(_))
        ));
    }
}
