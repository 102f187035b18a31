//! Document loading: bytes on disk → ordered per-page chunks.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

const FORM_FEED: char = '\u{000C}';

/// One page of extracted text. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub page_number: u32,
}

impl Chunk {
    /// Empty and whitespace-only pages carry nothing worth embedding.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub trait PageExtractor: Send + Sync {
    /// Page texts in document order; blank pages are kept so numbering holds.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, RagError>;
}

pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, RagError> {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| RagError::Document(format!("PDF extraction error: {}", e)))
    }
}

/// UTF-8 text; form feeds separate pages.
pub struct PlainTextExtractor;

impl PageExtractor for PlainTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, RagError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RagError::Document(format!("text document is not UTF-8: {}", e)))?;
        Ok(text.split(FORM_FEED).map(str::to_string).collect())
    }
}

fn extractor_for(path: &Path) -> Result<Box<dyn PageExtractor>, RagError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfExtractor)),
        "txt" | "md" | "text" => Ok(Box::new(PlainTextExtractor)),
        other => Err(RagError::Document(format!(
            "unsupported document type '{}' for {}",
            other,
            path.display()
        ))),
    }
}

pub fn pages_to_chunks(pages: Vec<String>) -> Vec<Chunk> {
    pages
        .into_iter()
        .zip(1u32..)
        .map(|(text, page_number)| Chunk { text, page_number })
        .collect()
}

/// Reads the document once and splits it into page chunks. Extraction runs
/// on the blocking pool.
pub async fn load_chunks(path: &Path) -> Result<Vec<Chunk>, RagError> {
    let extractor = extractor_for(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RagError::Document(format!("Failed to read {}: {}", path.display(), e)))?;

    let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                RagError::Document("document parser panicked".to_string())
            } else {
                RagError::internal(e)
            }
        })??;

    Ok(pages_to_chunks(pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn page_numbers_start_at_one_and_keep_blank_pages() {
        let chunks = pages_to_chunks(vec!["first".into(), "".into(), "third".into()]);
        let numbers: Vec<u32> = chunks.iter().map(|c| c.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(chunks[1].is_blank());
    }

    #[test]
    fn whitespace_only_is_blank() {
        let chunk = Chunk {
            text: " \n\t ".into(),
            page_number: 1,
        };
        assert!(chunk.is_blank());
    }

    #[test]
    fn plain_text_splits_on_form_feed() {
        let pages = PlainTextExtractor
            .extract_pages("Router power light is off\u{000C}\u{000C}Reset it".as_bytes())
            .unwrap();
        assert_eq!(pages, vec!["Router power light is off", "", "Reset it"]);
    }

    #[test]
    fn invalid_pdf_bytes_are_a_document_error() {
        let err = PdfExtractor.extract_pages(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, RagError::Document(_)));
    }

    #[tokio::test]
    async fn load_chunks_reads_text_files() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");
        write!(file, "page one\u{000C}page two").unwrap();

        let chunks = load_chunks(file.path()).await.unwrap();

        assert_eq!(
            chunks,
            vec![
                Chunk {
                    text: "page one".into(),
                    page_number: 1
                },
                Chunk {
                    text: "page two".into(),
                    page_number: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn pdf_pages_are_numbered_from_one_and_blank_pages_kept() {
        let fixture =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/router_manual.pdf");

        let chunks = load_chunks(&fixture).await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page_number, 1);
        assert!(chunks[0].text.contains("Router power light is off"));
        assert_eq!(chunks[1].page_number, 2);
        assert!(chunks[1].is_blank());
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_before_reading() {
        let err = load_chunks(Path::new("/nonexistent/manual.docx"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported document type"));
    }

    #[tokio::test]
    async fn missing_file_is_a_document_error() {
        let err = load_chunks(Path::new("/nonexistent/manual.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Document(_)));
    }
}
