//! Document extraction (plain text, Markdown, PDF) and context limiting.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DocumentError;
use crate::traits::DocumentExtractor;

/// Maximum characters of study text handed to the generator.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 3000;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text", "rst"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Picks an extractor by file extension: PDF, or text and Markdown.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExtractor;

#[async_trait]
impl DocumentExtractor for DefaultExtractor {
    async fn extract(&self, path: &Path) -> Result<String, DocumentError> {
        if extension(path) == "pdf" {
            PdfExtractor.extract(path).await
        } else {
            PlainTextExtractor.extract(path).await
        }
    }
}

/// Reads UTF-8 text and Markdown files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, DocumentError> {
        let display = path.display().to_string();
        if !TEXT_EXTENSIONS.contains(&extension(path).as_str()) {
            return Err(DocumentError::Unsupported(display));
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: display.clone(),
                source,
            })?;

        if text.trim().is_empty() {
            return Err(DocumentError::Empty(display));
        }
        Ok(text)
    }
}

/// Reads the text layer of a PDF, page by page.
///
/// Scanned pages without a text layer contribute nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String, DocumentError> {
        let display = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: display.clone(),
                source,
            })?;

        let pdf_error = |message: String| DocumentError::Pdf {
            path: display.clone(),
            message,
        };
        let text = tokio::task::spawn_blocking(move || pdf_text(&bytes))
            .await
            .map_err(|e| pdf_error(e.to_string()))?
            .map_err(|e| pdf_error(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(DocumentError::Empty(display));
        }
        debug!(chars = text.chars().count(), "extracted pdf text");
        Ok(text)
    }
}

fn pdf_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    document.extract_text(&pages)
}

/// Keep at most `max_chars` characters, cutting on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("所有权与借用", 3), "所有权");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[tokio::test]
    async fn reads_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Ownership\nEach value has one owner.").unwrap();

        let text = PlainTextExtractor.extract(&path).await.unwrap();
        assert!(text.contains("one owner"));
    }

    /// A one-page PDF whose content stream draws `line`.
    fn single_page_pdf(line: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn reads_pdf_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.pdf");
        std::fs::write(&path, single_page_pdf("Ownership moves on assignment")).unwrap();

        let text = DefaultExtractor.extract(&path).await.unwrap();
        assert!(text.contains("Ownership moves on assignment"));
    }

    #[tokio::test]
    async fn default_extractor_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let notes = dir.path().join("notes.TXT");
        std::fs::write(&notes, "borrowing rules").unwrap();
        assert_eq!(DefaultExtractor.extract(&notes).await.unwrap(), "borrowing rules");

        let doc = dir.path().join("slides.docx");
        std::fs::write(&doc, b"PK").unwrap();
        assert!(matches!(
            DefaultExtractor.extract(&doc).await,
            Err(DocumentError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn rejects_broken_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.7 truncated").unwrap();

        assert!(matches!(
            PdfExtractor.extract(&path).await,
            Err(DocumentError::Pdf { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_unsupported_and_empty() {
        let dir = tempfile::tempdir().unwrap();

        let pdf = dir.path().join("slides.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        assert!(matches!(
            PlainTextExtractor.extract(&pdf).await,
            Err(DocumentError::Unsupported(_))
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "  \n").unwrap();
        assert!(matches!(
            PlainTextExtractor.extract(&empty).await,
            Err(DocumentError::Empty(_))
        ));

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            PlainTextExtractor.extract(&missing).await,
            Err(DocumentError::Io { .. })
        ));
    }
}
