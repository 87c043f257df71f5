use std::{path::Path, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::DocumentError;

/// A document picked by the operator. Content is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    file_name: String,
    mime_type: String,
    content: Arc<[u8]>,
}

impl DocumentFile {
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Result<Self, DocumentError> {
        let file_name = file_name.into();
        let content = content.into();
        if content.is_empty() {
            return Err(DocumentError::Empty { file_name });
        }
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime_type,
            content: content.into(),
        })
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Unreadable {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(file_name, content)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Encodes the document as a `data:` URL for local display.
    pub fn preview(&self) -> DocumentPreview {
        DocumentPreview {
            data_url: format!(
                "data:{};base64,{}",
                self.mime_type,
                STANDARD.encode(&self.content)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPreview {
    data_url: String,
}

impl DocumentPreview {
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn is_image(&self) -> bool {
        self.data_url.starts_with("data:image")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_content() {
        let err = DocumentFile::new("blank.pdf", Vec::new()).expect_err("empty must fail");
        assert!(matches!(err, DocumentError::Empty { file_name } if file_name == "blank.pdf"));
    }

    #[test]
    fn guesses_mime_type_from_name() {
        let doc = DocumentFile::new("scan.png", vec![1, 2, 3]).expect("document");
        assert_eq!(doc.mime_type(), "image/png");

        let doc = DocumentFile::new("notes", vec![1]).expect("document");
        assert_eq!(doc.mime_type(), "application/octet-stream");
    }

    #[test]
    fn preview_is_a_base64_data_url() {
        let doc = DocumentFile::new("id.jpg", b"hello".to_vec()).expect("document");
        let preview = doc.preview();
        assert_eq!(preview.data_url(), "data:image/jpeg;base64,aGVsbG8=");
        assert!(preview.is_image());

        let pdf = DocumentFile::new("form.pdf", b"%PDF".to_vec()).expect("document");
        assert!(!pdf.preview().is_image());
    }

    #[tokio::test]
    async fn missing_path_is_unreadable() {
        let err = DocumentFile::from_path("/definitely/not/here.pdf")
            .await
            .expect_err("missing file");
        assert!(matches!(err, DocumentError::Unreadable { .. }));
    }
}
