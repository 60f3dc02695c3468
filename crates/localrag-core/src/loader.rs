//! Document loader.
//!
//! Walks a directory for `.txt`, `.md`, `.pdf` and `.docx` files in sorted
//! order and extracts their plain text. Files that fail to parse are
//! reported as `Error::Parse`, which `load_all` logs and skips.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extract;
use crate::traits::DocumentLoader;
use crate::types::{Document, DocumentFormat};

#[derive(Debug, Clone)]
pub struct TextLoader {
    root: PathBuf,
}

impl TextLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every supported file under the root. Files that fail to parse or
    /// yield no text are skipped with a warning; only an unreadable root is
    /// an error.
    pub fn load_all(&self) -> Result<Vec<Document>> {
        if !self.root.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document directory {} does not exist", self.root.display()),
            )));
        }
        let files = self.list_files();
        if files.is_empty() {
            tracing::warn!(dir = %self.root.display(), "no supported documents found");
            return Ok(vec![]);
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, path) in files.iter().enumerate() {
            tracing::debug!("Loading file {}/{}: {}", file_index + 1, files.len(), path.display());
            match self.load(path) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping document"),
            }
        }
        tracing::info!("Loaded {} of {} files from {}", documents.len(), files.len(), self.root.display());
        Ok(documents)
    }

    fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| format_of(p).is_some())
            .collect();
        files.sort();
        files
    }

    fn read_file_content(path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        let source = path.to_string_lossy().to_string();
        let format = format_of(path).ok_or_else(|| Error::Parse {
            path: source.clone(),
            reason: "unsupported file extension".into(),
        })?;
        let (text, pages) = match format {
            DocumentFormat::Text | DocumentFormat::Markdown => (Self::read_file_content(path)?, None),
            DocumentFormat::Pdf => {
                let (text, pages) = extract::pdf_text(path)?;
                (text, Some(pages))
            }
            DocumentFormat::Docx => (extract::docx_text(path)?, None),
        };
        if text.trim().is_empty() {
            return Err(Error::Parse { path: source, reason: "no text extracted".into() });
        }
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let size = text.chars().count();
        let mut doc = Document::new(source, text, format)
            .with_meta("filename", file_name)
            .with_meta("size", size.to_string());
        if let Some(pages) = pages {
            doc = doc.with_meta("pages", pages.to_string());
        }
        Ok(doc)
    }
}

fn format_of(path: &Path) -> Option<DocumentFormat> {
    path.extension().and_then(|s| s.to_str()).and_then(DocumentFormat::from_extension)
}
