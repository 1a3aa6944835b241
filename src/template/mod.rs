pub mod docx;
pub mod plain;

use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::models::TemplateKind;
use crate::{DocfillError, Result};

pub use docx::DocxPackage;
pub use plain::PlainDocument;

/// A template on disk whose existence and kind have been checked.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    kind: TemplateKind,
}

impl Template {
    /// Existence is checked before the extension so a missing `.pdf`
    /// reports `TemplateNotFound`.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocfillError::TemplateNotFound(path.to_path_buf()));
        }
        let kind = TemplateKind::from_path(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            kind,
        })
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn load(&self) -> Result<TemplateDocument> {
        debug!("Loading {:?} template {}", self.kind, self.path.display());
        match self.kind {
            TemplateKind::PlainText => Ok(TemplateDocument::Plain(PlainDocument::read(&self.path)?)),
            TemplateKind::RichDocument => Ok(TemplateDocument::Rich(DocxPackage::read(&self.path)?)),
        }
    }
}

/// Template contents as an ordered list of text blocks (lines or paragraphs).
#[derive(Debug, Clone)]
pub enum TemplateDocument {
    Plain(PlainDocument),
    Rich(DocxPackage),
}

impl TemplateDocument {
    pub fn blocks(&self) -> &[String] {
        match self {
            TemplateDocument::Plain(doc) => doc.lines(),
            TemplateDocument::Rich(doc) => doc.paragraphs(),
        }
    }

    /// Text used for placeholder scanning. Paragraphs are joined with `\n`.
    pub fn content(&self) -> String {
        match self {
            TemplateDocument::Plain(doc) => doc.content(),
            TemplateDocument::Rich(doc) => doc.paragraphs().join("\n"),
        }
    }

    pub fn map_blocks<F>(&self, f: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        match self {
            TemplateDocument::Plain(doc) => TemplateDocument::Plain(doc.map_lines(f)),
            TemplateDocument::Rich(doc) => TemplateDocument::Rich(doc.map_paragraphs(f)),
        }
    }

    pub fn write_to(&self, file: &mut File) -> Result<()> {
        match self {
            TemplateDocument::Plain(doc) => doc.write_to(file),
            TemplateDocument::Rich(doc) => doc.write_to(file),
        }
    }

    /// Write the document to `path` through a temporary sibling file that is
    /// renamed into place, so a failed write never leaves a partial file.
    pub fn save(&self, path: &Path, overwrite: bool) -> Result<()> {
        write_atomically(path, overwrite, |file| self.write_to(file))
    }
}

pub(crate) fn write_atomically<F>(path: &Path, overwrite: bool, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;

    if overwrite {
        tmp.persist(path).map_err(|e| DocfillError::Io(e.error))?;
    } else {
        tmp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == IoErrorKind::AlreadyExists {
                DocfillError::OutputExists(path.to_path_buf())
            } else {
                DocfillError::Io(e.error)
            }
        })?;
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_template() {
        let temp_dir = TempDir::new().unwrap();
        let err = Template::open(&temp_dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, DocfillError::TemplateNotFound(_)));
    }

    #[test]
    fn test_open_unsupported_template() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("letter.pdf");
        fs::write(&path, "%PDF-1.4").unwrap();

        let err = Template::open(&path).unwrap_err();
        assert!(matches!(err, DocfillError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rich_content_joins_paragraphs() {
        let doc = TemplateDocument::Rich(DocxPackage::from_paragraphs(&["%A", "B%"]).unwrap());
        assert_eq!(doc.content(), "%A\nB%");
        assert_eq!(doc.blocks().len(), 2);
    }

    #[test]
    fn test_save_refuses_to_clobber() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        fs::write(&path, "keep me").unwrap();

        let doc = TemplateDocument::Plain(PlainDocument::from_content("new"));
        let err = doc.save(&path, false).unwrap_err();
        assert!(matches!(err, DocfillError::OutputExists(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        doc.save(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_save_docx_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("letter.docx");

        let doc = TemplateDocument::Rich(DocxPackage::from_paragraphs(&["Hello", "World"]).unwrap());
        doc.save(&path, false).unwrap();

        let reloaded = Template::open(&path).unwrap().load().unwrap();
        assert_eq!(reloaded.blocks(), &["Hello", "World"]);
    }
}
