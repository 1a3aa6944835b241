use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{DocfillError, Result};

pub const DEFAULT_BOOKEND: &str = "%";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    PlainText,    // .txt, processed line by line
    RichDocument, // .docx / .doc, processed paragraph by paragraph
}

impl TemplateKind {
    /// Derive the kind from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("txt") => Ok(TemplateKind::PlainText),
            Some("docx") | Some("doc") => Ok(TemplateKind::RichDocument),
            _ => Err(DocfillError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn block_name(&self) -> &'static str {
        match self {
            TemplateKind::PlainText => "line",
            TemplateKind::RichDocument => "paragraph",
        }
    }
}

/// Placeholder name → replacement value, kept in insertion order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PlaceholderMap(IndexMap<String, String>);

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Re-inserting an existing key keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Names whose value is still empty, e.g. straight after extraction.
    pub fn unfilled(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Overlay `other` on top of this map; values from `other` win.
    pub fn merge(&mut self, other: PlaceholderMap) {
        for (name, value) in other.0 {
            self.0.insert(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for PlaceholderMap {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Everything one generation needs, passed by value into the engine.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    pub bookend: String,
    pub placeholders: PlaceholderMap,
    pub overwrite: bool,
}

impl GenerationRequest {
    pub fn new(template_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            output_path: output_path.into(),
            bookend: DEFAULT_BOOKEND.to_string(),
            placeholders: PlaceholderMap::new(),
            overwrite: false,
        }
    }

    pub fn with_bookend(mut self, bookend: impl Into<String>) -> Self {
        self.bookend = bookend.into();
        self
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderMap) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct GenerationReport {
    pub output_path: PathBuf,
    pub kind: TemplateKind,
    pub blocks: usize,
    pub replacements: IndexMap<String, usize>,
}

impl GenerationReport {
    pub fn total_replacements(&self) -> usize {
        self.replacements.values().sum()
    }
}
