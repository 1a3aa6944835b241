//! Job configuration: the document that tells docfill which template to
//! fill, where to write the result, and with which values.
//!
//! ```json
//! {
//!   "templateFilePath": "templates/cover-letter.docx",
//!   "outputFilePath": "out/acme-cover-letter.docx",
//!   "bookends": "%",
//!   "overwriteOutput": false,
//!   "placeholders": { "Company": "Acme", "Role": "Engineer" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::PlaceholderEngine;
use crate::models::{DEFAULT_BOOKEND, GenerationRequest, PlaceholderMap};
use crate::template::write_atomically;
use crate::{DocfillError, Result};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file_path: Option<PathBuf>,
    pub bookends: String,
    pub overwrite_output: bool,
    pub placeholders: PlaceholderMap,
}

/// A job as written on disk, where every key may be left out.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct JobFile {
    template_file_path: Option<PathBuf>,
    output_file_path: Option<PathBuf>,
    bookends: Option<String>,
    overwrite_output: Option<bool>,
    #[serde(default)]
    placeholders: PlaceholderMap,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            template_file_path: None,
            output_file_path: None,
            bookends: DEFAULT_BOOKEND.to_string(),
            overwrite_output: false,
            placeholders: PlaceholderMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobFormat {
    Json,
    Yaml,
}

impl JobFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => JobFormat::Yaml,
            _ => JobFormat::Json,
        }
    }
}

impl JobConfig {
    /// Read a job file. A file that does not exist yields the default job so
    /// the caller can fill in everything from the command line.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_defaults(path, DEFAULT_BOOKEND, false)
    }

    /// Like `load`, with `bookend` and `overwrite` standing in for the keys
    /// the file leaves out (or for the whole file when it does not exist).
    pub fn load_with_defaults(path: &Path, bookend: &str, overwrite: bool) -> Result<Self> {
        let file: JobFile = if path.exists() {
            debug!("Loading job from {}", path.display());
            let content = fs::read_to_string(path)?;
            match JobFormat::from_path(path) {
                JobFormat::Json => serde_json::from_str(&content)?,
                JobFormat::Yaml => serde_yaml::from_str(&content)?,
            }
        } else {
            debug!("No job file at {}, using defaults", path.display());
            JobFile::default()
        };

        Ok(Self {
            template_file_path: file.template_file_path,
            output_file_path: file.output_file_path,
            bookends: file.bookends.unwrap_or_else(|| bookend.to_string()),
            overwrite_output: file.overwrite_output.unwrap_or(overwrite),
            placeholders: file.placeholders,
        })
    }

    pub fn save(&self, path: &Path, overwrite: bool) -> Result<()> {
        let content = match JobFormat::from_path(path) {
            JobFormat::Json => serde_json::to_string_pretty(self)? + "\n",
            JobFormat::Yaml => serde_yaml::to_string(self)?,
        };
        write_atomically(path, overwrite, |file| {
            use std::io::Write;
            file.write_all(content.as_bytes())?;
            Ok(())
        })
    }

    /// A job for `template` with every placeholder it contains left empty and
    /// the output set to `<stem>-filled.<ext>` beside the template.
    pub fn from_template(template: &Path, bookend: &str) -> Result<Self> {
        let engine = PlaceholderEngine::new(bookend)?;
        let placeholders = engine.extract_placeholders(template)?;

        Ok(Self {
            template_file_path: Some(template.to_path_buf()),
            output_file_path: Some(default_output_path(template)),
            bookends: bookend.to_string(),
            overwrite_output: false,
            placeholders,
        })
    }

    /// Turn the job into an engine request; both paths are required.
    pub fn into_request(self) -> Result<GenerationRequest> {
        let template = self.template_file_path.ok_or_else(|| {
            DocfillError::Configuration("templateFilePath is not set".to_string())
        })?;
        let output = self.output_file_path.ok_or_else(|| {
            DocfillError::Configuration("outputFilePath is not set".to_string())
        })?;

        Ok(GenerationRequest::new(template, output)
            .with_bookend(self.bookends)
            .with_placeholders(self.placeholders)
            .with_overwrite(self.overwrite_output))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string())
}

pub fn default_output_path(template: &Path) -> PathBuf {
    let ext = template
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();
    template.with_file_name(format!("{}-filled.{}", file_stem(template), ext))
}

pub fn default_job_path(template: &Path) -> PathBuf {
    template.with_file_name(format!("{}.config.json", file_stem(template)))
}

/// Write `<stem>.config.json` beside `template` and return its path.
pub fn build_config_from_template(template: &Path, bookend: &str) -> Result<PathBuf> {
    let job = JobConfig::from_template(template, bookend)?;
    let path = default_job_path(template);
    job.save(&path, true)?;
    debug!(
        "Wrote job with {} placeholder(s) to {}",
        job.placeholders.len(),
        path.display()
    );
    Ok(path)
}
