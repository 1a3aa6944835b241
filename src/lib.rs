pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod models;
pub mod template;

pub use engine::{extract_placeholders, substitute, PlaceholderEngine};
pub use error::{DocfillError, ErrorKind, Result};
pub use job::{build_config_from_template, JobConfig};
pub use models::{GenerationReport, GenerationRequest, PlaceholderMap, TemplateKind};
