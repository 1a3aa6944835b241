use std::fs;
use std::io::Write;
use std::path::Path;

use crate::Result;

/// A `.txt` template held as lines, each keeping its own terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainDocument {
    lines: Vec<String>,
}

impl PlainDocument {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_content(&content))
    }

    pub fn from_content(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(String::from).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn content(&self) -> String {
        self.lines.concat()
    }

    pub fn map_lines<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            lines: self.lines.iter().map(|line| f(line)).collect(),
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for line in &self.lines {
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}
