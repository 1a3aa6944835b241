use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::models::{GenerationReport, GenerationRequest, PlaceholderMap};
use crate::template::Template;
use crate::{DocfillError, Result};

/// Finds and fills `bookend`-delimited placeholders.
///
/// The same bookend string opens and closes a placeholder, so with the
/// default `%` a template names its fields like `%FirstName%`.
#[derive(Debug, Clone)]
pub struct PlaceholderEngine {
    bookend: String,
    token_regex: Regex,
}

impl PlaceholderEngine {
    pub fn new(bookend: &str) -> Result<Self> {
        if bookend.is_empty() {
            return Err(DocfillError::Validation("Bookend cannot be empty".to_string()));
        }
        let quoted = regex::escape(bookend);
        // Lazy so the enclosed text never contains the bookend itself.
        let token_regex = Regex::new(&format!("(?s){quoted}(.*?){quoted}"))
            .map_err(|e| DocfillError::Validation(format!("Invalid bookend '{}': {}", bookend, e)))?;

        Ok(Self {
            bookend: bookend.to_string(),
            token_regex,
        })
    }

    /// The literal token a placeholder name appears as in a template.
    pub fn token(&self, name: &str) -> String {
        format!("{}{}{}", self.bookend, name, self.bookend)
    }

    /// Collect the distinct placeholder names in `text`, trimmed, in order of
    /// first appearance, each mapped to an empty value.
    pub fn scan(&self, text: &str) -> PlaceholderMap {
        let mut found = PlaceholderMap::new();
        for captures in self.token_regex.captures_iter(text) {
            let Some(inner) = captures.get(1) else {
                continue;
            };
            let name = inner.as_str().trim();
            if !name.is_empty() && !found.contains(name) {
                found.insert(name, "");
            }
        }
        found
    }

    #[instrument(skip(self), fields(bookend = %self.bookend))]
    pub fn extract_placeholders(&self, template_path: &Path) -> Result<PlaceholderMap> {
        let template = Template::open(template_path)?;
        let document = template.load()?;
        let placeholders = self.scan(&document.content());

        debug!(
            "Extracted {} placeholder(s) from {}",
            placeholders.len(),
            template_path.display()
        );
        Ok(placeholders)
    }

    /// Replace every `bookend + key + bookend` in each block with its value.
    /// Replacement is literal, so values are never rescanned for tokens.
    fn fill_block(&self, block: &str, placeholders: &PlaceholderMap, counts: &mut [usize]) -> String {
        let mut filled = block.to_string();
        for (i, (name, value)) in placeholders.iter().enumerate() {
            let token = self.token(name);
            let hits = filled.matches(token.as_str()).count();
            if hits > 0 {
                counts[i] += hits;
                filled = filled.replace(token.as_str(), value);
            }
        }
        filled
    }

    /// Keys that never matched a token in the template, or whose token is
    /// still present in the written output. Mapping order, no duplicates.
    fn unmatched(&self, output: &str, placeholders: &PlaceholderMap, counts: &[usize]) -> Vec<String> {
        placeholders
            .names()
            .zip(counts)
            .filter(|(name, hits)| **hits == 0 || output.contains(self.token(name).as_str()))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    #[instrument(skip(self, request), fields(template = %request.template_path.display(), output = %request.output_path.display()))]
    pub fn substitute(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        let template = Template::open(&request.template_path)?;

        if !request.overwrite && request.output_path.exists() {
            return Err(DocfillError::OutputExists(request.output_path.clone()));
        }

        let document = template.load()?;
        let placeholders = &request.placeholders;
        let mut counts = vec![0usize; placeholders.len()];
        let filled = document.map_blocks(|block| self.fill_block(block, placeholders, &mut counts));

        filled.save(&request.output_path, request.overwrite)?;

        let replacements: IndexMap<String, usize> = placeholders
            .names()
            .map(String::from)
            .zip(counts.iter().copied())
            .collect();
        let report = GenerationReport {
            output_path: request.output_path.clone(),
            kind: template.kind(),
            blocks: filled.blocks().len(),
            replacements,
        };

        let unmatched = self.unmatched(&filled.content(), placeholders, &counts);
        if !unmatched.is_empty() {
            warn!(
                "{} placeholder(s) unmatched in {}: {}",
                unmatched.len(),
                request.output_path.display(),
                unmatched.join(", ")
            );
            return Err(DocfillError::UnmatchedPlaceholders(unmatched));
        }

        info!(
            "Generated {} ({} {}s, {} replacement(s))",
            report.output_path.display(),
            report.blocks,
            report.kind.block_name(),
            report.total_replacements()
        );
        Ok(report)
    }
}

/// Extract the placeholders of the template at `template_path`.
pub fn extract_placeholders(template_path: &Path, bookend: &str) -> Result<PlaceholderMap> {
    PlaceholderEngine::new(bookend)?.extract_placeholders(template_path)
}

/// Generate the document described by `request` and verify every key was used.
pub fn substitute(request: &GenerationRequest) -> Result<GenerationReport> {
    PlaceholderEngine::new(&request.bookend)?.substitute(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(map: &PlaceholderMap) -> Vec<&str> {
        map.names().collect()
    }

    #[test]
    fn test_scan_trims_and_dedupes() {
        let engine = PlaceholderEngine::new("%").unwrap();
        let found = engine.scan("Dear % First Name %, from %City% to %City% and %First Name%.");
        assert_eq!(names(&found), vec!["First Name", "City"]);
        assert!(found.iter().all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn test_scan_discards_blank_tokens() {
        let engine = PlaceholderEngine::new("%").unwrap();
        let found = engine.scan("100%% sure, %   % nothing, %Name%");
        assert_eq!(names(&found), vec!["Name"]);
    }

    #[test]
    fn test_scan_is_lazy_and_non_overlapping() {
        let engine = PlaceholderEngine::new("%").unwrap();
        let found = engine.scan("%a%b%c%");
        // "%a%" consumes its closing bookend, leaving "b%c%" with a single token.
        assert_eq!(names(&found), vec!["a", "c"]);
    }

    #[test]
    fn test_scan_spans_lines() {
        let engine = PlaceholderEngine::new("%").unwrap();
        let found = engine.scan("Hello %Full\nName% there");
        assert_eq!(names(&found), vec!["Full\nName"]);
    }

    #[test]
    fn test_multi_char_bookend_is_literal() {
        let engine = PlaceholderEngine::new("{{").unwrap();
        let found = engine.scan("{{Name{{ and {{ Role {{ but not {Name}");
        assert_eq!(names(&found), vec!["Name", "Role"]);
        assert_eq!(engine.token("Name"), "{{Name{{");
    }

    #[test]
    fn test_regex_metacharacters_in_bookend() {
        let engine = PlaceholderEngine::new("$").unwrap();
        assert_eq!(names(&engine.scan("Pay $Amount$ by $Date$")), vec!["Amount", "Date"]);
    }

    #[test]
    fn test_empty_bookend_rejected() {
        let err = PlaceholderEngine::new("").unwrap_err();
        assert!(matches!(err, DocfillError::Validation(_)));
    }

    #[test]
    fn test_fill_block_is_literal() {
        let engine = PlaceholderEngine::new("%").unwrap();
        let map: PlaceholderMap = [("Name", "$1 \\d %Name%"), ("City", "Paris")].into_iter().collect();
        let mut counts = vec![0; 2];

        assert_eq!(engine.fill_block("%Name%!", &map, &mut counts), "$1 \\d %Name%!");
        assert_eq!(counts, vec![1, 0]);
    }

    #[test]
    fn test_unmatched_reports_unused_and_leftover_keys() {
        let engine = PlaceholderEngine::new("%").unwrap();
        let map: PlaceholderMap = [("Name", "Alice"), ("City", "Paris"), ("Role", "%Role%")]
            .into_iter()
            .collect();

        let unmatched = engine.unmatched("Alice %Role%", &map, &[1, 0, 1]);
        assert_eq!(unmatched, vec!["City".to_string(), "Role".to_string()]);
    }
}
