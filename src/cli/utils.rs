use anyhow::{Result, bail};
use chrono::format::{Item, StrftimeItems};

/// Split a `KEY=VALUE` argument. Only the first `=` separates; the value may
/// itself contain `=` or be empty.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{}'", raw);
    };
    if key.is_empty() {
        bail!("Placeholder name is empty in '{}'", raw);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Today's local date rendered with a strftime `format`. An unknown
/// specifier is an error rather than a formatting panic.
pub fn today(format: &str) -> Result<String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("Invalid date format '{}'", format);
    }
    Ok(chrono::Local::now().format(format).to_string())
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", count, word)
    }
}
