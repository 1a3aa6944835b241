use anyhow::Result;
use clap::ArgMatches;
use std::path::PathBuf;

use docfill::config::Config;
use docfill::extract_placeholders;

use super::bookend_from;
use crate::cli::utils::pluralize;

pub fn handle_extract(matches: &ArgMatches, settings: &Config) -> Result<()> {
    let template = matches.get_one::<PathBuf>("template").unwrap();
    let format = matches.get_one::<String>("format").unwrap();
    let bookend = bookend_from(matches, settings);

    let placeholders = extract_placeholders(template, &bookend)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&placeholders)?),
        "yaml" => print!("{}", serde_yaml::to_string(&placeholders)?),
        _ => {
            eprintln!(
                "🔍 {} in {}",
                pluralize("placeholder", placeholders.len()),
                template.display()
            );
            for name in placeholders.names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
