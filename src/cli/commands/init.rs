use anyhow::Result;
use clap::ArgMatches;
use std::path::PathBuf;

use docfill::config::Config;
use docfill::job::{JobConfig, default_job_path};

use super::bookend_from;
use crate::cli::utils::pluralize;

pub fn handle_init(matches: &ArgMatches, settings: &Config) -> Result<()> {
    let template = matches.get_one::<PathBuf>("template").unwrap();
    let bookend = bookend_from(matches, settings);
    let force = matches.get_flag("force");
    let job_path = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| default_job_path(template));

    let mut job = JobConfig::from_template(template, &bookend)?;
    job.overwrite_output = settings.defaults.overwrite;
    job.save(&job_path, force)?;

    println!("✅ Wrote {}", job_path.display());
    println!(
        "📋 {} found in {}",
        pluralize("placeholder", job.placeholders.len()),
        template.display()
    );
    for name in job.placeholders.names() {
        println!("   • {}", name);
    }

    println!("\n🚀 Next steps:");
    println!("   1. Fill in the placeholder values in {}", job_path.display());
    println!("   2. Run 'docfill generate --config {}'", job_path.display());

    Ok(())
}
