use anyhow::Result;
use clap::ArgMatches;
use std::path::PathBuf;
use tracing::{debug, warn};

use docfill::config::Config;
use docfill::{GenerationRequest, JobConfig, PlaceholderEngine, PlaceholderMap};

use crate::cli::utils::{parse_assignment, pluralize, today};

pub fn handle_generate(matches: &ArgMatches, settings: &Config) -> Result<()> {
    let request = build_request(matches, settings)?;

    let unfilled = request.placeholders.unfilled();
    if !unfilled.is_empty() {
        warn!("Placeholders with empty values: {}", unfilled.join(", "));
    }

    println!("📄 Template: {}", request.template_path.display());
    let report = docfill::substitute(&request)?;

    println!(
        "✅ Document '{}' generated successfully ({} in {})",
        report.output_path.display(),
        pluralize("replacement", report.total_replacements()),
        pluralize(report.kind.block_name(), report.blocks)
    );
    Ok(())
}

/// Job file, then command-line overrides, then the automatic date.
fn build_request(matches: &ArgMatches, settings: &Config) -> Result<GenerationRequest> {
    let job_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| settings.defaults.job_file.clone());

    let mut job = JobConfig::load_with_defaults(
        &job_path,
        &settings.defaults.bookend,
        settings.defaults.overwrite,
    )?;

    apply_overrides(&mut job, matches)?;
    let mut request = job.into_request()?;

    if !matches.get_flag("no-date") {
        fill_date(&mut request, settings)?;
    }
    Ok(request)
}

fn apply_overrides(job: &mut JobConfig, matches: &ArgMatches) -> Result<()> {
    if let Some(template) = matches.get_one::<PathBuf>("template") {
        job.template_file_path = Some(template.clone());
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        job.output_file_path = Some(output.clone());
    }
    if let Some(bookend) = matches.get_one::<String>("bookend") {
        job.bookends = bookend.clone();
    }
    if matches.get_flag("overwrite") {
        job.overwrite_output = true;
    }
    if let Some(assignments) = matches.get_many::<String>("set") {
        let overrides = assignments
            .map(|raw| parse_assignment(raw))
            .collect::<Result<PlaceholderMap>>()?;
        job.placeholders.merge(overrides);
    }
    Ok(())
}

/// Fill the date placeholder with today's date when the template uses it and
/// the job left it out.
fn fill_date(request: &mut GenerationRequest, settings: &Config) -> Result<()> {
    let name = settings.defaults.date_placeholder.as_str();
    if name.is_empty() || request.placeholders.contains(name) {
        return Ok(());
    }

    let engine = PlaceholderEngine::new(&request.bookend)?;
    let found = engine.extract_placeholders(&request.template_path)?;
    if found.contains(name) {
        let date = today(&settings.defaults.date_format)?;
        debug!("Filling {} with {}", engine.token(name), date);
        request.placeholders.insert(name, date);
    }
    Ok(())
}
