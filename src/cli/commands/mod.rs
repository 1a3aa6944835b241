pub mod extract;
pub mod generate;
pub mod init;

use clap::ArgMatches;
use docfill::config::Config;

/// `--bookend` when given, otherwise the configured default.
pub(crate) fn bookend_from(matches: &ArgMatches, settings: &Config) -> String {
    matches
        .get_one::<String>("bookend")
        .cloned()
        .unwrap_or_else(|| settings.defaults.bookend.clone())
}
