use clap::{Arg, ArgAction, Command};
use docfill::config::Config;
use dotenv::dotenv;
use std::path::PathBuf;
use std::process;

mod cli;

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let matches = build_cli().get_matches();

    let settings = match Config::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    cli::init_logging(&settings.logging, matches.get_flag("verbose"));

    if let Err(e) = run_command(matches, &settings) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn bookend_arg() -> Arg {
    Arg::new("bookend")
        .short('b')
        .long("bookend")
        .help("Delimiter placed on both sides of a placeholder name (default from settings, usually %)")
}

fn build_cli() -> Command {
    Command::new("docfill")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fill placeholder tokens in .txt and .docx templates")
        .long_about(
            "Scans a template for placeholders such as %Name%, substitutes values from a job \
             configuration and verifies that every placeholder was replaced.",
        )
        .arg_required_else_help(true)
        .subcommand(
            Command::new("extract")
                .about("List the placeholders a template contains")
                .arg(
                    Arg::new("template")
                        .help("Template file (.txt, .docx, .doc)")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(bookend_arg())
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .help("Output format")
                        .value_parser(["plain", "json", "yaml"])
                        .default_value("plain"),
                ),
        )
        .subcommand(
            Command::new("init")
                .about("Create a job configuration from a template")
                .long_about(
                    "Extracts the template's placeholders into a job configuration with empty \
                     values, ready to be filled in and passed to 'generate'.",
                )
                .arg(
                    Arg::new("template")
                        .help("Template file (.txt, .docx, .doc)")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(bookend_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Where to write the job configuration (default: <template>.config.json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help("Replace an existing job configuration")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a document from a template and job configuration")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Job configuration file (default from settings, usually config.json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("template")
                        .long("template")
                        .help("Override the template path")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Override the output path")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(bookend_arg())
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .help("Replace the output file if it already exists")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("set")
                        .short('s')
                        .long("set")
                        .help("Set a placeholder value, e.g. --set Company=Acme")
                        .value_name("KEY=VALUE")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("no-date")
                        .long("no-date")
                        .help("Do not fill the date placeholder automatically")
                        .action(ArgAction::SetTrue),
                ),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}

fn run_command(matches: clap::ArgMatches, settings: &Config) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("extract", sub_matches)) => cli::commands::extract::handle_extract(sub_matches, settings)?,
        Some(("init", sub_matches)) => cli::commands::init::handle_init(sub_matches, settings)?,
        Some(("generate", sub_matches)) => cli::commands::generate::handle_generate(sub_matches, settings)?,
        _ => {
            unreachable!("Command parsing should ensure we never reach this");
        }
    }

    Ok(())
}
