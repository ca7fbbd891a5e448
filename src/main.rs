//! actdoc - regenerate managed README sections

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use actdoc::config::{CONFIG_FILE, Config, SectionConfig, parse_section_arg};
use actdoc::{FsResources, LinkFormat, WriteMode};

#[derive(Parser)]
#[command(name = "actdoc")]
#[command(version, about = "Regenerate managed sections of a README", long_about = None)]
#[command(after_help = "EXAMPLES:
    actdoc                                  Update README.md from actdoc.toml
    actdoc --section usage=docs/usage.md    Update one section from a file
    actdoc --check                          Fail if README.md is out of date")]
struct Cli {
    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target document (overrides the configuration)
    #[arg(short, long, value_name = "FILE")]
    target: Option<PathBuf>,

    /// How bare URLs in Markdown sections are rewritten
    #[arg(long, value_enum)]
    link_format: Option<LinkFormat>,

    /// Section rendered from a Markdown file, as ID=PATH (repeatable)
    #[arg(short, long = "section", value_name = "ID=PATH", value_parser = parse_section_arg)]
    sections: Vec<SectionConfig>,

    /// Exit with status 1 if the target is out of date, without writing
    #[arg(long)]
    check: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(&cli) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> actdoc::Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(target) = &cli.target {
        config.target = Some(target.clone());
    }
    if let Some(link_format) = cli.link_format {
        config.link_format = Some(link_format);
    }
    config.sections.extend(cli.sections.iter().cloned());

    if config.sections.is_empty() {
        return Err(actdoc::Error::Config(
            "no sections configured; add [[sections]] to actdoc.toml or pass --section".into(),
        ));
    }

    let io = FsResources::new();
    let generator = config.generator(Arc::new(io))?;
    let mode = if cli.check { WriteMode::Check } else { WriteMode::Write };
    let target = config.target();
    let report = generator.generate_resource(&io, target, mode)?;

    if !cli.quiet {
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    }

    let status = match (cli.check, report.changed) {
        (true, true) => {
            if !cli.quiet {
                eprintln!("{} is out of date", target.display());
            }
            ExitCode::from(1)
        }
        (_, changed) => {
            if !cli.quiet {
                let state = if changed { "updated" } else { "up to date" };
                println!("{}: {state}", target.display());
            }
            ExitCode::SUCCESS
        }
    };
    Ok(status)
}

/// An explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> actdoc::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(CONFIG_FILE).exists() => Config::load(Path::new(CONFIG_FILE)),
        None => Ok(Config::default()),
    }
}
