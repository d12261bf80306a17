use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zoomclean::batch::{run_batch, BatchRequest};
use zoomclean::config::{self, CleanerConfig, Overrides, Settings};
use zoomclean::error::CleanError;
use zoomclean::ingest;
use zoomclean::output::{csv as csv_out, json as json_out, table};

#[derive(Parser)]
#[command(name = "zoomclean", version, about = "Zoom attendance cleaner: summary, roster and country reports from Zoom CSV exports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file (default: ~/.zoomclean/config.toml)
    #[arg(long, global = true, env = "ZOOMCLEAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a batch of Zoom exports and report per-session totals
    Process {
        /// Files, directories or glob patterns
        paths: Vec<String>,

        /// Comma-separated name fragments marking meeting panelists
        #[arg(long)]
        exclude: Option<String>,

        /// Output date format: iso (YYYY-MM-DD) or day-first (DD/MM/YYYY)
        #[arg(long)]
        date_format: Option<String>,

        /// Write CSV exports into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Omit the UTF-8 byte-order mark from CSV exports
        #[arg(long)]
        no_bom: bool,

        /// Reject files whose session date cannot be parsed
        #[arg(long)]
        strict_dates: bool,
    },

    /// Show how a single export is detected, without cleaning it
    Inspect {
        /// Path to a Zoom CSV export
        path: PathBuf,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented config template if none exists
    Init,
    /// Print the effective settings
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let config_path = match cli.config {
        Some(p) => p,
        None => config::default_config_path()?,
    };
    let file_config = CleanerConfig::load(&config_path)?;

    match cli.command {
        Commands::Process {
            paths,
            exclude,
            date_format,
            out_dir,
            no_bom,
            strict_dates,
        } => {
            if paths.is_empty() {
                bail!("No paths provided.");
            }

            let settings = Settings::resolve(
                &Overrides {
                    exclude,
                    date_format,
                    no_bom,
                    strict_dates,
                },
                &file_config,
            )?;

            let files = ingest::load_files(&ingest::collect_paths(&paths)?)?;
            eprintln!("Processing {} file{}...", files.len(), if files.len() == 1 { "" } else { "s" });

            let report = match run_batch(BatchRequest {
                files,
                options: settings.clean_options()?,
            }) {
                Ok(report) => report,
                Err(CleanError::NoProcessableFiles { warnings }) => {
                    table::print_warnings(&warnings);
                    bail!("Nothing to report: none of the files could be processed");
                }
                Err(e) => return Err(e).context("Nothing to report"),
            };

            if json_output {
                json_out::print_json(&json_out::batch_json(&report, settings.date_format))?;
                table::print_warnings(&report.warnings);
            } else {
                table::print_batch(&report, settings.date_format);
            }

            if let Some(dir) = out_dir {
                let written = csv_out::export_batch(&report, &dir, settings.date_format, settings.bom)?;
                eprintln!("Wrote {} file{} to {}", written.len(), if written.len() == 1 { "" } else { "s" }, dir.display());
            }
        }

        Commands::Inspect { path } => {
            let settings = Settings::resolve(&Overrides::default(), &file_config)?;
            let mut files = ingest::load_files(std::slice::from_ref(&path))?;
            let mut file = files.remove(0);
            let inspection = ingest::inspect(&mut file, &settings.clean_options()?)
                .with_context(|| format!("Cannot inspect {}", path.display()))?;

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "file": file.name(),
                    "kind": inspection.kind.label(),
                    "header_line": inspection.header_line + 1,
                    "topic": inspection.topic,
                    "raw_date": inspection.raw_date,
                    "date": settings.date_format.format(inspection.date),
                    "data_rows": inspection.data_rows,
                }))?;
            } else {
                table::print_inspection(file.name(), &inspection, settings.date_format);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init => {
                if config::init_config(&config_path)? {
                    println!("Created {}", config_path.display());
                } else {
                    println!("Config already exists: {}", config_path.display());
                }
            }
            ConfigAction::Show => {
                let settings = Settings::resolve(&Overrides::default(), &file_config)?;
                if json_output {
                    json_out::print_json(&serde_json::json!({
                        "config_path": config_path.display().to_string(),
                        "panelist_patterns": settings.panelist_patterns,
                        "topic_prefix": settings.topic_prefix,
                        "date_format": settings.date_format,
                        "bom": settings.bom,
                        "strict_dates": settings.strict_dates,
                    }))?;
                } else {
                    println!("# {}", config_path.display());
                    println!("{}", settings.display());
                }
            }
        },
    }

    Ok(())
}
