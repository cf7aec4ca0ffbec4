// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use vnloc::app_config::{self, Config, TranslationProvider};
use vnloc::app_controller::Controller;
use vnloc::script::Severity;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Mock,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Mock => TranslationProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register translation slots for every source script
    Extract,

    /// Translate up to LIMIT pending slots
    Translate {
        /// Maximum number of slots to translate
        #[arg(value_name = "LIMIT", default_value_t = 100)]
        limit: usize,

        /// Translation provider to use
        #[arg(short, long, value_enum)]
        provider: Option<CliTranslationProvider>,
    },

    /// Rebuild every source script from stored translations
    Build,

    /// List stale and untranslated slots
    Review {
        /// Accept the current translation of a stale slot, e.g. ch01/a.txt#12
        #[arg(long, value_name = "KEY")]
        accept: Vec<String>,
    },

    /// Write registry rows to a JSON file for hand editing
    Export {
        #[arg(value_name = "FILE")]
        output: PathBuf,

        /// Only rows of this file id
        #[arg(long)]
        file: Option<String>,
    },

    /// Apply edited rows from a JSON file
    Import {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show registry counts
    Stats,

    /// Generate shell completions for vnloc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vnloc - visual novel script localization
///
/// Extracts translatable text from visual novel scripts into a slot registry,
/// translates it, and rebuilds the scripts with their markup reinserted.
#[derive(Parser, Debug)]
#[command(name = "vnloc")]
#[command(version)]
#[command(about = "Visual novel script localization tool")]
#[command(long_about = "vnloc extracts dialogue from visual novel scripts, stores it as translation slots, and rebuilds localized scripts.

EXAMPLES:
    vnloc extract                      # Register slots for every script in original_dir
    vnloc translate 500                # Translate up to 500 pending slots
    vnloc review                       # List stale and untranslated slots
    vnloc export rows.json             # Export rows for hand editing
    vnloc import rows.json             # Apply edited rows
    vnloc build                        # Write localized scripts to translated_dir
    vnloc completions bash > vnloc.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Slot database path
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Model name to use for translation
    #[arg(short, long, env = "OPENAI_MODEL", global = true)]
    model: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("vnloc")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is lowered or raised once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "vnloc", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let log_level = cli
        .log_level
        .clone()
        .map(app_config::LogLevel::from)
        .unwrap_or(config.log_level);
    log::set_max_level(log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    run_command(&controller, cli.command).await
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(database) = &cli.database {
        config.pipeline.database_path = Some(database.clone());
    }
    if let Some(model) = &cli.model {
        config.translation.model = model.clone();
    }
    if let Commands::Translate {
        provider: Some(provider),
        ..
    } = &cli.command
    {
        config.translation.provider = provider.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Extract => {
            let summary = controller.extract().await?;
            if summary.count(Severity::Error) > 0 {
                warn!(
                    "{} lines could not be extracted, see the warnings above",
                    summary.count(Severity::Error)
                );
            }
        }
        Commands::Translate { limit, .. } => {
            let summary = controller.translate(limit).await?;
            info!(
                "Translated {} of {} slots ({} failed)",
                summary.translated, summary.requested, summary.failed
            );
        }
        Commands::Build => {
            let summary = controller.build().await?;
            if summary.excluded_lines() > 0 {
                warn!("{} lines were left out of the output", summary.excluded_lines());
            }
        }
        Commands::Review { accept } => {
            for key in &accept {
                controller.mark_reviewed(key)?;
            }
            let report = controller.review()?;
            for row in &report.stale {
                println!("STALE\t{}\t{}\t{}", row.key, row.original, row.translated);
            }
            for row in &report.untranslated {
                println!("PENDING\t{}\t{}", row.key, row.original);
            }
            info!(
                "{} stale, {} untranslated",
                report.stale.len(),
                report.untranslated.len()
            );
        }
        Commands::Export { output, file } => {
            let count = controller.export(&output, file.as_deref())?;
            info!("Success: {} rows written to {:?}", count, output);
        }
        Commands::Import { input } => {
            let summary = controller.import(&input)?;
            info!(
                "Applied {} rows, skipped {} with changed source",
                summary.applied, summary.mismatched
            );
        }
        Commands::Stats => {
            let stats = controller.stats()?;
            println!(
                "total: {}\ntranslated: {}\npending: {}\nstale: {}",
                stats.total, stats.translated, stats.pending, stats.stale
            );
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
