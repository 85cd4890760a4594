// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;

use subvocab::Controller;
use subvocab::app_config::{self, Config, EnhancementProvider};

/// CLI Wrapper for EnhancementProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliProvider> for EnhancementProvider {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Ollama => EnhancementProvider::Ollama,
            CliProvider::OpenAI => EnhancementProvider::OpenAI,
            CliProvider::Anthropic => EnhancementProvider::Anthropic,
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
    /// Import a tokenized subtitle document (JSON) into the database
    Import {
        /// Path to the tokenized subtitle JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Enhance the pending words of an imported subtitle
    Enhance {
        /// Subtitle id printed by `import`
        #[arg(value_name = "SUBTITLE_ID")]
        subtitle_id: i64,

        /// Sentences per batch (overrides the config)
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Generate vocabulary cards for raw subtitle text
    Agent {
        /// Subtitle text to study
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Check that the configured provider answers
    Check,

    /// Show database statistics
    Stats,

    /// Generate shell completions for subvocab
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    fn needs_provider(&self) -> bool {
        matches!(self, Commands::Enhance { .. } | Commands::Agent { .. } | Commands::Check)
    }
}

/// subvocab - Subtitle vocabulary enhancement with AI
///
/// Imports tokenized Japanese subtitles and fills in translations, meanings,
/// readings, JLPT levels and example sentences using AI providers.
#[derive(Parser, Debug)]
#[command(name = "subvocab")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered subtitle vocabulary enhancement")]
#[command(long_about = "subvocab turns tokenized subtitles into vocabulary study material using AI providers.

EXAMPLES:
    subvocab import episode01.json             # Import a tokenized subtitle
    subvocab enhance 1                         # Enhance pending words of subtitle 1
    subvocab -p ollama -m llama3.1 enhance 1   # Use specific provider and model
    subvocab enhance 1 --batch-size 5          # Five sentences per request
    subvocab agent \"猫が好きです\"              # One-off vocabulary cards
    subvocab completions bash > subvocab.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    ollama    - Local Ollama server")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Generation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliProvider>,

    /// Model name to use for generation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Target language code for translations and meanings (e.g., 'ko', 'en')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,
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

    // @returns: Emoji and ANSI colour for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("📘", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize with trace so the max level alone decides what is shown
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subvocab", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level.clone()).to_level_filter());
    }

    let config = load_config(&cli)?;
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    if let Err(e) = run(cli.command, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(provider) = &cli.provider {
        config.enhancement.provider = provider.clone().into();
    }
    if let Some(model) = &cli.model {
        config.enhancement.active_provider_config_mut().model = model.clone();
    }
    if let Some(target_language) = &cli.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(database) = &cli.database {
        config.database_path = Some(database.clone());
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    if cli.command.needs_provider() {
        config.validate().context("Configuration validation failed")?;
    }
    Ok(config)
}

async fn run(command: Commands, config: Config) -> Result<()> {
    let controller = Controller::with_config(config)?;

    match command {
        Commands::Import { file } => {
            let summary = controller.import_file(&file).await?;
            println!("{}", summary.subtitle_id);
        }
        Commands::Enhance { subtitle_id, batch_size } => {
            let report = controller.enhance(subtitle_id, batch_size).await?;
            info!(
                "Enhanced {} of {} pending words in {} batches ({:.1}s)",
                report.success_count,
                report.candidate_count,
                report.total_batches,
                report.elapsed.as_secs_f64()
            );
            for failure in &report.failures {
                error!(
                    "Batch {} (sentences {:?}) failed: {}",
                    failure.batch_number, failure.sentence_ids, failure.error
                );
            }
            println!("{}", report.success_count);
        }
        Commands::Agent { text } => {
            let state = controller.run_agent(&text).await?;
            let json = serde_json::to_string_pretty(&state.word_entries)
                .context("Failed to serialize word entries")?;
            println!("{}", json);
        }
        Commands::Check => {
            controller.check_provider().await?;
            info!("Provider is reachable");
        }
        Commands::Stats => {
            println!("{}", controller.stats()?);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
