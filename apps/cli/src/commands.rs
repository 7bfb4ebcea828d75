//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use livingdoc_adapters::SourceSelection;
use livingdoc_core::{
    NormalizeOptions, NormalizeOutcome, PipelineStage, ProgressReporter, SystemClock, run_service,
};
use livingdoc_shared::{
    AppConfig, LivingDocError, SchemaKind, init_config, load_config, load_config_from, write_json,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// living-doc: normalize producer exports into PDF-ready living documentation.
#[derive(Parser)]
#[command(
    name = "living-doc",
    version,
    about = "Normalize living-documentation producer exports into a PDF-ready JSON document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.living-doc/living-doc.toml).
    #[arg(long, global = true, env = "LIVING_DOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Adapter choice for `--source`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum SourceArg {
    Auto,
    CollectorGh,
}

impl From<SourceArg> for SourceSelection {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Auto => SourceSelection::Auto,
            SourceArg::CollectorGh => SourceSelection::Named("collector-gh".to_string()),
        }
    }
}

/// Schema choice for `export-schema`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum SchemaArg {
    PdfReady,
    Audit,
}

impl From<SchemaArg> for SchemaKind {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::PdfReady => SchemaKind::PdfReady,
            SchemaArg::Audit => SchemaKind::Audit,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Normalize a collector export into the PDF-ready document.
    NormalizeIssues {
        /// Producer export (JSON).
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the document (JSON).
        #[arg(short, long)]
        output: PathBuf,

        /// Adapter to use; `auto` detects it from the payload.
        #[arg(long, value_enum)]
        source: Option<SourceArg>,

        /// Document title (defaults to "Living Documentation - <repo>").
        #[arg(long)]
        document_title: Option<String>,

        /// Document version (defaults to the configured version).
        #[arg(long)]
        document_version: Option<String>,
    },

    /// Write a JSON Schema for one of the published contracts.
    ExportSchema {
        /// Which schema to export.
        #[arg(long, value_enum)]
        kind: SchemaArg,

        /// Output file.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "livingdoc=info",
        1 => "livingdoc=debug",
        _ => "livingdoc=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Map a failed run to its process exit code and stderr line.
///
/// Errors outside the taxonomy return `None` and are reported by color-eyre
/// (exit code 1).
pub(crate) fn classify(report: &Report) -> Option<(i32, String)> {
    report
        .downcast_ref::<LivingDocError>()
        .map(|e| (e.exit_code(), format!("Error: {}", e.user_message())))
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::NormalizeIssues {
            input,
            output,
            source,
            document_title,
            document_version,
        } => {
            let config = resolve_config(config_path)?;
            let mut options = NormalizeOptions::from_config(&config);
            if let Some(source) = source {
                options.source = source.into();
            }
            options.build.document_title = document_title;
            options.build.document_version = document_version;
            cmd_normalize_issues(&input, &output, &options).await
        }
        Command::ExportSchema { kind, output } => cmd_export_schema(kind.into(), &output),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_normalize_issues(
    input: &Path,
    output: &Path,
    options: &NormalizeOptions,
) -> Result<()> {
    info!(
        input = %input.display(),
        output = %output.display(),
        source = %options.source,
        "normalizing issues"
    );

    let reporter = CliProgress::new();
    let outcome = run_service(input, output, options, &SystemClock, &reporter).await?;

    println!();
    println!("  Document written: {}", output.display());
    println!("  Adapter:  {}", outcome.adapter);
    println!("  Stories:  {}", outcome.document.content.user_stories.len());
    println!("  Warnings: {}", outcome.warnings.len());
    for warning in &outcome.warnings {
        println!("    {}: {}", warning.code, warning.message);
    }
    println!("  Time:     {:.2}s", outcome.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_export_schema(kind: SchemaKind, output: &Path) -> Result<()> {
    write_json(output, &kind.schema())?;
    info!(?kind, output = %output.display(), "schema exported");
    println!("Schema written to: {}", output.display());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: PipelineStage) {
        self.spinner.set_message(format!("Stage: {stage}"));
    }

    fn item_normalized(&self, id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Normalizing [{current}/{total}] {id}"));
    }

    fn done(&self, _outcome: &NormalizeOutcome) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
