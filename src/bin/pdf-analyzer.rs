//! CLI binary for edgequake-pdf-analyzer.
//!
//! A thin shim over the library crate: maps CLI flags to `AnalyzerConfig`,
//! analyses each file with a spinner, then opens an interactive query loop.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_analyzer::{
    analyze_files, validate_inputs, AnalysisProgressCallback, Analyzer, AnalyzerConfig,
    ProcessedDocument, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{InquireError, Text};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn spinner(prefix: &str, message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix(prefix.to_string());
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_error(message: &str) {
    tracing::error!("{message}");
    eprintln!("{} {}", bold(&red("Error:")), message);
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner per document, replaced by a ✓/✗ line when it finishes.
struct CliProgressCallback {
    current: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(None),
        })
    }

    fn set_message(&self, message: String) {
        if let Ok(guard) = self.current.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.set_message(message);
            }
        }
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_document_start(&self, path: &Path, index: usize, total: usize) {
        let bar = spinner(
            &format!("[{index}/{total}]"),
            format!("Processing {}...", file_name(path)),
        );
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(bar);
        }
    }

    fn on_extracted(&self, path: &Path, pages: usize, images: usize) {
        self.set_message(format!(
            "Analyzing {}  {}",
            file_name(path),
            dim(&format!("{pages} pages, {images} images"))
        ));
    }

    fn on_text_analyzed(&self, path: &Path) {
        self.set_message(format!("Analyzing {}  {}", file_name(path), dim("text done")));
    }

    fn on_image_analyzed(&self, path: &Path, image_num: usize, total_images: usize, error: Option<&str>) {
        let status = match error {
            None => format!("image {image_num}/{total_images}"),
            Some(_) => format!("image {image_num}/{total_images} failed"),
        };
        self.set_message(format!("Analyzing {}  {}", file_name(path), dim(&status)));
    }

    fn on_document_complete(&self, path: &Path, error: Option<&str>) {
        let bar = self.current.lock().ok().and_then(|mut g| g.take());
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        match error {
            None => eprintln!("  {} {}", green("✓"), file_name(path)),
            Some(e) => {
                // Keep the line tidy; the full error is in the log.
                let first_line = e.lines().next().unwrap_or(e);
                eprintln!("  {} {}  {}", red("✗"), file_name(path), red(first_line));
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse one document, then ask questions about it
  pdf-analyzer report.pdf

  # Several documents, verbose logging
  pdf-analyzer -v q1.pdf q2.pdf q3.pdf

  # Skip image analysis, dump the analyses as JSON
  pdf-analyzer --no-images --json paper.pdf > analysis.json

  # Another provider / model
  pdf-analyzer --provider anthropic --model claude-sonnet-4-20250514 paper.pdf

INTERACTIVE MODE:
  After processing, type a question at the prompt. Type 'exit' (or press
  Esc / Ctrl-C) to quit.

RATE LIMITS:
  Rate-limited calls are retried up to 5 times with exponential backoff
  (2s, 4s, 8s, 16s plus jitter). If the limit persists, check that your
  API key has sufficient quota and billing enabled.

ENVIRONMENT VARIABLES (also read from a .env file):
  OPENAI_API_KEY          OpenAI API key (required for the default provider)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  MAX_PDF_SIZE_MB         Maximum input size in MB (default 10)
  ALLOW_IMAGES            Analyse embedded images: true/false (default true)
  LOG_LEVEL               Log level when no progress spinner is shown (default info)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// AI-powered PDF document analysis tool.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-analyzer",
    version,
    about = "AI-powered PDF document analysis tool",
    long_about = "Extract text, images and metadata from PDF documents, analyse them with an LLM, \
then query the analysed documents interactively.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to analyze.
    #[arg(required = true, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, env = "PDF_ANALYZER_VERBOSE")]
    verbose: bool,

    /// LLM model ID.
    #[arg(long, env = "PDF_ANALYZER_MODEL", default_value = edgequake_pdf_analyzer::DEFAULT_MODEL)]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, …
    #[arg(long, env = "PDF_ANALYZER_PROVIDER", default_value = edgequake_pdf_analyzer::DEFAULT_PROVIDER)]
    provider: String,

    /// Maximum accepted PDF size in megabytes.
    #[arg(long, env = "MAX_PDF_SIZE_MB", default_value_t = 10)]
    max_size_mb: u64,

    /// Analyse embedded images (true/false).
    #[arg(long, env = "ALLOW_IMAGES", default_value_t = true,
          action = clap::ArgAction::Set,
          value_parser = clap::builder::BoolishValueParser::new())]
    allow_images: bool,

    /// Skip image extraction and analysis (same as --allow-images false).
    #[arg(long)]
    no_images: bool,

    /// Attempts per call when rate-limited.
    #[arg(long, env = "PDF_ANALYZER_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Per-call timeout in seconds.
    #[arg(long, env = "PDF_ANALYZER_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print the analyses as JSON and exit instead of starting the query loop.
    #[arg(long)]
    json: bool,

    /// Do not start the interactive query loop.
    #[arg(long)]
    no_interactive: bool,

    /// Disable progress spinners.
    #[arg(long, env = "PDF_ANALYZER_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners provide the feedback while they run; only errors are logged
    // next to them unless --verbose asks for everything.
    let show_progress = !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug".to_string()
    } else if show_progress {
        "error".to_string()
    } else {
        std::env::var("LOG_LEVEL")
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter)),
        )
        .with_writer(io::stderr)
        .init();

    eprintln!("{}", bold("PDF Document Analyzer"));

    // ── Build config & provider (fails fast without a credential) ────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let analyzer = Analyzer::from_config(config).context("Failed to initialise LLM provider")?;

    // ── Validate inputs ──────────────────────────────────────────────────
    let (valid_files, rejected) =
        validate_inputs(&cli.files, analyzer.config().max_file_size_bytes());
    for (_, e) in &rejected {
        log_error(&e.to_string());
    }
    if valid_files.is_empty() {
        eprintln!("{}", bold(&red("No valid PDF files provided")));
        std::process::exit(1);
    }

    // ── Process ──────────────────────────────────────────────────────────
    eprintln!("\nProcessing {} file(s)...", valid_files.len());
    let outcome = analyze_files(&valid_files, &analyzer).await;

    if !show_progress {
        for (path, e) in &outcome.failures {
            log_error(&format!("Error processing {}: {}", path.display(), e));
        }
    }

    if outcome.is_empty() {
        eprintln!("{}", bold(&red("No documents were successfully processed")));
        std::process::exit(1);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome.processed)
            .context("Failed to serialise analyses")?;
        println!("{json}");
        return Ok(());
    }

    eprintln!(
        "\n{} {}",
        green("✔"),
        bold(&format!(
            "Documents processed successfully! ({}/{})",
            outcome.processed.len(),
            valid_files.len()
        ))
    );

    if !cli.no_interactive {
        interactive_query(&analyzer, &outcome.processed, show_progress).await?;
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .provider_name(&cli.provider)
        .model(&cli.model)
        .max_file_size_mb(cli.max_size_mb)
        .allow_images(cli.allow_images && !cli.no_images)
        .max_attempts(cli.max_attempts)
        .request_timeout_secs(cli.timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Prompt for questions until the user types `exit` or cancels.
async fn interactive_query(
    analyzer: &Analyzer,
    docs: &[ProcessedDocument],
    show_progress: bool,
) -> Result<()> {
    loop {
        println!(
            "\n{}",
            bold(&green("Query the documents (or 'exit' to quit)"))
        );

        let answer = tokio::task::block_in_place(|| Text::new("Enter your query").prompt());
        let query = match answer {
            Ok(q) => q,
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                break;
            }
            Err(e) => return Err(e).context("Failed to read query"),
        };

        let query = query.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        let bar = show_progress.then(|| spinner("Query", "Processing query...".to_string()));
        let result = analyzer.query_documents(query, docs).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        match result {
            Ok(response) => println!("\n{} {}", bold(&cyan("Answer:")), response),
            Err(e) => log_error(&format!("Error processing query: {e}")),
        }
    }
    Ok(())
}
