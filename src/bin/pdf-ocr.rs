//! CLI binary for pdf-ocr-viewer.
//!
//! `serve` starts the browser UI; `convert` runs one PDF through OCR and
//! prints the reconciled Markdown.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr_viewer::{
    process_pdf, write_json, write_markdown, AppState, MistralOcrClient, OcrConfig, OcrProgressCallback,
    OcrStage, PageSeparator, PdfUpload, ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows which OCR request is in flight.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("OCR");
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: OcrStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_complete(&self, page_count: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("OCR returned {page_count} pages"))
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web UI on http://127.0.0.1:8501
  pdf-ocr serve

  # Convert a file to Markdown on stdout
  pdf-ocr convert document.pdf

  # Convert to a file, pages separated by a horizontal rule
  pdf-ocr convert document.pdf -o document.md --separator hr

  # Structured JSON output (pages, stats)
  pdf-ocr convert document.pdf --json > output.json

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY     Mistral API key (also read from .env)
  MISTRAL_BASE_URL    Override the API endpoint
  MISTRAL_OCR_MODEL   Override the OCR model (default: mistral-ocr-latest)
  RUST_LOG            Tracing filter, overrides -v / -q
"#;

/// Run PDFs through Mistral OCR and view the Markdown with inline images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-ocr",
    version,
    about = "Run PDFs through Mistral OCR and view the Markdown with inline images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    service: ServiceArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF_OCR_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Mistral API key.
    #[arg(long, global = true, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API endpoint.
    #[arg(long, global = true, env = "MISTRAL_BASE_URL", default_value = pdf_ocr_viewer::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// OCR model.
    #[arg(long, global = true, env = "MISTRAL_OCR_MODEL", default_value = pdf_ocr_viewer::config::DEFAULT_MODEL)]
    model: String,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, global = true, env = "PDF_OCR_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Keep the uploaded file on the OCR service instead of deleting it.
    #[arg(long, global = true)]
    keep_upload: bool,

    /// Do not request extracted images.
    #[arg(long, global = true)]
    no_images: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the browser UI.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "PDF_OCR_BIND", default_value = "127.0.0.1:8501")]
        bind: String,

        /// Maximum upload size in MiB.
        #[arg(long, env = "PDF_OCR_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,
    },

    /// OCR one PDF and print (or write) the Markdown.
    Convert {
        /// Local PDF file path.
        input: PathBuf,

        /// Write Markdown to this file instead of stdout.
        #[arg(short, long, env = "PDF_OCR_OUTPUT")]
        output: Option<PathBuf>,

        /// Page separator: none, hr, comment, or custom string.
        #[arg(long, env = "PDF_OCR_SEPARATOR", default_value = "none")]
        separator: String,

        /// Output structured JSON (ConversionOutput) instead of Markdown,
        /// to stdout or to `--output`.
        #[arg(long)]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "PDF_OCR_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so clap's `env =` fallbacks see it.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let spinner_active = matches!(
        cli.command,
        Command::Convert { json: false, no_progress: false, .. }
    ) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner_active {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            ref bind,
            max_upload_mb,
        } => {
            let config = build_config(&cli.service, PageSeparator::None)?;
            let state = AppState::new(config).with_max_upload_bytes(max_upload_mb * 1024 * 1024);
            pdf_ocr_viewer::serve(bind, state)
                .await
                .with_context(|| format!("Server on {bind} failed"))?;
        }
        Command::Convert {
            ref input,
            ref output,
            ref separator,
            json,
            no_progress,
        } => {
            let config = build_config(&cli.service, PageSeparator::parse(separator))?;
            let show_progress = !cli.quiet && !no_progress && !json;
            run_convert(input, output.as_deref(), json, show_progress, cli.quiet, config).await?;
        }
    }

    Ok(())
}

async fn run_convert(
    input: &Path,
    output_path: Option<&Path>,
    json: bool,
    show_progress: bool,
    quiet: bool,
    config: OcrConfig,
) -> Result<()> {
    let upload = PdfUpload::from_path(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut client = MistralOcrClient::new(config.clone()).context("Cannot start OCR")?;
    let spinner = if show_progress {
        let cb = CliProgressCallback::new();
        client = client.with_progress(cb.clone() as ProgressCallback);
        Some(cb)
    } else {
        None
    };

    let result = process_pdf(&client, &upload, &config).await;
    if let Some(ref cb) = spinner {
        cb.finish();
    }
    let output = result.context("OCR processing failed")?;

    if let Some(path) = output_path {
        let written = if json {
            write_json(&output, path).await
        } else {
            write_markdown(&output, path).await
        };
        written.context("Failed to write output")?;
    } else if json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !quiet && !json {
        let target = output_path
            .map(|p| format!("  →  {}", bold(&p.display().to_string())))
            .unwrap_or_default();
        eprintln!(
            "{}  {} pages  {} images  {}ms{}",
            green("✔"),
            output.stats.total_pages,
            output.stats.total_images,
            output.stats.total_duration_ms,
            target,
        );
        if output.stats.unresolved_images > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} image reference(s) had no image data",
                    output.stats.unresolved_images
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `OcrConfig`.
fn build_config(args: &ServiceArgs, separator: PageSeparator) -> Result<OcrConfig> {
    let mut builder = OcrConfig::builder()
        .base_url(&args.base_url)
        .model(&args.model)
        .request_timeout_secs(args.timeout)
        .delete_after_processing(!args.keep_upload)
        .include_image_base64(!args.no_images)
        .page_separator(separator);

    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key);
    }

    builder.build().context("Invalid configuration")
}
