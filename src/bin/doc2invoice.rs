//! CLI binary for doc2invoice.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use doc2invoice::{
    extract, Classification, ExtractError, ExtractionConfig, ExtractionOutput, SchemaVariant,
    Settings,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a single-line-item invoice
  doc2invoice scan.png

  # Multi-line-item invoice, JSON output
  doc2invoice --variant multi --json march.pdf > march.json

  # Plain-text invoice without the is-it-an-invoice classification
  doc2invoice --variant simple invoice.txt

  # Pin the fallback date (used when no date is printed on the document)
  doc2invoice --date 2024-03-01 scan.jpg

SUPPORTED INPUTS:
  Kind     Media types                                  Limit
  ──────   ──────────────────────────────────────────   ──────
  Image    image/jpeg, image/jpg, image/png, image/webp 10 MiB
  PDF      application/pdf                              10 MiB
  Text     text/plain                                   10 MiB

EXIT CODES:
  0  extraction succeeded
  1  extraction failed (bad input, transport error, invalid fields)
  2  the document is not an invoice (a model verdict, not a malfunction)

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY        Model provider API key (required)
  STRIPE_PUBLISHABLE_KEY   Payment-provider publishable key (required at startup)
  DOC2INVOICE_MODEL        Override the model ID
  DOC2INVOICE_VARIANT      Override the schema variant
"#;

/// Extract structured invoice data from images, PDFs, and text documents.
#[derive(Parser, Debug)]
#[command(
    name = "doc2invoice",
    version,
    about = "Extract structured invoice data from documents using LLMs",
    long_about = "Extract structured invoice data (line items, quantities, rates in currency \
subunits, invoice date) from images, PDFs, and plain-text documents using a vision-capable LLM. \
Every extracted field is validated against hand-written bounds before it is printed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to extract: JPEG/PNG/WebP image, PDF, or plain text file.
    input: PathBuf,

    /// Extraction schema: single, multi, or simple.
    #[arg(long, env = "DOC2INVOICE_VARIANT", value_enum, default_value = "single")]
    variant: VariantArg,

    /// Model ID (e.g. claude-sonnet-4-20250514).
    #[arg(long, env = "DOC2INVOICE_MODEL")]
    model: Option<String>,

    /// Completion token ceiling for the model call.
    #[arg(long, env = "DOC2INVOICE_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: u32,

    /// Sampling temperature (0.0–1.0).
    #[arg(long, env = "DOC2INVOICE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Transport timeout for the model call, in seconds.
    #[arg(long, env = "DOC2INVOICE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Fallback invoice date (YYYY-MM-DD). Defaults to today.
    #[arg(long, env = "DOC2INVOICE_DATE")]
    date: Option<String>,

    /// Output the full structured result as JSON instead of a summary.
    #[arg(long, env = "DOC2INVOICE_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOC2INVOICE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2INVOICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "DOC2INVOICE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum VariantArg {
    Single,
    Multi,
    Simple,
}

impl From<VariantArg> for SchemaVariant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Single => SchemaVariant::SingleItem,
            VariantArg::Multi => SchemaVariant::MultiItem,
            VariantArg::Simple => SchemaVariant::Simplified,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", red("✗"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs duplicate what the spinner already shows; keep them
    // quiet unless the user asked for detail.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Startup settings ─────────────────────────────────────────────────
    // Both environment credentials are validated up front; a missing one
    // fails the process before any file is touched.
    let settings = Settings::from_env().context("Startup settings are incomplete")?;

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ExtractionConfig::builder()
        .variant(cli.variant.clone().into())
        .api_key(settings.anthropic_api_key)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout);
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref date) = cli.date {
        builder = builder.current_date(date);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run extraction with a spinner ────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analyzing");
        bar.set_message(cli.input.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = extract(&cli.input, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match result {
        Ok(output) => {
            print_output(&cli, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.classification() == Classification::NotInvoice => {
            eprintln!("{} {}", yellow("⚠"), e.user_message());
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            report_failure(&cli, &e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_output(cli: &Cli, output: &ExtractionOutput) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "{} {} — {} line item(s), dated {}",
        green("✔"),
        bold(&cli.input.display().to_string()),
        output.invoice.line_items.len(),
        output.invoice.invoice_date,
    )?;
    for (i, item) in output.invoice.line_items.iter().enumerate() {
        let unit = if item.hourly { "h" } else { "×" };
        writeln!(
            out,
            "  {:>2}. {:<40} {:>8} {}  @ {} subunits",
            i + 1,
            item.description,
            item.quantity,
            unit,
            item.pay_rate_in_subunits,
        )?;
    }

    if !cli.quiet {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }
    Ok(())
}

fn report_failure(cli: &Cli, error: &ExtractError) {
    eprintln!("{} {}", red("✗"), error.user_message());
    if cli.verbose {
        eprintln!("  {}", dim(&error.to_string()));
    }
}
