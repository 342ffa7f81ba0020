//! CLI binary for datasheet-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, prints tables as CSV or JSON, writes a browsable
//! result directory, or starts the upload viewer.

use anyhow::{bail, Context, Result};
use clap::Parser;
use datasheet_extract::{
    display_title, extract, extract_to_dir, inspect_with_password, DataFrame, ExtractionConfig,
    ExtractionProgressCallback, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    image_errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Starts as a spinner; `on_extraction_start` sets the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            image_errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Scanning");
        self.bar.reset_eta();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, pages_to_scan: usize) {
        self.activate_bar(pages_to_scan);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Scanning {pages_to_scan} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, tables: usize, images: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{tables:>2} tables")),
            dim(&format!("{images:>2} images")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, page_num: usize, error: &str) {
        self.image_errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}  image skipped: {}",
            yellow("⚠"),
            page_num,
            red(&msg)
        ));
    }

    fn on_extraction_complete(&self, tables: usize, images: usize) {
        self.bar.finish_and_clear();
        let failed = self.image_errors.load(Ordering::SeqCst);
        eprintln!(
            "{} {} titled tables, {} images{}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&tables.to_string()),
            bold(&images.to_string()),
            if failed == 0 {
                String::new()
            } else {
                format!("  ({} images failed)", red(&failed.to_string()))
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print every titled table as CSV (stdout)
  datasheet tps42.pdf

  # Write index.html, one CSV per table and the cropped images
  datasheet tps42.pdf -o tps42/

  # Datasheets whose tables start earlier
  datasheet --start-page 2 lm317.pdf -o lm317/

  # Structured JSON (images as base64 PNG)
  datasheet --json tps42.pdf > tps42.json

  # Extract from URL
  datasheet https://example.com/ds/tps42.pdf -o tps42/

  # Inspect PDF metadata
  datasheet --inspect-only tps42.pdf

  # Upload viewer on http://127.0.0.1:8501
  datasheet --serve

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium (else ./ then system)
  RUST_LOG                Override the log filter (e.g. datasheet_extract=debug)
"#;

/// Extract titled tables and images from component datasheets.
#[derive(Parser, Debug)]
#[command(
    name = "datasheet",
    version,
    about = "Extract titled tables and images from PDF datasheets",
    long_about = "Extract the ruled tables of a component datasheet, titled after the line \
printed above them, together with the embedded images. Tables are written as CSV, \
images as PNG, and an HTML viewer ties them together.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "serve")]
    input: Option<String>,

    /// Write index.html, CSV files and images into this directory.
    #[arg(short, long, env = "DATASHEET_OUTPUT")]
    output: Option<PathBuf>,

    /// First page (1-indexed) scanned for tables and images.
    #[arg(long, env = "DATASHEET_START_PAGE", default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..))]
    start_page: u64,

    /// Rendering DPI for image crops (72–400).
    #[arg(long, env = "DATASHEET_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DATASHEET_PASSWORD")]
    password: Option<String>,

    /// Skip image extraction.
    #[arg(long, env = "DATASHEET_NO_IMAGES")]
    no_images: bool,

    /// Keep tables without a title (titled "").
    #[arg(long, env = "DATASHEET_KEEP_UNTITLED")]
    keep_untitled: bool,

    /// Output structured JSON (ExtractionOutput) instead of CSV.
    #[arg(long, env = "DATASHEET_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DATASHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DATASHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DATASHEET_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DATASHEET_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Start the upload viewer instead of extracting one file.
    #[arg(long, env = "DATASHEET_SERVE")]
    serve: bool,

    /// Viewer bind address.
    #[arg(long, env = "DATASHEET_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Viewer port.
    #[arg(long, env = "DATASHEET_PORT", default_value_t = 8501)]
    port: u16,

    /// Maximum upload size in megabytes.
    #[arg(long, env = "DATASHEET_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.serve;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Upload viewer ────────────────────────────────────────────────────
    #[cfg(feature = "serve")]
    if cli.serve {
        let config = build_config(&cli, None)?;
        if !cli.quiet {
            eprintln!(
                "{} Datasheet viewer on {}",
                cyan("◆"),
                bold(&format!("http://{}:{}", cli.host, cli.port))
            );
        }
        datasheet_extract::server::serve(
            &cli.host,
            cli.port,
            config,
            cli.max_upload_mb.saturating_mul(1024 * 1024),
        )
        .await
        .context("Viewer failed")?;
        return Ok(());
    }
    #[cfg(not(feature = "serve"))]
    if cli.serve {
        bail!("This build has no upload viewer. Rebuild with --features serve.");
    }

    let Some(ref input) = cli.input else {
        bail!("No input given. Pass a PDF path or URL, or use --serve.");
    };

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect_with_password(input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref out_dir) = cli.output {
        let (output, files) = extract_to_dir(input, out_dir, &config)
            .await
            .context("Extraction failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        }
        if !cli.quiet {
            eprintln!(
                "{}  {} CSV files, {} images  {}ms  →  {}",
                if output.image_failures.is_empty() {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                files.csv_files.len(),
                files.image_files.len(),
                output.stats.total_duration_ms,
                bold(&out_dir.join(&files.index_html).display().to_string()),
            );
        }
        return Ok(());
    }

    let output = extract(input, &config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if output.tables.is_empty() {
        eprintln!(
            "{} No titled tables found from page {} onwards.",
            yellow("⚠"),
            output.start_page
        );
    }
    for (idx, table) in output.tables.iter().enumerate() {
        if idx > 0 {
            writeln!(handle).context("Failed to write to stdout")?;
        }
        let csv = DataFrame::from_table(table)
            .to_csv()
            .with_context(|| format!("Failed to format CSV for '{}'", table.title))?;
        writeln!(handle, "📄 Page {}: {}", table.page, display_title(table, idx))
            .and_then(|_| handle.write_all(csv.as_bytes()))
            .context("Failed to write to stdout")?;
    }
    if output.images.is_empty() && !cli.no_images {
        eprintln!(
            "{} No images found from page {} onwards.",
            yellow("⚠"),
            output.start_page
        );
    }

    if !cli.quiet && !show_progress {
        eprintln!(
            "Extracted {} tables and {} images from {} pages in {}ms",
            output.stats.tables_kept,
            output.stats.images_extracted,
            output.stats.scanned_pages,
            output.stats.total_duration_ms
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .start_page(cli.start_page as usize)
        .dpi(cli.dpi)
        .extract_images(!cli.no_images)
        .keep_untitled(cli.keep_untitled)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
