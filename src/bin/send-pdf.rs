//! CLI binary for marker-upload.
//!
//! A thin shim over the library crate: maps positional arguments to an
//! `UploadConfig`, renders progress, prints the conversion and saves images.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use marker_upload::{
    parse_extract_images, parse_timeout_arg, save_images, send, upload_percent, validate_input,
    ProgressCallback, UploadConfig, UploadError, UploadOutput, UploadProgressCallback,
};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Upload bar that rewrites one line with the percentage, then one `.` per
/// response chunk.
///
/// indicatif draws nothing when stderr is not a terminal; piped runs get a
/// plain `\rUploading: NN.N%` line on stdout instead.
struct CliProgressCallback {
    bar: ProgressBar,
    plain: bool,
}

impl CliProgressCallback {
    fn new(total: u64) -> Arc<Self> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{prefix:.bold} {msg:>6}  [{bar:42.green/238}] {bytes}/{total_bytes}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Uploading:");
        bar.set_message("0.0%");
        let plain = bar.is_hidden();
        Arc::new(Self { bar, plain })
    }

    fn write_plain(&self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

fn plain_progress_line(sent: u64, total: u64) -> String {
    format!("\rUploading: {:.1}%", upload_percent(sent, total))
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_upload_progress(&self, sent: u64, total: u64) {
        if self.plain {
            self.write_plain(&plain_progress_line(sent, total));
            return;
        }
        self.bar.set_position(sent.min(total));
        self.bar
            .set_message(format!("{:.1}%", upload_percent(sent, total)));
    }

    fn on_upload_complete(&self, total_bytes: u64) {
        if self.plain {
            self.write_plain(&format!("{}\n", plain_progress_line(total_bytes, total_bytes)));
            return;
        }
        self.bar.set_message("100.0%");
        self.bar.finish();
    }

    fn on_response_start(&self, _status: u16) {
        if !self.plain && !self.bar.is_finished() {
            self.bar.finish();
        }
    }

    fn on_response_chunk(&self, _len: usize) {
        let mut err = io::stderr().lock();
        let _ = err.write_all(b".");
        let _ = err.flush();
    }

    fn on_response_complete(&self, _total_bytes: u64) {
        eprintln!();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert with image extraction (default) and the default 300s timeout
  send-pdf paper.pdf

  # Markdown only
  send-pdf paper.pdf false

  # Allow the server 10 minutes of silence
  send-pdf scan.pdf true 600

SERVER:
  Requests go to http://localhost:3333/convert. Images are written to
  ./extracted_images/<name>.png.

EXIT STATUS:
  1  missing argument, unreadable file, connection or timeout failure
  0  otherwise; an error status or unparsable reply is reported but still
     exits 0 unless --strict is given
"#;

/// Upload a PDF to a marker server and print the converted Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "send-pdf",
    version,
    about = "Upload a PDF to a marker conversion server",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the PDF to convert.
    pdf_path: std::path::PathBuf,

    /// Ask the server for images; only the literal "false" disables it.
    #[arg(value_name = "EXTRACT_IMAGES", default_value = "true", allow_hyphen_values = true)]
    extract_images: String,

    /// Idle timeout in seconds (invalid or zero values mean 300).
    #[arg(value_name = "TIMEOUT_SECONDS", default_value = "300", allow_hyphen_values = true)]
    timeout_seconds: String,

    /// Exit 1 on error status, unparsable reply or failed image writes.
    #[arg(long)]
    strict: bool,

    /// Disable the upload progress bar and download dots.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // clap exits with 2 on usage errors; this tool reports them as 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = init_logging(&cli) {
        eprintln!("{} {e:#}", red("Error:"));
        return ExitCode::FAILURE;
    }

    ExitCode::from(run(cli).await)
}

fn init_logging(cli: &Cli) -> Result<()> {
    // The progress display is the user feedback; keep library logs quiet
    // unless asked.
    let filter = if cli.verbose {
        "debug"
    } else if cli.no_progress {
        "info"
    } else {
        "error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

async fn run(cli: Cli) -> u8 {
    // ── Pre-flight ───────────────────────────────────────────────────────
    let input = match validate_input(&cli.pdf_path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{} {e}", red("Error:"));
            return 1;
        }
    };
    println!("File size: {:.2} MB", input.size_mb());

    let extract_images = parse_extract_images(Some(&cli.extract_images));
    let timeout_secs = parse_timeout_arg(Some(&cli.timeout_seconds));

    let mut builder = UploadConfig::builder()
        .file_path(&cli.pdf_path)
        .extract_images(extract_images)
        .timeout_secs(timeout_secs);
    if !cli.no_progress {
        let cb = CliProgressCallback::new(input.size_bytes);
        builder = builder.progress_callback(cb as ProgressCallback);
    }
    let config = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {e}", red("Error:"));
            return 1;
        }
    };

    println!("Sending {} to marker-api server...", cli.pdf_path.display());
    println!(
        "Image extraction: {}",
        if extract_images { "enabled" } else { "disabled" }
    );
    println!("Request timeout: {} seconds", timeout_secs);

    // ── Request ──────────────────────────────────────────────────────────
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let output = match send(&input, &config).await {
        Ok(output) => output,
        Err(e) => {
            let _ = report_failure(&mut stdout, &mut stderr, &e);
            return e.exit_code(cli.strict) as u8;
        }
    };
    println!("Response received");

    print_output(&mut stdout, &mut stderr, &output, &config.images_dir, cli.strict)
        .await
        .unwrap_or(1)
}

fn report_failure(out: &mut impl Write, err: &mut impl Write, e: &UploadError) -> io::Result<()> {
    if matches!(
        e,
        UploadError::NonSuccessStatus { .. } | UploadError::MalformedResponse { .. }
    ) {
        writeln!(out, "Response received")?;
    }
    writeln!(err, "{} {e}", red("Error:"))
}

async fn print_output(
    out: &mut impl Write,
    err: &mut impl Write,
    output: &UploadOutput,
    images_dir: &Path,
    strict: bool,
) -> io::Result<u8> {
    let response = &output.response;

    writeln!(out, "\nMarkdown Output:")?;
    writeln!(out, "---------------")?;
    let md = response.markdown_text();
    out.write_all(md.as_bytes())?;
    if !md.ends_with('\n') {
        out.write_all(b"\n")?;
    }

    if let Some(meta) = response.printable_metadata() {
        writeln!(out, "\nMetadata:")?;
        writeln!(out, "---------")?;
        match serde_json::to_string_pretty(meta) {
            Ok(s) => writeln!(out, "{s}")?,
            Err(_) => writeln!(out, "{meta}")?,
        }
    }

    let Some(ref images) = response.images else {
        return Ok(0);
    };

    writeln!(out, "\nExtracted Images:")?;
    writeln!(out, "----------------")?;
    writeln!(out, "Found {} images", images.len())?;

    let report = match save_images(images, images_dir).await {
        Ok(report) => report,
        Err(e) => {
            writeln!(err, "{} {e}", red("Error:"))?;
            return Ok(u8::from(strict));
        }
    };
    for saved in &report.saved {
        writeln!(out, "Saved {}", saved.path.display())?;
    }
    for failed in &report.failed {
        writeln!(err, "{} {failed}", red("✗"))?;
    }
    if !report.saved.is_empty() {
        writeln!(
            err,
            "{} {}/{} images written",
            green("✔"),
            bold(&report.saved.len().to_string()),
            report.total()
        )?;
    }
    Ok(u8::from(strict && !report.failed.is_empty()))
}
