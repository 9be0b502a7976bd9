//! CLI binary for plan2collage.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CollageConfig`, plays the boundary role (plan validation, links
//! parsing, status mapping), and writes the generated collage(s) to disk.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use plan2collage::{
    compose, encode_images, map_compose_result, parse_link_map, BatchProgressCallback,
    CandidateSelection, CollageConfig, LinkMap, ProgressCallback, TrustPolicy,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar tick per label, with a printed log
/// line per outcome. Labels are processed sequentially so lines arrive in
/// LinkMap order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(total: usize) -> Arc<Self> {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} labels  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Resolving");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_label_start(&self, label: &str, _index: usize, _total: usize) {
        self.bar.set_message(label.to_string());
    }

    fn on_label_complete(&self, label: &str, _index: usize, total: usize, encoded_len: usize) {
        self.bar.println(format!(
            "  {} {:<20} {}",
            green("✓"),
            label,
            dim(&format!("{encoded_len} bytes base64")),
        ));
        let _ = total;
        self.bar.inc(1);
    }

    fn on_label_failed(&self, label: &str, _index: usize, _total: usize, error: &str) {
        let msg = truncate_message(error, 79);
        self.bar
            .println(format!("  {} {:<20} {}", red("✗"), label, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_labels: usize, resolved: usize) {
        self.bar.finish_and_clear();
        let dropped = total_labels.saturating_sub(resolved);
        if dropped == 0 {
            eprintln!(
                "{} {} label(s) resolved",
                green("✔"),
                bold(&resolved.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} label(s) resolved  ({} dropped)",
                if resolved == 0 { red("✘") } else { cyan("⚠") },
                bold(&resolved.to_string()),
                total_labels,
                red(&dropped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compose a collage from a plan and two product pages
  plan2collage plan.png --links '{"sofa": "https://shop.example/sofa", "lamp": "https://shop.example/lamp"}'

  # Read the links map from a file
  plan2collage plan.png --links @links.json -o living_room.png

  # Resolve and encode only, print the boundary JSON, skip the backend
  plan2collage plan.png --links @links.json --dry-run --json

  # Safer transport, first-match selection, PNG product photos
  plan2collage plan.png --links @links.json --verify-tls --select-index 0 --image-format .png

  # Append a local demo image after the scraped batch
  plan2collage plan.png --links @links.json --augment ./result.jpg

NOTES:
  By default TLS certificate verification is DISABLED (legacy parity) and
  the SECOND matching image per page is selected. Use --verify-tls and
  --select-index to override either.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY   API key for the built-in image-edit backend
"#;

/// Compose scraped product photos into a photorealistic interior rendering.
#[derive(Parser, Debug)]
#[command(
    name = "plan2collage",
    version,
    about = "Scrape product photos from web pages and compose them into an interior rendering",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Floor-plan image file (validated, not forwarded to the backend).
    plan: PathBuf,

    /// Label→URL mapping as inline JSON, or @path to a JSON file.
    #[arg(short, long, env = "PLAN2COLLAGE_LINKS")]
    links: String,

    /// Write generated collage(s) here (suffix _2, _3… for extras).
    #[arg(short, long, env = "PLAN2COLLAGE_OUTPUT", default_value = "collage.png")]
    output: PathBuf,

    /// Candidate image URL suffix filter.
    #[arg(long, env = "PLAN2COLLAGE_IMAGE_FORMAT", default_value = ".jpg")]
    image_format: String,

    /// Verify TLS certificates (default: off, matching legacy behaviour).
    #[arg(long, env = "PLAN2COLLAGE_VERIFY_TLS")]
    verify_tls: bool,

    /// 0-based index into the filtered candidate list (default: 1, the
    /// legacy second-match policy).
    #[arg(long, env = "PLAN2COLLAGE_SELECT_INDEX", default_value_t = 1)]
    select_index: usize,

    /// Local image file appended (untranscoded) after the scraped batch.
    #[arg(long, env = "PLAN2COLLAGE_AUGMENT")]
    augment: Option<PathBuf>,

    /// Per-fetch timeout in seconds.
    #[arg(long, env = "PLAN2COLLAGE_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Generation model ID.
    #[arg(long, env = "PLAN2COLLAGE_MODEL")]
    model: Option<String>,

    /// Generation API base URL (proxies, compatible local servers).
    #[arg(long, env = "PLAN2COLLAGE_API_BASE")]
    api_base: Option<String>,

    /// Path to a text file containing a custom compositing prompt.
    #[arg(long, env = "PLAN2COLLAGE_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Resolve and encode only; skip the generation backend.
    #[arg(long)]
    dry_run: bool,

    /// Print the boundary JSON envelope instead of human output.
    #[arg(long, env = "PLAN2COLLAGE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PLAN2COLLAGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PLAN2COLLAGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PLAN2COLLAGE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides the feedback that matters. The insecure-TLS warn!
    // still gets through — that one is always worth seeing.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Boundary checks: plan file, links map ────────────────────────────
    if !cli.plan.exists() {
        bail!("Bad request: plan image not found at '{}'", cli.plan.display());
    }
    std::fs::File::open(&cli.plan)
        .with_context(|| format!("Bad request: cannot read plan image '{}'", cli.plan.display()))?;

    let links = parse_links_arg(&cli.links)?;
    if links.is_empty() {
        bail!("Bad request: empty image urls");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new(links.len()) as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Dry-run: stop after encoding ─────────────────────────────────────
    if cli.dry_run {
        let batch = encode_images(&links, &config)
            .await
            .context("Batch encoding failed")?;

        if cli.json {
            let images: Vec<&str> = batch.images.iter().map(|e| e.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&images)?);
        } else if !cli.quiet {
            eprintln!(
                "{}  {} image(s) encoded, {} label(s) dropped",
                green("✔"),
                bold(&batch.images.len().to_string()),
                batch.failures.len()
            );
            for failure in &batch.failures {
                eprintln!("   {} {}: {}", red("✗"), failure.label, failure.error);
            }
        }
        return Ok(());
    }

    // ── Compose ──────────────────────────────────────────────────────────
    let result = compose(&links, &config).await;
    let reply = map_compose_result(result);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reply.body)?);
        if reply.code != 200 {
            std::process::exit(1);
        }
        return Ok(());
    }

    if reply.code != 200 {
        bail!("HTTP {}: {}", reply.code, reply.body.message);
    }

    // ── Write collage(s) ─────────────────────────────────────────────────
    for (i, encoded) in reply.body.images.iter().enumerate() {
        let path = numbered_output(&cli.output, i);
        let bytes = encoded
            .decode()
            .context("Backend returned invalid base64")?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", bytes.len())),
            );
        }
    }

    io::stderr().flush().ok();
    Ok(())
}

/// Parse the --links argument: inline JSON, or @path to a JSON file.
fn parse_links_arg(arg: &str) -> Result<LinkMap> {
    let json = if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read links file '{path}'"))?
    } else {
        arg.to_string()
    };
    parse_link_map(&json).context("Bad request: links must be a JSON object of label → URL")
}

/// Map CLI flags to a validated `CollageConfig`.
fn build_config(cli: &Cli, progress_cb: Option<ProgressCallback>) -> Result<CollageConfig> {
    let mut builder = CollageConfig::builder()
        .image_format(cli.image_format.clone())
        .trust_policy(if cli.verify_tls {
            TrustPolicy::VerifyCertificates
        } else {
            TrustPolicy::Insecure
        })
        .selection(match cli.select_index {
            0 => CandidateSelection::FirstMatch,
            1 => CandidateSelection::SecondMatch,
            n => CandidateSelection::Nth(n),
        })
        .fetch_timeout_secs(cli.timeout);

    if let Some(ref path) = cli.augment {
        builder = builder.augmentation_path(path.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(ref path) = cli.prompt_file {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file '{}'", path.display()))?;
        builder = builder.prompt(prompt.trim().to_string());
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Truncate a log message to `max_chars` characters plus an ellipsis.
///
/// Error messages embed URLs and upstream error text, which are routinely
/// non-ASCII, so truncation must land on a char boundary, never a byte
/// offset.
fn truncate_message(msg: &str, max_chars: usize) -> String {
    match msg.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}\u{2026}", &msg[..byte_idx]),
        None => msg.to_string(),
    }
}

/// `collage.png`, `collage_2.png`, `collage_3.png`, …
fn numbered_output(base: &PathBuf, index: usize) -> PathBuf {
    if index == 0 {
        return base.clone();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "collage".to_string());
    let ext = base
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "png".to_string());
    base.with_file_name(format!("{}_{}.{}", stem, index + 1, ext))
}
