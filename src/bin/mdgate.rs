//! CLI binary for mdgate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GatewayConfig`, sets up logging, and serves the HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use mdgate::{EngineKind, Gateway, GatewayConfig};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address (127.0.0.1:8000)
  mdgate

  # Listen on all interfaces, keep downloads under /var/cache/mdgate
  mdgate --host 0.0.0.0 --cache-dir /var/cache/mdgate

  # Delete uploads once converted and refuse server-local paths
  mdgate --cleanup-uploads --no-local-paths

  # Use a different converter: runs `pandoc -t gfm <file>`
  mdgate --engine-command pandoc --engine-arg=-t --engine-arg=gfm

ENGINES:
  command   Run an external converter that prints Markdown to stdout
            (default: markitdown, https://github.com/microsoft/markitdown)
  text      Return UTF-8 text files as-is; no external dependency

LOGGING:
  Logs go to stderr and to ./app.log. RUST_LOG overrides --verbose/--quiet.
"#;

/// Serve a document-to-Markdown conversion API.
#[derive(Parser, Debug)]
#[command(
    name = "mdgate",
    version,
    about = "Serve a document-to-Markdown conversion API",
    long_about = "Accepts document uploads or URLs over HTTP, caches downloaded documents on \
disk, and returns their content as Markdown.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "MDGATE_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to bind.
    #[arg(short, long, env = "MDGATE_PORT", default_value_t = 8000)]
    port: u16,

    /// Directory for downloaded documents, keyed by md5 of the URL.
    #[arg(long, env = "MDGATE_CACHE_DIR", default_value = "tmp")]
    cache_dir: PathBuf,

    /// Directory for uploaded documents (default: working directory).
    #[arg(long, env = "MDGATE_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Prefix prepended to uploaded filenames.
    #[arg(long, env = "MDGATE_UPLOAD_PREFIX", default_value = "temp_")]
    upload_prefix: String,

    /// Delete each upload after it has been converted.
    #[arg(long, env = "MDGATE_CLEANUP_UPLOADS")]
    cleanup_uploads: bool,

    /// Only accept http(s) URLs on /convert/url/, never server-local paths.
    #[arg(long, env = "MDGATE_NO_LOCAL_PATHS")]
    no_local_paths: bool,

    /// Extraction engine.
    #[arg(long, env = "MDGATE_ENGINE", value_enum, default_value = "command")]
    engine: EngineArg,

    /// Converter program for `--engine command`.
    #[arg(long, env = "MDGATE_ENGINE_COMMAND", default_value = "markitdown")]
    engine_command: String,

    /// Extra argument passed to the converter before the file path (repeatable).
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Seconds a single conversion may run.
    #[arg(long, env = "MDGATE_ENGINE_TIMEOUT", default_value_t = 300)]
    engine_timeout: u64,

    /// HTTP download timeout in seconds (default: none).
    #[arg(long, env = "MDGATE_DOWNLOAD_TIMEOUT")]
    download_timeout: Option<u64>,

    /// Largest accepted request body, in MiB.
    #[arg(long, env = "MDGATE_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Log file path.
    #[arg(long, env = "MDGATE_LOG_FILE", default_value = "app.log")]
    log_file: PathBuf,

    /// Log to stderr only.
    #[arg(long, env = "MDGATE_NO_LOG_FILE")]
    no_log_file: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MDGATE_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, env = "MDGATE_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EngineArg {
    Command,
    Text,
}

impl Cli {
    fn engine_kind(&self) -> EngineKind {
        match self.engine {
            EngineArg::Command => EngineKind::Command {
                program: self.engine_command.clone(),
                args: self.engine_args.clone(),
            },
            EngineArg::Text => EngineKind::PlainText,
        }
    }

    fn to_config(&self) -> Result<GatewayConfig> {
        let mut builder = GatewayConfig::builder()
            .cache_dir(&self.cache_dir)
            .upload_prefix(&self.upload_prefix)
            .retain_uploads(!self.cleanup_uploads)
            .allow_local_paths(!self.no_local_paths)
            .engine(self.engine_kind())
            .engine_timeout_secs(self.engine_timeout)
            .max_upload_bytes(self.max_upload_mb.saturating_mul(1024 * 1024));
        if let Some(dir) = &self.upload_dir {
            builder = builder.upload_dir(dir);
        }
        if let Some(secs) = self.download_timeout {
            builder = builder.download_timeout_secs(secs);
        }
        builder.build().context("Invalid configuration")
    }
}

/// Install stderr logging plus the optional log file.
///
/// The returned guard flushes the file writer on drop and must outlive the server.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(filter());

    let (file_layer, guard) = if cli.no_log_file {
        (None, None)
    } else {
        let dir = match cli.log_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = cli
            .log_file
            .file_name()
            .context("--log-file must name a file")?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::never(&dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter());
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let _log_guard = init_logging(&cli)?;

    // ── Gateway ──────────────────────────────────────────────────────────
    let config = cli.to_config()?;
    tracing::debug!(?config, "Resolved configuration");
    let gateway = Gateway::new(config).context("Failed to initialise gateway")?;

    // ── Serve ────────────────────────────────────────────────────────────
    let addr = SocketAddr::new(cli.host, cli.port);
    mdgate::api::serve(addr, Arc::new(gateway))
        .await
        .with_context(|| format!("Server on {addr} failed"))?;

    Ok(())
}
