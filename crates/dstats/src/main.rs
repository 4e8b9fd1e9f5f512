//! DStats - Live HTTP traffic monitor
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! dstats
//! dstats --config configs/config.toml
//!
//! # Override the listen address and expose through a Cloudflare tunnel
//! dstats serve --port 8080 --tunnel
//! ```

mod cmd;
mod tunnel;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dstats_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// DStats - Live HTTP traffic monitor
#[derive(Parser, Debug)]
#[command(name = "dstats")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Global args that apply to serve when no subcommand given
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(flatten)]
    serve: cmd::serve::ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = match cli.command {
        Some(Command::Serve(args)) => args,
        // No subcommand = run server (default behavior)
        None => cli.serve,
    };

    let config_path = cmd::serve::resolve_config_path(cli.config);
    let (log_level, log_format) =
        resolve_logging(cli.log_level.as_deref(), config_path.as_deref());
    init_logging(&log_level, log_format)?;

    cmd::serve::run(config_path, args).await
}

/// Resolve log level and format: CLI flag > config file > default "info"
fn resolve_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> (String, LogFormat) {
    let config = config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok());

    let format = config
        .as_ref()
        .map(|c| c.log.format)
        .unwrap_or_default();

    // CLI flag takes precedence
    if let Some(level) = cli_level {
        return (level.to_string(), format);
    }

    let level = config
        .map(|c| c.log.level.directive())
        .unwrap_or_else(|| "info".to_string());

    (level, format)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .with(filter)
            .init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_wins() {
        let (level, format) = resolve_logging(Some("debug"), None);
        assert_eq!(level, "debug");
        assert_eq!(format, LogFormat::Console);
    }

    #[test]
    fn test_level_and_format_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\nformat = \"json\"\n").unwrap();

        let (level, format) = resolve_logging(None, Some(&path));
        assert_eq!(level, "warn");
        assert_eq!(format, LogFormat::Json);

        let (level, format) = resolve_logging(Some("trace"), Some(&path));
        assert_eq!(level, "trace");
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn test_defaults_without_config() {
        let (level, format) = resolve_logging(None, Some(Path::new("/nonexistent/dstats.toml")));
        assert_eq!(level, "info");
        assert_eq!(format, LogFormat::Console);
    }

    #[test]
    fn test_cli_parses_serve_flags() {
        let cli = Cli::parse_from(["dstats", "serve", "--port", "8080", "--tunnel", "-c", "x.toml"]);
        let Some(Command::Serve(args)) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(args.port, Some(8080));
        assert!(args.tunnel);
        assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
    }

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::parse_from(["dstats", "--host", "127.0.0.1"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.host.as_deref(), Some("127.0.0.1"));
        assert!(!cli.serve.tunnel);
    }
}
