//! Tracing setup for the relay binary: every event goes to stdout and to an append-only log file.
//!
//! The file path comes from the `log-file` config key or the `--log-file` flag; the caller
//! resolves which one wins and passes the result here.

use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Opens `path` for appending, creating missing parent directories first.
pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Installs the global subscriber teeing stdout and `log_file`.
///
/// Level comes from `RUST_LOG` (e.g. `relay_bot=debug,serenity=warn`), default
/// [`DEFAULT_LOG_FILTER`]. Load `.env` before calling this. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(log_file: impl AsRef<Path>) -> anyhow::Result<()> {
    let file = Arc::new(open_log_file(log_file.as_ref())?);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout.and(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_log_file_creates_dirs_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("relay.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_bare_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");
        assert!(open_log_file(&path).is_ok());
    }

    #[test]
    fn test_open_log_file_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = open_log_file(&blocker.join("relay.log")).unwrap_err();
        assert!(format!("{:#}", err).contains("not-a-dir"));
    }

    #[test]
    fn test_init_tracing_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("relay.log");

        init_tracing(&path).unwrap();
        tracing::info!("written to file");
        assert!(path.exists());
        assert!(init_tracing(&path).is_err());
    }
}
