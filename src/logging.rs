//! Logging setup, powered by tracing-subscriber.
//!
//! The library crates only emit `tracing` events. A run builds a
//! [`tracing::Dispatch`] from a [`LoggingConfig`] and installs it as the
//! default for the current thread with [`LoggingConfig::install`]; dropping
//! the returned guard restores the previous dispatcher.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::dispatcher::DefaultGuard;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default log file, appended to on every run.
pub const DEFAULT_LOG_FILE: &str = "app.log";

/// Where log events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Console only.
    Stderr,
    /// Append to a file only.
    File(PathBuf),
    /// Console and file.
    Both(PathBuf),
}

impl LogSink {
    fn file(&self) -> Option<&Path> {
        match self {
            LogSink::Stderr => None,
            LogSink::File(path) | LogSink::Both(path) => Some(path),
        }
    }

    fn console(&self) -> bool {
        matches!(self, LogSink::Stderr | LogSink::Both(_))
    }
}

/// Log level and destination for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: tracing::Level,
    pub sink: LogSink,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            sink: LogSink::Both(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

impl LoggingConfig {
    /// Info level, or debug when `debug` is set.
    pub fn new(debug: bool, sink: LogSink) -> Self {
        let level = if debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };
        Self { level, sink }
    }

    /// Filter directives: the base level plus quieter HTTP internals.
    pub fn filter_directives(&self) -> String {
        let base = self.level.to_string().to_lowercase();
        let noisy: &[(&str, &str)] = &[
            ("hyper", "warn"),
            ("hyper_util", "warn"),
            ("reqwest", "warn"),
            ("h2", "warn"),
            ("rustls", "warn"),
        ];

        let mut directives = vec![base];
        for (target, lvl) in noisy {
            directives.push(format!("{}={}", target, lvl));
        }
        directives.join(",")
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        let directives = self.filter_directives();
        EnvFilter::try_new(&directives)
            .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", directives, e))
    }

    /// Build the dispatcher.
    ///
    /// The log file is opened in append mode; its parent directory is
    /// created when missing. File output carries no ANSI colors.
    pub fn build_dispatch(&self) -> anyhow::Result<Dispatch> {
        let console_layer = if self.sink.console() {
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(self.env_filter()?),
            )
        } else {
            None
        };

        let file_layer = match self.sink.file() {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                let log_file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(log_file)
                        .with_target(true)
                        .with_filter(self.env_filter()?),
                )
            }
            None => None,
        };

        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer);
        Ok(Dispatch::new(subscriber))
    }

    /// Build the dispatcher and make it the default for this thread.
    pub fn install(&self) -> anyhow::Result<DefaultGuard> {
        let dispatch = self.build_dispatch()?;
        Ok(tracing::dispatcher::set_default(&dispatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_sets_level() {
        assert_eq!(
            LoggingConfig::new(true, LogSink::Stderr).level,
            tracing::Level::DEBUG
        );
        assert_eq!(
            LoggingConfig::new(false, LogSink::Stderr).level,
            tracing::Level::INFO
        );
    }

    #[test]
    fn test_filter_directives() {
        let directives = LoggingConfig::new(true, LogSink::Stderr).filter_directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=warn"));
    }

    #[test]
    fn test_file_sink_appends_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "previous run\n").unwrap();

        let config = LoggingConfig::new(false, LogSink::File(path.clone()));
        {
            let _guard = config.install().unwrap();
            tracing::info!("run started");
            tracing::debug!("hidden at info level");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("run started"));
        assert!(!content.contains("hidden at info level"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    fn test_file_sink_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.log");
        let config = LoggingConfig::new(true, LogSink::File(path.clone()));
        config.build_dispatch().unwrap();
        assert!(path.exists());
    }
}
