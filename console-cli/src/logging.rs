///! Logging configuration
///! Diagnostics go to stderr so they never mix with command output

use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for a JSON log file, rotated daily
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_path: None,
        }
    }
}

impl LoggingConfig {
    /// `--verbose` raises the default level; `RUST_LOG` still wins
    pub fn from_env(verbose: u8) -> Self {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            level: level.to_string(),
            file_path: std::env::var_os("CONSOLECTL_LOG_PATH").map(PathBuf::from),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Install the global subscriber. Keep the returned guard alive until
    /// exit or buffered file output is lost.
    pub fn init(&self) -> Option<WorkerGuard> {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_writer(io::stderr);

        match &self.file_path {
            Some(path) => {
                let (writer, guard) = non_blocking(rolling::daily(path, "consolectl.log"));
                let file_layer = fmt::layer().with_ansi(false).json().with_writer(writer);

                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(console_layer)
                    .with(file_layer)
                    .init();
                Some(guard)
            }
            None => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(console_layer)
                    .init();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert!(config.file_path.is_none());
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(LoggingConfig::from_env(1).level, "info");
        assert_eq!(LoggingConfig::from_env(2).level, "debug");
        assert_eq!(LoggingConfig::from_env(9).level, "trace");
    }
}
