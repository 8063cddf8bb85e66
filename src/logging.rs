use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "emolearn.log";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    /// Daily-rolling file output directory; stdout only when `None`.
    pub file_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env(level: &str) -> Self {
        let enabled = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        let file_dir = enabled.then(|| {
            PathBuf::from(std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()))
        });

        Self {
            level: level.to_string(),
            file_dir,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_tracing(settings: &LogSettings) -> Option<FileLogGuard> {
    let stdout_layer = fmt::layer().with_target(true);

    let mut guard = None;
    let file_layer = settings.file_dir.as_ref().and_then(|dir| {
        if let Err(err) = std::fs::create_dir_all(dir) {
            eprintln!("failed to create log directory {}: {err}", dir.display());
            return None;
        }
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(FileLogGuard {
            _guard: worker_guard,
        });
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
    });

    tracing_subscriber::registry()
        .with(env_filter(&settings.level))
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_flags() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" 1 "));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy("false"));
    }
}
