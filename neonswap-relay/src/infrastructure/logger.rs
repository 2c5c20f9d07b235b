use serde::{Deserialize, Serialize};
use std::sync::{Once, OnceLock};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling, rolling::Rotation};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

static INIT: Once = Once::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub enable_console: bool,
    pub log_directory: Option<String>,
    pub enable_colors: bool,
    pub enable_thread_ids: bool,
    pub enable_file_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_console: true,
            log_directory: None,
            enable_colors: true,
            enable_thread_ids: false,
            enable_file_line: false,
        }
    }
}

pub struct Logger;

impl Logger {
    /// Console-only logging at the given level.
    pub fn init(log_level: &str) {
        Self::init_with(LogConfig {
            level: log_level.to_string(),
            ..LogConfig::default()
        });
    }

    pub fn init_with(config: LogConfig) {
        INIT.call_once(|| {
            let level = Self::parse_level(&config.level);
            let env_filter = EnvFilter::new(
                std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| format!("neonswap_relay={level},actix_web=info")),
            );

            let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

            if config.enable_console {
                let console_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(config.enable_thread_ids)
                    .with_file(config.enable_file_line)
                    .with_line_number(config.enable_file_line)
                    .with_target(true)
                    .with_ansi(config.enable_colors)
                    .with_writer(std::io::stdout);
                layers.push(Box::new(console_layer));
            }

            if let Some(directory) = &config.log_directory {
                if let Err(e) = std::fs::create_dir_all(directory) {
                    eprintln!("Failed to create log directory {directory}: {e}");
                } else {
                    let file_appender =
                        rolling::RollingFileAppender::new(Rotation::DAILY, directory, "neonswap_relay.log");
                    let (writer, guard) = non_blocking(file_appender);
                    // dropping the guard would stop the background writer
                    let _ = FILE_GUARD.set(guard);
                    let file_layer = fmt::layer()
                        .with_timer(UtcTime::rfc_3339())
                        .with_thread_ids(config.enable_thread_ids)
                        .with_file(config.enable_file_line)
                        .with_line_number(config.enable_file_line)
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer);
                    layers.push(Box::new(file_layer));
                }
            }

            let subscriber = Registry::default().with(env_filter).with(layers);
            if let Err(e) = subscriber.try_init() {
                eprintln!("Logger already initialised: {e}");
            }
        });
    }

    fn parse_level(level: &str) -> Level {
        match level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(Logger::parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(Logger::parse_level("warn"), Level::WARN);
        assert_eq!(Logger::parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_init_is_idempotent() {
        Logger::init("debug");
        Logger::init("info");
        tracing::info!("logger initialised twice without panicking");
    }
}
