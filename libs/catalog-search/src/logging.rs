//! Logging initialization for hosts embedding the search service
//!
//! Supports JSON or human-readable output, optional rolling log files and
//! `RUST_LOG` overrides.

use std::fs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the background file writer alive; drop it last.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set, replaces the configured level filter.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let subscriber = tracing_subscriber::registry().with(build_env_filter(config));

    let file_guard = if config.json {
        let console_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stdout);

        if config.file_enabled {
            let (writer, guard) = create_file_writer(config)?;
            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer);
            subscriber.with(console_layer).with(file_layer).try_init()?;
            Some(guard)
        } else {
            subscriber.with(console_layer).try_init()?;
            None
        }
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stdout);

        if config.file_enabled {
            let (writer, guard) = create_file_writer(config)?;
            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer);
            subscriber.with(console_layer).with(file_layer).try_init()?;
            Some(guard)
        } else {
            subscriber.with(console_layer).try_init()?;
            None
        }
    };

    tracing::info!(
        level = %config.level,
        json = config.json,
        file = config.file_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// `RUST_LOG`-only setup with reasonable defaults.
pub fn init_simple_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_search=info,reqwest=warn,hyper=warn".into()),
        )
        .with(fmt::layer())
        .try_init();
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "catalog_search={},reqwest=warn,hyper=warn",
            config.level
        ))
    })
}

fn rotation(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn create_file_writer(
    config: &LoggingConfig,
) -> anyhow::Result<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    fs::create_dir_all(&config.file_directory)?;

    let appender = if config.file_rotation == "never" {
        RollingFileAppender::new(
            Rotation::NEVER,
            &config.file_directory,
            format!("{}.log", config.file_prefix),
        )
    } else {
        RollingFileAppender::new(
            rotation(&config.file_rotation),
            &config.file_directory,
            &config.file_prefix,
        )
    };

    Ok(tracing_appender::non_blocking(appender))
}
