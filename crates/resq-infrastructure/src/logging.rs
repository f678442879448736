//! Structured logging with tracing
//!
//! Centralized subscriber setup plus the logging helpers the resilience
//! layer uses to emit error reports at a level matching their severity.

use crate::constants::LOG_FILTER_ENV;
use resq_domain::error::{Error, Result};
use resq_domain::{ErrorReport, ErrorSeverity};

pub use crate::config::LoggingConfig;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with the provided configuration
///
/// `RESQ_LOG` overrides the configured level with a full filter directive.
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_appender = config.file_output.as_ref().map(|path| {
        tracing_appender::rolling::daily(
            path.parent().unwrap_or_else(|| std::path::Path::new(".")),
            path.file_stem()
                .unwrap_or_else(|| std::ffi::OsStr::new("resq")),
        )
    });

    // Layer types differ per branch, so each combination initializes separately
    let registry = Registry::default().with(filter);
    let init = if config.json_format {
        let stdout = fmt::layer().json().with_target(true).with_thread_ids(true);
        if let Some(appender) = file_appender {
            let file = fmt::layer()
                .json()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true);
            registry.with(stdout).with(file).try_init()
        } else {
            registry.with(stdout).try_init()
        }
    } else {
        let stdout = fmt::layer().with_target(true).with_thread_ids(true);
        if let Some(appender) = file_appender {
            let file = fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true);
            registry.with(stdout).with(file).try_init()
        } else {
            registry.with(stdout).try_init()
        }
    };
    init.map_err(|e| Error::configuration(format!("Failed to install log subscriber: {e}")))?;

    info!("Logging initialized with level: {}", level);
    Ok(())
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::configuration(format!(
            "Invalid log level: {level}. Use trace, debug, info, warn, or error"
        ))),
    }
}

/// Log level an error report of the given severity is emitted at
pub fn severity_level(severity: ErrorSeverity) -> Level {
    match severity {
        ErrorSeverity::Critical | ErrorSeverity::High => Level::ERROR,
        ErrorSeverity::Medium => Level::WARN,
        ErrorSeverity::Low => Level::INFO,
    }
}

/// Emit an error report at the level derived from its severity
pub fn log_error_report(report: &ErrorReport) {
    macro_rules! emit {
        ($macro:ident) => {
            $macro!(
                report_id = %report.id,
                origin = %report.context.origin,
                category = %report.category,
                severity = %report.severity,
                handled = report.handled,
                retry_count = report.retry_count,
                "{}",
                report.message
            )
        };
    }

    match severity_level(report.severity) {
        Level::ERROR => emit!(error),
        Level::WARN => emit!(warn),
        _ => emit!(info),
    }
}

/// Log configuration loading status
pub fn log_config_loaded(config_path: &std::path::Path, success: bool) {
    if success {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        warn!("Configuration file not found: {}", config_path.display());
    }
}
