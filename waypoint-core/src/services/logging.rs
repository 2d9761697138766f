//! Logging service

use crate::models::LogLevel;
use tracing_subscriber::EnvFilter;

/// Filter directive for the given level
pub fn log_filter(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "waypoint=error",
        LogLevel::Warn => "waypoint=warn",
        LogLevel::Info => "waypoint=info",
        LogLevel::Debug => "waypoint=debug",
        LogLevel::Trace => "waypoint=trace",
    }
}

/// Initialize logging with the specified level
///
/// `RUST_LOG` takes precedence when set. Fails if a global subscriber is
/// already installed.
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()?;

    Ok(())
}

/// Log a rejected request
pub fn log_rejection(operation: &str, resource: &str, reason: &str) {
    tracing::warn!(
        operation = operation,
        resource = resource,
        reason = reason,
        "Request rejected"
    );
}

/// Log a system error
pub fn log_error(error: &str, context: Option<&str>) {
    tracing::error!(
        error = error,
        context = context.unwrap_or(""),
        "System error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_per_level() {
        assert_eq!(log_filter(LogLevel::Info), "waypoint=info");
        assert_eq!(log_filter(LogLevel::Trace), "waypoint=trace");
    }

    #[test]
    fn test_logging_initialization() {
        // A second initialization reports an error instead of panicking
        let _ = init_logging(LogLevel::Info);
        assert!(init_logging(LogLevel::Debug).is_err());
    }

    #[test]
    fn test_log_functions() {
        let _ = init_logging(LogLevel::Info);

        // These should not panic
        log_rejection("execute_action", "instance-1", "Action 'x' is disabled");
        log_error("test error", Some("test context"));
    }
}
