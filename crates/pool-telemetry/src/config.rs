//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `tonlib_pool=debug,info`
    pub log_level: String,

    /// Whether to write log lines to stdout
    pub console_output: bool,

    /// Whether to emit JSON formatted log lines
    pub json_logs: bool,

    /// Include thread names in log lines (worker threads are named)
    pub thread_names: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "tonlib-pool".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            thread_names: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TONLIB_SERVICE_NAME`: Service name (default: tonlib-pool)
    /// - `TONLIB_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `TONLIB_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `TONLIB_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `TONLIB_THREAD_NAMES`: Include thread names (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("TONLIB_SERVICE_NAME")
                .unwrap_or_else(|_| "tonlib-pool".to_string()),

            log_level: env::var("TONLIB_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("TONLIB_CONSOLE_OUTPUT")
                .map(|v| flag_enabled(&v, true))
                .unwrap_or(true),

            json_logs: env::var("TONLIB_JSON_LOGS")
                .map(|v| flag_enabled(&v, false))
                .unwrap_or(is_container),

            thread_names: env::var("TONLIB_THREAD_NAMES")
                .map(|v| flag_enabled(&v, true))
                .unwrap_or(true),
        }
    }
}

fn flag_enabled(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "tonlib-pool");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_flag_parsing() {
        assert!(flag_enabled("TRUE", false));
        assert!(flag_enabled("1", false));
        assert!(!flag_enabled("off", true));
        assert!(flag_enabled("garbage", true));
        assert!(!flag_enabled("garbage", false));
    }
}
