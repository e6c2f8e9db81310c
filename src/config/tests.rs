#[cfg(test)]
mod config_tests {
    use crate::config::{
        default_environment, default_host, default_log_level, default_otlp_endpoint,
        default_port, default_service_name, default_shutdown_timeout, Config, ConfigError,
        ServerConfig, ENV_PREFIX,
    };
    use std::time::Duration;

    fn source(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_source(source(&[])).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.shutdown_timeout_seconds, 5);
        assert_eq!(config.observability.service_name, "simple_http_sentence");
        assert_eq!(config.observability.environment, "local");
        assert_eq!(
            config.observability.otlp_endpoint,
            "http://otel-collector:4317"
        );
        assert!(config.observability.tracing_enabled);
        assert!(!config.observability.enable_json_logging);
    }

    #[test]
    fn test_config_from_source() {
        let config = Config::from_source(source(&[
            ("SENTENCE_HOST", "127.0.0.1"),
            ("SENTENCE_PORT", "9000"),
            ("SENTENCE_SHUTDOWN_TIMEOUT_SECONDS", "10"),
            ("SENTENCE_SERVICE_NAME", "test-service"),
            ("SENTENCE_OTLP_ENDPOINT", "http://collector:4317"),
            ("SENTENCE_TRACING_ENABLED", "false"),
            ("SENTENCE_ENABLE_JSON_LOGGING", "true"),
            ("SENTENCE_LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(10));
        assert_eq!(config.observability.service_name, "test-service");
        assert_eq!(config.observability.otlp_endpoint, "http://collector:4317");
        assert!(!config.observability.tracing_enabled);
        assert!(config.observability.enable_json_logging);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = Config::from_source(source(&[("SENTENCE_PORT", "0")]));

        match result {
            Err(ConfigError::ValidationError { message }) => {
                assert!(message.contains("port"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_shutdown_timeout_rejected() {
        let result = Config::from_source(source(&[("SENTENCE_SHUTDOWN_TIMEOUT_SECONDS", "0")]));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_empty_endpoint_allowed_without_tracing() {
        let enabled = Config::from_source(source(&[("SENTENCE_OTLP_ENDPOINT", " ")]));
        assert!(matches!(enabled, Err(ConfigError::ValidationError { .. })));

        let disabled = Config::from_source(source(&[
            ("SENTENCE_OTLP_ENDPOINT", " "),
            ("SENTENCE_TRACING_ENABLED", "false"),
        ]));
        assert!(disabled.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 5,
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");

        let invalid = ServerConfig {
            host: "not-an-ip".to_string(),
            ..config
        };
        assert!(matches!(
            invalid.socket_addr(),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::ValidationError {
            message: "Invalid configuration".to_string(),
        };
        assert_eq!(error.to_string(), "Validation error: Invalid configuration");

        let error = ConfigError::LoadError {
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "Configuration loading error: boom");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 8080);
        assert_eq!(default_shutdown_timeout(), 5);
        assert_eq!(default_service_name(), "simple_http_sentence");
        assert_eq!(default_environment(), "local");
        assert_eq!(default_otlp_endpoint(), "http://otel-collector:4317");
        assert_eq!(default_log_level(), "info");
    }
}
