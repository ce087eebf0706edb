use regex_lite::Regex;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Workflow URL patterns compile
/// - Retry bounds are non-zero
/// - The filter limit fits the vendor widget (1..=7)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Workflow validation
    for (field, pattern) in [
        (
            "workflow.search_page_pattern",
            &config.workflow.search_page_pattern,
        ),
        (
            "workflow.login_page_pattern",
            &config.workflow.login_page_pattern,
        ),
    ] {
        if let Err(e) = Regex::new(pattern) {
            return Err(ConfigError::ValidationError(format!(
                "{} is not a valid pattern: {}",
                field, e
            )));
        }
    }
    if config.workflow.target_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "workflow.target_url cannot be empty".to_string(),
        ));
    }

    // Engine validation
    let engine = &config.engine;
    if engine.page_ready_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "engine.page_ready_max_attempts cannot be 0".to_string(),
        ));
    }
    if engine.payment_poll_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "engine.payment_poll_max_attempts cannot be 0".to_string(),
        ));
    }
    if !(1..=7).contains(&engine.filter_max_numbers) {
        return Err(ConfigError::ValidationError(format!(
            "engine.filter_max_numbers must be between 1 and 7, got {}",
            engine.filter_max_numbers
        )));
    }

    // Bridge validation
    if config.bridge.request_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "bridge.request_timeout_ms cannot be 0".to_string(),
        ));
    }
    if config.bridge.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "bridge.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_bad_pattern_fails() {
        let mut config = Config::default();
        config.workflow.login_page_pattern = "[unclosed".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("login_page_pattern"));
    }

    #[test]
    fn test_validate_retry_bounds() {
        let mut config = Config::default();
        config.engine.page_ready_max_attempts = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.engine.filter_max_numbers = 8;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.engine.filter_max_numbers = 0;
        assert!(validate_config(&config).is_err());
    }
}
