use crate::config::types::{Config, DirectoryConfig, FetcherConfig, LimitsConfig, OutputConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Characters Excel refuses in worksheet names
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_directory_config(&config.directory)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_limits_config(&config.limits)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the directory location and query template
fn validate_directory_config(config: &DirectoryConfig) -> ConfigResult<()> {
    let base = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e))
    })?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    config.listing_url(1).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid search-path '{}': {}",
            config.search_path, e
        ))
    })?;

    if config.search_type.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search-type cannot be empty".to_string(),
        ));
    }

    if config.location.trim().is_empty() {
        return Err(ConfigError::Validation(
            "location cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher identification and timing
fn validate_fetcher_config(config: &FetcherConfig) -> ConfigResult<()> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-zero, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout-ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates the optional crawl caps
fn validate_limits_config(config: &LimitsConfig) -> ConfigResult<()> {
    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    if config.max_entries == Some(0) {
        return Err(ConfigError::Validation(
            "max-entries must be >= 1 when set".to_string(),
        ));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max-duration-secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates report and progress output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report-path cannot be empty".to_string(),
        ));
    }

    validate_sheet_name(&config.sheet_name)?;

    if config.log_tail == 0 {
        return Err(ConfigError::Validation(
            "log-tail must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Worksheet names are 1 to 31 characters and exclude a few reserved characters
fn validate_sheet_name(name: &str) -> ConfigResult<()> {
    let length = name.chars().count();
    if length == 0 || length > 31 {
        return Err(ConfigError::Validation(format!(
            "sheet-name must be 1 to 31 characters, got {}",
            length
        )));
    }

    if name.contains(FORBIDDEN_SHEET_CHARS) {
        return Err(ConfigError::Validation(format!(
            "sheet-name '{}' contains a forbidden character",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        config.directory.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.directory.base_url = "ftp://files.example.com".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.directory.base_url = "http://127.0.0.1:3000".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_location() {
        let mut config = Config::default();
        config.directory.location = "   ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_limits() {
        let mut config = Config::default();
        config.limits.max_pages = Some(0);
        assert!(validate(&config).is_err());

        config.limits.max_pages = Some(1);
        config.limits.max_entries = Some(0);
        assert!(validate(&config).is_err());

        config.limits.max_entries = None;
        config.limits.max_duration_secs = Some(600);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("Firms").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("Firms/2024").is_err());
        assert!(validate_sheet_name("[Firms]").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
    }

    #[test]
    fn test_validate_viewport() {
        let mut config = Config::default();
        config.fetcher.viewport_height = 0;
        assert!(validate(&config).is_err());
    }
}
