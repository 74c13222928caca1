//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{IvyConfig, LogOutput, LoggingConfig};

/// Validates `config` for an engine that was (`has_provider`) or was not
/// handed its own guild data provider.
pub fn validate_config(config: &IvyConfig, has_provider: bool) -> ConfigResult<()> {
    validate_prefix(config.prefix.as_deref(), has_provider)?;
    validate_allow_lists(config)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_prefix(prefix: Option<&str>, has_provider: bool) -> ConfigResult<()> {
    match (prefix, has_provider) {
        (Some(_), true) => Err(ConfigError::AmbiguousProvider),
        (None, false) => Err(ConfigError::MissingPrefix),
        (None, true) => Ok(()),
        (Some(prefix), false) => {
            if prefix.is_empty() {
                return Err(ConfigError::invalid_prefix(prefix, "must not be empty"));
            }
            if prefix.chars().any(char::is_whitespace) {
                return Err(ConfigError::invalid_prefix(prefix, "must not contain whitespace"));
            }
            Ok(())
        }
    }
}

fn validate_allow_lists(config: &IvyConfig) -> ConfigResult<()> {
    if config.super_perms.iter().any(|id| id.as_str().trim().is_empty()) {
        return Err(ConfigError::validation("super_perms contains an empty user id"));
    }
    if config.report_errors.iter().any(|id| id.as_str().trim().is_empty()) {
        return Err(ConfigError::validation("report_errors contains an empty guild id"));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation("logging.filters contains an empty target"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivy_core::{GuildId, UserId};

    fn with_prefix(prefix: &str) -> IvyConfig {
        IvyConfig {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exactly_one_prefix_source() {
        assert!(validate_config(&with_prefix("."), false).is_ok());
        assert!(validate_config(&IvyConfig::default(), true).is_ok());
        assert!(matches!(
            validate_config(&with_prefix("."), true),
            Err(ConfigError::AmbiguousProvider)
        ));
        assert!(matches!(
            validate_config(&IvyConfig::default(), false),
            Err(ConfigError::MissingPrefix)
        ));
    }

    #[test]
    fn test_rejects_bad_prefixes() {
        assert!(matches!(
            validate_config(&with_prefix(""), false),
            Err(ConfigError::InvalidPrefix { .. })
        ));
        assert!(matches!(
            validate_config(&with_prefix("! "), false),
            Err(ConfigError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_ids() {
        let mut config = with_prefix(".");
        config.super_perms.push(UserId::new(" "));
        assert!(validate_config(&config, false).is_err());

        let mut config = with_prefix(".");
        config.report_errors.push(GuildId::new(""));
        assert!(validate_config(&config, false).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = with_prefix(".");
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config, false),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
