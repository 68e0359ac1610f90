use crate::config::Config;
use crate::error::{ReactionFinderError, Result, ValidationError};

/// Upper bound for concurrent detail lookups
pub const MAX_VERIFY_CONCURRENCY: usize = 16;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every violation at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_slack(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_report(config, &mut errors);
        Self::validate_verify(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ReactionFinderError::ConfigValidation { errors })
        }
    }

    fn validate_slack(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.slack.token_env.trim().is_empty() {
            errors.push(ValidationError::new(
                "slack.token_env",
                "Token environment variable name cannot be empty",
            ));
        }

        let url = &config.slack.api_base_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            errors.push(ValidationError::new(
                "slack.api_base_url",
                format!("API base URL must be http(s), got '{}'", url),
            ));
        }

        if config.slack.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "slack.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.search.default_max_results == 0 {
            errors.push(ValidationError::new(
                "search.default_max_results",
                "Maximum results must be at least 1",
            ));
        }
    }

    fn validate_report(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.report.default_top_n == 0 {
            errors.push(ValidationError::new(
                "report.default_top_n",
                "Top N must be at least 1",
            ));
        }

        if config.report.preview_chars == 0 {
            errors.push(ValidationError::new(
                "report.preview_chars",
                "Preview length must be at least 1",
            ));
        }
    }

    fn validate_verify(config: &Config, errors: &mut Vec<ValidationError>) {
        let concurrency = config.verify.concurrency;
        if !(1..=MAX_VERIFY_CONCURRENCY).contains(&concurrency) {
            errors.push(ValidationError::new(
                "verify.concurrency",
                format!(
                    "Concurrency must be between 1 and {}, got {}",
                    MAX_VERIFY_CONCURRENCY, concurrency
                ),
            ));
        }
    }
}
