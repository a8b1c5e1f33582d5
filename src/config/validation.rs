use crate::config::types::Config;
use crate::url::is_valid_url;
use crate::{url::ensure_scheme, ConfigError};

/// Validates a parsed configuration
///
/// Checks that numeric limits are usable and that every configured seed site
/// canonicalizes to a valid HTTP(S) URL.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.analyzer.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page-timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.analyzer.aux_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "aux-timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.analyzer.max_concurrent_sites == 0 {
        return Err(ConfigError::Validation(
            "max-concurrent-sites must be greater than 0".to_string(),
        ));
    }

    if config.phases.discovery_budget_secs == 0
        || config.phases.analysis_budget_secs == 0
        || config.phases.outreach_budget_secs == 0
    {
        return Err(ConfigError::Validation(
            "phase budgets must be greater than 0".to_string(),
        ));
    }

    if config.output.report_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "report-path must not be empty".to_string(),
        ));
    }

    for site in &config.sites {
        let canonical = ensure_scheme(site);
        if !is_valid_url(&canonical) {
            return Err(ConfigError::InvalidUrl(site.clone()));
        }
    }

    Ok(())
}
