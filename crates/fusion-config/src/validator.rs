//! Configuration validation.

use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_live(config, &mut result);
        Self::validate_api(config, &mut result);
        Self::validate_hints(config, &mut result);

        result
    }

    fn validate_live(config: &Config, result: &mut ValidationResult) {
        let live = &config.live;

        match Url::parse(&live.base_url) {
            Ok(url) => {
                if url.scheme() != "ws" && url.scheme() != "wss" {
                    result.add_error(ValidationError::new(
                        "live.base_url",
                        "base_url must start with ws:// or wss://",
                    ));
                }
                if url.query().is_some() {
                    result.add_warning(ValidationWarning::new(
                        "live.base_url",
                        "base_url already has a query string; apiKey will be appended to it",
                    ));
                }
            }
            Err(e) => {
                result.add_error(ValidationError::new(
                    "live.base_url",
                    format!("base_url is not a valid URL: {}", e),
                ));
            }
        }

        if !live.has_api_key() {
            result.add_warning(ValidationWarning::new(
                "live.api_key",
                "API key is not set; the live channel will not connect (set FUSION_STATIC_API_KEY)",
            ));
        }

        if live.max_reconnect_attempts == 0 {
            result.add_error(ValidationError::new(
                "live.max_reconnect_attempts",
                "max_reconnect_attempts must be greater than 0",
            ));
        }

        if live.reconnect_base_delay_ms == 0 {
            result.add_error(ValidationError::new(
                "live.reconnect_base_delay_ms",
                "reconnect_base_delay_ms must be greater than 0",
            ));
        }

        if live.event_buffer == 0 {
            result.add_error(ValidationError::new(
                "live.event_buffer",
                "event_buffer must be greater than 0",
            ));
        }
    }

    fn validate_api(config: &Config, result: &mut ValidationResult) {
        let base = &config.api.base_url;
        if !base.starts_with("http://") && !base.starts_with("https://") {
            result.add_error(ValidationError::new(
                "api.base_url",
                "base_url must start with http:// or https://",
            ));
        }

        if config.api.chat_page_limit == 0 || config.api.message_page_limit == 0 {
            result.add_error(ValidationError::new(
                "api",
                "page limits must be greater than 0",
            ));
        }
    }

    fn validate_hints(config: &Config, result: &mut ValidationResult) {
        if config.hints.max_hints == 0 {
            result.add_error(ValidationError::new(
                "hints.max_hints",
                "max_hints must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
