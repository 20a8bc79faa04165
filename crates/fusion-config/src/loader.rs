//! Configuration loader.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Overrides `live.base_url`.
pub const ENV_WS_BASE_URL: &str = "FUSION_WS_BASE_URL";
/// Overrides `live.api_key`.
pub const ENV_STATIC_API_KEY: &str = "FUSION_STATIC_API_KEY";
/// Overrides `api.base_url`.
pub const ENV_API_BASE_URL: &str = "FUSION_API_BASE_URL";
/// Overrides `api.token`.
pub const ENV_API_TOKEN: &str = "FUSION_API_TOKEN";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load a file if present, defaults otherwise, then apply `FUSION_*` overrides.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        let config = match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Config::default(),
            Err(e) => return Err(e),
        };
        Ok(Self::apply_overrides(config, |name| std::env::var(name).ok()))
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_WS_BASE_URL) {
            config.live.base_url = url;
        }
        if let Some(key) = get(ENV_STATIC_API_KEY) {
            config.live.api_key = Some(key);
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            config.api.base_url = url;
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            config.api.token = Some(token);
        }
        config
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.fusion`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.live.max_reconnect_attempts, 5);
        assert!(config.live.api_key.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [live]
            base_url = "wss://fusion.example.com/ws/updates"
            api_key = "k1"
            max_reconnect_attempts = 3
            reconnect_base_delay_ms = 1000

            [api]
            base_url = "https://fusion.example.com/api/v1"
            chat_page_limit = 20

            [hints]
            max_hints = 4
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.live.base_url, "wss://fusion.example.com/ws/updates");
        assert_eq!(config.live.api_key.as_deref(), Some("k1"));
        assert_eq!(config.live.max_reconnect_attempts, 3);
        assert_eq!(config.live.reconnect_base_delay_ms, 1000);
        assert_eq!(config.api.chat_page_limit, 20);
        assert_eq!(config.api.message_page_limit, 100);
        assert_eq!(config.hints.max_hints, 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[live]").unwrap();
        writeln!(file, "api_key = \"from-file\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.live.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/fusion.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/fusion.toml")).unwrap();
        assert_eq!(config.hints.max_hints, 10);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("FUSION_TEST_CONFIG_KEY", "expanded-key");
        }
        let config = ConfigLoader::load_str("[live]\napi_key = \"${FUSION_TEST_CONFIG_KEY}\"").unwrap();
        assert_eq!(config.live.api_key.as_deref(), Some("expanded-key"));
        unsafe {
            std::env::remove_var("FUSION_TEST_CONFIG_KEY");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let result = ConfigLoader::load_str("[live]\napi_key = \"${NONEXISTENT_FUSION_VAR_98765}\"");
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(name)) if name == "NONEXISTENT_FUSION_VAR_98765"));
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_WS_BASE_URL, "wss://h/ws"),
            (ENV_STATIC_API_KEY, "k1"),
            (ENV_API_TOKEN, ""),
        ]);
        let config = ConfigLoader::apply_overrides(Config::default(), |name| {
            vars.get(name).map(|v| v.to_string())
        });
        assert_eq!(config.live.base_url, "wss://h/ws");
        assert_eq!(config.live.api_key.as_deref(), Some("k1"));
        assert!(config.api.token.is_none());
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/fusion");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/fusion"));
    }
}
