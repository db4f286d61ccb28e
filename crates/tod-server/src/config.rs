//! Server configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file, the
//! environment, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tod_core::CATEGORY_CHARS_MAX_DEFAULT;
use tod_generator::{GeneratorConfig, ProviderKind, ProviderSettings, DEDUP_PATH_DEFAULT};

/// Config file read when no path is given, if present.
pub const CONFIG_FILE_DEFAULT: &str = "tod.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Path of the card endpoint
    pub route: String,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Include raw and cleaned text in responses
    pub diagnostics: bool,
    pub category_chars_max: usize,
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
    pub dedup: DedupConfig,
    /// Rule set override; built-in rules when unset
    pub rules_path: Option<PathBuf>,
    /// Fallback catalog override; built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub attempts_max: u32,
    pub validation_backoff_ms: u64,
    pub provider_backoff_ms: u64,
    pub transport_backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Persist emitted texts to `path`; in-memory only when false
    pub enabled: bool,
    pub path: PathBuf,
    /// Oldest entries are evicted past this many; unbounded when unset
    pub entries_max: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            route: "/api/questions".to_string(),
            log_level: "info".to_string(),
            diagnostics: true,
            category_chars_max: CATEGORY_CHARS_MAX_DEFAULT,
            provider: ProviderConfig::default(),
            generation: GenerationConfig::default(),
            dedup: DedupConfig::default(),
            rules_path: None,
            catalog_path: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 15,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let defaults = GeneratorConfig::default();
        Self {
            attempts_max: defaults.attempts_max,
            validation_backoff_ms: millis(defaults.validation_backoff),
            provider_backoff_ms: millis(defaults.provider_backoff),
            transport_backoff_ms: millis(defaults.transport_backoff),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DEDUP_PATH_DEFAULT),
            entries_max: None,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ServerConfig {
    /// Load from `path` (or `tod.toml` if it exists), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE_DEFAULT).exists() => {
                Self::from_file(Path::new(CONFIG_FILE_DEFAULT))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `TOD_BIND`, `TOD_PROVIDER` and the provider's API key variable.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("TOD_BIND") {
            self.bind = bind;
        }

        if let Some(name) = lookup("TOD_PROVIDER") {
            self.provider.kind = ProviderKind::parse(&name).ok_or_else(|| {
                ConfigError::Invalid(format!("TOD_PROVIDER: unknown provider {}", name))
            })?;
        }

        if let Some(key) = lookup(self.provider.kind.api_key_env()) {
            self.provider.api_key = Some(key);
        }

        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.route.starts_with('/') {
            return Err(ConfigError::Invalid(format!("route must start with '/': {}", self.route)));
        }
        if self.category_chars_max == 0 {
            return Err(ConfigError::Invalid("category_chars_max must be positive".into()));
        }
        if self.generation.attempts_max == 0 {
            return Err(ConfigError::Invalid("generation.attempts_max must be positive".into()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be positive".into()));
        }
        if self.dedup.entries_max == Some(0) {
            return Err(ConfigError::Invalid("dedup.entries_max must be positive when set".into()));
        }
        Ok(())
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            kind: self.provider.kind,
            model: self.provider.model.clone(),
            api_key: self.provider.api_key.clone(),
            base_url: self.provider.base_url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            attempts_max: self.generation.attempts_max,
            validation_backoff: Duration::from_millis(self.generation.validation_backoff_ms),
            provider_backoff: Duration::from_millis(self.generation.provider_backoff_ms),
            transport_backoff: Duration::from_millis(self.generation.transport_backoff_ms),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.route, "/api/questions");
        assert_eq!(config.category_chars_max, 40);
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.dedup.path, PathBuf::from("/tmp/generated_truth_or_dare.json"));
        assert_eq!(config.generator_config(), GeneratorConfig::default());
        assert_eq!(config.provider_settings().timeout, Duration::from_secs(15));
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
bind = "0.0.0.0:8080"
diagnostics = false

[provider]
kind = "claude"

[generation]
attempts_max = 5
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert!(!config.diagnostics);
        assert_eq!(config.provider.kind, ProviderKind::Claude);
        assert_eq!(config.provider.timeout_secs, 15);
        assert_eq!(config.generation.attempts_max, 5);
        assert_eq!(config.generation.provider_backoff_ms, 250);
        assert!(config.dedup.enabled);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[
                ("TOD_BIND", "0.0.0.0:9000"),
                ("TOD_PROVIDER", "claude"),
                ("GEMINI_API_KEY", "ignored"),
                ("CLAUDE_API_KEY", "sk-test"),
            ]))
            .unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.provider.kind, ProviderKind::Claude);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert!(config.provider_settings().has_api_key());
    }

    #[test]
    fn test_unknown_provider_env() {
        let mut config = ServerConfig::default();
        let err = config.apply_env(env(&[("TOD_PROVIDER", "gpt")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_check_rejects_zero_attempts() {
        let mut config = ServerConfig::default();
        config.generation.attempts_max = 0;
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ServerConfig::load(Some(Path::new("/nonexistent/tod.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
