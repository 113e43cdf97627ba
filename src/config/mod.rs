//! Configuration system (layered: defaults < config file < environment).

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{ConductorError, Result};
use crate::graph::RecursionBudget;
use crate::types::{ModelProvider, Settings};

/// Session identifier used when none is configured.
pub const DEFAULT_SESSION_ID: &str = "default";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variables read by [`ConductorConfig::apply_env`].
pub const ENV_VARS: [&str; 6] = [
    "CONDUCTOR_PROVIDER",
    "CONDUCTOR_MODEL",
    "CONDUCTOR_TEMPERATURE",
    "CONDUCTOR_RECURSION_LIMIT",
    "CONDUCTOR_TURN_TIMEOUT_MS",
    "CONDUCTOR_SESSION_ID",
];

/// Runtime configuration for a chat session and its invoker.
///
/// ```
/// use conductor::config::ConductorConfig;
/// use conductor::graph::RecursionBudget;
///
/// let config = ConductorConfig::builder()
///     .recursion_limit(RecursionBudget::new(10).unwrap())
///     .session_id("demo")
///     .build();
/// assert_eq!(config.recursion_limit.get(), 10);
/// assert!(config.turn_timeout().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize)]
pub struct ConductorConfig {
    #[builder(default)]
    pub settings: Settings,
    #[builder(default)]
    pub recursion_limit: RecursionBudget,
    /// Optional deadline for one turn; no deadline when unset.
    pub turn_timeout_ms: Option<u64>,
    #[builder(default = DEFAULT_SESSION_ID.to_string(), into)]
    pub session_id: String,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            recursion_limit: RecursionBudget::default(),
            turn_timeout_ms: None,
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }
}

/// On-disk layer; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    settings: Option<FileSettings>,
    recursion_limit: Option<RecursionBudget>,
    turn_timeout_ms: Option<u64>,
    session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    model_provider: Option<ModelProvider>,
    model: Option<String>,
    temperature: Option<f64>,
}

impl ConductorConfig {
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_ms.map(Duration::from_millis)
    }

    /// Default location of the config file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "conductor")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load every layer.
    ///
    /// An explicit `path` must exist; the default path is used only when
    /// present. `.env` is loaded if found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(default) => Self::load_file(&default)?,
                None => Self::default(),
            },
        };
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(settings) = file.settings {
            config.overlay_settings(settings.model_provider, settings.model, settings.temperature);
        }
        if let Some(limit) = file.recursion_limit {
            config.recursion_limit = limit;
        }
        if file.turn_timeout_ms.is_some() {
            config.turn_timeout_ms = file.turn_timeout_ms;
        }
        if let Some(id) = file.session_id {
            config.session_id = id;
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlay values found through `lookup` (usually the process
    /// environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let provider = lookup("CONDUCTOR_PROVIDER")
            .map(|raw| {
                raw.trim().parse::<ModelProvider>().map_err(|_| {
                    ConductorError::Configuration(format!("unknown provider: {raw}"))
                })
            })
            .transpose()?;
        let model = lookup("CONDUCTOR_MODEL").filter(|m| !m.trim().is_empty());
        let temperature = lookup("CONDUCTOR_TEMPERATURE")
            .map(|raw| parse_env::<f64>("CONDUCTOR_TEMPERATURE", &raw))
            .transpose()?;
        self.overlay_settings(provider, model, temperature);

        if let Some(raw) = lookup("CONDUCTOR_RECURSION_LIMIT") {
            let limit = parse_env::<u32>("CONDUCTOR_RECURSION_LIMIT", &raw)?;
            self.recursion_limit = RecursionBudget::new(limit)?;
        }
        if let Some(raw) = lookup("CONDUCTOR_TURN_TIMEOUT_MS") {
            self.turn_timeout_ms = Some(parse_env::<u64>("CONDUCTOR_TURN_TIMEOUT_MS", &raw)?);
        }
        if let Some(id) = lookup("CONDUCTOR_SESSION_ID").filter(|s| !s.trim().is_empty()) {
            self.session_id = id;
        }
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let t = self.settings.temperature;
        if !t.is_finite() || !(0.0..=2.0).contains(&t) {
            return Err(ConductorError::Configuration(format!(
                "temperature must be within 0.0..=2.0, got {t}"
            )));
        }
        if self.settings.model.trim().is_empty() {
            return Err(ConductorError::Configuration("model must not be empty".into()));
        }
        if self.turn_timeout_ms == Some(0) {
            return Err(ConductorError::Configuration(
                "turn timeout must be positive when set".into(),
            ));
        }
        Ok(())
    }

    /// Apply explicit overrides, e.g. from command-line flags.
    ///
    /// Switching provider without naming a model selects that provider's
    /// default model.
    pub fn overlay_settings(
        &mut self,
        provider: Option<ModelProvider>,
        model: Option<String>,
        temperature: Option<f64>,
    ) {
        if let Some(provider) = provider {
            if provider != self.settings.provider && model.is_none() {
                self.settings.model = provider.default_model().to_string();
            }
            self.settings.provider = provider;
        }
        if let Some(model) = model {
            self.settings.model = model;
        }
        if let Some(temperature) = temperature {
            self.settings.temperature = temperature;
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConductorError::Configuration(format!("invalid {key}: {raw}")))
}
