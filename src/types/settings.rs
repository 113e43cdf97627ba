//! Model settings passed through to the agent graph.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Default sampling temperature for every provider.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Settings handed to the agent graph unchanged.
///
/// Owned by the caller; the invoker only reads them.
///
/// ```
/// use conductor::types::{ModelProvider, Settings};
///
/// let settings = Settings::builder()
///     .provider(ModelProvider::OpenAi)
///     .model("gpt-4o")
///     .build();
/// assert_eq!(settings.temperature, 0.3);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(rename = "model_provider")]
    pub provider: ModelProvider,
    #[builder(into)]
    pub model: String,
    #[builder(default = DEFAULT_TEMPERATURE)]
    pub temperature: f64,
}

impl Settings {
    /// Settings for a provider using its default model.
    pub fn for_provider(provider: ModelProvider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_provider(ModelProvider::OpenAi)
    }
}

/// Model provider identifier.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelProvider {
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
    #[serde(rename = "azure_openai", alias = "azure-openai")]
    #[strum(to_string = "azure_openai", serialize = "azure-openai")]
    AzureOpenAi,
    Groq,
}

impl ModelProvider {
    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::AzureOpenAi => "gpt-4o",
            Self::Groq => "llama-3.1-70b-versatile",
        }
    }

    /// Models offered for selection, default first.
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"],
            Self::AzureOpenAi => &["gpt-4o", "gpt-4", "gpt-35-turbo"],
            Self::Groq => &["llama-3.1-70b-versatile"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn provider_parses_both_azure_spellings() {
        assert_eq!(
            "azure_openai".parse::<ModelProvider>().unwrap(),
            ModelProvider::AzureOpenAi
        );
        assert_eq!(
            "azure-openai".parse::<ModelProvider>().unwrap(),
            ModelProvider::AzureOpenAi
        );
        assert_eq!("openai".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAi);
        assert!("anthropic".parse::<ModelProvider>().is_err());
    }

    #[test]
    fn provider_display_matches_serde_name() {
        for provider in ModelProvider::iter() {
            let json = serde_json::to_value(provider).unwrap();
            assert_eq!(json, provider.to_string());
        }
    }

    #[test]
    fn default_model_is_first_listed() {
        for provider in ModelProvider::iter() {
            assert_eq!(provider.models()[0], provider.default_model());
        }
    }

    #[test]
    fn settings_serialize_with_model_provider_key() {
        let json = serde_json::to_value(Settings::for_provider(ModelProvider::Groq)).unwrap();
        assert_eq!(json["model_provider"], "groq");
        assert_eq!(json["model"], "llama-3.1-70b-versatile");
        assert_eq!(json["temperature"], 0.3);
    }
}
