/// Model catalog and user settings
///
/// Settings are read-only to the content script; the options page owns them.
use crate::error::SummarizeError;
use crate::storage;

pub const SETTING_OPENAI_KEY: &str = "openai_api_key";
pub const SETTING_GEMINI_KEY: &str = "gemini_api_key";
pub const SETTING_YOUTUBE_KEY: &str = "youtube_api_key";
pub const SETTING_SUMMARY_PROMPT: &str = "user_prompt";
pub const SETTING_COMMENTS_PROMPT: &str = "comments_prompt";
pub const SETTING_SELECTED_MODEL: &str = "selected_ai_model";

pub const DEFAULT_MODEL_ID: &str = "openai-o4-mini";

pub const DEFAULT_SUMMARY_PROMPT: &str = "\
The following is the transcript of a video. Summarize it as follows:

1. State the core topic and main ideas concisely
2. List the important points in order
3. Include the overall conclusion or message
4. Call out any practical tips separately, if present

Keep the summary free of repetition and filler:";

pub const DEFAULT_COMMENTS_PROMPT: &str = "\
The following are viewer comments on a video. Analyze them and summarize:

1. Overall viewer sentiment (positive/negative/neutral)
2. The most frequently raised points or issues
3. What viewers agree with or find interesting
4. Constructive criticism and suggestions
5. The general mood of the comment section

Exclude profanity and inappropriate content:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

/// One selectable model, mirroring the entries on the options page.
#[derive(Debug, Clone, Copy)]
pub struct ModelConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ProviderKind,
    pub model: &'static str,
    pub endpoint: &'static str,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub const MODELS: &[ModelConfig] = &[
    ModelConfig {
        id: "openai-o4-mini",
        name: "OpenAI o4-mini",
        kind: ProviderKind::OpenAi,
        model: "o4-mini",
        endpoint: "https://api.openai.com/v1/chat/completions",
        max_tokens: 30_000,
        temperature: 0.7,
    },
    ModelConfig {
        id: "gemini-2.5-pro",
        name: "Google Gemini 2.5 Pro",
        kind: ProviderKind::Gemini,
        model: "gemini-2.5-pro",
        endpoint: "https://generativelanguage.googleapis.com/v1/models/gemini-2.5-pro:generateContent",
        max_tokens: 32_000,
        temperature: 0.7,
    },
    ModelConfig {
        id: "gemini-3-pro-preview",
        name: "Google Gemini 3 Pro Preview",
        kind: ProviderKind::Gemini,
        model: "gemini-3-pro-preview",
        endpoint: "https://generativelanguage.googleapis.com/v1/models/gemini-3-pro-preview:generateContent",
        max_tokens: 32_000,
        temperature: 1.0,
    },
];

pub fn model_by_id(id: &str) -> Option<&'static ModelConfig> {
    MODELS.iter().find(|m| m.id == id)
}

/// Snapshot of user configuration at the start of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub openai_key: Option<String>,
    pub gemini_key: Option<String>,
    pub youtube_key: Option<String>,
    pub summary_prompt: String,
    pub comments_prompt: String,
    pub model_id: String,
}

impl Settings {
    pub async fn load() -> Settings {
        Settings {
            openai_key: storage::get_string(SETTING_OPENAI_KEY).await,
            gemini_key: storage::get_string(SETTING_GEMINI_KEY).await,
            youtube_key: storage::get_string(SETTING_YOUTUBE_KEY).await,
            summary_prompt: storage::get_string(SETTING_SUMMARY_PROMPT)
                .await
                .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string()),
            comments_prompt: storage::get_string(SETTING_COMMENTS_PROMPT)
                .await
                .unwrap_or_else(|| DEFAULT_COMMENTS_PROMPT.to_string()),
            model_id: storage::get_string(SETTING_SELECTED_MODEL)
                .await
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
        }
    }

    /// The configured model, falling back to the default when the stored id
    /// is stale (e.g. a model removed in an update).
    pub fn model(&self) -> &'static ModelConfig {
        model_by_id(&self.model_id)
            .or_else(|| model_by_id(DEFAULT_MODEL_ID))
            .expect("default model is always in the catalog")
    }

    /// The credential the selected model needs, or a configuration-missing
    /// error naming the provider.
    pub fn credential(&self, model: &ModelConfig) -> Result<&str, SummarizeError> {
        let key = match model.kind {
            ProviderKind::OpenAi => self.openai_key.as_deref(),
            ProviderKind::Gemini => self.gemini_key.as_deref(),
        };
        key.filter(|k| !k.is_empty())
            .ok_or(SummarizeError::MissingCredential(model.kind.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_catalog_lookup() {
        assert_eq!(model_by_id("openai-o4-mini").unwrap().model, "o4-mini");
        assert_eq!(
            model_by_id("gemini-2.5-pro").unwrap().kind,
            ProviderKind::Gemini
        );
        assert!(model_by_id("nonexistent").is_none());
    }

    #[test]
    fn test_unknown_model_falls_back_to_default() {
        let settings = Settings {
            model_id: "removed-model".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.model().id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_credential_present() {
        let settings = Settings {
            openai_key: Some("sk-test".to_string()),
            ..Settings::default()
        };
        let model = model_by_id("openai-o4-mini").unwrap();
        assert_eq!(settings.credential(model).unwrap(), "sk-test");
    }

    #[test]
    fn test_credential_missing_names_provider() {
        let settings = Settings {
            openai_key: Some("sk-test".to_string()),
            gemini_key: None,
            ..Settings::default()
        };
        let model = model_by_id("gemini-2.5-pro").unwrap();
        match settings.credential(model) {
            Err(SummarizeError::MissingCredential(provider)) => {
                assert_eq!(provider, "Gemini")
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_credential_counts_as_missing() {
        let settings = Settings {
            openai_key: Some(String::new()),
            ..Settings::default()
        };
        let model = model_by_id("openai-o4-mini").unwrap();
        assert!(settings.credential(model).is_err());
    }
}
