/// LLM provider calls: OpenAI chat completions and Gemini generateContent
///
/// Request construction, response extraction and status classification are
/// pure functions; only `generate` touches the network.
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ProviderKind, Settings};
use crate::error::SummarizeError;

// ---- OpenAI wire types ----

#[derive(Debug, Serialize)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    pub max_completion_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct OpenAiMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiResponse {
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

// ---- Gemini wire types ----

#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

pub fn openai_request(model: &ModelConfig, prompt: String) -> OpenAiRequest {
    OpenAiRequest {
        model: model.model.to_string(),
        messages: vec![OpenAiMessage {
            role: "user",
            content: prompt,
        }],
        max_completion_tokens: model.max_tokens,
        temperature: model.temperature,
    }
}

pub fn gemini_request(model: &ModelConfig, prompt: String) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart { text: prompt }],
        }],
        generation_config: GeminiGenerationConfig {
            max_output_tokens: model.max_tokens,
            temperature: model.temperature,
        },
    }
}

/// Maps an HTTP error status to the user-facing error class. 401 and 429 get
/// dedicated messages; everything else surfaces status and body text.
pub fn classify_status(status: u16, body: &str) -> SummarizeError {
    match status {
        401 | 403 => SummarizeError::Auth,
        429 => SummarizeError::RateLimited,
        _ => SummarizeError::Provider {
            status,
            message: provider_message(body),
        },
    }
}

/// Both providers wrap failures as {"error": {"message": ...}}; fall back to
/// the raw body when the shape differs.
fn provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

pub fn extract_openai_text(response: OpenAiResponse) -> Result<String, SummarizeError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

pub fn extract_gemini_text(response: GeminiResponse) -> Result<String, SummarizeError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

/// Runs one generation request against the selected model and returns the
/// raw markdown text.
pub async fn generate(settings: &Settings, prompt: String) -> Result<String, SummarizeError> {
    let model = settings.model();
    let key = settings.credential(model)?;
    info!("requesting summary from {}", model.name);

    let client = reqwest::Client::new();
    match model.kind {
        ProviderKind::OpenAi => {
            let response = client
                .post(model.endpoint)
                .bearer_auth(key)
                .json(&openai_request(model, prompt))
                .send()
                .await?;
            let status = response.status().as_u16();
            if !response.status().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_status(status, &body));
            }
            extract_openai_text(response.json::<OpenAiResponse>().await?)
        }
        ProviderKind::Gemini => {
            let response = client
                .post(model.endpoint)
                .query(&[("key", key)])
                .json(&gemini_request(model, prompt))
                .send()
                .await?;
            let status = response.status().as_u16();
            if !response.status().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_status(status, &body));
            }
            extract_gemini_text(response.json::<GeminiResponse>().await?)
        }
    }
}
