use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::services::options::GenerationOptions;
use crate::services::prompt::{build_alternate_example_prompt, build_deck_prompt};
use crate::services::schema::{alternate_example_response_schema, deck_response_schema};
use crate::services::wav::pcm_to_wav;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_API_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_VOICE: &str = "Kore";

// The TTS modality returns raw PCM in this format unless it already
// wrapped the payload in a WAV container.
const TTS_CHANNELS: u16 = 1;
const TTS_SAMPLE_RATE: u32 = 24_000;
const TTS_BITS_PER_SAMPLE: u16 = 16;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub tts_model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model returned no usable payload")]
    EmptyResponse,
    #[error("invalid response shape: {0}")]
    InvalidShape(&'static str),
    #[error("audio payload decode failed: {0}")]
    AudioDecode(#[from] base64::DecodeError),
}

/// One card as returned by deck generation, before it becomes a
/// pipeline `Card`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    pub front: String,
    pub back: String,
    pub example: String,
    pub image_description: String,
    #[serde(rename = "type")]
    pub card_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateExample {
    pub example: String,
    pub image_description: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn from_env() -> Self {
        let api_key = env_string("GEMINI_API_KEY");
        let model = env_string("GEMINI_API_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let tts_model =
            env_string("GEMINI_TTS_MODEL").unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string());
        let api_endpoint = env_string("GEMINI_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout = Duration::from_millis(env_u64("GEMINI_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        Self::new(GeminiConfig {
            api_key,
            model,
            tts_model,
            api_endpoint,
            timeout,
        })
    }

    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    fn api_key(&self) -> Result<&str, GeminiError> {
        self.config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(GeminiError::NotConfigured("GEMINI_API_KEY"))
    }

    /// Generate the whole deck in one structured-JSON call. The full
    /// word list goes into a single request so terminology stays
    /// consistent across the deck. No retries here; that is a caller
    /// concern.
    pub async fn generate_deck(
        &self,
        words: &[String],
        options: &GenerationOptions,
    ) -> Result<Vec<RawCard>, GeminiError> {
        let api_key = self.api_key()?;
        if words.iter().all(|w| w.trim().is_empty()) {
            return Err(GeminiError::EmptyInput("words"));
        }

        let prompt = format!(
            "{}\n\nInput: {}",
            build_deck_prompt(options),
            words.join(", ")
        );
        let payload = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": deck_response_schema(),
            },
        });

        let response = self.generate_content(&self.config.model, api_key, &payload).await?;
        let text = response.first_text().ok_or(GeminiError::EmptyResponse)?;
        parse_deck_cards(text)
    }

    /// Generate one fresh example + image description for a word whose
    /// current example keeps failing image search. The current example
    /// is passed as context so the model does not repeat it.
    pub async fn generate_alternate_example(
        &self,
        word: &str,
        options: &GenerationOptions,
        meaning: Option<&str>,
        current_example: Option<&str>,
    ) -> Result<AlternateExample, GeminiError> {
        let api_key = self.api_key()?;
        let word = word.trim();
        if word.is_empty() {
            return Err(GeminiError::EmptyInput("word"));
        }

        let mut prompt = format!("{}\n\nWord: {word}", build_alternate_example_prompt(options));
        if let Some(meaning) = meaning.map(str::trim).filter(|m| !m.is_empty()) {
            prompt.push_str(&format!("\nMeaning: {meaning}"));
        }
        if let Some(example) = current_example.map(str::trim).filter(|e| !e.is_empty()) {
            prompt.push_str(&format!("\nCurrent example (do not repeat it): {example}"));
        }

        let payload = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": alternate_example_response_schema(),
            },
        });

        let response = self.generate_content(&self.config.model, api_key, &payload).await?;
        let text = response.first_text().ok_or(GeminiError::EmptyResponse)?;
        parse_alternate_example(text)
    }

    /// Synthesize speech for `text`, returning WAV bytes. The upstream
    /// audio modality is not guaranteed to return a fixed container
    /// format, so raw PCM payloads are wrapped locally.
    pub async fn generate_speech(
        &self,
        text: &str,
        voice_name: Option<&str>,
    ) -> Result<Vec<u8>, GeminiError> {
        let api_key = self.api_key()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GeminiError::EmptyInput("text"));
        }

        let voice = voice_name
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VOICE);
        let payload = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice }
                    }
                },
            },
        });

        let response = self
            .generate_content(&self.config.tts_model, api_key, &payload)
            .await?;
        let inline = response
            .first_inline_data()
            .ok_or(GeminiError::EmptyResponse)?;

        let compact: String = inline.data.chars().filter(|c| !c.is_whitespace()).collect();
        let raw = BASE64.decode(compact.as_bytes())?;
        Ok(normalize_audio(raw, inline.mime_type.as_deref().unwrap_or("")))
    }

    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_endpoint, model
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        match serde_json::from_slice(&bytes) {
            Ok(v) => Ok(v),
            Err(e) => {
                let body_str = String::from_utf8_lossy(&bytes);
                tracing::error!("Failed to parse Gemini response JSON: {}. Body: {}", e, body_str);
                Err(GeminiError::Json(e))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .filter(|d| !d.data.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

/// Parse deck-generation output. Strict on the top-level shape (a
/// `cards` array must exist); lenient per field inside it, defaulting
/// anything missing to an empty string.
fn parse_deck_cards(text: &str) -> Result<Vec<RawCard>, GeminiError> {
    let parsed: Value = serde_json::from_str(text)?;
    let cards = parsed
        .get("cards")
        .and_then(Value::as_array)
        .ok_or(GeminiError::InvalidShape("missing or invalid 'cards' array"))?;

    Ok(cards
        .iter()
        .map(|entry| RawCard {
            front: coerce_field(entry, "front"),
            back: coerce_field(entry, "back"),
            example: coerce_field(entry, "example"),
            image_description: coerce_field(entry, "imageDescription"),
            card_type: coerce_field(entry, "type"),
        })
        .collect())
}

fn parse_alternate_example(text: &str) -> Result<AlternateExample, GeminiError> {
    let parsed: Value = serde_json::from_str(text)?;

    let example = coerce_field(&parsed, "example");
    if example.trim().is_empty() {
        return Err(GeminiError::InvalidShape("missing 'example'"));
    }
    let image_description = coerce_field(&parsed, "imageDescription");
    if image_description.trim().is_empty() {
        return Err(GeminiError::InvalidShape("missing 'imageDescription'"));
    }

    Ok(AlternateExample {
        example,
        image_description,
    })
}

fn coerce_field(entry: &Value, key: &str) -> String {
    match entry.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn normalize_audio(raw: Vec<u8>, mime_type: &str) -> Vec<u8> {
    if mime_type.to_lowercase().contains("wav") {
        raw
    } else {
        pcm_to_wav(&raw, TTS_CHANNELS, TTS_SAMPLE_RATE, TTS_BITS_PER_SAMPLE)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}
