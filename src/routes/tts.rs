use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::response::AppError;
use crate::routes::deck::map_gemini_error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice_name: Option<String>,
}

/// Synthesize speech and return the WAV bytes directly, so the client
/// can feed the body to an audio element or download it as-is.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(req): Json<TtsRequest>,
) -> Result<Response, AppError> {
    let text = req
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("text is empty"))?;

    let voice = req
        .voice_name
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let wav = state
        .gemini()
        .generate_speech(text, voice)
        .await
        .map_err(map_gemini_error)?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, wav.len())
        .body(Body::from(wav))
        .map_err(|err| AppError::internal(err.to_string()))?;

    Ok(response)
}
