use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::routes::deck::{map_gemini_error, resolve_options, OptionsPayload};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateExampleRequest {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub current_example: Option<String>,
    #[serde(flatten)]
    pub options: OptionsPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateExampleResponse {
    pub example: String,
    pub image_description: String,
}

pub async fn generate_example(
    State(state): State<AppState>,
    Json(req): Json<GenerateExampleRequest>,
) -> Result<Json<GenerateExampleResponse>, AppError> {
    let word = req
        .word
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::bad_request("word is empty"))?;

    let options = resolve_options(&state, &req.options);
    let meaning = req.meaning.as_deref().map(str::trim).filter(|m| !m.is_empty());
    let current_example = req
        .current_example
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let alternate = state
        .gemini()
        .generate_alternate_example(word, &options, meaning, current_example)
        .await
        .map_err(map_gemini_error)?;

    Ok(Json(GenerateExampleResponse {
        example: alternate.example,
        image_description: alternate.image_description,
    }))
}
