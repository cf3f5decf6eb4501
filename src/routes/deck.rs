use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::services::gemini::{GeminiError, RawCard};
use crate::services::options::{ExplainingLanguage, GenerationOptions, Language, Level};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDeckRequest {
    #[serde(default)]
    pub words: Option<Vec<String>>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(flatten)]
    pub options: OptionsPayload,
}

/// Option fields arrive as free strings; each one is validated against
/// its enum independently, and invalid values fall back to the stored
/// or built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsPayload {
    pub language: Option<String>,
    pub explaining_language: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(flatten)]
    pub options: OptionsPayload,
}

/// Responses carry the raw generated records; turning them into
/// working-set cards is the caller's concern.
#[derive(Serialize)]
pub struct GenerateDeckResponse {
    pub cards: Vec<RawCard>,
}

#[derive(Serialize)]
pub struct CreateCardResponse {
    pub card: RawCard,
}

pub async fn generate_deck(
    State(state): State<AppState>,
    Json(req): Json<GenerateDeckRequest>,
) -> Result<Json<GenerateDeckResponse>, AppError> {
    let words = collect_words(&req);
    if words.is_empty() {
        return Err(AppError::bad_request("word list is empty"));
    }

    let options = resolve_options(&state, &req.options);

    let cards = state
        .gemini()
        .generate_deck(&words, &options)
        .await
        .map_err(map_gemini_error)?;

    Ok(Json(GenerateDeckResponse { cards }))
}

pub async fn create_card(
    State(state): State<AppState>,
    Json(req): Json<CreateCardRequest>,
) -> Result<Json<CreateCardResponse>, AppError> {
    let word = req
        .word
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::bad_request("word is empty"))?;

    let options = resolve_options(&state, &req.options);

    let raw_cards = state
        .gemini()
        .generate_deck(&[word.to_string()], &options)
        .await
        .map_err(map_gemini_error)?;

    let card = raw_cards
        .into_iter()
        .next()
        .ok_or_else(|| AppError::internal("no card was generated"))?;

    Ok(Json(CreateCardResponse { card }))
}

/// Explicit `words` win; otherwise free-form `input` is split on
/// newlines and commas. Entries are trimmed and blanks dropped.
fn collect_words(req: &GenerateDeckRequest) -> Vec<String> {
    if let Some(words) = &req.words {
        return words
            .iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
    }

    req.input
        .as_deref()
        .unwrap_or_default()
        .split(['\n', ','])
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

pub(super) fn resolve_options(state: &AppState, payload: &OptionsPayload) -> GenerationOptions {
    let mut options = GenerationOptions::load_or_default(&*state.options_store());

    if let Some(language) = payload.language.as_deref().and_then(Language::from_str) {
        options.language = language;
    }
    if let Some(explaining) = payload
        .explaining_language
        .as_deref()
        .and_then(ExplainingLanguage::from_str)
    {
        options.explaining_language = explaining;
    }
    if let Some(level) = payload.level.as_deref().and_then(Level::from_str) {
        options.level = level;
    }

    options
}

pub(super) fn map_gemini_error(err: GeminiError) -> AppError {
    match err {
        GeminiError::EmptyInput(_) => AppError::bad_request(err.to_string()),
        _ => AppError::internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_splits_on_newlines_and_commas() {
        let req = GenerateDeckRequest {
            words: None,
            input: Some("der Apfel, die Banane\n  laufen \n\n".to_string()),
            options: OptionsPayload::default(),
        };
        assert_eq!(
            collect_words(&req),
            vec!["der Apfel", "die Banane", "laufen"]
        );
    }

    #[test]
    fn deck_response_keeps_the_raw_card_field_names() {
        let response = GenerateDeckResponse {
            cards: vec![RawCard {
                front: "die Freiheit".to_string(),
                back: "freedom".to_string(),
                example: "Die Freiheit ist wichtig.".to_string(),
                image_description: "#IMAGE# - an open bird cage".to_string(),
                card_type: "noun feminine".to_string(),
            }],
        };

        let value = serde_json::to_value(&response).unwrap();
        let card = &value["cards"][0];
        assert_eq!(card["front"], "die Freiheit");
        assert_eq!(card["back"], "freedom");
        assert_eq!(card["example"], "Die Freiheit ist wichtig.");
        assert_eq!(card["imageDescription"], "#IMAGE# - an open bird cage");
        assert_eq!(card["type"], "noun feminine");
        assert_eq!(card.as_object().unwrap().len(), 5);
    }

    #[test]
    fn explicit_words_take_precedence_over_input() {
        let req = GenerateDeckRequest {
            words: Some(vec![" eins ".to_string(), String::new()]),
            input: Some("zwei".to_string()),
            options: OptionsPayload::default(),
        };
        assert_eq!(collect_words(&req), vec!["eins"]);
    }
}
