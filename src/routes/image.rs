use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::services::serper::SerperError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImageSearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchResponse {
    pub image_url: String,
}

pub async fn search_image_get(
    State(state): State<AppState>,
    Query(params): Query<ImageSearchParams>,
) -> Result<Json<ImageSearchResponse>, AppError> {
    search(&state, params).await
}

pub async fn search_image_post(
    State(state): State<AppState>,
    Json(params): Json<ImageSearchParams>,
) -> Result<Json<ImageSearchResponse>, AppError> {
    search(&state, params).await
}

async fn search(
    state: &AppState,
    params: ImageSearchParams,
) -> Result<Json<ImageSearchResponse>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::bad_request("search query is empty"))?;

    match state.serper().search_image(query).await {
        Ok(Some(image_url)) => Ok(Json(ImageSearchResponse { image_url })),
        Ok(None) => Err(AppError::not_found("No image found for this query")),
        Err(SerperError::EmptyQuery) => Err(AppError::bad_request("search query is empty")),
        Err(err) => Err(AppError::internal(err.to_string())),
    }
}
