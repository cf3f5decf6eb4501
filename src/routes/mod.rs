pub mod deck;
mod example;
mod health;
mod image;
mod tts;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/generate-deck",
            post(deck::generate_deck).fallback(fallback_handler),
        )
        .route(
            "/api/create-card",
            post(deck::create_card).fallback(fallback_handler),
        )
        .route(
            "/api/generate-example",
            post(example::generate_example).fallback(fallback_handler),
        )
        .route(
            "/api/search-image",
            get(image::search_image_get)
                .post(image::search_image_post)
                .fallback(fallback_handler),
        )
        .route("/api/tts", post(tts::synthesize).fallback(fallback_handler))
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "route not found").into_response()
}
