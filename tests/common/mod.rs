use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use deckgen_backend::services::gemini::{GeminiClient, GeminiConfig};
use deckgen_backend::services::options::JsonFileOptionsStore;
use deckgen_backend::services::serper::{SerperClient, SerperConfig};
use deckgen_backend::state::AppState;

/// App with deliberately unconfigured upstream clients, so tests never
/// depend on ambient credentials and never touch the network.
pub fn create_test_app() -> Router {
    let gemini = GeminiClient::new(GeminiConfig {
        api_key: None,
        model: "test-model".to_string(),
        tts_model: "test-tts-model".to_string(),
        api_endpoint: "http://127.0.0.1:0".to_string(),
        timeout: Duration::from_millis(100),
    });

    let serper = SerperClient::new(SerperConfig {
        api_key: None,
        locale: None,
        timeout: Duration::from_millis(100),
    });

    let options_store = JsonFileOptionsStore::new(
        std::env::temp_dir()
            .join("deckgen-tests")
            .join("options-missing.json"),
    );

    let state = AppState::new(Arc::new(gemini), Arc::new(serper), Arc::new(options_store));
    deckgen_backend::create_app_with_state(state)
}
