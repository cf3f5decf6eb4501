use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::services::gemini::GeminiClient;
use crate::services::options::JsonFileOptionsStore;
use crate::services::serper::SerperClient;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    gemini: Arc<GeminiClient>,
    serper: Arc<SerperClient>,
    options_store: Arc<JsonFileOptionsStore>,
}

impl AppState {
    pub fn new(
        gemini: Arc<GeminiClient>,
        serper: Arc<SerperClient>,
        options_store: Arc<JsonFileOptionsStore>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            gemini,
            serper,
            options_store,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            Arc::new(GeminiClient::from_env()),
            Arc::new(SerperClient::from_env()),
            Arc::new(JsonFileOptionsStore::default_location()),
        )
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn gemini(&self) -> Arc<GeminiClient> {
        Arc::clone(&self.gemini)
    }

    pub fn serper(&self) -> Arc<SerperClient> {
        Arc::clone(&self.serper)
    }

    pub fn options_store(&self) -> Arc<JsonFileOptionsStore> {
        Arc::clone(&self.options_store)
    }
}
