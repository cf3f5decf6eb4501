//! Deck pipeline orchestrator.
//!
//! Owns the working card set and drives the enrichment phases: deck
//! generation, image resolution (with the fallback/escalation chain),
//! audio synthesis, and export. All card-set mutation happens here,
//! either as whole-set replacement or per-id map-to-new-collection;
//! fields are never mutated in place.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::services::export;
use crate::services::gemini::{AlternateExample, GeminiClient, GeminiError, RawCard};
use crate::services::options::GenerationOptions;
use crate::services::prompt::IMAGE_MARKER;
use crate::services::serper::{SerperClient, SerperError};

/// One flashcard in the working set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub word: String,
    pub meaning: String,
    pub example: String,
    pub part_of_speech: String,
    pub image_description: Option<String>,
    pub image_url: Option<String>,
    pub front_audio_url: Option<String>,
    pub example_audio_url: Option<String>,
    pub loading: bool,
}

impl Card {
    pub fn from_raw(raw: RawCard) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            word: raw.front,
            meaning: raw.back,
            example: raw.example,
            part_of_speech: raw.card_type,
            image_description: Some(raw.image_description).filter(|d| !d.trim().is_empty()),
            image_url: None,
            front_audio_url: None,
            example_audio_url: None,
            loading: false,
        }
    }

    /// Placeholder card recording a generation failure for one input
    /// word, so the displayed card count always matches the submitted
    /// word count.
    pub fn failed(word: &str, message: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            word: word.to_string(),
            meaning: format!("Error: {message}"),
            example: String::new(),
            part_of_speech: String::new(),
            image_description: None,
            image_url: None,
            front_audio_url: None,
            example_audio_url: None,
            loading: false,
        }
    }
}

/// Deck-generation seam; implemented by [`GeminiClient`] and by test
/// doubles.
#[allow(async_fn_in_trait)]
pub trait CardSource {
    async fn generate_deck(
        &self,
        words: &[String],
        options: &GenerationOptions,
    ) -> Result<Vec<RawCard>, GeminiError>;

    async fn generate_alternate_example(
        &self,
        word: &str,
        options: &GenerationOptions,
        meaning: Option<&str>,
        current_example: Option<&str>,
    ) -> Result<AlternateExample, GeminiError>;

    async fn generate_speech(
        &self,
        text: &str,
        voice_name: Option<&str>,
    ) -> Result<Vec<u8>, GeminiError>;
}

/// Image-lookup seam; implemented by [`SerperClient`] and test doubles.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    async fn search_image(&self, query: &str) -> Result<Option<String>, SerperError>;
}

impl CardSource for GeminiClient {
    async fn generate_deck(
        &self,
        words: &[String],
        options: &GenerationOptions,
    ) -> Result<Vec<RawCard>, GeminiError> {
        GeminiClient::generate_deck(self, words, options).await
    }

    async fn generate_alternate_example(
        &self,
        word: &str,
        options: &GenerationOptions,
        meaning: Option<&str>,
        current_example: Option<&str>,
    ) -> Result<AlternateExample, GeminiError> {
        GeminiClient::generate_alternate_example(self, word, options, meaning, current_example)
            .await
    }

    async fn generate_speech(
        &self,
        text: &str,
        voice_name: Option<&str>,
    ) -> Result<Vec<u8>, GeminiError> {
        GeminiClient::generate_speech(self, text, voice_name).await
    }
}

impl ImageSource for SerperClient {
    async fn search_image(&self, query: &str) -> Result<Option<String>, SerperError> {
        SerperClient::search_image(self, query).await
    }
}

/// Strip every leading `#IMAGE#` marker (case-insensitive, with an
/// optional `-` separator) from an image description. Removing all
/// leading markers keeps sanitization idempotent.
pub fn strip_image_marker(description: &str) -> String {
    let mut rest = description.trim();
    while rest.len() >= IMAGE_MARKER.len()
        && rest.as_bytes()[..IMAGE_MARKER.len()].eq_ignore_ascii_case(IMAGE_MARKER.as_bytes())
    {
        rest = rest[IMAGE_MARKER.len()..].trim_start();
        rest = rest.strip_prefix('-').unwrap_or(rest).trim_start();
    }
    rest.to_string()
}

/// Primary image-search query for a card: the sanitized description,
/// falling back to the bare word.
pub fn image_search_query(card: &Card) -> String {
    let from_description = card
        .image_description
        .as_deref()
        .map(strip_image_marker)
        .unwrap_or_default();
    if !from_description.is_empty() {
        from_description
    } else {
        card.word.trim().to_string()
    }
}

/// Ordered fallback queries tried after the primary query fails:
/// the meaning alone, then word + meaning, then the bare word. Entries
/// equal to the primary or already present are skipped.
fn fallback_queries(card: &Card, primary: &str) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();
    let word = card.word.trim();
    let meaning = card.meaning.trim();

    if !meaning.is_empty() && meaning != primary {
        queries.push(meaning.to_string());
    }

    if !word.is_empty() && !meaning.is_empty() {
        let combined = format!("{word} {meaning}");
        if combined != primary && !queries.iter().any(|q| q == &combined) {
            queries.push(combined);
        }
    }

    if !word.is_empty() && word != primary && !queries.iter().any(|q| q == word) {
        queries.push(word.to_string());
    }

    queries
}

/// Outcome of one card's image-resolution attempt. `replacement`
/// carries the new example/description pair when the escalation path
/// produced the hit; it is applied atomically with the URL.
#[derive(Debug, Clone)]
struct ImageResolution {
    id: String,
    url: String,
    replacement: Option<(String, String)>,
}

#[derive(Debug, Clone)]
struct AudioResolution {
    id: String,
    front: Option<String>,
    example: Option<String>,
}

pub struct DeckPipeline<G, S> {
    generator: G,
    images: S,
    options: GenerationOptions,
    cards: Vec<Card>,
}

impl<G: CardSource, S: ImageSource> DeckPipeline<G, S> {
    pub fn new(generator: G, images: S, options: GenerationOptions) -> Self {
        Self {
            generator,
            images,
            options,
            cards: Vec::new(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GenerationOptions) {
        self.options = options;
    }

    /// Split free-form input into trimmed, non-empty lines and generate
    /// a deck from them.
    pub async fn generate_from_input(&mut self, input: &str) {
        let words: Vec<String> = input
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.generate(&words).await;
    }

    /// Deck generation phase. Replaces the whole working set: one card
    /// per returned record on success, one error-tagged card per input
    /// word on failure. Either way the card count equals the input
    /// word count's 1:1 feedback expectation.
    pub async fn generate(&mut self, words: &[String]) {
        if words.is_empty() {
            return;
        }

        match self.generator.generate_deck(words, &self.options).await {
            Ok(raw_cards) => {
                self.cards = raw_cards.into_iter().map(Card::from_raw).collect();
            }
            Err(err) => {
                tracing::error!(error = %err, "deck generation failed");
                self.cards = words
                    .iter()
                    .map(|word| Card::failed(word, &err.to_string()))
                    .collect();
            }
        }
    }

    /// Create a single card and append it to the working set.
    pub async fn add_card(&mut self, word: &str) -> Result<Card, GeminiError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(GeminiError::EmptyInput("word"));
        }

        let raw_cards = self
            .generator
            .generate_deck(&[word.to_string()], &self.options)
            .await?;
        let raw = raw_cards.into_iter().next().ok_or(GeminiError::EmptyResponse)?;

        let card = Card::from_raw(raw);
        self.cards.push(card.clone());
        Ok(card)
    }

    pub fn remove_card(&mut self, id: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        self.cards.len() != before
    }

    /// Resolve the image for one card on demand. Returns true when the
    /// card was updated; on failure the card is left entirely
    /// unchanged.
    pub async fn resolve_image(&mut self, id: &str) -> bool {
        let Some(card) = self.card(id).cloned() else {
            return false;
        };

        match self.resolve_card_image(&card).await {
            Some(resolution) => {
                self.apply_image_resolution(resolution);
                true
            }
            None => false,
        }
    }

    /// Batch image resolution for every card lacking an image. Cards
    /// are processed concurrently and independently; only successful
    /// lookups are merged back. Returns the number of cards updated.
    pub async fn resolve_images(&mut self) -> usize {
        let eligible: Vec<Card> = self
            .cards
            .iter()
            .filter(|c| c.image_url.is_none() && !image_search_query(c).is_empty())
            .cloned()
            .collect();
        if eligible.is_empty() {
            return 0;
        }

        let results = join_all(eligible.iter().map(|card| self.resolve_card_image(card))).await;

        let mut updated = 0;
        for resolution in results.into_iter().flatten() {
            self.apply_image_resolution(resolution);
            updated += 1;
        }
        updated
    }

    /// Batch audio resolution. Each card's front and example slots are
    /// independently best-effort; existing audio is never overwritten
    /// or cleared. Returns the number of cards that gained audio.
    pub async fn resolve_audio(&mut self) -> usize {
        let eligible: Vec<Card> = self
            .cards
            .iter()
            .filter(|c| needs_front_audio(c) || needs_example_audio(c))
            .cloned()
            .collect();
        if eligible.is_empty() {
            return 0;
        }

        let results = join_all(eligible.iter().map(|card| self.resolve_card_audio(card))).await;

        let mut updated = 0;
        for resolution in results {
            if resolution.front.is_some() || resolution.example.is_some() {
                self.apply_audio_resolution(resolution);
                updated += 1;
            }
        }
        updated
    }

    /// Serialize the current card set for export.
    pub fn export(&self) -> String {
        export::export_deck(&self.cards)
    }

    async fn resolve_card_image(&self, card: &Card) -> Option<ImageResolution> {
        let primary = image_search_query(card);
        if primary.is_empty() {
            return None;
        }

        if let Some(url) = self.try_search(&primary).await {
            return Some(ImageResolution {
                id: card.id.clone(),
                url,
                replacement: None,
            });
        }

        for query in fallback_queries(card, &primary) {
            if let Some(url) = self.try_search(&query).await {
                return Some(ImageResolution {
                    id: card.id.clone(),
                    url,
                    replacement: None,
                });
            }
        }

        // Last resort: ask for a brand-new, more concrete example and
        // search against that instead.
        self.escalate_card_image(card).await
    }

    async fn escalate_card_image(&self, card: &Card) -> Option<ImageResolution> {
        let meaning = Some(card.meaning.as_str()).filter(|m| !m.trim().is_empty());
        let current_example = Some(card.example.as_str()).filter(|e| !e.trim().is_empty());

        let alternate = match self
            .generator
            .generate_alternate_example(&card.word, &self.options, meaning, current_example)
            .await
        {
            Ok(alt) => alt,
            Err(err) => {
                tracing::warn!(error = %err, word = %card.word, "alternate example generation failed");
                return None;
            }
        };

        let description_query = strip_image_marker(&alternate.image_description);
        let url = match self.try_search(&description_query).await {
            Some(url) => Some(url),
            None => self.try_search(&alternate.example).await,
        }?;

        Some(ImageResolution {
            id: card.id.clone(),
            url,
            replacement: Some((alternate.example, alternate.image_description)),
        })
    }

    async fn resolve_card_audio(&self, card: &Card) -> AudioResolution {
        let front = if needs_front_audio(card) {
            self.try_speech(&format!("Speak clearly: {}", card.word.trim()))
                .await
        } else {
            None
        };

        let example = if needs_example_audio(card) {
            self.try_speech(&format!("Speak naturally: {}", card.example.trim()))
                .await
        } else {
            None
        };

        AudioResolution {
            id: card.id.clone(),
            front,
            example,
        }
    }

    async fn try_search(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        match self.images.search_image(query).await {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, query, "image search attempt failed");
                None
            }
        }
    }

    async fn try_speech(&self, text: &str) -> Option<String> {
        match self.generator.generate_speech(text, None).await {
            Ok(wav) => Some(wav_data_url(&wav)),
            Err(err) => {
                tracing::warn!(error = %err, "speech synthesis attempt failed");
                None
            }
        }
    }

    fn apply_image_resolution(&mut self, resolution: ImageResolution) {
        self.cards = self
            .cards
            .iter()
            .map(|card| {
                if card.id != resolution.id {
                    return card.clone();
                }
                let mut updated = card.clone();
                updated.image_url = Some(resolution.url.clone());
                if let Some((example, description)) = &resolution.replacement {
                    updated.example = example.clone();
                    updated.image_description = Some(description.clone());
                }
                updated
            })
            .collect();
    }

    fn apply_audio_resolution(&mut self, resolution: AudioResolution) {
        self.cards = self
            .cards
            .iter()
            .map(|card| {
                if card.id != resolution.id {
                    return card.clone();
                }
                let mut updated = card.clone();
                updated.front_audio_url =
                    card.front_audio_url.clone().or_else(|| resolution.front.clone());
                updated.example_audio_url = card
                    .example_audio_url
                    .clone()
                    .or_else(|| resolution.example.clone());
                updated
            })
            .collect();
    }
}

fn needs_front_audio(card: &Card) -> bool {
    card.front_audio_url.is_none() && !card.word.trim().is_empty()
}

fn needs_example_audio(card: &Card) -> bool {
    card.example_audio_url.is_none() && !card.example.trim().is_empty()
}

fn wav_data_url(wav: &[u8]) -> String {
    format!("data:audio/wav;base64,{}", BASE64.encode(wav))
}
