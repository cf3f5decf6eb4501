use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use deckgen_backend::services::deck::{CardSource, DeckPipeline, ImageSource};
use deckgen_backend::services::gemini::{AlternateExample, GeminiError, RawCard};
use deckgen_backend::services::options::GenerationOptions;
use deckgen_backend::services::serper::SerperError;

#[derive(Clone, Default)]
struct MockGenerator {
    deck: Vec<RawCard>,
    fail_deck: bool,
    alternate: Option<AlternateExample>,
    fail_speech_for_examples: bool,
}

impl CardSource for MockGenerator {
    async fn generate_deck(
        &self,
        _words: &[String],
        _options: &GenerationOptions,
    ) -> Result<Vec<RawCard>, GeminiError> {
        if self.fail_deck {
            return Err(GeminiError::NotConfigured("GEMINI_API_KEY"));
        }
        Ok(self.deck.clone())
    }

    async fn generate_alternate_example(
        &self,
        _word: &str,
        _options: &GenerationOptions,
        _meaning: Option<&str>,
        _current_example: Option<&str>,
    ) -> Result<AlternateExample, GeminiError> {
        self.alternate.clone().ok_or(GeminiError::EmptyResponse)
    }

    async fn generate_speech(
        &self,
        text: &str,
        _voice_name: Option<&str>,
    ) -> Result<Vec<u8>, GeminiError> {
        if self.fail_speech_for_examples && text.starts_with("Speak naturally:") {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text.as_bytes().to_vec())
    }
}

/// Image source answering from a query -> URL table, recording every
/// query it receives. The table is shared so a test can revoke hits
/// between resolution runs.
#[derive(Clone, Default)]
struct MockImages {
    hits: Arc<Mutex<HashMap<String, String>>>,
    errors: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockImages {
    fn with_hits(pairs: &[(&str, &str)]) -> Self {
        let table: HashMap<String, String> = pairs
            .iter()
            .map(|(q, url)| (q.to_string(), url.to_string()))
            .collect();
        Self {
            hits: Arc::new(Mutex::new(table)),
            ..Self::default()
        }
    }

    fn clear_hits(&self) {
        self.hits.lock().unwrap().clear();
    }

    fn queries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl ImageSource for MockImages {
    async fn search_image(&self, query: &str) -> Result<Option<String>, SerperError> {
        self.log.lock().unwrap().push(query.to_string());
        if self.errors {
            return Err(SerperError::NotConfigured("SERPER_API_KEY"));
        }
        Ok(self.hits.lock().unwrap().get(query).cloned())
    }
}

fn raw_card(front: &str, back: &str, example: &str, description: &str) -> RawCard {
    RawCard {
        front: front.to_string(),
        back: back.to_string(),
        example: example.to_string(),
        image_description: description.to_string(),
        card_type: "noun".to_string(),
    }
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn generation_failure_yields_one_error_card_per_word() {
    let generator = MockGenerator {
        fail_deck: true,
        ..MockGenerator::default()
    };
    let mut pipeline = DeckPipeline::new(
        generator,
        MockImages::default(),
        GenerationOptions::default(),
    );

    pipeline.generate(&words(&["eins", "zwei", "drei"])).await;

    assert_eq!(pipeline.cards().len(), 3);
    for (card, word) in pipeline.cards().iter().zip(["eins", "zwei", "drei"]) {
        assert_eq!(card.word, word);
        assert!(card.meaning.starts_with("Error:"));
        assert!(card.meaning.contains("GEMINI_API_KEY is not configured"));
    }
}

#[tokio::test]
async fn generation_replaces_previous_set_and_assigns_unique_ids() {
    let generator = MockGenerator {
        deck: vec![
            raw_card("der Apfel", "apple", "Der Apfel ist rot.", "#IMAGE# - a red apple"),
            raw_card("laufen", "to run", "Ich laufe gern.", ""),
        ],
        ..MockGenerator::default()
    };
    let mut pipeline = DeckPipeline::new(
        generator,
        MockImages::default(),
        GenerationOptions::default(),
    );

    pipeline.generate(&words(&["old"])).await;
    pipeline.generate(&words(&["der Apfel", "laufen"])).await;

    let cards = pipeline.cards();
    assert_eq!(cards.len(), 2);
    assert_ne!(cards[0].id, cards[1].id);
    assert_eq!(cards[0].word, "der Apfel");
    assert_eq!(cards[0].meaning, "apple");
    assert_eq!(
        cards[0].image_description.as_deref(),
        Some("#IMAGE# - a red apple")
    );
    // Blank description is normalized away rather than stored empty.
    assert_eq!(cards[1].image_description, None);
    assert!(cards[0].image_url.is_none());
    assert!(cards[0].front_audio_url.is_none());
}

#[tokio::test]
async fn fallback_chain_tries_queries_in_order_until_a_hit() {
    let generator = MockGenerator {
        deck: vec![raw_card(
            "die Freiheit",
            "freedom",
            "Die Freiheit ist wichtig.",
            "#IMAGE# - an abstract concept of liberation",
        )],
        ..MockGenerator::default()
    };
    let images = MockImages::with_hits(&[("die Freiheit freedom", "https://img.test/flag.jpg")]);
    let mut pipeline =
        DeckPipeline::new(generator, images.clone(), GenerationOptions::default());

    pipeline.generate(&words(&["die Freiheit"])).await;
    let updated = pipeline.resolve_images().await;

    assert_eq!(updated, 1);
    let card = &pipeline.cards()[0];
    assert_eq!(card.image_url.as_deref(), Some("https://img.test/flag.jpg"));
    // The winning fallback must not rewrite the example or description.
    assert_eq!(card.example, "Die Freiheit ist wichtig.");
    assert_eq!(
        card.image_description.as_deref(),
        Some("#IMAGE# - an abstract concept of liberation")
    );

    assert_eq!(
        images.queries(),
        vec![
            "an abstract concept of liberation".to_string(),
            "freedom".to_string(),
            "die Freiheit freedom".to_string(),
        ]
    );
}

#[tokio::test]
async fn escalation_applies_new_example_and_description_together() {
    let generator = MockGenerator {
        deck: vec![raw_card(
            "die Freiheit",
            "freedom",
            "Die Freiheit ist wichtig.",
            "#IMAGE# - an abstract concept",
        )],
        alternate: Some(AlternateExample {
            example: "Der Vogel fliegt aus dem Käfig.".to_string(),
            image_description: "#IMAGE# - a bird flying out of an open cage".to_string(),
        }),
        ..MockGenerator::default()
    };
    let images = MockImages::with_hits(&[(
        "a bird flying out of an open cage",
        "https://img.test/cage.jpg",
    )]);
    let mut pipeline =
        DeckPipeline::new(generator, images.clone(), GenerationOptions::default());

    pipeline.generate(&words(&["die Freiheit"])).await;
    let updated = pipeline.resolve_images().await;

    assert_eq!(updated, 1);
    let card = &pipeline.cards()[0];
    assert_eq!(card.image_url.as_deref(), Some("https://img.test/cage.jpg"));
    assert_eq!(card.example, "Der Vogel fliegt aus dem Käfig.");
    assert_eq!(
        card.image_description.as_deref(),
        Some("#IMAGE# - a bird flying out of an open cage")
    );

    // All standard queries ran before the escalated one.
    let queries = images.queries();
    assert_eq!(queries.len(), 5);
    assert_eq!(queries[4], "a bird flying out of an open cage");
}

#[tokio::test]
async fn exhausted_escalation_leaves_card_unchanged() {
    let generator = MockGenerator {
        deck: vec![raw_card(
            "die Freiheit",
            "freedom",
            "Die Freiheit ist wichtig.",
            "#IMAGE# - an abstract concept",
        )],
        alternate: Some(AlternateExample {
            example: "Der Vogel fliegt.".to_string(),
            image_description: "#IMAGE# - a flying bird".to_string(),
        }),
        ..MockGenerator::default()
    };
    let mut pipeline = DeckPipeline::new(
        generator,
        MockImages::default(),
        GenerationOptions::default(),
    );

    pipeline.generate(&words(&["die Freiheit"])).await;
    let before = pipeline.cards().to_vec();
    let updated = pipeline.resolve_images().await;

    assert_eq!(updated, 0);
    assert_eq!(pipeline.cards(), &before[..]);
}

#[tokio::test]
async fn search_errors_are_treated_as_misses_not_poison() {
    let generator = MockGenerator {
        deck: vec![raw_card("der Hund", "dog", "Der Hund bellt.", "#IMAGE# - a dog")],
        ..MockGenerator::default()
    };
    let images = MockImages {
        errors: true,
        ..MockImages::default()
    };
    let mut pipeline =
        DeckPipeline::new(generator, images.clone(), GenerationOptions::default());

    pipeline.generate(&words(&["der Hund"])).await;
    let updated = pipeline.resolve_images().await;

    assert_eq!(updated, 0);
    assert!(pipeline.cards()[0].image_url.is_none());
    // Every standard query was still attempted.
    assert_eq!(images.queries().len(), 4);
}

#[tokio::test]
async fn resolved_cards_are_skipped_on_later_batch_runs() {
    let generator = MockGenerator {
        deck: vec![raw_card("der Apfel", "apple", "", "#IMAGE# - a red apple")],
        ..MockGenerator::default()
    };
    let images = MockImages::with_hits(&[("a red apple", "https://img.test/apple.jpg")]);
    let mut pipeline =
        DeckPipeline::new(generator, images.clone(), GenerationOptions::default());

    pipeline.generate(&words(&["der Apfel"])).await;
    assert_eq!(pipeline.resolve_images().await, 1);
    assert_eq!(pipeline.resolve_images().await, 0);
    assert_eq!(images.queries().len(), 1);
}

#[tokio::test]
async fn failed_re_resolution_keeps_existing_image_url() {
    let generator = MockGenerator {
        deck: vec![raw_card(
            "der Apfel",
            "apple",
            "Der Apfel ist rot.",
            "#IMAGE# - a red apple",
        )],
        ..MockGenerator::default()
    };
    let images = MockImages::with_hits(&[("a red apple", "https://img.test/apple.jpg")]);
    let mut pipeline =
        DeckPipeline::new(generator, images.clone(), GenerationOptions::default());

    pipeline.generate(&words(&["der Apfel"])).await;
    let id = pipeline.cards()[0].id.clone();
    assert!(pipeline.resolve_image(&id).await);
    assert_eq!(
        pipeline.cards()[0].image_url.as_deref(),
        Some("https://img.test/apple.jpg")
    );

    // Every later query misses; the earlier URL must survive.
    images.clear_hits();
    assert!(!pipeline.resolve_image(&id).await);
    assert_eq!(
        pipeline.cards()[0].image_url.as_deref(),
        Some("https://img.test/apple.jpg")
    );
}

#[tokio::test]
async fn audio_slots_fail_independently_and_never_regress() {
    let generator = MockGenerator {
        deck: vec![raw_card(
            "der Apfel",
            "apple",
            "Der Apfel ist rot.",
            "",
        )],
        fail_speech_for_examples: true,
        ..MockGenerator::default()
    };
    let mut pipeline = DeckPipeline::new(
        generator,
        MockImages::default(),
        GenerationOptions::default(),
    );

    pipeline.generate(&words(&["der Apfel"])).await;
    let updated = pipeline.resolve_audio().await;

    assert_eq!(updated, 1);
    let card = &pipeline.cards()[0];
    let front = card.front_audio_url.clone().expect("front audio resolved");
    assert!(front.starts_with("data:audio/wav;base64,"));
    assert!(card.example_audio_url.is_none());

    // A second pass retries only the missing slot and keeps the
    // existing front audio byte-for-byte.
    pipeline.resolve_audio().await;
    assert_eq!(pipeline.cards()[0].front_audio_url.as_deref(), Some(front.as_str()));
}

#[tokio::test]
async fn add_and_remove_cards_edit_the_working_set() {
    let generator = MockGenerator {
        deck: vec![raw_card("der Hund", "dog", "Der Hund bellt.", "")],
        ..MockGenerator::default()
    };
    let mut pipeline = DeckPipeline::new(
        generator,
        MockImages::default(),
        GenerationOptions::default(),
    );

    let id = pipeline.add_card("der Hund").await.unwrap().id;
    assert_eq!(pipeline.cards().len(), 1);

    assert!(pipeline.remove_card(&id));
    assert!(pipeline.cards().is_empty());
    assert!(!pipeline.remove_card(&id));
}

#[tokio::test]
async fn add_card_rejects_blank_words() {
    let mut pipeline = DeckPipeline::new(
        MockGenerator::default(),
        MockImages::default(),
        GenerationOptions::default(),
    );

    let err = pipeline.add_card("   ").await.unwrap_err();
    assert!(matches!(err, GeminiError::EmptyInput(_)));
}

#[tokio::test]
async fn export_emits_one_line_per_card_with_five_fields() {
    let generator = MockGenerator {
        deck: vec![
            raw_card("der Apfel", "apple", "Der Apfel ist rot.", "#IMAGE# - a red apple"),
            raw_card("laufen", "to run", "Ich laufe gern.", ""),
        ],
        ..MockGenerator::default()
    };
    let images = MockImages::with_hits(&[("a red apple", "https://img.test/apple.jpg")]);
    let mut pipeline = DeckPipeline::new(generator, images, GenerationOptions::default());

    pipeline.generate(&words(&["der Apfel", "laufen"])).await;
    pipeline.resolve_images().await;

    let exported = pipeline.export();
    let lines: Vec<&str> = exported.split('\n').collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert_eq!(line.split('\t').count(), 5);
    }
    assert!(lines[0].contains("<img src=\"https://img.test/apple.jpg\">"));
    assert!(!lines[1].contains("<img"));
}
