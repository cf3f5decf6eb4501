//! Structured-output contracts passed to Gemini's JSON mode.
//!
//! These bias the model toward the right shape; the client still
//! validates every response independently.

use serde_json::{json, Value};

/// Response schema for deck generation: `{ cards: RawCard[] }`.
pub fn deck_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "description": "Generated Anki deck with a list of vocabulary cards",
        "properties": {
            "cards": {
                "type": "ARRAY",
                "description": "List of flashcard objects",
                "items": card_schema(),
            }
        },
        "required": ["cards"],
    })
}

/// Response schema for a single alternate example + image description.
pub fn alternate_example_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "description": "Alternate example sentence and image description",
        "properties": {
            "example": {
                "type": "STRING",
                "description": "Example sentence in the vocabulary language",
            },
            "imageDescription": {
                "type": "STRING",
                "description": "Scene description for image search; must start with #IMAGE#",
            },
        },
        "required": ["example", "imageDescription"],
    })
}

fn card_schema() -> Value {
    json!({
        "type": "OBJECT",
        "description": "A single vocabulary flashcard",
        "properties": {
            "front": {
                "type": "STRING",
                "description": "Front of the card (word, with article for gendered nouns)",
            },
            "back": {
                "type": "STRING",
                "description": "Back of the card (translation or meaning)",
            },
            "example": {
                "type": "STRING",
                "description": "Example sentence using the word",
            },
            "imageDescription": {
                "type": "STRING",
                "description": "Description for image search; start with #IMAGE# and describe the scene",
            },
            "type": {
                "type": "STRING",
                "description": "Part of speech label",
            },
        },
        "required": ["front", "back", "example", "imageDescription", "type"],
    })
}
