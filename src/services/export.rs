//! Tab-delimited deck export for Anki-style import.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::services::deck::Card;

/// Serialize the card set as one tab-delimited line per card, in deck
/// order: front, back, example, image HTML, type. Field text is
/// sanitized so tabs and line breaks can never corrupt the column or
/// row structure.
pub fn export_deck(cards: &[Card]) -> String {
    cards
        .iter()
        .map(export_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn export_line(card: &Card) -> String {
    let image = card
        .image_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| format!("<img src=\"{}\">", sanitize(url)))
        .unwrap_or_default();

    [
        sanitize(&card.word),
        sanitize(&card.meaning),
        sanitize(&card.example),
        image,
        sanitize(&card.part_of_speech),
    ]
    .join("\t")
}

fn sanitize(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

/// Suggested download filename with a short random suffix, so repeated
/// exports don't overwrite each other.
pub fn export_filename() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("deck-{suffix}.txt")
}
