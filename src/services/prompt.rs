//! Natural-language instruction text for the two generation tasks.
//!
//! Pure string construction from the closed option enums; the wording
//! follows the original deck-generation prompt, parameterized over the
//! vocabulary language, explaining language and CEFR level.

use crate::services::options::{GenerationOptions, Level};

/// Marker token the model must place at the start of every image
/// description. Stripped before the text is used as a search query.
pub const IMAGE_MARKER: &str = "#IMAGE#";

/// Full instruction text for generating a whole deck from a word list.
pub fn build_deck_prompt(options: &GenerationOptions) -> String {
    let language = options.language.display_name();
    let explaining = options.explaining_language.display_name();

    let noun_rules = if options.language.marks_gender() {
        "Nouns:\n\
         Always include the gender with the article (e.g., der, die, das) in the front.\n\
         The type field should be noun masculine, noun feminine, or noun neuter."
            .to_string()
    } else {
        "Nouns:\nThe type field should be noun.".to_string()
    };

    format!(
        "I want you to generate a full Anki deck for my {language} vocabulary list. \
         Respond with a JSON object containing a \"cards\" array. Each card must have: \
         front, back, example, imageDescription, type (all strings). \
         Follow these rules carefully:\n\n\
         {noun_rules}\n\
         {level_rule}\n\
         The back field must be written in {explaining}.\n\
         The image description should clearly illustrate the example and emphasize the meaning. \
         Start it with {marker} followed by a scene description in {explaining}.\n\n\
         Other parts of speech:\n\
         Use verb, adjective, adverb, pronoun, preposition, conjunction, or interjection as the type.\n\
         Example sentences and image descriptions follow the same rules.\n\n\
         Examples (as JSON card objects):\n\
         {{ \"front\": \"Die Diskussion\", \"back\": \"discussion\", \"example\": \"Die Diskussion im Kurs war sehr interessant.\", \"imageDescription\": \"{marker} - Students talking together in a classroom discussion\", \"type\": \"noun feminine\" }}\n\
         {{ \"front\": \"Kritisch\", \"back\": \"critical\", \"example\": \"Der Lehrer ist kritisch, aber fair.\", \"imageDescription\": \"{marker} - A teacher listening carefully with a serious expression\", \"type\": \"adjective\" }}\n\n\
         Instructions:\n\
         {level_rule}\n\
         Use {marker} followed by a clear descriptive text in imageDescription.\n\
         Output only valid JSON with a \"cards\" array; no extra notes or explanations.",
        language = language,
        explaining = explaining,
        noun_rules = noun_rules,
        level_rule = level_instruction(options.level),
        marker = IMAGE_MARKER,
    )
}

/// Instruction text for generating one alternate example + image
/// description for a single word. The goal is a scene that is easy to
/// find a matching stock image for.
pub fn build_alternate_example_prompt(options: &GenerationOptions) -> String {
    let language = options.language.display_name();
    let explaining = options.explaining_language.display_name();

    format!(
        "Generate exactly one new example sentence in {language} for the given word, \
         together with one new image description.\n\
         {level_rule}\n\
         The example must be different from any current example provided below.\n\
         The image description must start with {marker} followed by a scene description in {explaining}. \
         Choose a concrete, visually depictable everyday scene that is easy to find an image for; \
         avoid abstract imagery.\n\
         Respond with a JSON object containing exactly the fields \"example\" and \"imageDescription\"; \
         no extra notes or explanations.",
        language = language,
        explaining = explaining,
        level_rule = level_instruction(options.level),
        marker = IMAGE_MARKER,
    )
}

fn level_instruction(level: Level) -> &'static str {
    match level {
        Level::A1 => "Keep example sentences short and simple, suitable for an A1 beginner.",
        Level::C1 => {
            "Example sentences should be nuanced and complex, suitable for an advanced C1 learner."
        }
        Level::A2 => "Example sentences should be natural and consistent with A2 level.",
        Level::B1 => "Example sentences should be natural and consistent with B1 level.",
        Level::B2 => "Example sentences should be natural and consistent with B2 level.",
    }
}
