pub mod deck;
pub mod export;
pub mod gemini;
pub mod options;
pub mod prompt;
pub mod schema;
pub mod serper;
pub mod wav;
