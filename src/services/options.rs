use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Vocabulary language of the deck being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "de" => Some(Self::De),
            "en" => Some(Self::En),
            "ar" => Some(Self::Ar),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::De => "German",
            Self::En => "English",
            Self::Ar => "Arabic",
        }
    }

    /// Whether the language marks grammatical gender on nouns with an
    /// article that belongs on the card front.
    pub fn marks_gender(&self) -> bool {
        matches!(self, Self::De)
    }
}

/// Language used for meanings, translations and image-scene descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExplainingLanguage {
    #[default]
    En,
    De,
    Ar,
}

impl ExplainingLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Ar => "ar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Self::En),
            "de" => Some(Self::De),
            "ar" => Some(Self::Ar),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::De => "German",
            Self::Ar => "Arabic",
        }
    }
}

/// CEFR proficiency tier controlling example-sentence complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Level {
    A1,
    #[default]
    A2,
    B1,
    B2,
    C1,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "C1" => Some(Self::C1),
            _ => None,
        }
    }
}

/// Input configuration for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub language: Language,
    pub explaining_language: ExplainingLanguage,
    pub level: Level,
}

impl GenerationOptions {
    pub fn new(language: Language, explaining_language: ExplainingLanguage, level: Level) -> Self {
        Self {
            language,
            explaining_language,
            level,
        }
    }

    /// Load persisted options, falling back to defaults when nothing
    /// valid is stored.
    pub fn load_or_default(store: &impl OptionsStore) -> Self {
        store.load().unwrap_or_default()
    }
}

/// Persistence seam for user-selected generation options.
pub trait OptionsStore {
    /// Returns `None` when nothing is stored or the stored record fails
    /// validation. Validation is fail-closed: one invalid field discards
    /// the whole record.
    fn load(&self) -> Option<GenerationOptions>;
    fn save(&self, options: &GenerationOptions) -> std::io::Result<()>;
}

/// Raw stored shape; fields are kept as strings so each one can be
/// checked against its closed enum before being trusted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredOptions {
    language: String,
    explaining_language: String,
    level: String,
}

pub struct JsonFileOptionsStore {
    path: PathBuf,
}

impl JsonFileOptionsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Self {
        let dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: dir.join("deckgen").join("options.json"),
        }
    }
}

impl OptionsStore for JsonFileOptionsStore {
    fn load(&self) -> Option<GenerationOptions> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let stored: StoredOptions = serde_json::from_str(&raw).ok()?;

        let language = Language::from_str(&stored.language)?;
        let explaining_language = ExplainingLanguage::from_str(&stored.explaining_language)?;
        let level = Level::from_str(&stored.level)?;

        Some(GenerationOptions {
            language,
            explaining_language,
            level,
        })
    }

    fn save(&self, options: &GenerationOptions) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredOptions {
            language: options.language.as_str().to_string(),
            explaining_language: options.explaining_language.as_str().to_string(),
            level: options.level.as_str().to_string(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, json)
    }
}
