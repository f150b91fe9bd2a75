//! Catalog of zodiac signs and supported languages.
//!
//! Built once at startup and shared by every component through `Arc`.
//! Declaration order matters: the fanout job and the selection keyboards
//! walk the lists in this order.

use std::sync::Arc;

/// A content category (a zodiac sign).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    /// Stable key stored in the database (e.g. `aries`).
    pub key: String,
    /// Display name used in prompts and messages.
    pub name: String,
}

impl Category {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// A supported subscriber language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    /// Language code stored in the database (e.g. `uk`).
    pub code: String,
    /// Button label shown in the language menu.
    pub label: String,
    /// Phrase appended to the generation prompt to select the output language.
    pub prompt_phrase: String,
}

impl Language {
    pub fn new(
        code: impl Into<String>,
        label: impl Into<String>,
        prompt_phrase: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            prompt_phrase: prompt_phrase.into(),
        }
    }
}

/// The fixed category and language enumerations.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    languages: Vec<Language>,
}

pub type SharedCatalog = Arc<Catalog>;

impl Catalog {
    pub fn new(categories: Vec<Category>, languages: Vec<Language>) -> Self {
        Self {
            categories,
            languages,
        }
    }

    /// The twelve zodiac signs and the four bot languages.
    pub fn zodiac() -> Self {
        let categories = [
            ("aries", "Aries"),
            ("taurus", "Taurus"),
            ("gemini", "Gemini"),
            ("cancer", "Cancer"),
            ("leo", "Leo"),
            ("virgo", "Virgo"),
            ("libra", "Libra"),
            ("scorpio", "Scorpio"),
            ("sagittarius", "Sagittarius"),
            ("capricorn", "Capricorn"),
            ("aquarius", "Aquarius"),
            ("pisces", "Pisces"),
        ]
        .into_iter()
        .map(|(key, name)| Category::new(key, name))
        .collect();

        let languages = vec![
            Language::new("uk", "🇺🇦 Українська", "українською мовою"),
            Language::new("en", "🇬🇧 English", "in English"),
            Language::new("es", "🇪🇸 Español", "en español"),
            Language::new("ru", "🏳️ Русский", "на русском языке"),
        ];

        Self::new(categories, languages)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Category by its position in the declaration order (used in callback data).
    pub fn category_at(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Display name for a stored category key, falling back to the key itself.
    pub fn category_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.category(key).map(|c| c.name.as_str()).unwrap_or(key)
    }

    /// Display label for a stored language code, falling back to the code itself.
    pub fn language_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.language(code).map(|l| l.label.as_str()).unwrap_or(code)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::zodiac()
    }
}
