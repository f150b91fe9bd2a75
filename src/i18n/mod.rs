//! Internationalization (i18n) module.
//!
//! Subscriber-facing strings for every catalog language, embedded at
//! compile time. Keys use dot notation, e.g. `register.created`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

pub const DEFAULT_LOCALE: &str = "en";

/// Global translation store: LangCode -> nested key tree
static TRANSLATIONS: Lazy<HashMap<&'static str, Value>> = Lazy::new(|| {
    let sources = [
        ("en", include_str!("en.json")),
        ("uk", include_str!("uk.json")),
        ("es", include_str!("es.json")),
        ("ru", include_str!("ru.json")),
    ];

    sources
        .into_iter()
        .filter_map(|(lang, raw)| match serde_json::from_str(raw) {
            Ok(val) => Some((lang, val)),
            Err(e) => {
                tracing::error!("Invalid locale file {}.json: {}", lang, e);
                None
            }
        })
        .collect()
});

/// Get text for a key in a specific language.
/// Falls back to English, then to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    if let Some(text) = TRANSLATIONS.get(lang).and_then(|val| resolve_key(val, key)) {
        return text;
    }

    if lang != DEFAULT_LOCALE
        && let Some(text) = TRANSLATIONS
            .get(DEFAULT_LOCALE)
            .and_then(|val| resolve_key(val, key))
    {
        return text;
    }

    key.to_string()
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(|s| s.to_string())
}

pub fn is_supported(lang: &str) -> bool {
    TRANSLATIONS.contains_key(lang)
}

/// Resolve effective locale.
/// Priority: subscriber preference -> Telegram client language -> English.
pub fn resolve_locale(subscriber_lang: Option<&str>, client_lang: Option<&str>) -> String {
    subscriber_lang
        .into_iter()
        .chain(client_lang.map(|l| l.split('-').next().unwrap_or(l)))
        .find(|l| is_supported(l))
        .unwrap_or(DEFAULT_LOCALE)
        .to_string()
}
