//! Inline keyboards shared by the registration, profile and admin flows.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::callback::{AdminView, CallbackData};
use crate::catalog::{Catalog, Category, Language};
use crate::i18n::get_text;

const SIGNS_PER_ROW: usize = 3;

fn button(text: impl Into<String>, data: CallbackData) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, data.to_data())
}

/// Single "register" button, labelled in `locale`.
pub fn register_keyboard(locale: &str, label_key: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        get_text(locale, label_key),
        CallbackData::Register,
    )]])
}

/// One language per row, in catalog order.
pub fn language_keyboard(
    catalog: &Catalog,
    to_data: impl Fn(&Language) -> CallbackData,
) -> InlineKeyboardMarkup {
    let rows = catalog
        .languages()
        .iter()
        .map(|language| vec![button(language.label.clone(), to_data(language))])
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Signs in catalog order, a few per row.
pub fn sign_keyboard(
    catalog: &Catalog,
    to_data: impl Fn(usize, &Category) -> CallbackData,
) -> InlineKeyboardMarkup {
    let buttons = catalog
        .categories()
        .iter()
        .enumerate()
        .map(|(index, category)| button(category.name.clone(), to_data(index, category)))
        .collect::<Vec<_>>();

    let rows = buttons
        .chunks(SIGNS_PER_ROW)
        .map(|row| row.to_vec())
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_panel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("📊 General", CallbackData::Admin(AdminView::Stats)),
            button("🆕 Today", CallbackData::Admin(AdminView::Today)),
        ],
        vec![
            button("🌐 Languages", CallbackData::Admin(AdminView::Languages)),
            button("♈ Signs", CallbackData::Admin(AdminView::Signs)),
        ],
        vec![button("📈 Last 7 days", CallbackData::Admin(AdminView::Graph))],
        vec![button("📢 Broadcast", CallbackData::Admin(AdminView::Broadcast))],
    ])
}

pub fn broadcast_target_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("👥 All subscribers", CallbackData::BroadcastAll)],
        vec![button("🌐 By language", CallbackData::BroadcastPickLanguage)],
        vec![button("♈ By sign", CallbackData::BroadcastPickSign)],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn data_of(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sign_keyboard_covers_catalog() {
        let catalog = Catalog::zodiac();
        let markup = sign_keyboard(&catalog, |i, _| CallbackData::Sign("es".into(), i));

        assert_eq!(markup.inline_keyboard.len(), 4);
        let data = data_of(&markup);
        assert_eq!(data.len(), 12);
        assert_eq!(data[0], "sign:es:0");
        assert_eq!(data[11], "sign:es:11");
    }

    #[test]
    fn test_language_keyboard_order() {
        let catalog = Catalog::zodiac();
        let markup = language_keyboard(&catalog, |l| CallbackData::BroadcastLanguage(l.code.clone()));
        assert_eq!(
            data_of(&markup),
            vec!["bc:lang:uk", "bc:lang:en", "bc:lang:es", "bc:lang:ru"]
        );
    }

    #[test]
    fn test_admin_panel_is_parseable() {
        for data in data_of(&admin_panel_keyboard()) {
            assert!(CallbackData::parse(&data).is_some(), "bad data {data}");
        }
    }
}
