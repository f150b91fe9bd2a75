//! Horoscope message formatting (Telegram HTML).

use chrono::NaiveDate;

use crate::i18n::get_text;
use crate::utils::html_escape;

/// Localized header with sign and date, followed by the escaped body.
pub fn horoscope_message(language: &str, sign_name: &str, date: NaiveDate, text: &str) -> String {
    let date = date
        .format(&get_text(language, "horoscope.date_format"))
        .to_string();
    let title = get_text(language, "horoscope.title")
        .replace("{sign}", &html_escape(sign_name))
        .replace("{date}", &date);

    format!("🌟 <b>{}</b> 🌟\n\n{}", title, html_escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_localizes_date_and_escapes_body() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        let en = horoscope_message("en", "Leo", date, "Be <bold> & brave");
        assert!(en.contains("Horoscope for Leo on 03/07/2024"));
        assert!(en.ends_with("Be &lt;bold&gt; &amp; brave"));

        let uk = horoscope_message("uk", "Leo", date, "text");
        assert!(uk.contains("07.03.2024"));
    }
}
