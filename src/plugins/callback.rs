//! Callback data carried by inline keyboard buttons.
//!
//! Signs are referenced by catalog index to stay within Telegram's
//! 64-byte callback data limit.

/// Admin panel views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminView {
    Stats,
    Today,
    Languages,
    Signs,
    Graph,
    Broadcast,
}

impl AdminView {
    fn as_str(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Today => "today",
            Self::Languages => "languages",
            Self::Signs => "signs",
            Self::Graph => "graph",
            Self::Broadcast => "broadcast",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "stats" => Self::Stats,
            "today" => Self::Today,
            "languages" => Self::Languages,
            "signs" => Self::Signs,
            "graph" => Self::Graph,
            "broadcast" => Self::Broadcast,
            _ => return None,
        })
    }
}

/// Every button action the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    /// Open the language menu.
    Register,
    /// Language chosen, show signs.
    Language(String),
    /// (language code, sign index) chosen, register.
    Sign(String, usize),
    Admin(AdminView),
    BroadcastAll,
    BroadcastPickLanguage,
    BroadcastPickSign,
    BroadcastLanguage(String),
    BroadcastSign(usize),
}

impl CallbackData {
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        Some(match parts.as_slice() {
            ["register"] => Self::Register,
            ["lang", code] => Self::Language(code.to_string()),
            ["sign", code, index] => Self::Sign(code.to_string(), index.parse().ok()?),
            ["admin", view] => Self::Admin(AdminView::parse(view)?),
            ["bc", "all"] => Self::BroadcastAll,
            ["bc", "lang"] => Self::BroadcastPickLanguage,
            ["bc", "sign"] => Self::BroadcastPickSign,
            ["bc", "lang", code] => Self::BroadcastLanguage(code.to_string()),
            ["bc", "sign", index] => Self::BroadcastSign(index.parse().ok()?),
            _ => return None,
        })
    }

    pub fn to_data(&self) -> String {
        match self {
            Self::Register => "register".to_string(),
            Self::Language(code) => format!("lang:{}", code),
            Self::Sign(code, index) => format!("sign:{}:{}", code, index),
            Self::Admin(view) => format!("admin:{}", view.as_str()),
            Self::BroadcastAll => "bc:all".to_string(),
            Self::BroadcastPickLanguage => "bc:lang".to_string(),
            Self::BroadcastPickSign => "bc:sign".to_string(),
            Self::BroadcastLanguage(code) => format!("bc:lang:{}", code),
            Self::BroadcastSign(index) => format!("bc:sign:{}", index),
        }
    }

    /// Whether only administrators may trigger this action.
    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Self::Register | Self::Language(_) | Self::Sign(..))
    }

    /// Whether a user with the given admin status may trigger this action.
    pub fn is_permitted(&self, is_admin: bool) -> bool {
        is_admin || !self.is_admin_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_registration_flow() {
        assert_eq!(CallbackData::parse("register"), Some(CallbackData::Register));
        assert_eq!(
            CallbackData::parse("lang:uk"),
            Some(CallbackData::Language("uk".into()))
        );
        assert_eq!(
            CallbackData::parse("sign:es:11"),
            Some(CallbackData::Sign("es".into(), 11))
        );
    }

    #[test]
    fn test_parse_admin_and_broadcast() {
        assert_eq!(
            CallbackData::parse("admin:graph"),
            Some(CallbackData::Admin(AdminView::Graph))
        );
        assert_eq!(CallbackData::parse("bc:lang"), Some(CallbackData::BroadcastPickLanguage));
        assert_eq!(
            CallbackData::parse("bc:sign:3"),
            Some(CallbackData::BroadcastSign(3))
        );
        assert!(CallbackData::BroadcastAll.is_admin_only());
        assert!(!CallbackData::Sign("en".into(), 0).is_admin_only());
    }

    #[test]
    fn test_admin_actions_need_admin() {
        let admin_only = [
            CallbackData::Admin(AdminView::Stats),
            CallbackData::Admin(AdminView::Broadcast),
            CallbackData::BroadcastAll,
            CallbackData::BroadcastPickLanguage,
            CallbackData::BroadcastPickSign,
            CallbackData::BroadcastLanguage("uk".into()),
            CallbackData::BroadcastSign(0),
        ];
        for data in &admin_only {
            assert!(!data.is_permitted(false), "{:?} open to everyone", data);
            assert!(data.is_permitted(true));
        }

        for data in [
            CallbackData::Register,
            CallbackData::Language("en".into()),
            CallbackData::Sign("en".into(), 3),
        ] {
            assert!(data.is_permitted(false));
        }
    }

    #[test]
    fn test_rejects_unknown_data() {
        assert_eq!(CallbackData::parse("sign:en:x"), None);
        assert_eq!(CallbackData::parse("admin:nope"), None);
        assert_eq!(CallbackData::parse("warn_remove:1:2"), None);
        assert_eq!(CallbackData::parse(""), None);
    }

    #[test]
    fn test_data_fits_telegram_limit() {
        let longest = CallbackData::Sign("uk".into(), 11).to_data();
        assert!(longest.len() <= 64);
        assert_eq!(CallbackData::parse(&longest), Some(CallbackData::Sign("uk".into(), 11)));
    }
}
