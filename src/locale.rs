//! Locale tables for calendar text.
//!
//! Month names and weekday abbreviations are fixed per-locale lookup data.
//! Weekdays are ordered Monday-first regardless of the source locale's own
//! convention, because the grid layout is Monday-first.

use serde::{Deserialize, Serialize};

/// Supported calendar languages. Unknown codes fall back to English.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ua,
}

impl Language {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "ua" => Language::Ua,
            _ => Language::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ua => "ua",
        }
    }

    pub(crate) fn table(self) -> &'static LocaleTable {
        match self {
            Language::En => &EN,
            Language::Ua => &UA,
        }
    }
}

pub(crate) struct LocaleTable {
    pub months: [&'static str; 12],
    pub days_short: [&'static str; 7],
}

static EN: LocaleTable = LocaleTable {
    months: [
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ],
    days_short: ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
};

static UA: LocaleTable = LocaleTable {
    months: [
        "Січень", "Лютий", "Березень", "Квітень", "Травень", "Червень",
        "Липень", "Серпень", "Вересень", "Жовтень", "Листопад", "Грудень",
    ],
    days_short: ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Нд"],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_code_falls_back_to_english() {
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code("ua"), Language::Ua);
        assert_eq!(Language::from_code("UA"), Language::Ua);
        assert_eq!(Language::from_code("de"), Language::En);
        assert_eq!(Language::from_code(""), Language::En);
    }

    #[test]
    fn weekday_abbreviations_are_two_chars() {
        for lang in [Language::En, Language::Ua] {
            for day in lang.table().days_short {
                assert_eq!(day.chars().count(), 2, "{day:?}");
            }
        }
    }
}
