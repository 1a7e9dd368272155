//! Calendar content generation.
//!
//! Produces the month title plus the fixed-width grid lines drawn by the
//! renderer and returned verbatim by the text-preview interface, so preview
//! and render can never disagree.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::locale::Language;

pub const YEAR_MIN: i32 = 1900;
pub const YEAR_MAX: i32 = 2100;

/// Two-space gutter between day cells.
const GUTTER: &str = "  ";
/// Cell content for days outside the displayed month.
const BLANK_CELL: &str = "  ";

/// Title plus grid lines for one month.
///
/// `grid_lines[0]` is the weekday header; the remaining lines are week rows
/// of seven 2-character cells joined with a 2-space gutter, so every line
/// has the same rendered width in a monospace font.
#[derive(Clone, Debug, Serialize)]
pub struct CalendarContent {
    pub title: String,
    #[serde(rename = "grid")]
    pub grid_lines: Vec<String>,
}

/// Build the calendar text for a month. Monday-first week layout.
///
/// Year and month are clamped defensively; callers normally pass values
/// already validated at the parameter boundary.
pub fn format_calendar(year: i32, month: u32, lang: Language, show_year: bool) -> CalendarContent {
    let year = year.clamp(YEAR_MIN, YEAR_MAX);
    let month = month.clamp(1, 12);
    let loc = lang.table();

    let month_name = loc.months[(month - 1) as usize];
    let title = if show_year {
        format!("{month_name} {year}")
    } else {
        month_name.to_string()
    };

    let header = loc
        .days_short
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(GUTTER);

    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("in-range after clamp");
    let lead = first.weekday().num_days_from_monday();
    let days = days_in_month(year, month);

    let weeks = (lead + days).div_ceil(7);
    let mut grid_lines = Vec::with_capacity(1 + weeks as usize);
    grid_lines.push(header);
    for week in 0..weeks {
        let mut cells = Vec::with_capacity(7);
        for slot in 0..7u32 {
            let day = (week * 7 + slot) as i64 - lead as i64 + 1;
            if day >= 1 && day <= days as i64 {
                cells.push(format!("{day:2}"));
            } else {
                cells.push(BLANK_CELL.to_string());
            }
        }
        grid_lines.push(cells.join(GUTTER));
    }

    CalendarContent { title, grid_lines }
}

/// Structured calendar text for the preview interface. Applies the same
/// clamping and language fallback as the render path, and shares its
/// formatter.
pub fn calendar_preview(year: i32, month: u32, lang: &str, show_year: bool) -> CalendarContent {
    format_calendar(year, month, Language::from_code(lang), show_year)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("in-range after clamp");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("in-range after clamp");
    (next - first).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_2024_english() {
        let cal = format_calendar(2024, 2, Language::En, true);
        assert_eq!(cal.title, "February 2024");
        assert_eq!(cal.grid_lines[0], "Mo  Tu  We  Th  Fr  Sa  Su");
        // Feb 1 2024 is a Thursday: three leading blank cells.
        let first_week = ["  ", "  ", "  ", " 1", " 2", " 3", " 4"].join("  ");
        assert_eq!(cal.grid_lines[1], first_week);
        let last_week = ["26", "27", "28", "29", "  ", "  ", "  "].join("  ");
        assert_eq!(cal.grid_lines[5], last_week);
        assert_eq!(cal.grid_lines.len(), 6);
    }

    #[test]
    fn february_2024_ukrainian_without_year() {
        let cal = format_calendar(2024, 2, Language::Ua, false);
        assert_eq!(cal.title, "Лютий");
        assert_eq!(cal.grid_lines[0], "Пн  Вт  Ср  Чт  Пт  Сб  Нд");
    }

    #[test]
    fn all_lines_have_equal_width() {
        for year in [1900, 1999, 2024, 2100] {
            for month in 1..=12 {
                let cal = format_calendar(year, month, Language::En, true);
                let header_len = cal.grid_lines[0].chars().count();
                assert_eq!(header_len, 26);
                for line in &cal.grid_lines {
                    assert_eq!(line.chars().count(), header_len, "{year}-{month}: {line:?}");
                }
            }
        }
    }

    #[test]
    fn line_count_is_one_plus_weeks() {
        for year in [1900, 2023, 2024, 2100] {
            for month in 1..=12 {
                let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
                let lead = first.weekday().num_days_from_monday();
                let weeks = (lead + days_in_month(year, month)).div_ceil(7);
                let cal = format_calendar(year, month, Language::En, true);
                assert_eq!(cal.grid_lines.len() as u32, 1 + weeks, "{year}-{month}");
            }
        }
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let cal = format_calendar(9999, 0, Language::En, true);
        assert_eq!(cal.title, "January 2100");
        let cal = format_calendar(-5, 13, Language::En, true);
        assert_eq!(cal.title, "December 1900");
    }

    #[test]
    fn preview_uses_the_same_formatter() {
        let preview = calendar_preview(2024, 2, "en", true);
        let direct = format_calendar(2024, 2, Language::En, true);
        assert_eq!(preview.title, direct.title);
        assert_eq!(preview.grid_lines, direct.grid_lines);
        // Unknown languages degrade to English, never error.
        assert_eq!(calendar_preview(2024, 2, "xx", true).title, "February 2024");
    }
}
