//! Weekday names, date labels and the two date orderings of the chart.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

const JA_WEEKDAYS: [(char, Weekday); 7] = [
    ('月', Weekday::Mon),
    ('火', Weekday::Tue),
    ('水', Weekday::Wed),
    ('木', Weekday::Thu),
    ('金', Weekday::Fri),
    ('土', Weekday::Sat),
    ('日', Weekday::Sun),
];

/// Parse a weekday label such as `"土曜日"`, `"土"`, `"Saturday"` or `"sat"`.
pub fn parse_weekday(label: &str) -> Option<Weekday> {
    let label = label.trim();
    let short = label
        .strip_suffix("曜日")
        .or_else(|| label.strip_suffix('曜'))
        .unwrap_or(label);
    let mut chars = short.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        if let Some((_, weekday)) = JA_WEEKDAYS.iter().find(|(c, _)| *c == first) {
            return Some(*weekday);
        }
    }
    label.parse::<Weekday>().ok()
}

/// One-character Japanese weekday name, e.g. `"土"`.
pub fn weekday_short(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// `MM/DD(曜)` label shown in the date column
pub fn date_label(date: NaiveDate, weekday: Weekday) -> String {
    format!(
        "{:02}/{:02}({})",
        date.month(),
        date.day(),
        weekday_short(weekday)
    )
}

/// 1-based index of the weekday occurrence inside its month
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Vertical order of day blocks on a chart sheet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrdering {
    /// Ascending calendar dates
    #[default]
    Calendar,
    /// Monday first, then by week of month
    Weekday,
}

impl DateOrdering {
    /// Order `(date, weekday)` pairs. The weekday ordering is stable.
    pub fn order(self, days: &[(NaiveDate, Weekday)]) -> Vec<NaiveDate> {
        let mut days = days.to_vec();
        match self {
            Self::Calendar => days.sort_by_key(|(date, _)| *date),
            Self::Weekday => {
                days.sort_by_key(|(date, _)| *date);
                days.sort_by_key(|(date, weekday)| {
                    (weekday.num_days_from_monday(), week_of_month(*date))
                });
            }
        }
        days.into_iter().map(|(date, _)| date).collect()
    }
}
