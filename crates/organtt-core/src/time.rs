//! Time-of-day values and the discrete column axis of the chart.
//!
//! Source spreadsheets hand us times in several encodings: clock text such as
//! `"9:30"`, an elapsed duration since midnight, or a structured time. All of
//! them are normalized to a [`TimeOfDay`] before anything is computed, and the
//! [`TimeWindow`] maps that value onto a grid column.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ConfigError, RecordError};

/// Hours past this bound are rejected as malformed.
pub const MAX_HOURS: u32 = 48;

/// A wall-clock time normalized to hours and minutes.
///
/// Hours may exceed 23 when a source encodes a finish time past midnight as
/// an elapsed duration, up to [`MAX_HOURS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    pub hours: u32,
    pub minutes: u32,
}

impl TimeOfDay {
    pub const fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    pub const fn from_minutes(total: u32) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    /// Minutes elapsed since midnight
    pub const fn as_minutes(self) -> u32 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = RecordError;

    /// Parses `H:MM`, `HH:MM` or `HH:MM:SS`; seconds are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RecordError::InvalidTime(s.to_string());
        let mut parts = s.trim().split(':');
        let hours = parts
            .next()
            .and_then(|h| h.trim().parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minutes = parts
            .next()
            .and_then(|m| m.trim().parse::<u32>().ok())
            .ok_or_else(invalid)?;
        if minutes >= 60 || hours >= MAX_HOURS {
            return Err(invalid());
        }
        if let Some(seconds) = parts.next() {
            seconds.trim().parse::<f64>().map_err(|_| invalid())?;
        }
        Ok(Self { hours, minutes })
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self::new(time.hour(), time.minute())
    }
}

/// A time as it arrived from the record source, not yet normalized.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeValue {
    /// Clock text, e.g. `"09:30"`
    Clock(String),
    /// Elapsed time since midnight
    SinceMidnight(chrono::Duration),
    /// Structured time of day
    Time(NaiveTime),
    /// The source cell was empty
    Missing,
}

impl TimeValue {
    /// Normalize to hours and minutes.
    pub fn normalize(&self) -> Result<TimeOfDay, RecordError> {
        match self {
            Self::Clock(text) => text.parse(),
            Self::SinceMidnight(duration) => {
                let seconds = duration.num_seconds();
                let seconds = u32::try_from(seconds)
                    .ok()
                    .filter(|s| *s < MAX_HOURS * 3600)
                    .ok_or_else(|| RecordError::InvalidTime(format!("{seconds}s")))?;
                Ok(TimeOfDay::new(seconds / 3600, (seconds % 3600) / 60))
            }
            Self::Time(time) => Ok(TimeOfDay::from(*time)),
            Self::Missing => Err(RecordError::MissingField("time")),
        }
    }
}

impl From<TimeOfDay> for TimeValue {
    fn from(time: TimeOfDay) -> Self {
        Self::SinceMidnight(chrono::Duration::minutes(i64::from(time.as_minutes())))
    }
}

impl From<&str> for TimeValue {
    fn from(text: &str) -> Self {
        Self::Clock(text.to_string())
    }
}

/// The horizontal axis shared by every day block.
///
/// Hour labels run from `start_hour` to `end_hour` inclusive and each hour is
/// split into `60 / resolution_minutes` columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub resolution_minutes: u32,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 22,
            resolution_minutes: 10,
        }
    }
}

impl TimeWindow {
    pub const fn new(start_hour: u32, end_hour: u32, resolution_minutes: u32) -> Self {
        Self {
            start_hour,
            end_hour,
            resolution_minutes,
        }
    }

    fn resolution(&self) -> u32 {
        self.resolution_minutes.max(1)
    }

    pub fn columns_per_hour(&self) -> u32 {
        60 / self.resolution()
    }

    /// Number of hour labels on the axis
    pub fn hour_count(&self) -> u32 {
        self.end_hour.saturating_sub(self.start_hour) + 1
    }

    pub fn column_count(&self) -> u32 {
        self.hour_count() * self.columns_per_hour()
    }

    /// Hours that get a header label, in axis order
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start_hour..=self.end_hour
    }

    /// Map a time to its grid column.
    ///
    /// `column_offset` is the column of `start_hour`. The result is not
    /// bounded; use [`TimeWindow::clip_column`] before painting.
    pub fn column_for(&self, time: TimeOfDay, column_offset: u16) -> i64 {
        let total_minutes = (i64::from(time.hours) - i64::from(self.start_hour)) * 60
            + i64::from(time.minutes);
        i64::from(column_offset) + total_minutes.div_euclid(i64::from(self.resolution()))
    }

    /// Last column of the axis
    pub fn last_column(&self, column_offset: u16) -> u16 {
        (u32::from(column_offset) + self.column_count() - 1) as u16
    }

    /// First column of the block that belongs to `hour`
    pub fn hour_column(&self, hour: u32, column_offset: u16) -> u16 {
        (u32::from(column_offset) + (hour - self.start_hour) * self.columns_per_hour()) as u16
    }

    pub fn clip_column(&self, column: i64, column_offset: u16) -> u16 {
        let last = i64::from(self.last_column(column_offset));
        column.clamp(i64::from(column_offset), last) as u16
    }

    /// Whether `column` starts an hour block
    pub fn is_hour_boundary(&self, column: u16, column_offset: u16) -> bool {
        column >= column_offset
            && u32::from(column - column_offset) % self.columns_per_hour() == 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_hour < self.start_hour {
            return Err(ConfigError::InvalidWindow(format!(
                "end hour {} is before start hour {}",
                self.end_hour, self.start_hour
            )));
        }
        if self.resolution_minutes == 0 || 60 % self.resolution_minutes != 0 {
            return Err(ConfigError::InvalidWindow(format!(
                "resolution of {} minutes does not divide an hour",
                self.resolution_minutes
            )));
        }
        if self.end_hour >= 24 {
            return Err(ConfigError::InvalidWindow(format!(
                "end hour {} is past midnight",
                self.end_hour
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::new(h, m)
    }

    #[test]
    fn column_for_matches_reference_points() {
        let window = TimeWindow::default();
        assert_eq!(window.column_for(t(8, 0), 4), 4);
        assert_eq!(window.column_for(t(8, 5), 4), 4);
        assert_eq!(window.column_for(t(9, 0), 4), 10);
        assert_eq!(window.column_for(t(22, 50), 4), 93);
    }

    #[test]
    fn column_for_floors_before_window_start() {
        let window = TimeWindow::default();
        assert_eq!(window.column_for(t(7, 55), 4), 3);
        assert_eq!(window.column_for(t(7, 0), 4), -2);
    }

    #[test]
    fn column_for_is_monotonic_across_window() {
        let window = TimeWindow::default();
        let mut previous = i64::MIN;
        for minute in (8 * 60)..=(22 * 60) {
            let column = window.column_for(TimeOfDay::from_minutes(minute), 4);
            assert!(column >= previous, "column went backwards at minute {minute}");
            previous = column;
        }
    }

    #[test]
    fn axis_geometry() {
        let window = TimeWindow::default();
        assert_eq!(window.columns_per_hour(), 6);
        assert_eq!(window.hour_count(), 15);
        assert_eq!(window.last_column(4), 93);
        assert_eq!(window.hour_column(9, 4), 10);
        assert!(window.is_hour_boundary(10, 4));
        assert!(!window.is_hour_boundary(11, 4));
        assert_eq!(window.clip_column(-3, 4), 4);
        assert_eq!(window.clip_column(120, 4), 93);
    }

    #[test]
    fn normalizes_all_encodings() {
        assert_eq!(TimeValue::from("9:30").normalize().unwrap(), t(9, 30));
        assert_eq!(TimeValue::from("09:30:15").normalize().unwrap(), t(9, 30));
        assert_eq!(
            TimeValue::SinceMidnight(chrono::Duration::seconds(13 * 3600 + 45 * 60 + 59))
                .normalize()
                .unwrap(),
            t(13, 45)
        );
        assert_eq!(TimeValue::from("25:10").normalize().unwrap(), t(25, 10));
        let time = NaiveTime::from_hms_opt(17, 5, 0).unwrap();
        assert_eq!(TimeValue::Time(time).normalize().unwrap(), t(17, 5));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(TimeValue::from("abc").normalize().is_err());
        assert!(TimeValue::from("9").normalize().is_err());
        assert!(TimeValue::from("9:75").normalize().is_err());
        assert!(TimeValue::SinceMidnight(chrono::Duration::minutes(-5))
            .normalize()
            .is_err());
        assert!(TimeValue::from("99999999:00").normalize().is_err());
        assert!(TimeValue::from("48:00").normalize().is_err());
        assert!(TimeValue::SinceMidnight(chrono::Duration::days(400))
            .normalize()
            .is_err());
        assert_eq!(
            TimeValue::Missing.normalize(),
            Err(RecordError::MissingField("time"))
        );
    }

    #[test]
    fn window_validation() {
        assert!(TimeWindow::default().validate().is_ok());
        assert!(TimeWindow::new(10, 8, 10).validate().is_err());
        assert!(TimeWindow::new(8, 22, 7).validate().is_err());
        assert!(TimeWindow::new(8, 22, 0).validate().is_err());
    }
}
