//! # organtt-core
//!
//! Core domain model for the organtt operating-room Gantt engine.
//!
//! This crate provides:
//! - Domain types: `ActivityRecord`, `Urgency`, `DaySchedule`, `ScheduleBook`
//! - The time grid (`TimeWindow::column_for`) and utilization metric
//! - Chart configuration with defaults
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use organtt_core::{ActivityRecord, ScheduleBook, TimeValue, Urgency};
//!
//! let mut book = ScheduleBook::new();
//! book.push(
//!     NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
//!     None,
//!     ActivityRecord::new("02", TimeValue::from("09:00"), TimeValue::from("11:30"))
//!         .department("総合外科")
//!         .name("腹腔鏡下胆嚢摘出術")
//!         .urgency(Urgency::Scheduled),
//! );
//! assert_eq!(book.record_count(), 1);
//! ```

pub mod calendar;
pub mod config;
pub mod department;
pub mod time;
pub mod utilization;

pub use calendar::{date_label, parse_weekday, week_of_month, weekday_short, DateOrdering};
pub use config::{
    column_letter, default_room_order, CellRef, ChartConfig, PaletteConfig, Rgb, SheetNames,
    TemplateRegion,
};
pub use department::DepartmentCodes;
pub use time::{TimeOfDay, TimeValue, TimeWindow};
pub use utilization::{Contribution, MeasurementWindow, Utilization, UtilizationPolicy};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of an operating room, e.g. `"01A"`
pub type RoomId = String;

// ============================================================================
// Records
// ============================================================================

/// Urgency category of an activity; drives the bar color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Scheduled,
    Urgent,
    Emergency,
}

impl Urgency {
    pub const ALL: [Self; 3] = [Self::Scheduled, Self::Urgent, Self::Emergency];

    /// Read a source label. Anything unrecognised counts as scheduled.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "緊急" | "emergency" => Self::Emergency,
            "臨時" | "urgent" => Self::Urgent,
            _ => Self::Scheduled,
        }
    }

    /// Label used in the legend
    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "定時",
            Self::Urgent => "臨時",
            Self::Emergency => "緊急",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One room occupation on one day
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityRecord {
    pub room: RoomId,
    /// Entry time
    pub start: TimeValue,
    /// Anesthesia end time
    pub end: TimeValue,
    /// Full department name
    pub department: String,
    /// Display name (procedure)
    pub name: String,
    pub urgency: Urgency,
}

impl ActivityRecord {
    pub fn new(room: impl Into<RoomId>, start: TimeValue, end: TimeValue) -> Self {
        Self {
            room: room.into(),
            start,
            end,
            department: String::new(),
            name: String::new(),
            urgency: Urgency::Scheduled,
        }
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Entry time in minutes, used for ordering
    pub fn start_minutes(&self) -> Option<u32> {
        self.start.normalize().ok().map(TimeOfDay::as_minutes)
    }
}

// ============================================================================
// Days
// ============================================================================

/// All records of one calendar day
#[derive(Clone, Debug, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub records: Vec<ActivityRecord>,
}

impl DaySchedule {
    pub fn new(date: NaiveDate, weekday: Weekday) -> Self {
        Self {
            date,
            weekday,
            records: Vec::new(),
        }
    }

    /// Records of `room` in painting order
    pub fn records_for<'a>(&'a self, room: &'a str) -> impl Iterator<Item = &'a ActivityRecord> + 'a {
        self.records.iter().filter(move |record| record.room == room)
    }

    /// `MM/DD(曜)` label
    pub fn label(&self) -> String {
        date_label(self.date, self.weekday)
    }

    /// Sort by (room, entry time); unreadable entry times go last.
    pub fn sort_records(&mut self) {
        self.records.sort_by(|a, b| {
            a.room.cmp(&b.room).then_with(|| {
                let key = |r: &ActivityRecord| r.start_minutes().unwrap_or(u32::MAX);
                key(a).cmp(&key(b))
            })
        });
    }
}

/// Records grouped by date
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleBook {
    days: BTreeMap<NaiveDate, DaySchedule>,
}

impl ScheduleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. The first weekday seen for a date wins; without one the
    /// calendar weekday is used.
    pub fn push(&mut self, date: NaiveDate, weekday: Option<Weekday>, record: ActivityRecord) {
        self.ensure_day(date, weekday).records.push(record);
    }

    /// Register a date even if it has no records yet
    pub fn ensure_day(&mut self, date: NaiveDate, weekday: Option<Weekday>) -> &mut DaySchedule {
        self.days
            .entry(date)
            .or_insert_with(|| DaySchedule::new(date, weekday.unwrap_or_else(|| date.weekday())))
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.get(&date)
    }

    /// Days in calendar order
    pub fn days(&self) -> impl Iterator<Item = &DaySchedule> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.days.values().map(|day| day.records.len()).sum()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn sort_records(&mut self) {
        for day in self.days.values_mut() {
            day.sort_records();
        }
    }

    pub fn dates(&self, ordering: DateOrdering) -> Vec<NaiveDate> {
        let days: Vec<_> = self.days.values().map(|day| (day.date, day.weekday)).collect();
        ordering.order(&days)
    }
}

// ============================================================================
// Rendering seam
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render the grouped records to the output format
    fn render(&self, book: &ScheduleBook) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Problem with a single record; always recovered locally
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid time value: {0}")]
    InvalidTime(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Invalid configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid time window: {0}")]
    InvalidWindow(String),

    #[error("room order is empty")]
    EmptyRoomOrder,

    #[error("invalid template region: {0}")]
    InvalidRegion(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid cell reference: {0}")]
    InvalidCell(String),

    #[error("invalid weight {weight} for room {room}")]
    InvalidWeight { room: String, weight: f64 },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Format error: {0}")]
    Format(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(room: &str, start: &str) -> ActivityRecord {
        ActivityRecord::new(room, TimeValue::from(start), TimeValue::from("23:00"))
    }

    #[test]
    fn urgency_labels() {
        assert_eq!(Urgency::from_label("緊急"), Urgency::Emergency);
        assert_eq!(Urgency::from_label(" 臨時 "), Urgency::Urgent);
        assert_eq!(Urgency::from_label("定時"), Urgency::Scheduled);
        assert_eq!(Urgency::from_label(""), Urgency::Scheduled);
        assert_eq!(Urgency::Emergency.to_string(), "緊急");
    }

    #[test]
    fn record_builder() {
        let record = rec("02", "09:00")
            .department("眼科")
            .name("水晶体再建術")
            .urgency(Urgency::Urgent);
        assert_eq!(record.room, "02");
        assert_eq!(record.department, "眼科");
        assert_eq!(record.name, "水晶体再建術");
        assert_eq!(record.urgency, Urgency::Urgent);
        assert_eq!(record.start_minutes(), Some(540));
        assert_eq!(rec("02", "99999999:00").start_minutes(), None);
    }

    #[test]
    fn book_groups_by_date_and_resolves_weekday() {
        let mut book = ScheduleBook::new();
        book.push(date(2025, 9, 6), None, rec("02", "09:00"));
        book.push(date(2025, 9, 1), Some(Weekday::Mon), rec("03", "10:00"));
        book.push(date(2025, 9, 1), Some(Weekday::Tue), rec("02", "11:00"));

        assert_eq!(book.len(), 2);
        assert_eq!(book.record_count(), 3);
        assert_eq!(book.first_date(), Some(date(2025, 9, 1)));
        assert_eq!(book.day(date(2025, 9, 1)).unwrap().weekday, Weekday::Mon);
        assert_eq!(book.day(date(2025, 9, 6)).unwrap().weekday, Weekday::Sat);
        assert_eq!(book.day(date(2025, 9, 6)).unwrap().label(), "09/06(土)");
    }

    #[test]
    fn sorting_orders_room_then_entry_time() {
        let mut day = DaySchedule::new(date(2025, 9, 1), Weekday::Mon);
        day.records = vec![
            rec("03", "13:00"),
            rec("02", "bad"),
            rec("02", "14:00"),
            rec("02", "08:30"),
        ];
        day.sort_records();
        let order: Vec<_> = day
            .records
            .iter()
            .map(|r| (r.room.as_str(), r.start_minutes()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("02", Some(510)),
                ("02", Some(840)),
                ("02", None),
                ("03", Some(780)),
            ]
        );
        assert_eq!(day.records_for("02").count(), 3);
    }
}
