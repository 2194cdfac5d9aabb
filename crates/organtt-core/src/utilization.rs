//! Weighted room utilization over a day's measurement window.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::time::TimeOfDay;
use crate::{ActivityRecord, ConfigError, RecordError};

/// Interval of the day in which occupancy is measured
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl MeasurementWindow {
    pub const fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn minutes(&self) -> u32 {
        self.end.as_minutes().saturating_sub(self.start.as_minutes())
    }

    /// Minutes of `[start, end]` that fall inside the window
    pub fn overlap(&self, start: TimeOfDay, end: TimeOfDay) -> u32 {
        let from = start.as_minutes().max(self.start.as_minutes());
        let to = end.as_minutes().min(self.end.as_minutes());
        to.saturating_sub(from)
    }
}

/// How one record entered the aggregate
#[derive(Clone, Debug, PartialEq)]
pub enum Contribution {
    /// Clipped occupancy, already multiplied by the room weight
    Counted { weighted_minutes: f64 },
    /// The record lies entirely outside the measurement window
    OutsideWindow,
    /// The room has weight 0 and is not measured
    ZeroWeight,
    /// The record could not be read
    Skipped(RecordError),
}

/// Aggregated utilization for one day
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Utilization {
    /// Occupied fraction; not clamped, inconsistent data can push it past 1
    pub ratio: f64,
    pub used_minutes: f64,
    pub available_minutes: f64,
    pub counted: usize,
    pub skipped: usize,
}

impl Utilization {
    /// Percentage with one decimal, e.g. `"11.1%"`
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.ratio * 100.0)
    }
}

/// Configuration of the utilization metric
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationPolicy {
    /// Window used on regular days
    pub full_window: MeasurementWindow,
    /// Window used on the short day
    pub short_window: MeasurementWindow,
    pub short_day: Weekday,
    /// Room equivalents; rooms not listed count as 1.0
    pub room_weights: BTreeMap<String, f64>,
}

impl Default for UtilizationPolicy {
    fn default() -> Self {
        let room_weights = [("01A", 0.5), ("01B", 0.5), ("ｱﾝｷﾞｵ", 0.0)]
            .into_iter()
            .map(|(room, weight)| (room.to_string(), weight))
            .collect();
        Self {
            full_window: MeasurementWindow::new(TimeOfDay::new(9, 0), TimeOfDay::new(17, 0)),
            short_window: MeasurementWindow::new(TimeOfDay::new(9, 0), TimeOfDay::new(13, 0)),
            short_day: Weekday::Sat,
            room_weights,
        }
    }
}

impl UtilizationPolicy {
    pub fn weight(&self, room: &str) -> f64 {
        self.room_weights.get(room).copied().unwrap_or(1.0)
    }

    /// Room weights must be finite and not negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (room, &weight) in &self.room_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    room: room.clone(),
                    weight,
                });
            }
        }
        Ok(())
    }

    pub fn is_short_day(&self, weekday: Weekday) -> bool {
        weekday == self.short_day
    }

    pub fn window(&self, short_day: bool) -> MeasurementWindow {
        if short_day {
            self.short_window
        } else {
            self.full_window
        }
    }

    /// Sum of positive weights over the measured rooms
    pub fn room_equivalents<S: AsRef<str>>(&self, rooms: &[S]) -> f64 {
        rooms
            .iter()
            .map(|room| self.weight(room.as_ref()))
            .filter(|weight| *weight > 0.0)
            .sum()
    }

    /// Classify a single record against `window`.
    pub fn contribution(&self, record: &ActivityRecord, window: MeasurementWindow) -> Contribution {
        let weight = self.weight(&record.room);
        if weight.is_nan() || weight <= 0.0 {
            return Contribution::ZeroWeight;
        }
        let times = record
            .start
            .normalize()
            .and_then(|start| record.end.normalize().map(|end| (start, end)));
        match times {
            Ok((start, end)) => match window.overlap(start, end) {
                0 => Contribution::OutsideWindow,
                minutes => Contribution::Counted {
                    weighted_minutes: f64::from(minutes) * weight,
                },
            },
            Err(err) => Contribution::Skipped(err),
        }
    }

    /// Weighted occupied-time ratio of `records` over `rooms`.
    ///
    /// Unreadable records are skipped and counted; the call itself never fails.
    pub fn utilization<'a, S, I>(&self, records: I, rooms: &[S], short_day: bool) -> Utilization
    where
        S: AsRef<str>,
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        let window = self.window(short_day);
        let available_minutes = f64::from(window.minutes()) * self.room_equivalents(rooms);
        let mut result = Utilization {
            available_minutes,
            ..Utilization::default()
        };

        for record in records {
            match self.contribution(record, window) {
                Contribution::Counted { weighted_minutes } => {
                    result.used_minutes += weighted_minutes;
                    result.counted += 1;
                }
                Contribution::Skipped(err) => {
                    tracing::debug!(room = %record.room, error = %err, "record skipped in utilization");
                    result.skipped += 1;
                }
                Contribution::OutsideWindow | Contribution::ZeroWeight => {}
            }
        }

        if available_minutes > 0.0 {
            result.ratio = result.used_minutes / available_minutes;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_room_order, TimeValue};

    fn record(room: &str, start: &str, end: &str) -> ActivityRecord {
        ActivityRecord::new(room, TimeValue::from(start), TimeValue::from(end))
    }

    #[test]
    fn empty_day_is_zero() {
        let policy = UtilizationPolicy::default();
        let none: [ActivityRecord; 0] = [];
        let result = policy.utilization(&none, &default_room_order(), false);
        assert_eq!(result.ratio, 0.0);
        assert_eq!(result.available_minutes, 480.0 * 9.0);
    }

    #[test]
    fn short_day_single_room() {
        let policy = UtilizationPolicy::default();
        let records = [record("02", "09:00", "13:00")];
        let result = policy.utilization(&records, &default_room_order(), true);
        assert!((result.ratio - 240.0 / (240.0 * 9.0)).abs() < 1e-12);
        assert_eq!(result.percent_label(), "11.1%");
    }

    #[test]
    fn fully_booked_rooms_reach_one() {
        let policy = UtilizationPolicy::default();
        let records: Vec<_> = default_room_order()
            .iter()
            .map(|room| record(room, "08:30", "18:00"))
            .collect();
        let result = policy.utilization(&records, &default_room_order(), false);
        assert!((result.ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_rooms_are_ignored() {
        let policy = UtilizationPolicy::default();
        let base = [record("03", "10:00", "12:00")];
        let with_angio = [
            record("03", "10:00", "12:00"),
            record("ｱﾝｷﾞｵ", "09:00", "17:00"),
            record("ｱﾝｷﾞｵ", "garbage", "17:00"),
        ];
        let rooms = default_room_order();
        let a = policy.utilization(&base, &rooms, false);
        let b = policy.utilization(&with_angio, &rooms, false);
        assert_eq!(a.ratio, b.ratio);
        assert_eq!(b.skipped, 0);
    }

    #[test]
    fn half_weight_rooms_and_clipping() {
        let policy = UtilizationPolicy::default();
        // 08:00-10:00 clips to 60 minutes, weighted by 0.5
        let records = [record("01A", "08:00", "10:00")];
        let result = policy.utilization(&records, &default_room_order(), false);
        assert_eq!(result.used_minutes, 30.0);
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let policy = UtilizationPolicy::default();
        let records = [
            record("02", "bad", "10:00"),
            ActivityRecord::new("03", TimeValue::Missing, TimeValue::from("10:00")),
            record("05", "09:00", "10:00"),
        ];
        let result = policy.utilization(&records, &default_room_order(), false);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.counted, 1);
        assert_eq!(result.used_minutes, 60.0);
    }

    #[test]
    fn contribution_outcomes() {
        let policy = UtilizationPolicy::default();
        let window = policy.window(false);
        assert_eq!(
            policy.contribution(&record("02", "18:00", "19:00"), window),
            Contribution::OutsideWindow
        );
        assert_eq!(
            policy.contribution(&record("ｱﾝｷﾞｵ", "10:00", "11:00"), window),
            Contribution::ZeroWeight
        );
        assert!(matches!(
            policy.contribution(&record("02", "x", "11:00"), window),
            Contribution::Skipped(RecordError::InvalidTime(_))
        ));
    }

    #[test]
    fn overlapping_records_can_exceed_one() {
        let policy = UtilizationPolicy::default();
        let rooms = ["02"];
        let records = [
            record("02", "08:30", "18:00"),
            record("02", "08:30", "18:00"),
        ];
        let result = policy.utilization(&records, &rooms, false);
        assert!((result.ratio - 2.0).abs() < 1e-12);
        assert_eq!(result.percent_label(), "200.0%");
    }

    #[test]
    fn out_of_range_clock_hours_are_skipped() {
        let policy = UtilizationPolicy::default();
        let window = policy.window(false);
        assert!(matches!(
            policy.contribution(&record("02", "99999999:00", "10:00"), window),
            Contribution::Skipped(RecordError::InvalidTime(_))
        ));
    }

    #[test]
    fn weights_must_be_finite_and_not_negative() {
        let mut policy = UtilizationPolicy::default();
        assert!(policy.validate().is_ok());
        policy.room_weights.insert("02".into(), -1.0);
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::InvalidWeight { ref room, weight }) if room == "02" && weight == -1.0
        ));
        policy.room_weights.insert("02".into(), f64::NAN);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn zero_denominator_yields_zero() {
        let policy = UtilizationPolicy::default();
        let rooms = ["ｱﾝｷﾞｵ"];
        let result = policy.utilization(&[record("02", "09:00", "10:00")], &rooms, false);
        assert_eq!(result.ratio, 0.0);
    }
}
