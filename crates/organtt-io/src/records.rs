//! Activity records from the data sheet.

use std::collections::HashMap;

use calamine::{Data, Range};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use organtt_core::{parse_weekday, ActivityRecord, ScheduleBook, TimeValue, Urgency};
use serde::{Deserialize, Serialize};

use crate::IngestError;

/// Header names of the data sheet columns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub weekday: String,
    pub room: String,
    pub start: String,
    pub end: String,
    pub department: String,
    pub name: String,
    pub urgency: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "手術実施日".into(),
            weekday: "曜日".into(),
            room: "実施手術室名".into(),
            start: "入室時刻".into(),
            end: "麻酔終了時刻".into(),
            department: "執刀診療科名".into(),
            name: "実施手術名０１".into(),
            urgency: "実施申込区分".into(),
        }
    }
}

/// Where records and the template live in the input workbook
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub data_sheet: String,
    pub template_sheet: String,
    pub columns: ColumnNames,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_sheet: "ガントチャートデータ".into(),
            template_sheet: "テンプレート".into(),
            columns: ColumnNames::default(),
        }
    }
}

/// Records grouped by date, with row accounting
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ingested {
    pub book: ScheduleBook,
    /// Data rows seen, blank rows excluded
    pub rows_read: usize,
    /// Rows left out of the chart because their date could not be read
    pub rows_dropped: usize,
}

/// Trimmed text of a cell; whole numbers print without a fraction.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_owned(),
        Data::Float(f) => {
            if *f == f.floor() && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Date of an Excel serial day number (1900 date system)
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

fn datetime_text(text: &str) -> Option<NaiveDateTime> {
    ["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text.trim(), format).ok())
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    ["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
        .or_else(|| datetime_text(text).map(|datetime| datetime.date()))
}

/// Read a date cell: a date value, a serial number or date text.
pub fn cell_to_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => date_from_serial(dt.as_f64()),
        Data::Float(f) => date_from_serial(*f),
        Data::Int(i) => date_from_serial(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_text(s),
        _ => None,
    }
}

/// Seconds since midnight of a day fraction; durations keep whole days
fn since_midnight(value: f64, keep_days: bool) -> TimeValue {
    let value = if keep_days { value } else { value.fract() };
    match Duration::try_seconds((value * 86_400.0).round() as i64) {
        Some(duration) => TimeValue::SinceMidnight(duration),
        None => TimeValue::Clock(value.to_string()),
    }
}

/// Read a time cell into one of the encodings `TimeValue` understands.
pub fn cell_to_time(cell: &Data) -> TimeValue {
    match cell {
        Data::Empty => TimeValue::Missing,
        Data::String(s) if s.trim().is_empty() => TimeValue::Missing,
        Data::String(s) => match datetime_text(s) {
            Some(datetime) => TimeValue::Time(datetime.time()),
            None => TimeValue::Clock(s.trim().to_owned()),
        },
        Data::DateTime(dt) => since_midnight(dt.as_f64(), dt.is_duration()),
        Data::Float(f) => since_midnight(*f, false),
        Data::DateTimeIso(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            Ok(datetime) => TimeValue::Time(datetime.time()),
            Err(_) => TimeValue::Clock(s.rsplit('T').next().unwrap_or(s).to_owned()),
        },
        other => TimeValue::Clock(cell_to_string(other)),
    }
}

struct Columns {
    date: usize,
    weekday: Option<usize>,
    room: usize,
    start: usize,
    end: usize,
    department: usize,
    name: Option<usize>,
    urgency: Option<usize>,
}

fn header_index(range: &Range<Data>) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    if let Some(row) = range.rows().next() {
        for (column, cell) in row.iter().enumerate() {
            let header = cell_to_string(cell);
            if !header.is_empty() {
                map.entry(header).or_insert(column);
            }
        }
    }
    map
}

impl Columns {
    fn resolve(range: &Range<Data>, sheet: &str, names: &ColumnNames) -> Result<Self, IngestError> {
        let headers = header_index(range);
        let require = |name: &str| {
            headers
                .get(name)
                .copied()
                .ok_or_else(|| IngestError::MissingColumn {
                    sheet: sheet.to_owned(),
                    column: name.to_owned(),
                })
        };
        Ok(Self {
            date: require(&names.date)?,
            weekday: headers.get(&names.weekday).copied(),
            room: require(&names.room)?,
            start: require(&names.start)?,
            end: require(&names.end)?,
            department: require(&names.department)?,
            name: headers.get(&names.name).copied(),
            urgency: headers.get(&names.urgency).copied(),
        })
    }
}

fn cell(row: &[Data], column: usize) -> &Data {
    row.get(column).unwrap_or(&Data::Empty)
}

fn optional_text(row: &[Data], column: Option<usize>) -> String {
    column.map(|c| cell_to_string(cell(row, c))).unwrap_or_default()
}

/// Group the rows of the data sheet into a [`ScheduleBook`].
///
/// The first row of `range` holds the headers. Rows whose date cannot be read
/// are dropped with a warning; everything else about a row is left to the
/// layout engine to judge.
pub fn parse_rows(
    range: &Range<Data>,
    sheet: &str,
    names: &ColumnNames,
) -> Result<Ingested, IngestError> {
    let columns = Columns::resolve(range, sheet, names)?;
    let mut ingested = Ingested::default();
    let first_row = range.start().map_or(0, |(row, _)| row);

    for (index, row) in range.rows().enumerate().skip(1) {
        if row.iter().all(|c| cell_to_string(c).is_empty()) {
            continue;
        }
        ingested.rows_read += 1;

        let Some(date) = cell_to_date(cell(row, columns.date)) else {
            tracing::warn!(
                sheet,
                row = first_row as usize + index + 1,
                value = %cell_to_string(cell(row, columns.date)),
                "row dropped: unreadable date"
            );
            ingested.rows_dropped += 1;
            continue;
        };
        let weekday = columns
            .weekday
            .and_then(|c| parse_weekday(&cell_to_string(cell(row, c))));

        let record = ActivityRecord::new(
            cell_to_string(cell(row, columns.room)),
            cell_to_time(cell(row, columns.start)),
            cell_to_time(cell(row, columns.end)),
        )
        .department(cell_to_string(cell(row, columns.department)))
        .name(optional_text(row, columns.name))
        .urgency(Urgency::from_label(&optional_text(row, columns.urgency)));

        ingested.book.push(date, weekday, record);
    }

    ingested.book.sort_records();
    tracing::info!(
        sheet,
        rows = ingested.rows_read,
        dropped = ingested.rows_dropped,
        days = ingested.book.len(),
        "records read"
    );
    Ok(ingested)
}
