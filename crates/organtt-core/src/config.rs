//! Chart configuration.
//!
//! Every value has a default that reproduces the layout the hospital's
//! original sheets used, so an empty configuration file is valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::department::DepartmentCodes;
use crate::time::TimeWindow;
use crate::utilization::UtilizationPolicy;
use crate::{ConfigError, RoomId};

/// Room rows of every day block, top to bottom
pub fn default_room_order() -> Vec<RoomId> {
    ["01A", "01B", "02", "03", "05", "06", "07", "08", "09", "10", "ｱﾝｷﾞｵ"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// An RGB color, written as six hex digits (`"A0C8E4"`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u32);

impl Rgb {
    pub const BLACK: Self = Self(0x000000);

    /// Parse `RRGGBB`, `#RRGGBB` or `AARRGGBB` (alpha is dropped)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let rgb = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        u32::from_str_radix(rgb, 16).ok().map(Self)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or(ConfigError::InvalidColor(value))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A 1-based cell position, written in A1 notation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub row: u32,
    pub column: u16,
}

impl CellRef {
    pub const fn new(row: u32, column: u16) -> Self {
        Self { row, column }
    }

    /// Parse `"C2"`; absolute markers (`$C$2`) are accepted.
    pub fn from_a1(a1: &str) -> Option<Self> {
        let a1 = a1.trim();
        let mut column: u32 = 0;
        let mut digits = String::new();
        for ch in a1.chars().filter(|c| *c != '$') {
            if ch.is_ascii_alphabetic() && digits.is_empty() {
                column = column * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
                if column > u32::from(u16::MAX) {
                    return None;
                }
            } else if ch.is_ascii_digit() {
                digits.push(ch);
            } else {
                return None;
            }
        }
        let row = digits.parse::<u32>().ok()?;
        if column == 0 || row == 0 {
            return None;
        }
        Some(Self::new(row, column as u16))
    }
}

/// Column letters for a 1-based column number (`1` -> `"A"`)
pub fn column_letter(column: u16) -> String {
    let mut n = u32::from(column);
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.column), self.row)
    }
}

impl FromStr for CellRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s).ok_or_else(|| ConfigError::InvalidCell(s.to_string()))
    }
}

impl TryFrom<String> for CellRef {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRef> for String {
    fn from(value: CellRef) -> Self {
        value.to_string()
    }
}

/// Where the style sample lives on the template sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRegion {
    /// Row styled like a block's header row
    pub header_row: u32,
    pub first_room_row: u32,
    pub last_room_row: u32,
    pub first_column: u16,
    pub last_column: u16,
    pub scheduled_swatch: CellRef,
    pub urgent_swatch: CellRef,
    pub emergency_swatch: CellRef,
    /// Cell whose font is used for bar labels
    pub label_font_sample: CellRef,
    pub date_cell: CellRef,
    pub room_cell: CellRef,
}

impl Default for TemplateRegion {
    fn default() -> Self {
        Self {
            header_row: 6,
            first_room_row: 7,
            last_room_row: 17,
            first_column: 2,
            last_column: 93,
            scheduled_swatch: CellRef::new(2, 3),
            urgent_swatch: CellRef::new(3, 3),
            emergency_swatch: CellRef::new(4, 3),
            label_font_sample: CellRef::new(5, 3),
            date_cell: CellRef::new(7, 2),
            room_cell: CellRef::new(7, 3),
        }
    }
}

impl TemplateRegion {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.header_row < self.first_room_row && self.first_room_row <= self.last_room_row) {
            return Err(ConfigError::InvalidRegion(format!(
                "rows {}/{}..{} are out of order",
                self.header_row, self.first_room_row, self.last_room_row
            )));
        }
        if self.first_column == 0 || self.first_column > self.last_column {
            return Err(ConfigError::InvalidRegion(format!(
                "columns {}..{} are out of order",
                self.first_column, self.last_column
            )));
        }
        Ok(())
    }
}

/// Built-in bar colors, replaced by template swatches when present
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub scheduled: Rgb,
    pub urgent: Rgb,
    pub emergency: Rgb,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            scheduled: Rgb(0xA0C8E4),
            urgent: Rgb(0x6DABD5),
            emergency: Rgb(0xFF8CCC),
        }
    }
}

/// Output sheet names and titles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    /// Copy of the raw input sheet
    pub data: String,
    pub by_date: String,
    pub by_weekday: String,
    pub by_date_title: String,
    pub by_weekday_title: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            data: "ガントチャートデータ".into(),
            by_date: "手術室ガントチャート".into(),
            by_weekday: "手術室ガントチャート・曜日順".into(),
            by_date_title: "手術室 ガントチャート".into(),
            by_weekday_title: "手術室 ガントチャート・曜日順".into(),
        }
    }
}

/// Everything the layout engine needs besides the records
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub rooms: Vec<RoomId>,
    pub window: TimeWindow,
    /// Column of the window start (D)
    pub column_offset: u16,
    pub date_column: u16,
    pub room_column: u16,
    /// Header row of the first day block
    pub first_block_row: u32,
    /// Blank rows between consecutive blocks
    pub block_gap: u32,
    /// Character budget of the display name inside a bar label
    pub label_max_chars: usize,
    pub font_name: String,
    pub label_font_size: f64,
    pub palette: PaletteConfig,
    pub utilization: UtilizationPolicy,
    pub departments: DepartmentCodes,
    pub template: TemplateRegion,
    pub sheets: SheetNames,
    pub footnotes: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            rooms: default_room_order(),
            window: TimeWindow::default(),
            column_offset: 4,
            date_column: 2,
            room_column: 3,
            first_block_row: 6,
            block_gap: 1,
            label_max_chars: 40,
            font_name: "Meiryo UI".into(),
            label_font_size: 6.0,
            palette: PaletteConfig::default(),
            utilization: UtilizationPolicy::default(),
            departments: DepartmentCodes::default(),
            template: TemplateRegion::default(),
            sheets: SheetNames::default(),
            footnotes: vec![
                "※稼働率 = 平日:9:00-17:00（8h×9室）、土曜:9:00-13:00（4h×9室）".into(),
                "※01A・01Bは各0.5室換算、アンギオ室は除外".into(),
            ],
        }
    }
}

impl ChartConfig {
    /// Rows taken by one day block
    pub fn block_height(&self) -> u32 {
        1 + self.rooms.len() as u32
    }

    pub fn last_column(&self) -> u16 {
        self.window.last_column(self.column_offset)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        self.template.validate()?;
        self.utilization.validate()?;
        if self.rooms.is_empty() {
            return Err(ConfigError::EmptyRoomOrder);
        }
        if self.date_column == 0
            || self.room_column == 0
            || self.date_column >= self.column_offset
            || self.room_column >= self.column_offset
        {
            return Err(ConfigError::InvalidLayout(
                "date and room columns must precede the time axis".into(),
            ));
        }
        // title, legend and footnotes occupy rows 1..=2 + footnotes
        let preamble = 2 + self.footnotes.len() as u32;
        if self.first_block_row <= preamble {
            return Err(ConfigError::InvalidLayout(format!(
                "first block row {} overlaps the legend rows",
                self.first_block_row
            )));
        }
        Ok(())
    }
}
