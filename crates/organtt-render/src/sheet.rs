//! In-memory worksheet the layout engine paints into.
//!
//! Rows and columns are 1-based, as in A1 notation: `(6, 2)` is `B6`. The XLSX
//! writer converts to the 0-based indices of `rust_xlsxwriter` when flushing.
//! Writes only touch the fields they name, so painting a fill keeps the value
//! and font of a cell, and the last write to a field wins.

use std::collections::{BTreeMap, BTreeSet};

use crate::style::{Alignment, Border, CellStyle, Font};
use organtt_core::Rgb;

#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: Option<CellValue>,
    pub style: CellStyle,
}

/// Inclusive rectangular range of merged cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeRange {
    pub first_row: u32,
    pub first_column: u16,
    pub last_row: u32,
    pub last_column: u16,
}

impl MergeRange {
    pub const fn new(first_row: u32, first_column: u16, last_row: u32, last_column: u16) -> Self {
        Self {
            first_row,
            first_column,
            last_row,
            last_column,
        }
    }

    pub fn contains(&self, row: u32, column: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_column..=self.last_column).contains(&column)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_column <= other.last_column
            && other.first_column <= self.last_column
    }

    fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_column == self.last_column
    }
}

/// Print and view settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSetup {
    pub zoom: u16,
    pub landscape: bool,
    /// Excel paper size code (8 = A3)
    pub paper_size: u8,
    /// Fit all columns on one page width
    pub fit_to_width: bool,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            zoom: 100,
            landscape: false,
            paper_size: 0,
            fit_to_width: false,
        }
    }
}

/// A worksheet under construction
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<MergeRange>,
    column_widths: BTreeMap<u16, f64>,
    row_heights: BTreeMap<u32, f64>,
    hidden_columns: BTreeSet<u16>,
    hidden_rows: BTreeSet<u32>,
    pub page: PageSetup,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, row: u32, column: u16) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    /// Cell at `(row, column)`, created empty on first access
    pub fn cell_mut(&mut self, row: u32, column: u16) -> &mut Cell {
        self.cells.entry((row, column)).or_default()
    }

    pub fn value(&self, row: u32, column: u16) -> Option<&CellValue> {
        self.cell(row, column).and_then(|cell| cell.value.as_ref())
    }

    pub fn text(&self, row: u32, column: u16) -> Option<&str> {
        self.value(row, column).and_then(CellValue::as_text)
    }

    pub fn style(&self, row: u32, column: u16) -> Option<&CellStyle> {
        self.cell(row, column).map(|cell| &cell.style)
    }

    pub fn set_value(&mut self, row: u32, column: u16, value: impl Into<CellValue>) -> &mut Cell {
        let cell = self.cell_mut(row, column);
        cell.value = Some(value.into());
        cell
    }

    pub fn set_font(&mut self, row: u32, column: u16, font: Font) {
        self.cell_mut(row, column).style.font = Some(font);
    }

    pub fn set_fill(&mut self, row: u32, column: u16, color: Rgb) {
        self.cell_mut(row, column).style.fill = Some(color);
    }

    pub fn set_border(&mut self, row: u32, column: u16, border: Border) {
        self.cell_mut(row, column).style.border = border;
    }

    pub fn set_alignment(&mut self, row: u32, column: u16, alignment: Alignment) {
        self.cell_mut(row, column).style.alignment = Some(alignment);
    }

    /// Merge a range. Single cells are not recorded; a range that overlaps an
    /// existing merge is rejected and `false` is returned.
    pub fn merge(&mut self, range: MergeRange) -> bool {
        if range.is_single_cell() {
            return true;
        }
        if self.merges.iter().any(|existing| existing.overlaps(&range)) {
            tracing::debug!(?range, sheet = %self.name, "overlapping merge ignored");
            return false;
        }
        self.merges.push(range);
        true
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    pub fn set_column_width(&mut self, column: u16, width: f64) {
        self.column_widths.insert(column, width);
    }

    pub fn column_width(&self, column: u16) -> Option<f64> {
        self.column_widths.get(&column).copied()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.column_widths.iter().map(|(column, width)| (*column, *width))
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    pub fn row_heights(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.row_heights.iter().map(|(row, height)| (*row, *height))
    }

    pub fn set_column_hidden(&mut self, column: u16) {
        self.hidden_columns.insert(column);
    }

    pub fn is_column_hidden(&self, column: u16) -> bool {
        self.hidden_columns.contains(&column)
    }

    pub fn hidden_columns(&self) -> impl Iterator<Item = u16> + '_ {
        self.hidden_columns.iter().copied()
    }

    pub fn set_row_hidden(&mut self, row: u32) {
        self.hidden_rows.insert(row);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains(&row)
    }

    pub fn hidden_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.hidden_rows.iter().copied()
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    /// Highest row holding a cell
    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    /// Cells of one row, keyed by column
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells
            .range((row, 0)..=(row, u16::MAX))
            .map(|((_, column), cell)| (*column, cell))
    }
}
