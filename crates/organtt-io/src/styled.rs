//! Formatting of one worksheet, read from the package.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Seek};

use organtt_core::CellRef;
use organtt_render::{CellStyle, MergeRange, TemplateSource};
use quick_xml::events::BytesStart;

use crate::ooxml::{attr, attr_flag, attr_parse, walk, Package, XmlVisitor};
use crate::styles::Stylesheet;
use crate::IngestError;

const WIDTH_PADDINGS: [f64; 2] = [0.83203125, 0.7109375];
const WIDTH_TOLERANCE: f64 = 0.0005;

/// Stored OOXML widths include cell padding; the writer adds it back.
fn strip_width_padding(raw: f64) -> f64 {
    let fraction = raw % 1.0;
    for padding in WIDTH_PADDINGS {
        if (fraction - padding).abs() < WIDTH_TOLERANCE && raw >= padding {
            return ((raw - padding) * 10000.0).round() / 10000.0;
        }
    }
    (raw * 10000.0).round() / 10000.0
}

/// Column widths, row heights, merges and per-cell formats of a sheet.
///
/// Dimensions are sparse: only columns and rows with an explicit size or a
/// hidden flag in the file are present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyledSheet {
    column_widths: BTreeMap<u16, f64>,
    row_heights: BTreeMap<u32, f64>,
    hidden_columns: BTreeSet<u16>,
    hidden_rows: BTreeSet<u32>,
    cell_formats: HashMap<(u32, u16), u32>,
    merges: Vec<MergeRange>,
    styles: Stylesheet,
}

impl StyledSheet {
    /// Read `sheet` from `package`; `None` when the workbook has no such sheet.
    pub fn load<R: Read + Seek>(
        package: &mut Package<R>,
        sheet: &str,
    ) -> Result<Option<Self>, IngestError> {
        let Some(part) = package.sheet_part(sheet)? else {
            return Ok(None);
        };
        let Some(sheet_xml) = package.read_part(&part)? else {
            return Ok(None);
        };
        let styles = match package.read_part("xl/styles.xml")? {
            Some(xml) => Stylesheet::parse(&xml)?,
            None => Stylesheet::default(),
        };

        let mut parser = SheetParser::default();
        walk(&sheet_xml, &part, &mut parser)?;
        tracing::debug!(
            sheet,
            part = %part,
            widths = parser.sheet.column_widths.len(),
            heights = parser.sheet.row_heights.len(),
            hidden_columns = parser.sheet.hidden_columns.len(),
            hidden_rows = parser.sheet.hidden_rows.len(),
            styled_cells = parser.sheet.cell_formats.len(),
            "worksheet formatting read"
        );
        Ok(Some(Self {
            styles,
            ..parser.sheet
        }))
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.column_widths.iter().map(|(c, w)| (*c, *w))
    }

    pub fn row_heights(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.row_heights.iter().map(|(r, h)| (*r, *h))
    }

    pub fn hidden_columns(&self) -> impl Iterator<Item = u16> + '_ {
        self.hidden_columns.iter().copied()
    }

    pub fn hidden_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.hidden_rows.iter().copied()
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    /// Cells with a non-default format, with their resolved style
    pub fn styled_cells(&self) -> impl Iterator<Item = ((u32, u16), CellStyle)> + '_ {
        self.cell_formats
            .iter()
            .filter_map(|(pos, index)| self.styles.style(*index).map(|style| (*pos, style)))
    }
}

impl TemplateSource for StyledSheet {
    fn column_width(&self, column: u16) -> Option<f64> {
        self.column_widths.get(&column).copied()
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    fn cell_style(&self, row: u32, column: u16) -> Option<CellStyle> {
        let index = self.cell_formats.get(&(row, column))?;
        self.styles.style(*index)
    }
}

fn parse_range(reference: &str) -> Option<MergeRange> {
    let (first, last) = reference.split_once(':')?;
    let first = CellRef::from_a1(first)?;
    let last = CellRef::from_a1(last)?;
    Some(MergeRange::new(first.row, first.column, last.row, last.column))
}

#[derive(Default)]
struct SheetParser {
    sheet: StyledSheet,
}

impl XmlVisitor for SheetParser {
    fn open(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"col" => {
                let (Some(min), Some(max)) = (
                    attr_parse::<u16>(element, b"min"),
                    attr_parse::<u16>(element, b"max"),
                ) else {
                    return;
                };
                let width = attr_parse::<f64>(element, b"width").map(strip_width_padding);
                let hidden = attr_flag(element, b"hidden", false);
                // a <col> element can cover a range of columns
                for column in min..=max.min(16384) {
                    if let Some(width) = width {
                        self.sheet.column_widths.insert(column, width);
                    }
                    if hidden {
                        self.sheet.hidden_columns.insert(column);
                    }
                }
            }
            b"row" => {
                let Some(row) = attr_parse::<u32>(element, b"r") else {
                    return;
                };
                if let Some(height) = attr_parse::<f64>(element, b"ht") {
                    self.sheet.row_heights.insert(row, height);
                }
                if attr_flag(element, b"hidden", false) {
                    self.sheet.hidden_rows.insert(row);
                }
            }
            b"c" => {
                let Some(cell) = attr(element, b"r").and_then(|r| CellRef::from_a1(&r)) else {
                    return;
                };
                match attr_parse::<u32>(element, b"s") {
                    Some(index) if index > 0 => {
                        self.sheet.cell_formats.insert((cell.row, cell.column), index);
                    }
                    _ => {}
                }
            }
            b"mergeCell" => {
                if let Some(range) = attr(element, b"ref").and_then(|r| parse_range(&r)) {
                    self.sheet.merges.push(range);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cols>
    <col min="1" max="1" width="2.7109375" customWidth="1"/>
    <col min="4" max="6" width="3.2" customWidth="1"/>
    <col min="8" max="9" width="12.7109375" hidden="1"/>
    <col min="10" max="10" width="5" hidden="0"/>
  </cols>
  <sheetData>
    <row r="6" ht="18" customHeight="1"><c r="B6" s="1" t="s"><v>0</v></c><c r="C6" s="0"/></row>
    <row r="7"><c r="B7" s="2"><v>45906</v></c></row>
    <row r="9" hidden="1"><c r="B9"><v>1</v></c></row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="B7:B17"/></mergeCells>
</worksheet>"#;

    #[test]
    fn parses_dimensions_formats_and_merges() {
        let mut parser = SheetParser::default();
        walk(SHEET, "sheet1.xml", &mut parser).unwrap();
        let sheet = parser.sheet;

        assert_eq!(
            sheet.column_widths().collect::<Vec<_>>(),
            vec![(1, 2.0), (4, 3.2), (5, 3.2), (6, 3.2), (8, 12.0), (9, 12.0), (10, 5.0)]
        );
        assert_eq!(sheet.row_heights().collect::<Vec<_>>(), vec![(6, 18.0)]);
        assert_eq!(sheet.hidden_columns().collect::<Vec<_>>(), vec![8, 9]);
        assert_eq!(sheet.hidden_rows().collect::<Vec<_>>(), vec![9]);
        assert_eq!(sheet.cell_formats.get(&(6, 2)), Some(&1));
        assert_eq!(sheet.cell_formats.get(&(6, 3)), None);
        assert_eq!(sheet.cell_formats.get(&(7, 2)), Some(&2));
        assert_eq!(sheet.merges(), &[MergeRange::new(7, 2, 17, 2)]);
    }

    #[test]
    fn width_padding_is_stripped() {
        assert_eq!(strip_width_padding(2.7109375), 2.0);
        assert_eq!(strip_width_padding(9.83203125), 9.0);
        assert_eq!(strip_width_padding(3.2), 3.2);
    }
}
