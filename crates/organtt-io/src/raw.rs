//! Copy of the input data sheet for the output workbook.

use calamine::{Data, Range};
use organtt_render::{CellValue, Sheet};

use crate::styled::StyledSheet;

const TIME_FORMAT: &str = "h:mm";
const DATE_FORMAT: &str = "yyyy/m/d";

fn value_of(cell: &Data) -> Option<(CellValue, Option<&'static str>)> {
    let value = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_owned()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            let format = if serial < 1.0 { TIME_FORMAT } else { DATE_FORMAT };
            return Some((CellValue::Number(serial), Some(format)));
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    };
    Some((value, None))
}

/// Copy every value of `range` to a sheet called `name` at the same position.
///
/// With `styled`, the source formatting comes along: cell formats, column
/// widths, row heights, hidden rows and columns, and merged ranges. Date
/// cells without a number format of their own get a plain date or time
/// format so they do not show up as serial numbers.
pub fn copy_sheet(name: &str, range: &Range<Data>, styled: Option<&StyledSheet>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let (first_row, first_column) = range.start().unwrap_or((0, 0));

    if let Some(styled) = styled {
        for ((row, column), style) in styled.styled_cells() {
            sheet.cell_mut(row, column).style = style;
        }
        for (column, width) in styled.column_widths() {
            sheet.set_column_width(column, width);
        }
        for (row, height) in styled.row_heights() {
            sheet.set_row_height(row, height);
        }
        for column in styled.hidden_columns() {
            sheet.set_column_hidden(column);
        }
        for row in styled.hidden_rows() {
            sheet.set_row_hidden(row);
        }
        for range in styled.merges() {
            sheet.merge(*range);
        }
    }

    let mut copied = 0usize;
    for (row, column, data) in range.used_cells() {
        let Some((value, default_format)) = value_of(data) else {
            continue;
        };
        let row = first_row + row as u32 + 1;
        let Ok(column) = u16::try_from(first_column as usize + column + 1) else {
            continue;
        };
        let cell = sheet.set_value(row, column, value);
        if cell.style.num_format.is_none() {
            cell.style.num_format = default_format.map(String::from);
        }
        copied += 1;
    }

    tracing::debug!(sheet = name, cells = copied, styled = styled.is_some(), "data sheet copied");
    sheet
}
