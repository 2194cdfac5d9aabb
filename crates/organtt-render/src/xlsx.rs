//! Flush in-memory sheets to an XLSX workbook with `rust_xlsxwriter`.

use organtt_core::{RenderError, Rgb};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::sheet::{CellValue, Sheet};
use crate::style::{CellStyle, HAlign, LineStyle, VAlign};

fn format_err(err: rust_xlsxwriter::XlsxError) -> RenderError {
    RenderError::Format(err.to_string())
}

fn color(rgb: Rgb) -> Color {
    Color::RGB(rgb.0)
}

fn line(style: LineStyle) -> FormatBorder {
    match style {
        LineStyle::Thin => FormatBorder::Thin,
        LineStyle::Medium => FormatBorder::Medium,
        LineStyle::Thick => FormatBorder::Thick,
        LineStyle::Dashed => FormatBorder::Dashed,
        LineStyle::Dotted => FormatBorder::Dotted,
        LineStyle::Hair => FormatBorder::Hair,
        LineStyle::Double => FormatBorder::Double,
        LineStyle::MediumDashed => FormatBorder::MediumDashed,
        LineStyle::DashDot => FormatBorder::DashDot,
        LineStyle::DashDotDot => FormatBorder::DashDotDot,
    }
}

/// Translate a cell style into a `Format`
pub fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    if let Some(font) = &style.font {
        if !font.name.is_empty() {
            format = format.set_font_name(&font.name);
        }
        if font.size > 0.0 {
            format = format.set_font_size(font.size);
        }
        if font.bold {
            format = format.set_bold();
        }
        if let Some(rgb) = font.color {
            format = format.set_font_color(color(rgb));
        }
    }

    if let Some(fill) = style.fill {
        format = format.set_background_color(color(fill));
    }

    let border = &style.border;
    if let Some(edge) = border.left {
        format = format.set_border_left(line(edge.style));
        if let Some(rgb) = edge.color {
            format = format.set_border_left_color(color(rgb));
        }
    }
    if let Some(edge) = border.right {
        format = format.set_border_right(line(edge.style));
        if let Some(rgb) = edge.color {
            format = format.set_border_right_color(color(rgb));
        }
    }
    if let Some(edge) = border.top {
        format = format.set_border_top(line(edge.style));
        if let Some(rgb) = edge.color {
            format = format.set_border_top_color(color(rgb));
        }
    }
    if let Some(edge) = border.bottom {
        format = format.set_border_bottom(line(edge.style));
        if let Some(rgb) = edge.color {
            format = format.set_border_bottom_color(color(rgb));
        }
    }

    if let Some(alignment) = style.alignment {
        match alignment.horizontal {
            Some(HAlign::Left) => format = format.set_align(FormatAlign::Left),
            Some(HAlign::Center) => format = format.set_align(FormatAlign::Center),
            Some(HAlign::Right) => format = format.set_align(FormatAlign::Right),
            None => {}
        }
        match alignment.vertical {
            Some(VAlign::Top) => format = format.set_align(FormatAlign::Top),
            Some(VAlign::Center) => format = format.set_align(FormatAlign::VerticalCenter),
            Some(VAlign::Bottom) => format = format.set_align(FormatAlign::Bottom),
            None => {}
        }
        if alignment.wrap_text {
            format = format.set_text_wrap();
        }
    }

    if let Some(num_format) = &style.num_format {
        format = format.set_num_format(num_format);
    }
    format
}

/// Write one sheet into a worksheet, converting to 0-based indices.
pub fn write_sheet(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<(), RenderError> {
    worksheet.set_name(sheet.name()).map_err(format_err)?;

    for (column, width) in sheet.column_widths() {
        if column > 0 {
            worksheet
                .set_column_width(column - 1, width)
                .map_err(format_err)?;
        }
    }
    for (row, height) in sheet.row_heights() {
        if row > 0 {
            worksheet.set_row_height(row - 1, height).map_err(format_err)?;
        }
    }
    for column in sheet.hidden_columns().filter(|c| *c > 0) {
        worksheet.set_column_hidden(column - 1).map_err(format_err)?;
    }
    for row in sheet.hidden_rows().filter(|r| *r > 0) {
        worksheet.set_row_hidden(row - 1).map_err(format_err)?;
    }

    // Merges first, the cells written afterwards replace the blanks they leave.
    for range in sheet.merges() {
        let format = sheet
            .style(range.first_row, range.first_column)
            .map(to_format)
            .unwrap_or_default();
        worksheet
            .merge_range(
                range.first_row - 1,
                range.first_column - 1,
                range.last_row - 1,
                range.last_column - 1,
                "",
                &format,
            )
            .map_err(format_err)?;
    }

    for ((row, column), cell) in sheet.cells() {
        if row == 0 || column == 0 {
            continue;
        }
        let (row, column) = (row - 1, column - 1);
        let format = to_format(&cell.style);
        match &cell.value {
            Some(CellValue::Text(text)) => {
                worksheet
                    .write_string_with_format(row, column, text, &format)
                    .map_err(format_err)?;
            }
            Some(CellValue::Number(number)) => {
                worksheet
                    .write_number_with_format(row, column, *number, &format)
                    .map_err(format_err)?;
            }
            None if !cell.style.is_default() => {
                worksheet.write_blank(row, column, &format).map_err(format_err)?;
            }
            None => {}
        }
    }

    let page = sheet.page;
    if page.zoom != 100 {
        worksheet.set_zoom(page.zoom);
    }
    if page.landscape {
        worksheet.set_landscape();
    }
    if page.paper_size != 0 {
        worksheet.set_paper_size(page.paper_size);
    }
    if page.fit_to_width {
        worksheet.set_print_fit_to_pages(1, 0);
    }
    Ok(())
}

/// Serialize sheets, in order, into XLSX bytes.
pub fn to_xlsx_bytes<'a, I>(sheets: I) -> Result<Vec<u8>, RenderError>
where
    I: IntoIterator<Item = &'a Sheet>,
{
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(sheet, worksheet)?;
    }
    workbook
        .save_to_buffer()
        .map_err(|e| RenderError::Format(format!("Failed to create workbook: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MergeRange;
    use crate::style::{Border, Edge, Font};

    #[test]
    fn workbook_is_a_zip_package() {
        let mut sheet = Sheet::new("chart");
        sheet.set_value(1, 2, "title");
        sheet.set_value(6, 4, 800u32);
        sheet.merge(MergeRange::new(6, 4, 6, 9));
        sheet.set_fill(7, 5, Rgb(0xA0C8E4));
        sheet.set_border(
            7,
            5,
            Border {
                left: Some(Edge::thin()),
                ..Border::default()
            },
        );

        let bytes = to_xlsx_bytes([&sheet]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn duplicate_sheet_names_fail() {
        let a = Sheet::new("same");
        let b = Sheet::new("same");
        assert!(matches!(to_xlsx_bytes([&a, &b]), Err(RenderError::Format(_))));
    }

    #[test]
    fn format_translation_keeps_defaults_empty() {
        assert_eq!(to_format(&CellStyle::default()), Format::new());
        let style = CellStyle {
            font: Some(Font::new("Meiryo UI", 6.0).bold()),
            ..CellStyle::default()
        };
        assert_ne!(to_format(&style), Format::new());
    }
}
