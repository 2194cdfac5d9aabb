//! Reading generated input workbooks: records, template and raw copy

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use organtt_core::{ChartConfig, DateOrdering, Rgb, TimeOfDay, Urgency};
use organtt_io::{IngestError, InputConfig, InputWorkbook};
use organtt_render::{CellValue, LineStyle, StyleTemplate, TemplateSource};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use tempfile::TempDir;

const HEADERS: [&str; 8] = [
    "手術実施日",
    "曜日",
    "実施手術室名",
    "入室時刻",
    "麻酔終了時刻",
    "執刀診療科名",
    "実施手術名０１",
    "実施申込区分",
];

/// Input workbook with three surgeries on two days and, optionally, a template
fn write_input(dir: &Path, with_template: bool) -> PathBuf {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("yyyy/mm/dd");
    let time = Format::new().set_num_format("h:mm");
    let header = Format::new().set_bold().set_background_color(Color::RGB(0xDDEBF7));

    let data = workbook.add_worksheet();
    data.set_name("ガントチャートデータ").unwrap();
    for (column, name) in HEADERS.iter().enumerate() {
        data.write_string_with_format(0, column as u16, *name, &header)
            .unwrap();
    }
    data.set_column_width(0, 12).unwrap();

    let rows: [(f64, &str, &str, f64, f64, &str, &str, &str); 3] = [
        (45906.0, "土曜日", "02", 0.375, 0.4583333333, "眼科", "水晶体再建術", "定時"),
        (45906.0, "土曜日", "05", 0.5, 0.6, "総合外科", "腹腔鏡下胆嚢摘出術", "緊急"),
        (45908.0, "月曜日", "02", 0.3958333333, 0.5, "整形外科", "人工膝関節置換術", "臨時"),
    ];
    for (i, (day, weekday, room, start, end, department, name, urgency)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        data.write_number_with_format(row, 0, *day, &date).unwrap();
        data.write_string(row, 1, *weekday).unwrap();
        data.write_string(row, 2, *room).unwrap();
        data.write_number_with_format(row, 3, *start, &time).unwrap();
        data.write_number_with_format(row, 4, *end, &time).unwrap();
        data.write_string(row, 5, *department).unwrap();
        data.write_string(row, 6, *name).unwrap();
        data.write_string(row, 7, *urgency).unwrap();
    }
    // unreadable date, on a hidden row
    data.write_string(4, 0, "未定").unwrap();
    data.write_string(4, 2, "03").unwrap();
    data.set_row_hidden(4).unwrap();
    data.set_column_hidden(7).unwrap();

    if with_template {
        let template = workbook.add_worksheet();
        template.set_name("テンプレート").unwrap();
        let swatch = |color: u32| Format::new().set_background_color(Color::RGB(color));
        template.write_blank(1, 2, &swatch(0x00B050)).unwrap();
        template.write_blank(2, 2, &swatch(0xFFC000)).unwrap();
        template.write_blank(3, 2, &swatch(0xFF0000)).unwrap();
        template
            .write_string_with_format(4, 2, "ラベル", &Format::new().set_font_name("Meiryo UI").set_font_size(6))
            .unwrap();
        template.set_column_width(3, 3).unwrap();
        template.set_row_height(8, 20).unwrap();
        let dotted = Format::new().set_border(FormatBorder::Dotted);
        for column in 1..93u16 {
            template.write_blank(8, column, &dotted).unwrap();
        }
    }

    let path = dir.join("input.xlsx");
    workbook.save(&path).unwrap();
    path
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
}

#[test]
fn reads_records_grouped_by_date() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), false);
    let mut input = InputWorkbook::open(&path).unwrap();

    let ingested = input.read_records(&InputConfig::default()).unwrap();
    assert_eq!(ingested.rows_read, 4);
    assert_eq!(ingested.rows_dropped, 1);
    assert_eq!(ingested.book.dates(DateOrdering::Calendar), vec![date(6), date(8)]);

    let saturday = ingested.book.day(date(6)).unwrap();
    assert_eq!(saturday.records.len(), 2);
    let first = &saturday.records[0];
    assert_eq!(first.room, "02");
    assert_eq!(first.start.normalize().unwrap(), TimeOfDay::new(9, 0));
    assert_eq!(first.end.normalize().unwrap(), TimeOfDay::new(11, 0));
    assert_eq!(saturday.records[1].urgency, Urgency::Emergency);

    let monday = ingested.book.day(date(8)).unwrap();
    assert_eq!(monday.records[0].start.normalize().unwrap(), TimeOfDay::new(9, 30));
    assert_eq!(monday.records[0].urgency, Urgency::Urgent);
}

#[test]
fn missing_data_sheet_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), false);
    let mut input = InputWorkbook::open(&path).unwrap();

    let config = InputConfig {
        data_sheet: "Sheet9".into(),
        ..InputConfig::default()
    };
    assert!(matches!(
        input.read_records(&config),
        Err(IngestError::MissingSheet(name)) if name == "Sheet9"
    ));
}

#[test]
fn absent_template_is_none() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), false);
    let input = InputWorkbook::open(&path).unwrap();
    assert!(input.template(&InputConfig::default()).unwrap().is_none());
}

#[test]
fn template_swatches_widths_and_borders_are_read() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), true);
    let input = InputWorkbook::open(&path).unwrap();

    let template = input.template(&InputConfig::default()).unwrap().unwrap();
    assert_eq!(template.column_width(4), Some(3.0));
    assert_eq!(template.row_height(9), Some(20.0));
    assert_eq!(template.cell_style(2, 3).and_then(|s| s.fill), Some(Rgb(0x00B050)));
    let edge = template.cell_style(9, 10).unwrap().border.left.unwrap();
    assert_eq!(edge.style, LineStyle::Dotted);

    let config = ChartConfig::default();
    let style = StyleTemplate::extract(&template, &config);
    assert_eq!(style.palette.scheduled, Rgb(0x00B050));
    assert_eq!(style.palette.urgent, Rgb(0xFFC000));
    assert_eq!(style.palette.emergency, Rgb(0xFF0000));
    assert_eq!(style.label_font.name, "Meiryo UI");
    assert_eq!(style.label_font.size, 6.0);

    let region = style.region().unwrap();
    assert_eq!(region.column_widths.get(&4), Some(&3.0));
    // row 9 is the third row of the sampled block
    assert_eq!(region.row_heights.get(&3), Some(&20.0));
    assert!(region.borders[&(3, 10)].bottom.is_some());
    assert!(region.borders[&(2, 10)].is_empty());
}

#[test]
fn raw_copy_keeps_values_and_formats() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), false);
    let mut input = InputWorkbook::open(&path).unwrap();

    let raw = input.raw_sheet(&InputConfig::default(), "copy").unwrap();
    assert_eq!(raw.name(), "copy");
    assert_eq!(raw.text(1, 1), Some("手術実施日"));
    assert_eq!(raw.style(1, 1).and_then(|s| s.fill), Some(Rgb(0xDDEBF7)));
    assert_eq!(raw.value(2, 1), Some(&CellValue::Number(45906.0)));
    assert_eq!(
        raw.style(2, 1).and_then(|s| s.num_format.as_deref()),
        Some("yyyy/mm/dd")
    );
    assert_eq!(raw.style(2, 4).and_then(|s| s.num_format.as_deref()), Some("h:mm"));
    assert_eq!(raw.text(5, 1), Some("未定"));
    assert_eq!(raw.column_width(1), Some(12.0));
}

#[test]
fn raw_copy_keeps_hidden_rows_and_columns() {
    let dir = TempDir::new().unwrap();
    let path = write_input(dir.path(), false);
    let mut input = InputWorkbook::open(&path).unwrap();

    let raw = input.raw_sheet(&InputConfig::default(), "copy").unwrap();
    assert_eq!(raw.hidden_columns().collect::<Vec<_>>(), vec![8]);
    assert_eq!(raw.hidden_rows().collect::<Vec<_>>(), vec![5]);
    assert!(raw.is_column_hidden(8));
    assert!(raw.is_row_hidden(5));
    assert!(!raw.is_row_hidden(2));
    // hidden cells are still copied
    assert_eq!(raw.text(2, 8), Some("定時"));
    assert_eq!(raw.text(5, 1), Some("未定"));
}
