//! Sheet composition: one-time setup, then day blocks down the sheet.

use std::borrow::Cow;

use chrono::{Datelike, NaiveDate};
use organtt_core::{ChartConfig, DaySchedule, ScheduleBook, Urgency};

use crate::layout::{DayBlock, DayBlockLayout};
use crate::sheet::{PageSetup, Sheet};
use crate::style::{Alignment, Font};
use crate::template::StyleTemplate;

const TITLE_ROW: u32 = 1;
const LEGEND_ROW: u32 = 2;

/// What one composed sheet contains
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposeSummary {
    pub days_written: usize,
    pub blocks: Vec<DayBlock>,
}

impl ComposeSummary {
    pub fn bars(&self) -> usize {
        self.blocks.iter().map(|block| block.bars).sum()
    }

    pub fn skipped(&self) -> usize {
        self.blocks.iter().map(|block| block.skipped).sum()
    }
}

pub struct SheetComposer<'a> {
    config: &'a ChartConfig,
    style: &'a StyleTemplate,
    layout: DayBlockLayout<'a>,
}

impl<'a> SheetComposer<'a> {
    pub fn new(config: &'a ChartConfig, style: &'a StyleTemplate) -> Self {
        Self {
            config,
            style,
            layout: DayBlockLayout::new(config, style),
        }
    }

    /// Column widths, title, legend, footnotes and page setup.
    pub fn setup(&self, sheet: &mut Sheet, title: &str) {
        let geometry = self.layout.geometry();
        sheet.set_column_width(1, 2.0);
        sheet.set_column_width(geometry.date_column, 12.0);
        sheet.set_column_width(geometry.room_column, 6.0);
        for column in geometry.first_time_column..=geometry.last_time_column {
            sheet.set_column_width(column, 2.5);
        }
        if let Some(region) = self.style.region() {
            for (column, width) in &region.column_widths {
                sheet.set_column_width(*column, *width);
            }
        }

        let font = &self.config.font_name;
        sheet.set_value(TITLE_ROW, geometry.date_column, title);
        sheet.set_font(TITLE_ROW, geometry.date_column, Font::new(font, 14.0).bold());

        sheet.set_value(LEGEND_ROW, geometry.date_column, "■凡例:");
        sheet.set_font(LEGEND_ROW, geometry.date_column, Font::new(font, 8.0).bold());
        for (index, urgency) in Urgency::ALL.into_iter().enumerate() {
            let column = self.config.column_offset + 2 * index as u16;
            sheet.set_value(LEGEND_ROW, column, urgency.label());
            sheet.set_fill(LEGEND_ROW, column, self.style.palette.color(urgency));
            sheet.set_font(LEGEND_ROW, column, Font::new(font, 8.0));
            sheet.set_alignment(LEGEND_ROW, column, Alignment::centered());
        }

        for (index, note) in self.config.footnotes.iter().enumerate() {
            let row = LEGEND_ROW + 1 + index as u32;
            sheet.set_value(row, geometry.date_column, note.as_str());
            sheet.set_font(row, geometry.date_column, Font::new(font, 8.0));
        }

        sheet.page = PageSetup {
            zoom: 80,
            landscape: true,
            paper_size: 8,
            fit_to_width: true,
        };
    }

    /// Set up `sheet` and write one block per date of `dates`.
    ///
    /// Dates without records still get an empty block.
    pub fn compose(
        &self,
        sheet: &mut Sheet,
        title: &str,
        dates: &[NaiveDate],
        book: &ScheduleBook,
    ) -> ComposeSummary {
        self.setup(sheet, title);

        let mut summary = ComposeSummary::default();
        let mut cursor = self.config.first_block_row;
        for date in dates {
            let day = match book.day(*date) {
                Some(day) => Cow::Borrowed(day),
                None => Cow::Owned(DaySchedule::new(*date, date.weekday())),
            };
            let block = self.layout.layout(sheet, cursor, &day);
            cursor = block.next_row + self.config.block_gap;
            summary.blocks.push(block);
            summary.days_written += 1;
        }

        tracing::info!(
            sheet = sheet.name(),
            days = summary.days_written,
            bars = summary.bars(),
            skipped = summary.skipped(),
            "chart sheet composed"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use organtt_core::{ActivityRecord, Rgb, TimeValue};
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[test]
    fn setup_writes_preamble() {
        let config = ChartConfig::default();
        let style = StyleTemplate::builtin(&config);
        let composer = SheetComposer::new(&config, &style);
        let mut sheet = Sheet::new("chart");
        composer.setup(&mut sheet, "手術室 ガントチャート（2025年9月）");

        assert_eq!(sheet.text(1, 2), Some("手術室 ガントチャート（2025年9月）"));
        assert!(sheet.style(1, 2).unwrap().font.as_ref().unwrap().bold);
        assert_eq!(sheet.text(2, 2), Some("■凡例:"));
        assert_eq!(sheet.text(2, 4), Some("定時"));
        assert_eq!(sheet.text(2, 6), Some("臨時"));
        assert_eq!(sheet.text(2, 8), Some("緊急"));
        assert_eq!(sheet.style(2, 8).unwrap().fill, Some(Rgb(0xFF8CCC)));
        assert!(sheet.text(3, 2).unwrap().starts_with("※稼働率"));
        assert!(sheet.text(4, 2).unwrap().starts_with("※01A"));

        assert_eq!(sheet.column_width(1), Some(2.0));
        assert_eq!(sheet.column_width(2), Some(12.0));
        assert_eq!(sheet.column_width(3), Some(6.0));
        assert_eq!(sheet.column_width(93), Some(2.5));
        assert_eq!(sheet.page.zoom, 80);
        assert!(sheet.page.landscape);
    }

    #[test]
    fn blocks_advance_by_height_and_gap() {
        let config = ChartConfig::default();
        let style = StyleTemplate::builtin(&config);
        let composer = SheetComposer::new(&config, &style);
        let mut book = ScheduleBook::new();
        book.push(
            date(1),
            None,
            ActivityRecord::new("02", TimeValue::from("9:00"), TimeValue::from("10:00"))
                .department("眼科"),
        );

        let mut sheet = Sheet::new("chart");
        // 2025-09-02 has no records
        let summary = composer.compose(&mut sheet, "t", &[date(1), date(2)], &book);

        assert_eq!(summary.days_written, 2);
        assert_eq!(summary.bars(), 1);
        assert_eq!(summary.blocks[0].rows(), 6..=17);
        assert_eq!(summary.blocks[1].rows(), 19..=30);
        assert_eq!(sheet.text(20, 2), Some("09/02(火)\n0.0%"));
    }
}
