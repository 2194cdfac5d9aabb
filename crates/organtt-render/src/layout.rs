//! Day block layout: one header row plus one row per room.
//!
//! ```text
//!        B        C      D .. I   J .. O        CO
//! 6   | 日付   | 部屋名 |  800   |  900   | ... |      header (hour labels merged)
//! 7   | 09/01  | 01A    |        |■■■■■■ |     |      room rows
//! ..  | (月)   | ...    |        |        |     |
//! 17  | 55.6%  | ｱﾝｷﾞｵ  |        |        |     |
//! ```

use std::ops::RangeInclusive;

use organtt_core::{ActivityRecord, ChartConfig, DaySchedule, RecordError, TimeWindow, Utilization};

use crate::sheet::{MergeRange, Sheet};
use crate::style::{Alignment, Border, Edge, Font, VAlign};
use crate::template::StyleTemplate;

/// Column positions shared by every block of a sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub date_column: u16,
    pub room_column: u16,
    pub first_time_column: u16,
    pub last_time_column: u16,
    pub window: TimeWindow,
    pub room_count: u32,
}

impl Geometry {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            date_column: config.date_column,
            room_column: config.room_column,
            first_time_column: config.column_offset,
            last_time_column: config.last_column(),
            window: config.window,
            room_count: config.rooms.len() as u32,
        }
    }

    /// Leftmost column a block writes to
    pub fn first_column(&self) -> u16 {
        self.date_column.min(self.room_column)
    }

    pub fn columns(&self) -> RangeInclusive<u16> {
        self.first_column()..=self.last_time_column
    }

    fn is_hour_boundary(&self, column: u16) -> bool {
        column <= self.last_time_column
            && self.window.is_hour_boundary(column, self.first_time_column)
    }

    /// Rule-based grid used without a template: thin lines left of the date,
    /// room and hour columns, a closing line on the right, and horizontal
    /// lines around the header and under the last room row.
    pub fn default_border(&self, row_offset: u32, column: u16) -> Border {
        let thin = Some(Edge::thin());
        let mut border = Border::default();
        if column == self.date_column || column == self.room_column || self.is_hour_boundary(column) {
            border.left = thin;
        }
        if column == self.last_time_column {
            border.right = thin;
        }
        if row_offset == 0 {
            border.top = thin;
            border.bottom = thin;
        }
        if row_offset == self.room_count {
            border.bottom = thin;
        }
        border
    }
}

/// Result of laying out one day
#[derive(Clone, Debug, PartialEq)]
pub struct DayBlock {
    pub start_row: u32,
    /// First row after the block, before the gap
    pub next_row: u32,
    pub utilization: Utilization,
    pub bars: usize,
    /// Records that could not be drawn
    pub skipped: usize,
}

impl DayBlock {
    pub fn rows(&self) -> RangeInclusive<u32> {
        self.start_row..=self.next_row - 1
    }
}

/// Lays out day blocks with one configuration and style template
#[derive(Clone, Debug)]
pub struct DayBlockLayout<'a> {
    config: &'a ChartConfig,
    style: &'a StyleTemplate,
    geometry: Geometry,
}

impl<'a> DayBlockLayout<'a> {
    pub fn new(config: &'a ChartConfig, style: &'a StyleTemplate) -> Self {
        Self {
            config,
            style,
            geometry: Geometry::from_config(config),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Write the block for `day` starting at `start_row`.
    pub fn layout(&self, sheet: &mut Sheet, start_row: u32, day: &DaySchedule) -> DayBlock {
        let policy = &self.config.utilization;
        let utilization = policy.utilization(
            &day.records,
            &self.config.rooms,
            policy.is_short_day(day.weekday),
        );
        tracing::debug!(
            date = %day.date,
            ratio = utilization.ratio,
            skipped = utilization.skipped,
            "day utilization"
        );

        if let Some(region) = self.style.region() {
            for (offset, height) in &region.row_heights {
                if *offset <= self.geometry.room_count {
                    sheet.set_row_height(start_row + offset, *height);
                }
            }
        }
        self.write_header(sheet, start_row);

        let mut block = DayBlock {
            start_row,
            next_row: start_row + 1 + self.geometry.room_count,
            utilization,
            bars: 0,
            skipped: 0,
        };

        for (index, room) in self.config.rooms.iter().enumerate() {
            let offset = 1 + index as u32;
            let row = start_row + offset;
            for column in self.geometry.columns() {
                sheet.set_border(row, column, self.style.border_at(offset, column, &self.geometry));
            }
            if index == 0 {
                self.write_date_label(sheet, row, day, &block.utilization);
            }
            self.write_room_label(sheet, row, room);

            for record in day.records_for(room) {
                match self.draw_bar(sheet, row, offset, record) {
                    Ok(()) => block.bars += 1,
                    Err(err) => {
                        tracing::debug!(
                            date = %day.date,
                            room = %room,
                            error = %err,
                            "bar skipped"
                        );
                        block.skipped += 1;
                    }
                }
            }
        }
        block
    }

    /// Painted column range of a record, clipped to the axis and at least two
    /// columns wide.
    pub fn bar_span(&self, record: &ActivityRecord) -> Result<(u16, u16), RecordError> {
        let window = &self.config.window;
        let offset = self.config.column_offset;
        let start = record.start.normalize()?;
        let end = record.end.normalize()?;
        let first = window.clip_column(window.column_for(start, offset), offset);
        let mut last = window.clip_column(window.column_for(end, offset), offset);
        if last <= first {
            last = first + 1;
        }
        Ok((first, last))
    }

    /// `【code】-name`, with the name cut to the configured budget
    pub fn bar_label(&self, record: &ActivityRecord) -> Result<String, RecordError> {
        let code = self.config.departments.short_code(&record.department)?;
        let name: String = record.name.chars().take(self.config.label_max_chars).collect();
        Ok(format!("【{code}】-{name}"))
    }

    fn draw_bar(
        &self,
        sheet: &mut Sheet,
        row: u32,
        row_offset: u32,
        record: &ActivityRecord,
    ) -> Result<(), RecordError> {
        let (first, last) = self.bar_span(record)?;
        let label = self.bar_label(record)?;
        let color = self.style.palette.color(record.urgency);

        for column in first..=last {
            sheet.set_fill(row, column, color);
            sheet.set_border(row, column, self.style.border_at(row_offset, column, &self.geometry));
        }
        sheet.set_value(row, first, label);
        sheet.set_font(row, first, self.style.label_font.clone());
        sheet.set_alignment(
            row,
            first,
            Alignment {
                horizontal: None,
                vertical: Some(VAlign::Center),
                wrap_text: false,
            },
        );
        Ok(())
    }

    fn write_header(&self, sheet: &mut Sheet, row: u32) {
        let builtin_font = Font::new(&self.config.font_name, 8.0).bold();
        for column in self.geometry.columns() {
            sheet.set_border(row, column, self.style.border_at(0, column, &self.geometry));
            let header = self.style.header_cell(column);
            let font = header
                .and_then(|h| h.font.clone())
                .unwrap_or_else(|| builtin_font.clone());
            let alignment = header
                .and_then(|h| h.alignment)
                .unwrap_or(Alignment::centered());
            sheet.set_font(row, column, font);
            sheet.set_alignment(row, column, alignment);
        }

        sheet.set_value(row, self.geometry.date_column, "日付");
        sheet.set_value(row, self.geometry.room_column, "部屋名");

        let window = &self.config.window;
        let span = window.columns_per_hour() as u16;
        for hour in window.hours() {
            let column = window.hour_column(hour, self.config.column_offset);
            sheet.merge(MergeRange::new(row, column, row, column + span - 1));
            sheet.set_value(row, column, hour * 100);
        }
    }

    fn write_date_label(&self, sheet: &mut Sheet, row: u32, day: &DaySchedule, utilization: &Utilization) {
        let column = self.geometry.date_column;
        let label = format!("{}\n{}", day.label(), utilization.percent_label());
        sheet.set_value(row, column, label);
        if self.geometry.room_count > 1 {
            sheet.merge(MergeRange::new(
                row,
                column,
                row + self.geometry.room_count - 1,
                column,
            ));
        }

        let region = self.style.region();
        let font = region
            .and_then(|r| r.date_font.clone())
            .unwrap_or_else(|| Font::new(&self.config.font_name, 9.0).bold());
        let alignment = region
            .and_then(|r| r.date_alignment)
            .unwrap_or(Alignment::centered().wrapped());
        sheet.set_font(row, column, font);
        sheet.set_alignment(row, column, alignment);
    }

    fn write_room_label(&self, sheet: &mut Sheet, row: u32, room: &str) {
        let column = self.geometry.room_column;
        let font = self
            .style
            .region()
            .and_then(|r| r.room_font.clone())
            .unwrap_or_else(|| Font::new(&self.config.font_name, 7.0));
        sheet.set_value(row, column, room);
        sheet.set_font(row, column, font);
        sheet.set_alignment(row, column, Alignment::centered());
    }
}
