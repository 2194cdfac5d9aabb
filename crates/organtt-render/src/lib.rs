//! # organtt-render
//!
//! Gantt layout engine and XLSX output for organtt.
//!
//! This crate provides:
//! - An in-memory sheet model (`Sheet`) the engine paints into
//! - `StyleTemplate`: formatting sampled from a template sheet, or built-in
//! - `DayBlockLayout` and `SheetComposer`: the day-by-day chart layout
//! - `GanttChartRenderer`: both chart orderings as one `ChartWorkbook`
//! - XLSX serialization through `rust_xlsxwriter`
//!
//! ## Example
//!
//! ```rust,ignore
//! use organtt_core::{ChartConfig, Renderer};
//! use organtt_render::{GanttChartRenderer, StyleTemplate};
//!
//! let config = ChartConfig::default();
//! let style = StyleTemplate::builtin(&config);
//! let charts = GanttChartRenderer::new(config, style)?.render(&book)?;
//! std::fs::write("chart.xlsx", charts.workbook.to_xlsx_bytes()?)?;
//! ```

pub mod compose;
pub mod layout;
pub mod sheet;
pub mod style;
pub mod template;
pub mod xlsx;

pub use compose::{ComposeSummary, SheetComposer};
pub use layout::{DayBlock, DayBlockLayout, Geometry};
pub use sheet::{Cell, CellValue, MergeRange, PageSetup, Sheet};
pub use style::{Alignment, Border, CellStyle, Edge, Font, HAlign, LineStyle, VAlign};
pub use template::{HeaderCellStyle, RegionStyle, StyleTemplate, TemplateSource, UrgencyPalette};

use chrono::{Datelike, NaiveDate};
use organtt_core::{ChartConfig, DateOrdering, RenderError, Renderer, ScheduleBook};

/// Ordered collection of output sheets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartWorkbook {
    sheets: Vec<Sheet>,
}

impl ChartWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Put `sheet` before every other sheet
    pub fn insert_first(&mut self, sheet: Sheet) {
        self.sheets.insert(0, sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>, RenderError> {
        xlsx::to_xlsx_bytes(&self.sheets)
    }
}

/// Per-sheet outcome of a render
#[derive(Clone, Debug, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    pub ordering: DateOrdering,
    pub days_written: usize,
    pub bars: usize,
    pub skipped: usize,
}

/// Output of [`GanttChartRenderer`]
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedCharts {
    pub workbook: ChartWorkbook,
    pub summaries: Vec<SheetSummary>,
}

/// Renders the calendar-ordered and weekday-ordered chart sheets
#[derive(Clone, Debug)]
pub struct GanttChartRenderer {
    config: ChartConfig,
    style: StyleTemplate,
}

impl GanttChartRenderer {
    pub fn new(config: ChartConfig, style: StyleTemplate) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self { config, style })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn style(&self) -> &StyleTemplate {
        &self.style
    }

    fn title(base: &str, first_date: Option<NaiveDate>) -> String {
        match first_date {
            Some(date) => format!("{base}（{}年{}月）", date.year(), date.month()),
            None => base.to_string(),
        }
    }
}

impl Renderer for GanttChartRenderer {
    type Output = RenderedCharts;

    fn render(&self, book: &ScheduleBook) -> Result<RenderedCharts, RenderError> {
        let names = &self.config.sheets;
        let composer = SheetComposer::new(&self.config, &self.style);
        let mut workbook = ChartWorkbook::new();
        let mut summaries = Vec::new();

        let passes = [
            (DateOrdering::Calendar, &names.by_date, &names.by_date_title),
            (DateOrdering::Weekday, &names.by_weekday, &names.by_weekday_title),
        ];
        for (ordering, name, title) in passes {
            let mut sheet = Sheet::new(name.as_str());
            let dates = book.dates(ordering);
            let summary = composer.compose(
                &mut sheet,
                &Self::title(title, book.first_date()),
                &dates,
                book,
            );
            summaries.push(SheetSummary {
                name: name.clone(),
                ordering,
                days_written: summary.days_written,
                bars: summary.bars(),
                skipped: summary.skipped(),
            });
            workbook.push(sheet);
        }

        Ok(RenderedCharts { workbook, summaries })
    }
}
