//! Style template: formatting sampled once from a template sheet.
//!
//! The template is an immutable value threaded into every layout call. When
//! no template sheet exists, [`StyleTemplate::builtin`] supplies the same
//! information from built-in rules, so the engine has a single code path.

use std::collections::{BTreeMap, HashMap};

use organtt_core::{CellRef, ChartConfig, PaletteConfig, Rgb, Urgency};

use crate::layout::Geometry;
use crate::sheet::Sheet;
use crate::style::{Alignment, Border, CellStyle, Font};

/// Read access to a formatted source sheet.
///
/// Implementations may be sparse: dimensions that were never set explicitly
/// return `None` and leave the built-in default in place.
pub trait TemplateSource {
    fn column_width(&self, column: u16) -> Option<f64>;

    fn row_height(&self, row: u32) -> Option<f64>;

    fn cell_style(&self, row: u32, column: u16) -> Option<CellStyle>;
}

impl TemplateSource for Sheet {
    fn column_width(&self, column: u16) -> Option<f64> {
        Sheet::column_width(self, column)
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        Sheet::row_height(self, row)
    }

    fn cell_style(&self, row: u32, column: u16) -> Option<CellStyle> {
        self.style(row, column).cloned()
    }
}

/// Fill color per urgency category
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UrgencyPalette {
    pub scheduled: Rgb,
    pub urgent: Rgb,
    pub emergency: Rgb,
}

impl UrgencyPalette {
    pub fn color(&self, urgency: Urgency) -> Rgb {
        match urgency {
            Urgency::Scheduled => self.scheduled,
            Urgency::Urgent => self.urgent,
            Urgency::Emergency => self.emergency,
        }
    }
}

impl From<&PaletteConfig> for UrgencyPalette {
    fn from(config: &PaletteConfig) -> Self {
        Self {
            scheduled: config.scheduled,
            urgent: config.urgent,
            emergency: config.emergency,
        }
    }
}

/// Font and alignment of one header column
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderCellStyle {
    pub font: Option<Font>,
    pub alignment: Option<Alignment>,
}

/// Formatting taken from the template region
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionStyle {
    pub column_widths: BTreeMap<u16, f64>,
    /// Keyed by row offset inside a block (0 = header)
    pub row_heights: BTreeMap<u32, f64>,
    /// Keyed by (row offset inside a block, column)
    pub borders: HashMap<(u32, u16), Border>,
    pub header_cells: BTreeMap<u16, HeaderCellStyle>,
    pub date_font: Option<Font>,
    pub date_alignment: Option<Alignment>,
    pub room_font: Option<Font>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleTemplate {
    pub palette: UrgencyPalette,
    pub label_font: Font,
    region: Option<RegionStyle>,
}

impl StyleTemplate {
    /// Built-in styling, used when there is no template sheet
    pub fn builtin(config: &ChartConfig) -> Self {
        Self {
            palette: UrgencyPalette::from(&config.palette),
            label_font: Font::new(&config.font_name, config.label_font_size).color(Rgb::BLACK),
            region: None,
        }
    }

    /// Sample the configured region, swatches and font cell from `source`.
    pub fn extract<S: TemplateSource + ?Sized>(source: &S, config: &ChartConfig) -> Self {
        let cfg = &config.template;
        let mut template = Self::builtin(config);

        let swatch = |cell: CellRef| source.cell_style(cell.row, cell.column).and_then(|s| s.fill);
        if let Some(color) = swatch(cfg.scheduled_swatch) {
            template.palette.scheduled = color;
        }
        if let Some(color) = swatch(cfg.urgent_swatch) {
            template.palette.urgent = color;
        }
        if let Some(color) = swatch(cfg.emergency_swatch) {
            template.palette.emergency = color;
        }

        let sample = cfg.label_font_sample;
        if let Some(font) = source.cell_style(sample.row, sample.column).and_then(|s| s.font) {
            if !font.name.is_empty() {
                template.label_font.name = font.name;
            }
            if font.size > 0.0 {
                template.label_font.size = font.size;
            }
        }

        let mut region = RegionStyle::default();
        for column in cfg.first_column..=cfg.last_column {
            if let Some(width) = source.column_width(column) {
                region.column_widths.insert(column, width);
            }
        }
        for row in cfg.header_row..=cfg.last_room_row {
            let offset = row - cfg.header_row;
            if let Some(height) = source.row_height(row) {
                region.row_heights.insert(offset, height);
            }
            for column in cfg.first_column..=cfg.last_column {
                let style = source.cell_style(row, column).unwrap_or_default();
                if row == cfg.header_row {
                    region.header_cells.insert(
                        column,
                        HeaderCellStyle {
                            font: style.font.clone(),
                            alignment: style.alignment,
                        },
                    );
                }
                region.borders.insert((offset, column), style.border);
            }
        }

        if let Some(style) = source.cell_style(cfg.date_cell.row, cfg.date_cell.column) {
            region.date_font = style.font;
            region.date_alignment = style.alignment;
        }
        region.room_font = source
            .cell_style(cfg.room_cell.row, cfg.room_cell.column)
            .and_then(|style| style.font);

        tracing::info!(
            scheduled = %template.palette.scheduled,
            urgent = %template.palette.urgent,
            emergency = %template.palette.emergency,
            label_font = %template.label_font.name,
            widths = region.column_widths.len(),
            heights = region.row_heights.len(),
            "template region loaded"
        );
        template.region = Some(region);
        template
    }

    pub fn region(&self) -> Option<&RegionStyle> {
        self.region.as_ref()
    }

    pub fn has_region(&self) -> bool {
        self.region.is_some()
    }

    /// Border for a cell of a day block.
    ///
    /// With a template this is the sampled border (empty when the region does
    /// not cover the cell); otherwise the rule-based grid of `geometry`.
    pub fn border_at(&self, row_offset: u32, column: u16, geometry: &Geometry) -> Border {
        match &self.region {
            Some(region) => region
                .borders
                .get(&(row_offset, column))
                .copied()
                .unwrap_or_default(),
            None => geometry.default_border(row_offset, column),
        }
    }

    pub fn header_cell(&self, column: u16) -> Option<&HeaderCellStyle> {
        self.region.as_ref().and_then(|region| region.header_cells.get(&column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Edge, HAlign, LineStyle};
    use pretty_assertions::assert_eq;

    fn template_sheet() -> Sheet {
        let mut sheet = Sheet::new("テンプレート");
        sheet.set_fill(2, 3, Rgb(0x112233));
        sheet.set_fill(4, 3, Rgb(0x445566));
        sheet.set_font(5, 3, Font::new("Yu Gothic", 7.0));
        sheet.set_column_width(2, 11.0);
        sheet.set_column_width(50, 1.8);
        sheet.set_column_width(120, 9.0);
        sheet.set_row_height(6, 18.0);
        sheet.set_row_height(17, 14.0);
        sheet.set_font(6, 10, Font::new("Meiryo UI", 8.0).bold());
        sheet.set_alignment(6, 10, Alignment::centered());
        sheet.set_border(
            8,
            10,
            Border {
                left: Some(Edge {
                    style: LineStyle::Dotted,
                    color: Some(Rgb(0x808080)),
                }),
                ..Border::default()
            },
        );
        sheet.set_font(7, 2, Font::new("Meiryo UI", 10.0).bold());
        sheet.set_alignment(7, 2, Alignment::centered().wrapped());
        sheet.set_font(7, 3, Font::new("Meiryo UI", 7.5));
        sheet
    }

    #[test]
    fn builtin_template_uses_config_palette() {
        let config = ChartConfig::default();
        let template = StyleTemplate::builtin(&config);
        assert!(!template.has_region());
        assert_eq!(template.palette.color(Urgency::Scheduled), Rgb(0xA0C8E4));
        assert_eq!(template.palette.color(Urgency::Urgent), Rgb(0x6DABD5));
        assert_eq!(template.palette.color(Urgency::Emergency), Rgb(0xFF8CCC));
        assert_eq!(template.label_font, Font::new("Meiryo UI", 6.0).color(Rgb::BLACK));
    }

    #[test]
    fn extracts_swatches_and_label_font() {
        let config = ChartConfig::default();
        let template = StyleTemplate::extract(&template_sheet(), &config);
        assert_eq!(template.palette.scheduled, Rgb(0x112233));
        // C3 has no fill, the default stays
        assert_eq!(template.palette.urgent, Rgb(0x6DABD5));
        assert_eq!(template.palette.emergency, Rgb(0x445566));
        assert_eq!(template.label_font.name, "Yu Gothic");
        assert_eq!(template.label_font.size, 7.0);
    }

    #[test]
    fn extracts_sparse_region() {
        let config = ChartConfig::default();
        let template = StyleTemplate::extract(&template_sheet(), &config);
        let region = template.region().unwrap();

        assert_eq!(
            region.column_widths.iter().map(|(c, w)| (*c, *w)).collect::<Vec<_>>(),
            vec![(2, 11.0), (50, 1.8)]
        );
        assert_eq!(region.row_heights.get(&0), Some(&18.0));
        assert_eq!(region.row_heights.get(&11), Some(&14.0));
        assert_eq!(region.row_heights.len(), 2);
        assert_eq!(region.borders.len(), 12 * 92);

        let header = template.header_cell(10).unwrap();
        assert!(header.font.as_ref().unwrap().bold);
        assert_eq!(header.alignment.unwrap().horizontal, Some(HAlign::Center));
        assert_eq!(template.header_cell(11), Some(&HeaderCellStyle::default()));

        assert_eq!(region.date_font.as_ref().unwrap().size, 10.0);
        assert!(region.date_alignment.unwrap().wrap_text);
        assert_eq!(region.room_font.as_ref().unwrap().size, 7.5);
    }

    #[test]
    fn border_lookup_prefers_template() {
        let config = ChartConfig::default();
        let geometry = Geometry::from_config(&config);
        let template = StyleTemplate::extract(&template_sheet(), &config);

        let border = template.border_at(2, 10, &geometry);
        assert_eq!(border.left.unwrap().style, LineStyle::Dotted);
        // sampled cells without a border stay empty
        assert!(template.border_at(1, 10, &geometry).is_empty());
        // outside the sampled rows
        assert!(template.border_at(40, 10, &geometry).is_empty());

        let builtin = StyleTemplate::builtin(&config);
        assert_eq!(builtin.border_at(1, 10, &geometry), geometry.default_border(1, 10));
    }
}
