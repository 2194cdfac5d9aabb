//! `xl/styles.xml`: fonts, fills, borders and cell formats.

use std::collections::HashMap;

use organtt_core::Rgb;
use organtt_render::{Alignment, Border, CellStyle, Edge, Font, HAlign, LineStyle, VAlign};
use quick_xml::events::BytesStart;

use crate::ooxml::{attr, attr_flag, attr_parse, walk, XmlVisitor};
use crate::IngestError;

/// Built-in number formats worth carrying over
fn builtin_num_format(id: u32) -> Option<&'static str> {
    let format = match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        49 => "@",
        _ => return None,
    };
    Some(format)
}

#[derive(Clone, Debug, Default, PartialEq)]
struct CellXf {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    alignment: Option<Alignment>,
}

/// Parsed style table of a workbook
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stylesheet {
    num_formats: HashMap<u32, String>,
    fonts: Vec<Font>,
    /// Solid fill color per fill; `None` for pattern or theme fills
    fills: Vec<Option<Rgb>>,
    borders: Vec<Border>,
    cell_xfs: Vec<CellXf>,
}

impl Stylesheet {
    pub fn parse(xml: &str) -> Result<Self, IngestError> {
        let mut parser = StyleParser::default();
        walk(xml, "xl/styles.xml", &mut parser)?;
        Ok(parser.sheet)
    }

    pub fn len(&self) -> usize {
        self.cell_xfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_xfs.is_empty()
    }

    /// Resolved style of cell format `index` (the `s` attribute of a cell)
    pub fn style(&self, index: u32) -> Option<CellStyle> {
        let xf = self.cell_xfs.get(index as usize)?;
        let num_format = match xf.num_fmt_id {
            0 => None,
            id => self
                .num_formats
                .get(&id)
                .cloned()
                .or_else(|| builtin_num_format(id).map(String::from)),
        };
        Some(CellStyle {
            font: self.fonts.get(xf.font_id).cloned(),
            fill: self.fills.get(xf.fill_id).copied().flatten(),
            border: self.borders.get(xf.border_id).copied().unwrap_or_default(),
            alignment: xf.alignment,
            num_format,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Other,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Default)]
struct StyleParser {
    sheet: Stylesheet,
    section: Option<Section>,
    font: Option<Font>,
    /// (solid pattern, foreground color)
    fill: Option<(bool, Option<Rgb>)>,
    border: Option<Border>,
    side: Option<Side>,
    xf: Option<CellXf>,
}

fn rgb_attr(element: &BytesStart<'_>) -> Option<Rgb> {
    attr(element, b"rgb").and_then(|value| Rgb::from_hex(&value))
}

fn parse_alignment(element: &BytesStart<'_>) -> Alignment {
    let horizontal = attr(element, b"horizontal").and_then(|h| match h.as_str() {
        "left" => Some(HAlign::Left),
        "center" | "centerContinuous" => Some(HAlign::Center),
        "right" => Some(HAlign::Right),
        _ => None,
    });
    let vertical = attr(element, b"vertical").and_then(|v| match v.as_str() {
        "top" => Some(VAlign::Top),
        "center" => Some(VAlign::Center),
        "bottom" => Some(VAlign::Bottom),
        _ => None,
    });
    Alignment {
        horizontal,
        vertical,
        wrap_text: attr_flag(element, b"wrapText", false),
    }
}

impl StyleParser {
    fn edge_mut(&mut self) -> Option<&mut Option<Edge>> {
        let border = self.border.as_mut()?;
        Some(match self.side? {
            Side::Left => &mut border.left,
            Side::Right => &mut border.right,
            Side::Top => &mut border.top,
            Side::Bottom => &mut border.bottom,
        })
    }
}

impl XmlVisitor for StyleParser {
    fn open(&mut self, element: &BytesStart<'_>) {
        let name = element.local_name();
        let name = name.as_ref();
        match name {
            b"numFmts" => self.section = Some(Section::NumFmts),
            b"fonts" => self.section = Some(Section::Fonts),
            b"fills" => self.section = Some(Section::Fills),
            b"borders" => self.section = Some(Section::Borders),
            b"cellXfs" => self.section = Some(Section::CellXfs),
            b"cellStyleXfs" | b"cellStyles" | b"dxfs" | b"tableStyles" | b"colors" => {
                self.section = Some(Section::Other);
            }
            _ => {}
        }

        match (self.section, name) {
            (Some(Section::NumFmts), b"numFmt") => {
                if let (Some(id), Some(code)) =
                    (attr_parse::<u32>(element, b"numFmtId"), attr(element, b"formatCode"))
                {
                    self.sheet.num_formats.insert(id, code);
                }
            }
            (Some(Section::Fonts), b"font") => self.font = Some(Font::new("", 0.0)),
            (Some(Section::Fonts), _) => {
                if let Some(font) = self.font.as_mut() {
                    match name {
                        b"b" => font.bold = attr_flag(element, b"val", true),
                        b"sz" => font.size = attr_parse(element, b"val").unwrap_or(0.0),
                        b"name" => font.name = attr(element, b"val").unwrap_or_default(),
                        b"color" => font.color = rgb_attr(element),
                        _ => {}
                    }
                }
            }
            (Some(Section::Fills), b"fill") => self.fill = Some((false, None)),
            (Some(Section::Fills), b"patternFill") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.0 = attr(element, b"patternType").as_deref() == Some("solid");
                }
            }
            (Some(Section::Fills), b"fgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.1 = rgb_attr(element);
                }
            }
            (Some(Section::Borders), b"border") => self.border = Some(Border::default()),
            (Some(Section::Borders), b"left" | b"start") => self.side = Some(Side::Left),
            (Some(Section::Borders), b"right" | b"end") => self.side = Some(Side::Right),
            (Some(Section::Borders), b"top") => self.side = Some(Side::Top),
            (Some(Section::Borders), b"bottom") => self.side = Some(Side::Bottom),
            (Some(Section::Borders), b"color") => {
                let color = rgb_attr(element);
                if let Some(Some(edge)) = self.edge_mut() {
                    edge.color = color;
                }
            }
            (Some(Section::CellXfs), b"xf") => {
                self.xf = Some(CellXf {
                    num_fmt_id: attr_parse(element, b"numFmtId").unwrap_or(0),
                    font_id: attr_parse(element, b"fontId").unwrap_or(0),
                    fill_id: attr_parse(element, b"fillId").unwrap_or(0),
                    border_id: attr_parse(element, b"borderId").unwrap_or(0),
                    alignment: None,
                });
            }
            (Some(Section::CellXfs), b"alignment") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.alignment = Some(parse_alignment(element));
                }
            }
            _ => {}
        }

        // edge styles are attributes of the side element itself
        if self.section == Some(Section::Borders)
            && matches!(name, b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom")
        {
            let line = attr(element, b"style").and_then(|s| LineStyle::from_ooxml(&s));
            if let Some(edge) = self.edge_mut() {
                *edge = line.map(|style| Edge { style, color: None });
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        match (self.section, name) {
            (Some(Section::Fonts), b"font") => {
                if let Some(font) = self.font.take() {
                    self.sheet.fonts.push(font);
                }
            }
            (Some(Section::Fills), b"fill") => {
                if let Some((solid, color)) = self.fill.take() {
                    self.sheet.fills.push(if solid { color } else { None });
                }
            }
            (Some(Section::Borders), b"border") => {
                if let Some(border) = self.border.take() {
                    self.sheet.borders.push(border);
                }
            }
            (Some(Section::Borders), b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom") => {
                self.side = None;
            }
            (Some(Section::CellXfs), b"xf") => {
                if let Some(xf) = self.xf.take() {
                    self.sheet.cell_xfs.push(xf);
                }
            }
            (
                _,
                b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"cellStyleXfs"
                | b"cellStyles" | b"dxfs" | b"tableStyles" | b"colors",
            ) => self.section = None,
            _ => {}
        }
    }
}
