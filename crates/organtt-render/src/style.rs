//! Cell formatting values shared by the sheet model, the template and the
//! XLSX writer.

use organtt_core::Rgb;

/// Line style of one border edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Hair,
    Double,
    MediumDashed,
    DashDot,
    DashDotDot,
}

impl LineStyle {
    /// Parse the OOXML `style` attribute of a border edge
    pub fn from_ooxml(style: &str) -> Option<Self> {
        let line = match style {
            "thin" => Self::Thin,
            "medium" => Self::Medium,
            "thick" => Self::Thick,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "hair" => Self::Hair,
            "double" => Self::Double,
            "mediumDashed" => Self::MediumDashed,
            "dashDot" | "mediumDashDot" | "slantDashDot" => Self::DashDot,
            "dashDotDot" | "mediumDashDotDot" => Self::DashDotDot,
            _ => return None,
        };
        Some(line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub style: LineStyle,
    pub color: Option<Rgb>,
}

impl Edge {
    pub const fn thin() -> Self {
        Self {
            style: LineStyle::Thin,
            color: None,
        }
    }

    pub const fn hair() -> Self {
        Self {
            style: LineStyle::Hair,
            color: None,
        }
    }
}

/// The four edges of a cell; `None` means no line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Border {
    pub left: Option<Edge>,
    pub right: Option<Edge>,
    pub top: Option<Edge>,
    pub bottom: Option<Edge>,
}

impl Border {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub name: String,
    pub size: f64,
    pub bold: bool,
    pub color: Option<Rgb>,
}

impl Font {
    pub fn new(name: impl Into<String>, size: f64) -> Self {
        Self {
            name: name.into(),
            size,
            bold: false,
            color: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    pub horizontal: Option<HAlign>,
    pub vertical: Option<VAlign>,
    pub wrap_text: bool,
}

impl Alignment {
    pub const fn centered() -> Self {
        Self {
            horizontal: Some(HAlign::Center),
            vertical: Some(VAlign::Center),
            wrap_text: false,
        }
    }

    pub const fn wrapped(mut self) -> Self {
        self.wrap_text = true;
        self
    }
}

/// Formatting of one cell
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub font: Option<Font>,
    /// Solid fill color
    pub fill: Option<Rgb>,
    pub border: Border,
    pub alignment: Option<Alignment>,
    pub num_format: Option<String>,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
