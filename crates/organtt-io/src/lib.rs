//! # organtt-io
//!
//! Reading side of organtt: the input workbook with its record sheet and its
//! optional style template sheet.
//!
//! Values are read through calamine. Formatting (fills, borders, fonts,
//! column widths and row heights) is not exposed by calamine, so it is read
//! from the package XML directly; see [`StyledSheet`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use organtt_io::{InputConfig, InputWorkbook};
//!
//! let config = InputConfig::default();
//! let mut input = InputWorkbook::open("surgeries.xlsx")?;
//! let ingested = input.read_records(&config)?;
//! let template = input.template(&config)?;
//! ```

pub mod ooxml;
pub mod raw;
pub mod records;
pub mod styled;
pub mod styles;

pub use ooxml::Package;
pub use raw::copy_sheet;
pub use records::{cell_to_date, cell_to_string, cell_to_time, parse_rows, ColumnNames, Ingested, InputConfig};
pub use styled::StyledSheet;
pub use styles::Stylesheet;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use organtt_render::Sheet;
use thiserror::Error;

/// Errors reading the input workbook
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    #[error("sheet not found: {0}")]
    MissingSheet(String),

    #[error("sheet {sheet}: missing column {column}")]
    MissingColumn { sheet: String, column: String },

    #[error("cannot read sheet {sheet}: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: XlsxError,
    },

    #[error("invalid workbook package: {0}")]
    Package(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opened input workbook
pub struct InputWorkbook {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl InputWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let workbook: Xlsx<_> = open_workbook(&path).map_err(|source| IngestError::Open {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), sheets = workbook.sheet_names().len(), "workbook opened");
        Ok(Self { path, workbook })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.workbook.sheet_names().iter().any(|name| name == sheet)
    }

    /// Values of `sheet`
    pub fn range(&mut self, sheet: &str) -> Result<Range<Data>, IngestError> {
        if !self.has_sheet(sheet) {
            return Err(IngestError::MissingSheet(sheet.to_owned()));
        }
        self.workbook
            .worksheet_range(sheet)
            .map_err(|source| IngestError::Sheet {
                sheet: sheet.to_owned(),
                source,
            })
    }

    /// Records of the data sheet, grouped by date
    pub fn read_records(&mut self, config: &InputConfig) -> Result<Ingested, IngestError> {
        let range = self.range(&config.data_sheet)?;
        parse_rows(&range, &config.data_sheet, &config.columns)
    }

    /// Formatting of `sheet`; `None` when the workbook has no such sheet
    pub fn styled_sheet(&self, sheet: &str) -> Result<Option<StyledSheet>, IngestError> {
        let mut package = Package::open(&self.path)?;
        StyledSheet::load(&mut package, sheet)
    }

    /// The style template sheet, if the workbook has one
    pub fn template(&self, config: &InputConfig) -> Result<Option<StyledSheet>, IngestError> {
        let template = self.styled_sheet(&config.template_sheet)?;
        if template.is_none() {
            tracing::info!(sheet = %config.template_sheet, "no template sheet, using built-in styles");
        }
        Ok(template)
    }

    /// Copy of the data sheet named `name`, values and formatting
    pub fn raw_sheet(&mut self, config: &InputConfig, name: &str) -> Result<Sheet, IngestError> {
        let range = self.range(&config.data_sheet)?;
        let styled = match self.styled_sheet(&config.data_sheet) {
            Ok(styled) => styled,
            Err(err) => {
                tracing::warn!(error = %err, "data sheet formatting unreadable, copying values only");
                None
            }
        };
        Ok(copy_sheet(name, &range, styled.as_ref()))
    }
}
