//! The generate pipeline: input workbook in, chart workbook out.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use organtt_core::{DateOrdering, Renderer};
use organtt_io::InputWorkbook;
use organtt_render::{GanttChartRenderer, StyleTemplate};
use serde::Serialize;

use crate::config::AppConfig;

pub const DEFAULT_OUTPUT_NAME: &str = "手術室ガントチャート-結果.xlsx";

/// What a run should do
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub config: AppConfig,
    pub use_template: bool,
    /// `false` for a dry run that only reads and lays out
    pub write: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    pub name: String,
    pub ordering: DateOrdering,
    pub days_written: usize,
    pub bars: usize,
    pub skipped: usize,
}

/// Outcome of a run, printed as text or JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    /// `None` for a dry run
    pub output: Option<PathBuf>,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub records: usize,
    pub days: usize,
    pub template_used: bool,
    pub sheets: Vec<SheetReport>,
}

impl RunSummary {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Input:    {}\n", self.input.display()));
        out.push_str(&format!(
            "Records:  {} ({} rows read, {} dropped)\n",
            self.records, self.rows_read, self.rows_dropped
        ));
        out.push_str(&format!("Days:     {}\n", self.days));
        out.push_str(&format!(
            "Template: {}\n",
            if self.template_used { "yes" } else { "built-in" }
        ));
        for sheet in &self.sheets {
            out.push_str(&format!(
                "Sheet:    {} ({} days, {} bars, {} skipped)\n",
                sheet.name, sheet.days_written, sheet.bars, sheet.skipped
            ));
        }
        match &self.output {
            Some(path) => out.push_str(&format!("Output:   {}\n", path.display())),
            None => out.push_str("Output:   (not written)\n"),
        }
        out
    }
}

/// `手術室ガントチャート-結果.xlsx` next to the input file
pub fn default_output(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(DEFAULT_OUTPUT_NAME)
}

/// Read, lay out and (unless a dry run) write the chart workbook.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let AppConfig { chart, input } = &options.config;

    let mut workbook = InputWorkbook::open(&options.input)?;
    let ingested = workbook
        .read_records(input)
        .with_context(|| format!("failed to read records from {}", options.input.display()))?;

    let template = if options.use_template {
        workbook
            .template(input)
            .context("failed to read the template sheet")?
    } else {
        None
    };
    let style = match &template {
        Some(source) => StyleTemplate::extract(source, chart),
        None => StyleTemplate::builtin(chart),
    };

    let renderer = GanttChartRenderer::new(chart.clone(), style)?;
    let mut charts = renderer.render(&ingested.book)?;

    let output = if options.write {
        let raw = workbook
            .raw_sheet(input, &chart.sheets.data)
            .context("failed to copy the data sheet")?;
        charts.workbook.insert_first(raw);

        let path = options
            .output
            .clone()
            .unwrap_or_else(|| default_output(&options.input));
        let bytes = charts.workbook.to_xlsx_bytes()?;
        write_atomic(&path, &bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "chart workbook written");
        Some(path)
    } else {
        None
    };

    Ok(RunSummary {
        input: options.input.clone(),
        output,
        rows_read: ingested.rows_read,
        rows_dropped: ingested.rows_dropped,
        records: ingested.book.record_count(),
        days: ingested.book.len(),
        template_used: template.is_some(),
        sheets: charts
            .summaries
            .into_iter()
            .map(|summary| SheetReport {
                name: summary.name,
                ordering: summary.ordering,
                days_written: summary.days_written,
                bars: summary.bars,
                skipped: summary.skipped,
            })
            .collect(),
    })
}

/// Write `bytes` to a sibling temporary file, then rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("invalid output path {}", path.display()))?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    let temp = path.with_file_name(temp_name);

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp, path)
    })();
    if let Err(err) = result {
        let _ = fs::remove_file(&temp);
        return Err(err).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_output_sits_next_to_the_input() {
        assert_eq!(
            default_output(Path::new("/data/2025-09/input.xlsx")),
            PathBuf::from("/data/2025-09/手術室ガントチャート-結果.xlsx")
        );
        assert_eq!(
            default_output(Path::new("input.xlsx")),
            PathBuf::from("手術室ガントチャート-結果.xlsx")
        );
    }

    #[test]
    fn atomic_write_replaces_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn atomic_write_fails_for_a_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        assert!(write_atomic(&path, b"data").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn text_summary_lists_every_sheet() {
        let summary = RunSummary {
            input: PathBuf::from("in.xlsx"),
            output: None,
            rows_read: 3,
            rows_dropped: 1,
            records: 2,
            days: 1,
            template_used: false,
            sheets: vec![SheetReport {
                name: "手術室ガントチャート".into(),
                ordering: DateOrdering::Calendar,
                days_written: 1,
                bars: 2,
                skipped: 0,
            }],
        };
        let text = summary.to_text();
        assert!(text.contains("Records:  2 (3 rows read, 1 dropped)"));
        assert!(text.contains("Sheet:    手術室ガントチャート (1 days, 2 bars, 0 skipped)"));
        assert!(text.contains("Template: built-in"));
        assert!(text.contains("(not written)"));
    }
}
