use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatUnderline, Url, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::records::EnrichedRecord;
use crate::summary::normalize::is_fallback;

pub const LINK_LABEL: &str = "LINK";
const LINK_COLOR: u32 = 0x0000FF;
const MIN_WIDTH: f64 = 10.0;
const WIDTH_PADDING: f64 = 3.55;
const EMPTY_CELL_LEN: usize = 10;
const SUMMARY_WIDTH: f64 = 160.0;
const DATA_ROW_HEIGHT: f64 = 165.0;
const MAX_WIDTH: f64 = 255.0;
/// Excel's per-cell text limit.
pub const MAX_CELL_CHARS: usize = 32_767;
/// Longer links are rejected as hyperlinks and written as plain text.
const MAX_URL_CHARS: usize = 2_080;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to lay out worksheet: {0}")]
    Sheet(#[from] XlsxError),
    #[error("Failed to write {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Column {
    Rank,
    Title,
    Link,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Width {
    /// Longest cell text in the column, header included.
    FitContent,
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Center,
    Left,
}

struct ColumnRule {
    column: Column,
    header: &'static str,
    width: Width,
    align: Align,
    wrap: bool,
}

const COLUMN_RULES: [ColumnRule; 4] = [
    ColumnRule {
        column: Column::Rank,
        header: "Rank",
        width: Width::FitContent,
        align: Align::Center,
        wrap: false,
    },
    ColumnRule {
        column: Column::Title,
        header: "Article Title",
        width: Width::FitContent,
        align: Align::Center,
        wrap: false,
    },
    ColumnRule {
        column: Column::Link,
        header: "URL",
        width: Width::FitContent,
        align: Align::Center,
        wrap: false,
    },
    ColumnRule {
        column: Column::Summary,
        header: "AI Summary",
        width: Width::Fixed(SUMMARY_WIDTH),
        align: Align::Left,
        wrap: true,
    },
];

/// Resolved formatting for one column. Cells are always vertically centered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLayout {
    pub column: Column,
    pub header: &'static str,
    pub width: f64,
    pub align: Align,
    pub wrap: bool,
}

/// Everything about the sheet's look that depends on the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub columns: Vec<ColumnLayout>,
    /// Header included.
    pub row_count: usize,
    pub data_row_height: f64,
}

impl ReportLayout {
    pub fn plan(rows: &[EnrichedRecord]) -> Self {
        let columns = COLUMN_RULES
            .iter()
            .map(|rule| ColumnLayout {
                column: rule.column,
                header: rule.header,
                width: match rule.width {
                    Width::Fixed(w) => w,
                    Width::FitContent => fit_width(rule, rows),
                },
                align: rule.align,
                wrap: rule.wrap,
            })
            .collect();

        ReportLayout {
            columns,
            row_count: rows.len() + 1,
            data_row_height: DATA_ROW_HEIGHT,
        }
    }
}

fn fit_width(rule: &ColumnRule, rows: &[EnrichedRecord]) -> f64 {
    let longest = std::iter::once(rule.header.to_string())
        .chain(rows.iter().map(|r| cell_text(rule.column, r)))
        .map(|text| match text.chars().count() {
            0 => EMPTY_CELL_LEN,
            n => n,
        })
        .max()
        .unwrap_or(EMPTY_CELL_LEN);
    MIN_WIDTH.max(longest as f64 - WIDTH_PADDING).min(MAX_WIDTH)
}

/// Text the cell displays.
fn cell_text(column: Column, row: &EnrichedRecord) -> String {
    match column {
        Column::Rank => row.rank().to_string(),
        Column::Title => row.title().to_string(),
        Column::Link if link_fits(row.link()) => LINK_LABEL.to_string(),
        Column::Link => clip_chars(row.link(), MAX_CELL_CHARS).to_string(),
        Column::Summary => row.summary.clone(),
    }
}

/// Outcome of a finalized report.
#[derive(Debug)]
pub struct ReportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub fallbacks: usize,
}

/// The in-progress report. Rows are appended in record order.
pub struct ReportBuilder {
    sheet_name: String,
    rows: Vec<EnrichedRecord>,
}

impl ReportBuilder {
    pub fn new(sheet_name: &str) -> Self {
        ReportBuilder {
            sheet_name: sheet_name.to_string(),
            rows: Vec::new(),
        }
    }

    /// Append a row; returns its 1-based sheet row (the header is row 1).
    pub fn push(&mut self, row: EnrichedRecord) -> usize {
        self.rows.push(row);
        self.rows.len() + 1
    }

    pub fn rows(&self) -> &[EnrichedRecord] {
        &self.rows
    }

    pub fn layout(&self) -> ReportLayout {
        ReportLayout::plan(&self.rows)
    }

    /// Write the workbook, then remove `intermediate`. A failed write leaves it in place.
    pub fn finalize(
        self,
        xlsx_path: &Path,
        intermediate: Option<&Path>,
    ) -> Result<ReportSummary, ReportError> {
        let layout = self.layout();
        let mut workbook = self.render(&layout)?;
        workbook.save(xlsx_path).map_err(|source| ReportError::Save {
            path: xlsx_path.to_path_buf(),
            source,
        })?;
        info!("Report written to {}", xlsx_path.display());

        if let Some(path) = intermediate {
            match std::fs::remove_file(path) {
                Ok(()) => info!("Removed intermediate file {}", path.display()),
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }

        Ok(ReportSummary {
            path: xlsx_path.to_path_buf(),
            rows: self.rows.len(),
            fallbacks: self.rows.iter().filter(|r| is_fallback(&r.summary)).count(),
        })
    }

    fn render(&self, layout: &ReportLayout) -> Result<Workbook, ReportError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        let header_format = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        sheet.set_row_format(0, &Format::new().set_bold())?;

        for (idx, col) in layout.columns.iter().enumerate() {
            let col_idx = idx as u16;
            let cell_format = cell_format(col);
            sheet.set_column_width(col_idx, col.width)?;
            sheet.set_column_format(col_idx, &cell_format)?;
            sheet.write_string_with_format(0, col_idx, col.header, &header_format)?;

            for (i, row) in self.rows.iter().enumerate() {
                let row_idx = i as u32 + 1;
                match col.column {
                    Column::Rank => {
                        sheet.write_number_with_format(row_idx, col_idx, row.rank(), &cell_format)?
                    }
                    Column::Title => sheet.write_string_with_format(
                        row_idx,
                        col_idx,
                        clip_chars(row.title(), MAX_CELL_CHARS),
                        &cell_format,
                    )?,
                    Column::Link if link_fits(row.link()) => sheet.write_url_with_format(
                        row_idx,
                        col_idx,
                        Url::new(row.link()).set_text(LINK_LABEL),
                        &link_format(&cell_format),
                    )?,
                    Column::Link => {
                        warn!(rank = row.rank(), "Link too long for a hyperlink, writing it as text");
                        sheet.write_string_with_format(
                            row_idx,
                            col_idx,
                            clip_chars(row.link(), MAX_CELL_CHARS),
                            &cell_format,
                        )?
                    }
                    Column::Summary => sheet.write_string_with_format(
                        row_idx,
                        col_idx,
                        clip_chars(&row.summary, MAX_CELL_CHARS),
                        &cell_format,
                    )?,
                };
            }
        }

        for i in 0..self.rows.len() {
            sheet.set_row_height(i as u32 + 1, layout.data_row_height)?;
        }

        Ok(workbook)
    }
}

fn link_fits(link: &str) -> bool {
    link.chars().count() <= MAX_URL_CHARS
}

/// At most `max` chars of `text`, cut on a char boundary.
pub fn clip_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn cell_format(col: &ColumnLayout) -> Format {
    let format = Format::new().set_align(FormatAlign::VerticalCenter);
    let format = match col.align {
        Align::Center => format.set_align(FormatAlign::Center),
        Align::Left => format.set_align(FormatAlign::Left),
    };
    if col.wrap {
        format.set_text_wrap()
    } else {
        format
    }
}

fn link_format(base: &Format) -> Format {
    base.clone()
        .set_font_color(Color::RGB(LINK_COLOR))
        .set_underline(FormatUnderline::Single)
}
