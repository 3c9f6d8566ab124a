//! Table formatting for CLI list commands
//!
//! Every list command builds [`TableRow`]s of typed [`CellValue`]s and hands
//! them to a [`TableFormatter`], which renders TSV (styled for terminals),
//! CSV, Markdown or bare ids.

use chrono::{DateTime, Utc};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_date_local, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::LibraryState;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Remote resource id (cyan)
    Id(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Resource type or descriptor
    Type(String),
    /// Enabled flag; `None` means the service did not say
    Enabled(Option<bool>),
    /// Library publishing state with color coding
    State(LibraryState),
    /// DateTime displayed as date only
    Date(Option<DateTime<Utc>>),
    Number(i64),
    /// Labels as comma-separated
    Tags(Vec<String>),
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) | CellValue::Type(s) => {
                format!(
                    "{:<width$}",
                    truncate_str(s, width.saturating_sub(2)),
                    width = width
                )
            }
            CellValue::Enabled(flag) => {
                let styled = match flag {
                    Some(true) => style("yes").green(),
                    Some(false) => style("no").red(),
                    None => style("-").dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::State(state) => {
                let s = state.to_string();
                let styled = match state {
                    LibraryState::Published => style(s).green().bold(),
                    LibraryState::Approved => style(s).green(),
                    LibraryState::Submitted => style(s).yellow(),
                    LibraryState::Rejected => style(s).red(),
                    LibraryState::Development | LibraryState::Unknown => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Date(_) | CellValue::Tags(_) | CellValue::Empty => {
                format!(
                    "{:<width$}",
                    truncate_str(&self.display(), width.saturating_sub(2)),
                    width = width
                )
            }
        }
    }

    /// Markdown cell (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        self.display().replace('|', "\\|")
    }

    /// Plain text with `-` for missing values
    fn display(&self) -> String {
        match self {
            CellValue::Enabled(None) | CellValue::Date(None) | CellValue::Empty => "-".to_string(),
            other => other.raw(),
        }
    }

    /// Raw string value (no formatting, used for CSV)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) | CellValue::Type(s) => s.clone(),
            CellValue::Enabled(flag) => flag
                .map(|b| if b { "yes" } else { "no" }.to_string())
                .unwrap_or_default(),
            CellValue::State(state) => state.to_string(),
            CellValue::Date(dt) => dt.as_ref().map(format_date_local).unwrap_or_default(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Tags(tags) => tags.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        self.display().chars().count()
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that renders rows in the tabular formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
        }
    }

    /// Print rows to stdout
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) -> Result<()> {
        print!("{}", self.render(rows, format)?);
        Ok(())
    }

    /// Render rows in the given format; structured formats fall back to TSV
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => Ok(self.render_md(rows)),
            OutputFormat::Id => Ok(rows.iter().map(|r| format!("{}\n", r.id)).collect()),
            _ => Ok(self.render_tsv(rows)),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| r.id.len())
            .max()
            .unwrap_or(2)
            .max(2);

        let mut widths = vec![id_width];
        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(CellValue::display_width)
                .max()
                .unwrap_or(0);
            // +2 matches the truncation buffer in format_tsv
            let natural = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural.min(col.width));
        }
        widths
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let mut header = vec![format!("{:<w$}", style("ID").bold(), w = widths[0])];
        for (col, w) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!("{:<w$}", style(col.header).bold(), w = *w));
        }
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let mut parts = vec![format!("{:<w$}", style(&row.id).cyan(), w = widths[0])];
            for (col, w) in self.columns.iter().zip(&widths[1..]) {
                match row.get(col.key) {
                    Some(value) => parts.push(value.format_tsv(*w)),
                    None => parts.push(format!("{:<w$}", "-", w = *w)),
                }
            }
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&format!(
            "{} {}(s) found.\n",
            style(rows.len()).cyan(),
            self.entity_name
        ));
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["id"];
        header.extend(self.columns.iter().map(|c| c.key));
        writer.write_record(&header).into_diagnostic()?;

        for row in rows {
            let mut record = vec![row.id.clone()];
            for col in self.columns {
                record.push(row.get(col.key).map(CellValue::raw).unwrap_or_default());
            }
            writer.write_record(&record).into_diagnostic()?;
        }

        let bytes = writer.into_inner().into_diagnostic()?;
        String::from_utf8(bytes).into_diagnostic()
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut headers = vec!["ID".to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));

        let mut out = format!("| {} |\n", headers.join(" | "));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let mut values = vec![row.id.replace('|', "\\|")];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}
