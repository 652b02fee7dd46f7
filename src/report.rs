//! Run reports
//!
//! Renders test outcomes as a colored text table or as a JSON document.

use crate::resource::ResourceKind;
use crate::suite::{RunSummary, TestOutcome, TestStatus};
use crate::validation::ValidationResult;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use crossterm::style::Stylize;
use serde::Serialize;
use std::io::{self, Write};

const HEADERS: [&str; 6] = [
    "Test Name",
    "Type",
    "Field Name",
    "Passed",
    "Expected Value",
    "Actual Value",
];

/// Longest cell rendered in the table, in characters
const MAX_CELL_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStyle {
    Pass,
    Fail,
    Aborted,
}

struct Row {
    cells: [String; 6],
    style: RowStyle,
}

/// Truncate a cell to the table's maximum width
fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_CELL_WIDTH {
        value.to_string()
    } else {
        let kept: String = value.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", kept)
    }
}

fn result_row(test: &str, result: &ValidationResult) -> Row {
    let actual = match &result.error {
        Some(err) => format!("<{}>", err),
        None => result.actual.clone(),
    };

    Row {
        cells: [
            truncate(test),
            result.kind.to_string(),
            truncate(&result.name),
            if result.matched { "yes" } else { "no" }.to_string(),
            truncate(&result.expected),
            truncate(&actual),
        ],
        style: if result.matched {
            RowStyle::Pass
        } else {
            RowStyle::Fail
        },
    }
}

fn outcome_rows(outcome: &TestOutcome) -> Vec<Row> {
    match &outcome.status {
        TestStatus::Aborted(err) => vec![Row {
            cells: [
                truncate(&outcome.name),
                outcome.kind.label().to_string(),
                "-".to_string(),
                "aborted".to_string(),
                String::new(),
                truncate(&err.to_string()),
            ],
            style: RowStyle::Aborted,
        }],
        _ if outcome.results.is_empty() => vec![Row {
            cells: [
                truncate(&outcome.name),
                outcome.kind.label().to_string(),
                "(no assertions)".to_string(),
                "yes".to_string(),
                String::new(),
                String::new(),
            ],
            style: RowStyle::Pass,
        }],
        _ => outcome
            .results
            .iter()
            .map(|r| result_row(&outcome.name, r))
            .collect(),
    }
}

fn format_line(cells: &[String; 6], widths: &[usize; 6]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    format!("| {} |", padded.join(" | "))
}

fn separator(widths: &[usize; 6], fill: char) -> String {
    let parts: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("+{}+", parts.join("+"))
}

/// One-line run summary
pub fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{} tests ({} aborted), {} assertions: {} passed, {} failed",
        summary.tests, summary.aborted, summary.assertions, summary.passed, summary.failed
    )
}

/// Write the results table; colors rows green, red, or yellow when `color` is set
pub fn render_table<W: Write>(
    out: &mut W,
    outcomes: &[TestOutcome],
    summary: &RunSummary,
    color: bool,
) -> io::Result<()> {
    let groups: Vec<Vec<Row>> = outcomes.iter().map(outcome_rows).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in groups.iter().flatten() {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "{}", separator(&widths, '-'))?;
    writeln!(out, "{}", format_line(&HEADERS.map(String::from), &widths))?;
    writeln!(out, "{}", separator(&widths, '='))?;

    for rows in &groups {
        for row in rows {
            let line = format_line(&row.cells, &widths);
            if color {
                let styled = match row.style {
                    RowStyle::Pass => line.green(),
                    RowStyle::Fail => line.red(),
                    RowStyle::Aborted => line.yellow(),
                };
                writeln!(out, "{}", styled)?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
        writeln!(out, "{}", separator(&widths, '-'))?;
    }

    let line = summary_line(summary);
    if color {
        let styled = if summary.is_success() {
            line.green().bold()
        } else {
            line.red().bold()
        };
        writeln!(out, "{}", styled)
    } else {
        writeln!(out, "{}", line)
    }
}

/// JSON document for one run
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: String,
    pub summary: RunSummary,
    pub tests: Vec<TestReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TestReport<'a> {
    pub name: &'a str,
    pub kind: ResourceKind,
    pub query: String,
    pub resource_id: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: &'a [ValidationResult],
}

impl<'a> Report<'a> {
    pub fn new(
        outcomes: &'a [TestOutcome],
        summary: RunSummary,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let tests = outcomes
            .iter()
            .map(|outcome| TestReport {
                name: &outcome.name,
                kind: outcome.kind,
                query: outcome.query.to_string(),
                resource_id: outcome.resource_id.as_deref(),
                display_name: outcome.display_name.as_deref(),
                status: outcome.status.label(),
                error: outcome.status.error().map(|e| e.to_string()),
                results: &outcome.results,
            })
            .collect();

        Self {
            generated_at: generated_at.to_rfc3339(),
            summary,
            tests,
        }
    }
}

/// Pretty-printed JSON report stamped with the current time
pub fn render_json(outcomes: &[TestOutcome], summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report::new(outcomes, *summary, Utc::now()))
}
