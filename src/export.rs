use std::{fmt, str::FromStr};

use serde_json::to_string_pretty;
use thiserror::Error;

use crate::models::task::{Task, TaskStatus};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize tasks to JSON: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown export format '{0}' (expected csv, json or markdown)")]
    UnknownFormat(String),
}

/// Renders a task collection as text. Output depends only on the input.
pub trait Exporter {
    fn export(&self, tasks: &[Task]) -> Result<String, ExportError>;

    /// Extension including the leading dot, e.g. `.csv`
    fn file_extension(&self) -> &'static str;
}

pub const CSV_HEADER: &str = "ID,Title,Description,Priority,Status,Due Date,Created At";
const CSV_MISSING_DATE: &str = "N/A";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Ids stay bare unless they would break the row.
fn quote_if_needed(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote(field)
    } else {
        field.to_string()
    }
}

impl Exporter for CsvExporter {
    fn export(&self, tasks: &[Task]) -> Result<String, ExportError> {
        if tasks.is_empty() {
            return Ok(String::new());
        }

        let rows = tasks
            .iter()
            .map(|task| {
                format!(
                    "{},{},{},{},{},{},{}",
                    quote_if_needed(task.id()),
                    quote(task.title()),
                    quote(task.description()),
                    task.priority(),
                    task.status(),
                    task.due_date()
                        .map_or_else(|| CSV_MISSING_DATE.to_string(), |d| d.to_string()),
                    task.created_at(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!("{CSV_HEADER}\n{rows}"))
    }

    fn file_extension(&self) -> &'static str {
        ".csv"
    }
}

/// Pretty-printed array using the same record layout as the JSON store.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, tasks: &[Task]) -> Result<String, ExportError> {
        to_string_pretty(tasks).map_err(|e| ExportError::Serialize { source: e })
    }

    fn file_extension(&self) -> &'static str {
        ".json"
    }
}

pub const MARKDOWN_HEADING: &str = "# Tasks\n\n";

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownExporter;

impl Exporter for MarkdownExporter {
    fn export(&self, tasks: &[Task]) -> Result<String, ExportError> {
        let mut markdown = String::from(MARKDOWN_HEADING);

        for task in tasks {
            let checkbox = if task.status() == TaskStatus::Done {
                "[x]"
            } else {
                "[ ]"
            };
            markdown.push_str(&format!("## {} {}\n\n", checkbox, task.title()));
            markdown.push_str(&format!("**Description:** {}\n\n", task.description()));
            markdown.push_str(&format!("**Priority:** {}\n\n", task.priority()));
            markdown.push_str(&format!("**Status:** {}\n\n", task.status()));
            if let Some(due) = task.due_date() {
                // Calendar date in UTC so output does not depend on the host zone
                markdown.push_str(&format!("**Due Date:** {}\n\n", due.strftime("%Y-%m-%d")));
            }
            markdown.push_str("---\n\n");
        }

        Ok(markdown)
    }

    fn file_extension(&self) -> &'static str {
        ".md"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn exporter(self) -> Box<dyn Exporter> {
        match self {
            ExportFormat::Csv => Box::new(CsvExporter),
            ExportFormat::Json => Box::new(JsonExporter),
            ExportFormat::Markdown => Box::new(MarkdownExporter),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::Priority;

    fn sample() -> Vec<Task> {
        vec![
            Task::new("1", "Buy milk", "p1")
                .unwrap()
                .with_description("Semi-skimmed, \"organic\"")
                .with_priority(Priority::High)
                .with_due_date(Some("2024-03-01T10:00:00Z".parse().unwrap())),
            Task::new("2", "Call, mom", "p1")
                .unwrap()
                .with_status(TaskStatus::Done),
        ]
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(CsvExporter.export(&[]).unwrap(), "");
        assert_eq!(JsonExporter.export(&[]).unwrap(), "[]");
        assert_eq!(MarkdownExporter.export(&[]).unwrap(), "# Tasks\n\n");
        let parsed: serde_json::Value =
            serde_json::from_str(&JsonExporter.export(&[]).unwrap()).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[test]
    fn test_csv_rows() {
        let tasks = sample();

        let csv = CsvExporter.export(&tasks).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            format!(
                "1,\"Buy milk\",\"Semi-skimmed, \"\"organic\"\"\",high,todo,2024-03-01T10:00:00Z,{}",
                tasks[0].created_at()
            )
        );
        assert!(lines[2].starts_with("2,\"Call, mom\",\"\",medium,done,N/A,"));
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_csv_quotes_ids_with_separators() {
        let tasks = vec![Task::new("a,\"b\"", "t", "p1").unwrap()];

        let csv = CsvExporter.export(&tasks).unwrap();

        assert!(csv.lines().nth(1).unwrap().starts_with("\"a,\"\"b\"\"\",\"t\",\"\",medium,"));
    }

    #[test]
    fn test_json_contains_every_field() {
        let tasks = sample();

        let json = JsonExporter.export(&tasks).unwrap();
        let parsed: Vec<Task> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, tasks);
        assert!(json.contains("\n  {"));
        assert!(json.contains("\"completedAt\""));
    }

    #[test]
    fn test_markdown_sections() {
        let tasks = sample();

        let markdown = MarkdownExporter.export(&tasks).unwrap();

        assert!(markdown.starts_with("# Tasks\n\n## [ ] Buy milk\n\n"));
        assert!(markdown.contains("**Description:** Semi-skimmed, \"organic\"\n\n"));
        assert!(markdown.contains("**Priority:** high\n\n**Status:** todo\n\n"));
        assert!(markdown.contains("**Due Date:** 2024-03-01\n\n---\n\n"));
        assert!(markdown.contains("## [x] Call, mom\n\n"));
        assert_eq!(markdown.matches("**Due Date:**").count(), 1);
        assert_eq!(markdown.matches("---\n\n").count(), 2);
    }

    #[test]
    fn test_format_selection() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!(".CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(_))
        ));
        assert_eq!(ExportFormat::Json.exporter().file_extension(), ".json");
        assert_eq!(ExportFormat::Markdown.exporter().file_extension(), ".md");
        assert_eq!(ExportFormat::Csv.exporter().file_extension(), ".csv");
    }
}
