///! Rendering of command results
///!
///! Tables for people, JSON and YAML for scripts. Status lines go to stderr
///! when they report a problem so piped output stays parseable.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use tabled::{Table, Tabled};

use console_common::rule_list::NodeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Unknown names fall back to a table
    pub fn from_str(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else if name.eq_ignore_ascii_case("yaml") || name.eq_ignore_ascii_case("yml") {
            OutputFormat::Yaml
        } else {
            OutputFormat::Table
        }
    }
}

/// Print rows as a table, or the raw records as JSON or YAML
pub fn print_output<R: Tabled, T: Serialize>(rows: Vec<R>, raw: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Json => print_json(raw)?,
        OutputFormat::Yaml => print_yaml(raw)?,
    }
    Ok(())
}

/// One record; tables have no single-row form so YAML stands in
pub fn print_single<T: Serialize>(record: &T, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        print_json(record)
    } else {
        print_yaml(record)
    }
}

pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "Nothing to show".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_yaml<T: Serialize>(value: &T) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Announce a newly saved record with its server-assigned id
pub fn print_created(kind: &str, name: &str, id: &str) {
    println!("{} {} {} saved with ID {}", "✓".green().bold(), kind, name.bold(), id.cyan());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Status label colored like the status dot in the browser
pub fn status_label(status: NodeStatus) -> ColoredString {
    match status {
        NodeStatus::Red => status.label().red(),
        NodeStatus::Green => status.label().green(),
        NodeStatus::Blue => status.label().blue(),
        NodeStatus::Grey => status.label().dimmed(),
    }
}

/// Format epoch millis as a UTC date, or "-" when absent
pub fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Shorten `s` to at most `max_len` characters, marking the cut with "..."
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::from_str("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("yml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_str("anything"), OutputFormat::Table);
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(None), "-");
        assert_eq!(format_millis(Some(0)), "1970-01-01 00:00");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer rule name", 10), "a longe...");
        assert_eq!(truncate("ümlaut", 2), "üm");
    }
}
