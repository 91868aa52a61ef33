use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use crate::licenses::{LicenseEntry, LicenseOutcome, LicenseReport};
use crate::types::WhitesourceDependency;

pub fn print_license_table(report: &LicenseReport) {
    if report.entries.is_empty() {
        return;
    }
    println!("{}", license_table(report));
}

fn license_table(report: &LicenseReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        Cell::new("Module").add_attribute(Attribute::Bold),
        Cell::new("License File").add_attribute(Attribute::Bold),
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new("Detail").add_attribute(Attribute::Bold),
    ]);

    for entry in &report.entries {
        table.add_row(vec![
            Cell::new(&entry.module),
            Cell::new(format!("{}--{}", entry.owner, entry.name)),
            colorize_outcome(&entry.outcome),
            Cell::new(outcome_detail(entry)),
        ]);
    }
    table
}

fn colorize_outcome(outcome: &LicenseOutcome) -> Cell {
    let color = match outcome {
        LicenseOutcome::Retrieved => Color::Green,
        LicenseOutcome::OnDisk { .. } => Color::Cyan,
        LicenseOutcome::Missing { .. } => Color::Yellow,
        LicenseOutcome::Failed { .. } => Color::Red,
    };
    let cell = Cell::new(outcome.label()).fg(color);
    if outcome.is_resolved() {
        cell
    } else {
        cell.add_attribute(Attribute::Bold)
    }
}

fn outcome_detail(entry: &LicenseEntry) -> String {
    match &entry.outcome {
        LicenseOutcome::Retrieved => "-".to_string(),
        LicenseOutcome::OnDisk { http_status } | LicenseOutcome::Missing { http_status } => {
            format!("HTTP {http_status}")
        }
        LicenseOutcome::Failed { error } => shorten(error),
    }
}

fn shorten(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    let mut buf = String::new();
    for (idx, ch) in text.chars().enumerate() {
        if idx >= MAX_CHARS {
            buf.push_str("...");
            return buf;
        }
        buf.push(ch);
    }
    buf
}

pub fn print_dependency_table(deps: &[WhitesourceDependency]) {
    if deps.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        Cell::new("Group").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Version").add_attribute(Attribute::Bold),
    ]);
    for dep in deps {
        let group = if dep.group_id.is_empty() {
            "-"
        } else {
            dep.group_id.as_str()
        };
        table.add_row(vec![
            Cell::new(group),
            Cell::new(&dep.name).fg(Color::Green),
            Cell::new(&dep.version),
        ]);
    }
    println!("{table}");
}

pub fn output_json<T: Serialize + ?Sized>(
    value: &T,
    print_json: bool,
    output_path: Option<&Path>,
) -> Result<()> {
    if !print_json && output_path.is_none() {
        return Ok(());
    }

    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = output_path {
        fs::write(path, &json)
            .with_context(|| format!("JSONファイルの書き込みに失敗: {}", path.display()))?;
        println!("JSONを{}に書き出しました。", path.display());
    }

    if print_json {
        println!("JSON出力:\n{json}");
    }
    Ok(())
}

pub fn print_pretty<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("JSONの整形に失敗しました")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> LicenseReport {
        LicenseReport {
            entries: vec![
                LicenseEntry {
                    module: "github.com/foo/bar".to_string(),
                    owner: "foo".to_string(),
                    name: "bar".to_string(),
                    outcome: LicenseOutcome::Retrieved,
                },
                LicenseEntry {
                    module: "github.com/foo/gone".to_string(),
                    owner: "foo".to_string(),
                    name: "gone".to_string(),
                    outcome: LicenseOutcome::Missing { http_status: 404 },
                },
            ],
        }
    }

    #[test]
    fn table_lists_every_entry() {
        let rendered = license_table(&report()).to_string();
        assert!(rendered.contains("foo--bar"));
        assert!(rendered.contains("missing"));
        assert!(rendered.contains("HTTP 404"));
    }

    #[test]
    fn shorten_truncates_long_errors() {
        let long = "x".repeat(80);
        let short = shorten(&long);
        assert_eq!(short.chars().count(), 63);
        assert!(short.ends_with("..."));
        assert_eq!(shorten("ok"), "ok");
    }

    #[test]
    fn writes_json_report_to_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.json");
        output_json(&report(), false, Some(&path)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["entries"][1]["status"], "missing");
    }
}
