//! Output formatting utilities

use crate::dataset::{Category, Dataset, Entry, FieldValue};
use crate::diff::{DiffResult, FieldChange};
use crate::error::Result;
use crate::hash::HashComputer;
use crate::reconcile::ApplySummary;
use crate::workspace::BackupInfo;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// How many changed entries to list per bucket before summarizing
const SAMPLE_LIMIT: usize = 10;

/// Pretty printer for arkdata output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print dataset version and per-category counts
    pub fn print_dataset_summary(dataset: &Dataset) {
        println!("📦 ARK Dataset v{}", dataset.version);
        println!("├─ Last updated: {}", format_timestamp(dataset.last_updated));
        println!("├─ Fingerprint: {}", HashComputer::hash_dataset(dataset));
        let tables: Vec<_> = dataset.tables().collect();
        for (i, (category, table)) in tables.iter().enumerate() {
            let prefix = if i == tables.len() - 1 { "└─" } else { "├─" };
            println!("{} {}: {}", prefix, category, table.len());
        }
    }

    /// Print the changes found in one category
    pub fn print_category_diff(category: Category, diff: &DiffResult) {
        let stats = diff.stats();
        if !diff.has_changes() {
            println!("✅ {}: unchanged", category);
            return;
        }

        println!(
            "🔍 {}: {} changes (+{} ~{} -{})",
            category, stats.total, stats.added, stats.modified, stats.removed
        );

        if !diff.added.is_empty() {
            println!("├─ Added: {}", diff.added.len());
            Self::print_entry_sample(diff.added.iter(), "│  ");
        }

        if !diff.modified.is_empty() {
            println!("├─ Modified: {}", diff.modified.len());
            for (key, modified) in diff.modified.iter().take(SAMPLE_LIMIT) {
                println!("│  ├─ {} ({})", display_name(key, &modified.new), key);
                for (field, change) in &modified.changes {
                    println!("│  │  └─ {}", describe_change(field, change));
                }
            }
            if diff.modified.len() > SAMPLE_LIMIT {
                println!("│  └─ ... and {} more", diff.modified.len() - SAMPLE_LIMIT);
            }
        }

        if !diff.removed.is_empty() {
            println!("└─ Removed: {}", diff.removed.len());
            Self::print_entry_sample(diff.removed.iter(), "   ");
        } else {
            println!("└─ Removed: 0");
        }
    }

    fn print_entry_sample<'a>(entries: impl ExactSizeIterator<Item = (&'a String, &'a Entry)>, prefix: &str) {
        let total = entries.len();
        for (i, (key, entry)) in entries.take(SAMPLE_LIMIT).enumerate() {
            let is_last = i == total.min(SAMPLE_LIMIT) - 1 && total <= SAMPLE_LIMIT;
            let marker = if is_last { "└─" } else { "├─" };
            println!("{}{} {} ({})", prefix, marker, display_name(key, entry), key);
        }
        if total > SAMPLE_LIMIT {
            println!("{}└─ ... and {} more", prefix, total - SAMPLE_LIMIT);
        }
    }

    /// Print the outcome of applying a comparison
    pub fn print_apply_summary(summary: &ApplySummary, dry_run: bool) {
        if dry_run {
            println!("🔍 Dry run - nothing was saved");
        } else {
            println!("✅ Applied comparison {}", summary.comparison_id);
        }
        println!("├─ Added: {}", summary.added);
        println!("├─ Updated: {}", summary.updated);
        println!("├─ Removed: {}", summary.removed);
        println!("├─ Skipped: {}", summary.skipped);
        println!("└─ Version: {}", summary.version);
        if let Some(warning) = &summary.version_warning {
            println!("⚠️  {}", warning);
        }
    }

    /// Print backup list
    pub fn print_backup_list(backups: &[BackupInfo]) {
        if backups.is_empty() {
            println!("No backups found.");
            return;
        }

        println!("💾 Available Backups:");
        for (i, backup) in backups.iter().enumerate() {
            let prefix = if i == backups.len() - 1 { "└─" } else { "├─" };
            println!("{} {} ({})", prefix, backup.name, format_bytes(backup.size));
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    pub fn format_dataset_summary(dataset: &Dataset) -> Result<String> {
        let counts: serde_json::Map<String, Value> = dataset
            .tables()
            .map(|(category, table)| (category.to_string(), json!(table.len())))
            .collect();
        let json = json!({
            "version": dataset.version,
            "last_updated": dataset.last_updated,
            "fingerprint": HashComputer::hash_dataset(dataset),
            "entries": counts,
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }

    /// Exportable report of one category's changes
    pub fn change_report(category: Category, diff: &DiffResult) -> Value {
        json!({
            "category": category,
            "stats": diff.stats(),
            "changes": diff,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    pub fn format_change_reports(reports: &[Value]) -> Result<String> {
        Ok(serde_json::to_string_pretty(reports)?)
    }
}

/// CSV change report, one row per added/removed entry and one per changed
/// field of a modified entry
pub struct CsvFormatter;

impl CsvFormatter {
    pub const HEADER: &'static str = "Type,Name,Field,Old Value,New Value";
    pub const CATEGORY_HEADER: &'static str = "Category,Type,Name,Field,Old Value,New Value";

    pub fn format_change_report(diff: &DiffResult) -> String {
        let mut content = String::new();
        content.push_str(Self::HEADER);
        content.push('\n');
        Self::append_rows(&mut content, None, diff);
        content
    }

    /// Rows for several categories under one header, each row led by its
    /// category
    pub fn format_change_reports<'a>(
        diffs: impl IntoIterator<Item = (Category, &'a DiffResult)>,
    ) -> String {
        let mut content = String::new();
        content.push_str(Self::CATEGORY_HEADER);
        content.push('\n');
        for (category, diff) in diffs {
            Self::append_rows(&mut content, Some(category), diff);
        }
        content
    }

    fn append_rows(content: &mut String, category: Option<Category>, diff: &DiffResult) {
        let category = category.map(|c| c.as_str());
        for (key, entry) in &diff.added {
            push_row(content, category, ["Added", &display_name(key, entry), "-", "-", "-"]);
        }

        for (key, modified) in &diff.modified {
            let name = display_name(key, &modified.new);
            for (field, change) in &modified.changes {
                let (old, new) = match change {
                    FieldChange::Added { value } => ("-".to_string(), format_value(value)),
                    FieldChange::Removed { value } => (format_value(value), "-".to_string()),
                    FieldChange::Modified {
                        old_value,
                        new_value,
                    } => (format_value(old_value), format_value(new_value)),
                };
                push_row(content, category, ["Modified", &name, field, &old, &new]);
            }
        }

        for (key, entry) in &diff.removed {
            push_row(content, category, ["Removed", &display_name(key, entry), "-", "-", "-"]);
        }
    }
}

fn push_row(content: &mut String, category: Option<&str>, cells: [&str; 5]) {
    let row: Vec<String> = category
        .into_iter()
        .chain(cells)
        .map(escape_csv)
        .collect();
    content.push_str(&row.join(","));
    content.push('\n');
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Entry name, falling back to the key
fn display_name(key: &str, entry: &Entry) -> String {
    entry.name().unwrap_or(key).to_string()
}

/// Render a field value without JSON quoting for plain strings
pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn describe_change(field: &str, change: &FieldChange) -> String {
    match change {
        FieldChange::Added { value } => format!("{}: + {}", field, format_value(value)),
        FieldChange::Removed { value } => format!("{}: - {}", field, format_value(value)),
        FieldChange::Modified {
            old_value,
            new_value,
        } => format!(
            "{}: '{}' → '{}'",
            field,
            format_value(old_value),
            format_value(new_value)
        ),
    }
}

fn format_timestamp(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
