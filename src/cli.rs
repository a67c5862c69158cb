//! Command-line interface for arkdata

use crate::dataset::{Category, FieldValue};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arkdata")]
#[command(about = "Versioned game-data store with selective reconciliation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize arkdata workspace
    Init {
        /// Force initialization even if workspace exists
        #[arg(long)]
        force: bool,
    },

    /// Show the stored dataset
    Show {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Compare the stored dataset against a candidate file
    Compare {
        /// Candidate JSON file
        candidate: PathBuf,

        /// Only report this category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive search on entry names
        #[arg(long)]
        search: Option<String>,

        /// Comma-separated change kinds to show: added,removed,modified
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Output format: "pretty", "json", "csv"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Reconcile a candidate file into the stored dataset
    Apply {
        /// Candidate JSON file
        candidate: PathBuf,

        /// Accept a change, as CATEGORY:KEY
        #[arg(long, value_parser = parse_entry_ref)]
        accept: Vec<EntryRef>,

        /// Reject a change, as CATEGORY:KEY
        #[arg(long, value_parser = parse_entry_ref)]
        reject: Vec<EntryRef>,

        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Increment the dataset version
    Bump {
        /// Version part: "major", "minor", "patch"
        part: String,
    },

    /// Add or replace an entry
    Add {
        category: String,

        key: String,

        /// Field value, as NAME=VALUE (VALUE is parsed as JSON when possible)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, FieldValue)>,
    },

    /// Remove entries
    Remove {
        category: String,

        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Back up the stored dataset
    Backup,

    /// List backups, newest first
    Backups {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// A `CATEGORY:KEY` reference to one entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRef {
    pub category: Category,
    pub key: String,
}

fn parse_entry_ref(s: &str) -> Result<EntryRef, String> {
    let (category, key) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid entry reference: '{}'. Use CATEGORY:KEY", s))?;
    let category = category.parse::<Category>().map_err(|e| e.to_string())?;
    if key.is_empty() {
        return Err(format!("Missing key in entry reference: '{}'", s));
    }
    Ok(EntryRef {
        category,
        key: key.to_string(),
    })
}

fn parse_field(s: &str) -> Result<(String, FieldValue), String> {
    let (name, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid field: '{}'. Use NAME=VALUE", s))?;
    if name.is_empty() {
        return Err(format!("Missing field name in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| FieldValue::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Parse output format string
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Pretty,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!(
                "Invalid output format: {}. Use 'pretty', 'json' or 'csv'",
                s
            )),
        }
    }
}
