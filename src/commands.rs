//! Command implementations for arkdata CLI

use crate::cli::{Commands, EntryRef, OutputFormat};
use crate::dataset::{Category, Entry, FieldValue};
use crate::diff::{ChangeFilter, ChangeKind, DiffResult};
use crate::error::{ArkdataError, Result};
use crate::output::{CsvFormatter, JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::reconcile::Verdict;
use crate::store::ArkStore;
use crate::version::VersionPart;
use crate::workspace::{ArkWorkspace, CandidateSource, JsonFileSource, WorkspaceConfig};
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Show { format } => show_command(workspace_path, &format),
        Commands::Compare {
            candidate,
            category,
            search,
            only,
            format,
        } => compare_command(
            workspace_path,
            &candidate,
            category.as_deref(),
            search.as_deref(),
            &only,
            &format,
        ),
        Commands::Apply {
            candidate,
            accept,
            reject,
            dry_run,
        } => apply_command(workspace_path, &candidate, &accept, &reject, dry_run),
        Commands::Bump { part } => bump_command(workspace_path, &part),
        Commands::Add {
            category,
            key,
            fields,
        } => add_command(workspace_path, &category, &key, fields),
        Commands::Remove { category, keys } => remove_command(workspace_path, &category, &keys),
        Commands::Backup => backup_command(workspace_path),
        Commands::Backups { format } => backups_command(workspace_path, &format),
    }
}

/// Initialize arkdata workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    let workspace = if force {
        let workspace = ArkWorkspace::from_root(root.to_path_buf());
        std::fs::create_dir_all(&workspace.arkdata_dir)?;
        std::fs::create_dir_all(&workspace.backups_dir)?;
        workspace.create_config_with_force(true)?;
        workspace.ensure_gitignore()?;
        workspace
    } else {
        // Always create in the given directory, never in a parent
        ArkWorkspace::create_new(root.to_path_buf())?
    };

    println!("✅ Initialized arkdata workspace at: {}", workspace.root.display());
    println!("📁 Workspace directory: {}", workspace.arkdata_dir.display());

    Ok(())
}

/// Open the workspace and load the stored dataset into a fresh store
fn open_store(workspace_path: Option<&Path>) -> Result<(ArkWorkspace, WorkspaceConfig, ArkStore)> {
    let workspace = ArkWorkspace::find_or_create(workspace_path)?;
    let config = workspace.load_config()?;
    let mut store = ArkStore::new(config.max_history);
    store.load(&workspace)?;
    Ok((workspace, config, store))
}

/// Read the candidate file into the store's review, rendering progress
fn fetch_candidate(store: &mut ArkStore, candidate: &Path) -> Result<()> {
    let ticket = store.begin_fetch()?;
    let mut reporter = ProgressReporter::new("Loading candidate data");
    let mut source = JsonFileSource::new(candidate);
    let outcome = source.fetch(&mut reporter);
    reporter.finish("Candidate data loaded");

    let review = store.finish_fetch(ticket, outcome)?;
    log::debug!(
        "Comparison {} has {} pending changes",
        review.id,
        review.diff().total_stats().total
    );
    Ok(())
}

/// Resolve relative paths against the workspace root
fn resolve_input(workspace: &ArkWorkspace, input: &Path) -> PathBuf {
    if input.is_absolute() {
        input.to_path_buf()
    } else {
        workspace.root.join(input)
    }
}

fn parse_category(category: &str) -> Result<Category> {
    category.parse()
}

/// Show the stored dataset
fn show_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let (_, _, store) = open_store(workspace_path)?;
    let output_format = OutputFormat::parse(format).map_err(|e| ArkdataError::invalid_input(e))?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_dataset_summary(store.dataset()),
        OutputFormat::Json => println!("{}", JsonFormatter::format_dataset_summary(store.dataset())?),
        OutputFormat::Csv => {
            return Err(ArkdataError::invalid_input(
                "CSV output is only available for compare",
            ))
        }
    }

    Ok(())
}

/// Report the differences between the stored dataset and a candidate
fn compare_command(
    workspace_path: Option<&Path>,
    candidate: &Path,
    category: Option<&str>,
    search: Option<&str>,
    only: &[String],
    format: &str,
) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(|e| ArkdataError::invalid_input(e))?;
    let categories = match category {
        Some(c) => vec![parse_category(c)?],
        None => Category::ALL.to_vec(),
    };

    let mut filter = ChangeFilter::default();
    if let Some(search) = search {
        filter = filter.with_search(search);
    }
    if !only.is_empty() {
        let kinds = only
            .iter()
            .map(|k| k.parse::<ChangeKind>())
            .collect::<Result<Vec<_>>>()?;
        filter = filter.with_kinds(&kinds);
    }

    let (workspace, _, mut store) = open_store(workspace_path)?;
    fetch_candidate(&mut store, &resolve_input(&workspace, candidate))?;
    let review = store
        .review()
        .ok_or(ArkdataError::NoComparison)?;

    let filtered: Vec<(Category, DiffResult)> = categories
        .into_iter()
        .map(|c| {
            let diff = review
                .category_diff(c)
                .map(|d| filter.apply(d))
                .unwrap_or_default();
            (c, diff)
        })
        .collect();

    match output_format {
        OutputFormat::Pretty => {
            for (category, diff) in &filtered {
                PrettyPrinter::print_category_diff(*category, diff);
            }
        }
        OutputFormat::Json => {
            let reports: Vec<_> = filtered
                .iter()
                .map(|(category, diff)| JsonFormatter::change_report(*category, diff))
                .collect();
            println!("{}", JsonFormatter::format_change_reports(&reports)?);
        }
        OutputFormat::Csv => {
            print!(
                "{}",
                CsvFormatter::format_change_reports(filtered.iter().map(|(c, d)| (*c, d)))
            );
        }
    }

    Ok(())
}

/// Reconcile a candidate into the stored dataset
fn apply_command(
    workspace_path: Option<&Path>,
    candidate: &Path,
    accept: &[EntryRef],
    reject: &[EntryRef],
    dry_run: bool,
) -> Result<()> {
    if let Some(conflict) = accept.iter().find(|a| reject.contains(a)) {
        return Err(ArkdataError::invalid_input(format!(
            "'{}:{}' is both accepted and rejected",
            conflict.category, conflict.key
        )));
    }

    let (workspace, config, mut store) = open_store(workspace_path)?;
    fetch_candidate(&mut store, &resolve_input(&workspace, candidate))?;

    for entry in accept {
        store.set_decision(entry.category, &entry.key, Verdict::Accept)?;
    }
    for entry in reject {
        store.set_decision(entry.category, &entry.key, Verdict::Reject)?;
    }

    if !dry_run && config.backup_before_apply {
        // Backups are opportunistic
        if let Ok(name) = store.create_backup(&workspace) {
            println!("💾 Backup created: {}", name);
        }
    }

    let summary = store.apply_comparison()?;
    PrettyPrinter::print_apply_summary(&summary, dry_run);

    if !dry_run {
        store.save(&workspace)?;
    }

    Ok(())
}

/// Increment the stored version
fn bump_command(workspace_path: Option<&Path>, part: &str) -> Result<()> {
    let part: VersionPart = part.parse().map_err(|e| ArkdataError::invalid_input(e))?;
    let (workspace, _, mut store) = open_store(workspace_path)?;

    let previous = store.dataset().version.clone();
    let version = store.increment_version(part)?;
    store.save(&workspace)?;

    println!("✅ Version {} → {}", previous, version);
    Ok(())
}

/// Add or replace an entry
fn add_command(
    workspace_path: Option<&Path>,
    category: &str,
    key: &str,
    fields: Vec<(String, FieldValue)>,
) -> Result<()> {
    let category = parse_category(category)?;
    if fields.is_empty() {
        return Err(ArkdataError::invalid_input("At least one --field is required"));
    }

    let (workspace, _, mut store) = open_store(workspace_path)?;
    let entry: Entry = fields.into_iter().collect();
    store.add_entry(category, key, entry)?;
    store.save(&workspace)?;

    println!("✅ Added {} entry '{}'", category, key);
    Ok(())
}

/// Remove entries
fn remove_command(workspace_path: Option<&Path>, category: &str, keys: &[String]) -> Result<()> {
    let category = parse_category(category)?;
    let (workspace, _, mut store) = open_store(workspace_path)?;

    let removed = store.remove_entries(category, keys)?;
    if removed == 0 {
        return Err(ArkdataError::validation(format!(
            "None of the given keys exist in {}",
            category
        )));
    }
    store.save(&workspace)?;

    println!("✅ Removed {} of {} {} entries", removed, keys.len(), category);
    Ok(())
}

/// Back up the stored dataset
fn backup_command(workspace_path: Option<&Path>) -> Result<()> {
    let (workspace, _, mut store) = open_store(workspace_path)?;
    let name = store.create_backup(&workspace)?;
    println!("💾 Backup created: {}", name);
    Ok(())
}

/// List backups
fn backups_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let workspace = ArkWorkspace::find_or_create(workspace_path)?;
    let output_format = OutputFormat::parse(format).map_err(|e| ArkdataError::invalid_input(e))?;
    let backups = workspace.list_backups()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_backup_list(&backups),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&backups)?),
        OutputFormat::Csv => {
            return Err(ArkdataError::invalid_input(
                "CSV output is only available for compare",
            ))
        }
    }

    Ok(())
}
