//! The editing session: live dataset, history and reconciliation in one
//! explicitly owned object
//!
//! Every mutation runs to completion under `&mut self`. Failed operations
//! never touch the live dataset; they reset their in-progress flag and
//! leave their message in `last_error`.

use crate::dataset::{Category, Dataset, Entry};
use crate::error::{ArkdataError, Result};
use crate::history::{HistoryStore, DEFAULT_MAX_HISTORY};
use crate::progress::{ProgressEvent, ProgressSink, ProgressTracker};
use crate::reconcile::{ApplySummary, Decision, ReconciliationSession, Review, Verdict};
use crate::version::VersionPart;
use crate::workspace::{BackupStore, CandidateSource, DatasetStore};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Description recorded when missing entries are merged in wholesale
pub const MERGE_DESCRIPTION: &str = "Updated data from web scraping";

/// Proof that the holder owns the outstanding fetch.
///
/// Only the ticket returned by the most recent `begin_fetch` can complete
/// it; a ticket is consumed on use.
#[derive(Debug)]
pub struct FetchTicket {
    id: u64,
}

impl FetchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug)]
pub struct ArkStore {
    dataset: Dataset,
    history: HistoryStore,
    session: ReconciliationSession,
    loading: bool,
    saving: bool,
    outstanding_fetch: Option<u64>,
    next_ticket: u64,
    progress: ProgressTracker,
    last_error: Option<String>,
    last_saved: Option<DateTime<Utc>>,
}

impl Default for ArkStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ArkStore {
    /// Create a store holding an empty dataset
    pub fn new(max_history: usize) -> Self {
        Self::with_dataset(Dataset::default(), max_history)
    }

    /// Create a store around an already loaded dataset
    pub fn with_dataset(dataset: Dataset, max_history: usize) -> Self {
        let mut history = HistoryStore::new(max_history);
        history.seed(&dataset);
        Self {
            dataset,
            history,
            session: ReconciliationSession::new(),
            loading: false,
            saving: false,
            outstanding_fetch: None,
            next_ticket: 1,
            progress: ProgressTracker::default(),
            last_error: None,
            last_saved: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn session(&self) -> &ReconciliationSession {
        &self.session
    }

    pub fn review(&self) -> Option<&Review> {
        self.session.review()
    }

    pub fn progress(&self) -> Option<&ProgressEvent> {
        self.progress.latest()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn last_action(&self) -> Option<&str> {
        self.history.last_action()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_fetching(&self) -> bool {
        self.outstanding_fetch.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Keep the error around for display before handing it back
    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, err: ArkdataError) -> ArkdataError {
        log::warn!("{}", err);
        self.last_error = Some(err.to_string());
        err
    }

    fn ensure_no_fetch(&mut self, operation: &str) -> Result<()> {
        if self.is_fetching() {
            let err = ArkdataError::busy(format!("{} while a fetch is outstanding", operation));
            return Err(self.fail(err));
        }
        Ok(())
    }

    // ---- persistence -------------------------------------------------

    /// Replace the live dataset with the stored one and reset history
    pub fn load(&mut self, store: &dyn DatasetStore) -> Result<()> {
        if self.loading {
            return Err(self.fail(ArkdataError::busy("load")));
        }
        self.ensure_no_fetch("load")?;
        self.loading = true;
        self.last_error = None;
        let result = store.load();
        self.loading = false;

        let dataset = self.record(result)?;
        log::info!(
            "Loaded dataset version {} ({} entries)",
            dataset.version,
            dataset.entry_count()
        );
        self.history.seed(&dataset);
        self.dataset = dataset;
        self.session.cancel();
        self.last_saved = Some(Utc::now());
        Ok(())
    }

    pub fn save(&mut self, store: &dyn DatasetStore) -> Result<()> {
        if self.saving {
            return Err(self.fail(ArkdataError::busy("save")));
        }
        self.saving = true;
        self.last_error = None;
        let result = store.save(&self.dataset);
        self.saving = false;

        self.record(result)?;
        self.history.mark_saved();
        self.last_saved = Some(Utc::now());
        Ok(())
    }

    /// Write a backup of the live dataset. Failure is recorded but does not
    /// affect anything else.
    pub fn create_backup(&mut self, backups: &dyn BackupStore) -> Result<String> {
        let result = backups.create_backup(&self.dataset);
        self.record(result)
    }

    // ---- candidate fetch ---------------------------------------------

    /// Claim the single fetch slot
    pub fn begin_fetch(&mut self) -> Result<FetchTicket> {
        if self.is_fetching() {
            return Err(self.fail(ArkdataError::busy("fetch")));
        }
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.outstanding_fetch = Some(id);
        self.last_error = None;
        self.progress
            .report(ProgressEvent::new("initializing", 0.0, "Starting data collection..."));
        Ok(FetchTicket { id })
    }

    /// Record a progress event from the outstanding fetch
    pub fn report_progress(&mut self, event: ProgressEvent) {
        self.progress.report(event);
    }

    /// Complete the outstanding fetch and, on success, start reviewing the
    /// validated candidate
    pub fn finish_fetch(&mut self, ticket: FetchTicket, outcome: Result<Value>) -> Result<&Review> {
        if self.outstanding_fetch != Some(ticket.id) {
            let err = ArkdataError::validation(format!("Fetch ticket {} is not outstanding", ticket.id));
            return Err(self.fail(err));
        }
        self.outstanding_fetch = None;

        let candidate = match outcome.and_then(Dataset::from_value) {
            Ok(candidate) => candidate,
            Err(e) => {
                self.progress.report(ProgressEvent::new("error", 0.0, e.to_string()));
                return Err(self.fail(e));
            }
        };

        self.progress
            .report(ProgressEvent::new("complete", 100.0, "Data collection complete"));
        Ok(self.session.start_comparison(&self.dataset, candidate))
    }

    /// Fetch from `source` and start reviewing the result
    pub fn fetch_candidate(&mut self, source: &mut dyn CandidateSource) -> Result<&Review> {
        let ticket = self.begin_fetch()?;
        let outcome = source.fetch(&mut self.progress);
        self.finish_fetch(ticket, outcome)
    }

    // ---- reconciliation ----------------------------------------------

    /// Review an already validated candidate
    pub fn start_comparison(&mut self, candidate: Dataset) -> Result<&Review> {
        self.ensure_no_fetch("start comparison")?;
        Ok(self.session.start_comparison(&self.dataset, candidate))
    }

    pub fn decision(&self, category: Category, key: &str) -> Decision {
        self.session.decision(category, key)
    }

    pub fn set_decision(&mut self, category: Category, key: &str, verdict: Verdict) -> Result<()> {
        let result = self.session.set_decision(category, key, verdict);
        self.record(result)
    }

    pub fn accept_all(&mut self, category: Category) -> Result<usize> {
        let result = self.session.accept_all(category);
        self.record(result)
    }

    pub fn reject_all(&mut self, category: Category) -> Result<usize> {
        let result = self.session.reject_all(category);
        self.record(result)
    }

    pub fn apply_comparison(&mut self) -> Result<ApplySummary> {
        self.ensure_no_fetch("apply")?;
        let result = self.session.apply(&mut self.dataset, &mut self.history);
        let summary = self.record(result)?;
        if let Some(warning) = &summary.version_warning {
            self.last_error = Some(warning.clone());
        }
        Ok(summary)
    }

    pub fn cancel_comparison(&mut self) -> bool {
        self.session.cancel()
    }

    /// Insert candidate entries whose keys are missing, without review
    pub fn merge_missing(&mut self, candidate: &Dataset) -> Result<usize> {
        self.ensure_no_fetch("merge")?;
        let inserted = self.dataset.merge_missing(candidate);
        self.history.push_snapshot(&self.dataset, MERGE_DESCRIPTION);
        log::info!("Merged {} new entries", inserted);
        Ok(inserted)
    }

    // ---- entry edits -------------------------------------------------

    pub fn add_entry(&mut self, category: Category, key: &str, entry: Entry) -> Result<()> {
        self.ensure_no_fetch("add entry")?;
        self.dataset
            .table_mut(category)
            .insert(key.to_string(), entry);
        self.history
            .push_snapshot(&self.dataset, format!("Add {} entry: {}", category, key));
        Ok(())
    }

    /// Overlay `fields` onto an existing entry
    pub fn update_entry(&mut self, category: Category, key: &str, fields: &Entry) -> Result<()> {
        self.ensure_no_fetch("update entry")?;
        let result = match self.dataset.table_mut(category).get_mut(key) {
            Some(entry) => {
                entry.merge_fields(fields);
                Ok(())
            }
            None => Err(ArkdataError::validation(format!(
                "No {} entry with key '{}'",
                category, key
            ))),
        };
        self.record(result)?;
        self.history
            .push_snapshot(&self.dataset, format!("Update {} entry: {}", category, key));
        Ok(())
    }

    pub fn remove_entry(&mut self, category: Category, key: &str) -> Result<Entry> {
        self.ensure_no_fetch("remove entry")?;
        let result = self.dataset.table_mut(category).remove(key).ok_or_else(|| {
            ArkdataError::validation(format!("No {} entry with key '{}'", category, key))
        });
        let removed = self.record(result)?;
        self.history
            .push_snapshot(&self.dataset, format!("Remove {} entry: {}", category, key));
        Ok(removed)
    }

    /// Remove several entries, one history step each. Unknown keys are
    /// skipped. Returns how many were removed.
    pub fn remove_entries<S: AsRef<str>>(&mut self, category: Category, keys: &[S]) -> Result<usize> {
        self.ensure_no_fetch("remove entries")?;
        let mut removed = 0;
        for key in keys {
            let key = key.as_ref();
            if self.dataset.table(category).contains_key(key) && self.remove_entry(category, key).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ---- versions ----------------------------------------------------

    pub fn increment_version(&mut self, part: VersionPart) -> Result<String> {
        self.ensure_no_fetch("version bump")?;
        let result = self.dataset.increment_version(part);
        let version = self.record(result)?;
        self.history.push_snapshot(
            &self.dataset,
            format!("Increment {} version to {}", part.as_str(), version),
        );
        Ok(version)
    }

    pub fn increment_major(&mut self) -> Result<String> {
        self.increment_version(VersionPart::Major)
    }

    pub fn increment_minor(&mut self) -> Result<String> {
        self.increment_version(VersionPart::Minor)
    }

    pub fn increment_patch(&mut self) -> Result<String> {
        self.increment_version(VersionPart::Patch)
    }

    // ---- history -----------------------------------------------------

    /// Step back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_no_fetch("undo")?;
        match self.history.undo() {
            Some(dataset) => {
                self.dataset = dataset;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step forward one snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_no_fetch("redo")?;
        match self.history.redo() {
            Some(dataset) => {
                self.dataset = dataset;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
