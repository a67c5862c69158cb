//! Selective reconciliation of a candidate dataset into the live one
//!
//! A comparison seeds a decision for every changed key: additions and
//! modifications default to accept, removals default to reject. `apply`
//! then only takes a change whose key is explicitly accepted, so an
//! undecided modification keeps the current value even though the seeded
//! default for it is accept.

use crate::dataset::{Category, Dataset};
use crate::diff::{ChangeKind, DatasetDiff, DiffEngine, DiffResult};
use crate::error::{ArkdataError, Result};
use crate::history::HistoryStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Snapshot description recorded by `apply`
pub const APPLY_DESCRIPTION: &str = "Applied selective data comparison changes.";

/// Review state of one changed key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
    Undecided,
}

/// What a reviewer can set a key to. There is no way back to
/// `Decision::Undecided` once a key has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Decision::Accept,
            Verdict::Reject => Decision::Reject,
        }
    }
}

impl Decision {
    /// Decision a freshly compared key starts with
    pub fn default_for(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Added | ChangeKind::Modified => Decision::Accept,
            ChangeKind::Removed => Decision::Reject,
        }
    }
}

/// An in-progress comparison against a candidate dataset
#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    candidate: Dataset,
    diff: DatasetDiff,
    decisions: BTreeMap<Category, BTreeMap<String, Decision>>,
}

impl Review {
    fn new(current: &Dataset, candidate: Dataset) -> Self {
        let diff = DiffEngine::compare_datasets(current, &candidate);

        let decisions = diff
            .iter()
            .map(|(category, result)| {
                let seeded: BTreeMap<String, Decision> = result
                    .changed_keys()
                    .map(|(key, kind)| (key.clone(), Decision::default_for(kind)))
                    .collect();
                (category, seeded)
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            candidate,
            diff,
            decisions,
        }
    }

    pub fn candidate(&self) -> &Dataset {
        &self.candidate
    }

    pub fn diff(&self) -> &DatasetDiff {
        &self.diff
    }

    pub fn category_diff(&self, category: Category) -> Option<&DiffResult> {
        self.diff.get(category)
    }

    pub fn decision(&self, category: Category, key: &str) -> Decision {
        self.decisions
            .get(&category)
            .and_then(|d| d.get(key))
            .copied()
            .unwrap_or(Decision::Undecided)
    }

    pub fn decisions(&self, category: Category) -> impl Iterator<Item = (&String, Decision)> {
        self.decisions
            .get(&category)
            .into_iter()
            .flat_map(|d| d.iter().map(|(k, v)| (k, *v)))
    }

    pub fn change_kind(&self, category: Category, key: &str) -> Option<ChangeKind> {
        self.diff.get(category).and_then(|d| d.kind_of(key))
    }

    fn is_accepted(&self, category: Category, key: &str) -> bool {
        self.decision(category, key) == Decision::Accept
    }

    fn set(&mut self, category: Category, key: &str, verdict: Verdict) -> Result<()> {
        if self.change_kind(category, key).is_none() {
            return Err(ArkdataError::validation(format!(
                "'{}' is not a pending change in {}",
                key, category
            )));
        }
        self.decisions
            .entry(category)
            .or_default()
            .insert(key.to_string(), verdict.into());
        Ok(())
    }

    fn set_all(&mut self, category: Category, verdict: Verdict) -> usize {
        let keys: Vec<String> = match self.diff.get(category) {
            Some(diff) => diff.changed_keys().map(|(k, _)| k.clone()).collect(),
            None => return 0,
        };
        let decisions = self.decisions.entry(category).or_default();
        for key in &keys {
            decisions.insert(key.clone(), verdict.into());
        }
        keys.len()
    }

    /// Merge accepted changes over `current`, leaving `current` untouched
    fn merge(&self, current: &Dataset) -> (Dataset, ApplySummary) {
        let mut merged = current.clone();
        let mut summary = ApplySummary {
            comparison_id: self.id,
            ..ApplySummary::default()
        };

        for category in Category::ALL {
            let live = current.table(category);
            let incoming = self.candidate.table(category);
            let keys: BTreeSet<&String> = live.keys().chain(incoming.keys()).collect();
            let table = merged.table_mut(category);

            for key in keys {
                match (live.get(key), incoming.get(key)) {
                    (None, Some(new_entry)) => {
                        if self.is_accepted(category, key) {
                            table.insert(key.clone(), new_entry.clone());
                            summary.added += 1;
                        } else {
                            summary.skipped += 1;
                        }
                    }
                    (Some(_), None) => {
                        if self.is_accepted(category, key) {
                            table.remove(key);
                            summary.removed += 1;
                        } else {
                            summary.skipped += 1;
                        }
                    }
                    (Some(old_entry), Some(new_entry)) if old_entry != new_entry => {
                        if self.is_accepted(category, key) {
                            table.insert(key.clone(), new_entry.clone());
                            summary.updated += 1;
                        } else {
                            summary.skipped += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        (merged, summary)
    }
}

/// Outcome of `ReconciliationSession::apply`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub comparison_id: Uuid,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Changes present in the candidate that were not taken
    pub skipped: usize,
    pub version: String,
    /// Set when the version could not be incremented
    pub version_warning: Option<String>,
}

/// Review lifecycle
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Reviewing(Box<Review>),
}

/// Stages a candidate dataset and tracks per-key decisions until it is
/// applied or cancelled
#[derive(Debug, Default)]
pub struct ReconciliationSession {
    state: SessionState,
}

impl ReconciliationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self.state, SessionState::Reviewing(_))
    }

    pub fn review(&self) -> Option<&Review> {
        match &self.state {
            SessionState::Reviewing(review) => Some(review.as_ref()),
            SessionState::Idle => None,
        }
    }

    fn review_mut(&mut self) -> Result<&mut Review> {
        match &mut self.state {
            SessionState::Reviewing(review) => Ok(review.as_mut()),
            SessionState::Idle => Err(ArkdataError::NoComparison),
        }
    }

    /// Diff `candidate` against `current` and seed default decisions.
    /// A comparison already under review is replaced.
    pub fn start_comparison(&mut self, current: &Dataset, candidate: Dataset) -> &Review {
        if let Some(previous) = self.review() {
            log::warn!("Discarding comparison {} in favour of a new one", previous.id);
        }

        let review = Review::new(current, candidate);
        let stats = review.diff.total_stats();
        log::info!(
            "Started comparison {}: {} added, {} removed, {} modified",
            review.id,
            stats.added,
            stats.removed,
            stats.modified
        );

        self.state = SessionState::Reviewing(Box::new(review));
        match &self.state {
            SessionState::Reviewing(review) => review.as_ref(),
            SessionState::Idle => unreachable!("state was just set to Reviewing"),
        }
    }

    pub fn decision(&self, category: Category, key: &str) -> Decision {
        self.review()
            .map(|r| r.decision(category, key))
            .unwrap_or(Decision::Undecided)
    }

    pub fn set_decision(&mut self, category: Category, key: &str, verdict: Verdict) -> Result<()> {
        self.review_mut()?.set(category, key, verdict)
    }

    /// Accept every change in a category. Returns how many keys were set.
    pub fn accept_all(&mut self, category: Category) -> Result<usize> {
        Ok(self.review_mut()?.set_all(category, Verdict::Accept))
    }

    /// Reject every change in a category. Returns how many keys were set.
    pub fn reject_all(&mut self, category: Category) -> Result<usize> {
        Ok(self.review_mut()?.set_all(category, Verdict::Reject))
    }

    /// Merge the accepted changes into `live`, bump the patch version and
    /// record a snapshot. The session returns to idle.
    pub fn apply(&mut self, live: &mut Dataset, history: &mut HistoryStore) -> Result<ApplySummary> {
        let review = self.review_mut()?;
        let (mut merged, mut summary) = review.merge(live);

        match merged.increment_patch() {
            Ok(version) => summary.version = version,
            Err(e) => {
                merged.touch();
                summary.version = merged.version.clone();
                summary.version_warning = Some(e.to_string());
            }
        }

        *live = merged;
        history.push_snapshot(live, APPLY_DESCRIPTION);
        self.state = SessionState::Idle;

        log::info!(
            "Applied comparison {}: {} added, {} updated, {} removed, {} skipped (version {})",
            summary.comparison_id,
            summary.added,
            summary.updated,
            summary.removed,
            summary.skipped,
            summary.version
        );
        Ok(summary)
    }

    /// Drop the candidate and all decisions. Returns whether a comparison
    /// was in progress.
    pub fn cancel(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            SessionState::Reviewing(review) => {
                log::info!("Cancelled comparison {}", review.id);
                true
            }
            SessionState::Idle => false,
        }
    }
}
