//! Functional tests for the compare / decide / apply workflow

use crate::common::sample_data;
use arkdata::dataset::{Category, Dataset};
use arkdata::diff::ChangeKind;
use arkdata::history::HistoryStore;
use arkdata::reconcile::{Decision, ReconciliationSession, Verdict, APPLY_DESCRIPTION};

const RAPTOR: &str = "Raptor_Character_BP_C";
const REX: &str = "Rex_Character_BP_C";
const PICK: &str = "PrimalItem_Pick_C";

fn setup() -> (Dataset, HistoryStore, ReconciliationSession) {
    let live = Dataset::from_value(sample_data::base_dataset()).unwrap();
    let mut history = HistoryStore::default();
    history.seed(&live);
    let mut session = ReconciliationSession::new();
    let candidate = Dataset::from_value(sample_data::candidate_dataset()).unwrap();
    session.start_comparison(&live, candidate);
    (live, history, session)
}

#[test]
fn test_comparison_seeds_defaults() {
    let (_, _, session) = setup();
    let review = session.review().unwrap();

    assert_eq!(review.change_kind(Category::Creatures, RAPTOR), Some(ChangeKind::Modified));
    assert_eq!(review.change_kind(Category::Creatures, REX), Some(ChangeKind::Added));
    assert_eq!(review.change_kind(Category::Items, PICK), Some(ChangeKind::Removed));

    assert_eq!(session.decision(Category::Creatures, RAPTOR), Decision::Accept);
    assert_eq!(session.decision(Category::Creatures, REX), Decision::Accept);
    assert_eq!(session.decision(Category::Items, PICK), Decision::Reject);
    assert_eq!(review.diff().total_stats().total, 3);
}

#[test]
fn test_apply_with_default_decisions() {
    let (mut live, mut history, mut session) = setup();
    let summary = session.apply(&mut live, &mut history).unwrap();

    assert_eq!(live.creatures[RAPTOR].get("mod_name").unwrap(), "ArkMod");
    assert!(live.creatures.contains_key(REX));
    // Removal defaults to reject, so the pick stays
    assert!(live.items.contains_key(PICK));

    assert_eq!(live.version, "1.0.1");
    assert_eq!((summary.added, summary.updated, summary.removed, summary.skipped), (1, 1, 0, 1));
    assert_eq!(history.len(), 2);
    assert_eq!(history.last_action(), Some(APPLY_DESCRIPTION));
    assert!(!session.is_reviewing());
}

#[test]
fn test_rejecting_an_addition() {
    let (mut live, mut history, mut session) = setup();
    session.set_decision(Category::Creatures, REX, Verdict::Reject).unwrap();
    session.apply(&mut live, &mut history).unwrap();

    assert!(!live.creatures.contains_key(REX));
    assert_eq!(live.creatures[RAPTOR].get("mod_name").unwrap(), "ArkMod");
}

#[test]
fn test_rejecting_a_modification_keeps_current() {
    let (mut live, mut history, mut session) = setup();
    session.set_decision(Category::Creatures, RAPTOR, Verdict::Reject).unwrap();
    session.apply(&mut live, &mut history).unwrap();

    assert_eq!(live.creatures[RAPTOR].get("mod_name").unwrap(), "ARK");
}

#[test]
fn test_accepting_a_removal_deletes() {
    let (mut live, mut history, mut session) = setup();
    session.set_decision(Category::Items, PICK, Verdict::Accept).unwrap();
    let summary = session.apply(&mut live, &mut history).unwrap();

    assert!(live.items.is_empty());
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn test_last_decision_wins() {
    let (_, _, mut session) = setup();
    session.set_decision(Category::Creatures, REX, Verdict::Reject).unwrap();
    session.set_decision(Category::Creatures, REX, Verdict::Accept).unwrap();
    assert_eq!(session.decision(Category::Creatures, REX), Decision::Accept);
}

#[test]
fn test_bulk_decisions() {
    let (mut live, mut history, mut session) = setup();
    assert_eq!(session.reject_all(Category::Creatures).unwrap(), 2);
    assert_eq!(session.accept_all(Category::Items).unwrap(), 1);
    session.apply(&mut live, &mut history).unwrap();

    assert_eq!(live.creatures.len(), 1);
    assert_eq!(live.creatures[RAPTOR].get("mod_name").unwrap(), "ARK");
    assert!(live.items.is_empty());
}

#[test]
fn test_unchanged_keys_cannot_be_decided() {
    let (_, _, mut session) = setup();
    let err = session
        .set_decision(Category::Colors, "0", Verdict::Accept)
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_cancel_discards_everything() {
    let (live, history, mut session) = setup();
    assert!(session.cancel());
    assert!(!session.is_reviewing());
    assert!(!session.cancel());
    assert_eq!(history.len(), 1);
    assert_eq!(live.version, "1.0.0");
}

#[test]
fn test_restart_replaces_review() {
    let (live, _, mut session) = setup();
    session.set_decision(Category::Creatures, REX, Verdict::Reject).unwrap();
    let first_id = session.review().unwrap().id;

    let candidate = Dataset::from_value(sample_data::candidate_dataset()).unwrap();
    let review = session.start_comparison(&live, candidate);
    assert_ne!(review.id, first_id);
    assert_eq!(session.decision(Category::Creatures, REX), Decision::Accept);
}

#[test]
fn test_operations_require_review() {
    let mut session = ReconciliationSession::new();
    let mut live = Dataset::new();
    let mut history = HistoryStore::default();
    history.seed(&live);

    assert!(session.set_decision(Category::Items, "x", Verdict::Accept).unwrap_err().is_validation());
    assert!(session.apply(&mut live, &mut history).unwrap_err().is_validation());
    assert_eq!(history.len(), 1);
}

#[test]
fn test_identical_candidate_still_bumps_patch() {
    let live = Dataset::from_value(sample_data::base_dataset()).unwrap();
    let mut live_copy = live.clone();
    let mut history = HistoryStore::default();
    history.seed(&live);

    let mut session = ReconciliationSession::new();
    let review = session.start_comparison(&live, live.clone());
    assert!(!review.diff().has_changes());

    let summary = session.apply(&mut live_copy, &mut history).unwrap();
    assert_eq!(summary.version, "1.0.1");
    assert_eq!(live_copy.creatures, live.creatures);
    assert_eq!(live_copy.items, live.items);
}

#[test]
fn test_apply_then_undo_restores_live() {
    let (mut live, mut history, mut session) = setup();
    let before = live.clone();
    session.apply(&mut live, &mut history).unwrap();

    let restored = history.undo().unwrap();
    assert_eq!(restored, before);
    assert_eq!(history.last_action(), Some(format!("Undo: {}", APPLY_DESCRIPTION).as_str()));
}
