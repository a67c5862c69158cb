//! Unit tests for the bounded undo/redo history

use arkdata::dataset::{Category, Dataset, Entry};
use arkdata::history::{HistoryStore, DEFAULT_MAX_HISTORY, INITIAL_LOAD};

fn with_beacon(dataset: &Dataset, key: &str) -> Dataset {
    let mut next = dataset.clone();
    next.table_mut(Category::Beacons)
        .insert(key.to_string(), Entry::new().with_field("name", key));
    next
}

#[test]
fn test_seed_starts_clean() {
    let mut history = HistoryStore::default();
    history.seed(&Dataset::new());

    assert_eq!(history.len(), 1);
    assert_eq!(history.max_entries(), DEFAULT_MAX_HISTORY);
    assert_eq!(history.current().unwrap().description, INITIAL_LOAD);
    assert_eq!(history.current().unwrap().version, 1);
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert!(!history.is_dirty());
}

#[test]
fn test_history_is_bounded() {
    let mut history = HistoryStore::default();
    let mut dataset = Dataset::new();
    history.seed(&dataset);

    for i in 0..51 {
        dataset = with_beacon(&dataset, &format!("b{}", i));
        history.push_snapshot(&dataset, format!("push {}", i));
    }

    assert_eq!(history.len(), 50);
    assert_eq!(history.position(), 49);
    // The seed and the first push were evicted
    assert_eq!(history.entries().next().unwrap().description, "push 1");
    assert_eq!(history.current().unwrap().version, 52);
}

#[test]
fn test_versions_are_monotonic() {
    let mut history = HistoryStore::new(3);
    let dataset = Dataset::new();
    history.seed(&dataset);
    for i in 0..5 {
        history.push_snapshot(&dataset, format!("step {}", i));
    }

    let versions: Vec<u64> = history.entries().map(|s| s.version).collect();
    assert_eq!(versions, vec![4, 5, 6]);
}

#[test]
fn test_undo_redo_round_trip() {
    let mut history = HistoryStore::default();
    let base = Dataset::new();
    history.seed(&base);

    let edited = with_beacon(&base, "red");
    history.push_snapshot(&edited, "Add beacons entry: red");

    let restored = history.undo().unwrap();
    assert_eq!(restored.beacons, base.beacons);
    assert_eq!(history.last_action(), Some("Undo: Add beacons entry: red"));
    assert!(history.can_redo());

    let redone = history.redo().unwrap();
    assert_eq!(redone, edited);
    assert_eq!(history.last_action(), Some("Redo: Add beacons entry: red"));
    assert!(!history.can_redo());
}

#[test]
fn test_undo_at_start_is_noop() {
    let mut history = HistoryStore::default();
    history.seed(&Dataset::new());
    assert!(history.undo().is_none());
    assert!(history.redo().is_none());
    assert_eq!(history.position(), 0);
    assert_eq!(history.last_action(), None);
}

#[test]
fn test_push_after_undo_discards_redo() {
    let mut history = HistoryStore::default();
    let base = Dataset::new();
    history.seed(&base);
    history.push_snapshot(&with_beacon(&base, "a"), "a");
    history.push_snapshot(&with_beacon(&base, "b"), "b");

    history.undo();
    history.push_snapshot(&with_beacon(&base, "c"), "c");

    let descriptions: Vec<&str> = history.entries().map(|s| s.description.as_str()).collect();
    assert_eq!(descriptions, vec![INITIAL_LOAD, "a", "c"]);
    assert!(!history.can_redo());
}

#[test]
fn test_snapshots_are_independent_copies() {
    let mut history = HistoryStore::default();
    let mut dataset = Dataset::new();
    history.seed(&dataset);

    dataset = with_beacon(&dataset, "red");
    history.push_snapshot(&dataset, "add red");
    dataset.table_mut(Category::Beacons).clear();

    assert_eq!(history.current().unwrap().data().beacons.len(), 1);
}

#[test]
fn test_dirty_tracking() {
    let mut history = HistoryStore::default();
    let base = Dataset::new();
    history.seed(&base);
    history.push_snapshot(&base, "edit");
    assert!(history.is_dirty());

    history.mark_saved();
    assert!(!history.is_dirty());

    history.undo();
    assert!(history.is_dirty());
}
