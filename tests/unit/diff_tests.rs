//! Unit tests for structural diffing

use arkdata::dataset::{Category, CategoryTable, Dataset, Entry};
use arkdata::diff::{ChangeFilter, ChangeKind, DiffEngine, FieldChange};

fn table(entries: &[(&str, Entry)]) -> CategoryTable {
    entries
        .iter()
        .map(|(k, e)| (k.to_string(), e.clone()))
        .collect()
}

fn creature(name: &str, mod_name: &str) -> Entry {
    Entry::new().with_field("name", name).with_field("mod_name", mod_name)
}

#[test]
fn test_identical_tables_have_no_changes() {
    let old = table(&[("A", creature("Raptor", "ARK")), ("B", creature("Rex", "ARK"))]);
    let diff = DiffEngine::compare(&old, &old.clone());

    assert!(!diff.has_changes());
    let stats = DiffEngine::stats(&diff);
    assert_eq!((stats.added, stats.removed, stats.modified, stats.total), (0, 0, 0, 0));
}

#[test]
fn test_buckets_are_disjoint() {
    let old = table(&[("A", creature("Raptor", "ARK")), ("C", creature("Dodo", "ARK"))]);
    let new = table(&[("A", creature("Raptor", "ArkMod")), ("B", creature("Rex", "ARK"))]);

    let diff = DiffEngine::compare(&old, &new);
    assert_eq!(diff.added.keys().collect::<Vec<_>>(), vec!["B"]);
    assert_eq!(diff.removed.keys().collect::<Vec<_>>(), vec!["C"]);
    assert_eq!(diff.modified.keys().collect::<Vec<_>>(), vec!["A"]);

    let stats = diff.stats();
    assert_eq!(stats.total, stats.added + stats.removed + stats.modified);
    assert_eq!(stats.total, 3);
}

#[test]
fn test_field_level_changes() {
    let old = Entry::new()
        .with_field("name", "Raptor")
        .with_field("mod_name", "ARK")
        .with_field("tameable", true);
    let new = Entry::new()
        .with_field("name", "Raptor")
        .with_field("mod_name", "ArkMod")
        .with_field("speed", 120);

    let changes = DiffEngine::compare_fields(&old, &new);
    assert_eq!(changes.len(), 3);
    assert_eq!(
        changes["mod_name"],
        FieldChange::Modified {
            old_value: "ARK".into(),
            new_value: "ArkMod".into()
        }
    );
    assert_eq!(changes["speed"], FieldChange::Added { value: 120.into() });
    assert_eq!(changes["tameable"], FieldChange::Removed { value: true.into() });
    assert!(!changes.contains_key("name"));
}

#[test]
fn test_field_order_is_not_a_change() {
    let old = table(&[("A", Entry::new().with_field("name", "Rex").with_field("hp", 1100))]);
    let new = table(&[("A", Entry::new().with_field("hp", 1100).with_field("name", "Rex"))]);

    assert!(!DiffEngine::compare(&old, &new).has_changes());
}

#[test]
fn test_iteration_order_does_not_matter() {
    let forward = table(&[("A", creature("Raptor", "ARK")), ("Z", creature("Rex", "ARK"))]);
    let mut reversed = CategoryTable::new();
    reversed.insert("Z".into(), creature("Rex", "ARK"));
    reversed.insert("A".into(), creature("Raptor", "ArkMod"));

    let a = DiffEngine::compare(&forward, &reversed);
    let b = DiffEngine::compare(&forward, &reversed.clone());
    assert_eq!(a, b);
    assert_eq!(a.kind_of("A"), Some(ChangeKind::Modified));
    assert_eq!(a.kind_of("Z"), None);
}

#[test]
fn test_compare_datasets_covers_all_categories() {
    let mut old = Dataset::new();
    old.table_mut(Category::Engrams)
        .insert("EngramEntry_Pick".into(), Entry::new().with_field("name", "Pick"));
    let mut new = old.clone();
    new.table_mut(Category::Icons)
        .insert("icon_rex".into(), Entry::new().with_field("name", "Rex Icon"));

    let diff = DiffEngine::compare_datasets(&old, &new);
    assert_eq!(diff.iter().count(), Category::ALL.len());
    assert_eq!(diff.stats(Category::Icons).added, 1);
    assert_eq!(diff.stats(Category::Engrams).total, 0);
    assert_eq!(diff.total_stats().total, 1);
    assert!(diff.has_changes());
}

#[test]
fn test_filter_by_search_and_kind() {
    let old = table(&[("A", creature("Raptor", "ARK")), ("C", creature("Dodo", "ARK"))]);
    let new = table(&[
        ("A", creature("Raptor", "ArkMod")),
        ("B", creature("Rex", "ARK")),
        ("D", creature("Giant Raptor", "ARK")),
    ]);
    let diff = DiffEngine::compare(&old, &new);

    let by_name = ChangeFilter::default().with_search("RAPTOR").apply(&diff);
    assert_eq!(by_name.added.keys().collect::<Vec<_>>(), vec!["D"]);
    assert_eq!(by_name.modified.keys().collect::<Vec<_>>(), vec!["A"]);
    assert!(by_name.removed.is_empty());

    let only_removed = ChangeFilter::default()
        .with_kinds(&[ChangeKind::Removed])
        .apply(&diff);
    assert_eq!(only_removed.stats().total, 1);
    assert!(only_removed.removed.contains_key("C"));
}

#[test]
fn test_filter_by_changed_field() {
    let old = table(&[
        ("A", creature("Raptor", "ARK")),
        ("B", Entry::new().with_field("name", "Rex").with_field("hp", 1100)),
    ]);
    let new = table(&[
        ("A", creature("Raptor", "ArkMod")),
        ("B", Entry::new().with_field("name", "Rex").with_field("hp", 1200)),
    ]);
    let diff = DiffEngine::compare(&old, &new);

    let filtered = ChangeFilter::default()
        .with_fields(vec!["hp".to_string()])
        .apply(&diff);
    assert_eq!(filtered.modified.keys().collect::<Vec<_>>(), vec!["B"]);
}

#[test]
fn test_change_kind_parse() {
    assert_eq!("Added".parse::<ChangeKind>().unwrap(), ChangeKind::Added);
    assert_eq!(" modified ".parse::<ChangeKind>().unwrap(), ChangeKind::Modified);
    assert!("renamed".parse::<ChangeKind>().is_err());
}
