use chrono::NaiveDate;

use volley_stats::{
    ActionRecorder, MatchStore, MemoryStore, RosterSlot, SetTracker, SqliteStore, StatError,
    StatStore,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn slot(player_id: u32, is_starter: bool) -> RosterSlot {
    RosterSlot {
        player_id,
        is_starter,
    }
}

fn check_set_lifecycle<S: StatStore + MatchStore>(store: &S) {
    let tracker = SetTracker::new(store);
    let info = tracker.create_match("  Lakeside  ", date()).unwrap();
    assert_eq!(info.opponent, "Lakeside");

    let roster = [slot(1, true), slot(2, true), slot(14, false)];
    let first = tracker.start_set(info.id, &roster).unwrap();
    let second = tracker.start_set(info.id, &roster[..2]).unwrap();
    assert_eq!(first.set_number, 1);
    assert_eq!(second.set_number, 2);
    assert_eq!((first.home_score, first.opponent_score), (0, 0));

    // One zeroed record per roster player, starters flagged.
    let bench = store.find_record(first.id, 14).unwrap().unwrap();
    assert!(!bench.is_starter);
    assert_eq!(bench.counters, volley_stats::StatCounters::default());
    assert!(store.find_record(first.id, 1).unwrap().unwrap().is_starter);
    assert!(store.find_record(second.id, 14).unwrap().is_none());

    for _ in 0..25 {
        tracker.record_home_point(first.id).unwrap();
    }
    for _ in 0..20 {
        tracker.record_opponent_point(first.id).unwrap();
    }
    for _ in 0..3 {
        tracker.record_opponent_point(second.id).unwrap();
    }

    let summary = tracker.match_summary(info.id).unwrap();
    assert_eq!(summary.sets.len(), 2);
    assert_eq!(summary.sets[0].home_score, 25);
    assert_eq!(summary.sets[0].opponent_score, 20);
    assert_eq!(summary.home_sets_won, 1);
    assert_eq!(summary.opponent_sets_won, 1);
}

#[test]
fn set_lifecycle_in_memory() {
    check_set_lifecycle(&MemoryStore::new());
}

#[test]
fn set_lifecycle_in_sqlite() {
    check_set_lifecycle(&SqliteStore::open_in_memory().unwrap());
}

#[test]
fn start_set_rejects_bad_rosters() {
    let store = MemoryStore::new();
    let tracker = SetTracker::new(&store);
    let info = tracker.create_match("Harbor", date()).unwrap();

    let err = tracker.start_set(info.id, &[]).unwrap_err();
    assert!(matches!(err, StatError::InvalidArgument(_)));

    let err = tracker
        .start_set(info.id, &[slot(3, true), slot(3, false)])
        .unwrap_err();
    assert!(matches!(err, StatError::InvalidArgument(_)));

    let err = tracker.start_set(info.id + 1, &[slot(3, true)]).unwrap_err();
    assert!(matches!(err, StatError::MatchNotFound(_)));
    assert!(store.sets_for_match(info.id).unwrap().is_empty());
}

#[test]
fn scoring_unknown_set_fails() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tracker = SetTracker::new(&store);
    let err = tracker.record_home_point(77).unwrap_err();
    assert!(matches!(err, StatError::SetNotFound(77)));
    let err = tracker.match_summary(5).unwrap_err();
    assert!(matches!(err, StatError::MatchNotFound(5)));
}

#[test]
fn empty_opponent_is_rejected() {
    let store = MemoryStore::new();
    let err = SetTracker::new(&store)
        .create_match("   ", date())
        .unwrap_err();
    assert!(matches!(err, StatError::InvalidArgument(_)));
}

fn check_delete_cascades<S: StatStore + MatchStore>(store: &S) {
    let tracker = SetTracker::new(store);
    let keep = tracker.create_match("Keep", date()).unwrap();
    let drop = tracker.create_match("Drop", date()).unwrap();
    let kept_set = tracker.start_set(keep.id, &[slot(1, true)]).unwrap();
    let dropped_set = tracker.start_set(drop.id, &[slot(1, true)]).unwrap();
    ActionRecorder::new(store)
        .record_kill(dropped_set.id, 1)
        .unwrap();

    tracker.delete_match(drop.id).unwrap();
    assert!(store.find_match(drop.id).unwrap().is_none());
    assert!(store.find_set(dropped_set.id).unwrap().is_none());
    assert!(store.find_record(dropped_set.id, 1).unwrap().is_none());
    assert!(store.records_for_match(drop.id).unwrap().is_empty());

    assert!(store.find_record(kept_set.id, 1).unwrap().is_some());
    let err = tracker.delete_match(drop.id).unwrap_err();
    assert!(matches!(err, StatError::MatchNotFound(_)));
}

#[test]
fn delete_match_cascades_in_memory() {
    check_delete_cascades(&MemoryStore::new());
}

#[test]
fn delete_match_cascades_in_sqlite() {
    check_delete_cascades(&SqliteStore::open_in_memory().unwrap());
}

fn check_repeated_roster_creates_nothing<S: StatStore + MatchStore>(store: &S) {
    let info = store.insert_match("Cove", date()).unwrap();
    let err = store
        .create_set(info.id, &[slot(4, true), slot(9, false), slot(4, false)])
        .unwrap_err();
    assert!(matches!(err, StatError::Duplicate { player_id: 4, .. }));
    assert!(store.sets_for_match(info.id).unwrap().is_empty());
    assert!(store.records_for_match(info.id).unwrap().is_empty());

    // The failed attempt does not consume a set number.
    let set = store.create_set(info.id, &[slot(4, true)]).unwrap();
    assert_eq!(set.set_number, 1);
}

#[test]
fn repeated_roster_player_is_rejected_in_memory() {
    check_repeated_roster_creates_nothing(&MemoryStore::new());
}

#[test]
fn repeated_roster_player_is_rejected_in_sqlite() {
    check_repeated_roster_creates_nothing(&SqliteStore::open_in_memory().unwrap());
}
