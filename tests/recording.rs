use volley_stats::{
    Action, ActionRecorder, MatchStore, MemoryStore, PassGrade, RosterSlot, SetId, SetTracker,
    SqliteStore, StatCounters, StatError, StatStore,
};

fn seeded<S: MatchStore>(store: &S) -> SetId {
    let info = store
        .insert_match("Rivals", chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
        .unwrap();
    let roster = [
        RosterSlot {
            player_id: 7,
            is_starter: true,
        },
        RosterSlot {
            player_id: 9,
            is_starter: false,
        },
    ];
    store.create_set(info.id, &roster).unwrap().id
}

#[test]
fn kill_bumps_kills_and_attack_attempts_only() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);

    let record = recorder.record_kill(set_id, 7).unwrap();
    assert_eq!(
        record.counters,
        StatCounters {
            kills: 1,
            attack_attempts: 1,
            ..StatCounters::default()
        }
    );
}

#[test]
fn kill_error_bumps_errors_and_attempts() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);

    recorder.record_kill_error(set_id, 7).unwrap();
    let record = recorder.record_kill_error(set_id, 7).unwrap();
    assert_eq!(record.counters.kill_errors, 2);
    assert_eq!(record.counters.attack_attempts, 2);
    assert_eq!(record.counters.kills, 0);
}

#[test]
fn each_action_matches_transition_table() {
    let cases: [(Action, StatCounters); 13] = [
        (
            Action::AttackAttempt,
            StatCounters {
                attack_attempts: 1,
                ..Default::default()
            },
        ),
        (
            Action::Kill,
            StatCounters {
                kills: 1,
                attack_attempts: 1,
                ..Default::default()
            },
        ),
        (
            Action::KillError,
            StatCounters {
                kill_errors: 1,
                attack_attempts: 1,
                ..Default::default()
            },
        ),
        (
            Action::ServiceAce,
            StatCounters {
                service_ace: 1,
                service_attempt: 1,
                ..Default::default()
            },
        ),
        (
            Action::ServiceAttempt,
            StatCounters {
                service_attempt: 1,
                ..Default::default()
            },
        ),
        (
            Action::ServiceError,
            StatCounters {
                service_error: 1,
                service_attempt: 1,
                ..Default::default()
            },
        ),
        (
            Action::Dig,
            StatCounters {
                digs: 1,
                ..Default::default()
            },
        ),
        (
            Action::DigError,
            StatCounters {
                dig_error: 1,
                ..Default::default()
            },
        ),
        (
            Action::Block,
            StatCounters {
                blocks: 1,
                ..Default::default()
            },
        ),
        (
            Action::BlockError,
            StatCounters {
                block_error: 1,
                ..Default::default()
            },
        ),
        (
            Action::Assist,
            StatCounters {
                assists: 1,
                set_attempts: 1,
                ..Default::default()
            },
        ),
        (
            Action::SetAttempt,
            StatCounters {
                set_attempts: 1,
                ..Default::default()
            },
        ),
        (
            Action::SetError,
            StatCounters {
                set_error: 1,
                set_attempts: 1,
                ..Default::default()
            },
        ),
    ];

    for (action, expected) in cases {
        let store = MemoryStore::new();
        let set_id = seeded(&store);
        let record = ActionRecorder::new(&store)
            .record(set_id, 9, action)
            .unwrap();
        assert_eq!(record.counters, expected, "{action}");
    }
}

#[test]
fn two_assists_count_two_set_attempts() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);

    recorder.record_assist(set_id, 7).unwrap();
    let record = recorder.record_assist(set_id, 7).unwrap();
    assert_eq!(record.counters.assists, 2);
    assert_eq!(record.counters.set_attempts, 2);
}

#[test]
fn pass_rating_selects_bucket() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);

    recorder.record_pass_rating(set_id, 7, 3).unwrap();
    recorder.record_pass_rating(set_id, 7, 3).unwrap();
    recorder.record_pass_rating(set_id, 7, 2).unwrap();
    let record = recorder.record_pass_rating(set_id, 7, 0).unwrap();

    assert_eq!(record.counters.three_pass, 2);
    assert_eq!(record.counters.two_pass, 1);
    assert_eq!(record.counters.one_pass, 0);
    assert_eq!(record.counters.zero_pass, 1);
    assert_eq!(record.counters.total_passes(), 4);
    assert_eq!(record.pass_rating(), 2.0);
}

#[test]
fn repeated_grade_yields_that_rating() {
    for rating in 0..=3 {
        let store = MemoryStore::new();
        let set_id = seeded(&store);
        let recorder = ActionRecorder::new(&store);
        for _ in 0..7 {
            recorder.record_pass_rating(set_id, 9, rating).unwrap();
        }
        let record = recorder.stat_line(set_id, 9).unwrap();
        assert_eq!(record.pass_rating(), f64::from(rating));
    }
}

#[test]
fn out_of_range_rating_is_rejected_without_mutation() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);
    recorder.record_pass_rating(set_id, 7, 1).unwrap();

    for bad in [-1, 4, 99] {
        let err = recorder.record_pass_rating(set_id, 7, bad).unwrap_err();
        assert!(matches!(err, StatError::InvalidArgument(_)), "{err}");
    }
    let record = recorder.stat_line(set_id, 7).unwrap();
    assert_eq!(
        record.counters,
        StatCounters {
            one_pass: 1,
            ..StatCounters::default()
        }
    );
}

#[test]
fn unknown_set_or_player_is_not_found() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);

    let err = recorder.record_dig(set_id, 42).unwrap_err();
    assert!(matches!(
        err,
        StatError::NotFound {
            player_id: 42,
            ..
        }
    ));
    let err = recorder.record_block(set_id + 100, 7).unwrap_err();
    assert!(matches!(err, StatError::NotFound { .. }));
    let err = recorder.stat_line(set_id, 42).unwrap_err();
    assert!(matches!(err, StatError::NotFound { .. }));
    let err = recorder.record_pass_rating(set_id, 42, 2).unwrap_err();
    assert!(matches!(err, StatError::NotFound { .. }));
}

#[test]
fn recording_persists_through_the_store() {
    let store = SqliteStore::open_in_memory().unwrap();
    let set_id = seeded(&store);
    let recorder = ActionRecorder::new(&store);

    recorder.record_service_ace(set_id, 7).unwrap();
    recorder.record_service_error(set_id, 7).unwrap();
    recorder
        .record(set_id, 7, Action::Pass(PassGrade::One))
        .unwrap();

    let stored = store.find_record(set_id, 7).unwrap().unwrap();
    assert_eq!(stored.counters.service_ace, 1);
    assert_eq!(stored.counters.service_error, 1);
    assert_eq!(stored.counters.service_attempt, 2);
    assert_eq!(stored.counters.one_pass, 1);
    assert!(stored.is_starter);
    // The other roster player is untouched.
    let other = store.find_record(set_id, 9).unwrap().unwrap();
    assert_eq!(other.counters, StatCounters::default());
}

#[test]
fn concurrent_increments_are_not_lost() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let recorder = ActionRecorder::new(&store);
                for _ in 0..50 {
                    recorder.record_kill(set_id, 7).unwrap();
                }
            });
        }
    });

    let record = store.find_record(set_id, 7).unwrap().unwrap();
    assert_eq!(record.counters.kills, 200);
    assert_eq!(record.counters.attack_attempts, 200);
}

#[test]
fn concurrent_points_are_not_lost() {
    let store = MemoryStore::new();
    let set_id = seeded(&store);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let tracker = SetTracker::new(&store);
                for _ in 0..50 {
                    tracker.record_home_point(set_id).unwrap();
                    tracker.record_opponent_point(set_id).unwrap();
                }
            });
        }
    });

    let set = store.find_set(set_id).unwrap().unwrap();
    assert_eq!((set.home_score, set.opponent_score), (200, 200));
}

#[test]
fn points_from_two_handles_on_one_file_add_up() {
    let dir = std::env::temp_dir().join(format!("volley_stats_points_{}", std::process::id()));
    let path = dir.join("points.sqlite");
    let _ = std::fs::remove_file(&path);

    let first = SqliteStore::open(&path).unwrap();
    let second = SqliteStore::open(&path).unwrap();
    let set_id = seeded(&first);

    std::thread::scope(|scope| {
        for store in [&first, &second] {
            scope.spawn(move || {
                let tracker = SetTracker::new(store);
                let recorder = ActionRecorder::new(store);
                for _ in 0..150 {
                    tracker.record_home_point(set_id).unwrap();
                    recorder.record_dig(set_id, 7).unwrap();
                }
            });
        }
    });

    let set = first.find_set(set_id).unwrap().unwrap();
    assert_eq!(set.home_score, 300);
    let record = second.find_record(set_id, 7).unwrap().unwrap();
    assert_eq!(record.counters.digs, 300);

    drop((first, second));
    let _ = std::fs::remove_dir_all(&dir);
}
