use chrono::NaiveDate;

use volley_stats::aggregate::fold_counters;
use volley_stats::{
    ActionRecorder, MatchAggregator, MatchStore, MatchTotals, MemoryStore, RosterSlot, SqliteStore,
    StatCounters, StatRecord,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 3).unwrap()
}

fn roster(ids: &[u32]) -> Vec<RosterSlot> {
    ids.iter()
        .map(|&player_id| RosterSlot {
            player_id,
            is_starter: true,
        })
        .collect()
}

fn record_with(set_id: u64, player_id: u32, counters: StatCounters) -> StatRecord {
    let mut record = StatRecord::new(set_id, player_id, false);
    record.counters = counters;
    record
}

#[test]
fn hitting_percentage_scenario() {
    let record = record_with(
        1,
        1,
        StatCounters {
            kills: 3,
            kill_errors: 1,
            attack_attempts: 4,
            ..Default::default()
        },
    );
    let totals = MatchTotals::player(1, 1, &[record]);
    assert_eq!(totals.metrics.hitting_percentage, 0.5);
}

#[test]
fn pass_and_service_scenarios() {
    let record = record_with(
        1,
        1,
        StatCounters {
            three_pass: 2,
            two_pass: 1,
            one_pass: 0,
            zero_pass: 1,
            service_attempt: 10,
            service_error: 3,
            ..Default::default()
        },
    );
    let totals = MatchTotals::team(1, &[record]);
    assert_eq!(totals.metrics.pass_rating, 2.0);
    assert_eq!(totals.metrics.service_percentage, 0.7);
    assert!(totals.is_team());
}

#[test]
fn empty_fold_is_all_zero() {
    let totals = MatchTotals::team(5, &[]);
    assert_eq!(totals.counters, StatCounters::default());
    assert_eq!(totals.metrics.hitting_percentage, 0.0);
    assert_eq!(totals.metrics.pass_rating, 0.0);
    assert_eq!(totals.metrics.service_percentage, 0.0);
}

#[test]
fn fold_is_order_independent() {
    let a = record_with(
        1,
        1,
        StatCounters {
            kills: 4,
            attack_attempts: 9,
            digs: 2,
            ..Default::default()
        },
    );
    let b = record_with(
        2,
        1,
        StatCounters {
            kill_errors: 3,
            attack_attempts: 5,
            three_pass: 1,
            assists: 6,
            set_attempts: 8,
            ..Default::default()
        },
    );
    let forward = fold_counters(&[a.clone(), b.clone()]);
    let backward = fold_counters(&[b, a]);
    assert_eq!(forward, backward);
    assert_eq!(forward.attack_attempts, 14);
    assert_eq!(forward.kills, 4);
    assert_eq!(forward.kill_errors, 3);
    assert_eq!(forward.assists, 6);
}

#[test]
fn individual_totals_span_every_set_of_the_match() {
    let store = MemoryStore::new();
    let info = store.insert_match("North", date()).unwrap();
    let other = store.insert_match("South", date()).unwrap();
    let set1 = store.create_set(info.id, &roster(&[1, 2])).unwrap();
    let set2 = store.create_set(info.id, &roster(&[1, 2])).unwrap();
    let elsewhere = store.create_set(other.id, &roster(&[1])).unwrap();

    let recorder = ActionRecorder::new(&store);
    recorder.record_kill(set1.id, 1).unwrap();
    recorder.record_kill_error(set1.id, 1).unwrap();
    recorder.record_kill(set2.id, 1).unwrap();
    recorder.record_attack_attempt(set2.id, 1).unwrap();
    recorder.record_kill(set2.id, 2).unwrap();
    recorder.record_kill(elsewhere.id, 1).unwrap();

    let aggregator = MatchAggregator::new(&store);
    let totals = aggregator.individual_match_totals(info.id, 1).unwrap();
    assert_eq!(totals.player_id, Some(1));
    assert_eq!(totals.match_id, info.id);
    assert_eq!(totals.counters.kills, 2);
    assert_eq!(totals.counters.kill_errors, 1);
    assert_eq!(totals.counters.attack_attempts, 4);
    // (2 - 1) / 4
    assert_eq!(totals.metrics.hitting_percentage, 0.25);

    let team = aggregator.team_match_totals(info.id).unwrap();
    assert_eq!(team.player_id, None);
    assert_eq!(team.counters.kills, 3);
    assert_eq!(team.counters.attack_attempts, 5);
}

#[test]
fn unknown_player_or_match_yields_zero_totals() {
    let store = SqliteStore::open_in_memory().unwrap();
    let info = store.insert_match("East", date()).unwrap();
    store.create_set(info.id, &roster(&[3])).unwrap();

    let aggregator = MatchAggregator::new(&store);
    let totals = aggregator.individual_match_totals(info.id, 99).unwrap();
    assert_eq!(totals.counters, StatCounters::default());
    assert_eq!(totals.metrics.hitting_percentage, 0.0);

    let team = aggregator.team_match_totals(info.id + 50).unwrap();
    assert_eq!(team.counters, StatCounters::default());
}

#[test]
fn box_score_lines_add_up_to_team_line() {
    let store = SqliteStore::open_in_memory().unwrap();
    let info = store.insert_match("West", date()).unwrap();
    let set1 = store.create_set(info.id, &roster(&[4, 2, 8])).unwrap();
    let set2 = store.create_set(info.id, &roster(&[4, 2])).unwrap();

    let recorder = ActionRecorder::new(&store);
    recorder.record_service_ace(set1.id, 4).unwrap();
    recorder.record_service_error(set2.id, 4).unwrap();
    recorder.record_pass_rating(set1.id, 2, 3).unwrap();
    recorder.record_pass_rating(set2.id, 2, 1).unwrap();
    recorder.record_dig(set1.id, 8).unwrap();
    recorder.record_block(set2.id, 2).unwrap();

    let box_score = MatchAggregator::new(&store).box_score(info.id).unwrap();
    let ids: Vec<_> = box_score.players.iter().map(|p| p.player_id).collect();
    assert_eq!(ids, vec![Some(2), Some(4), Some(8)]);

    let mut summed = StatCounters::default();
    for line in &box_score.players {
        summed += &line.counters;
    }
    assert_eq!(summed, box_score.team.counters);
    assert_eq!(box_score.team.counters.service_attempt, 2);
    assert_eq!(box_score.team.metrics.service_percentage, 0.5);
    assert_eq!(box_score.players[0].metrics.pass_rating, 2.0);
}

#[test]
fn fold_saturates_instead_of_overflowing() {
    let records = [
        record_with(
            1,
            1,
            StatCounters {
                digs: u32::MAX,
                ..Default::default()
            },
        ),
        record_with(
            2,
            1,
            StatCounters {
                digs: 1,
                blocks: 2,
                ..Default::default()
            },
        ),
    ];
    let totals = fold_counters(&records);
    assert_eq!(totals.digs, u32::MAX);
    assert_eq!(totals.blocks, 2);
}
