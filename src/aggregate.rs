use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StatResult;
use crate::metrics::Metrics;
use crate::record::{MatchId, PlayerId, StatCounters, StatRecord};
use crate::store::StatStore;

/// Counters summed over a match, for one player or (with no player id) the whole team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTotals {
    pub match_id: MatchId,
    pub player_id: Option<PlayerId>,
    #[serde(flatten)]
    pub counters: StatCounters,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl MatchTotals {
    pub fn player(match_id: MatchId, player_id: PlayerId, records: &[StatRecord]) -> Self {
        Self::from_records(match_id, Some(player_id), records)
    }

    pub fn team(match_id: MatchId, records: &[StatRecord]) -> Self {
        Self::from_records(match_id, None, records)
    }

    pub fn is_team(&self) -> bool {
        self.player_id.is_none()
    }

    fn from_records(
        match_id: MatchId,
        player_id: Option<PlayerId>,
        records: &[StatRecord],
    ) -> Self {
        let counters = fold_counters(records);
        Self {
            match_id,
            player_id,
            counters,
            metrics: counters.metrics(),
        }
    }
}

/// Per-player totals plus the team line for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub match_id: MatchId,
    pub players: Vec<MatchTotals>,
    pub team: MatchTotals,
}

/// Sums raw counters. Attempt counters were already bumped at write time, so plain
/// addition composes, and the result does not depend on record order.
pub fn fold_counters(records: &[StatRecord]) -> StatCounters {
    records
        .par_iter()
        .fold(StatCounters::default, |mut acc, record| {
            acc += &record.counters;
            acc
        })
        .reduce(StatCounters::default, |mut left, right| {
            left += &right;
            left
        })
}

pub struct MatchAggregator<'a, S: StatStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: StatStore + ?Sized> MatchAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All-zero totals when the player has no records in the match.
    pub fn individual_match_totals(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> StatResult<MatchTotals> {
        let records = self.store.records_for_player_in_match(match_id, player_id)?;
        debug!(match_id, player_id, records = records.len(), "aggregating player totals");
        Ok(MatchTotals::player(match_id, player_id, &records))
    }

    pub fn team_match_totals(&self, match_id: MatchId) -> StatResult<MatchTotals> {
        let records = self.store.records_for_match(match_id)?;
        debug!(match_id, records = records.len(), "aggregating team totals");
        Ok(MatchTotals::team(match_id, &records))
    }

    /// Players ordered by id; the team line covers the same records.
    pub fn box_score(&self, match_id: MatchId) -> StatResult<BoxScore> {
        let records = self.store.records_for_match(match_id)?;
        let mut by_player: BTreeMap<PlayerId, Vec<StatRecord>> = BTreeMap::new();
        for record in &records {
            by_player
                .entry(record.player_id())
                .or_default()
                .push(record.clone());
        }
        let players = by_player
            .iter()
            .map(|(player_id, lines)| MatchTotals::player(match_id, *player_id, lines))
            .collect();
        Ok(BoxScore {
            match_id,
            players,
            team: MatchTotals::team(match_id, &records),
        })
    }
}
