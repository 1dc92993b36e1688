use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StatError, StatResult};
use crate::record::{MatchId, PlayerId, SetId, StatRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub id: MatchId,
    pub opponent: String,
    pub played_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    pub id: SetId,
    pub match_id: MatchId,
    pub set_number: u32,
    pub home_score: u32,
    pub opponent_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub player_id: PlayerId,
    pub is_starter: bool,
}

/// Keyed storage for stat records. At most one record exists per (set, player).
pub trait StatStore: Send + Sync {
    /// Fails with `Duplicate` if a record for the same (set, player) already exists.
    fn insert_record(&self, record: &StatRecord) -> StatResult<()>;

    fn find_record(&self, set_id: SetId, player_id: PlayerId) -> StatResult<Option<StatRecord>>;

    fn records_for_player_in_match(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> StatResult<Vec<StatRecord>>;

    fn records_for_match(&self, match_id: MatchId) -> StatResult<Vec<StatRecord>>;

    /// Overwrites the stored counters of an existing record.
    fn save_record(&self, record: &StatRecord) -> StatResult<()>;

    /// Read-modify-write of one record as a single unit.
    ///
    /// When `apply` fails nothing is written. The default goes through `find_record` and
    /// `save_record` without isolation; stores that can serialize writers per key override it.
    fn update_record(
        &self,
        set_id: SetId,
        player_id: PlayerId,
        apply: &mut dyn FnMut(&mut StatRecord) -> StatResult<()>,
    ) -> StatResult<StatRecord> {
        let mut record = self
            .find_record(set_id, player_id)?
            .ok_or(StatError::NotFound { set_id, player_id })?;
        apply(&mut record)?;
        self.save_record(&record)?;
        Ok(record)
    }
}

/// Matches and their sets, the owners of stat records.
pub trait MatchStore: Send + Sync {
    fn insert_match(&self, opponent: &str, played_on: NaiveDate) -> StatResult<MatchInfo>;

    fn find_match(&self, match_id: MatchId) -> StatResult<Option<MatchInfo>>;

    /// Creates the next set of a match plus one zeroed stat record per roster slot.
    /// Fails with `Duplicate`, creating nothing, if the roster names a player twice.
    fn create_set(&self, match_id: MatchId, roster: &[RosterSlot]) -> StatResult<SetInfo>;

    fn find_set(&self, set_id: SetId) -> StatResult<Option<SetInfo>>;

    /// Sets of a match ordered by set number.
    fn sets_for_match(&self, match_id: MatchId) -> StatResult<Vec<SetInfo>>;

    fn save_set(&self, set: &SetInfo) -> StatResult<()>;

    /// Read-modify-write of one set's scores, with the same guarantees as
    /// `StatStore::update_record`.
    fn update_set(
        &self,
        set_id: SetId,
        apply: &mut dyn FnMut(&mut SetInfo) -> StatResult<()>,
    ) -> StatResult<SetInfo> {
        let mut set = self
            .find_set(set_id)?
            .ok_or(StatError::SetNotFound(set_id))?;
        apply(&mut set)?;
        self.save_set(&set)?;
        Ok(set)
    }

    /// Removes the match, its sets and their stat records. Returns false if it did not exist.
    fn delete_match(&self, match_id: MatchId) -> StatResult<bool>;
}

/// First player id that appears more than once in `roster`.
pub fn first_repeated_player(roster: &[RosterSlot]) -> Option<PlayerId> {
    let mut seen = HashSet::new();
    roster
        .iter()
        .map(|slot| slot.player_id)
        .find(|player_id| !seen.insert(*player_id))
}
