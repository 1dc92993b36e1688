use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};

use crate::error::{StatError, StatResult};
use crate::record::{MatchId, PlayerId, SetId, StatRecord};
use crate::store::{
    MatchInfo, MatchStore, RosterSlot, SetInfo, StatStore, first_repeated_player,
};

/// In-process store. One lock guards everything, so every update is serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_match_id: MatchId,
    next_set_id: SetId,
    matches: BTreeMap<MatchId, MatchInfo>,
    sets: BTreeMap<SetId, SetInfo>,
    records: BTreeMap<(SetId, PlayerId), StatRecord>,
}

impl Inner {
    fn set_ids_for_match(&self, match_id: MatchId) -> HashSet<SetId> {
        self.sets
            .values()
            .filter(|set| set.match_id == match_id)
            .map(|set| set.id)
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StatResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StatError::Storage("memory store lock poisoned".to_string()))
    }
}

impl StatStore for MemoryStore {
    fn insert_record(&self, record: &StatRecord) -> StatResult<()> {
        let mut inner = self.lock()?;
        let key = (record.set_id(), record.player_id());
        if inner.records.contains_key(&key) {
            return Err(StatError::Duplicate {
                set_id: key.0,
                player_id: key.1,
            });
        }
        inner.records.insert(key, record.clone());
        Ok(())
    }

    fn find_record(&self, set_id: SetId, player_id: PlayerId) -> StatResult<Option<StatRecord>> {
        let inner = self.lock()?;
        Ok(inner.records.get(&(set_id, player_id)).cloned())
    }

    fn records_for_player_in_match(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> StatResult<Vec<StatRecord>> {
        let inner = self.lock()?;
        let set_ids = inner.set_ids_for_match(match_id);
        Ok(inner
            .records
            .values()
            .filter(|r| r.player_id() == player_id && set_ids.contains(&r.set_id()))
            .cloned()
            .collect())
    }

    fn records_for_match(&self, match_id: MatchId) -> StatResult<Vec<StatRecord>> {
        let inner = self.lock()?;
        let set_ids = inner.set_ids_for_match(match_id);
        Ok(inner
            .records
            .values()
            .filter(|r| set_ids.contains(&r.set_id()))
            .cloned()
            .collect())
    }

    fn save_record(&self, record: &StatRecord) -> StatResult<()> {
        let mut inner = self.lock()?;
        let set_id = record.set_id();
        let player_id = record.player_id();
        match inner.records.get_mut(&(set_id, player_id)) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(StatError::NotFound { set_id, player_id }),
        }
    }

    fn update_record(
        &self,
        set_id: SetId,
        player_id: PlayerId,
        apply: &mut dyn FnMut(&mut StatRecord) -> StatResult<()>,
    ) -> StatResult<StatRecord> {
        let mut inner = self.lock()?;
        let slot = inner
            .records
            .get_mut(&(set_id, player_id))
            .ok_or(StatError::NotFound { set_id, player_id })?;
        // Work on a copy so a failed apply leaves the stored record untouched.
        let mut next = slot.clone();
        apply(&mut next)?;
        *slot = next.clone();
        Ok(next)
    }
}

impl MatchStore for MemoryStore {
    fn insert_match(&self, opponent: &str, played_on: NaiveDate) -> StatResult<MatchInfo> {
        let mut inner = self.lock()?;
        inner.next_match_id += 1;
        let info = MatchInfo {
            id: inner.next_match_id,
            opponent: opponent.to_string(),
            played_on,
            created_at: Utc::now(),
        };
        inner.matches.insert(info.id, info.clone());
        Ok(info)
    }

    fn find_match(&self, match_id: MatchId) -> StatResult<Option<MatchInfo>> {
        let inner = self.lock()?;
        Ok(inner.matches.get(&match_id).cloned())
    }

    fn create_set(&self, match_id: MatchId, roster: &[RosterSlot]) -> StatResult<SetInfo> {
        let mut inner = self.lock()?;
        if !inner.matches.contains_key(&match_id) {
            return Err(StatError::MatchNotFound(match_id));
        }
        let next_set_id = inner.next_set_id + 1;
        if let Some(player_id) = first_repeated_player(roster) {
            return Err(StatError::Duplicate {
                set_id: next_set_id,
                player_id,
            });
        }
        let existing = inner.set_ids_for_match(match_id).len() as u32;
        inner.next_set_id = next_set_id;
        let set = SetInfo {
            id: next_set_id,
            match_id,
            set_number: existing + 1,
            home_score: 0,
            opponent_score: 0,
        };
        inner.sets.insert(set.id, set.clone());
        for slot in roster {
            let record = StatRecord::new(set.id, slot.player_id, slot.is_starter);
            inner.records.insert((set.id, slot.player_id), record);
        }
        Ok(set)
    }

    fn find_set(&self, set_id: SetId) -> StatResult<Option<SetInfo>> {
        let inner = self.lock()?;
        Ok(inner.sets.get(&set_id).cloned())
    }

    fn sets_for_match(&self, match_id: MatchId) -> StatResult<Vec<SetInfo>> {
        let inner = self.lock()?;
        let mut sets: Vec<SetInfo> = inner
            .sets
            .values()
            .filter(|set| set.match_id == match_id)
            .cloned()
            .collect();
        sets.sort_by_key(|set| set.set_number);
        Ok(sets)
    }

    fn save_set(&self, set: &SetInfo) -> StatResult<()> {
        let mut inner = self.lock()?;
        match inner.sets.get_mut(&set.id) {
            Some(slot) => {
                *slot = set.clone();
                Ok(())
            }
            None => Err(StatError::SetNotFound(set.id)),
        }
    }

    fn update_set(
        &self,
        set_id: SetId,
        apply: &mut dyn FnMut(&mut SetInfo) -> StatResult<()>,
    ) -> StatResult<SetInfo> {
        let mut inner = self.lock()?;
        let slot = inner
            .sets
            .get_mut(&set_id)
            .ok_or(StatError::SetNotFound(set_id))?;
        let mut next = slot.clone();
        apply(&mut next)?;
        *slot = next.clone();
        Ok(next)
    }

    fn delete_match(&self, match_id: MatchId) -> StatResult<bool> {
        let mut inner = self.lock()?;
        if inner.matches.remove(&match_id).is_none() {
            return Ok(false);
        }
        let set_ids = inner.set_ids_for_match(match_id);
        inner.sets.retain(|id, _| !set_ids.contains(id));
        inner
            .records
            .retain(|(set_id, _), _| !set_ids.contains(set_id));
        Ok(true)
    }
}
