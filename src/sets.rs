use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{StatError, StatResult};
use crate::record::{MatchId, SetId};
use crate::store::{MatchInfo, MatchStore, RosterSlot, SetInfo, first_repeated_player};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(rename = "match")]
    pub match_info: MatchInfo,
    pub sets: Vec<SetInfo>,
    pub home_sets_won: u32,
    pub opponent_sets_won: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Opponent,
}

/// Match and set lifecycle: creating matches, opening sets for a roster, keeping score.
pub struct SetTracker<'a, S: MatchStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MatchStore + ?Sized> SetTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn create_match(&self, opponent: &str, played_on: NaiveDate) -> StatResult<MatchInfo> {
        let opponent = opponent.trim();
        if opponent.is_empty() {
            return Err(StatError::InvalidArgument(
                "opponent name must not be empty".to_string(),
            ));
        }
        let info = self.store.insert_match(opponent, played_on)?;
        info!(match_id = info.id, opponent, "created match");
        Ok(info)
    }

    /// Opens the next set of the match with one zeroed stat record per roster player.
    pub fn start_set(&self, match_id: MatchId, roster: &[RosterSlot]) -> StatResult<SetInfo> {
        if roster.is_empty() {
            return Err(StatError::InvalidArgument(
                "roster must name at least one player".to_string(),
            ));
        }
        if let Some(player_id) = first_repeated_player(roster) {
            return Err(StatError::InvalidArgument(format!(
                "player {player_id} appears twice in the roster"
            )));
        }

        let set = self.store.create_set(match_id, roster).inspect_err(|err| {
            warn!(match_id, "start set failed: {err}");
        })?;
        info!(
            match_id,
            set_id = set.id,
            set_number = set.set_number,
            players = roster.len(),
            "started set"
        );
        Ok(set)
    }

    pub fn set(&self, set_id: SetId) -> StatResult<SetInfo> {
        self.store
            .find_set(set_id)?
            .ok_or(StatError::SetNotFound(set_id))
    }

    pub fn record_home_point(&self, set_id: SetId) -> StatResult<SetInfo> {
        self.record_point(set_id, Side::Home)
    }

    pub fn record_opponent_point(&self, set_id: SetId) -> StatResult<SetInfo> {
        self.record_point(set_id, Side::Opponent)
    }

    pub fn record_point(&self, set_id: SetId, side: Side) -> StatResult<SetInfo> {
        let mut score = |set: &mut SetInfo| -> StatResult<()> {
            match side {
                Side::Home => set.home_score = set.home_score.saturating_add(1),
                Side::Opponent => set.opponent_score = set.opponent_score.saturating_add(1),
            }
            Ok(())
        };
        self.store.update_set(set_id, &mut score)
    }

    pub fn match_summary(&self, match_id: MatchId) -> StatResult<MatchSummary> {
        let match_info = self
            .store
            .find_match(match_id)?
            .ok_or(StatError::MatchNotFound(match_id))?;
        let sets = self.store.sets_for_match(match_id)?;
        let home_sets_won = sets
            .iter()
            .filter(|s| s.home_score > s.opponent_score)
            .count() as u32;
        let opponent_sets_won = sets
            .iter()
            .filter(|s| s.opponent_score > s.home_score)
            .count() as u32;
        Ok(MatchSummary {
            match_info,
            sets,
            home_sets_won,
            opponent_sets_won,
        })
    }

    pub fn delete_match(&self, match_id: MatchId) -> StatResult<()> {
        if !self.store.delete_match(match_id)? {
            return Err(StatError::MatchNotFound(match_id));
        }
        info!(match_id, "deleted match");
        Ok(())
    }
}
