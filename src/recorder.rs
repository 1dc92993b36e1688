use chrono::Utc;
use tracing::{debug, warn};

use crate::action::{Action, PassGrade};
use crate::error::{StatError, StatResult};
use crate::record::{PlayerId, SetId, StatRecord};
use crate::store::StatStore;

/// Applies observed plays to the stat record of one player in one set.
///
/// Every call is one real-world action: nothing is deduplicated, and each call reads,
/// bumps and persists the record through the store's atomic update.
pub struct ActionRecorder<'a, S: StatStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: StatStore + ?Sized> ActionRecorder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn stat_line(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.store
            .find_record(set_id, player_id)?
            .ok_or_else(|| not_found(set_id, player_id))
    }

    pub fn record(
        &self,
        set_id: SetId,
        player_id: PlayerId,
        action: Action,
    ) -> StatResult<StatRecord> {
        let mut bump = |record: &mut StatRecord| -> StatResult<()> {
            for counter in action.counters() {
                record.counters.bump(*counter);
            }
            record.updated_at = Utc::now();
            Ok(())
        };
        let result = self.store.update_record(set_id, player_id, &mut bump);
        match result {
            Ok(record) => {
                debug!(set_id, player_id, action = %action, "recorded action");
                Ok(record)
            }
            Err(StatError::NotFound { .. }) => Err(not_found(set_id, player_id)),
            Err(err) => Err(err),
        }
    }

    // Hitting

    pub fn record_kill(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::Kill)
    }

    pub fn record_attack_attempt(
        &self,
        set_id: SetId,
        player_id: PlayerId,
    ) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::AttackAttempt)
    }

    pub fn record_kill_error(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::KillError)
    }

    // Serving

    pub fn record_service_ace(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::ServiceAce)
    }

    pub fn record_service_attempt(
        &self,
        set_id: SetId,
        player_id: PlayerId,
    ) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::ServiceAttempt)
    }

    pub fn record_service_error(
        &self,
        set_id: SetId,
        player_id: PlayerId,
    ) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::ServiceError)
    }

    // Passing

    /// `rating` must be 0..=3. Out of range fails before the store is touched.
    pub fn record_pass_rating(
        &self,
        set_id: SetId,
        player_id: PlayerId,
        rating: i32,
    ) -> StatResult<StatRecord> {
        let grade = PassGrade::try_from(rating).inspect_err(|err| {
            warn!(set_id, player_id, rating, "rejected pass rating: {err}");
        })?;
        self.record(set_id, player_id, Action::Pass(grade))
    }

    // Defense

    pub fn record_dig(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::Dig)
    }

    pub fn record_dig_error(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::DigError)
    }

    pub fn record_block(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::Block)
    }

    pub fn record_block_error(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::BlockError)
    }

    // Setting

    pub fn record_assist(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::Assist)
    }

    pub fn record_set_attempt(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::SetAttempt)
    }

    pub fn record_set_error(&self, set_id: SetId, player_id: PlayerId) -> StatResult<StatRecord> {
        self.record(set_id, player_id, Action::SetError)
    }
}

fn not_found(set_id: SetId, player_id: PlayerId) -> StatError {
    warn!(set_id, player_id, "no stat record for set/player");
    StatError::NotFound { set_id, player_id }
}
