use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::{self, Metrics};

pub type MatchId = u64;
pub type SetId = u64;
pub type PlayerId = u32;

/// Every counter a stat line tracks. Used by the transition table in `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    AttackAttempts,
    Kills,
    KillErrors,
    ThreePass,
    TwoPass,
    OnePass,
    ZeroPass,
    ServiceAttempt,
    ServiceError,
    ServiceAce,
    Digs,
    DigError,
    Blocks,
    BlockError,
    SetAttempts,
    SetError,
    Assists,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounters {
    // Hitting
    pub attack_attempts: u32,
    pub kills: u32,
    pub kill_errors: u32,

    // Passing (reception), one bucket per rating
    pub three_pass: u32,
    pub two_pass: u32,
    pub one_pass: u32,
    pub zero_pass: u32,

    // Serving
    pub service_attempt: u32,
    pub service_error: u32,
    pub service_ace: u32,

    // Digging
    pub digs: u32,
    pub dig_error: u32,

    // Blocking
    pub blocks: u32,
    pub block_error: u32,

    // Setting
    pub set_attempts: u32,
    pub set_error: u32,
    pub assists: u32,
}

impl StatCounters {
    pub fn get(&self, counter: Counter) -> u32 {
        *self.slot(counter)
    }

    pub fn bump(&mut self, counter: Counter) {
        let slot = self.slot_mut(counter);
        *slot = slot.saturating_add(1);
    }

    pub fn total_passes(&self) -> u32 {
        self.three_pass
            .saturating_add(self.two_pass)
            .saturating_add(self.one_pass)
            .saturating_add(self.zero_pass)
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            hitting_percentage: metrics::hitting_percentage(
                self.kills,
                self.kill_errors,
                self.attack_attempts,
            ),
            pass_rating: metrics::pass_rating(
                self.three_pass,
                self.two_pass,
                self.one_pass,
                self.zero_pass,
            ),
            service_percentage: metrics::service_percentage(
                self.service_attempt,
                self.service_error,
            ),
        }
    }

    fn slot(&self, counter: Counter) -> &u32 {
        match counter {
            Counter::AttackAttempts => &self.attack_attempts,
            Counter::Kills => &self.kills,
            Counter::KillErrors => &self.kill_errors,
            Counter::ThreePass => &self.three_pass,
            Counter::TwoPass => &self.two_pass,
            Counter::OnePass => &self.one_pass,
            Counter::ZeroPass => &self.zero_pass,
            Counter::ServiceAttempt => &self.service_attempt,
            Counter::ServiceError => &self.service_error,
            Counter::ServiceAce => &self.service_ace,
            Counter::Digs => &self.digs,
            Counter::DigError => &self.dig_error,
            Counter::Blocks => &self.blocks,
            Counter::BlockError => &self.block_error,
            Counter::SetAttempts => &self.set_attempts,
            Counter::SetError => &self.set_error,
            Counter::Assists => &self.assists,
        }
    }

    fn slot_mut(&mut self, counter: Counter) -> &mut u32 {
        match counter {
            Counter::AttackAttempts => &mut self.attack_attempts,
            Counter::Kills => &mut self.kills,
            Counter::KillErrors => &mut self.kill_errors,
            Counter::ThreePass => &mut self.three_pass,
            Counter::TwoPass => &mut self.two_pass,
            Counter::OnePass => &mut self.one_pass,
            Counter::ZeroPass => &mut self.zero_pass,
            Counter::ServiceAttempt => &mut self.service_attempt,
            Counter::ServiceError => &mut self.service_error,
            Counter::ServiceAce => &mut self.service_ace,
            Counter::Digs => &mut self.digs,
            Counter::DigError => &mut self.dig_error,
            Counter::Blocks => &mut self.blocks,
            Counter::BlockError => &mut self.block_error,
            Counter::SetAttempts => &mut self.set_attempts,
            Counter::SetError => &mut self.set_error,
            Counter::Assists => &mut self.assists,
        }
    }
}

/// Saturates at `u32::MAX`, like `bump`.
impl AddAssign<&StatCounters> for StatCounters {
    fn add_assign(&mut self, other: &StatCounters) {
        self.attack_attempts = self.attack_attempts.saturating_add(other.attack_attempts);
        self.kills = self.kills.saturating_add(other.kills);
        self.kill_errors = self.kill_errors.saturating_add(other.kill_errors);
        self.three_pass = self.three_pass.saturating_add(other.three_pass);
        self.two_pass = self.two_pass.saturating_add(other.two_pass);
        self.one_pass = self.one_pass.saturating_add(other.one_pass);
        self.zero_pass = self.zero_pass.saturating_add(other.zero_pass);
        self.service_attempt = self.service_attempt.saturating_add(other.service_attempt);
        self.service_error = self.service_error.saturating_add(other.service_error);
        self.service_ace = self.service_ace.saturating_add(other.service_ace);
        self.digs = self.digs.saturating_add(other.digs);
        self.dig_error = self.dig_error.saturating_add(other.dig_error);
        self.blocks = self.blocks.saturating_add(other.blocks);
        self.block_error = self.block_error.saturating_add(other.block_error);
        self.set_attempts = self.set_attempts.saturating_add(other.set_attempts);
        self.set_error = self.set_error.saturating_add(other.set_error);
        self.assists = self.assists.saturating_add(other.assists);
    }
}

/// One player's counters for one set. Identity never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    id: Uuid,
    set_id: SetId,
    player_id: PlayerId,
    pub is_starter: bool,
    #[serde(flatten)]
    pub counters: StatCounters,
    pub updated_at: DateTime<Utc>,
}

impl StatRecord {
    pub fn new(set_id: SetId, player_id: PlayerId, is_starter: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            set_id,
            player_id,
            is_starter,
            counters: StatCounters::default(),
            updated_at: Utc::now(),
        }
    }

    /// Rebuilds a record loaded from storage.
    pub fn from_parts(
        id: Uuid,
        set_id: SetId,
        player_id: PlayerId,
        is_starter: bool,
        counters: StatCounters,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            set_id,
            player_id,
            is_starter,
            counters,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_id(&self) -> SetId {
        self.set_id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn hitting_percentage(&self) -> f64 {
        metrics::hitting_percentage(
            self.counters.kills,
            self.counters.kill_errors,
            self.counters.attack_attempts,
        )
    }

    pub fn pass_rating(&self) -> f64 {
        metrics::pass_rating(
            self.counters.three_pass,
            self.counters.two_pass,
            self.counters.one_pass,
            self.counters.zero_pass,
        )
    }

    pub fn view(&self) -> StatLineView {
        StatLineView {
            record: self.clone(),
            metrics: self.counters.metrics(),
        }
    }
}

/// A stat record with its derived percentages attached, as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLineView {
    #[serde(flatten)]
    pub record: StatRecord,
    #[serde(flatten)]
    pub metrics: Metrics,
}
