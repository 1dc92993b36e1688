use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use crate::action::{Action, PassGrade};
use crate::error::{StatError, StatResult};
use crate::record::{PlayerId, SetId};
use crate::recorder::ActionRecorder;
use crate::sets::{MatchSummary, SetTracker, Side};
use crate::store::{MatchStore, RosterSlot, StatStore};

const SETS_TO_WIN: u32 = 3;
const MAX_EXCHANGES: usize = 8;

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub opponent: String,
    pub roster: Vec<RosterSlot>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            opponent: "Scrimmage".to_string(),
            roster: (1..=10)
                .map(|player_id| RosterSlot {
                    player_id,
                    is_starter: player_id <= 6,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulatedMatch {
    pub summary: MatchSummary,
    pub actions_recorded: usize,
}

/// Plays a synthetic best-of-five match into `store`, recording every touch of the home
/// side as it would be scored live.
pub fn simulate_match<S, R>(
    store: &S,
    rng: &mut R,
    opts: &SimOptions,
) -> StatResult<SimulatedMatch>
where
    S: StatStore + MatchStore + ?Sized,
    R: Rng,
{
    let mut starters: Vec<PlayerId> = opts
        .roster
        .iter()
        .filter(|slot| slot.is_starter)
        .map(|slot| slot.player_id)
        .collect();
    if starters.is_empty() {
        starters = opts.roster.iter().take(6).map(|slot| slot.player_id).collect();
    }
    if starters.len() < 2 {
        return Err(StatError::InvalidArgument(
            "simulation needs at least two starters".to_string(),
        ));
    }

    let tracker = SetTracker::new(store);
    let recorder = ActionRecorder::new(store);
    let info = tracker.create_match(&opts.opponent, Utc::now().date_naive())?;

    let mut rally = Rally {
        recorder: &recorder,
        starters: &starters,
        actions: 0,
    };
    let (mut home_sets, mut opp_sets) = (0u32, 0u32);
    let mut home_serving = rng.gen_bool(0.5);
    let mut rotation = 0usize;

    while home_sets < SETS_TO_WIN && opp_sets < SETS_TO_WIN {
        let set = tracker.start_set(info.id, &opts.roster)?;
        let target = if set.set_number == 5 { 15 } else { 25 };
        let (mut home, mut opp) = (0u32, 0u32);
        while !set_over(home, opp, target) {
            let server = starters[rotation % starters.len()];
            let winner = rally.play(set.id, home_serving, server, rng)?;
            tracker.record_point(set.id, winner)?;
            match winner {
                Side::Home => {
                    home += 1;
                    if !home_serving {
                        rotation += 1;
                    }
                    home_serving = true;
                }
                Side::Opponent => {
                    opp += 1;
                    home_serving = false;
                }
            }
        }
        if home > opp {
            home_sets += 1;
        } else {
            opp_sets += 1;
        }
    }

    Ok(SimulatedMatch {
        summary: tracker.match_summary(info.id)?,
        actions_recorded: rally.actions,
    })
}

fn set_over(home: u32, opp: u32, target: u32) -> bool {
    (home >= target || opp >= target) && home.abs_diff(opp) >= 2
}

struct Rally<'a, S: StatStore + ?Sized> {
    recorder: &'a ActionRecorder<'a, S>,
    starters: &'a [PlayerId],
    actions: usize,
}

impl<S: StatStore + ?Sized> Rally<'_, S> {
    fn play<R: Rng>(
        &mut self,
        set_id: SetId,
        home_serving: bool,
        server: PlayerId,
        rng: &mut R,
    ) -> StatResult<Side> {
        if home_serving {
            if rng.gen_bool(0.08) {
                self.record(set_id, server, Action::ServiceAce)?;
                return Ok(Side::Home);
            }
            if rng.gen_bool(0.12) {
                self.record(set_id, server, Action::ServiceError)?;
                return Ok(Side::Opponent);
            }
            self.record(set_id, server, Action::ServiceAttempt)?;
            // Opponent attacks first after a serve in play.
            if let Some(side) = self.defend(set_id, rng)? {
                return Ok(side);
            }
        } else {
            let passer = self.pick_player(rng);
            let grade = match rng.gen_range(0..10) {
                0 => PassGrade::Zero,
                1..=2 => PassGrade::One,
                3..=5 => PassGrade::Two,
                _ => PassGrade::Three,
            };
            self.record(set_id, passer, Action::Pass(grade))?;
            if grade == PassGrade::Zero {
                return Ok(Side::Opponent);
            }
        }

        for _ in 0..MAX_EXCHANGES {
            if let Some(side) = self.attack(set_id, rng)? {
                return Ok(side);
            }
            if let Some(side) = self.defend(set_id, rng)? {
                return Ok(side);
            }
        }
        Ok(if rng.gen_bool(0.5) {
            Side::Home
        } else {
            Side::Opponent
        })
    }

    fn attack<R: Rng>(&mut self, set_id: SetId, rng: &mut R) -> StatResult<Option<Side>> {
        let setter = self.starters[0];
        let hitter = self.starters[rng.gen_range(1..self.starters.len())];
        if rng.gen_bool(0.05) {
            self.record(set_id, setter, Action::SetError)?;
            return Ok(Some(Side::Opponent));
        }
        match rng.gen_range(0..100) {
            0..=39 => {
                self.record(set_id, setter, Action::Assist)?;
                self.record(set_id, hitter, Action::Kill)?;
                Ok(Some(Side::Home))
            }
            40..=54 => {
                self.record(set_id, setter, Action::SetAttempt)?;
                self.record(set_id, hitter, Action::KillError)?;
                Ok(Some(Side::Opponent))
            }
            _ => {
                self.record(set_id, setter, Action::SetAttempt)?;
                self.record(set_id, hitter, Action::AttackAttempt)?;
                Ok(None)
            }
        }
    }

    fn defend<R: Rng>(&mut self, set_id: SetId, rng: &mut R) -> StatResult<Option<Side>> {
        let defender = self.pick_player(rng);
        match rng.gen_range(0..100) {
            0..=9 => {
                self.record(set_id, defender, Action::Block)?;
                Ok(Some(Side::Home))
            }
            10..=14 => {
                self.record(set_id, defender, Action::BlockError)?;
                Ok(Some(Side::Opponent))
            }
            15..=44 => {
                self.record(set_id, defender, Action::DigError)?;
                Ok(Some(Side::Opponent))
            }
            45..=54 => Ok(Some(Side::Home)),
            _ => {
                self.record(set_id, defender, Action::Dig)?;
                Ok(None)
            }
        }
    }

    fn pick_player<R: Rng>(&self, rng: &mut R) -> PlayerId {
        self.starters[rng.gen_range(0..self.starters.len())]
    }

    fn record(&mut self, set_id: SetId, player_id: PlayerId, action: Action) -> StatResult<()> {
        self.recorder.record(set_id, player_id, action)?;
        self.actions += 1;
        Ok(())
    }
}
