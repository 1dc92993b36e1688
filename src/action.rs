use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StatError;
use crate::record::Counter;

/// Reception quality on the 0-3 scale. Zero is an ace against or reception error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassGrade {
    Zero,
    One,
    Two,
    Three,
}

impl PassGrade {
    pub fn value(self) -> u8 {
        match self {
            PassGrade::Zero => 0,
            PassGrade::One => 1,
            PassGrade::Two => 2,
            PassGrade::Three => 3,
        }
    }
}

impl TryFrom<i32> for PassGrade {
    type Error = StatError;

    fn try_from(rating: i32) -> Result<Self, Self::Error> {
        match rating {
            0 => Ok(PassGrade::Zero),
            1 => Ok(PassGrade::One),
            2 => Ok(PassGrade::Two),
            3 => Ok(PassGrade::Three),
            other => Err(StatError::InvalidArgument(format!(
                "pass rating must be between 0 and 3, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Kill,
    AttackAttempt,
    KillError,
    ServiceAce,
    ServiceAttempt,
    ServiceError,
    Dig,
    DigError,
    Block,
    BlockError,
    Assist,
    SetAttempt,
    SetError,
    Pass(PassGrade),
}

impl Action {
    pub const ALL_NAMED: [Action; 13] = [
        Action::Kill,
        Action::AttackAttempt,
        Action::KillError,
        Action::ServiceAce,
        Action::ServiceAttempt,
        Action::ServiceError,
        Action::Dig,
        Action::DigError,
        Action::Block,
        Action::BlockError,
        Action::Assist,
        Action::SetAttempt,
        Action::SetError,
    ];

    /// Counters bumped by one when this action is recorded.
    ///
    /// Outcomes of a category with an attempt counter (hitting, serving, setting) always
    /// carry that attempt counter too. Dig and block outcomes stand alone, and the four
    /// pass buckets together already form the attempt count.
    pub fn counters(self) -> &'static [Counter] {
        use Counter::*;
        match self {
            Action::Kill => &[Kills, AttackAttempts],
            Action::AttackAttempt => &[AttackAttempts],
            Action::KillError => &[KillErrors, AttackAttempts],
            Action::ServiceAce => &[ServiceAce, ServiceAttempt],
            Action::ServiceAttempt => &[ServiceAttempt],
            Action::ServiceError => &[ServiceError, ServiceAttempt],
            Action::Dig => &[Digs],
            Action::DigError => &[DigError],
            Action::Block => &[Blocks],
            Action::BlockError => &[BlockError],
            Action::Assist => &[Assists, SetAttempts],
            Action::SetAttempt => &[SetAttempts],
            Action::SetError => &[SetError, SetAttempts],
            Action::Pass(PassGrade::Zero) => &[ZeroPass],
            Action::Pass(PassGrade::One) => &[OnePass],
            Action::Pass(PassGrade::Two) => &[TwoPass],
            Action::Pass(PassGrade::Three) => &[ThreePass],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Kill => "kill",
            Action::AttackAttempt => "attack-attempt",
            Action::KillError => "kill-error",
            Action::ServiceAce => "service-ace",
            Action::ServiceAttempt => "service-attempt",
            Action::ServiceError => "service-error",
            Action::Dig => "dig",
            Action::DigError => "dig-error",
            Action::Block => "block",
            Action::BlockError => "block-error",
            Action::Assist => "assist",
            Action::SetAttempt => "set-attempt",
            Action::SetError => "set-error",
            Action::Pass(PassGrade::Zero) => "pass-0",
            Action::Pass(PassGrade::One) => "pass-1",
            Action::Pass(PassGrade::Two) => "pass-2",
            Action::Pass(PassGrade::Three) => "pass-3",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = StatError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.trim().to_ascii_lowercase().replace('_', "-");
        if let Some(rating) = name.strip_prefix("pass-") {
            let rating = rating.parse::<i32>().map_err(|_| {
                StatError::InvalidArgument(format!("pass rating must be a number, got {rating:?}"))
            })?;
            return PassGrade::try_from(rating).map(Action::Pass);
        }
        Action::ALL_NAMED
            .iter()
            .copied()
            .find(|action| action.name() == name)
            .ok_or_else(|| StatError::InvalidArgument(format!("unknown action {raw:?}")))
    }
}
