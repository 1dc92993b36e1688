use thiserror::Error;

use crate::record::{MatchId, PlayerId, SetId};

#[derive(Debug, Error)]
pub enum StatError {
    #[error(
        "stat record not found for set {set_id} and player {player_id}; ensure the set was started"
    )]
    NotFound { set_id: SetId, player_id: PlayerId },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("set {0} not found")]
    SetNotFound(SetId),

    #[error("stat record already exists for set {set_id} and player {player_id}")]
    Duplicate { set_id: SetId, player_id: PlayerId },

    #[error("storage: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for StatError {
    fn from(err: rusqlite::Error) -> Self {
        StatError::Storage(err.to_string())
    }
}

pub type StatResult<T> = Result<T, StatError>;
