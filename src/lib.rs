pub mod action;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod memory_store;
pub mod metrics;
pub mod record;
pub mod recorder;
pub mod sets;
pub mod simulate;
pub mod sqlite_store;
pub mod store;

pub use action::{Action, PassGrade};
pub use aggregate::{BoxScore, MatchAggregator, MatchTotals};
pub use error::{StatError, StatResult};
pub use memory_store::MemoryStore;
pub use record::{MatchId, PlayerId, SetId, StatCounters, StatRecord};
pub use recorder::ActionRecorder;
pub use sets::{MatchSummary, SetTracker, Side};
pub use sqlite_store::SqliteStore;
pub use store::{MatchInfo, MatchStore, RosterSlot, SetInfo, StatStore};
