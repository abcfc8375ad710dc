//! Aggregation engine: refresh cycles, scoring and the background scheduler

mod aggregator;
mod scheduler;
pub mod scorer;

pub use aggregator::{Aggregator, RefreshOutcome, RefreshStatus};
pub use scheduler::RefreshScheduler;
pub use scorer::{weighted_player_scores, Scorer};
