pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod source;

pub use config::AppConfig;
pub use domain::{
    AttributionEntry, Catalog, EngagementMetrics, EngagementSample, Platform, PlayerSpec, Roster,
    Snapshot, VideoSpec,
};
pub use engine::{Aggregator, RefreshOutcome, RefreshScheduler, RefreshStatus, Scorer};
pub use error::{EngagementError, Result};
pub use persistence::SnapshotStore;
pub use source::{EstimatingSource, MetricSource, PageScrapeSource};
