use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Catalog, Roster, Snapshot};
use crate::engine::Aggregator;
use crate::persistence::SnapshotStore;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Read path: every request scores a fresh load of this file
    pub store: SnapshotStore,

    pub catalog: Arc<Catalog>,
    pub roster: Arc<Roster>,

    /// In-process writer, when the scheduler runs alongside the server
    pub aggregator: Option<Arc<Aggregator>>,

    pub refresh_interval: Duration,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: SnapshotStore,
        catalog: Arc<Catalog>,
        roster: Arc<Roster>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            roster,
            aggregator: None,
            refresh_interval,
            start_time: Utc::now(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: Arc<Aggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub async fn load_snapshot(&self) -> Snapshot {
        self.store.load().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.aggregator
            .as_ref()
            .is_some_and(|aggregator| aggregator.is_refreshing())
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
