use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Aggregator, RefreshOutcome};

/// Background loop that polls the aggregator and refreshes when stale.
///
/// Shutdown is observed between polls only; a cycle already running is
/// allowed to finish.
pub struct RefreshScheduler {
    aggregator: Arc<Aggregator>,
    poll_interval: Duration,
}

impl RefreshScheduler {
    pub fn new(aggregator: Arc<Aggregator>, poll_interval: Duration) -> Self {
        Self {
            aggregator,
            poll_interval,
        }
    }

    pub fn spawn(
        aggregator: Arc<Aggregator>,
        poll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let scheduler = Self::new(aggregator, poll_interval);
        tokio::spawn(scheduler.run(shutdown))
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_secs = self.poll_interval.as_secs(),
            refresh_secs = self.aggregator.refresh_interval().as_secs(),
            "refresh scheduler started"
        );
        self.aggregator.reload().await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("refresh scheduler stopped");
    }

    /// One poll: refresh if stale, otherwise do nothing
    pub async fn tick(&self) -> RefreshOutcome {
        if !self.aggregator.should_refresh().await {
            debug!("data is fresh, skipping refresh");
            return RefreshOutcome::Fresh;
        }
        info!("data is stale, refreshing");
        self.aggregator.refresh_if_stale().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Catalog, EngagementMetrics, Platform, VideoSpec};
    use crate::persistence::SnapshotStore;
    use crate::source::MockMetricSource;

    fn aggregator(dir: &std::path::Path, source: MockMetricSource) -> Arc<Aggregator> {
        let catalog = Arc::new(Catalog::new(vec![VideoSpec {
            key: "kings".to_string(),
            name: "Kings".to_string(),
            platforms: [(Platform::Youtube, "https://youtu.be/k".to_string())]
                .into_iter()
                .collect(),
        }]));
        let store = SnapshotStore::new(dir.join("data.json"), catalog.clone());
        Arc::new(Aggregator::new(
            catalog,
            Arc::new(source),
            store,
            Duration::from_secs(3600),
        ))
    }

    #[tokio::test]
    async fn tick_refreshes_only_when_stale() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(EngagementMetrics::new(5, 1, 0)));
        let scheduler = RefreshScheduler::new(aggregator(dir.path(), source), Duration::from_secs(60));

        assert!(scheduler.tick().await.is_refreshed());
        assert_eq!(scheduler.tick().await, RefreshOutcome::Fresh);
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source
            .expect_fetch()
            .returning(|_, _| Ok(EngagementMetrics::new(5, 1, 0)));
        let aggregator = aggregator(dir.path(), source);

        let (tx, rx) = watch::channel(false);
        let handle = RefreshScheduler::spawn(aggregator.clone(), Duration::from_millis(10), rx);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !aggregator.snapshot().await.has_samples() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(aggregator.snapshot().await.samples("kings").len(), 1);
    }
}
