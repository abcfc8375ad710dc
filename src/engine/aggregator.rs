//! Aggregator
//!
//! Owns the writable copy of the snapshot. A refresh cycle pulls every
//! `(video, platform)` pair from the metric source, sums the platforms into
//! one sample per video stamped with a single cycle timestamp, appends, and
//! persists once. The snapshot lock is held for the whole cycle, so a caller
//! arriving mid-cycle waits and then finds the snapshot fresh.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Catalog, EngagementSample, PlatformBreakdown, Snapshot};
use crate::persistence::SnapshotStore;
use crate::source::MetricSource;

/// Result of asking for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A cycle ran and appended one sample per catalog video
    Refreshed {
        timestamp: i64,
        videos: usize,
        failed_fetches: usize,
    },
    /// The snapshot was fresh; nothing was fetched
    Fresh,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed { .. })
    }
}

/// Point-in-time view of refresh state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    /// Newest sample timestamp, unix seconds
    pub last_updated: Option<i64>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub refreshing: bool,
    pub refresh_interval_secs: u64,
    pub videos: usize,
    pub samples: usize,
}

impl RefreshStatus {
    pub fn of(snapshot: &Snapshot, now: i64, refresh_interval: Duration, refreshing: bool) -> Self {
        let last_updated = snapshot.latest_timestamp();
        Self {
            last_updated,
            last_updated_at: last_updated.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            stale: snapshot.is_stale_at(now, refresh_interval.as_secs()),
            refreshing,
            refresh_interval_secs: refresh_interval.as_secs(),
            videos: snapshot.video_count(),
            samples: snapshot.sample_count(),
        }
    }
}

pub struct Aggregator {
    catalog: Arc<Catalog>,
    source: Arc<dyn MetricSource>,
    store: SnapshotStore,
    refresh_interval: Duration,
    state: Mutex<Snapshot>,
    refreshing: AtomicBool,
}

/// Clears the in-progress flag however the cycle ends
struct RefreshingGuard<'a>(&'a AtomicBool);

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Aggregator {
    /// Create an aggregator over an empty snapshot; call `reload` to pick up
    /// persisted history.
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn MetricSource>,
        store: SnapshotStore,
        refresh_interval: Duration,
    ) -> Self {
        let empty = Snapshot::empty_for(&catalog);
        Self {
            catalog,
            source,
            store,
            refresh_interval,
            state: Mutex::new(empty),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Create an aggregator seeded from the persisted snapshot
    pub async fn open(
        catalog: Arc<Catalog>,
        source: Arc<dyn MetricSource>,
        store: SnapshotStore,
        refresh_interval: Duration,
    ) -> Self {
        let aggregator = Self::new(catalog, source, store, refresh_interval);
        aggregator.reload().await;
        aggregator
    }

    /// Replace the in-memory snapshot with the persisted one
    pub async fn reload(&self) {
        let loaded = self.store.load().await;
        let mut state = self.state.lock().await;
        info!(
            videos = loaded.video_count(),
            samples = loaded.sample_count(),
            "snapshot loaded"
        );
        *state = loaded;
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Copy of the in-memory snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.clone()
    }

    /// Refresh state of the in-memory snapshot; waits for a running cycle.
    ///
    /// `refreshing` reports whether a cycle was in progress when the call
    /// was made.
    pub async fn status(&self) -> RefreshStatus {
        // the flag is cleared before the cycle releases the lock
        let refreshing = self.is_refreshing();
        let state = self.state.lock().await;
        RefreshStatus::of(
            &state,
            Utc::now().timestamp(),
            self.refresh_interval,
            refreshing,
        )
    }

    /// Whether the in-memory snapshot is stale right now
    pub async fn should_refresh(&self) -> bool {
        let state = self.state.lock().await;
        state.is_stale_at(Utc::now().timestamp(), self.refresh_interval.as_secs())
    }

    /// Run a refresh cycle if, once the lock is held, the snapshot is stale.
    pub async fn refresh_if_stale(&self) -> RefreshOutcome {
        let mut state = self.state.lock().await;
        if !state.is_stale_at(Utc::now().timestamp(), self.refresh_interval.as_secs()) {
            debug!("snapshot is fresh, skipping refresh");
            return RefreshOutcome::Fresh;
        }
        self.run_cycle(&mut state).await
    }

    /// Run a refresh cycle regardless of staleness
    pub async fn force_refresh(&self) -> RefreshOutcome {
        let mut state = self.state.lock().await;
        self.run_cycle(&mut state).await
    }

    async fn run_cycle(&self, snapshot: &mut Snapshot) -> RefreshOutcome {
        self.refreshing.store(true, Ordering::SeqCst);
        let _guard = RefreshingGuard(&self.refreshing);

        let timestamp = Utc::now().timestamp();
        if let Some(latest) = snapshot.latest_timestamp() {
            if timestamp < latest {
                warn!(timestamp, latest, "clock is behind the newest sample");
            }
        }
        info!(timestamp, videos = self.catalog.len(), "starting data refresh");

        let mut failed_fetches = 0;
        for video in self.catalog.videos() {
            let mut breakdown = PlatformBreakdown::new();

            for (platform, locator) in &video.platforms {
                match self.source.fetch(*platform, locator).await {
                    Ok(metrics) => {
                        debug!(
                            video = %video.key,
                            %platform,
                            views = metrics.views,
                            likes = metrics.likes,
                            comments = metrics.comments,
                            "fetched platform metrics"
                        );
                        breakdown.insert(*platform, metrics);
                    }
                    Err(e) => {
                        failed_fetches += 1;
                        warn!(
                            video = %video.key,
                            %platform,
                            error = %e,
                            "platform fetch failed, counting it as zero"
                        );
                    }
                }
            }

            let sample = EngagementSample::from_breakdown(timestamp, breakdown);
            info!(
                video = %video.key,
                views = sample.total_views,
                likes = sample.total_likes,
                comments = sample.total_comments,
                "recorded sample"
            );
            snapshot.append(&video.key, sample);
        }

        self.store.save(snapshot).await;
        info!(timestamp, failed_fetches, "data refresh completed");

        RefreshOutcome::Refreshed {
            timestamp,
            videos: self.catalog.len(),
            failed_fetches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngagementMetrics, Platform, VideoSpec};
    use crate::error::EngagementError;
    use crate::source::MockMetricSource;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use tokio::sync::Semaphore;

    /// Source that blocks each fetch until a permit is released
    struct GatedSource {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl MetricSource for GatedSource {
        async fn fetch(
            &self,
            _platform: Platform,
            _locator: &str,
        ) -> crate::error::Result<EngagementMetrics> {
            self.gate.acquire().await.unwrap().forget();
            Ok(EngagementMetrics::new(10, 1, 0))
        }
    }

    fn catalog() -> Arc<Catalog> {
        let mut platforms = BTreeMap::new();
        platforms.insert(Platform::Youtube, "https://www.youtube.com/shorts/a".to_string());
        platforms.insert(Platform::Tiktok, "https://www.tiktok.com/@x/video/1".to_string());
        let mut single = BTreeMap::new();
        single.insert(Platform::Threads, "https://www.threads.com/@x/post/1".to_string());
        Arc::new(Catalog::new(vec![
            VideoSpec {
                key: "kings".to_string(),
                name: "Kings".to_string(),
                platforms,
            },
            VideoSpec {
                key: "glue".to_string(),
                name: "Glue".to_string(),
                platforms: single,
            },
        ]))
    }

    fn aggregator(source: MockMetricSource, dir: &std::path::Path) -> Aggregator {
        let catalog = catalog();
        let store = SnapshotStore::new(dir.join("data.json"), catalog.clone());
        Aggregator::new(catalog, Arc::new(source), store, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn refresh_sums_platforms_and_shares_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source.expect_fetch().times(3).returning(|platform, _| {
            Ok(match platform {
                Platform::Youtube => EngagementMetrics::new(100, 10, 1),
                Platform::Tiktok => EngagementMetrics::new(200, 20, 2),
                _ => EngagementMetrics::new(7, 0, 0),
            })
        });
        let aggregator = aggregator(source, dir.path());

        let outcome = aggregator.refresh_if_stale().await;
        let RefreshOutcome::Refreshed {
            timestamp,
            videos,
            failed_fetches,
        } = outcome
        else {
            panic!("expected a refresh, got {outcome:?}");
        };
        assert_eq!(videos, 2);
        assert_eq!(failed_fetches, 0);

        let snapshot = aggregator.snapshot().await;
        let kings = snapshot.latest("kings").unwrap();
        assert_eq!(kings.timestamp, timestamp);
        assert_eq!(kings.totals(), EngagementMetrics::new(300, 30, 3));
        assert_eq!(
            kings.platforms.get(Platform::Tiktok),
            Some(&EngagementMetrics::new(200, 20, 2))
        );
        assert_eq!(snapshot.latest("glue").unwrap().timestamp, timestamp);

        // persisted once, readable by an independent store
        let persisted = aggregator.store().load().await;
        assert_eq!(persisted, snapshot);
    }

    #[tokio::test]
    async fn failed_platform_contributes_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source.expect_fetch().returning(|platform, _| match platform {
            Platform::Tiktok => Err(EngagementError::extraction(platform, "blocked")),
            _ => Ok(EngagementMetrics::new(50, 5, 0)),
        });
        let aggregator = aggregator(source, dir.path());

        let outcome = aggregator.refresh_if_stale().await;
        assert!(matches!(
            outcome,
            RefreshOutcome::Refreshed {
                failed_fetches: 1,
                ..
            }
        ));

        let snapshot = aggregator.snapshot().await;
        let kings = snapshot.latest("kings").unwrap();
        assert_eq!(kings.totals(), EngagementMetrics::new(50, 5, 0));
        assert!(kings.platforms.get(Platform::Tiktok).is_none());
        assert_eq!(snapshot.samples("glue").len(), 1);
    }

    #[tokio::test]
    async fn second_call_inside_window_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source
            .expect_fetch()
            .times(3)
            .returning(|_, _| Ok(EngagementMetrics::new(1, 1, 1)));
        let aggregator = aggregator(source, dir.path());

        assert!(aggregator.should_refresh().await);
        assert!(aggregator.refresh_if_stale().await.is_refreshed());
        assert!(!aggregator.should_refresh().await);
        assert_eq!(aggregator.refresh_if_stale().await, RefreshOutcome::Fresh);
        assert_eq!(aggregator.snapshot().await.sample_count(), 2);

        let status = aggregator.status().await;
        assert!(!status.stale);
        assert!(!status.refreshing);
        assert_eq!(status.samples, 2);
        assert_eq!(status.refresh_interval_secs, 3600);
    }

    #[tokio::test]
    async fn force_refresh_ignores_freshness() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source
            .expect_fetch()
            .times(6)
            .returning(|_, _| Ok(EngagementMetrics::new(1, 0, 0)));
        let aggregator = aggregator(source, dir.path());

        assert!(aggregator.refresh_if_stale().await.is_refreshed());
        assert!(aggregator.force_refresh().await.is_refreshed());
        assert_eq!(aggregator.snapshot().await.samples("kings").len(), 2);
    }

    #[tokio::test]
    async fn reload_picks_up_persisted_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockMetricSource::new();
        source
            .expect_fetch()
            .returning(|_, _| Ok(EngagementMetrics::new(3, 2, 1)));
        let first = aggregator(source, dir.path());
        first.refresh_if_stale().await;

        let second = aggregator(MockMetricSource::new(), dir.path());
        assert!(!second.snapshot().await.has_samples());
        second.reload().await;
        assert_eq!(second.snapshot().await, first.snapshot().await);
        assert!(!second.should_refresh().await);
    }

    #[tokio::test]
    async fn save_failure_keeps_the_cycle_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the data file should be makes every save fail
        std::fs::create_dir_all(dir.path().join("data.json").join("child")).unwrap();
        let mut source = MockMetricSource::new();
        source
            .expect_fetch()
            .times(3)
            .returning(|_, _| Ok(EngagementMetrics::new(4, 2, 1)));
        let aggregator = aggregator(source, dir.path());

        assert!(aggregator.refresh_if_stale().await.is_refreshed());
        assert_eq!(aggregator.snapshot().await.sample_count(), 2);
        assert!(aggregator.store().try_load().await.is_err());
        assert_eq!(aggregator.refresh_if_stale().await, RefreshOutcome::Fresh);
    }

    #[tokio::test]
    async fn status_reports_a_cycle_in_progress() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let catalog = catalog();
        let store = SnapshotStore::new(dir.path().join("data.json"), catalog.clone());
        let aggregator = Arc::new(Aggregator::new(
            catalog,
            Arc::new(GatedSource { gate: gate.clone() }),
            store,
            Duration::from_secs(3600),
        ));

        let cycle = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.force_refresh().await }
        });
        tokio::time::timeout(Duration::from_secs(5), async {
            while !aggregator.is_refreshing() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // status is polled first, then the cycle is let through
        let (status, ()) = tokio::join!(aggregator.status(), async {
            tokio::task::yield_now().await;
            gate.add_permits(3);
        });
        assert!(status.refreshing);
        assert!(cycle.await.unwrap().is_refreshed());
        assert!(!aggregator.status().await.refreshing);
        assert_eq!(status.samples, 2);
    }
}
