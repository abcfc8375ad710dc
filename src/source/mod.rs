//! Metric sources
//!
//! A source turns a `(platform, locator)` pair into an engagement triple.
//! How it gets there (page scraping, an official API, a guess) is its own
//! business; the aggregator only sees the trait.

mod estimate;
mod scrape;

pub use estimate::{estimate_metrics, EstimatingSource};
pub use scrape::{extract_metrics, parse_count, PageScrapeSource};

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{EngagementMetrics, Platform};
use crate::error::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Current engagement of the resource at `locator` on `platform`
    async fn fetch(&self, platform: Platform, locator: &str) -> Result<EngagementMetrics>;
}

#[async_trait]
impl<T: MetricSource + ?Sized> MetricSource for Arc<T> {
    async fn fetch(&self, platform: Platform, locator: &str) -> Result<EngagementMetrics> {
        (**self).fetch(platform, locator).await
    }
}
