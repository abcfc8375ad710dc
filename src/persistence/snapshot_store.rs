//! Snapshot Store
//!
//! Keeps the whole snapshot in one pretty-printed JSON file. Saves go through
//! a temp file and a rename so readers never see a half-written snapshot.
//! Neither `load` nor `save` fails from the caller's point of view: a
//! missing or corrupt file loads as an empty snapshot, and a failed save
//! leaves the in-memory copy as the source of truth.

use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{Catalog, EngagementSample, Platform, Snapshot};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    catalog: Arc<Catalog>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, catalog: Arc<Catalog>) -> Self {
        Self {
            path: path.into(),
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted snapshot, falling back to an empty one.
    pub async fn load(&self) -> Snapshot {
        match self.try_load().await {
            Ok(Some(snapshot)) => {
                debug!(
                    path = %self.path.display(),
                    videos = snapshot.video_count(),
                    samples = snapshot.sample_count(),
                    "loaded snapshot"
                );
                snapshot
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no snapshot file yet, starting empty");
                Snapshot::empty_for(&self.catalog)
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load snapshot, starting empty"
                );
                Snapshot::empty_for(&self.catalog)
            }
        }
    }

    /// Read the persisted snapshot. `Ok(None)` when the file does not exist.
    pub async fn try_load(&self) -> Result<Option<Snapshot>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let parsed: BTreeMap<String, Value> = serde_json::from_str(&raw)?;
        Ok(Some(self.repair(parsed)))
    }

    /// Persist the snapshot; failures are logged and swallowed.
    pub async fn save(&self, snapshot: &Snapshot) {
        match self.try_save(snapshot).await {
            Ok(()) => info!(
                path = %self.path.display(),
                samples = snapshot.sample_count(),
                "saved snapshot"
            ),
            Err(e) => error!(
                path = %self.path.display(),
                error = %e,
                "failed to save snapshot"
            ),
        }
    }

    pub async fn try_save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        let body = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Turn loosely-typed file content into a snapshot for the current
    /// catalog, dropping what cannot be trusted.
    fn repair(&self, parsed: BTreeMap<String, Value>) -> Snapshot {
        let mut histories: BTreeMap<String, Vec<EngagementSample>> = BTreeMap::new();

        for (video_key, value) in parsed {
            let Some(video) = self.catalog.get(&video_key) else {
                warn!(video = %video_key, "dropping history of video missing from catalog");
                continue;
            };
            let Value::Array(entries) = value else {
                warn!(video = %video_key, "history is not a list, treating as empty");
                histories.insert(video_key, Vec::new());
                continue;
            };

            let mut samples: Vec<EngagementSample> = Vec::with_capacity(entries.len());
            for (idx, entry) in entries.into_iter().enumerate() {
                let mut sample = match serde_json::from_value::<EngagementSample>(entry) {
                    Ok(sample) => sample,
                    Err(e) => {
                        warn!(video = %video_key, index = idx, error = %e, "dropping malformed sample");
                        continue;
                    }
                };
                if let Some(prev) = samples.last() {
                    if sample.timestamp < prev.timestamp {
                        warn!(
                            video = %video_key,
                            index = idx,
                            timestamp = sample.timestamp,
                            previous = prev.timestamp,
                            "sample out of timestamp order"
                        );
                    }
                }
                let stray: Vec<Platform> = sample
                    .platforms
                    .iter()
                    .map(|(platform, _)| platform)
                    .filter(|platform| !video.platforms.contains_key(platform))
                    .collect();
                if !stray.is_empty() {
                    warn!(
                        video = %video_key,
                        index = idx,
                        platforms = ?stray,
                        "dropping platform entries not configured for this video"
                    );
                    sample
                        .platforms
                        .retain(|platform| video.platforms.contains_key(&platform));
                }
                samples.push(sample);
            }
            histories.insert(video_key, samples);
        }

        let mut snapshot = Snapshot::from_histories(histories);
        for key in self.catalog.keys() {
            snapshot.ensure_video(key);
        }
        snapshot
    }
}
