// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Artifact Sweeper
//!
//! Background task that deletes staged uploads and processed artifacts once
//! they are older than the configured TTL, so the staging and output
//! directories do not grow without bound.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::StoragePaths;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Periodically removes expired files from the upload and output directories.
#[derive(Debug, Clone)]
pub struct ArtifactSweeper {
    dirs: Vec<PathBuf>,
    ttl: Duration,
    interval: Duration,
}

impl ArtifactSweeper {
    pub fn new(paths: &StoragePaths, ttl: Duration) -> Self {
        Self {
            dirs: vec![
                paths.uploads_dir().to_path_buf(),
                paths.output_dir().to_path_buf(),
            ],
            ttl,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Artifact sweeper starting"
        );

        loop {
            let sweeper = self.clone();
            match tokio::task::spawn_blocking(move || sweeper.sweep_at(SystemTime::now())).await {
                Ok(report) if report.removed > 0 || report.failed > 0 => {
                    info!(
                        removed = report.removed,
                        failed = report.failed,
                        "Artifact sweep finished"
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Artifact sweep task failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Artifact sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Remove every file last modified more than the TTL before `now`.
    pub fn sweep_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();
        for dir in &self.dirs {
            if let Err(e) = sweep_dir(dir, now, self.ttl, &mut report) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(dir = %dir.display(), error = %e, "Failed to scan directory");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn sweep_dir(dir: &Path, now: SystemTime, ttl: Duration, report: &mut SweepReport) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();

        // Entries can vanish mid-scan (renamed `.part` files, concurrent removal).
        let modified = match fs::metadata(&path).and_then(|m| {
            if m.is_file() {
                m.modified().map(Some)
            } else {
                Ok(None)
            }
        }) {
            Ok(Some(modified)) => modified,
            Ok(None) => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat file");
                report.failed += 1;
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or_default();
        if age <= ttl {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), age_secs = age.as_secs(), "Removed expired file");
                report.removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove expired file");
                report.failed += 1;
            }
        }
    }
    Ok(())
}
