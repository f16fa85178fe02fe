use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::world::{World, WorldSnapshot};

#[derive(Serialize)]
struct SnapshotRecord<'a> {
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    world: &'a WorldSnapshot,
}

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval` ticks.
/// An interval of zero disables output.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.interval > 0 && tick > 0 && tick % self.interval == 0
    }

    pub fn maybe_write(&self, world: &World, scenario_name: &str) -> Result<Option<PathBuf>> {
        if !self.is_due(world.tick()) {
            return Ok(None);
        }
        let snapshot = world.snapshot(scenario_name);
        self.write(&snapshot).map(Some)
    }

    pub fn write(&self, snapshot: &WorldSnapshot) -> Result<PathBuf> {
        let dir = self.dir.join(&snapshot.scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("tick_{:06}.json", snapshot.tick));
        let record = SnapshotRecord {
            written_at: Utc::now(),
            world: snapshot,
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(path)
    }
}
