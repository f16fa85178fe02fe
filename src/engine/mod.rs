use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    invariants::assert_invariants,
    rng::SimRng,
    snapshot::SnapshotWriter,
    world::{World, WorldSnapshot},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
    /// Audit the whole world after every tick and stop on the first failure.
    pub check_invariants: bool,
}

/// Owns the run's single random stream and drives the world tick by tick.
pub struct Engine {
    rng: SimRng,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            rng: SimRng::new(settings.seed),
            snapshot_writer: SnapshotWriter::new(
                &settings.snapshot_dir,
                settings.snapshot_interval_ticks,
            ),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    /// Runs `ticks` steps and hands the post-tick snapshot to `hook`.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&WorldSnapshot),
    {
        for _ in 0..ticks {
            world.step(&mut self.rng);

            if self.settings.check_invariants {
                assert_invariants(world)
                    .with_context(|| format!("Invariant audit failed after tick {}", world.tick()))?;
            }

            info!(
                tick = world.tick(),
                population = world.total_population(),
                migrations = world.migration_event_count(),
                "tick complete"
            );

            self.snapshot_writer
                .maybe_write(world, &self.settings.scenario_name)?;
            hook(&world.snapshot(&self.settings.scenario_name));
        }
        Ok(())
    }
}
