use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use demesne::{
    engine::{Engine, EngineSettings},
    report,
    scenario::ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Population and migration simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/two_provinces.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Print city populations every N ticks (0 disables)
    #[arg(long, default_value_t = 6)]
    report_interval: u64,

    /// Audit world invariants after every tick
    #[arg(long)]
    check_invariants: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut world = scenario.build_world();
    let ticks = scenario.ticks(cli.ticks);
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: cli
            .snapshot_interval
            .unwrap_or(scenario.snapshot_interval_ticks),
        snapshot_dir: cli
            .snapshot_dir
            .unwrap_or_else(|| PathBuf::from("snapshots")),
        check_invariants: cli.check_invariants,
    };

    let report_interval = cli.report_interval;
    let mut engine = Engine::new(settings);
    engine.run_with_hook(&mut world, ticks, |snapshot| {
        if report_interval == 0 || snapshot.tick % report_interval != 0 {
            return;
        }
        print!("{}", report::render(snapshot));
    })?;

    println!(
        "Scenario '{}' completed for {} ticks. Final population: {:.0}",
        scenario.name,
        ticks,
        world.total_population()
    );
    Ok(())
}
