use std::path::PathBuf;

use approx::assert_relative_eq;
use demesne::{
    city::{City, FOOD},
    config::CityConfig,
    economy::{Firm, Ownership},
    engine::{Engine, EngineSettings},
    invariants::assert_invariants,
    population::PopulationGroup,
    rng::SimRng,
    scenario::{Scenario, ScenarioLoader},
};

fn scenario() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/two_provinces.yaml")
        .expect("fixture parses")
}

fn engine(seed: u64, snapshot_dir: PathBuf, snapshot_interval: u64) -> Engine {
    Engine::new(EngineSettings {
        scenario_name: "two_provinces".into(),
        seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
        check_invariants: true,
    })
}

#[test]
fn fixture_keeps_expected_structure() {
    let scenario = scenario();
    let world = scenario.build_world();
    assert_eq!(world.countries().len(), 1);
    let provinces: Vec<_> = world.provinces().collect();
    assert_eq!(provinces.len(), 2);
    assert_eq!(provinces[0].cities().len(), 2);
    assert_eq!(provinces[1].cities().len(), 2);
    assert_eq!(world.city("Brackwater").unwrap().group_count(), 3);
    assert_relative_eq!(world.total_population(), 15_900.0);
}

#[test]
fn invariants_hold_for_a_simulated_year() {
    let scenario = scenario();
    let mut world = scenario.build_world();
    let temp = tempfile::tempdir().unwrap();
    let mut engine = engine(scenario.seed, temp.path().to_path_buf(), 0);

    engine.run(&mut world, 52).expect("every tick passes the audit");

    assert_eq!(world.tick(), 52);
    assert!(assert_invariants(&world).is_ok());
    for city in world.cities() {
        for group in city.populations() {
            assert!((0.0..=1.0).contains(&group.healthcare));
        }
    }
}

#[test]
fn seeded_runs_are_identical() {
    let scenario = scenario();
    let temp = tempfile::tempdir().unwrap();
    let trajectory = |seed: u64| {
        let mut world = scenario.build_world();
        let mut path = Vec::new();
        engine(seed, temp.path().to_path_buf(), 0)
            .run_with_hook(&mut world, 24, |snapshot| {
                path.push((
                    snapshot.total_population,
                    snapshot.provinces[0].migrations.clone(),
                ));
            })
            .unwrap();
        path
    };

    let first = trajectory(scenario.seed);
    let second = trajectory(scenario.seed);
    assert_eq!(first.len(), 24);
    assert_eq!(first, second);
}

#[test]
fn hook_sees_every_tick() {
    let scenario = scenario();
    let mut world = scenario.build_world();
    let temp = tempfile::tempdir().unwrap();
    let mut ticks = Vec::new();
    engine(scenario.seed, temp.path().to_path_buf(), 0)
        .run_with_hook(&mut world, 6, |snapshot| ticks.push(snapshot.tick))
        .unwrap();
    assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn engine_emits_snapshots() {
    let scenario = scenario();
    let mut world = scenario.build_world();
    let temp = tempfile::tempdir().unwrap();
    let snapshot_dir = temp.path().join("snaps");

    engine(scenario.seed, snapshot_dir.clone(), 10)
        .run(&mut world, 20)
        .unwrap();

    let expected = snapshot_dir.join("two_provinces").join("tick_000010.json");
    assert!(expected.exists(), "missing {}", expected.display());
    assert!(snapshot_dir.join("two_provinces").join("tick_000020.json").exists());
    assert!(!snapshot_dir.join("two_provinces").join("tick_000005.json").exists());

    let data = std::fs::read_to_string(expected).unwrap();
    assert!(data.contains("\"scenario\": \"two_provinces\""));
    assert!(data.contains("\"tick\": 10"));
}

#[test]
fn starving_city_loses_attractiveness_and_stock() {
    let groups = vec![
        PopulationGroup::new(500.0, 0.6, 100.0),
        PopulationGroup::new(300.0, 0.3, 100.0),
    ];
    let mut city = City::new("Famine", groups, Vec::new(), &CityConfig::default(), None);
    city.set_stock(FOOD, 100.0);

    city.tick(&mut SimRng::new(11));

    let deficit = city.last_food_deficit().expect("shortfall recorded");
    assert!(deficit > 0.0);
    assert_eq!(city.stock(FOOD), 0.0);
    assert_eq!(city.migration_attractiveness(), 0.0);
    assert!(city.populations().iter().all(|group| group.sick <= group.size));
}

#[test]
fn fed_city_consumes_exactly_its_requirement() {
    let groups = vec![PopulationGroup::new(400.0, 0.5, 100.0)];
    let mut city = City::new("Granary", groups, Vec::new(), &CityConfig::default(), None);
    city.set_stock(FOOD, 5_000.0);

    let mut rng = SimRng::new(3);
    for group in city.populations_mut() {
        group.tick(&mut rng);
    }
    let needed: f64 = city
        .populations()
        .iter()
        .map(PopulationGroup::compute_food_consumption)
        .sum();
    city.consume_food();

    assert_eq!(city.last_food_deficit(), None);
    assert_relative_eq!(city.stock(FOOD), 5_000.0 - needed);
}

#[test]
fn repeated_starvation_keeps_groups_bounded() {
    let groups = vec![
        PopulationGroup::new(2_000.0, 0.9, 5.0),
        PopulationGroup::new(800.0, 0.4, 1.0),
    ];
    let firms = vec![Firm::new(1.0, 300.0, 5_000.0, Ownership::Corporate, 2.0, "tools")];
    let mut city = City::new("Siege", groups, firms, &CityConfig::default(), None);
    let mut rng = SimRng::new(1);

    for tick in 1..=50 {
        city.tick(&mut rng);

        assert!(city.last_food_deficit().is_some(), "tick {tick} was fed");
        assert_eq!(city.stock(FOOD), 0.0);
        assert_eq!(city.migration_attractiveness(), 0.0);
        for (index, group) in city.populations().iter().enumerate() {
            let ceiling = group.params().healthcare_weight + group.params().employment_weight;
            assert!(
                (0.0..=1.0).contains(&group.healthcare),
                "tick {tick} group {index}: healthcare {}",
                group.healthcare
            );
            assert!(
                (0.0..=ceiling).contains(&group.migration_attractiveness),
                "tick {tick} group {index}: attractiveness {}",
                group.migration_attractiveness
            );
            assert!(
                group.sick >= 0.0 && group.sick <= group.size,
                "tick {tick} group {index}: sick {} of {}",
                group.sick,
                group.size
            );
        }
    }
    assert!(city.employed() > 0);
}
