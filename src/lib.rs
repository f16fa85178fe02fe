pub mod city;
pub mod config;
pub mod economy;
pub mod engine;
pub mod invariants;
pub mod migration;
pub mod population;
pub mod province;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod world;

pub use engine::{Engine, EngineSettings};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
