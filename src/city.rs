use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CityConfig, IntergroupSettings};
use crate::economy::{Firm, LabourMarket, Ownership};
use crate::migration::{DistanceProvider, GroupMigrationEvent, Migration};
use crate::population::PopulationGroup;
use crate::rng::RandomSource;

pub const FOOD: &str = "food";

/// Aggregates published after every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityTotals {
    pub total_population: f64,
    pub births: u64,
    pub deaths: u64,
    /// Mean employable fraction across groups.
    pub employable: f64,
    pub productivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: usize,
    pub size: f64,
    pub healthcare: f64,
    pub last_births: u64,
    pub last_deaths: u64,
    pub employment_rate: f64,
    pub sick_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmSummary {
    pub ownership: Ownership,
    pub good: String,
    pub employed: u64,
    pub total_productivity: f64,
}

#[derive(Debug, Clone, Default)]
struct CityState {
    employed: u64,
    migrations: Vec<GroupMigrationEvent>,
    last_food_deficit: Option<f64>,
    migration_attractiveness: f64,
    inventory: BTreeMap<String, f64>,
    total_population: f64,
    totals: CityTotals,
}

/// A city and its ordered, index-stable population groups.
#[derive(Debug, Clone)]
pub struct City {
    name: String,
    populations: Vec<PopulationGroup>,
    firms: Vec<Firm>,
    settings: IntergroupSettings,
    migration: Migration,
    labour_market: LabourMarket,
    state: CityState,
}

impl City {
    pub fn new(
        name: impl Into<String>,
        populations: Vec<PopulationGroup>,
        firms: Vec<Firm>,
        config: &CityConfig,
        distance: Option<Arc<dyn DistanceProvider>>,
    ) -> Self {
        let settings = config.migration.clone();
        let migration = Migration::for_intergroup(settings.intergroup_rate, distance);

        let mut state = CityState::default();
        for firm in &firms {
            state.inventory.entry(firm.good.clone()).or_insert(0.0);
        }
        state.inventory.entry(FOOD.to_string()).or_insert(0.0);

        let mut city = Self {
            name: name.into(),
            populations,
            firms,
            settings,
            migration,
            labour_market: LabourMarket::new(),
            state,
        };
        city.refresh_totals();
        city.update_city_data();
        city
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn populations(&self) -> &[PopulationGroup] {
        &self.populations
    }

    /// Groups can be mutated but never added, removed or reordered.
    pub fn populations_mut(&mut self) -> &mut [PopulationGroup] {
        &mut self.populations
    }

    pub fn group_count(&self) -> usize {
        self.populations.len()
    }

    pub fn firms(&self) -> &[Firm] {
        &self.firms
    }

    pub fn migration(&self) -> &Migration {
        &self.migration
    }

    pub fn employed(&self) -> u64 {
        self.state.employed
    }

    /// Intergroup events of the latest tick.
    pub fn migrations(&self) -> &[GroupMigrationEvent] {
        &self.state.migrations
    }

    pub fn last_food_deficit(&self) -> Option<f64> {
        self.state.last_food_deficit
    }

    pub fn inventory(&self) -> &BTreeMap<String, f64> {
        &self.state.inventory
    }

    pub fn stock(&self, good: &str) -> f64 {
        self.state.inventory.get(good).copied().unwrap_or(0.0)
    }

    pub fn set_stock(&mut self, good: impl Into<String>, amount: f64) {
        self.state.inventory.insert(good.into(), amount);
    }

    pub fn migration_attractiveness(&self) -> f64 {
        self.state.migration_attractiveness
    }

    pub fn set_migration_attractiveness(&mut self, value: f64) {
        self.state.migration_attractiveness = value;
    }

    /// Population as of the last refresh; migration reads this figure.
    pub fn total_population(&self) -> f64 {
        self.state.total_population
    }

    pub fn totals(&self) -> &CityTotals {
        &self.state.totals
    }

    /// Recomputes the population sum and mean group attractiveness.
    /// A city that went hungry on its last meal stays at zero attractiveness.
    pub fn refresh_totals(&mut self) {
        self.state.total_population = self.populations.iter().map(|group| group.size).sum();
        self.state.migration_attractiveness = if self.populations.is_empty()
            || self.state.last_food_deficit.is_some()
        {
            0.0
        } else {
            self.populations
                .iter()
                .map(|group| group.migration_attractiveness)
                .sum::<f64>()
                / self.populations.len() as f64
        };
    }

    pub fn tick(&mut self, rng: &mut dyn RandomSource) {
        for group in &mut self.populations {
            group.tick(rng);
        }
        self.refresh_totals();

        self.state.employed = self
            .labour_market
            .clear_market(&mut self.populations, &mut self.firms);

        for firm in &mut self.firms {
            firm.tick(rng);
            let stock = self.state.inventory.entry(firm.good.clone()).or_insert(0.0);
            if firm.is_state_owned() {
                *stock += firm.transfer_to_city();
            }
        }

        self.consume_food();
        self.run_migrations(rng);
        self.refresh_totals();
        self.update_city_data();
    }

    /// Replaces the previous tick's intergroup events.
    pub fn run_migrations(&mut self, rng: &mut dyn RandomSource) {
        self.state.migrations.clear();
        if !self.settings.enabled {
            return;
        }
        let migration = self.migration.clone();
        let events = migration.migrate_within_city(self, rng);
        self.state.migrations = events;
    }

    pub fn consume_food(&mut self) {
        let needed: f64 = self
            .populations
            .iter()
            .map(PopulationGroup::compute_food_consumption)
            .sum();
        let food = self.state.inventory.entry(FOOD.to_string()).or_insert(0.0);

        if needed <= *food {
            *food -= needed;
            self.state.last_food_deficit = None;
            return;
        }

        let deficit = needed - *food;
        *food = 0.0;
        self.state.last_food_deficit = Some(deficit);
        self.state.migration_attractiveness = 0.0;
        warn!(city = %self.name, deficit, "food shortage");

        if self.populations.is_empty() {
            return;
        }
        let per_group = (deficit / self.populations.len() as f64).floor();
        for group in &mut self.populations {
            group.starve(per_group);
        }
        debug!(city = %self.name, per_group, "starvation applied");
    }

    /// Refreshes the published aggregates.
    pub fn update_city_data(&mut self) {
        let groups = &self.populations;
        let employable = if groups.is_empty() {
            0.0
        } else {
            groups.iter().map(|group| group.employable).sum::<f64>() / groups.len() as f64
        };
        self.state.totals = CityTotals {
            total_population: groups.iter().map(|group| group.size).sum(),
            births: groups.iter().map(|group| group.births).sum(),
            deaths: groups.iter().map(|group| group.deaths).sum(),
            employable,
            productivity: self.firms.iter().map(|firm| firm.total_productivity).sum(),
        };
    }

    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        self.populations
            .iter()
            .enumerate()
            .map(|(index, group)| GroupSummary {
                group: index,
                size: group.size,
                healthcare: group.healthcare,
                last_births: group.births,
                last_deaths: group.deaths,
                employment_rate: group.employment_rate,
                sick_rate: group.sick_rate,
            })
            .collect()
    }

    pub fn firm_summaries(&self) -> Vec<FirmSummary> {
        self.firms
            .iter()
            .map(|firm| FirmSummary {
                ownership: firm.ownership,
                good: firm.good.clone(),
                employed: firm.employed,
                total_productivity: firm.total_productivity,
            })
            .collect()
    }
}
