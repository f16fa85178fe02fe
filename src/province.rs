use std::collections::BTreeSet;
use std::sync::Arc;

use crate::city::City;
use crate::config::{IntercitySettings, ProvinceConfig};
use crate::migration::{pair_mut, DistanceProvider, GroupMigrationEvent, Migration};
use crate::rng::RandomSource;

/// A province owns its cities and moves people between them.
#[derive(Debug, Clone)]
pub struct Province {
    name: String,
    area: u64,
    cities: Vec<City>,
    settings: IntercitySettings,
    migration: Migration,
    migrations: Vec<GroupMigrationEvent>,
}

impl Province {
    pub fn new(
        name: impl Into<String>,
        area: u64,
        cities: Vec<City>,
        config: &ProvinceConfig,
        distance: Option<Arc<dyn DistanceProvider>>,
    ) -> Self {
        let settings = config.migration.clone();
        let migration = Migration::for_intercity(settings.intercity_rate, distance);
        Self {
            name: name.into(),
            area,
            cities,
            settings,
            migration,
            migrations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn area(&self) -> u64 {
        self.area
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn cities_mut(&mut self) -> &mut [City] {
        &mut self.cities
    }

    pub fn migration(&self) -> &Migration {
        &self.migration
    }

    /// Intercity events of the latest tick.
    pub fn migrations(&self) -> &[GroupMigrationEvent] {
        &self.migrations
    }

    pub fn total_population(&self) -> f64 {
        self.cities.iter().map(City::total_population).sum()
    }

    pub fn tick(&mut self, rng: &mut dyn RandomSource) {
        for city in &mut self.cities {
            city.tick(rng);
        }
        self.run_migrations(rng);
    }

    /// Sends people from each city toward one more attractive city, then
    /// refreshes every city that gained or lost people.
    pub fn run_migrations(&mut self, rng: &mut dyn RandomSource) {
        self.migrations.clear();
        if !self.settings.enabled {
            return;
        }

        let mut touched = BTreeSet::new();
        for source_index in 0..self.cities.len() {
            let source_attractiveness = self.cities[source_index].migration_attractiveness();
            let candidate_indices: Vec<usize> = self
                .cities
                .iter()
                .enumerate()
                .filter(|(index, city)| {
                    *index != source_index
                        && city.migration_attractiveness() > source_attractiveness
                })
                .map(|(index, _)| index)
                .collect();
            if candidate_indices.is_empty() {
                continue;
            }

            let candidates: Vec<&City> = candidate_indices
                .iter()
                .map(|index| &self.cities[*index])
                .collect();
            let Some(choice) =
                self.migration
                    .choose_target_city(&self.cities[source_index], &candidates, rng)
            else {
                continue;
            };
            let target_index = candidate_indices[choice];

            let (source, target) = pair_mut(&mut self.cities, source_index, target_index);
            let events = self.migration.migrate_between_cities(source, target, rng);
            if events.is_empty() {
                continue;
            }

            self.migrations.extend(events);
            touched.insert(source_index);
            touched.insert(target_index);
        }

        for index in touched {
            self.cities[index].refresh_totals();
        }
    }
}
