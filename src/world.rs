use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::city::{City, CityTotals, FirmSummary, GroupSummary};
use crate::migration::GroupMigrationEvent;
use crate::province::Province;
use crate::rng::RandomSource;

#[derive(Debug, Clone)]
pub struct Country {
    pub name: String,
    pub provinces: Vec<Province>,
}

impl Country {
    pub fn new(name: impl Into<String>, provinces: Vec<Province>) -> Self {
        Self {
            name: name.into(),
            provinces,
        }
    }

    pub fn tick(&mut self, rng: &mut dyn RandomSource) {
        for province in &mut self.provinces {
            province.tick(rng);
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub name: String,
    pub totals: CityTotals,
    pub migration_attractiveness: f64,
    pub employed: u64,
    pub last_food_deficit: Option<f64>,
    pub inventory: BTreeMap<String, f64>,
    pub groups: Vec<GroupSummary>,
    pub firms: Vec<FirmSummary>,
    pub migrations: Vec<GroupMigrationEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvinceSnapshot {
    pub name: String,
    pub area: u64,
    pub cities: Vec<CitySnapshot>,
    pub migrations: Vec<GroupMigrationEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub total_population: f64,
    pub provinces: Vec<ProvinceSnapshot>,
}

/// The whole hierarchy, ticked in country, province, city order.
#[derive(Debug, Clone, Default)]
pub struct World {
    tick: u64,
    countries: Vec<Country>,
}

impl World {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { tick: 0, countries }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn countries_mut(&mut self) -> &mut [Country] {
        &mut self.countries
    }

    pub fn provinces(&self) -> impl Iterator<Item = &Province> {
        self.countries
            .iter()
            .flat_map(|country| country.provinces.iter())
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.provinces().flat_map(|province| province.cities().iter())
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities().find(|city| city.name() == name)
    }

    pub fn step(&mut self, rng: &mut dyn RandomSource) {
        for country in &mut self.countries {
            country.tick(rng);
        }
        self.tick += 1;
    }

    pub fn total_population(&self) -> f64 {
        self.cities().map(City::total_population).sum()
    }

    pub fn migration_event_count(&self) -> usize {
        self.provinces()
            .map(|province| {
                province.migrations().len()
                    + province
                        .cities()
                        .iter()
                        .map(|city| city.migrations().len())
                        .sum::<usize>()
            })
            .sum()
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let provinces = self
            .provinces()
            .map(|province| ProvinceSnapshot {
                name: province.name().to_string(),
                area: province.area(),
                cities: province.cities().iter().map(city_snapshot).collect(),
                migrations: province.migrations().to_vec(),
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            total_population: self.total_population(),
            provinces,
        }
    }
}

fn city_snapshot(city: &City) -> CitySnapshot {
    CitySnapshot {
        name: city.name().to_string(),
        totals: city.totals().clone(),
        migration_attractiveness: city.migration_attractiveness(),
        employed: city.employed(),
        last_food_deficit: city.last_food_deficit(),
        inventory: city.inventory().clone(),
        groups: city.group_summaries(),
        firms: city.firm_summaries(),
        migrations: city.migrations().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CityConfig, ProvinceConfig};
    use crate::population::PopulationGroup;

    fn world() -> World {
        let city = |name: &str, size: f64| {
            City::new(
                name,
                vec![PopulationGroup::new(size, 0.5, 100.0)],
                Vec::new(),
                &CityConfig::default(),
                None,
            )
        };
        let province = Province::new(
            "North",
            40,
            vec![city("A", 120.0), city("B", 80.0)],
            &ProvinceConfig::default(),
            None,
        );
        World::new(vec![Country::new("Realm", vec![province])])
    }

    #[test]
    fn totals_span_every_city() {
        let world = world();
        assert_eq!(world.total_population(), 200.0);
        assert_eq!(world.cities().count(), 2);
        assert!(world.city("B").is_some());
        assert!(world.city("Z").is_none());
    }

    #[test]
    fn snapshot_mirrors_hierarchy() {
        let snapshot = world().snapshot("demo");
        assert_eq!(snapshot.scenario, "demo");
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.provinces.len(), 1);
        assert_eq!(snapshot.provinces[0].cities[1].name, "B");
        assert_eq!(snapshot.provinces[0].cities[0].groups[0].size, 120.0);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"scenario\":\"demo\""));
    }
}
