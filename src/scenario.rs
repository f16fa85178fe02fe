use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    city::{City, FOOD},
    config::{CityConfig, LoggingConfig, ProvinceConfig},
    economy::{Firm, Ownership},
    migration::{DistanceProvider, DistanceTable},
    population::{DemographyParams, PopulationGroup},
    province::Province,
    world::{Country, World},
};

fn default_ticks() -> u64 {
    52
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub city: CityConfig,
    #[serde(default)]
    pub province: ProvinceConfig,
    #[serde(default)]
    pub demography: DemographyParams,
    #[serde(default)]
    pub distances: Vec<ScenarioDistance>,
    pub countries: Vec<ScenarioCountry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioDistance {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCountry {
    pub name: String,
    pub provinces: Vec<ScenarioProvince>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioProvince {
    pub name: String,
    #[serde(default)]
    pub area: u64,
    pub cities: Vec<ScenarioCity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCity {
    pub name: String,
    /// Opening food stock.
    #[serde(default)]
    pub food: f64,
    pub groups: Vec<ScenarioGroup>,
    #[serde(default)]
    pub firms: Vec<ScenarioFirm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioGroup {
    pub size: f64,
    pub base_healthcare: f64,
    pub healthcare_capacity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFirm {
    pub productivity: f64,
    pub production_capacity: f64,
    pub capital: f64,
    pub ownership: Ownership,
    pub wage: f64,
    pub good: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("scenario '{0}' defines no provinces")]
    NoProvinces(String),
    #[error("city '{0}' has no population groups")]
    EmptyCity(String),
    #[error("city '{city}' group {index} has a negative size")]
    NegativeSize { city: String, index: usize },
    #[error("city '{city}' group {index} has base healthcare outside [0, 1]")]
    HealthcareOutOfRange { city: String, index: usize },
    #[error("{name} rate {value} is outside [0, 1]")]
    RateOutOfRange { name: &'static str, value: f64 },
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let rates = [
            ("intergroup", self.city.migration.intergroup_rate),
            ("intercity", self.province.migration.intercity_rate),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::RateOutOfRange { name, value });
            }
        }

        let mut provinces = 0;
        for province in self.countries.iter().flat_map(|c| &c.provinces) {
            provinces += 1;
            for city in &province.cities {
                if city.groups.is_empty() {
                    return Err(ScenarioError::EmptyCity(city.name.clone()));
                }
                for (index, group) in city.groups.iter().enumerate() {
                    if group.size < 0.0 {
                        return Err(ScenarioError::NegativeSize {
                            city: city.name.clone(),
                            index,
                        });
                    }
                    if !(0.0..=1.0).contains(&group.base_healthcare) {
                        return Err(ScenarioError::HealthcareOutOfRange {
                            city: city.name.clone(),
                            index,
                        });
                    }
                }
            }
        }
        if provinces == 0 {
            return Err(ScenarioError::NoProvinces(self.name.clone()));
        }
        Ok(())
    }

    pub fn distance_provider(&self) -> Option<Arc<dyn DistanceProvider>> {
        if self.distances.is_empty() {
            return None;
        }
        let mut table = DistanceTable::new();
        for entry in &self.distances {
            table.insert(entry.from.clone(), entry.to.clone(), entry.weight);
        }
        Some(Arc::new(table))
    }

    pub fn build_world(&self) -> World {
        let distance = self.distance_provider();
        let countries = self
            .countries
            .iter()
            .map(|country| {
                let provinces = country
                    .provinces
                    .iter()
                    .map(|province| {
                        let cities = province
                            .cities
                            .iter()
                            .map(|city| self.build_city(city, distance.clone()))
                            .collect();
                        Province::new(
                            province.name.clone(),
                            province.area,
                            cities,
                            &self.province,
                            distance.clone(),
                        )
                    })
                    .collect();
                Country::new(country.name.clone(), provinces)
            })
            .collect();
        World::new(countries)
    }

    fn build_city(&self, city: &ScenarioCity, distance: Option<Arc<dyn DistanceProvider>>) -> City {
        let groups = city
            .groups
            .iter()
            .map(|group| {
                PopulationGroup::with_params(
                    group.size,
                    group.base_healthcare,
                    group.healthcare_capacity,
                    self.demography,
                )
            })
            .collect();
        let firms = city
            .firms
            .iter()
            .map(|firm| {
                Firm::new(
                    firm.productivity,
                    firm.production_capacity,
                    firm.capital,
                    firm.ownership,
                    firm.wage,
                    firm.good.clone(),
                )
            })
            .collect();
        let mut built = City::new(city.name.clone(), groups, firms, &self.city, distance);
        built.set_stock(FOOD, city.food);
        built
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or_else(default_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: minimal
seed: 5
countries:
  - name: Realm
    provinces:
      - name: Coast
        area: 12
        cities:
          - name: Port
            food: 500
            groups:
              - { size: 100, base_healthcare: 0.5, healthcare_capacity: 20 }
            firms:
              - { productivity: 2, production_capacity: 50, capital: 100, ownership: state, wage: 1, good: food }
"#;

    #[test]
    fn minimal_scenario_builds() {
        let scenario: Scenario = serde_yaml::from_str(MINIMAL).unwrap();
        scenario.validate().unwrap();
        assert_eq!(scenario.ticks(None), 52);
        assert_eq!(scenario.ticks(Some(3)), 3);
        assert!(scenario.city.migration.enabled);

        let world = scenario.build_world();
        let port = world.city("Port").unwrap();
        assert_eq!(port.stock(FOOD), 500.0);
        assert_eq!(port.firms().len(), 1);
        assert_eq!(world.total_population(), 100.0);
        assert!(scenario.distance_provider().is_none());
    }

    #[test]
    fn empty_city_is_rejected() {
        let yaml = MINIMAL.replace(
            "            groups:\n              - { size: 100, base_healthcare: 0.5, healthcare_capacity: 20 }\n",
            "            groups: []\n",
        );
        let scenario: Scenario = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::EmptyCity("Port".into()))
        );
    }

    #[test]
    fn out_of_range_rate_is_rejected() {
        let yaml = format!("{MINIMAL}city:\n  migration:\n    intergroup_rate: 1.5\n");
        let scenario: Scenario = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::RateOutOfRange { name: "intergroup", .. })
        ));
    }

    #[test]
    fn demography_overrides_reach_groups() {
        let yaml = format!("{MINIMAL}demography:\n  base_birth_rate: 0.01\n");
        let scenario: Scenario = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(scenario.demography.base_birth_rate, 0.01);
        assert_eq!(scenario.demography.crowding_exponent, 1.3);
        let world = scenario.build_world();
        let group = &world.city("Port").unwrap().populations()[0];
        assert_eq!(group.params().base_birth_rate, 0.01);
    }
}
