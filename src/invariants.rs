//! Whole-world audit used by tests and by the engine's optional check.

use thiserror::Error;

use crate::world::World;

#[derive(Debug, Error)]
#[error("{} invariant violation(s):\n{}", .violations.len(), .violations.join("\n"))]
pub struct InvariantError {
    pub violations: Vec<String>,
}

pub fn collect_invariant_errors(world: &World) -> Vec<String> {
    let mut errors = Vec::new();
    for city in world.cities() {
        let name = city.name();
        for (good, amount) in city.inventory() {
            if *amount < 0.0 {
                errors.push(format!("{name}: negative inventory for {good}"));
            }
        }
        for (index, group) in city.populations().iter().enumerate() {
            if group.size < 0.0 {
                errors.push(format!("{name}: group {index} has negative size"));
            }
            if group.sick < 0.0 {
                errors.push(format!("{name}: group {index} has negative sick count"));
            }
            if group.sick > group.size {
                errors.push(format!("{name}: group {index} sick exceeds size"));
            }
            if group.employed as f64 > group.size {
                errors.push(format!("{name}: group {index} employed exceeds size"));
            }
            if !(0.0..=1.0).contains(&group.healthcare) {
                errors.push(format!("{name}: group {index} healthcare out of range"));
            }
        }
        for firm in city.firms() {
            if firm.inventory < 0.0 {
                errors.push(format!("{name}: negative firm inventory for {}", firm.good));
            }
            if firm.total_productivity < 0.0 {
                errors.push(format!("{name}: negative firm productivity for {}", firm.good));
            }
        }
    }
    errors
}

pub fn assert_invariants(world: &World) -> Result<(), InvariantError> {
    let violations = collect_invariant_errors(world);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(InvariantError { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::{City, FOOD};
    use crate::config::{CityConfig, ProvinceConfig};
    use crate::population::PopulationGroup;
    use crate::province::Province;
    use crate::world::Country;

    fn world_with(city: City) -> World {
        let province = Province::new("P", 1, vec![city], &ProvinceConfig::default(), None);
        World::new(vec![Country::new("C", vec![province])])
    }

    #[test]
    fn healthy_world_passes() {
        let city = City::new(
            "Ok",
            vec![PopulationGroup::new(50.0, 0.5, 10.0)],
            Vec::new(),
            &CityConfig::default(),
            None,
        );
        assert!(assert_invariants(&world_with(city)).is_ok());
    }

    #[test]
    fn every_violation_is_reported() {
        let mut group = PopulationGroup::new(10.0, 0.5, 10.0);
        group.employed = 20;
        group.sick = -1.0;
        let mut city = City::new("Bad", vec![group], Vec::new(), &CityConfig::default(), None);
        city.set_stock(FOOD, -5.0);

        let err = assert_invariants(&world_with(city)).unwrap_err();
        assert_eq!(err.violations.len(), 3);
        let message = err.to_string();
        assert!(message.starts_with("3 invariant violation(s)"));
        assert!(message.contains("Bad: negative inventory for food"));
        assert!(message.contains("employed exceeds size"));
    }
}
