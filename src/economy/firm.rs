use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rng::{sample_count, RandomSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    State,
    Corporate,
    Cooperative,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Ownership::State => "state",
            Ownership::Corporate => "corporate",
            Ownership::Cooperative => "cooperative",
        };
        f.write_str(label)
    }
}

/// A producer of a single good.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firm {
    /// Output per worker per tick.
    pub productivity: f64,
    pub production_capacity: f64,
    pub capital: f64,
    pub ownership: Ownership,
    pub wage: f64,
    pub good: String,
    pub employed: u64,
    pub total_productivity: f64,
    pub inventory: f64,
}

impl Firm {
    pub fn new(
        productivity: f64,
        production_capacity: f64,
        capital: f64,
        ownership: Ownership,
        wage: f64,
        good: impl Into<String>,
    ) -> Self {
        Self {
            productivity,
            production_capacity,
            capital,
            ownership,
            wage,
            good: good.into(),
            employed: 0,
            total_productivity: 0.0,
            inventory: 0.0,
        }
    }

    /// Workers wanted, limited by capacity and by the capital to pay them.
    pub fn labour_demand(&self) -> f64 {
        let by_capacity = if self.productivity > 0.0 {
            self.production_capacity / self.productivity
        } else {
            0.0
        };
        let by_capital = if self.wage > 0.0 {
            self.capital / self.wage
        } else {
            0.0
        };
        by_capacity.min(by_capital).max(0.0)
    }

    pub fn update_total_productivity(&mut self) -> f64 {
        self.total_productivity = (self.productivity * self.employed as f64)
            .min(self.production_capacity)
            .max(0.0);
        self.total_productivity
    }

    pub fn produce(&mut self, rng: &mut dyn RandomSource) {
        self.inventory += sample_count(self.total_productivity, rng) as f64;
    }

    pub fn tick(&mut self, rng: &mut dyn RandomSource) {
        self.update_total_productivity();
        self.produce(rng);
    }

    /// Hands the whole inventory over and empties it.
    pub fn transfer_to_city(&mut self) -> f64 {
        std::mem::take(&mut self.inventory)
    }

    pub fn is_state_owned(&self) -> bool {
        self.ownership == Ownership::State
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MeanRng;

    impl RandomSource for MeanRng {
        fn normal(&mut self, mean: f64, _std_dev: f64) -> f64 {
            mean
        }
    }

    #[test]
    fn demand_limited_by_capital() {
        let firm = Firm::new(2.0, 1000.0, 300.0, Ownership::State, 10.0, "food");
        assert_eq!(firm.labour_demand(), 30.0);
    }

    #[test]
    fn demand_zero_for_degenerate_inputs() {
        let firm = Firm::new(0.0, 1000.0, 300.0, Ownership::Corporate, 10.0, "tools");
        assert_eq!(firm.labour_demand(), 0.0);
        let unpaid = Firm::new(2.0, 1000.0, 300.0, Ownership::Corporate, 0.0, "tools");
        assert_eq!(unpaid.labour_demand(), 0.0);
    }

    #[test]
    fn production_capped_and_drained() {
        let mut firm = Firm::new(5.0, 100.0, 1000.0, Ownership::State, 1.0, "food");
        firm.employed = 40;
        firm.tick(&mut MeanRng);
        assert_eq!(firm.total_productivity, 100.0);
        assert_eq!(firm.inventory, 100.0);
        assert_eq!(firm.transfer_to_city(), 100.0);
        assert_eq!(firm.inventory, 0.0);
    }

    #[test]
    fn ownership_parses_lowercase() {
        let ownership: Ownership = serde_yaml::from_str("cooperative").unwrap();
        assert_eq!(ownership, Ownership::Cooperative);
        assert_eq!(Ownership::State.to_string(), "state");
    }
}
