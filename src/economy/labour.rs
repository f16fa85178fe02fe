use crate::economy::Firm;
use crate::population::PopulationGroup;

/// Matches employable people to firm demand within one city.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabourMarket;

impl LabourMarket {
    pub fn new() -> Self {
        Self
    }

    fn supply(groups: &[PopulationGroup]) -> Vec<u64> {
        groups
            .iter()
            .map(|group| (group.size.max(0.0) * group.employable.max(0.0)) as u64)
            .collect()
    }

    fn demand(firms: &[Firm]) -> Vec<u64> {
        firms.iter().map(|firm| firm.labour_demand() as u64).collect()
    }

    /// Writes `employed` onto every group and firm and returns the matched
    /// total. Both sides are filled at a common rate, rounded down.
    pub fn clear_market(&self, groups: &mut [PopulationGroup], firms: &mut [Firm]) -> u64 {
        let group_supply = Self::supply(groups);
        let firm_demand = Self::demand(firms);
        let total_supply: u64 = group_supply.iter().sum();
        let total_demand: u64 = firm_demand.iter().sum();

        if total_supply == 0 || total_demand == 0 {
            groups.iter_mut().for_each(|group| group.employed = 0);
            firms.iter_mut().for_each(|firm| firm.employed = 0);
            return 0;
        }

        let total_employed = total_supply.min(total_demand);

        let hire_rate = total_employed as f64 / total_supply as f64;
        for (group, supply) in groups.iter_mut().zip(&group_supply) {
            group.employed = ((hire_rate * *supply as f64) as u64).min(*supply);
        }

        let fill_rate = total_employed as f64 / total_demand as f64;
        for (firm, demand) in firms.iter_mut().zip(&firm_demand) {
            firm.employed = ((fill_rate * *demand as f64) as u64).min(*demand);
        }

        total_employed
    }
}
