//! Plain-text tick report printed by the CLI.

use std::fmt::Write;

use crate::migration::GroupMigrationEvent;
use crate::world::{CitySnapshot, WorldSnapshot};

pub fn render(snapshot: &WorldSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Tick {} (population {:.0}):",
        snapshot.tick, snapshot.total_population
    );
    for province in &snapshot.provinces {
        let _ = writeln!(out, "  Province {}:", province.name);
        for city in &province.cities {
            render_city(&mut out, city);
        }
        for event in &province.migrations {
            render_event(&mut out, event);
        }
    }
    out
}

fn render_city(out: &mut String, city: &CitySnapshot) {
    let totals = &city.totals;
    let _ = writeln!(
        out,
        "    {}: population = {:.0}, births = {}, deaths = {}, productivity = {:.1}, employed = {}",
        city.name,
        totals.total_population,
        totals.births,
        totals.deaths,
        totals.productivity,
        city.employed
    );
    if let Some(deficit) = city.last_food_deficit {
        let _ = writeln!(out, "      food deficit = {deficit:.1}");
    }
    let stocks: Vec<String> = city
        .inventory
        .iter()
        .map(|(good, amount)| format!("{good} = {amount:.0}"))
        .collect();
    let _ = writeln!(out, "      inventory: {}", stocks.join(", "));
    for group in &city.groups {
        let _ = writeln!(
            out,
            "      group {}: size = {:.0}, healthcare = {:.3}, births = {}, deaths = {}, employment = {:.3}, sick = {:.3}",
            group.group,
            group.size,
            group.healthcare,
            group.last_births,
            group.last_deaths,
            group.employment_rate,
            group.sick_rate
        );
    }
    for firm in &city.firms {
        let _ = writeln!(
            out,
            "      firm {} ({}): employed = {}, productivity = {:.1}",
            firm.good, firm.ownership, firm.employed, firm.total_productivity
        );
    }
    for event in &city.migrations {
        render_event(out, event);
    }
}

fn render_event(out: &mut String, event: &GroupMigrationEvent) {
    let _ = writeln!(
        out,
        "      {} {}[{}] -> {}[{}]: {}",
        event.channel,
        event.source_city,
        event.source_group_index,
        event.target_city,
        event.target_group_index,
        event.amount
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::{CityTotals, FirmSummary, GroupSummary};
    use crate::economy::Ownership;
    use crate::migration::Channel;
    use crate::world::ProvinceSnapshot;

    fn event(channel: Channel, target_city: &str) -> GroupMigrationEvent {
        GroupMigrationEvent {
            source_city: "Ash".into(),
            source_group_index: 0,
            target_city: target_city.into(),
            target_group_index: 1,
            amount: 7,
            channel,
        }
    }

    fn snapshot() -> WorldSnapshot {
        let city = CitySnapshot {
            name: "Ash".into(),
            totals: CityTotals {
                total_population: 900.0,
                births: 4,
                deaths: 2,
                employable: 0.6,
                productivity: 120.0,
            },
            migration_attractiveness: 0.0,
            employed: 40,
            last_food_deficit: Some(55.5),
            inventory: [("food".to_string(), 0.0), ("tools".to_string(), 12.0)]
                .into_iter()
                .collect(),
            groups: vec![GroupSummary {
                group: 0,
                size: 900.0,
                healthcare: 0.5,
                last_births: 4,
                last_deaths: 2,
                employment_rate: 0.25,
                sick_rate: 0.01,
            }],
            firms: vec![FirmSummary {
                ownership: Ownership::Corporate,
                good: "tools".into(),
                employed: 40,
                total_productivity: 120.0,
            }],
            migrations: vec![event(Channel::Intergroup, "Ash")],
        };
        WorldSnapshot {
            scenario: "demo".into(),
            tick: 6,
            total_population: 900.0,
            provinces: vec![ProvinceSnapshot {
                name: "Moor".into(),
                area: 10,
                cities: vec![city],
                migrations: vec![event(Channel::Intercity, "Birch")],
            }],
        }
    }

    #[test]
    fn report_covers_city_economy_and_both_channels() {
        let text = render(&snapshot());
        assert!(text.starts_with("Tick 6 (population 900):"));
        assert!(text.contains("births = 4, deaths = 2, productivity = 120.0"));
        assert!(text.contains("food deficit = 55.5"));
        assert!(text.contains("inventory: food = 0, tools = 12"));
        assert!(text.contains("firm tools (corporate): employed = 40"));
        assert!(text.contains("intergroup Ash[0] -> Ash[1]: 7"));
        assert!(text.contains("intercity Ash[0] -> Birch[1]: 7"));
    }

    #[test]
    fn fed_city_omits_deficit_line() {
        let mut snapshot = snapshot();
        snapshot.provinces[0].cities[0].last_food_deficit = None;
        assert!(!render(&snapshot).contains("food deficit"));
    }
}
