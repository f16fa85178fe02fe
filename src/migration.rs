//! Migration engine: moves whole people between population groups.
//!
//! Two channels exist. The intergroup channel works inside one city, the
//! intercity channel between two cities of a province. Every transfer moves
//! the same integer amount out of the source and into the target, so no
//! operation here creates or destroys population.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::city::City;
use crate::population::PopulationGroup;
use crate::rng::RandomSource;

/// Multiplicative friction between two places, keyed by city name.
pub trait DistanceProvider: Send + Sync {
    fn weight(&self, source_key: &str, target_key: &str) -> f64;
}

/// No friction anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralDistance;

impl DistanceProvider for NeutralDistance {
    fn weight(&self, _source_key: &str, _target_key: &str) -> f64 {
        1.0
    }
}

/// Directed weights for configured city pairs; unknown pairs weigh 1.0.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    weights: HashMap<(String, String), f64>,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>, weight: f64) {
        self.weights.insert((from.into(), to.into()), weight);
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl DistanceProvider for DistanceTable {
    fn weight(&self, source_key: &str, target_key: &str) -> f64 {
        self.weights
            .get(&(source_key.to_string(), target_key.to_string()))
            .copied()
            .unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub intergroup_rate: f64,
    pub intercity_rate: f64,
}

impl MigrationConfig {
    fn clamped(self) -> Self {
        Self {
            intergroup_rate: clamp_probability(self.intergroup_rate),
            intercity_rate: clamp_probability(self.intercity_rate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Intergroup,
    Intercity,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Intergroup => "intergroup",
            Channel::Intercity => "intercity",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One group-to-group transfer. Groups are referenced by their index in the
/// owning city's population list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMigrationEvent {
    pub source_city: String,
    pub source_group_index: usize,
    pub target_city: String,
    pub target_group_index: usize,
    pub amount: u64,
    pub channel: Channel,
}

#[derive(Clone)]
pub struct Migration {
    config: MigrationConfig,
    distance: Arc<dyn DistanceProvider>,
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Migration {
    /// Rates are clamped into `[0, 1]`.
    pub fn new(config: MigrationConfig, distance: Option<Arc<dyn DistanceProvider>>) -> Self {
        Self {
            config: config.clamped(),
            distance: distance.unwrap_or_else(|| Arc::new(NeutralDistance)),
        }
    }

    pub fn for_intergroup(rate: f64, distance: Option<Arc<dyn DistanceProvider>>) -> Self {
        Self::new(
            MigrationConfig {
                intergroup_rate: rate,
                intercity_rate: 0.0,
            },
            distance,
        )
    }

    pub fn for_intercity(rate: f64, distance: Option<Arc<dyn DistanceProvider>>) -> Self {
        Self::new(
            MigrationConfig {
                intergroup_rate: 0.0,
                intercity_rate: rate,
            },
            distance,
        )
    }

    pub fn config(&self) -> MigrationConfig {
        self.config
    }

    pub fn intergroup_rate(&self) -> f64 {
        self.config.intergroup_rate
    }

    pub fn intercity_rate(&self) -> f64 {
        self.config.intercity_rate
    }

    fn distance_weight(&self, source_key: &str, target_key: &str) -> f64 {
        self.distance.weight(source_key, target_key).max(0.0)
    }

    /// Number of people out of `population` that move with `probability`.
    fn draw_count(&self, population: f64, probability: f64, rng: &mut dyn RandomSource) -> u64 {
        let trials = population.max(0.0) as u64;
        let probability = clamp_probability(probability);
        if trials == 0 || probability <= 0.0 {
            return 0;
        }
        // Halves round to even.
        rng.binomial(trials, probability)
            .unwrap_or_else(|| (trials as f64 * probability).round_ties_even() as u64)
    }

    /// Keeps candidates strictly more attractive than the source, weighted
    /// by the attractiveness gap times the distance weight.
    fn weighted_candidates<'a, I>(
        &self,
        source_attractiveness: f64,
        source_key: &str,
        candidates: I,
    ) -> Vec<(usize, f64)>
    where
        I: IntoIterator<Item = (usize, f64, &'a str)>,
    {
        candidates
            .into_iter()
            .filter_map(|(index, attractiveness, key)| {
                let gap = attractiveness - source_attractiveness;
                if gap <= 0.0 {
                    return None;
                }
                let weight = gap * self.distance_weight(source_key, key);
                (weight > 0.0).then_some((index, weight))
            })
            .collect()
    }

    /// Picks a city out of `candidates` and returns its position in that slice.
    pub fn choose_target_city(
        &self,
        source: &City,
        candidates: &[&City],
        rng: &mut dyn RandomSource,
    ) -> Option<usize> {
        let weighted = self.weighted_candidates(
            source.migration_attractiveness(),
            source.name(),
            candidates
                .iter()
                .enumerate()
                .map(|(index, city)| (index, city.migration_attractiveness(), city.name())),
        );
        if weighted.is_empty() {
            return None;
        }
        let weights: Vec<f64> = weighted.iter().map(|(_, weight)| *weight).collect();
        let choice = weighted_choice_index(&weights, rng)?;
        Some(weighted[choice].0)
    }

    pub fn migrate_within_city(
        &self,
        city: &mut City,
        rng: &mut dyn RandomSource,
    ) -> Vec<GroupMigrationEvent> {
        let mut events = Vec::new();
        if self.intergroup_rate() <= 0.0 {
            return events;
        }

        let city_name = city.name().to_string();
        let groups = city.populations_mut();
        for source_index in 0..groups.len() {
            let source_attractiveness = groups[source_index].migration_attractiveness;
            let targets = self.weighted_candidates(
                source_attractiveness,
                &city_name,
                groups
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != source_index)
                    .map(|(index, group)| {
                        (index, group.migration_attractiveness, city_name.as_str())
                    }),
            );
            if targets.is_empty() {
                continue;
            }

            let weights: Vec<f64> = targets.iter().map(|(_, weight)| *weight).collect();
            let Some(choice) = weighted_choice_index(&weights, rng) else {
                continue;
            };
            let target_index = targets[choice].0;

            let requested =
                self.draw_count(groups[source_index].size, self.intergroup_rate(), rng);
            let (source, target) = pair_mut(groups, source_index, target_index);
            let moved = safe_transfer(source, target, requested);
            if moved == 0 {
                continue;
            }

            debug!(
                city = %city_name,
                from = source_index,
                to = target_index,
                amount = moved,
                "intergroup migration"
            );
            events.push(GroupMigrationEvent {
                source_city: city_name.clone(),
                source_group_index: source_index,
                target_city: city_name.clone(),
                target_group_index: target_index,
                amount: moved,
                channel: Channel::Intergroup,
            });
        }

        events
    }

    pub fn migrate_between_cities(
        &self,
        source: &mut City,
        target: &mut City,
        rng: &mut dyn RandomSource,
    ) -> Vec<GroupMigrationEvent> {
        let mut events = Vec::new();
        if self.intercity_rate() <= 0.0 {
            return events;
        }
        if source.populations().is_empty() || target.populations().is_empty() {
            return events;
        }
        if source.total_population() <= 0.0 {
            return events;
        }

        let gap = target.migration_attractiveness() - source.migration_attractiveness();
        if gap <= 0.0 {
            return events;
        }

        // Per-person probability of leaving this tick.
        let p_move = self.intercity_rate() * gap * self.distance_weight(source.name(), target.name());
        if p_move <= 0.0 {
            return events;
        }

        let source_name = source.name().to_string();
        let target_name = target.name().to_string();
        let destinations = target.populations_mut();
        let origins = source.populations_mut();

        for (source_index, origin) in origins.iter_mut().enumerate() {
            let requested = self.draw_count(origin.size, p_move, rng);
            if requested == 0 {
                continue;
            }

            let plan = if source_index < destinations.len() {
                vec![(source_index, requested)]
            } else {
                fallback_split(requested, destinations)
            };

            for (target_index, chunk) in plan {
                let moved = safe_transfer(origin, &mut destinations[target_index], chunk);
                if moved == 0 {
                    continue;
                }
                debug!(
                    from_city = %source_name,
                    to_city = %target_name,
                    from = source_index,
                    to = target_index,
                    amount = moved,
                    "intercity migration"
                );
                events.push(GroupMigrationEvent {
                    source_city: source_name.clone(),
                    source_group_index: source_index,
                    target_city: target_name.clone(),
                    target_group_index: target_index,
                    amount: moved,
                    channel: Channel::Intercity,
                });
            }
        }

        events
    }
}

fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Roulette-wheel selection over non-negative weights.
///
/// Sources without a uniform draw use the midpoint of the wheel.
fn weighted_choice_index(weights: &[f64], rng: &mut dyn RandomSource) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    let threshold = rng.uniform(0.0, total).unwrap_or(total / 2.0);
    let mut running = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        running += weight;
        if threshold <= running {
            return Some(index);
        }
    }
    Some(weights.len() - 1)
}

/// Moves up to `requested` whole people and returns how many moved.
fn safe_transfer(
    source: &mut PopulationGroup,
    target: &mut PopulationGroup,
    requested: u64,
) -> u64 {
    let moved = requested.min(source.headcount());
    if moved == 0 {
        return 0;
    }
    source.size -= moved as f64;
    target.size += moved as f64;
    // Jobs and sickness cannot outnumber the people left behind.
    source.employed = source.employed.min(source.headcount());
    source.sick = source.sick.min(source.size);
    moved
}

/// Splits `amount` over `destinations` in proportion to their headcount,
/// using largest-remainder rounding so the parts sum to `amount` exactly.
/// Empty destinations share the amount evenly, earlier indices first.
fn fallback_split(amount: u64, destinations: &[PopulationGroup]) -> Vec<(usize, u64)> {
    if amount == 0 || destinations.is_empty() {
        return Vec::new();
    }

    let sizes: Vec<u64> = destinations.iter().map(PopulationGroup::headcount).collect();
    let total: u64 = sizes.iter().sum();
    let count = destinations.len() as u64;

    let allocation: Vec<u64> = if total == 0 {
        let base = amount / count;
        let extra = (amount % count) as usize;
        (0..destinations.len())
            .map(|index| base + u64::from(index < extra))
            .collect()
    } else {
        let mut allocation = Vec::with_capacity(sizes.len());
        let mut remainders = Vec::with_capacity(sizes.len());
        for (index, size) in sizes.iter().enumerate() {
            let share = u128::from(amount) * u128::from(*size);
            let total = u128::from(total);
            // share / total <= amount, so the quotient fits in u64.
            allocation.push((share / total) as u64);
            remainders.push((index, share % total));
        }
        // Stable sort keeps index order among equal remainders.
        remainders.sort_by(|a, b| b.1.cmp(&a.1));
        let assigned: u64 = allocation.iter().sum();
        let leftover = amount.saturating_sub(assigned) as usize;
        for (index, _) in remainders.into_iter().cycle().take(leftover) {
            allocation[index] += 1;
        }
        allocation
    };

    allocation
        .into_iter()
        .enumerate()
        .filter(|(_, amount)| *amount > 0)
        .collect()
}

/// Two distinct mutable elements of one slice.
pub(crate) fn pair_mut<T>(items: &mut [T], first: usize, second: usize) -> (&mut T, &mut T) {
    assert_ne!(first, second, "pair_mut needs two distinct indices");
    if first < second {
        let (head, tail) = items.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}
