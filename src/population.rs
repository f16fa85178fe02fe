use serde::{Deserialize, Serialize};

use crate::rng::{sample_count, RandomSource};

/// Tuned demographic constants. Copied into every group at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographyParams {
    pub base_birth_rate: f64,
    pub base_death_rate: f64,
    /// Birth-rate reduction per unit of employment rate.
    pub employment_birth_drag: f64,
    /// Birth-rate increase per unit of healthcare.
    pub healthcare_birth_boost: f64,
    /// Death rate scales with `death_offset - death_healthcare_slope * healthcare`.
    pub death_offset: f64,
    pub death_healthcare_slope: f64,
    pub base_sickness_rate: f64,
    pub initial_sick_rate: f64,
    /// Share of a healthy group that can work.
    pub employable_ceiling: f64,
    /// Healthcare multiplier while the sick fit within capacity.
    pub overcapacity_bonus: f64,
    /// Exponent of the `(capacity / size)` penalty once capacity is exceeded.
    pub crowding_exponent: f64,
    pub healthcare_weight: f64,
    pub employment_weight: f64,
}

impl Default for DemographyParams {
    fn default() -> Self {
        Self {
            base_birth_rate: 0.0002,
            base_death_rate: 0.00015,
            employment_birth_drag: 0.15,
            healthcare_birth_boost: 0.1,
            death_offset: 2.001,
            death_healthcare_slope: 2.0,
            base_sickness_rate: 0.025,
            initial_sick_rate: 0.02,
            employable_ceiling: 0.7,
            overcapacity_bonus: 1.05,
            crowding_exponent: 1.3,
            healthcare_weight: 0.3,
            employment_weight: 0.2,
        }
    }
}

/// Food units one healthy member eats per tick.
pub const FOOD_PER_CAPITA: f64 = 3.0;

/// One demographic cohort inside a city.
///
/// `size` is a continuous headcount. The migration engine moves whole people
/// in and out of it; the labour market writes `employed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationGroup {
    pub size: f64,
    pub base_healthcare: f64,
    pub healthcare: f64,
    pub healthcare_capacity: f64,
    pub sick: f64,
    pub sick_rate: f64,
    pub employable: f64,
    pub employed: u64,
    pub employment_rate: f64,
    pub birth_rate: f64,
    pub births: u64,
    pub deaths: u64,
    pub migration_attractiveness: f64,
    params: DemographyParams,
}

impl PopulationGroup {
    pub fn new(size: f64, healthcare: f64, healthcare_capacity: f64) -> Self {
        Self::with_params(size, healthcare, healthcare_capacity, DemographyParams::default())
    }

    pub fn with_params(
        size: f64,
        healthcare: f64,
        healthcare_capacity: f64,
        params: DemographyParams,
    ) -> Self {
        let healthcare = healthcare.clamp(0.0, 1.0);
        let sick_rate = params.initial_sick_rate;
        let mut group = Self {
            size: size.max(0.0),
            base_healthcare: healthcare,
            healthcare,
            healthcare_capacity,
            sick: 0.0,
            sick_rate,
            employable: params.employable_ceiling - sick_rate,
            employed: 0,
            employment_rate: 0.0,
            birth_rate: 0.0,
            births: 0,
            deaths: 0,
            migration_attractiveness: 0.0,
            params,
        };
        group.refresh_attractiveness();
        group
    }

    pub fn params(&self) -> &DemographyParams {
        &self.params
    }

    /// Advances the cohort by one tick. The four steps feed each other and
    /// must run in this order.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) {
        self.update_demographics(rng);
        self.update_sick();
        self.update_healthcare();
        self.update_employment();
    }

    pub fn update_demographics(&mut self, rng: &mut dyn RandomSource) {
        let p = &self.params;
        let death_rate =
            p.base_death_rate * (p.death_offset - p.death_healthcare_slope * self.healthcare);
        self.birth_rate = p.base_birth_rate
            * (1.0
                - (self.employment_rate * p.employment_birth_drag
                    - self.healthcare * p.healthcare_birth_boost))
                .max(0.0);

        let expected_births = self.size * self.birth_rate;
        let expected_deaths = self.size * death_rate;

        self.births = sample_count(expected_births, rng);
        self.deaths = sample_count(expected_deaths, rng);

        self.size = (self.size + self.births as f64 - self.deaths as f64).max(0.0);
    }

    pub fn update_sick(&mut self) {
        self.sick = (self.size * self.params.base_sickness_rate * (1.0 - self.healthcare))
            .min(self.size)
            .max(0.0);
        self.sick_rate = if self.size > 0.0 {
            self.sick / self.size
        } else {
            0.0
        };
    }

    pub fn update_healthcare(&mut self) {
        let modifier = if self.capacity_load() <= 1.0 || self.size <= 0.0 {
            self.params.overcapacity_bonus
        } else {
            (self.healthcare_capacity.max(0.0) / self.size).powf(self.params.crowding_exponent)
        };
        self.healthcare = (self.base_healthcare * modifier).clamp(0.0, 1.0);
        self.refresh_attractiveness();
    }

    pub fn update_employment(&mut self) {
        self.employable = self.params.employable_ceiling - self.sick_rate;
        self.employment_rate = if self.size > 0.0 {
            self.employed as f64 / self.size
        } else {
            0.0
        };
    }

    pub fn compute_food_consumption(&self) -> f64 {
        self.size * (FOOD_PER_CAPITA - self.sick_rate)
    }

    /// Scales sickness by the unmet share of a full ration.
    pub fn starve(&mut self, food_deficit: f64) {
        if self.size <= 0.0 {
            return;
        }
        let factor = food_deficit.max(0.0) / (self.size * FOOD_PER_CAPITA);
        self.sick = (self.sick * factor).min(self.size);
    }

    /// Whole people available to leave the group.
    pub fn headcount(&self) -> u64 {
        self.size.max(0.0) as u64
    }

    fn capacity_load(&self) -> f64 {
        if self.healthcare_capacity > 0.0 {
            self.sick / self.healthcare_capacity
        } else if self.sick > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn refresh_attractiveness(&mut self) {
        self.migration_attractiveness = self.healthcare * self.params.healthcare_weight
            + self.employment_rate * self.params.employment_weight;
    }
}
