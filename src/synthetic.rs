//! Synthetic animal tracks for stress testing and benchmarking.
//!
//! Tracks are two-state correlated random walks (an encamped state with
//! short, tortuous steps and an exploratory state with long, directed
//! steps) in projected coordinates, sampled at irregular intervals with
//! occasional long fix failures. The true state of every record is kept as
//! ground truth.
//!
//! Feature-gated behind `synthetic` — not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use trackprep::synthetic::SyntheticScenario;
//!
//! let dataset = SyntheticScenario::herd(5).generate();
//! assert_eq!(dataset.records.len(), 5 * 500);
//! assert_eq!(dataset.states.len(), dataset.records.len());
//! ```

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::LocationRecord;

// ============================================================================
// Types
// ============================================================================

/// Movement parameters of one behavioural state.
#[derive(Debug, Clone, Copy)]
pub struct StateParams {
    /// Mean step length in metres per nominal interval.
    pub mean_step: f64,
    /// Maximum heading change per step in radians (uniform).
    pub max_turn: f64,
    /// Probability of staying in this state at the next fix.
    pub persistence: f64,
}

/// Scenario configuration for generating synthetic tracks.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Number of animals (tracks) to generate.
    pub animal_count: usize,
    /// Fixes attempted per animal.
    pub fixes_per_animal: usize,
    /// Nominal time between fixes.
    pub interval: TimeDelta,
    /// Uniform jitter of each interval as a fraction of it (0.0-1.0).
    pub jitter_fraction: f64,
    /// Probability that a fix attempt starts an outage.
    pub gap_probability: f64,
    /// Length of an outage.
    pub gap_length: TimeDelta,
    /// Encamped and exploratory state parameters.
    pub states: [StateParams; 2],
    /// Time of the first fix of every animal.
    pub start: DateTime<Utc>,
    /// Add a "temperature" covariate with a daily cycle.
    pub with_temperature: bool,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// Generated records with the state that produced each of them.
pub struct SyntheticDataset {
    /// Records grouped by animal, in time order.
    pub records: Vec<LocationRecord>,
    /// True behavioural state per record (0 encamped, 1 exploratory).
    pub states: Vec<u8>,
    /// Number of outages inserted across all animals.
    pub gap_count: usize,
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate the dataset for this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let total = self.animal_count * self.fixes_per_animal;

        let mut records = Vec::with_capacity(total);
        let mut states = Vec::with_capacity(total);
        let mut gap_count = 0;

        let interval_ms = self.interval.num_milliseconds() as f64;

        for animal in 0..self.animal_count {
            let id = format!("animal_{:03}", animal);

            let mut x: f64 = rng.gen_range(0.0..50_000.0);
            let mut y: f64 = rng.gen_range(0.0..50_000.0);
            let mut heading: f64 = rng.gen_range(-PI..PI);
            let mut state: usize = rng.gen_range(0..2);
            let mut time = self.start;

            for fix in 0..self.fixes_per_animal {
                if fix > 0 {
                    let jitter = if self.jitter_fraction > 0.0 {
                        rng.gen_range(-self.jitter_fraction..self.jitter_fraction)
                    } else {
                        0.0
                    };
                    time += TimeDelta::milliseconds((interval_ms * (1.0 + jitter)) as i64);

                    let p: f64 = rng.r#gen();
                    if p < self.gap_probability {
                        time += self.gap_length;
                        gap_count += 1;
                    }

                    let stay: f64 = rng.r#gen();
                    if stay > self.states[state].persistence {
                        state = 1 - state;
                    }

                    let params = self.states[state];
                    heading += rng.gen_range(-params.max_turn..=params.max_turn);
                    // Exponential step lengths around the state mean
                    let u: f64 = rng.gen_range(0.0001..1.0);
                    let step = -params.mean_step * u.ln();
                    x += step * heading.cos();
                    y += step * heading.sin();
                }

                let mut record = LocationRecord::new(id.as_str(), time, x, y);
                if self.with_temperature {
                    let hours = (time - self.start).num_minutes() as f64 / 60.0;
                    let temperature =
                        25.0 + 8.0 * (2.0 * PI * hours / 24.0).sin() + rng.gen_range(-1.0..1.0);
                    record = record.with_covariate("temperature", temperature);
                }

                records.push(record);
                states.push(state as u8);
            }
        }

        SyntheticDataset {
            records,
            states,
            gap_count,
        }
    }
}

// ============================================================================
// Presets
// ============================================================================

impl SyntheticScenario {
    /// Hourly fixes for `animal_count` animals over about three weeks.
    pub fn herd(animal_count: usize) -> Self {
        Self {
            animal_count,
            fixes_per_animal: 500,
            interval: TimeDelta::hours(1),
            jitter_fraction: 0.1,
            gap_probability: 0.01,
            gap_length: TimeDelta::hours(6),
            states: [
                StateParams {
                    mean_step: 50.0,
                    max_turn: PI,
                    persistence: 0.9,
                },
                StateParams {
                    mean_step: 800.0,
                    max_turn: PI / 8.0,
                    persistence: 0.8,
                },
            ],
            start: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            with_temperature: true,
            seed: 42,
        }
    }

    /// Large dataset for benchmarking.
    pub fn extreme_scale() -> Self {
        Self {
            fixes_per_animal: 20_000,
            ..Self::herd(50)
        }
    }

    /// Regular sampling with no outages.
    pub fn without_gaps(animal_count: usize) -> Self {
        Self {
            jitter_fraction: 0.0,
            gap_probability: 0.0,
            ..Self::herd(animal_count)
        }
    }
}
