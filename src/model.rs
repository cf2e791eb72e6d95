//! Explicit model specifications for movement HMMs.
//!
//! Parameter estimation is performed by an external estimator behind the
//! [`MovementModel`] trait. This module only describes the model (number of
//! states, state-dependent distributions, starting values, covariates) and
//! checks that the description is consistent with the prepared data before
//! it is handed over.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::MovementRecord;
use crate::error::{Result, TrackError};

/// State-dependent distribution of step lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDistribution {
    /// Parameters: mean, standard deviation
    Gamma,
    /// Parameters: shape, scale
    Weibull,
    /// Parameters: location, scale (of the log)
    LogNormal,
    /// Parameters: rate
    Exponential,
}

impl StepDistribution {
    /// Parameters per state, excluding zero-mass.
    pub fn arity(&self) -> usize {
        match self {
            StepDistribution::Exponential => 1,
            _ => 2,
        }
    }

    /// Whether parameter `index` must be strictly positive.
    fn requires_positive(&self, index: usize) -> bool {
        !matches!((self, index), (StepDistribution::LogNormal, 0))
    }
}

/// State-dependent distribution of turning angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleDistribution {
    /// Parameters: mean, concentration (>= 0)
    VonMises,
    /// Parameters: mean, concentration in [0, 1)
    WrappedCauchy,
    /// Angles are not modelled
    None,
}

impl AngleDistribution {
    pub fn arity(&self) -> usize {
        match self {
            AngleDistribution::None => 0,
            _ => 2,
        }
    }
}

/// A complete movement HMM description.
///
/// Parameter vectors are laid out parameter-major: for two states and a
/// gamma step distribution, `step_par0 = [mean_1, mean_2, sd_1, sd_2]`,
/// followed by one zero-mass probability per state when the data contain
/// zero-length steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub n_states: usize,
    pub step: StepDistribution,
    pub angle: AngleDistribution,
    pub step_par0: Vec<f64>,
    #[serde(default)]
    pub angle_par0: Vec<f64>,
    /// Covariates of the transition probabilities
    #[serde(default)]
    pub covariates: Vec<String>,
}

impl ModelSpec {
    /// Load a specification from JSON.
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Number of starting values the step distribution needs for `data`.
    pub fn expected_step_params(&self, data: &[MovementRecord]) -> usize {
        let zero_mass = if has_zero_steps(data) { self.n_states } else { 0 };
        self.step.arity() * self.n_states + zero_mass
    }

    /// Check the specification against prepared data.
    ///
    /// # Errors
    /// [`TrackError::InvalidModel`] describing the first inconsistency.
    pub fn validate(&self, data: &[MovementRecord]) -> Result<()> {
        let invalid = |msg: String| Err(TrackError::InvalidModel(msg));
        let n = self.n_states;

        if n == 0 {
            return invalid("at least one state is required".to_string());
        }

        let expected = self.expected_step_params(data);
        if self.step_par0.len() != expected {
            return invalid(format!(
                "step_par0 has {} values, {:?} with {} states needs {}{}",
                self.step_par0.len(),
                self.step,
                n,
                expected,
                if has_zero_steps(data) {
                    " (including zero-mass for zero steps)"
                } else {
                    ""
                }
            ));
        }
        for (i, value) in self.step_par0.iter().enumerate() {
            let param = i / n;
            if !value.is_finite() {
                return invalid(format!("step_par0[{i}] is not finite"));
            }
            if param < self.step.arity() {
                if self.step.requires_positive(param) && *value <= 0.0 {
                    return invalid(format!("step_par0[{i}] must be positive, got {value}"));
                }
            } else if !(0.0..=1.0).contains(value) {
                return invalid(format!("zero-mass step_par0[{i}] must lie in [0, 1]"));
            }
        }

        let expected = self.angle.arity() * n;
        if self.angle_par0.len() != expected {
            return invalid(format!(
                "angle_par0 has {} values, {:?} with {} states needs {}",
                self.angle_par0.len(),
                self.angle,
                n,
                expected
            ));
        }
        for (i, value) in self.angle_par0.iter().enumerate() {
            if !value.is_finite() {
                return invalid(format!("angle_par0[{i}] is not finite"));
            }
            // Means are unrestricted, concentrations follow
            if i < n {
                continue;
            }
            let ok = match self.angle {
                AngleDistribution::VonMises => *value >= 0.0,
                AngleDistribution::WrappedCauchy => (0.0..1.0).contains(value),
                AngleDistribution::None => true,
            };
            if !ok {
                return invalid(format!("angle concentration angle_par0[{i}] = {value} out of range"));
            }
        }

        for name in &self.covariates {
            if let Some(row) = data
                .iter()
                .find(|m| m.record.position.is_some() && !m.record.covariates.contains_key(name))
            {
                return invalid(format!(
                    "covariate '{}' missing for track {} at {}",
                    name, row.record.track_id, row.record.time
                ));
            }
        }

        Ok(())
    }
}

/// True when any observed step has length zero.
pub fn has_zero_steps(data: &[MovementRecord]) -> bool {
    data.iter().any(|m| m.step == Some(0.0))
}

/// An external HMM estimator.
pub trait MovementModel {
    /// The fitted model handed back by the estimator.
    type Fit;

    fn fit(&self, data: &[MovementRecord], spec: &ModelSpec) -> Result<Self::Fit>;
}

/// Validate `spec` against `data`, then fit with `model`.
pub fn fit_model<M: MovementModel>(
    model: &M,
    data: &[MovementRecord],
    spec: &ModelSpec,
) -> Result<M::Fit> {
    spec.validate(data)?;
    model.fit(data, spec)
}
