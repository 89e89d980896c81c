//! Detection of particles leaving the beam.

use super::{fin, parameters::IntegrationParameters, stepping::ParticleState};
use crate::{beam::particle::LossReason, constants::TWO_PI};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Configuration parameters for the particle integrator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct IntegratorConfig {
    /// Largest accepted distance of a particle from the mean bunch phase [rad].
    pub max_phase_deviation: fin,
    /// Smallest accepted axial velocity in units of c.
    pub min_axial_velocity: fin,
    /// Largest accepted ratio of radial to axial velocity.
    pub max_divergence: fin,
    /// Largest number of integration steps per particle, unlimited if `None`.
    pub max_steps: Option<u64>,
}

impl IntegratorConfig {
    pub const DEFAULT_MAX_PHASE_DEVIATION: fin = TWO_PI;
    pub const DEFAULT_MIN_AXIAL_VELOCITY: fin = 1e-3;
    pub const DEFAULT_MAX_DIVERGENCE: fin = 1.0;
    pub const DEFAULT_MAX_STEPS: Option<u64> = None;

    /// Panics if the configuration is invalid.
    pub fn validate(&self) {
        assert!(
            self.max_phase_deviation > 0.0,
            "Maximum phase deviation must be larger than zero."
        );
        assert!(
            self.min_axial_velocity >= 0.0 && self.min_axial_velocity < 1.0,
            "Minimum axial velocity must be in the range [0, 1)."
        );
        assert!(
            self.max_divergence > 0.0,
            "Maximum divergence must be larger than zero."
        );
    }
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorConfig {
            max_phase_deviation: Self::DEFAULT_MAX_PHASE_DEVIATION,
            min_axial_velocity: Self::DEFAULT_MIN_AXIAL_VELOCITY,
            max_divergence: Self::DEFAULT_MAX_DIVERGENCE,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }
}

/// Checks whether a particle in the given state has left the beam.
///
/// The criteria are tested in a fixed order and the first one that
/// applies is reported.
///
/// # Parameters
///
/// - `config`: Loss thresholds.
/// - `state`: Current state of the particle.
/// - `parameters`: Parameters of the current cell.
/// - `n_steps`: Number of integration steps the particle has taken.
pub fn detect_loss(
    config: &IntegratorConfig,
    state: &ParticleState,
    parameters: &IntegrationParameters,
    n_steps: u64,
) -> Option<LossReason> {
    if state.x >= parameters.aperture {
        return Some(LossReason::Radius);
    }
    if !parameters.drift
        && fin::abs(state.phi - parameters.mean_phase) > config.max_phase_deviation
    {
        return Some(LossReason::Phase);
    }
    let beta_z_sqr = state.axial_velocity_sqr();
    if state.gamma < 1.0
        || beta_z_sqr <= config.min_axial_velocity * config.min_axial_velocity
    {
        return Some(LossReason::AxialField);
    }
    if fin::abs(state.radial_velocity()) > config.max_divergence * fin::sqrt(beta_z_sqr) {
        return Some(LossReason::TransverseField);
    }
    if !state.is_finite() {
        return Some(LossReason::CombinedField);
    }
    if config.max_steps.map_or(false, |max_steps| n_steps > max_steps) {
        return Some(LossReason::StepLimit);
    }
    None
}
