//! Self-field of the bunch, modelled as a uniformly charged ellipsoid.

use super::{ffd, form_factor::form_factor, LocalField};
use crate::{
    beam::particle::Particle,
    constants::{ALFVEN_CURRENT, TWO_PI},
    error::{Error, Result},
    kinematics::{energy_to_velocity, wrap_phase},
};
use ndarray::prelude::*;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Configuration parameters for the space charge model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SpaceChargeConfig {
    /// Whether the self-field of the bunch should be included.
    pub enabled: bool,
    /// Number of longitudinal slices used for the radial self-field.
    pub n_slices: usize,
}

impl SpaceChargeConfig {
    pub const DEFAULT_ENABLED: bool = true;
    pub const DEFAULT_N_SLICES: usize = 1;

    /// Panics if the configuration is invalid.
    pub fn validate(&self) {
        assert!(
            self.n_slices > 0,
            "Number of space charge slices must be larger than zero."
        );
    }

    /// Checks a user supplied configuration.
    pub fn try_validate(&self) -> Result<()> {
        if self.n_slices == 0 {
            return Err(Error::InvalidSpaceCharge(
                "number of slices must be larger than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SpaceChargeConfig {
    fn default() -> Self {
        SpaceChargeConfig {
            enabled: Self::DEFAULT_ENABLED,
            n_slices: Self::DEFAULT_N_SLICES,
        }
    }
}

/// Dimensions of the equivalent uniform bunch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BunchGeometry {
    /// Bunch radius in wavelengths.
    pub radius: ffd,
    /// Full bunch length in wavelengths.
    pub length: ffd,
    /// Circular mean phase of the bunch [rad].
    pub mean_phase: ffd,
    /// Mean Lorentz factor.
    pub mean_gamma: ffd,
    /// Ratio of half-length to radius in the bunch rest frame.
    pub aspect_ratio: ffd,
    /// Form factor for the aspect ratio.
    pub form_factor: ffd,
}

/// Space charge field coefficients for every particle, frozen at cell entry.
///
/// Lost particles always have zero coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct SpaceChargeSnapshot {
    aqz: Array1<ffd>,
    aqr: Array1<ffd>,
    geometry: Option<BunchGeometry>,
}

impl SpaceChargeSnapshot {
    /// Creates a snapshot without any self-field.
    pub fn zero(n_particles: usize) -> Self {
        SpaceChargeSnapshot {
            aqz: Array1::zeros(n_particles),
            aqr: Array1::zeros(n_particles),
            geometry: None,
        }
    }

    /// Computes the self-field coefficients of the alive particles.
    ///
    /// # Parameters
    ///
    /// - `config`: Space charge configuration.
    /// - `particles`: The full ensemble, lost particles are ignored.
    /// - `current`: Beam current carried by the alive particles [A].
    ///
    /// # Returns
    ///
    /// A snapshot indexed like `particles`. Degenerate bunches (no alive
    /// particles, no current, zero radius or zero length) give the zero snapshot.
    pub fn compute(config: &SpaceChargeConfig, particles: &[Particle], current: ffd) -> Self {
        let mut snapshot = Self::zero(particles.len());
        if !config.enabled || current <= 0.0 {
            return snapshot;
        }
        let alive: Vec<usize> = particles
            .iter()
            .enumerate()
            .filter_map(|(idx, particle)| if particle.is_alive() { Some(idx) } else { None })
            .collect();
        if alive.is_empty() {
            return snapshot;
        }
        let n_alive = alive.len() as ffd;

        let (sum_sin, sum_cos) = alive.iter().fold((0.0, 0.0), |(s, c), &idx| {
            let (sin, cos) = particles[idx].phi.sin_cos();
            (s + sin, c + cos)
        });
        let mean_phase = ffd::atan2(sum_sin, sum_cos);
        let deviations: Vec<ffd> = alive
            .iter()
            .map(|&idx| wrap_phase(particles[idx].phi - mean_phase))
            .collect();
        let min_deviation = deviations.iter().cloned().fold(ffd::INFINITY, ffd::min);
        let max_deviation = deviations.iter().cloned().fold(ffd::NEG_INFINITY, ffd::max);
        let phase_extent = max_deviation - min_deviation;

        let mean_gamma = alive.iter().map(|&idx| particles[idx].gamma()).sum::<ffd>() / n_alive;
        let mean_velocity = energy_to_velocity(mean_gamma);
        let mean_sqr_radius = alive
            .iter()
            .map(|&idx| particles[idx].x * particles[idx].x)
            .sum::<ffd>()
            / n_alive;

        let radius = ffd::sqrt(2.0 * mean_sqr_radius);
        let length = mean_velocity * phase_extent / TWO_PI;
        if !(radius > 0.0 && length > 0.0) {
            return snapshot;
        }
        let aspect_ratio = mean_gamma * length / (2.0 * radius);
        let m = form_factor(aspect_ratio);
        let strength = 6.0 * current / (ALFVEN_CURRENT * radius * radius * length);

        let n_slices = config.n_slices.max(1);
        let slice_of = |deviation: ffd| {
            let idx = ((deviation - min_deviation) / phase_extent * n_slices as ffd).floor();
            usize::min(idx.max(0.0) as usize, n_slices - 1)
        };
        let mut slice_counts = vec![0usize; n_slices];
        let mut slice_sqr_radii = vec![0.0; n_slices];
        for (&idx, &deviation) in alive.iter().zip(deviations.iter()) {
            let slice = slice_of(deviation);
            slice_counts[slice] += 1;
            slice_sqr_radii[slice] += particles[idx].x * particles[idx].x;
        }
        let slice_radii_sqr: Vec<ffd> = slice_counts
            .iter()
            .zip(slice_sqr_radii.iter())
            .map(|(&count, &sum)| {
                if count > 0 {
                    2.0 * sum / count as ffd
                } else {
                    0.0
                }
            })
            .collect();

        let radial_factor = 0.5 * (1.0 - m) / (mean_gamma * mean_gamma);
        for (&idx, &deviation) in alive.iter().zip(deviations.iter()) {
            snapshot.aqz[idx] = strength * m * mean_velocity * deviation / TWO_PI;

            let slice = slice_of(deviation);
            let slice_radius_sqr = slice_radii_sqr[slice];
            if slice_radius_sqr > 0.0 {
                let density_scale = slice_counts[slice] as ffd * n_slices as ffd / n_alive
                    * (radius * radius / slice_radius_sqr);
                let x = particles[idx].x;
                let effective_radius = if x * x <= slice_radius_sqr {
                    x
                } else {
                    slice_radius_sqr / x
                };
                snapshot.aqr[idx] = strength * density_scale * radial_factor * effective_radius;
            }
        }
        snapshot.geometry = Some(BunchGeometry {
            radius,
            length,
            mean_phase,
            mean_gamma,
            aspect_ratio,
            form_factor: m,
        });
        snapshot
    }

    pub fn n_particles(&self) -> usize {
        self.aqz.len()
    }

    /// Longitudinal coefficients.
    pub fn aqz(&self) -> &Array1<ffd> {
        &self.aqz
    }

    /// Radial coefficients.
    pub fn aqr(&self) -> &Array1<ffd> {
        &self.aqr
    }

    pub fn geometry(&self) -> Option<&BunchGeometry> {
        self.geometry.as_ref()
    }

    pub fn is_zero(&self) -> bool {
        self.aqz.iter().chain(self.aqr.iter()).all(|&value| value == 0.0)
    }

    /// Self-field acting on the particle with the given index.
    pub fn evaluate(&self, particle_idx: usize) -> LocalField {
        LocalField {
            ez: self.aqz[particle_idx],
            er: self.aqr[particle_idx],
            ..LocalField::default()
        }
    }
}
