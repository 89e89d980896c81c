//! Reduction of the particle ensemble to beam quality metrics.

pub mod spectrum;

use crate::{
    beam::{particle::Particle, Beam},
    constants::MEV_TO_EV,
    kinematics::{rad_to_deg, wrap_phase},
};
use ndarray::prelude::*;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Floating-point precision to use for statistics.
#[allow(non_camel_case_types)]
pub type fsa = f64;

/// Beam quality metrics at one position along the structure.
///
/// All quantities are zero when no particle is alive.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BeamResult {
    /// Position along the structure [m].
    pub length: fsa,
    /// Mean kinetic energy [MeV].
    pub average_energy: fsa,
    /// Largest kinetic energy [MeV].
    pub maximum_energy: fsa,
    /// RMS energy spread [MeV].
    pub energy_spectrum: fsa,
    /// Injected beam current [A].
    pub input_current: fsa,
    /// Current carried by the alive particles [A].
    pub beam_current: fsa,
    /// Fraction of the injected particles still alive.
    pub captured: fsa,
    /// Largest radius of an alive particle [m].
    pub beam_radius: fsa,
    /// Circular mean phase [deg].
    pub average_phase: fsa,
    /// RMS phase deviation from the mean [deg].
    pub phase_length: fsa,
    /// Beam power [W].
    pub beam_power: fsa,
    /// RF power remaining in the structure [W].
    pub load_power: fsa,
    /// Twiss alpha.
    pub alpha: fsa,
    /// Twiss beta [m].
    pub betta: fsa,
    /// RMS emittance [m rad].
    pub emittance: fsa,
    /// Normalized wave amplitude.
    pub a: fsa,
}

/// Twiss parameters of the transverse phase space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Twiss {
    pub alpha: fsa,
    /// [m]
    pub betta: fsa,
    /// RMS emittance [m rad].
    pub emittance: fsa,
}

impl BeamResult {
    /// Computes the beam metrics.
    ///
    /// # Parameters
    ///
    /// - `beam`: The ensemble.
    /// - `wavelength`: RF wavelength [m].
    /// - `length`: Position along the structure [m].
    /// - `load_power`: RF power remaining in the structure [W].
    /// - `a`: Normalized wave amplitude at the position.
    pub fn compute(beam: &Beam, wavelength: fsa, length: fsa, load_power: fsa, a: fsa) -> Self {
        let mut result = BeamResult {
            length,
            input_current: beam.input_current(),
            beam_current: beam.current(),
            captured: beam.captured_fraction(),
            load_power,
            a,
            ..BeamResult::default()
        };
        let alive: Vec<&Particle> = beam.alive().collect();
        if alive.is_empty() {
            return result;
        }

        let energies: Array1<fsa> = alive.iter().map(|p| p.energy()).collect();
        let (average_energy, energy_spread) = mean_and_rms(&energies);
        result.average_energy = average_energy;
        result.energy_spectrum = energy_spread;
        result.maximum_energy = energies.fold(fsa::NEG_INFINITY, |max, &e| fsa::max(max, e));
        result.beam_power = average_energy * MEV_TO_EV * result.beam_current;

        result.beam_radius = alive
            .iter()
            .map(|p| p.radius(wavelength))
            .fold(0.0, fsa::max);

        let mean_phase = circular_mean(alive.iter().map(|p| p.phi));
        let deviations: Array1<fsa> = alive.iter().map(|p| wrap_phase(p.phi - mean_phase)).collect();
        result.average_phase = rad_to_deg(mean_phase);
        result.phase_length = rad_to_deg(mean_and_rms(&deviations).1);

        let twiss = twiss_parameters(&alive, wavelength);
        result.alpha = twiss.alpha;
        result.betta = twiss.betta;
        result.emittance = twiss.emittance;
        result
    }
}

/// Mean of the given phases on the unit circle [rad].
///
/// Returns zero for an empty or perfectly balanced set.
pub fn circular_mean<I>(phases: I) -> fsa
where
    I: IntoIterator<Item = fsa>,
{
    let (sum_sin, sum_cos) = phases.into_iter().fold((0.0, 0.0), |(s, c), phi| {
        let (sin, cos) = fsa::sin_cos(phi);
        (s + sin, c + cos)
    });
    if sum_sin == 0.0 && sum_cos == 0.0 {
        0.0
    } else {
        fsa::atan2(sum_sin, sum_cos)
    }
}

/// Mean and root mean square deviation from the mean.
fn mean_and_rms(values: &Array1<fsa>) -> (fsa, fsa) {
    match values.mean() {
        Some(mean) => {
            let variance = values.mapv(|v| (v - mean) * (v - mean)).sum() / values.len() as fsa;
            (mean, fsa::sqrt(fsa::max(variance, 0.0)))
        }
        None => (0.0, 0.0),
    }
}

/// Cartesian offset [m] and angle of a particle projected onto the x-z plane.
pub fn cartesian_projection(particle: &Particle, wavelength: fsa) -> (fsa, fsa) {
    let (sin, cos) = particle.th.sin_cos();
    let offset = particle.radius(wavelength) * cos;
    let beta_z = particle.axial_velocity();
    let angle = if beta_z > 0.0 {
        (particle.radial_velocity() * cos - particle.azimuthal_velocity() * sin) / beta_z
    } else {
        0.0
    };
    (offset, angle)
}

/// Twiss parameters from the covariance of the projected offsets and angles.
///
/// Fewer than two particles or a vanishing emittance give all zeros.
pub fn twiss_parameters(particles: &[&Particle], wavelength: fsa) -> Twiss {
    if particles.len() < 2 {
        return Twiss::default();
    }
    let (offsets, angles): (Vec<fsa>, Vec<fsa>) = particles
        .iter()
        .map(|p| cartesian_projection(p, wavelength))
        .unzip();
    let offsets = Array1::from(offsets);
    let angles = Array1::from(angles);
    let n = particles.len() as fsa;
    let (offset_mean, angle_mean) = (offsets.sum() / n, angles.sum() / n);
    let offsets = offsets - offset_mean;
    let angles = angles - angle_mean;

    let xx = offsets.dot(&offsets) / n;
    let pp = angles.dot(&angles) / n;
    let xp = offsets.dot(&angles) / n;
    let emittance = fsa::sqrt(fsa::max(xx * pp - xp * xp, 0.0));
    if !(emittance > 0.0 && emittance.is_finite()) {
        return Twiss::default();
    }
    Twiss {
        alpha: -xp / emittance,
        betta: xx / emittance,
        emittance,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{beam::particle::LossReason, constants::PI, kinematics::mev_to_velocity};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn particle(energy: fsa, phi: fsa, x: fsa, th: fsa, bx: fsa) -> Particle {
        Particle::new(x, th, bx, 0.0, phi, mev_to_velocity(energy))
    }

    #[test]
    fn energy_and_current_moments() {
        let particles = vec![
            particle(1.0, 0.0, 0.01, 0.0, 0.0),
            particle(3.0, 0.0, 0.02, 0.0, 0.0),
            particle(10.0, 0.0, 0.03, 0.0, 0.0),
        ];
        let mut beam = Beam::new(particles, 0.5).unwrap();
        beam.particles_mut()[2].mark_lost(LossReason::Radius);
        let result = BeamResult::compute(&beam, 0.1, 2.0, 100.0, 0.3);

        assert_relative_eq!(result.average_energy, 2.0, max_relative = 1e-9);
        assert_relative_eq!(result.maximum_energy, 3.0, max_relative = 1e-9);
        assert_relative_eq!(result.energy_spectrum, 1.0, max_relative = 1e-8);
        assert_relative_eq!(result.captured, 2.0 / 3.0);
        assert_relative_eq!(result.beam_current, 0.5 * 2.0 / 3.0);
        assert_relative_eq!(result.beam_power, 2e6 * 0.5 * 2.0 / 3.0, max_relative = 1e-9);
        assert_relative_eq!(result.beam_radius, 0.002, max_relative = 1e-12);
        assert_eq!(result.length, 2.0);
        assert_eq!(result.load_power, 100.0);
        assert_eq!(result.a, 0.3);
    }

    #[test]
    fn no_survivors_give_zero_sentinels() {
        let mut beam = Beam::new(vec![particle(1.0, 0.0, 0.01, 0.0, 0.0)], 0.5).unwrap();
        beam.particles_mut()[0].mark_lost(LossReason::Phase);
        let result = BeamResult::compute(&beam, 0.1, 1.0, 5.0, 0.0);
        assert_eq!(result.captured, 0.0);
        assert_eq!(result.beam_current, 0.0);
        assert_eq!(result.average_energy, 0.0);
        assert_eq!(result.maximum_energy, 0.0);
        assert_eq!(result.phase_length, 0.0);
        assert_eq!(result.emittance, 0.0);
        assert_eq!(result.input_current, 0.5);
        assert_eq!(result.load_power, 5.0);
    }

    #[test]
    fn phase_moments_wrap_around() {
        let particles = vec![
            particle(1.0, PI - 0.1, 0.01, 0.0, 0.0),
            particle(1.0, -PI + 0.1, 0.01, 0.0, 0.0),
        ];
        let beam = Beam::new(particles, 0.0).unwrap();
        let result = BeamResult::compute(&beam, 0.1, 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(fsa::abs(result.average_phase), 180.0, epsilon = 1e-9);
        assert_relative_eq!(result.phase_length, rad_to_deg(0.1), max_relative = 1e-9);
    }

    #[test]
    fn circular_mean_of_empty_set_is_zero() {
        assert_eq!(circular_mean(Vec::new()), 0.0);
        assert_abs_diff_eq!(circular_mean(vec![0.2, 0.4]), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn twiss_of_correlated_beam() {
        // Four particles on a tilted ellipse in x-x'.
        let particles = vec![
            particle(5.0, 0.0, 0.01, 0.0, 0.1),
            particle(5.0, 0.0, 0.01, PI, 0.1),
            particle(5.0, 0.0, 0.005, 0.0, 0.0),
            particle(5.0, 0.0, 0.005, PI, 0.0),
        ];
        let refs: Vec<&Particle> = particles.iter().collect();
        let twiss = twiss_parameters(&refs, 0.1);
        assert!(twiss.emittance > 0.0);
        assert!(twiss.betta > 0.0);
        assert!(twiss.alpha < 0.0);
    }

    #[test]
    fn laminar_beam_has_no_emittance() {
        let particles = vec![
            particle(5.0, 0.0, 0.01, 0.0, 0.0),
            particle(5.0, 0.0, 0.02, 0.0, 0.0),
        ];
        let refs: Vec<&Particle> = particles.iter().collect();
        assert_eq!(twiss_parameters(&refs, 0.1), Twiss::default());
        assert_eq!(twiss_parameters(&refs[..1], 0.1), Twiss::default());
    }
}
