//! Generation of the injected particle distribution.

use super::{fbm, particle::Particle, Beam};
use crate::{
    constants::TWO_PI,
    error::{Error, Result},
    kinematics::{deg_to_rad, mev_to_gamma, mev_to_velocity},
};
use rand::{
    distributions::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// How particles are distributed over the injected phase space.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum BeamSeeding {
    /// Uniform over the beam disk, the phase window and the energy window.
    Random,
    /// All particles at the beam edge, phases evenly spaced over the window.
    FixedX,
    /// All particles at the central phase, radii evenly spaced up to the beam edge.
    FixedY,
    /// All particles on the beam edge ring, azimuths and phases evenly spaced.
    FixedRadius,
}

/// Configuration parameters for the injected beam.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BeamConfig {
    /// Number of macro-particles.
    pub n_particles: usize,
    /// Injected beam current [A].
    pub current: fbm,
    /// Central kinetic energy [MeV].
    pub energy: fbm,
    /// Full width of the energy window [MeV].
    pub energy_spread: fbm,
    /// Central phase [deg].
    pub phase: fbm,
    /// Full width of the phase window [deg].
    pub phase_spread: fbm,
    /// Beam radius [m].
    pub radius: fbm,
    /// Largest radial angle of randomly seeded particles [rad].
    pub divergence: fbm,
    /// Distribution policy.
    pub seeding: BeamSeeding,
    /// Seed for the random number generator, drawn from entropy if `None`.
    pub seed: Option<u64>,
}

impl BeamConfig {
    pub const DEFAULT_N_PARTICLES: usize = 1000;
    pub const DEFAULT_CURRENT: fbm = 0.0;
    pub const DEFAULT_ENERGY: fbm = 0.05;
    pub const DEFAULT_ENERGY_SPREAD: fbm = 0.0;
    pub const DEFAULT_PHASE: fbm = 0.0;
    pub const DEFAULT_PHASE_SPREAD: fbm = 360.0;
    pub const DEFAULT_RADIUS: fbm = 1e-3;
    pub const DEFAULT_DIVERGENCE: fbm = 0.0;
    pub const DEFAULT_SEEDING: BeamSeeding = BeamSeeding::Random;

    /// Panics if the configuration is invalid.
    pub fn validate(&self) {
        if let Err(err) = self.try_validate() {
            panic!("{}", err);
        }
    }

    /// Checks a user supplied configuration.
    pub fn try_validate(&self) -> Result<()> {
        if self.n_particles == 0 {
            return Err(Error::InvalidBeam(
                "number of particles must be larger than zero".to_string(),
            ));
        }
        if !(self.current.is_finite() && self.current >= 0.0) {
            return Err(Error::InvalidCurrent(format!(
                "current must be finite and non-negative, got {}",
                self.current
            )));
        }
        if !(self.energy_spread >= 0.0 && self.energy - 0.5 * self.energy_spread > 0.0) {
            return Err(Error::InvalidBeam(
                "energy window must lie above zero".to_string(),
            ));
        }
        if !(self.phase_spread >= 0.0 && self.phase_spread <= 360.0) {
            return Err(Error::InvalidBeam(
                "phase spread must be in the range [0, 360] degrees".to_string(),
            ));
        }
        if !(self.radius >= 0.0 && self.divergence >= 0.0) {
            return Err(Error::InvalidBeam(
                "radius and divergence must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Generates the injected beam.
    ///
    /// # Parameters
    ///
    /// - `wavelength`: RF wavelength [m] used to normalize transverse positions.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the seeded beam with `n_particles` particles.
    /// - `Err`: The configuration or wavelength was invalid.
    pub fn generate(&self, wavelength: fbm) -> Result<Beam> {
        self.try_validate()?;
        if !(wavelength > 0.0) {
            return Err(Error::Precondition(format!(
                "wavelength must be positive, got {}",
                wavelength
            )));
        }
        let n = self.n_particles;
        let x_edge = self.radius / wavelength;
        let phase_center = deg_to_rad(self.phase);
        let phase_span = deg_to_rad(self.phase_spread);
        let evenly_spaced_phase =
            |i: usize| phase_center + phase_span * ((i as fbm + 0.5) / n as fbm - 0.5);

        let particles: Vec<Particle> = match self.seeding {
            BeamSeeding::Random => self.generate_random(x_edge, phase_center, phase_span),
            BeamSeeding::FixedX => (0..n)
                .map(|i| self.create_particle(x_edge, 0.0, 0.0, evenly_spaced_phase(i), self.energy))
                .collect(),
            BeamSeeding::FixedY => (0..n)
                .map(|i| {
                    let x = x_edge * (i + 1) as fbm / n as fbm;
                    self.create_particle(x, 0.0, 0.0, phase_center, self.energy)
                })
                .collect(),
            BeamSeeding::FixedRadius => (0..n)
                .map(|i| {
                    let th = TWO_PI * i as fbm / n as fbm;
                    self.create_particle(x_edge, th, 0.0, evenly_spaced_phase(i), self.energy)
                })
                .collect(),
        };
        Beam::with_count(particles, self.current, n)
    }

    fn generate_random(&self, x_edge: fbm, phase_center: fbm, phase_span: fbm) -> Vec<Particle> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let unit = Uniform::new(0.0, 1.0);
        (0..self.n_particles)
            .map(|_| {
                let x = x_edge * fbm::sqrt(unit.sample(&mut rng));
                let th = TWO_PI * unit.sample(&mut rng);
                let phi = phase_center + phase_span * (unit.sample(&mut rng) - 0.5);
                let energy = self.energy + self.energy_spread * (unit.sample(&mut rng) - 0.5);
                let angle = self.divergence * (2.0 * unit.sample(&mut rng) - 1.0);
                self.create_particle(x, th, angle, phi, energy)
            })
            .collect()
    }

    fn create_particle(&self, x: fbm, th: fbm, angle: fbm, phi: fbm, energy: fbm) -> Particle {
        let gamma = mev_to_gamma(energy);
        let betta = mev_to_velocity(energy);
        Particle::new(x, th, gamma * betta * fbm::sin(angle), 0.0, phi, betta)
    }
}

impl Default for BeamConfig {
    fn default() -> Self {
        BeamConfig {
            n_particles: Self::DEFAULT_N_PARTICLES,
            current: Self::DEFAULT_CURRENT,
            energy: Self::DEFAULT_ENERGY,
            energy_spread: Self::DEFAULT_ENERGY_SPREAD,
            phase: Self::DEFAULT_PHASE,
            phase_spread: Self::DEFAULT_PHASE_SPREAD,
            radius: Self::DEFAULT_RADIUS,
            divergence: Self::DEFAULT_DIVERGENCE,
            seeding: Self::DEFAULT_SEEDING,
            seed: None,
        }
    }
}
