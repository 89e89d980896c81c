//! Ensembles of macro-particles.

pub mod particle;
pub mod seeding;

use crate::error::{Error, Result};
use ndarray::prelude::*;
use particle::Particle;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Floating-point precision to use for beam quantities.
#[allow(non_camel_case_types)]
pub type fbm = f64;

/// Particle quantity that can be extracted from a beam.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum BeamParameter {
    X,
    Th,
    Bx,
    Bth,
    Betta,
    Phi,
}

impl BeamParameter {
    fn of(self, particle: &Particle) -> fbm {
        match self {
            Self::X => particle.x,
            Self::Th => particle.th,
            Self::Bx => particle.bx,
            Self::Bth => particle.bth,
            Self::Betta => particle.betta,
            Self::Phi => particle.phi,
        }
    }
}

/// An ensemble of particles carrying a beam current.
#[derive(Clone, Debug)]
pub struct Beam {
    particles: Vec<Particle>,
    input_current: fbm,
}

impl Beam {
    /// Creates a beam from the given particles.
    ///
    /// # Parameters
    ///
    /// - `particles`: The particles of the beam (must not be empty).
    /// - `input_current`: Injected beam current [A] (must be finite and non-negative).
    pub fn new(particles: Vec<Particle>, input_current: fbm) -> Result<Self> {
        if particles.is_empty() {
            return Err(Error::InvalidBeam(
                "beam must contain at least one particle".to_string(),
            ));
        }
        if !(input_current.is_finite() && input_current >= 0.0) {
            return Err(Error::InvalidCurrent(format!(
                "current must be finite and non-negative, got {}",
                input_current
            )));
        }
        Ok(Beam {
            particles,
            input_current,
        })
    }

    /// Creates a beam and checks that it has the expected number of particles.
    pub fn with_count(
        particles: Vec<Particle>,
        input_current: fbm,
        expected_count: usize,
    ) -> Result<Self> {
        if particles.len() != expected_count {
            return Err(Error::ParticleCountMismatch {
                expected: expected_count,
                actual: particles.len(),
            });
        }
        Self::new(particles, input_current)
    }

    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn n_alive(&self) -> usize {
        self.particles.iter().filter(|p| p.is_alive()).count()
    }

    pub fn input_current(&self) -> fbm {
        self.input_current
    }

    /// Fraction of the injected particles still alive.
    pub fn captured_fraction(&self) -> fbm {
        self.n_alive() as fbm / self.n_particles() as fbm
    }

    /// Current carried by the alive particles [A].
    pub fn current(&self) -> fbm {
        self.input_current * self.captured_fraction()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn into_particles(self) -> Vec<Particle> {
        self.particles
    }

    /// Iterates over the alive particles.
    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_alive())
    }

    /// Extracts the given quantity for every particle, lost or not.
    pub fn parameter(&self, parameter: BeamParameter) -> Array1<fbm> {
        self.particles.iter().map(|p| parameter.of(p)).collect()
    }

    /// Extracts the given quantity for the alive particles.
    pub fn alive_parameter(&self, parameter: BeamParameter) -> Array1<fbm> {
        self.alive().map(|p| parameter.of(p)).collect()
    }
}
