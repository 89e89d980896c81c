//! Macro-particles of the beam.

use super::fbm;
use crate::kinematics::{clamp_velocity, gamma_to_mev, velocity_to_energy};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Reason for a particle leaving the beam.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum LossReason {
    /// Hit the aperture.
    Radius,
    /// Slipped out of the accepted phase window.
    Phase,
    /// Stopped or reversed along the axis.
    AxialField,
    /// Diverged beyond the accepted angle.
    TransverseField,
    /// State became numerically invalid.
    CombinedField,
    /// Exceeded the step budget.
    StepLimit,
}

/// Whether a particle is still part of the beam.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ParticleStatus {
    Alive,
    Lost(LossReason),
}

/// A single macro-particle.
///
/// Transverse positions are normalized to the RF wavelength. Once a particle
/// is lost its state is frozen at the last valid values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Particle {
    /// Radial offset from the axis in wavelengths.
    pub x: fbm,
    /// Radial offset at injection in wavelengths.
    pub x0: fbm,
    /// Azimuthal angle [rad].
    pub th: fbm,
    /// Radial momentum `gamma*beta_r`.
    pub bx: fbm,
    /// Normalized angular momentum `gamma*x*beta_th`.
    pub bth: fbm,
    /// Phase relative to the RF wave [rad].
    pub phi: fbm,
    /// Total velocity in units of c.
    pub betta: fbm,
    /// Axial position along the structure [m].
    pub z: fbm,
    /// Number of integration steps taken.
    pub n_steps: u64,
    status: ParticleStatus,
}

impl Particle {
    /// Creates a new alive particle at the start of the structure.
    pub fn new(x: fbm, th: fbm, bx: fbm, bth: fbm, phi: fbm, betta: fbm) -> Self {
        Particle {
            x,
            x0: x,
            th,
            bx,
            bth,
            phi,
            betta,
            z: 0.0,
            n_steps: 0,
            status: ParticleStatus::Alive,
        }
    }

    pub fn status(&self) -> ParticleStatus {
        self.status
    }

    pub fn is_alive(&self) -> bool {
        self.status == ParticleStatus::Alive
    }

    /// Returns the loss reason if the particle has been lost.
    pub fn loss_reason(&self) -> Option<LossReason> {
        match self.status {
            ParticleStatus::Alive => None,
            ParticleStatus::Lost(reason) => Some(reason),
        }
    }

    /// Marks the particle as lost.
    ///
    /// Only the first loss is recorded. Returns whether the status changed.
    pub fn mark_lost(&mut self, reason: LossReason) -> bool {
        if self.is_alive() {
            self.status = ParticleStatus::Lost(reason);
            true
        } else {
            false
        }
    }

    /// Lorentz factor.
    pub fn gamma(&self) -> fbm {
        velocity_to_energy(clamp_velocity(self.betta))
    }

    /// Kinetic energy [MeV].
    pub fn energy(&self) -> fbm {
        gamma_to_mev(self.gamma())
    }

    /// Radial velocity in units of c.
    pub fn radial_velocity(&self) -> fbm {
        self.bx / self.gamma()
    }

    /// Azimuthal velocity in units of c, zero on the axis.
    pub fn azimuthal_velocity(&self) -> fbm {
        if self.x == 0.0 {
            0.0
        } else {
            self.bth / (self.gamma() * self.x)
        }
    }

    /// Axial velocity in units of c, zero if the transverse motion
    /// accounts for all of the velocity.
    pub fn axial_velocity(&self) -> fbm {
        let beta_r = self.radial_velocity();
        let beta_th = self.azimuthal_velocity();
        fbm::sqrt(fbm::max(
            self.betta * self.betta - beta_r * beta_r - beta_th * beta_th,
            0.0,
        ))
    }

    /// Radial offset [m] for the given wavelength [m].
    pub fn radius(&self, wavelength: fbm) -> fbm {
        self.x * wavelength
    }
}
