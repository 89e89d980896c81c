//! Field of the accelerating traveling wave inside an RF cell.

use super::{
    bessel::{ib0, ib1},
    ffd, LocalField,
};
use crate::constants::{PI, TWO_PI};

/// Transverse wavenumbers below this are treated as zero, giving
/// the paraxial limit of the radial field.
const MIN_TRANSVERSE_WAVENUMBER: ffd = 1e-8;

/// A TM01 traveling wave with given normalized amplitude and phase velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RfWave {
    amplitude: ffd,
    phase_velocity: ffd,
    transverse_wavenumber: ffd,
}

impl RfWave {
    /// Creates a new traveling wave.
    ///
    /// # Parameters
    ///
    /// - `amplitude`: Normalized on-axis amplitude `A = e*E*lambda/(m*c^2)`.
    /// - `phase_velocity`: Phase velocity of the wave in units of c (must be positive).
    pub fn new(amplitude: ffd, phase_velocity: ffd) -> Self {
        assert!(
            phase_velocity > 0.0,
            "Phase velocity must be larger than zero."
        );
        let transverse_wavenumber =
            ffd::sqrt(ffd::max(1.0 / (phase_velocity * phase_velocity) - 1.0, 0.0));
        RfWave {
            amplitude,
            phase_velocity,
            transverse_wavenumber,
        }
    }

    pub fn amplitude(&self) -> ffd {
        self.amplitude
    }

    pub fn phase_velocity(&self) -> ffd {
        self.phase_velocity
    }

    /// Returns a copy of the wave with a different amplitude.
    pub fn with_amplitude(&self, amplitude: ffd) -> Self {
        RfWave { amplitude, ..*self }
    }

    /// Radial profile of the axial field, `I0(2*pi*q*x)`.
    pub fn axial_profile(&self, x: ffd) -> ffd {
        ib0(TWO_PI * self.transverse_wavenumber * x)
    }

    /// Radial profile of the radial field, `I1(2*pi*q*x)/(q*bw)`.
    pub fn radial_profile(&self, x: ffd) -> ffd {
        let q = self.transverse_wavenumber;
        let profile = if q < MIN_TRANSVERSE_WAVENUMBER {
            PI * x
        } else {
            ib1(TWO_PI * q * x) / q
        };
        profile / self.phase_velocity
    }

    /// Evaluates the wave field at radius `x` (in wavelengths) and wave phase `phi` (rad).
    pub fn evaluate(&self, x: ffd, phi: ffd) -> LocalField {
        let (sin_phi, cos_phi) = phi.sin_cos();
        let er = self.amplitude * self.radial_profile(x) * sin_phi;
        LocalField {
            ez: self.amplitude * self.axial_profile(x) * cos_phi,
            er,
            h_th: self.phase_velocity * er,
            ..LocalField::default()
        }
    }
}
