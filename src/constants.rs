//! Physical and mathematical constants.

/// Floating-point precision to use for constants.
#[allow(non_camel_case_types)]
pub type fcn = f64;

// Mathematical constants

pub use std::f64::consts::PI;

/// 2*pi.
pub const TWO_PI: fcn = 2.0 * PI;

// Physical constants

/// Electron charge [C].
pub const Q_ELECTRON: fcn = 1.602_176_634e-19;
/// Electron mass [kg].
pub const M_ELECTRON: fcn = 9.109_383_701_5e-31;
/// Speed of light in vacuum [m/s].
pub const CLIGHT: fcn = 2.997_924_58e8;
/// Vacuum permittivity [F/m].
pub const EPSILON_0: fcn = 8.854_187_812_8e-12;
/// Electron rest energy [eV].
pub const REST_ENERGY_EV: fcn = 510_998.950;
/// Alfvén current `4*pi*epsilon_0*m_e*c^3/e` [A].
pub const ALFVEN_CURRENT: fcn = 4.0 * PI * EPSILON_0 * M_ELECTRON * CLIGHT * CLIGHT * CLIGHT / Q_ELECTRON;
/// Charge-to-momentum factor `e/(m_e*c)` [1/(T m)].
///
/// Multiplied by the RF wavelength this converts a magnetic field in tesla
/// into the normalized field used by the integrator.
pub const MAGNETIC_RIGIDITY_FACTOR: fcn = Q_ELECTRON / (M_ELECTRON * CLIGHT);

// Unit conversion factors

/// Conversion factor from electron volts to mega electron volts.
pub const EV_TO_MEV: fcn = 1e-6;
/// Conversion factor from mega electron volts to electron volts.
pub const MEV_TO_EV: fcn = 1e6;

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn alfven_current_has_expected_magnitude() {
        assert_relative_eq!(ALFVEN_CURRENT, 17_045.0, max_relative = 1e-3);
    }

    #[test]
    fn rest_energy_matches_mass() {
        let rest_energy_from_mass = M_ELECTRON * CLIGHT * CLIGHT / Q_ELECTRON;
        assert_relative_eq!(rest_energy_from_mass, REST_ENERGY_EV, max_relative = 1e-8);
    }
}
