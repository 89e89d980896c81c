//! Field of an external focusing solenoid.

use super::{ffd, LocalField};
use crate::constants::MAGNETIC_RIGIDITY_FACTOR;

/// Conversion factor from magnetic field in tesla to normalized field
/// for the given RF wavelength [m].
pub fn magnetic_coefficient(wavelength: ffd) -> ffd {
    MAGNETIC_RIGIDITY_FACTOR * wavelength
}

/// Axially symmetric solenoid field varying linearly along a cell.
///
/// The radial component follows from `div B = 0` to first order in the radius.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolenoidField {
    /// Normalized axial field at the cell entrance.
    bz_entrance: ffd,
    /// Change of the normalized axial field per wavelength.
    gradient: ffd,
}

impl SolenoidField {
    /// Creates a solenoid field from the fields at the two ends of a cell.
    ///
    /// # Parameters
    ///
    /// - `b_entrance`: Axial field at the cell entrance [T].
    /// - `b_exit`: Axial field at the cell exit [T].
    /// - `cell_length`: Length of the cell in wavelengths.
    /// - `coefficient`: Normalization coefficient from `magnetic_coefficient`.
    pub fn new(b_entrance: ffd, b_exit: ffd, cell_length: ffd, coefficient: ffd) -> Self {
        let gradient = if cell_length > 0.0 {
            coefficient * (b_exit - b_entrance) / cell_length
        } else {
            0.0
        };
        SolenoidField {
            bz_entrance: coefficient * b_entrance,
            gradient,
        }
    }

    /// Uniform solenoid field.
    pub fn uniform(b: ffd, coefficient: ffd) -> Self {
        SolenoidField {
            bz_entrance: coefficient * b,
            gradient: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.bz_entrance == 0.0 && self.gradient == 0.0
    }

    /// Normalized axial field at the cell entrance.
    pub fn bz_entrance(&self) -> ffd {
        self.bz_entrance
    }

    /// Normalized radial field gradient `-(1/2) d(bz)/dxi`.
    pub fn br_gradient(&self) -> ffd {
        -0.5 * self.gradient
    }

    /// Evaluates the field at radius `x` and distance `s` from the cell
    /// entrance, both in wavelengths.
    pub fn evaluate(&self, x: ffd, s: ffd) -> LocalField {
        LocalField {
            bz: self.bz_entrance + self.gradient * s,
            br: self.br_gradient() * x,
            ..LocalField::default()
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_field_has_no_radial_component() {
        let coefficient = magnetic_coefficient(0.1);
        let field = SolenoidField::uniform(0.2, coefficient).evaluate(0.05, 3.0);
        assert_relative_eq!(field.bz, 0.2 * coefficient);
        assert_eq!(field.br, 0.0);
    }

    #[test]
    fn linear_field_reaches_exit_value() {
        let field = SolenoidField::new(0.1, 0.3, 2.0, 1.0);
        assert_relative_eq!(field.evaluate(0.0, 2.0).bz, 0.3);
        assert_relative_eq!(field.evaluate(0.2, 1.0).br, -0.5 * 0.1 * 0.2);
    }

    #[test]
    fn zero_length_cell_keeps_entrance_field() {
        let field = SolenoidField::new(0.1, 0.3, 0.0, 1.0);
        assert_eq!(field.evaluate(1.0, 1.0).bz, 0.1);
        assert!(!field.is_zero());
        assert!(SolenoidField::default().is_zero());
    }

    #[test]
    fn coefficient_matches_electron_rigidity() {
        assert_relative_eq!(magnetic_coefficient(1.0), 586.679, max_relative = 1e-4);
    }
}
