//! Electromagnetic fields acting on the beam.
//!
//! All field quantities are normalized: electric fields to `m*c^2/(e*lambda)`
//! and magnetic fields to `m*c/(e*lambda)`, so that they enter the equations
//! of motion directly as rates of change of the normalized momenta per
//! wavelength travelled.

pub mod bessel;
pub mod external;
pub mod form_factor;
pub mod rf;
pub mod space_charge;

/// Floating-point precision to use for fields.
#[allow(non_camel_case_types)]
pub type ffd = f64;

/// Normalized field components seen by a single particle at one position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalField {
    /// Axial electric field.
    pub ez: ffd,
    /// Radial electric field.
    pub er: ffd,
    /// Azimuthal magnetic field.
    pub h_th: ffd,
    /// Axial magnetic field.
    pub bz: ffd,
    /// Radial magnetic field.
    pub br: ffd,
}

impl LocalField {
    /// Adds the components of another field to this one.
    pub fn accumulate(&mut self, other: &LocalField) {
        self.ez += other.ez;
        self.er += other.er;
        self.h_th += other.h_th;
        self.bz += other.bz;
        self.br += other.br;
    }
}
