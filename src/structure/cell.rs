//! Individual accelerating cells and drift sections.

use super::{dump::CellDump, fst};
use crate::error::{Error, Result};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A single cell of the structure.
///
/// Lengths inside the cell are measured in RF wavelengths. Cells are
/// created by `Structure::build` and never modified afterwards.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Cell {
    /// Phase velocity of the wave in units of c.
    pub betta: fst,
    /// Coupling between field and power, `E*lambda/sqrt(P)` [sqrt(Ohm)].
    pub elp: fst,
    /// Attenuation `alpha*lambda^(3/2)` [sqrt(m)].
    pub al32: fst,
    /// Fraction of the beam energy gain drawn from the RF power.
    pub akl: fst,
    /// Phase advance per cell [deg].
    pub mode: fst,
    /// RF frequency [Hz].
    pub f0: fst,
    /// RF power fed into the cell [W], nonzero only for the first cell of a section.
    pub p0: fst,
    /// Phase shift of the wave relative to the beam at the start of a section [deg].
    pub d_f: fst,
    /// Number of integration steps through the cell.
    pub mesh: usize,
    /// Whether the cell is a field-free drift.
    pub drift: bool,
    /// Whether the cell starts a new RF section.
    pub first: bool,
    /// Whether a dump is requested at the cell exit.
    pub dump: bool,
    /// The dump request and its format, if any.
    pub dump_parameters: Option<CellDump>,
    /// Position of the cell entrance in wavelengths.
    pub ksi: fst,
    /// Length of a drift cell in wavelengths, unused for RF cells.
    pub drift_length: fst,
    /// Aperture radius [m].
    pub aperture: fst,
    /// External solenoid field at the cell entrance [T].
    pub b_ext: fst,
    /// External solenoid field at the cell exit [T].
    pub b_ext_exit: fst,
}

impl Cell {
    /// Length of the cell in wavelengths.
    pub fn length(&self) -> fst {
        if self.drift {
            self.drift_length
        } else {
            self.betta * self.mode / 360.0
        }
    }

    /// Integration step length in wavelengths.
    pub fn step_length(&self) -> fst {
        self.length() / self.mesh as fst
    }

    /// Attenuation constant [1/m] for the given wavelength [m].
    pub fn attenuation(&self, wavelength: fst) -> fst {
        self.al32 / wavelength.powf(1.5)
    }

    /// Checks the cell parameters.
    ///
    /// # Parameters
    ///
    /// - `index`: Position of the cell in the structure, for error reporting.
    pub fn validate(&self, index: usize) -> Result<()> {
        let invalid = |message: &str| -> Result<()> {
            Err(Error::InvalidCell {
                index,
                message: message.to_string(),
            })
        };
        let all_finite = [
            self.betta,
            self.elp,
            self.al32,
            self.akl,
            self.mode,
            self.f0,
            self.p0,
            self.d_f,
            self.drift_length,
            self.aperture,
            self.b_ext,
            self.b_ext_exit,
        ]
        .iter()
        .all(|value| value.is_finite());
        if !all_finite {
            return invalid("all parameters must be finite");
        }
        if self.mesh == 0 {
            return invalid("mesh must be larger than zero");
        }
        if self.aperture <= 0.0 {
            return invalid("aperture must be positive");
        }
        if self.drift {
            if self.drift_length <= 0.0 {
                return invalid("drift length must be positive");
            }
        } else {
            if self.betta <= 0.0 {
                return invalid("phase velocity must be positive");
            }
            if self.mode <= 0.0 {
                return invalid("phase advance must be positive");
            }
            if self.elp < 0.0 || self.al32 < 0.0 || self.p0 < 0.0 {
                return invalid("coupling, attenuation and power must be non-negative");
            }
        }
        if self.f0 <= 0.0 {
            return invalid("frequency must be positive");
        }
        Ok(())
    }
}
