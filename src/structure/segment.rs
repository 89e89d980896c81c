//! Segments of the structure as described by the user.

use super::{dump::DumpRequest, fst};
use crate::error::{Error, Result};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// RF power fed into the structure at the start of a section.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PowerInput {
    /// Input power [W].
    pub power: fst,
    /// Phase shift of the wave relative to the beam [deg].
    pub phase_shift: fst,
}

/// A run of RF cells whose parameters approach the given values.
///
/// The values apply to the last cell of the segment. Within a section the
/// cell parameters are interpolated smoothly from the preceding segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CellSegment {
    /// Number of cells in the segment.
    pub cell_number: usize,
    /// Phase velocity in units of c.
    pub betta: fst,
    /// Coupling between field and power [sqrt(Ohm)].
    pub elp: fst,
    /// Attenuation `alpha*lambda^(3/2)` [sqrt(m)].
    pub al32: fst,
    /// Fraction of the beam energy gain drawn from the RF power.
    pub akl: fst,
    /// Phase advance per cell [deg].
    pub mode: fst,
    /// Aperture radius [m].
    pub aperture: fst,
    /// External solenoid field [T].
    pub b_ext: fst,
    /// Power input starting a new section, if any.
    pub power_input: Option<PowerInput>,
}

/// A field-free section of beam pipe.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DriftSegment {
    /// Length [m].
    pub length: fst,
    /// Pipe radius [m].
    pub pipe_radius: fst,
    /// External solenoid field [T].
    pub b_ext: fst,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SegmentKind {
    Cells(CellSegment),
    Drift(DriftSegment),
}

/// One segment of the structure, with an optional dump at its exit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StructureSegment {
    pub kind: SegmentKind,
    pub dump: Option<DumpRequest>,
}

impl StructureSegment {
    pub fn cells(segment: CellSegment) -> Self {
        StructureSegment {
            kind: SegmentKind::Cells(segment),
            dump: None,
        }
    }

    pub fn drift(length: fst, pipe_radius: fst, b_ext: fst) -> Self {
        StructureSegment {
            kind: SegmentKind::Drift(DriftSegment {
                length,
                pipe_radius,
                b_ext,
            }),
            dump: None,
        }
    }

    /// Requests a dump at the exit of the segment.
    pub fn with_dump(mut self, request: DumpRequest) -> Self {
        self.dump = Some(request);
        self
    }

    pub fn is_drift(&self) -> bool {
        matches!(self.kind, SegmentKind::Drift(_))
    }

    /// Whether the segment starts a new RF section.
    pub fn is_jump(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::Cells(CellSegment {
                power_input: Some(_),
                ..
            })
        )
    }

    /// Checks the segment parameters.
    pub fn validate(&self, index: usize) -> Result<()> {
        let invalid = |message: String| -> Result<()> {
            Err(Error::InvalidSegment { index, message })
        };
        match &self.kind {
            SegmentKind::Cells(cells) => {
                if cells.cell_number == 0 {
                    return invalid("segment must contain at least one cell".to_string());
                }
                let values = [
                    cells.betta,
                    cells.elp,
                    cells.al32,
                    cells.akl,
                    cells.mode,
                    cells.aperture,
                    cells.b_ext,
                ];
                if values.iter().any(|value| !value.is_finite()) {
                    return invalid("all parameters must be finite".to_string());
                }
                if let Some(input) = cells.power_input {
                    if !(input.power >= 0.0 && input.phase_shift.is_finite()) {
                        return invalid(format!(
                            "invalid power input {} W with phase shift {} deg",
                            input.power, input.phase_shift
                        ));
                    }
                }
            }
            SegmentKind::Drift(drift) => {
                if !(drift.length > 0.0 && drift.length.is_finite()) {
                    return invalid(format!("drift length must be positive, got {}", drift.length));
                }
                if !(drift.pipe_radius > 0.0) {
                    return invalid(format!(
                        "pipe radius must be positive, got {}",
                        drift.pipe_radius
                    ));
                }
                if !drift.b_ext.is_finite() {
                    return invalid("solenoid field must be finite".to_string());
                }
            }
        }
        if let Some(request) = &self.dump {
            request.validate()?;
        }
        Ok(())
    }
}
