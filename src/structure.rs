//! The accelerating structure as an ordered sequence of cells.

pub mod cell;
pub mod dump;
pub mod segment;

use crate::{
    constants::CLIGHT,
    error::{Error, Result},
    interpolation::spline::{Spline, SplineType},
};
use cell::Cell;
use dump::CellDump;
use ndarray::prelude::*;
use segment::{CellSegment, PowerInput, SegmentKind, StructureSegment};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Floating-point precision to use for the structure.
#[allow(non_camel_case_types)]
pub type fst = f64;

/// Configuration parameters for building a structure.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StructureConfig {
    /// Number of integration steps per RF cell, and per wavelength of drift.
    pub mesh: usize,
    /// RF frequency [Hz].
    pub frequency: fst,
    /// How cell parameters are interpolated between segments.
    pub spline_type: SplineType,
}

impl StructureConfig {
    pub const DEFAULT_MESH: usize = 20;
    pub const DEFAULT_FREQUENCY: fst = 2.856e9;
    pub const DEFAULT_SPLINE_TYPE: SplineType = SplineType::Position;

    /// Panics if the configuration is invalid.
    pub fn validate(&self) {
        assert!(self.mesh > 0, "Mesh must be larger than zero.");
        assert!(
            self.frequency > 0.0 && self.frequency.is_finite(),
            "Frequency must be larger than zero."
        );
    }

    /// Checks a user supplied configuration.
    pub fn try_validate(&self) -> Result<()> {
        if self.mesh == 0 {
            return Err(Error::Precondition(
                "mesh must be larger than zero".to_string(),
            ));
        }
        if !(self.frequency > 0.0 && self.frequency.is_finite()) {
            return Err(Error::Precondition(format!(
                "frequency must be positive, got {}",
                self.frequency
            )));
        }
        Ok(())
    }

    /// RF wavelength [m].
    pub fn wavelength(&self) -> fst {
        CLIGHT / self.frequency
    }
}

impl Default for StructureConfig {
    fn default() -> Self {
        StructureConfig {
            mesh: Self::DEFAULT_MESH,
            frequency: Self::DEFAULT_FREQUENCY,
            spline_type: Self::DEFAULT_SPLINE_TYPE,
        }
    }
}

/// Cell quantity that can be extracted along the structure.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum StructureParameter {
    /// Entrance position in wavelengths.
    Ksi,
    /// Entrance position [m].
    Z,
    /// Aperture radius [m].
    Aperture,
    /// Field to power coupling.
    Coupling,
    /// Attenuation [1/m].
    Alpha,
    /// Phase velocity of the wave.
    BettaF,
    /// External solenoid field [T].
    BExt,
    /// Index of the cell.
    Number,
}

/// An ordered, immutable sequence of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    cells: Vec<Cell>,
    frequency: fst,
}

impl Structure {
    /// Expands segments into cells.
    ///
    /// Consecutive cell segments form an RF section which must begin with a
    /// power input. Within a section all cell parameters are interpolated
    /// with a spline of the configured type. Every drift segment becomes a
    /// single drift cell and ends the current section.
    pub fn build(segments: &[StructureSegment], config: &StructureConfig) -> Result<Self> {
        config.try_validate()?;
        if segments.is_empty() {
            return Err(Error::InvalidSegment {
                index: 0,
                message: "structure must contain at least one segment".to_string(),
            });
        }
        for (index, segment) in segments.iter().enumerate() {
            segment.validate(index)?;
        }

        let wavelength = config.wavelength();
        let mut cells = Vec::new();
        let mut section: Vec<&StructureSegment> = Vec::new();
        for (index, segment) in segments.iter().enumerate() {
            match &segment.kind {
                SegmentKind::Drift(drift) => {
                    Self::expand_section(&section, config, &mut cells)?;
                    section.clear();
                    let drift_length = drift.length / wavelength;
                    cells.push(Cell {
                        betta: 1.0,
                        elp: 0.0,
                        al32: 0.0,
                        akl: 0.0,
                        mode: 0.0,
                        f0: config.frequency,
                        p0: 0.0,
                        d_f: 0.0,
                        mesh: config.mesh * usize::max(1, drift_length.ceil() as usize),
                        drift: true,
                        first: false,
                        dump: segment.dump.is_some(),
                        dump_parameters: segment
                            .dump
                            .as_ref()
                            .map(CellDump::resolve)
                            .transpose()?,
                        ksi: 0.0,
                        drift_length,
                        aperture: drift.pipe_radius,
                        b_ext: drift.b_ext,
                        b_ext_exit: drift.b_ext,
                    });
                }
                SegmentKind::Cells(cell_segment) => {
                    if cell_segment.power_input.is_some() {
                        Self::expand_section(&section, config, &mut cells)?;
                        section.clear();
                    } else if section.is_empty() {
                        return Err(Error::InvalidSegment {
                            index,
                            message: "RF section must start with a power input".to_string(),
                        });
                    }
                    section.push(segment);
                }
            }
        }
        Self::expand_section(&section, config, &mut cells)?;

        let mut ksi = 0.0;
        for idx in 0..cells.len() {
            cells[idx].ksi = ksi;
            ksi += cells[idx].length();
            if let Some(next) = cells.get(idx + 1).map(|cell| cell.b_ext) {
                cells[idx].b_ext_exit = next;
            } else {
                cells[idx].b_ext_exit = cells[idx].b_ext;
            }
        }
        for (index, cell) in cells.iter().enumerate() {
            cell.validate(index)?;
        }
        Ok(Structure {
            cells,
            frequency: config.frequency,
        })
    }

    /// Expands the segments of one RF section into cells.
    fn expand_section(
        section: &[&StructureSegment],
        config: &StructureConfig,
        cells: &mut Vec<Cell>,
    ) -> Result<()> {
        let cell_segments: Vec<&CellSegment> = section
            .iter()
            .filter_map(|segment| match &segment.kind {
                SegmentKind::Cells(cell_segment) => Some(cell_segment),
                SegmentKind::Drift(_) => None,
            })
            .collect();
        let first = match cell_segments.first() {
            Some(first) => *first,
            None => return Ok(()),
        };
        let PowerInput { power, phase_shift } = first.power_input.unwrap_or(PowerInput {
            power: 0.0,
            phase_shift: 0.0,
        });

        let mut knots = vec![0.0];
        let mut last_cell_indices = Vec::with_capacity(cell_segments.len());
        let mut n_cells = 0;
        for segment in &cell_segments {
            n_cells += segment.cell_number;
            knots.push(n_cells as fst);
            last_cell_indices.push(n_cells - 1);
        }
        let profile = |value: fn(&CellSegment) -> fst| -> Result<Vec<fst>> {
            let values: Vec<fst> = std::iter::once(value(first))
                .chain(cell_segments.iter().map(|segment| value(segment)))
                .collect();
            let spline = Spline::new(config.spline_type, &knots, &values)?;
            let mut interval = 0;
            Ok((0..n_cells)
                .map(|idx| {
                    let x = (idx + 1) as fst;
                    while knots[interval + 1] < x {
                        interval += 1;
                    }
                    // Cells never leave the range spanned by the enclosing knots.
                    let (low, high) = min_max(values[interval], values[interval + 1]);
                    spline.evaluate(x).clamp(low, high)
                })
                .collect())
        };
        let betta = profile(|s| s.betta)?;
        let elp = profile(|s| s.elp)?;
        let al32 = profile(|s| s.al32)?;
        let akl = profile(|s| s.akl)?;
        let mode = profile(|s| s.mode)?;
        let aperture = profile(|s| s.aperture)?;
        let b_ext = profile(|s| s.b_ext)?;

        for idx in 0..n_cells {
            let dump_segment = last_cell_indices
                .iter()
                .position(|&last| last == idx)
                .and_then(|segment_idx| section[segment_idx].dump.as_ref())
                .map(CellDump::resolve)
                .transpose()?;
            cells.push(Cell {
                betta: betta[idx],
                elp: elp[idx],
                al32: al32[idx],
                akl: akl[idx],
                mode: mode[idx],
                f0: config.frequency,
                p0: if idx == 0 { power } else { 0.0 },
                d_f: if idx == 0 { phase_shift } else { 0.0 },
                mesh: config.mesh,
                drift: false,
                first: idx == 0,
                dump: dump_segment.is_some(),
                dump_parameters: dump_segment,
                ksi: 0.0,
                drift_length: 0.0,
                aperture: aperture[idx],
                b_ext: b_ext[idx],
                b_ext_exit: b_ext[idx],
            });
        }
        Ok(())
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// RF frequency [Hz].
    pub fn frequency(&self) -> fst {
        self.frequency
    }

    /// RF wavelength [m].
    pub fn wavelength(&self) -> fst {
        CLIGHT / self.frequency
    }

    /// Total length of the structure [m].
    pub fn length(&self) -> fst {
        self.cells
            .last()
            .map_or(0.0, |cell| (cell.ksi + cell.length()) * self.wavelength())
    }

    /// Extracts the given quantity for every cell.
    pub fn profile(&self, parameter: StructureParameter) -> Array1<fst> {
        let wavelength = self.wavelength();
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| match parameter {
                StructureParameter::Ksi => cell.ksi,
                StructureParameter::Z => cell.ksi * wavelength,
                StructureParameter::Aperture => cell.aperture,
                StructureParameter::Coupling => cell.elp,
                StructureParameter::Alpha => cell.attenuation(wavelength),
                StructureParameter::BettaF => cell.betta,
                StructureParameter::BExt => cell.b_ext,
                StructureParameter::Number => idx as fst,
            })
            .collect()
    }
}

fn min_max(a: fst, b: fst) -> (fst, fst) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::structure::dump::{DumpFormat, DumpRequest};
    use approx::assert_relative_eq;

    fn cell_segment(cell_number: usize, betta: fst, power: Option<fst>) -> CellSegment {
        CellSegment {
            cell_number,
            betta,
            elp: 400.0,
            al32: 0.0,
            akl: 1.0,
            mode: 120.0,
            aperture: 0.01,
            b_ext: 0.1,
            power_input: power.map(|power| PowerInput {
                power,
                phase_shift: 10.0,
            }),
        }
    }

    #[test]
    fn uniform_segment_gives_identical_cells() {
        let segments = [StructureSegment::cells(cell_segment(4, 0.8, Some(1e6)))];
        let structure = Structure::build(&segments, &StructureConfig::default()).unwrap();
        assert_eq!(structure.n_cells(), 4);
        for cell in structure.cells() {
            assert_relative_eq!(cell.betta, 0.8, max_relative = 1e-12);
        }
        assert!(structure.cells()[0].first);
        assert_eq!(structure.cells()[0].p0, 1e6);
        assert_eq!(structure.cells()[0].d_f, 10.0);
        assert!(!structure.cells()[1].first);
        assert_eq!(structure.cells()[1].p0, 0.0);
    }

    #[test]
    fn parameters_vary_continuously_between_segments() {
        let segments = [
            StructureSegment::cells(cell_segment(2, 0.5, Some(1e6))),
            StructureSegment::cells(cell_segment(4, 0.9, None)),
        ];
        let structure = Structure::build(&segments, &StructureConfig::default()).unwrap();
        let betta = structure.profile(StructureParameter::BettaF).to_vec();
        assert_eq!(betta.len(), 6);
        assert_relative_eq!(betta[5], 0.9, max_relative = 1e-12);
        assert!(betta[2] > 0.5 && betta[2] < 0.9);
        assert!(betta.windows(2).all(|pair| pair[1] >= pair[0] - 1e-12));
    }

    #[test]
    fn profile_stays_within_segment_values() {
        let segments = [
            StructureSegment::cells(cell_segment(4, 0.5, Some(1e6))),
            StructureSegment::cells(cell_segment(4, 0.9, None)),
        ];
        let structure = Structure::build(&segments, &StructureConfig::default()).unwrap();
        let betta = structure.profile(StructureParameter::BettaF).to_vec();
        for &value in &betta[..4] {
            assert_relative_eq!(value, 0.5, max_relative = 1e-12);
        }
        assert!(betta[4..].iter().all(|&value| value > 0.5 && value <= 0.9));
    }

    #[test]
    fn attenuation_rising_from_zero_is_accepted() {
        let lossless = cell_segment(4, 0.9, Some(1e6));
        let lossy = CellSegment {
            al32: 0.02,
            ..cell_segment(4, 0.9, None)
        };
        let segments = [
            StructureSegment::cells(lossless),
            StructureSegment::cells(lossy),
        ];
        let structure = Structure::build(&segments, &StructureConfig::default()).unwrap();
        let al32: Vec<fst> = structure.cells().iter().map(|cell| cell.al32).collect();
        assert!(al32[..4].iter().all(|&value| value == 0.0));
        assert!(al32[4..].iter().all(|&value| value >= 0.0 && value <= 0.02));
        assert_relative_eq!(al32[7], 0.02, max_relative = 1e-12);
    }

    #[test]
    fn positions_accumulate_cell_lengths() {
        let segments = [
            StructureSegment::cells(cell_segment(3, 0.9, Some(1e6))),
            StructureSegment::drift(0.05, 0.02, 0.0),
        ];
        let config = StructureConfig::default();
        let structure = Structure::build(&segments, &config).unwrap();
        let ksi = structure.profile(StructureParameter::Ksi);
        assert_relative_eq!(ksi[1], 0.3, max_relative = 1e-12);
        assert_relative_eq!(ksi[3], 0.9, max_relative = 1e-12);
        assert!(structure.cells()[3].drift);
        assert_relative_eq!(
            structure.length(),
            0.9 * config.wavelength() + 0.05,
            max_relative = 1e-12
        );
        assert_eq!(structure.cells()[2].b_ext_exit, 0.0);
    }

    #[test]
    fn dumps_attach_to_last_cell_of_segment() {
        let segments = [
            StructureSegment::cells(cell_segment(3, 0.9, Some(1e6)))
                .with_dump(DumpRequest::all("exit.txt")),
            StructureSegment::drift(0.05, 0.02, 0.0),
        ];
        let structure = Structure::build(&segments, &StructureConfig::default()).unwrap();
        let dumps: Vec<bool> = structure.cells().iter().map(|cell| cell.dump).collect();
        assert_eq!(dumps, vec![false, false, true, false]);
        let resolved = structure.cells()[2].dump_parameters.as_ref().unwrap();
        assert_eq!(resolved.format, DumpFormat::Text);
        assert_eq!(resolved.request.file, "exit.txt");
    }

    #[test]
    fn dump_formats_are_resolved_when_building() {
        let segments = [
            StructureSegment::cells(cell_segment(2, 0.9, Some(1e6))),
            StructureSegment::drift(0.05, 0.02, 0.0).with_dump(DumpRequest::all("drift.CSV")),
        ];
        let structure = Structure::build(&segments, &StructureConfig::default()).unwrap();
        let dump = structure.cells()[2].dump_parameters.as_ref().unwrap();
        assert_eq!(dump.format, DumpFormat::Csv);
        assert!(structure.cells()[..2].iter().all(|cell| cell.dump_parameters.is_none()));
    }

    #[test]
    fn sections_must_start_with_power() {
        let segments = [
            StructureSegment::drift(0.05, 0.02, 0.0),
            StructureSegment::cells(cell_segment(3, 0.9, None)),
        ];
        assert!(matches!(
            Structure::build(&segments, &StructureConfig::default()),
            Err(Error::InvalidSegment { index: 1, .. })
        ));
        assert!(Structure::build(&[], &StructureConfig::default()).is_err());
    }
}
