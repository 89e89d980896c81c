//! Cell by cell propagation of a beam through a structure.

use crate::{
    beam::{particle::Particle, seeding::BeamConfig, Beam},
    constants::{MEV_TO_EV, REST_ENERGY_EV},
    error::{Error, Result},
    field::space_charge::{SpaceChargeConfig, SpaceChargeSnapshot},
    integration::{
        integrate_cell, loss::IntegratorConfig, parameters::IntegrationParameters,
    },
    io::Verbosity,
    kinematics::deg_to_rad,
    statistics::{
        spectrum::{compute_spectrum, SpectrumBar, SpectrumKind},
        BeamResult,
    },
    structure::{
        cell::Cell,
        dump::{CellDump, DumpFormat, DumpedParticle},
        segment::StructureSegment,
        Structure, StructureConfig,
    },
};
use indicatif::ProgressIterator;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Floating-point precision to use for the simulation driver.
#[allow(non_camel_case_types)]
pub type fsm = f64;

/// Configuration parameters for a simulation run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    pub space_charge: SpaceChargeConfig,
    pub integrator: IntegratorConfig,
    /// Whether particles within a cell are stepped in parallel.
    pub parallel: bool,
    /// Number of bars in the final energy and phase spectra.
    pub spectrum_bars: usize,
}

impl SimulationConfig {
    pub const DEFAULT_PARALLEL: bool = true;
    pub const DEFAULT_SPECTRUM_BARS: usize = 50;

    /// Panics if the configuration is invalid.
    pub fn validate(&self) {
        self.space_charge.validate();
        self.integrator.validate();
        assert!(
            self.spectrum_bars > 0,
            "Number of spectrum bars must be larger than zero."
        );
    }

    /// Checks a user supplied configuration.
    pub fn try_validate(&self) -> Result<()> {
        self.space_charge.try_validate()?;
        if self.spectrum_bars == 0 {
            return Err(Error::Precondition(
                "number of spectrum bars must be larger than zero".to_string(),
            ));
        }
        let integrator = &self.integrator;
        if !(integrator.max_phase_deviation > 0.0
            && integrator.min_axial_velocity >= 0.0
            && integrator.min_axial_velocity < 1.0
            && integrator.max_divergence > 0.0)
        {
            return Err(Error::Precondition(format!(
                "invalid loss thresholds {:?}",
                integrator
            )));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            space_charge: SpaceChargeConfig::default(),
            integrator: IntegratorConfig::default(),
            parallel: Self::DEFAULT_PARALLEL,
            spectrum_bars: Self::DEFAULT_SPECTRUM_BARS,
        }
    }
}

/// State of the beam at the exit of one cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CellRecord {
    /// Index of the cell.
    pub index: usize,
    /// Number of particles lost in the cell.
    pub lost: usize,
    /// Beam metrics at the cell exit.
    pub result: BeamResult,
}

/// A dump fired at the exit of a cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DumpRecord {
    /// Index of the cell the dump was attached to.
    pub cell_index: usize,
    /// Target name for the collaborator writing the dump.
    pub file: String,
    pub format: DumpFormat,
    /// Beam metrics at the dump position.
    pub result: BeamResult,
    /// The requested particle quantities.
    pub particles: Vec<DumpedParticle>,
}

/// Everything produced by a simulation run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SimulationOutput {
    /// Beam metrics at injection.
    pub initial: BeamResult,
    /// One record per cell, in structure order.
    pub cells: Vec<CellRecord>,
    /// Fired dumps, in structure order.
    pub dumps: Vec<DumpRecord>,
    /// Beam metrics at the structure exit.
    pub summary: BeamResult,
    pub energy_spectrum: Vec<SpectrumBar>,
    pub phase_spectrum: Vec<SpectrumBar>,
    /// Final state and loss status of every particle.
    pub particles: Vec<Particle>,
}

impl SimulationOutput {
    /// Normalized wave amplitude at the exit of every cell.
    pub fn amplitude_profile(&self) -> Vec<fsm> {
        self.cells.iter().map(|record| record.result.a).collect()
    }
}

/// RF power carried along the current section.
#[derive(Clone, Copy, Debug, Default)]
struct PowerFlow {
    /// Power at the entrance of the current cell [W].
    power: fsm,
}

impl PowerFlow {
    /// Power left after attenuation over the cell [W].
    fn attenuated(&self, cell: &Cell, wavelength: fsm) -> fsm {
        let alpha = cell.attenuation(wavelength);
        self.power * fsm::exp(-2.0 * alpha * cell.length() * wavelength)
    }

    /// Accelerating field for the given power [V/m].
    fn field(cell: &Cell, power: fsm, wavelength: fsm) -> fsm {
        cell.elp * fsm::sqrt(fsm::max(power, 0.0)) / wavelength
    }

    /// Moves the power through the cell, removing what the beam absorbed.
    ///
    /// # Parameters
    ///
    /// - `cell`: The cell the power flows through.
    /// - `wavelength`: RF wavelength [m].
    /// - `beam_current`: Current of the accelerated beam [A].
    /// - `energy_gain`: Mean energy gain of the beam in the cell [eV].
    fn advance(&mut self, cell: &Cell, wavelength: fsm, beam_current: fsm, energy_gain: fsm) {
        let absorbed = cell.akl * beam_current * energy_gain;
        self.power = fsm::max(self.attenuated(cell, wavelength) - absorbed, 0.0);
    }
}

/// A beam ready to be propagated through a structure.
#[derive(Clone, Debug)]
pub struct Simulation {
    structure: Structure,
    beam: Beam,
    config: SimulationConfig,
}

impl Simulation {
    /// Creates a new simulation.
    pub fn new(structure: Structure, beam: Beam, config: SimulationConfig) -> Result<Self> {
        config.try_validate()?;
        Ok(Simulation {
            structure,
            beam,
            config,
        })
    }

    /// Builds the structure from segments and seeds the beam for it.
    ///
    /// # Parameters
    ///
    /// - `segments`: The structure description.
    /// - `structure_config`: How the segments are expanded into cells.
    /// - `beam_config`: The injected beam.
    /// - `config`: Simulation parameters.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the simulation, ready to run.
    /// - `Err`: The structure, beam or configuration was invalid.
    pub fn from_configs(
        segments: &[StructureSegment],
        structure_config: &StructureConfig,
        beam_config: &BeamConfig,
        config: SimulationConfig,
    ) -> Result<Self> {
        let structure = Structure::build(segments, structure_config)?;
        let beam = beam_config.generate(structure.wavelength())?;
        let beam = Beam::with_count(
            beam.into_particles(),
            beam_config.current,
            beam_config.n_particles,
        )?;
        Self::new(structure, beam, config)
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn beam(&self) -> &Beam {
        &self.beam
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Propagates the beam through every cell of the structure.
    pub fn run(mut self, verbosity: &Verbosity) -> SimulationOutput {
        let wavelength = self.structure.wavelength();
        let initial = BeamResult::compute(&self.beam, wavelength, 0.0, 0.0, 0.0);
        let n_cells = self.structure.n_cells();
        let mut records = Vec::with_capacity(n_cells);
        let mut dumps = Vec::new();
        let mut flow = PowerFlow::default();
        let mut amplitude = 0.0;

        if verbosity.print_messages() {
            println!(
                "Propagating {} particles through {} cells",
                self.beam.n_particles(),
                n_cells
            );
        }

        for (index, cell) in self
            .structure
            .cells()
            .iter()
            .enumerate()
            .progress_with(verbosity.create_progress_bar(n_cells))
        {
            if cell.first {
                flow.power = cell.p0;
                let shift = deg_to_rad(cell.d_f);
                for particle in self.beam.particles_mut() {
                    if particle.is_alive() {
                        particle.phi += shift;
                    }
                }
            }

            let energy_in = mean_energy(&self.beam);
            let (field, field_exit) = if cell.drift {
                (0.0, 0.0)
            } else {
                (
                    PowerFlow::field(cell, flow.power, wavelength),
                    PowerFlow::field(cell, flow.attenuated(cell, wavelength), wavelength),
                )
            };
            let snapshot = SpaceChargeSnapshot::compute(
                &self.config.space_charge,
                self.beam.particles(),
                self.beam.current(),
            );
            let parameters = IntegrationParameters::new(
                cell,
                wavelength,
                field,
                field_exit,
                self.beam.particles(),
                snapshot,
            );
            let lost = integrate_cell(
                self.beam.particles_mut(),
                &parameters,
                &self.config.integrator,
                self.config.parallel,
            );

            amplitude = if cell.drift {
                0.0
            } else {
                let energy_gain = (mean_energy(&self.beam) - energy_in) * MEV_TO_EV;
                flow.advance(cell, wavelength, self.beam.current(), energy_gain);
                PowerFlow::field(cell, flow.power, wavelength) * wavelength / REST_ENERGY_EV
            };
            if lost > 0 && verbosity.print_messages() {
                println!(
                    "Cell {}: lost {} particles, {} remaining",
                    index,
                    lost,
                    self.beam.n_alive()
                );
            }

            let exit = (cell.ksi + cell.length()) * wavelength;
            let result = BeamResult::compute(&self.beam, wavelength, exit, flow.power, amplitude);
            if let Some(CellDump { request, format }) = &cell.dump_parameters {
                if verbosity.print_messages() {
                    println!("Dumping beam at cell {} to {}", index, request.file);
                }
                dumps.push(DumpRecord {
                    cell_index: index,
                    file: request.file.clone(),
                    format: *format,
                    result: result.clone(),
                    particles: request.select(self.beam.particles(), wavelength),
                });
            }
            records.push(CellRecord {
                index,
                lost,
                result,
            });
        }

        let summary = BeamResult::compute(
            &self.beam,
            wavelength,
            self.structure.length(),
            flow.power,
            amplitude,
        );
        let bars = self.config.spectrum_bars;
        let energy_spectrum = compute_spectrum(&self.beam, SpectrumKind::Energy, bars, wavelength);
        let phase_spectrum = compute_spectrum(&self.beam, SpectrumKind::Phase, bars, wavelength);
        if verbosity.print_messages() {
            println!(
                "Captured {:.1}% of the beam, average energy {:.4} MeV",
                100.0 * summary.captured,
                summary.average_energy
            );
        }
        SimulationOutput {
            initial,
            cells: records,
            dumps,
            summary,
            energy_spectrum,
            phase_spectrum,
            particles: self.beam.into_particles(),
        }
    }
}

/// Mean kinetic energy of the alive particles [MeV], zero if none are alive.
fn mean_energy(beam: &Beam) -> fsm {
    let (sum, count) = beam
        .alive()
        .fold((0.0, 0usize), |(sum, count), p| (sum + p.energy(), count + 1));
    if count > 0 {
        sum / count as fsm
    } else {
        0.0
    }
}
