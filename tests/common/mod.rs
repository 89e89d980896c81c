use lazy_static::lazy_static;
use rflinac::{
    beam::seeding::{BeamConfig, BeamSeeding},
    field::space_charge::SpaceChargeConfig,
    io::Verbosity,
    simulation::{Simulation, SimulationConfig, SimulationOutput},
    structure::{
        dump::DumpRequest,
        segment::{CellSegment, PowerInput, StructureSegment},
        StructureConfig,
    },
};

lazy_static! {
    pub static ref STRUCTURE_CONFIG: StructureConfig = StructureConfig::default();
    pub static ref WAVELENGTH: f64 = STRUCTURE_CONFIG.wavelength();
}

#[macro_export]
macro_rules! def_test {
    (
        SEGMENTS[$segments:expr]
        BEAM[$beam:expr]
        CONFIG[$config:expr]
        fn $name:ident |$output:ident| $test_body:block
    ) => {
        #[test]
        fn $name() {
            let $output = common::run(&$segments, &$beam, $config);
            $test_body
        }
    };
}

pub fn run(
    segments: &[StructureSegment],
    beam: &BeamConfig,
    config: SimulationConfig,
) -> SimulationOutput {
    Simulation::from_configs(segments, &STRUCTURE_CONFIG, beam, config)
        .unwrap()
        .run(&Verbosity::Quiet)
}

pub fn config(parallel: bool, space_charge: bool) -> SimulationConfig {
    SimulationConfig {
        space_charge: SpaceChargeConfig {
            enabled: space_charge,
            n_slices: 4,
        },
        parallel,
        spectrum_bars: 10,
        ..SimulationConfig::default()
    }
}

pub fn beam(n_particles: usize, energy: f64, current: f64, seeding: BeamSeeding) -> BeamConfig {
    BeamConfig {
        n_particles,
        current,
        energy,
        phase: 0.0,
        phase_spread: 0.0,
        radius: 1e-3,
        seeding,
        seed: Some(42),
        ..BeamConfig::default()
    }
}

pub fn drift(length: f64, pipe_radius: f64) -> StructureSegment {
    StructureSegment::drift(length, pipe_radius, 0.0)
}

pub fn rf_section(cell_number: usize, betta: f64, power: f64) -> StructureSegment {
    StructureSegment::cells(CellSegment {
        cell_number,
        betta,
        elp: 400.0,
        al32: 0.02,
        akl: 1.0,
        mode: 120.0,
        aperture: 0.01,
        b_ext: 0.0,
        power_input: Some(PowerInput {
            power,
            phase_shift: 0.0,
        }),
    })
}

pub fn dump(file: &str) -> DumpRequest {
    DumpRequest::all(file)
}
