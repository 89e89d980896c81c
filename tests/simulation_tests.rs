mod common;

use approx::assert_relative_eq;
use common::{beam, config, drift, dump, rf_section, WAVELENGTH};
use rflinac::{
    beam::{
        particle::{LossReason, ParticleStatus},
        seeding::BeamSeeding,
    },
    structure::dump::DumpRequest,
};

def_test!(
SEGMENTS[[drift(0.5, 0.05)]]
BEAM[beam(16, 5.0, 0.0, BeamSeeding::FixedRadius)]
CONFIG[config(true, true)]
fn drift_keeps_momenta_and_advances_position |output| {
    assert_eq!(output.cells.len(), 1);
    assert_eq!(output.summary.captured, 1.0);
    for particle in &output.particles {
        assert_eq!(particle.status(), ParticleStatus::Alive);
        assert_eq!(particle.bx, 0.0);
        assert_eq!(particle.bth, 0.0);
        assert_relative_eq!(particle.x, particle.x0, max_relative = 1e-12);
        assert_relative_eq!(particle.z, 0.5, max_relative = 1e-12);
    }
    assert_relative_eq!(
        output.summary.average_energy,
        output.initial.average_energy,
        max_relative = 1e-10
    );
    assert_relative_eq!(output.summary.length, 0.5, max_relative = 1e-12);
});

def_test!(
SEGMENTS[[drift(0.2, 1e-3)]]
BEAM[beam(8, 2.0, 0.1, BeamSeeding::FixedRadius)]
CONFIG[config(false, true)]
fn particles_on_aperture_are_lost_at_entry |output| {
    assert_eq!(output.cells[0].lost, 8);
    for particle in &output.particles {
        assert_eq!(particle.loss_reason(), Some(LossReason::Radius));
        assert_eq!(particle.n_steps, 0);
        assert_relative_eq!(particle.x * *WAVELENGTH, 1e-3, max_relative = 1e-12);
    }
    let summary = &output.summary;
    assert_eq!(summary.captured, 0.0);
    assert_eq!(summary.beam_current, 0.0);
    assert_eq!(summary.average_energy, 0.0);
    assert_eq!(summary.phase_length, 0.0);
    assert_eq!(summary.emittance, 0.0);
    assert_eq!(summary.beam_power, 0.0);
    assert!(output.energy_spectrum.is_empty());
});

def_test!(
SEGMENTS[[
    rf_section(6, 0.999, 5e6).with_dump(dump("section.csv")),
    drift(0.1, 0.02).with_dump(DumpRequest {
        n1: 2,
        n2: 4,
        phase: false,
        ..dump("drift.txt")
    }),
]]
BEAM[beam(10, 5.0, 0.0, BeamSeeding::FixedX)]
CONFIG[config(true, false)]
fn dumps_fire_once_at_their_cells |output| {
    assert_eq!(output.cells.len(), 7);
    assert_eq!(output.dumps.len(), 2);

    let section = &output.dumps[0];
    assert_eq!(section.cell_index, 5);
    assert_eq!(section.file, "section.csv");
    assert_eq!(section.particles.len(), 10);
    assert_eq!(section.result, output.cells[5].result);

    let drift_dump = &output.dumps[1];
    assert_eq!(drift_dump.cell_index, 6);
    let indices: Vec<usize> = drift_dump.particles.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![2, 3, 4]);
    assert!(drift_dump.particles.iter().all(|p| p.phase.is_none() && p.energy.is_some()));
});

def_test!(
SEGMENTS[[rf_section(30, 0.999, 2e7)]]
BEAM[beam(32, 5.0, 0.0, BeamSeeding::FixedRadius)]
CONFIG[config(true, false)]
fn synchronous_beam_is_accelerated |output| {
    assert_eq!(output.summary.captured, 1.0);
    assert!(output.summary.average_energy > output.initial.average_energy + 1.0);
    assert!(output.summary.load_power < 2e7);
    let amplitudes = output.amplitude_profile();
    assert_eq!(amplitudes.len(), 30);
    assert!(amplitudes.windows(2).all(|pair| pair[1] < pair[0]));
});

#[test]
fn parallel_and_sequential_runs_agree() {
    let segments = [rf_section(10, 0.99, 1e7), drift(0.2, 0.01)];
    let beam = common::beam(64, 1.0, 0.2, BeamSeeding::Random);
    let sequential = common::run(&segments, &beam, config(false, true));
    let parallel = common::run(&segments, &beam, config(true, true));
    assert_eq!(sequential.particles, parallel.particles);
    assert_eq!(sequential.summary, parallel.summary);
    assert_eq!(sequential.cells, parallel.cells);
}

#[cfg(feature = "serialization")]
#[test]
fn output_serializes_to_json() {
    let output = common::run(
        &[drift(0.1, 0.02).with_dump(dump("exit.txt"))],
        &beam(4, 1.0, 0.0, BeamSeeding::FixedY),
        config(false, false),
    );
    let json = serde_json::to_string(&output).unwrap();
    let decoded: rflinac::simulation::SimulationOutput = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.dumps.len(), 1);
    assert_eq!(decoded.particles.len(), 4);
}
