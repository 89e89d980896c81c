//! Integration of particle trajectories through the structure.

pub mod loss;
pub mod parameters;
pub mod stepping;

use self::{loss::IntegratorConfig, parameters::IntegrationParameters, stepping::step_particle};
use crate::beam::particle::Particle;
use rayon::prelude::*;

/// Floating-point precision to use for integration.
#[allow(non_camel_case_types)]
pub type fin = f64;

/// Moves all particles through one cell.
///
/// Particles only interact through the space charge snapshot stored in
/// `parameters`, so they can be stepped independently and in any order.
///
/// # Parameters
///
/// - `particles`: The ensemble, indexed like the space charge snapshot.
/// - `parameters`: Parameters of the cell.
/// - `config`: Loss thresholds.
/// - `parallel`: Whether to step the particles on the rayon thread pool.
///
/// # Returns
///
/// The number of particles lost in the cell.
pub fn integrate_cell(
    particles: &mut [Particle],
    parameters: &IntegrationParameters,
    config: &IntegratorConfig,
    parallel: bool,
) -> usize {
    assert_eq!(
        particles.len(),
        parameters.space_charge.n_particles(),
        "Space charge snapshot does not match the ensemble."
    );
    if parallel {
        particles
            .par_iter_mut()
            .enumerate()
            .filter_map(|(idx, particle)| step_particle(particle, idx, parameters, config))
            .count()
    } else {
        particles
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, particle)| step_particle(particle, idx, parameters, config))
            .count()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        beam::particle::LossReason, field::space_charge::SpaceChargeSnapshot,
        integration::parameters::tests::drift_parameters,
    };

    fn ensemble() -> Vec<Particle> {
        (0..16)
            .map(|i| {
                let x = 0.002 * (i + 1) as fin;
                Particle::new(x, 0.1 * i as fin, 0.01 * i as fin, 1e-5, 0.0, 0.95)
            })
            .collect()
    }

    #[test]
    fn parallel_and_sequential_stepping_agree() {
        let mut parameters = drift_parameters(0.03);
        parameters.space_charge = SpaceChargeSnapshot::zero(16);
        let config = IntegratorConfig::default();

        let mut sequential = ensemble();
        let mut parallel = ensemble();
        let lost_sequential = integrate_cell(&mut sequential, &parameters, &config, false);
        let lost_parallel = integrate_cell(&mut parallel, &parameters, &config, true);

        assert_eq!(lost_sequential, lost_parallel);
        assert_eq!(sequential, parallel);
        assert!(lost_sequential > 0);
        assert!(sequential
            .iter()
            .filter(|particle| !particle.is_alive())
            .all(|particle| particle.loss_reason() == Some(LossReason::Radius)));
    }

    #[test]
    fn lost_count_excludes_earlier_losses() {
        let mut parameters = drift_parameters(1.0);
        parameters.space_charge = SpaceChargeSnapshot::zero(16);
        let mut particles = ensemble();
        particles[3].mark_lost(LossReason::Phase);
        let lost = integrate_cell(&mut particles, &parameters, &IntegratorConfig::default(), true);
        assert_eq!(lost, 0);
        assert_eq!(particles.iter().filter(|p| p.is_alive()).count(), 15);
    }
}
