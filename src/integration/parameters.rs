//! Constants shared by all particles while they move through one cell.

use super::fin;
use crate::{
    beam::particle::Particle,
    constants::{REST_ENERGY_EV, TWO_PI},
    field::{
        external::{magnetic_coefficient, SolenoidField},
        rf::RfWave,
        space_charge::SpaceChargeSnapshot,
    },
    structure::cell::Cell,
};

/// Per-cell integration parameters.
///
/// Built once at cell entry from the cell, the RF field and the ensemble,
/// and read by every particle during stepping.
#[derive(Clone, Debug)]
pub struct IntegrationParameters {
    /// Step length in wavelengths.
    pub h: fin,
    /// Number of steps through the cell.
    pub mesh: usize,
    /// Phase velocity of the wave.
    pub bw: fin,
    /// Normalized angular frequency of the wave.
    pub w: fin,
    /// Cell length in wavelengths.
    pub dl: fin,
    /// Normalized wave amplitude at the cell entrance.
    pub a: fin,
    /// Change of the normalized amplitude across the cell.
    pub da: fin,
    /// Field to power coupling of the cell.
    pub b: fin,
    /// Accelerating field at the cell entrance [V/m].
    pub e: fin,
    /// Normalized solenoid field at the cell entrance.
    pub bz_ext: fin,
    /// Normalized radial solenoid field per unit radius.
    pub br_ext: fin,
    /// Conversion from tesla to normalized magnetic field.
    pub cmag: fin,
    /// Sum of the sines of the alive particle phases.
    pub sum_sin: fin,
    /// Sum of the cosines of the alive particle phases.
    pub sum_cos: fin,
    /// Mean phase of the alive particles [rad].
    pub mean_phase: fin,
    /// Mean Lorentz factor of the alive particles.
    pub gamma: fin,
    /// Whether the cell is a drift.
    pub drift: bool,
    /// Aperture radius in wavelengths.
    pub aperture: fin,
    /// RF wavelength [m].
    pub wavelength: fin,
    /// Position of the cell entrance in wavelengths.
    pub ksi: fin,
    /// The accelerating wave at the cell entrance.
    pub wave: RfWave,
    /// The external solenoid field.
    pub solenoid: SolenoidField,
    /// The self-field of the bunch frozen at cell entry.
    pub space_charge: SpaceChargeSnapshot,
}

impl IntegrationParameters {
    /// Creates the parameters for a cell.
    ///
    /// # Parameters
    ///
    /// - `cell`: The cell to move through.
    /// - `wavelength`: RF wavelength [m].
    /// - `field`: Accelerating field at the cell entrance [V/m].
    /// - `field_exit`: Accelerating field expected at the cell exit [V/m].
    /// - `particles`: The ensemble at cell entry.
    /// - `space_charge`: Self-field snapshot of the ensemble at cell entry.
    pub fn new(
        cell: &Cell,
        wavelength: fin,
        field: fin,
        field_exit: fin,
        particles: &[Particle],
        space_charge: SpaceChargeSnapshot,
    ) -> Self {
        let (field, field_exit) = if cell.drift {
            (0.0, 0.0)
        } else {
            (field, field_exit)
        };
        let a = field * wavelength / REST_ENERGY_EV;
        let a_exit = field_exit * wavelength / REST_ENERGY_EV;
        let dl = cell.length();
        let cmag = magnetic_coefficient(wavelength);
        let solenoid = SolenoidField::new(cell.b_ext, cell.b_ext_exit, dl, cmag);

        let (mut sum_sin, mut sum_cos, mut sum_phase, mut sum_gamma, mut n_alive) =
            (0.0, 0.0, 0.0, 0.0, 0usize);
        for particle in particles.iter().filter(|p| p.is_alive()) {
            let (sin, cos) = particle.phi.sin_cos();
            sum_sin += sin;
            sum_cos += cos;
            sum_phase += particle.phi;
            sum_gamma += particle.gamma();
            n_alive += 1;
        }
        let (mean_phase, gamma) = if n_alive > 0 {
            (sum_phase / n_alive as fin, sum_gamma / n_alive as fin)
        } else {
            (0.0, 1.0)
        };

        IntegrationParameters {
            h: cell.step_length(),
            mesh: cell.mesh,
            bw: cell.betta,
            w: TWO_PI,
            dl,
            a,
            da: a_exit - a,
            b: cell.elp,
            e: field,
            bz_ext: solenoid.bz_entrance(),
            br_ext: solenoid.br_gradient(),
            cmag,
            sum_sin,
            sum_cos,
            mean_phase,
            gamma,
            drift: cell.drift,
            aperture: cell.aperture / wavelength,
            wavelength,
            ksi: cell.ksi,
            wave: RfWave::new(a, cell.betta),
            solenoid,
            space_charge,
        }
    }

    /// Normalized wave amplitude at distance `s` from the cell entrance.
    pub fn amplitude_at(&self, s: fin) -> fin {
        if self.dl > 0.0 {
            self.a + self.da * s / self.dl
        } else {
            self.a
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {

    use super::*;
    use crate::beam::particle::LossReason;
    use approx::assert_relative_eq;

    /// Parameters of a field-free cell one wavelength long with
    /// 20 steps and the given aperture in wavelengths.
    pub(crate) fn drift_parameters(aperture: fin) -> IntegrationParameters {
        let wavelength = 0.1;
        let cell = Cell {
            betta: 1.0,
            elp: 0.0,
            al32: 0.0,
            akl: 0.0,
            mode: 0.0,
            f0: 2.998e9,
            p0: 0.0,
            d_f: 0.0,
            mesh: 20,
            drift: true,
            first: false,
            dump: false,
            dump_parameters: None,
            ksi: 0.0,
            drift_length: 1.0,
            aperture: aperture * wavelength,
            b_ext: 0.0,
            b_ext_exit: 0.0,
        };
        IntegrationParameters::new(&cell, wavelength, 0.0, 0.0, &[], SpaceChargeSnapshot::zero(1))
    }

    #[test]
    fn drift_has_no_wave() {
        let parameters = drift_parameters(0.1);
        assert_eq!(parameters.a, 0.0);
        assert_relative_eq!(parameters.h, 0.05);
        assert_relative_eq!(parameters.aperture, 0.1, max_relative = 1e-12);
        assert_eq!(parameters.gamma, 1.0);
    }

    #[test]
    fn amplitude_varies_linearly() {
        let mut parameters = drift_parameters(0.1);
        parameters.a = 1.0;
        parameters.da = 0.5;
        assert_relative_eq!(parameters.amplitude_at(0.5), 1.25);
        assert_relative_eq!(parameters.amplitude_at(1.0), 1.5);
    }

    #[test]
    fn ensemble_moments_skip_lost_particles() {
        let mut particles = vec![
            Particle::new(0.01, 0.0, 0.0, 0.0, 0.2, 0.5),
            Particle::new(0.01, 0.0, 0.0, 0.0, 0.4, 0.5),
            Particle::new(0.01, 0.0, 0.0, 0.0, 3.0, 0.5),
        ];
        particles[2].mark_lost(LossReason::Phase);
        let cell = Cell {
            drift: false,
            betta: 0.5,
            mode: 180.0,
            elp: 100.0,
            ..dummy_rf_cell()
        };
        let cell_parameters = IntegrationParameters::new(
            &cell,
            0.1,
            1e6,
            2e6,
            &particles,
            SpaceChargeSnapshot::zero(particles.len()),
        );
        assert_relative_eq!(cell_parameters.mean_phase, 0.3, max_relative = 1e-12);
        assert_relative_eq!(cell_parameters.sum_sin, 0.2f64.sin() + 0.4f64.sin());
        assert_relative_eq!(cell_parameters.a, 1e6 * 0.1 / REST_ENERGY_EV);
        assert_relative_eq!(cell_parameters.da, cell_parameters.a, max_relative = 1e-12);
        assert_relative_eq!(cell_parameters.dl, 0.25);
    }

    fn dummy_rf_cell() -> Cell {
        Cell {
            betta: 1.0,
            elp: 0.0,
            al32: 0.0,
            akl: 0.0,
            mode: 360.0,
            f0: 2.998e9,
            p0: 0.0,
            d_f: 0.0,
            mesh: 10,
            drift: false,
            first: false,
            dump: false,
            dump_parameters: None,
            ksi: 0.0,
            drift_length: 0.0,
            aperture: 0.01,
            b_ext: 0.0,
            b_ext_exit: 0.0,
        }
    }
}
