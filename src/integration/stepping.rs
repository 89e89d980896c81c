//! Fourth-order Runge-Kutta stepping of single particles through a cell.

use super::{fin, loss, loss::IntegratorConfig, parameters::IntegrationParameters};
use crate::{
    beam::particle::{LossReason, Particle},
    constants::PI,
    field::LocalField,
    kinematics::{clamp_velocity, energy_to_velocity, velocity_to_energy},
};

/// Radii below this are treated as lying on the axis.
const AXIS_TOLERANCE: fin = 1e-12;

/// The variables integrated for each particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    /// Radial offset in wavelengths.
    pub x: fin,
    /// Azimuthal angle [rad].
    pub th: fin,
    /// Radial momentum `gamma*beta_r`.
    pub bx: fin,
    /// Normalized angular momentum `gamma*x*beta_th`.
    pub bth: fin,
    /// Lorentz factor.
    pub gamma: fin,
    /// Phase relative to the wave [rad].
    pub phi: fin,
}

impl ParticleState {
    pub fn from_particle(particle: &Particle) -> Self {
        ParticleState {
            x: particle.x,
            th: particle.th,
            bx: particle.bx,
            bth: particle.bth,
            gamma: velocity_to_energy(clamp_velocity(particle.betta)),
            phi: particle.phi,
        }
    }

    /// Writes the state back into the particle.
    pub fn apply_to(&self, particle: &mut Particle) {
        particle.x = self.x;
        particle.th = self.th;
        particle.bx = self.bx;
        particle.bth = self.bth;
        particle.betta = energy_to_velocity(self.gamma);
        particle.phi = self.phi;
    }

    pub fn radial_velocity(&self) -> fin {
        self.bx / self.gamma
    }

    pub fn azimuthal_velocity(&self) -> fin {
        if fin::abs(self.x) < AXIS_TOLERANCE {
            0.0
        } else {
            self.bth / (self.gamma * self.x)
        }
    }

    /// Square of the axial velocity, negative if the state is unphysical.
    pub fn axial_velocity_sqr(&self) -> fin {
        let beta_r = self.radial_velocity();
        let beta_th = self.azimuthal_velocity();
        1.0 - 1.0 / (self.gamma * self.gamma) - beta_r * beta_r - beta_th * beta_th
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.th, self.bx, self.bth, self.gamma, self.phi]
            .iter()
            .all(|value| value.is_finite())
    }

    /// Whether the state describes a real particle, finite and with `gamma >= 1`.
    pub fn is_physical(&self) -> bool {
        self.is_finite() && self.gamma >= 1.0
    }

    /// Moves a particle that crossed the axis back to positive radius.
    pub fn reflect_through_axis(&mut self) {
        if self.x < 0.0 {
            self.x = -self.x;
            self.bx = -self.bx;
            self.th += PI;
        }
    }

    fn offset(&self, derivative: &ParticleState, scale: fin) -> Self {
        ParticleState {
            x: self.x + scale * derivative.x,
            th: self.th + scale * derivative.th,
            bx: self.bx + scale * derivative.bx,
            bth: self.bth + scale * derivative.bth,
            gamma: self.gamma + scale * derivative.gamma,
            phi: self.phi + scale * derivative.phi,
        }
    }
}

/// Working set of one Runge-Kutta stage: the state together with the
/// fields acting on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationState {
    pub phi: fin,
    /// Axial electric field, RF and space charge.
    pub az: fin,
    /// Radial electric field, RF and space charge.
    pub ar: fin,
    /// Azimuthal magnetic field of the wave.
    pub hth: fin,
    /// Axial magnetic field.
    pub bz: fin,
    /// Radial magnetic field.
    pub br: fin,
    /// Axial velocity.
    pub betta: fin,
    pub bx: fin,
    pub bth: fin,
    pub r: fin,
    pub th: fin,
    pub gamma: fin,
    /// Wave amplitude at the stage position.
    pub a: fin,
}

impl IntegrationState {
    /// Evaluates the fields acting on a particle at distance `s` from the
    /// cell entrance.
    ///
    /// Contributions are added in a fixed order: wave, external field, space charge.
    pub fn evaluate(
        state: &ParticleState,
        s: fin,
        parameters: &IntegrationParameters,
        particle_idx: usize,
    ) -> Self {
        let a = parameters.amplitude_at(s);
        let mut field = LocalField::default();
        if !parameters.drift {
            field.accumulate(&parameters.wave.with_amplitude(a).evaluate(state.x, state.phi));
        }
        field.accumulate(&parameters.solenoid.evaluate(state.x, s));
        field.accumulate(&parameters.space_charge.evaluate(particle_idx));
        IntegrationState {
            phi: state.phi,
            az: field.ez,
            ar: field.er,
            hth: field.h_th,
            bz: field.bz,
            br: field.br,
            betta: fin::sqrt(fin::max(state.axial_velocity_sqr(), 0.0)),
            bx: state.bx,
            bth: state.bth,
            r: state.x,
            th: state.th,
            gamma: state.gamma,
            a,
        }
    }

    /// Derivatives of the state with respect to the normalized axial position.
    fn derivatives(&self, parameters: &IntegrationParameters) -> ParticleState {
        let beta_z = self.betta;
        let beta_r = self.bx / self.gamma;
        let on_axis = fin::abs(self.r) < AXIS_TOLERANCE;
        let beta_th = if on_axis {
            0.0
        } else {
            self.bth / (self.gamma * self.r)
        };
        let centrifugal = if on_axis {
            0.0
        } else {
            self.bth * self.bth / (self.gamma * self.r * self.r * self.r)
        };
        ParticleState {
            x: beta_r / beta_z,
            th: if on_axis { 0.0 } else { beta_th / (self.r * beta_z) },
            bx: centrifugal / beta_z + (self.ar - beta_z * self.hth) / beta_z
                + beta_th * self.bz / beta_z,
            bth: self.r * self.br - self.r * beta_r * self.bz / beta_z,
            gamma: self.az + beta_r / beta_z * self.ar,
            phi: parameters.w * (1.0 / parameters.bw - 1.0 / beta_z),
        }
    }
}

/// Advances the state by one step of length `h` from position `s`.
pub fn rk4_step(
    state: &ParticleState,
    s: fin,
    h: fin,
    parameters: &IntegrationParameters,
    particle_idx: usize,
) -> ParticleState {
    let derivative_at = |state: &ParticleState, s: fin| {
        IntegrationState::evaluate(state, s, parameters, particle_idx).derivatives(parameters)
    };
    let k1 = derivative_at(state, s);
    let k2 = derivative_at(&state.offset(&k1, 0.5 * h), s + 0.5 * h);
    let k3 = derivative_at(&state.offset(&k2, 0.5 * h), s + 0.5 * h);
    let k4 = derivative_at(&state.offset(&k3, h), s + h);
    ParticleState {
        x: state.x + h / 6.0 * (k1.x + 2.0 * k2.x + 2.0 * k3.x + k4.x),
        th: state.th + h / 6.0 * (k1.th + 2.0 * k2.th + 2.0 * k3.th + k4.th),
        bx: state.bx + h / 6.0 * (k1.bx + 2.0 * k2.bx + 2.0 * k3.bx + k4.bx),
        bth: state.bth + h / 6.0 * (k1.bth + 2.0 * k2.bth + 2.0 * k3.bth + k4.bth),
        gamma: state.gamma + h / 6.0 * (k1.gamma + 2.0 * k2.gamma + 2.0 * k3.gamma + k4.gamma),
        phi: state.phi + h / 6.0 * (k1.phi + 2.0 * k2.phi + 2.0 * k3.phi + k4.phi),
    }
}

/// Moves a particle through the current cell.
///
/// Lost particles are left untouched. Loss is checked at the cell entrance
/// and after every step, and stepping stops at the first loss. A particle
/// whose state became non-finite or fell below rest energy keeps the state
/// from before the step.
///
/// # Returns
///
/// The reason the particle was lost in this cell, if it was.
pub fn step_particle(
    particle: &mut Particle,
    particle_idx: usize,
    parameters: &IntegrationParameters,
    config: &IntegratorConfig,
) -> Option<LossReason> {
    if !particle.is_alive() {
        return None;
    }
    let mut state = ParticleState::from_particle(particle);
    if let Some(reason) = loss::detect_loss(config, &state, parameters, particle.n_steps) {
        particle.mark_lost(reason);
        return Some(reason);
    }
    let z_entrance = parameters.ksi * parameters.wavelength;
    for step in 0..parameters.mesh {
        let s = step as fin * parameters.h;
        let mut next = rk4_step(&state, s, parameters.h, parameters, particle_idx);
        next.reflect_through_axis();
        particle.n_steps += 1;
        let loss = loss::detect_loss(config, &next, parameters, particle.n_steps);
        if next.is_physical() {
            state = next;
            state.apply_to(particle);
            particle.z = z_entrance + (s + parameters.h) * parameters.wavelength;
        }
        if let Some(reason) = loss {
            particle.mark_lost(reason);
            return Some(reason);
        }
    }
    None
}
