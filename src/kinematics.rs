//! Relativistic kinematics and small numerical helpers.
//!
//! Energies are kinetic energies in MeV, `gamma` is the Lorentz factor and
//! `beta` the velocity in units of the speed of light.

use crate::constants::{EV_TO_MEV, MEV_TO_EV, PI, REST_ENERGY_EV};

/// Floating-point precision to use for kinematics.
#[allow(non_camel_case_types)]
pub type fkn = f64;

/// Largest velocity accepted by `clamp_velocity`.
pub const MAX_VELOCITY: fkn = 1.0 - 1e-12;

/// Axial momenta smaller than this are treated as zero by `pulse_to_angle`.
pub const MIN_AXIAL_PULSE: fkn = 1e-5;

/// Converts a Lorentz factor into kinetic energy [MeV].
pub fn gamma_to_mev(gamma: fkn) -> fkn {
    REST_ENERGY_EV * (gamma - 1.0) * EV_TO_MEV
}

/// Converts a kinetic energy [MeV] into a Lorentz factor.
pub fn mev_to_gamma(energy: fkn) -> fkn {
    1.0 + energy * MEV_TO_EV / REST_ENERGY_EV
}

/// Converts a Lorentz factor into a velocity.
///
/// Only defined for `gamma >= 1`, smaller values give NaN.
pub fn energy_to_velocity(gamma: fkn) -> fkn {
    fkn::sqrt(1.0 - 1.0 / (gamma * gamma))
}

/// Converts a velocity into a Lorentz factor.
///
/// Diverges as `beta` approaches one, use `clamp_velocity` first when the
/// velocity is not known to be physical.
pub fn velocity_to_energy(beta: fkn) -> fkn {
    1.0 / fkn::sqrt(1.0 - beta * beta)
}

/// Converts a velocity into kinetic energy [MeV].
pub fn velocity_to_mev(beta: fkn) -> fkn {
    gamma_to_mev(velocity_to_energy(beta))
}

/// Converts a kinetic energy [MeV] into a velocity.
pub fn mev_to_velocity(energy: fkn) -> fkn {
    energy_to_velocity(mev_to_gamma(energy))
}

/// Restricts a velocity to `[0, MAX_VELOCITY]`.
pub fn clamp_velocity(beta: fkn) -> fkn {
    beta.clamp(0.0, MAX_VELOCITY)
}

pub fn rad_to_deg(angle: fkn) -> fkn {
    angle * 180.0 / PI
}

pub fn deg_to_rad(angle: fkn) -> fkn {
    angle * PI / 180.0
}

/// Sign of `x`, with `sign(0) = 0`.
pub fn sign(x: fkn) -> fkn {
    if x == 0.0 {
        0.0
    } else if x > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Angle of a momentum with transverse component `bx` and axial component `bz`.
///
/// Falls back to `sign(bx)*pi/2` when the axial component is too small
/// for the ratio to be meaningful.
pub fn pulse_to_angle(bx: fkn, bz: fkn) -> fkn {
    if fkn::abs(bz) > MIN_AXIAL_PULSE {
        fkn::atan(bx / bz)
    } else {
        sign(bx) * PI / 2.0
    }
}

/// Number of interval halvings needed to shrink `delta` below `epsilon`.
pub fn count_steps(delta: fkn, epsilon: fkn) -> usize {
    let steps = fkn::ceil(fkn::log2(delta / epsilon));
    if steps.is_finite() && steps > 0.0 {
        steps as usize
    } else {
        0
    }
}

/// Wraps an angle into `(-pi, pi]`.
pub fn wrap_phase(angle: fkn) -> fkn {
    let wrapped = angle - 2.0 * PI * fkn::floor((angle + PI) / (2.0 * PI));
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    #[test]
    fn rest_particle_has_zero_energy() {
        assert_eq!(gamma_to_mev(1.0), 0.0);
        assert_eq!(mev_to_gamma(0.0), 1.0);
        assert_eq!(energy_to_velocity(1.0), 0.0);
        assert_eq!(velocity_to_energy(0.0), 1.0);
    }

    #[test]
    fn one_rest_energy_doubles_gamma() {
        assert_relative_eq!(mev_to_gamma(REST_ENERGY_EV * EV_TO_MEV), 2.0);
        assert_relative_eq!(energy_to_velocity(2.0), fkn::sqrt(0.75));
    }

    #[test]
    fn velocity_below_rest_is_undefined() {
        assert!(energy_to_velocity(0.5).is_nan());
    }

    #[test]
    fn clamped_velocity_gives_finite_energy() {
        assert!(velocity_to_energy(clamp_velocity(1.0)).is_finite());
        assert_eq!(clamp_velocity(-0.2), 0.0);
    }

    #[test]
    fn sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(-1e-300), -1.0);
    }

    #[test]
    fn pulse_to_angle_falls_back_for_vanishing_axial_pulse() {
        assert_relative_eq!(pulse_to_angle(1.0, 1.0), PI / 4.0);
        assert_eq!(pulse_to_angle(0.3, 1e-6), PI / 2.0);
        assert_eq!(pulse_to_angle(-0.3, 0.0), -PI / 2.0);
        assert_eq!(pulse_to_angle(0.0, 0.0), 0.0);
    }

    #[test]
    fn count_steps_matches_halvings() {
        assert_eq!(count_steps(1.0, 1.0 / 1024.0), 10);
        assert_eq!(count_steps(1.0, 0.3), 2);
        assert_eq!(count_steps(1.0, 2.0), 0);
    }

    #[test]
    fn degree_conversion_is_linear() {
        assert_relative_eq!(deg_to_rad(180.0), PI);
        assert_relative_eq!(rad_to_deg(PI / 2.0), 90.0);
    }

    #[test]
    fn wrapped_phase_stays_in_range() {
        assert_abs_diff_eq!(wrap_phase(3.0 * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_phase(0.5), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_phase(-7.0), -7.0 + 2.0 * PI, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn gamma_energy_round_trip(gamma in 1.0f64..1e4) {
            let round_trip = mev_to_gamma(gamma_to_mev(gamma));
            prop_assert!((round_trip - gamma).abs() <= 1e-12 * gamma);
        }

        #[test]
        fn velocity_energy_round_trip(beta in 0.0f64..0.999_999) {
            let round_trip = energy_to_velocity(velocity_to_energy(beta));
            prop_assert!((round_trip - beta).abs() <= 1e-9);
        }

        #[test]
        fn degree_radian_round_trip(angle in -720.0f64..720.0) {
            prop_assert!((rad_to_deg(deg_to_rad(angle)) - angle).abs() <= 1e-10);
        }
    }
}
