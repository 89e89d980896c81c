//! Longitudinal phase stability: the bucket Hamiltonian and its separatrix.
//!
//! Phases are given in degrees, energies as Lorentz factors and `A` is the
//! normalized wave amplitude.

use crate::{
    constants::TWO_PI,
    error::{Error, Result},
    kinematics::deg_to_rad,
};

/// Floating-point precision to use for separatrix computations.
#[allow(non_camel_case_types)]
pub type fsp = f64;

/// Root structure of the separatrix equation at a given phase.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum SeparatrixSolution {
    /// The separatrix does not reach this phase.
    NoRoots,
    /// The two branches touch.
    OneRoot(fsp),
    /// The requested branch of two distinct roots.
    TwoRoots(fsp),
}

impl SeparatrixSolution {
    /// Number of roots of the separatrix equation.
    pub fn n_roots(&self) -> usize {
        match self {
            Self::NoRoots => 0,
            Self::OneRoot(_) => 1,
            Self::TwoRoots(_) => 2,
        }
    }

    /// Energy of the selected root, if any.
    pub fn gamma(&self) -> Option<fsp> {
        match *self {
            Self::NoRoots => None,
            Self::OneRoot(gamma) | Self::TwoRoots(gamma) => Some(gamma),
        }
    }
}

/// Which of the two separatrix roots to select.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SeparatrixBranch {
    Positive,
    Negative,
}

/// Evaluates the Hamiltonian of the longitudinal motion.
///
/// # Parameters
///
/// - `gamma`: Lorentz factor of the particle (at least one).
/// - `phi`: Phase relative to the wave [deg].
/// - `bw`: Phase velocity of the wave.
/// - `a`: Normalized wave amplitude.
pub fn hamiltonian(gamma: fsp, phi: fsp, bw: fsp, a: fsp) -> fsp {
    gamma / bw - fsp::sqrt(gamma * gamma - 1.0) - a * fsp::sin(deg_to_rad(phi)) / TWO_PI
}

/// Solves `gamma^2 + 2*b*gamma + c = 0` with discriminant `D = b^2 - c`,
/// selecting the given branch when there are two roots.
pub fn solve_quadratic(b: fsp, c: fsp, branch: SeparatrixBranch) -> SeparatrixSolution {
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        SeparatrixSolution::NoRoots
    } else if discriminant == 0.0 {
        SeparatrixSolution::OneRoot(-b)
    } else {
        let root = fsp::sqrt(discriminant);
        SeparatrixSolution::TwoRoots(match branch {
            SeparatrixBranch::Positive => -b + root,
            SeparatrixBranch::Negative => -b - root,
        })
    }
}

/// Finds the energy on the separatrix with Hamiltonian value `h` at phase `phi` [deg].
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the root structure and the selected root.
/// - `Err`: The phase velocity was not in `(0, 1)` or `(1, inf)`.
pub fn separatrix(
    phi: fsp,
    bw: fsp,
    a: fsp,
    h: fsp,
    branch: SeparatrixBranch,
) -> Result<SeparatrixSolution> {
    if bw == 1.0 || !(bw > 0.0) {
        return Err(Error::Precondition(format!(
            "separatrix requires a phase velocity different from 0 and 1, got {}",
            bw
        )));
    }
    let ah = a * fsp::sin(deg_to_rad(phi)) / TWO_PI + h;
    let b = ah / (bw - 1.0 / bw);
    let c = -(ah * ah + 1.0) / (1.0 - 1.0 / (bw * bw));
    Ok(solve_quadratic(b, c, branch))
}

/// Upper branch of the separatrix.
pub fn positive_separatrix(phi: fsp, bw: fsp, a: fsp, h: fsp) -> Result<SeparatrixSolution> {
    separatrix(phi, bw, a, h, SeparatrixBranch::Positive)
}

/// Lower branch of the separatrix.
pub fn negative_separatrix(phi: fsp, bw: fsp, a: fsp, h: fsp) -> Result<SeparatrixSolution> {
    separatrix(phi, bw, a, h, SeparatrixBranch::Negative)
}

/// Energy extent of the bucket at a phase.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BucketExtent {
    /// Lorentz factor on the lower branch, if it exists.
    pub lower: Option<fsp>,
    /// Lorentz factor on the upper branch, if it exists.
    pub upper: Option<fsp>,
}

impl BucketExtent {
    /// Energy height of the bucket in Lorentz factor, zero if the bucket
    /// does not reach the phase.
    pub fn height(&self) -> fsp {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => upper - lower,
            _ => 0.0,
        }
    }
}

/// Computes both branches of the separatrix at phase `phi` [deg].
pub fn bucket_extent(phi: fsp, bw: fsp, a: fsp, h: fsp) -> Result<BucketExtent> {
    Ok(BucketExtent {
        lower: negative_separatrix(phi, bw, a, h)?.gamma(),
        upper: positive_separatrix(phi, bw, a, h)?.gamma(),
    })
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn luminal_wave_is_rejected() {
        assert!(matches!(
            positive_separatrix(0.0, 1.0, 0.1, 0.0),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(
            negative_separatrix(0.0, -0.5, 0.1, 0.0),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn discriminant_selects_root_count() {
        assert_eq!(
            solve_quadratic(1.0, 2.0, SeparatrixBranch::Positive),
            SeparatrixSolution::NoRoots
        );
        assert_eq!(
            solve_quadratic(2.0, 4.0, SeparatrixBranch::Negative),
            SeparatrixSolution::OneRoot(-2.0)
        );
        assert_eq!(
            solve_quadratic(-3.0, 5.0, SeparatrixBranch::Positive),
            SeparatrixSolution::TwoRoots(5.0)
        );
        assert_eq!(
            solve_quadratic(-3.0, 5.0, SeparatrixBranch::Negative),
            SeparatrixSolution::TwoRoots(1.0)
        );
    }

    #[test]
    fn slow_wave_has_two_ordered_roots() {
        let (bw, a, phi) = (0.8, 0.05, 30.0);
        let h = hamiltonian(1.5, -90.0, bw, a);
        let upper = positive_separatrix(phi, bw, a, h).unwrap();
        let lower = negative_separatrix(phi, bw, a, h).unwrap();
        assert_eq!(upper.n_roots(), 2);
        assert_eq!(lower.n_roots(), 2);
        assert!(upper.gamma().unwrap() > lower.gamma().unwrap());
        assert!(bucket_extent(phi, bw, a, h).unwrap().height() > 0.0);
    }

    #[test]
    fn roots_lie_on_the_hamiltonian_contour() {
        let (bw, a, phi) = (0.8, 0.05, 30.0);
        let h = hamiltonian(1.5, -90.0, bw, a);
        for solution in [
            positive_separatrix(phi, bw, a, h).unwrap(),
            negative_separatrix(phi, bw, a, h).unwrap(),
        ] {
            let gamma = solution.gamma().unwrap();
            if gamma >= 1.0 {
                assert_relative_eq!(hamiltonian(gamma, phi, bw, a), h, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn missing_branches_give_zero_height() {
        let extent = BucketExtent {
            lower: None,
            upper: Some(2.0),
        };
        assert_eq!(extent.height(), 0.0);
        assert_eq!(SeparatrixSolution::NoRoots.gamma(), None);
    }
}
