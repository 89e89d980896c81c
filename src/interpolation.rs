//! Interpolation of parameter profiles from control points.

pub mod spline;

/// Floating-point precision to use for interpolation.
#[allow(non_camel_case_types)]
pub type fip = f64;

/// Solves the tridiagonal system `A x = d` with the Thomas algorithm.
///
/// # Parameters
///
/// - `sub`: Sub-diagonal (`sub[0]` is unused).
/// - `diag`: Main diagonal.
/// - `sup`: Super-diagonal (`sup[n-1]` is unused).
/// - `rhs`: Right-hand side.
///
/// # Returns
///
/// The solution vector. The system must be diagonally dominant or otherwise
/// free of zero pivots.
pub fn solve_tridiagonal(sub: &[fip], diag: &[fip], sup: &[fip], rhs: &[fip]) -> Vec<fip> {
    let n = rhs.len();
    assert!(
        sub.len() == n && diag.len() == n && sup.len() == n,
        "All diagonals must have the same length as the right-hand side."
    );
    if n == 0 {
        return Vec::new();
    }

    let mut sup_prime = vec![0.0; n];
    let mut rhs_prime = vec![0.0; n];
    sup_prime[0] = sup[0] / diag[0];
    rhs_prime[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i] * sup_prime[i - 1];
        if i < n - 1 {
            sup_prime[i] = sup[i] / denom;
        }
        rhs_prime[i] = (rhs[i] - sub[i] * rhs_prime[i - 1]) / denom;
    }

    let mut solution = vec![0.0; n];
    solution[n - 1] = rhs_prime[n - 1];
    for i in (0..n - 1).rev() {
        solution[i] = rhs_prime[i] - sup_prime[i] * solution[i + 1];
    }
    solution
}
