//! Truncated power series for the modified Bessel functions `I0` and `I1`.

use super::ffd;

/// Highest order `k` kept in the series.
pub const NUM_BESSEL_TERMS: usize = 6;

/// Modified Bessel function of the first kind of order zero,
/// `sum_{k=0..6} (x/2)^(2k) / (k!)^2`.
pub fn ib0(x: ffd) -> ffd {
    let half_sq = 0.25 * x * x;
    let mut term = 1.0;
    let mut sum = term;
    for k in 1..=NUM_BESSEL_TERMS {
        let k = k as ffd;
        term *= half_sq / (k * k);
        sum += term;
    }
    sum
}

/// Modified Bessel function of the first kind of order one,
/// `sum_{k=0..6} (x/2)^(2k+1) / (k! (k+1)!)`.
pub fn ib1(x: ffd) -> ffd {
    let half_sq = 0.25 * x * x;
    let mut term = 0.5 * x;
    let mut sum = term;
    for k in 1..=NUM_BESSEL_TERMS {
        let k = k as ffd;
        term *= half_sq / (k * (k + 1.0));
        sum += term;
    }
    sum
}
