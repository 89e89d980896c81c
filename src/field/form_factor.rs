//! Longitudinal form factor of a uniformly charged ellipsoid.

use super::ffd;

/// Number of intervals in each form factor table.
const TABLE_INTERVALS: usize = 20;

/// Form factor for aspect ratios `p = 0, 0.05, ..., 1`.
static OBLATE_TABLE: [ffd; TABLE_INTERVALS + 1] = [
    1.000, 0.926, 0.861, 0.803, 0.750, 0.704, 0.661, 0.623, 0.588, 0.556, 0.527, 0.500, 0.476,
    0.453, 0.432, 0.413, 0.394, 0.378, 0.362, 0.347, 0.333,
];

/// Form factor for inverse aspect ratios `1/p = 0, 0.05, ..., 1`.
static PROLATE_TABLE: [ffd; TABLE_INTERVALS + 1] = [
    0.000, 0.007, 0.020, 0.037, 0.056, 0.075, 0.095, 0.115, 0.135, 0.155, 0.174, 0.192, 0.210,
    0.227, 0.244, 0.260, 0.276, 0.291, 0.306, 0.320, 0.333,
];

/// Form factor of a sphere.
pub const SPHERE_FORM_FACTOR: ffd = 0.333;

/// Computes the form factor `M(p)` for the ratio `p` of the bunch half-length
/// to its radius (in the bunch rest frame).
///
/// The result is linearly interpolated between table entries and is
/// non-increasing in `p`, with `M(0) = 1`, `M(1) = 0.333` and `M -> 0` as
/// `p -> inf`. Non-positive ratios give 1 and a NaN ratio gives the sphere
/// value.
pub fn form_factor(p: ffd) -> ffd {
    if p.is_nan() {
        SPHERE_FORM_FACTOR
    } else if p <= 0.0 {
        OBLATE_TABLE[0]
    } else if p < 1.0 {
        interpolate_table(&OBLATE_TABLE, p)
    } else if p == 1.0 {
        SPHERE_FORM_FACTOR
    } else {
        interpolate_table(&PROLATE_TABLE, 1.0 / p)
    }
}

/// Interpolates the given table at `t` in `[0, 1]`, clamping the segment
/// index so that the upper neighbour always exists.
fn interpolate_table(table: &[ffd; TABLE_INTERVALS + 1], t: ffd) -> ffd {
    let scaled = TABLE_INTERVALS as ffd * t;
    let idx = usize::min(scaled.floor().max(0.0) as usize, TABLE_INTERVALS - 1);
    let fraction = scaled - idx as ffd;
    table[idx] + (table[idx + 1] - table[idx]) * fraction
}
