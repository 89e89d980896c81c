//! Natural cubic splines in several parameterizations.

use super::{fip, solve_tridiagonal};
use crate::{
    error::{Error, Result},
    kinematics::count_steps,
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Way in which the control points are turned into a smooth profile.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SplineType {
    /// Spline through the points as a function of position.
    Position,
    /// Spline parameterized by arc length along the polyline of points.
    Length,
    /// Derivative of a spline through the cumulative integral of the points.
    Cumulative,
    /// Spline through weighted three-point averages of the points.
    Smoothed,
}

/// Cubic polynomial `a + b*t + c*t^2 + d*t^3` with `t = x - X` on the
/// interval starting at the control point `(X, Y)`.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct SplineCoefficient {
    pub x: fip,
    pub y: fip,
    pub a: fip,
    pub b: fip,
    pub c: fip,
    pub d: fip,
    /// Smoothing weight of the control point.
    pub w: fip,
    /// Smoothed value of the control point.
    pub f: fip,
}

impl SplineCoefficient {
    fn value(&self, x: fip) -> fip {
        let t = x - self.x;
        self.a + t * (self.b + t * (self.c + t * self.d))
    }

    fn derivative(&self, x: fip) -> fip {
        let t = x - self.x;
        self.b + t * (2.0 * self.c + 3.0 * t * self.d)
    }
}

/// Target accuracy of the abscissa when inverting a length spline.
const LENGTH_INVERSION_TOLERANCE: fip = 1e-10;

/// A smooth profile through a set of control points.
///
/// Evaluation outside the control point range returns the value at the
/// nearest end point.
#[derive(Clone, Debug, PartialEq)]
pub struct Spline {
    kind: SplineType,
    coefficients: Vec<SplineCoefficient>,
    /// Spline of the abscissa against arc length, only for `SplineType::Length`.
    abscissa: Vec<SplineCoefficient>,
}

impl Spline {
    /// Fits a spline with unit smoothing weights.
    pub fn new(kind: SplineType, x: &[fip], y: &[fip]) -> Result<Self> {
        let weights = vec![1.0; x.len()];
        Self::with_weights(kind, x, y, &weights)
    }

    /// Fits a spline through the given control points.
    ///
    /// # Parameters
    ///
    /// - `kind`: Parameterization of the spline.
    /// - `x`: Strictly increasing abscissae.
    /// - `y`: Values at the abscissae.
    /// - `weights`: Non-negative smoothing weights, only used by `SplineType::Smoothed`.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the fitted spline.
    /// - `Err`: The control points were empty, of unequal length or not increasing.
    pub fn with_weights(kind: SplineType, x: &[fip], y: &[fip], weights: &[fip]) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() || x.len() != weights.len() {
            return Err(Error::Precondition(format!(
                "spline needs equally many abscissae, values and weights, got {}, {} and {}",
                x.len(),
                y.len(),
                weights.len()
            )));
        }
        if x.windows(2).any(|pair| !(pair[1] > pair[0])) {
            return Err(Error::Precondition(
                "spline abscissae must be strictly increasing".to_string(),
            ));
        }
        if weights.iter().any(|&w| !(w >= 0.0)) {
            return Err(Error::Precondition(
                "spline weights must be non-negative".to_string(),
            ));
        }

        let (coefficients, abscissa) = match kind {
            SplineType::Position => (fit_natural_cubic(x, y), Vec::new()),
            SplineType::Length => {
                let lengths = arc_lengths(x, y);
                (fit_natural_cubic(&lengths, y), fit_natural_cubic(&lengths, x))
            }
            SplineType::Cumulative => {
                let integral = cumulative_integral(x, y);
                (fit_natural_cubic(x, &integral), Vec::new())
            }
            SplineType::Smoothed => {
                let smoothed = smooth(y, weights);
                let mut coefficients = fit_natural_cubic(x, &smoothed);
                coefficients
                    .iter_mut()
                    .zip(y.iter().zip(weights.iter()))
                    .for_each(|(coef, (&original, &w))| {
                        coef.f = coef.y;
                        coef.y = original;
                        coef.w = w;
                    });
                (coefficients, Vec::new())
            }
        };
        Ok(Spline {
            kind,
            coefficients,
            abscissa,
        })
    }

    pub fn kind(&self) -> SplineType {
        self.kind
    }

    pub fn coefficients(&self) -> &[SplineCoefficient] {
        &self.coefficients
    }

    /// Evaluates the profile at `x`.
    pub fn evaluate(&self, x: fip) -> fip {
        match self.kind {
            SplineType::Position | SplineType::Smoothed => {
                evaluate_value(&self.coefficients, x)
            }
            SplineType::Cumulative => {
                let (coef, x) = locate(&self.coefficients, x);
                coef.derivative(x)
            }
            SplineType::Length => {
                let s = self.invert_abscissa(x);
                evaluate_value(&self.coefficients, s)
            }
        }
    }

    /// Evaluates the profile at each of the given positions.
    pub fn evaluate_all(&self, xs: &[fip]) -> Vec<fip> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Finds the arc length at which the abscissa spline reaches `x`, by bisection.
    fn invert_abscissa(&self, x: fip) -> fip {
        let n = self.abscissa.len();
        let first = &self.abscissa[0];
        let last = &self.abscissa[n - 1];
        if n == 1 || x <= first.y {
            return first.x;
        }
        if x >= last.y {
            return last.x;
        }
        let idx = self
            .abscissa
            .partition_point(|coef| coef.y <= x)
            .saturating_sub(1);
        let (mut lower, mut upper) = (self.abscissa[idx].x, self.abscissa[idx + 1].x);
        let coef = &self.abscissa[idx];
        for _ in 0..count_steps(upper - lower, LENGTH_INVERSION_TOLERANCE) {
            let middle = 0.5 * (lower + upper);
            if coef.value(middle) < x {
                lower = middle;
            } else {
                upper = middle;
            }
        }
        0.5 * (lower + upper)
    }
}

/// Finds the interval containing `x`, clamping `x` to the control point range.
fn locate(coefficients: &[SplineCoefficient], x: fip) -> (&SplineCoefficient, fip) {
    let n = coefficients.len();
    let x = x.clamp(coefficients[0].x, coefficients[n - 1].x);
    let idx = coefficients
        .partition_point(|coef| coef.x <= x)
        .saturating_sub(1);
    (&coefficients[usize::min(idx, n - 1)], x)
}

fn evaluate_value(coefficients: &[SplineCoefficient], x: fip) -> fip {
    let (coef, x) = locate(coefficients, x);
    coef.value(x)
}

/// Fits a natural cubic spline (zero curvature at both ends).
///
/// The returned coefficients have one entry per control point, the last of
/// which continues the final interval's slope.
fn fit_natural_cubic(x: &[fip], y: &[fip]) -> Vec<SplineCoefficient> {
    let n = x.len();
    let mut curvature = vec![0.0; n];
    if n > 2 {
        let m = n - 2;
        let mut sub = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut sup = vec![0.0; m];
        let mut rhs = vec![0.0; m];
        for j in 0..m {
            let i = j + 1;
            let h_lower = x[i] - x[i - 1];
            let h_upper = x[i + 1] - x[i];
            sub[j] = h_lower;
            diag[j] = 2.0 * (h_lower + h_upper);
            sup[j] = h_upper;
            rhs[j] = 6.0 * ((y[i + 1] - y[i]) / h_upper - (y[i] - y[i - 1]) / h_lower);
        }
        let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs);
        curvature[1..n - 1].copy_from_slice(&interior);
    }

    let mut coefficients: Vec<SplineCoefficient> = (0..n)
        .map(|i| SplineCoefficient {
            x: x[i],
            y: y[i],
            a: y[i],
            w: 1.0,
            f: y[i],
            ..SplineCoefficient::default()
        })
        .collect();
    for i in 0..n.saturating_sub(1) {
        let h = x[i + 1] - x[i];
        coefficients[i].b =
            (y[i + 1] - y[i]) / h - h * (2.0 * curvature[i] + curvature[i + 1]) / 6.0;
        coefficients[i].c = 0.5 * curvature[i];
        coefficients[i].d = (curvature[i + 1] - curvature[i]) / (6.0 * h);
    }
    if n > 1 {
        let previous = coefficients[n - 2];
        coefficients[n - 1].b = previous.derivative(x[n - 1]);
    }
    coefficients
}

/// Cumulative length of the polyline through the points.
fn arc_lengths(x: &[fip], y: &[fip]) -> Vec<fip> {
    let mut length = 0.0;
    let mut lengths = Vec::with_capacity(x.len());
    lengths.push(0.0);
    for i in 1..x.len() {
        length += fip::hypot(x[i] - x[i - 1], y[i] - y[i - 1]);
        lengths.push(length);
    }
    lengths
}

/// Trapezoidal cumulative integral of the points, starting at zero.
fn cumulative_integral(x: &[fip], y: &[fip]) -> Vec<fip> {
    let mut integral = 0.0;
    let mut values = Vec::with_capacity(x.len());
    values.push(0.0);
    for i in 1..x.len() {
        integral += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
        values.push(integral);
    }
    values
}

/// Weighted three-point average of interior points, end points kept.
fn smooth(y: &[fip], weights: &[fip]) -> Vec<fip> {
    let n = y.len();
    (0..n)
        .map(|i| {
            if i == 0 || i == n - 1 {
                return y[i];
            }
            let total = weights[i - 1] + 2.0 * weights[i] + weights[i + 1];
            if total > 0.0 {
                (weights[i - 1] * y[i - 1] + 2.0 * weights[i] * y[i] + weights[i + 1] * y[i + 1])
                    / total
            } else {
                y[i]
            }
        })
        .collect()
}
