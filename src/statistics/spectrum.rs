//! Energy and phase spectra of the beam.

use super::{circular_mean, fsa};
use crate::{
    beam::{particle::Particle, Beam},
    kinematics::{rad_to_deg, wrap_phase},
};
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Quantity binned by a spectrum.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SpectrumKind {
    /// Kinetic energy [MeV].
    Energy,
    /// Phase deviation from the circular mean [deg].
    Phase,
}

/// One bar of a spectrum.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SpectrumBar {
    /// Center of the bar in units of the binned quantity.
    pub center: fsa,
    /// Number of particles in the bar.
    pub count: usize,
    /// Count relative to the highest bar.
    pub envelope: fsa,
    /// Fraction of the alive particles in the bar.
    pub fraction: fsa,
    /// Mean horizontal offset [m].
    pub x_mean: fsa,
    /// RMS horizontal offset around the mean [m].
    pub x_rms: fsa,
    /// Mean vertical offset [m].
    pub y_mean: fsa,
    /// RMS vertical offset around the mean [m].
    pub y_rms: fsa,
}

#[derive(Default)]
struct BarAccumulator {
    count: usize,
    sum_x: fsa,
    sum_xx: fsa,
    sum_y: fsa,
    sum_yy: fsa,
}

impl BarAccumulator {
    fn add(&mut self, particle: &Particle, wavelength: fsa) {
        let radius = particle.radius(wavelength);
        let (sin, cos) = particle.th.sin_cos();
        let (x, y) = (radius * cos, radius * sin);
        self.count += 1;
        self.sum_x += x;
        self.sum_xx += x * x;
        self.sum_y += y;
        self.sum_yy += y * y;
    }

    fn into_bar(self, center: fsa, max_count: usize, n_alive: usize) -> SpectrumBar {
        let moments = |sum: fsa, sum_sqr: fsa| {
            if self.count == 0 {
                (0.0, 0.0)
            } else {
                let n = self.count as fsa;
                let mean = sum / n;
                (mean, fsa::sqrt(fsa::max(sum_sqr / n - mean * mean, 0.0)))
            }
        };
        let (x_mean, x_rms) = moments(self.sum_x, self.sum_xx);
        let (y_mean, y_rms) = moments(self.sum_y, self.sum_yy);
        SpectrumBar {
            center,
            count: self.count,
            envelope: self.count as fsa / max_count as fsa,
            fraction: self.count as fsa / n_alive as fsa,
            x_mean,
            x_rms,
            y_mean,
            y_rms,
        }
    }
}

/// Histograms the alive particles of the beam.
///
/// # Parameters
///
/// - `beam`: The ensemble.
/// - `kind`: Quantity to bin.
/// - `n_bars`: Number of bars (must be larger than zero).
/// - `wavelength`: RF wavelength [m] for the transverse moments.
///
/// # Returns
///
/// `n_bars` equally wide bars spanning the range of the quantity, a single
/// bar if all particles share the same value, or nothing if no particle
/// is alive.
pub fn compute_spectrum(
    beam: &Beam,
    kind: SpectrumKind,
    n_bars: usize,
    wavelength: fsa,
) -> Vec<SpectrumBar> {
    assert!(n_bars > 0, "Number of spectrum bars must be larger than zero.");
    let alive: Vec<&Particle> = beam.alive().collect();
    if alive.is_empty() {
        return Vec::new();
    }
    let values: Array1<fsa> = match kind {
        SpectrumKind::Energy => alive.iter().map(|p| p.energy()).collect(),
        SpectrumKind::Phase => {
            let mean_phase = circular_mean(alive.iter().map(|p| p.phi));
            alive
                .iter()
                .map(|p| rad_to_deg(wrap_phase(p.phi - mean_phase)))
                .collect()
        }
    };
    let lower = *values.min_skipnan();
    let upper = *values.max_skipnan();
    let n_alive = alive.len();

    if !(upper > lower) {
        let mut accumulator = BarAccumulator::default();
        for particle in &alive {
            accumulator.add(particle, wavelength);
        }
        return vec![accumulator.into_bar(lower, n_alive, n_alive)];
    }

    let width = (upper - lower) / n_bars as fsa;
    let mut accumulators: Vec<BarAccumulator> =
        (0..n_bars).map(|_| BarAccumulator::default()).collect();
    for (particle, &value) in alive.iter().zip(values.iter()) {
        if value.is_finite() {
            let idx = usize::min(((value - lower) / width) as usize, n_bars - 1);
            accumulators[idx].add(particle, wavelength);
        }
    }
    let max_count = accumulators.iter().map(|a| a.count).max().unwrap_or(0).max(1);
    accumulators
        .into_iter()
        .enumerate()
        .map(|(idx, accumulator)| {
            let center = lower + (idx as fsa + 0.5) * width;
            accumulator.into_bar(center, max_count, n_alive)
        })
        .collect()
}
