//! Prescribed evolution of the control parameter.
//!
//! Generators are pure functions of time, sampled onto a uniform time axis to
//! produce the forcing series consumed by the integrator. The bundled
//! generators span the unit interval; wrappers rescale, compress or invert
//! them for sensitivity runs.

use crate::timeseries::{ControlParameterSeries, FloatValue, Time, Timeseries};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Debug;
use std::sync::Arc;

/// A synthetic control parameter evolution.
#[typetag::serde(tag = "type")]
pub trait ForcingGenerator: Debug + Send + Sync {
    /// Control parameter value at time `t`.
    fn value_at(&self, t: Time) -> FloatValue;
}

/// Sample a generator onto `n_steps` uniform steps of length `time_step`.
///
/// The first sample sits one step after `t0`; `t0` itself belongs to the
/// initial condition, which is not part of the forcing series.
pub fn sample(
    generator: &dyn ForcingGenerator,
    n_steps: usize,
    t0: Time,
    time_step: Time,
) -> ControlParameterSeries {
    let times = Array1::from_iter((1..=n_steps).map(|i| t0 + i as Time * time_step));
    let values = times.mapv(|t| generator.value_at(t));
    Timeseries::new(times, values)
}

/// Triangular wave running 1 -> 0 -> 1 over one period, repeating for the
/// whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleForcing {
    /// Length of one full forcing cycle, in time units.
    pub period: Time,
}

impl TriangleForcing {
    pub fn new(period: Time) -> Self {
        Self { period }
    }
}

#[typetag::serde]
impl ForcingGenerator for TriangleForcing {
    fn value_at(&self, t: Time) -> FloatValue {
        let phase = t.rem_euclid(self.period);
        let half = self.period / 2.0;
        if phase < half {
            1.0 - phase / half
        } else {
            (phase - half) / half
        }
    }
}

/// A single sinusoidal forcing component, rescaled to `[0, amplitude]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SineComponent {
    pub period: Time,
    pub amplitude: FloatValue,
}

impl SineComponent {
    fn value_at(&self, t: Time) -> FloatValue {
        ((t * 2.0 * PI / self.period).sin() + 1.0) / 2.0 * self.amplitude
    }
}

/// Sum of sinusoidal components mimicking orbital forcing cycles
/// (precession, obliquity, eccentricity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitalForcing {
    pub components: Vec<SineComponent>,
}

impl OrbitalForcing {
    pub fn new(components: Vec<SineComponent>) -> Self {
        Self { components }
    }

    /// Obliquity-dominated forcing: a single 41 kyr cycle (410 steps of
    /// 100 yr) of amplitude 0.5.
    pub fn obliquity() -> Self {
        Self::new(vec![SineComponent {
            period: 410.0,
            amplitude: 0.5,
        }])
    }
}

#[typetag::serde]
impl ForcingGenerator for OrbitalForcing {
    fn value_at(&self, t: Time) -> FloatValue {
        self.components.iter().map(|c| c.value_at(t)).sum()
    }
}

/// Rescales another generator's amplitude around a chosen centre.
///
/// Assumes the inner generator spans the unit interval: the output spans
/// `center ± factor / 2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaledAmplitude {
    inner: Arc<dyn ForcingGenerator>,
    pub factor: FloatValue,
    pub center: FloatValue,
}

impl ScaledAmplitude {
    pub fn new(inner: Arc<dyn ForcingGenerator>, factor: FloatValue, center: FloatValue) -> Self {
        Self {
            inner,
            factor,
            center,
        }
    }
}

#[typetag::serde]
impl ForcingGenerator for ScaledAmplitude {
    fn value_at(&self, t: Time) -> FloatValue {
        self.factor * self.inner.value_at(t) + (self.center - self.factor / 2.0)
    }
}

/// Compresses another generator's period, increasing the forcing frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedPeriod {
    inner: Arc<dyn ForcingGenerator>,
    pub factor: FloatValue,
}

impl CompressedPeriod {
    pub fn new(inner: Arc<dyn ForcingGenerator>, factor: FloatValue) -> Self {
        Self { inner, factor }
    }
}

#[typetag::serde]
impl ForcingGenerator for CompressedPeriod {
    fn value_at(&self, t: Time) -> FloatValue {
        self.inner.value_at(self.factor * t)
    }
}

/// Mirrors another generator around the centre of the unit interval,
/// turning a warm-start cycle into a cold-start one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inverted {
    inner: Arc<dyn ForcingGenerator>,
}

impl Inverted {
    pub fn new(inner: Arc<dyn ForcingGenerator>) -> Self {
        Self { inner }
    }
}

#[typetag::serde]
impl ForcingGenerator for Inverted {
    fn value_at(&self, t: Time) -> FloatValue {
        1.0 - self.inner.value_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_descends_then_ascends() {
        let forcing = TriangleForcing::new(400.0);
        assert_relative_eq!(forcing.value_at(0.0), 1.0);
        assert_relative_eq!(forcing.value_at(100.0), 0.5);
        assert_relative_eq!(forcing.value_at(200.0), 0.0);
        assert_relative_eq!(forcing.value_at(300.0), 0.5);
        // Periodic continuation
        assert_relative_eq!(forcing.value_at(400.0), 1.0);
        assert_relative_eq!(forcing.value_at(500.0), 0.5);
    }

    #[test]
    fn test_orbital_forcing_stays_within_amplitude() {
        let forcing = OrbitalForcing::obliquity();
        for i in 0..1000 {
            let value = forcing.value_at(i as Time);
            assert!((0.0..=0.5).contains(&value));
        }
        // Quarter period hits the sine maximum
        assert_relative_eq!(forcing.value_at(410.0 / 4.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_amplitude_recentres_the_cycle() {
        let inner = Arc::new(TriangleForcing::new(400.0));
        let forcing = ScaledAmplitude::new(inner, 0.5, 0.5);
        // Inner spans [0, 1] so the output spans [0.25, 0.75]
        assert_relative_eq!(forcing.value_at(0.0), 0.75, epsilon = 1e-12);
        assert_relative_eq!(forcing.value_at(200.0), 0.25, epsilon = 1e-12);
        assert_relative_eq!(forcing.value_at(100.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_compressed_period_doubles_frequency() {
        let inner = Arc::new(TriangleForcing::new(400.0));
        let forcing = CompressedPeriod::new(inner.clone(), 2.0);
        assert_relative_eq!(forcing.value_at(100.0), inner.value_at(200.0));
        assert_relative_eq!(forcing.value_at(200.0), inner.value_at(0.0));
    }

    #[test]
    fn test_inverted_mirrors_the_cycle() {
        let inner = Arc::new(TriangleForcing::new(400.0));
        let forcing = Inverted::new(inner);
        assert_relative_eq!(forcing.value_at(0.0), 0.0);
        assert_relative_eq!(forcing.value_at(200.0), 1.0);
    }

    #[test]
    fn test_sample_starts_one_step_after_t0() {
        let forcing = TriangleForcing::new(400.0);
        let series = sample(&forcing, 3, 0.0, 100.0);
        assert_eq!(series.len(), 3);
        assert_eq!(series.times(), &ndarray::array![100.0, 200.0, 300.0]);
        assert_relative_eq!(series.values()[0], 0.5);
        assert_relative_eq!(series.values()[1], 0.0);
    }

    #[test]
    fn test_generator_round_trips_through_serde() {
        let forcing: Box<dyn ForcingGenerator> = Box::new(ScaledAmplitude::new(
            Arc::new(TriangleForcing::new(400.0)),
            0.5,
            0.5,
        ));
        let restored: Box<dyn ForcingGenerator> =
            serde_json::from_str(&serde_json::to_string(&forcing).unwrap()).unwrap();
        assert_relative_eq!(restored.value_at(123.0), forcing.value_at(123.0));
    }
}
