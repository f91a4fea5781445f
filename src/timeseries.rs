//! Ordered (time, value) sequences shared by forcing inputs and volume outputs.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Type of time values
pub type Time = f64;
/// Type of scalar model values
pub type FloatValue = f64;

/// Prescribed control parameter values over time (model input).
pub type ControlParameterSeries = Timeseries;
/// Simulated ice volume over time (model output).
pub type VolumeTrajectory = Timeseries;

/// An ordered series of scalar values on a strictly increasing time axis.
///
/// The same container carries the prescribed control parameter forcing on the
/// way into the integrator and the ice volume trajectory on the way out.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    times: Array1<Time>,
    values: Array1<FloatValue>,
}

impl Timeseries {
    /// Create a new timeseries from matching time and value arrays.
    ///
    /// # Panics
    /// Panics if the arrays differ in length or the time axis is not
    /// strictly increasing.
    pub fn new(times: Array1<Time>, values: Array1<FloatValue>) -> Self {
        assert_eq!(
            times.len(),
            values.len(),
            "times and values must have the same length"
        );
        let increasing = times.iter().zip(times.iter().skip(1)).all(|(a, b)| a < b);
        assert!(increasing, "time axis must be strictly increasing");

        Self { times, values }
    }

    /// Create a timeseries on a uniform time axis starting at `t0` with
    /// spacing `time_step`.
    pub fn from_values(values: Array1<FloatValue>, t0: Time, time_step: Time) -> Self {
        let times = Array1::from_iter((0..values.len()).map(|i| t0 + i as Time * time_step));
        Self::new(times, values)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &Array1<Time> {
        &self.times
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    /// The (time, value) pair at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn at(&self, index: usize) -> (Time, FloatValue) {
        (self.times[index], self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, FloatValue)> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn last(&self) -> Option<(Time, FloatValue)> {
        if self.is_empty() {
            None
        } else {
            Some(self.at(self.len() - 1))
        }
    }
}
