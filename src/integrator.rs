//! Transient ice volume integrator.
//!
//! Steps the ice volume through a prescribed forcing series. Each step the
//! volume is compared against the equilibrium volume for that step's control
//! parameter: below the lower branch it grows by the growth rate, above the
//! upper branch it shrinks by the decay rate, in between it holds. The
//! direction is selected fresh every step purely from that comparison; the
//! only state carried between steps is the volume itself.

use crate::equilibrium::EquilibriumRelation;
use crate::errors::{ComicsError, ComicsResult};
use crate::rates::RatePolicy;
use crate::timeseries::{ControlParameterSeries, FloatValue, Time, Timeseries, VolumeTrajectory};
use log::{error, trace};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Direction of the volume change selected for a single step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepDirection {
    Growing,
    Decaying,
    Holding,
}

/// Integrates the transient ice volume under a prescribed forcing series.
///
/// Construction fixes the C-Veq relation, the rate policy and the overshoot
/// policy. Each call to [`run`](Self::run) is then an independent, repeatable
/// integration: identical inputs produce identical trajectories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransientVolumeIntegrator {
    relation: Arc<dyn EquilibriumRelation>,
    rates: Arc<dyn RatePolicy>,
    clamp_to_equilibrium: bool,
}

impl TransientVolumeIntegrator {
    /// Create an integrator with overshoot allowed (plain forward-Euler
    /// relaxation).
    pub fn new(relation: Arc<dyn EquilibriumRelation>, rates: Arc<dyn RatePolicy>) -> Self {
        Self {
            relation,
            rates,
            clamp_to_equilibrium: false,
        }
    }

    /// Stop growth and decay steps at the equilibrium branch being
    /// approached instead of overshooting past it within a single step.
    pub fn with_clamping(mut self, clamp_to_equilibrium: bool) -> Self {
        self.clamp_to_equilibrium = clamp_to_equilibrium;
        self
    }

    /// Integrate the full forcing series.
    ///
    /// Returns exactly one trajectory point per forcing point, on the same
    /// time axis. The initial condition is not emitted; it belongs to the
    /// time before the first forcing point.
    pub fn run(
        &self,
        initial_volume: FloatValue,
        series: &ControlParameterSeries,
        time_step: Time,
    ) -> ComicsResult<VolumeTrajectory> {
        let mut times = Vec::with_capacity(series.len());
        let mut volumes = Vec::with_capacity(series.len());
        for step in self.steps(initial_volume, series, time_step)? {
            let (time, volume) = step?;
            times.push(time);
            volumes.push(volume);
        }

        Ok(Timeseries::new(Array1::from(times), Array1::from(volumes)))
    }

    /// Lazy form of [`run`](Self::run), yielding one `(time, volume)` pair
    /// per forcing point.
    ///
    /// Configuration errors are reported here, before the first step.
    /// Evaluation errors surface as `Err` items and end the iteration.
    pub fn steps<'a>(
        &'a self,
        initial_volume: FloatValue,
        series: &'a ControlParameterSeries,
        time_step: Time,
    ) -> ComicsResult<VolumeSteps<'a>> {
        if time_step <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "time_step",
                format!("must be positive, got {time_step}"),
            ));
        }
        if series.is_empty() {
            return Err(ComicsError::InvalidParameter(
                "series",
                "forcing series must contain at least one point".to_string(),
            ));
        }
        self.rates.validate()?;

        Ok(VolumeSteps {
            integrator: self,
            series,
            time_step,
            volume: initial_volume,
            index: 0,
            failed: false,
        })
    }

    /// Advance the volume by one step under the given control parameter.
    fn step(
        &self,
        volume: FloatValue,
        control: FloatValue,
        time_step: Time,
    ) -> ComicsResult<(FloatValue, StepDirection)> {
        let veq_upper = self.relation.upper(control)?;
        let veq_lower = self.relation.lower(control)?;

        if volume > veq_upper {
            let rate = self.rates.decay_rate(control, volume, veq_upper);
            let mut next = volume - rate * time_step;
            if self.clamp_to_equilibrium && next < veq_upper {
                next = veq_upper;
            }
            Ok((next, StepDirection::Decaying))
        } else if volume < veq_lower {
            let rate = self.rates.growth_rate(control, volume, veq_lower);
            let mut next = volume + rate * time_step;
            if self.clamp_to_equilibrium && next > veq_lower {
                next = veq_lower;
            }
            Ok((next, StepDirection::Growing))
        } else {
            Ok((volume, StepDirection::Holding))
        }
    }
}

/// Iterator yielding successive `(time, volume)` trajectory points.
///
/// Fused: after yielding an `Err` item no further points are produced.
pub struct VolumeSteps<'a> {
    integrator: &'a TransientVolumeIntegrator,
    series: &'a ControlParameterSeries,
    time_step: Time,
    volume: FloatValue,
    index: usize,
    failed: bool,
}

impl Iterator for VolumeSteps<'_> {
    type Item = ComicsResult<(Time, FloatValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.series.len() {
            return None;
        }

        let (time, control) = self.series.at(self.index);
        self.index += 1;

        match self.integrator.step(self.volume, control, self.time_step) {
            Ok((volume, direction)) => {
                trace!("t={time} control={control} volume={volume} ({direction:?})");
                self.volume = volume;
                Some(Ok((time, volume)))
            }
            Err(e) => {
                error!("aborting run at step {} (t={time}): {e}", self.index - 1);
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
