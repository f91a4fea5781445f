//! Ready-made simulation scenarios.
//!
//! A scenario bundles a forcing generator, a C-Veq relation, a rate policy
//! and an initial state, and runs the integrator over a fixed number of
//! steps. The output carries the sampled control parameter and both
//! equilibrium branches alongside the ice volume, so downstream consumers can
//! plot or store them together without re-evaluating the relation.

use crate::equilibrium::EquilibriumRelation;
use crate::errors::{ComicsError, ComicsResult};
use crate::forcing::{sample, CompressedPeriod, ForcingGenerator, Inverted, ScaledAmplitude};
use crate::integrator::TransientVolumeIntegrator;
use crate::rates::{RatePolicy, ScaledRates};
use crate::timeseries::{
    ControlParameterSeries, FloatValue, Time, Timeseries, VolumeTrajectory,
};
use log::info;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Initial ice sheet state for a run.
///
/// The warm and cold volumes follow the transient PISM states the
/// [`PismRates`](crate::rates::PismRates) profile was tuned against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StartOption {
    /// Near ice-free interglacial start.
    /// unit: m sea-level equivalent
    Warm,
    /// Full glacial start, with the forcing cycle inverted so the run begins
    /// at the cold end of the control range.
    /// unit: m sea-level equivalent
    Cold,
    /// Explicit initial volume.
    Custom(FloatValue),
}

impl StartOption {
    pub fn initial_volume(&self) -> FloatValue {
        match self {
            StartOption::Warm => 1.3,
            StartOption::Cold => 23.0,
            StartOption::Custom(volume) => *volume,
        }
    }

    fn is_cold(&self) -> bool {
        matches!(self, StartOption::Cold)
    }
}

/// How a comparison run's forcing differs from the primary run's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForcingVariant {
    /// Identical forcing.
    Same,
    /// Amplitude rescaled by `factor` around `center`.
    AmplitudeReduced {
        factor: FloatValue,
        center: FloatValue,
    },
    /// Period divided by `factor`, increasing the forcing frequency.
    PeriodReduced { factor: FloatValue },
}

/// Configuration of a paired sensitivity run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    pub variant: ForcingVariant,
    pub start: StartOption,
    /// Multiplier applied to the growth rate.
    pub growth_factor: FloatValue,
    /// Multiplier applied to the decay rate.
    pub decay_factor: FloatValue,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            variant: ForcingVariant::Same,
            start: StartOption::Custom(0.0),
            growth_factor: 1.0,
            decay_factor: 1.0,
        }
    }
}

/// Output of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Sampled control parameter forcing.
    pub control: ControlParameterSeries,
    /// Upper equilibrium branch along the run.
    pub equilibrium_upper: Timeseries,
    /// Lower equilibrium branch along the run.
    pub equilibrium_lower: Timeseries,
    /// Simulated transient ice volume.
    pub ice_volume: VolumeTrajectory,
}

/// Builds a [`Scenario`] from its parts.
///
/// `build` fails with [`InvalidParameter`](ComicsError::InvalidParameter) if
/// a required part is missing or a numeric setting is out of range.
pub struct ScenarioBuilder {
    forcing: Option<Arc<dyn ForcingGenerator>>,
    relation: Option<Arc<dyn EquilibriumRelation>>,
    rates: Option<Arc<dyn RatePolicy>>,
    n_steps: usize,
    time_step: Time,
    start: StartOption,
    clamp_to_equilibrium: bool,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            forcing: None,
            relation: None,
            rates: None,
            n_steps: 2000,
            time_step: 1.0,
            start: StartOption::Custom(0.0),
            clamp_to_equilibrium: false,
        }
    }

    pub fn with_forcing(mut self, forcing: Arc<dyn ForcingGenerator>) -> Self {
        self.forcing = Some(forcing);
        self
    }

    pub fn with_relation(mut self, relation: Arc<dyn EquilibriumRelation>) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn with_rates(mut self, rates: Arc<dyn RatePolicy>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn with_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    pub fn with_time_step(mut self, time_step: Time) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_start(mut self, start: StartOption) -> Self {
        self.start = start;
        self
    }

    pub fn with_clamping(mut self, clamp_to_equilibrium: bool) -> Self {
        self.clamp_to_equilibrium = clamp_to_equilibrium;
        self
    }

    pub fn build(self) -> ComicsResult<Scenario> {
        let forcing = self.forcing.ok_or_else(|| {
            ComicsError::InvalidParameter("forcing", "no forcing generator supplied".to_string())
        })?;
        let relation = self.relation.ok_or_else(|| {
            ComicsError::InvalidParameter("relation", "no equilibrium relation supplied".to_string())
        })?;
        let rates = self.rates.ok_or_else(|| {
            ComicsError::InvalidParameter("rates", "no rate policy supplied".to_string())
        })?;
        if self.n_steps == 0 {
            return Err(ComicsError::InvalidParameter(
                "n_steps",
                "must be at least one".to_string(),
            ));
        }
        if self.time_step <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "time_step",
                format!("must be positive, got {}", self.time_step),
            ));
        }

        Ok(Scenario {
            forcing,
            relation,
            rates,
            n_steps: self.n_steps,
            time_step: self.time_step,
            start: self.start,
            clamp_to_equilibrium: self.clamp_to_equilibrium,
        })
    }
}

/// A fully configured simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    forcing: Arc<dyn ForcingGenerator>,
    relation: Arc<dyn EquilibriumRelation>,
    rates: Arc<dyn RatePolicy>,
    n_steps: usize,
    time_step: Time,
    start: StartOption,
    clamp_to_equilibrium: bool,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::new()
    }

    /// Run the scenario with its configured forcing and start state.
    pub fn run(&self) -> ComicsResult<RunOutput> {
        self.run_with(
            self.forcing_for(self.start, None),
            Arc::clone(&self.rates),
            self.start,
        )
    }

    /// Run the scenario twice, the second time with modified forcing, start
    /// state or rates, and return both outputs for comparison.
    pub fn run_comparison(
        &self,
        config: &ComparisonConfig,
    ) -> ComicsResult<(RunOutput, RunOutput)> {
        let first = self.run()?;

        let forcing = self.forcing_for(config.start, Some(config.variant));
        let rates: Arc<dyn RatePolicy> =
            if config.growth_factor == 1.0 && config.decay_factor == 1.0 {
                Arc::clone(&self.rates)
            } else {
                Arc::new(ScaledRates::new(
                    Arc::clone(&self.rates),
                    config.growth_factor,
                    config.decay_factor,
                ))
            };
        let second = self.run_with(forcing, rates, config.start)?;

        Ok((first, second))
    }

    /// Apply a forcing variant and the start-dependent inversion to the
    /// configured base generator.
    fn forcing_for(
        &self,
        start: StartOption,
        variant: Option<ForcingVariant>,
    ) -> Arc<dyn ForcingGenerator> {
        let mut forcing = Arc::clone(&self.forcing);
        match variant {
            None | Some(ForcingVariant::Same) => {}
            Some(ForcingVariant::AmplitudeReduced { factor, center }) => {
                forcing = Arc::new(ScaledAmplitude::new(forcing, factor, center));
            }
            Some(ForcingVariant::PeriodReduced { factor }) => {
                forcing = Arc::new(CompressedPeriod::new(forcing, factor));
            }
        }
        if start.is_cold() {
            forcing = Arc::new(Inverted::new(forcing));
        }
        forcing
    }

    fn run_with(
        &self,
        forcing: Arc<dyn ForcingGenerator>,
        rates: Arc<dyn RatePolicy>,
        start: StartOption,
    ) -> ComicsResult<RunOutput> {
        info!(
            "running scenario: {} steps of {} starting from volume {}",
            self.n_steps,
            self.time_step,
            start.initial_volume()
        );
        let control = sample(forcing.as_ref(), self.n_steps, 0.0, self.time_step);

        let integrator = TransientVolumeIntegrator::new(Arc::clone(&self.relation), rates)
            .with_clamping(self.clamp_to_equilibrium);
        let ice_volume = integrator.run(start.initial_volume(), &control, self.time_step)?;

        let mut upper = Vec::with_capacity(control.len());
        let mut lower = Vec::with_capacity(control.len());
        for (_, c) in control.iter() {
            upper.push(self.relation.upper(c)?);
            lower.push(self.relation.lower(c)?);
        }

        Ok(RunOutput {
            equilibrium_upper: Timeseries::new(control.times().clone(), Array1::from(upper)),
            equilibrium_lower: Timeseries::new(control.times().clone(), Array1::from(lower)),
            control,
            ice_volume,
        })
    }
}
