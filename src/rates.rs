//! Growth and decay rate policies.
//!
//! When the ice volume sits below the lower equilibrium branch it grows by
//! the growth rate, and above the upper branch it shrinks by the decay rate.
//! The rates may be constant or depend on how far the volume is from the
//! equilibrium branch it is relaxing toward.

use crate::errors::{ComicsError, ComicsResult};
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Rate of volume change applied during a step, in volume units per unit time.
///
/// `equilibrium` is the branch the volume is relaxing toward: the lower
/// branch for growth, the upper branch for decay.
#[typetag::serde(tag = "type")]
pub trait RatePolicy: Debug + Send + Sync {
    /// Growth rate applied while the volume sits below the lower branch.
    fn growth_rate(
        &self,
        control: FloatValue,
        volume: FloatValue,
        equilibrium: FloatValue,
    ) -> FloatValue;

    /// Decay rate applied while the volume sits above the upper branch.
    fn decay_rate(
        &self,
        control: FloatValue,
        volume: FloatValue,
        equilibrium: FloatValue,
    ) -> FloatValue;

    /// Check the policy configuration before a run starts.
    fn validate(&self) -> ComicsResult<()> {
        Ok(())
    }
}

/// Fixed growth and decay rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantRates {
    /// unit: volume / time
    pub growth_rate: FloatValue,
    /// unit: volume / time
    pub decay_rate: FloatValue,
}

impl ConstantRates {
    pub fn new(growth_rate: FloatValue, decay_rate: FloatValue) -> Self {
        Self {
            growth_rate,
            decay_rate,
        }
    }
}

#[typetag::serde]
impl RatePolicy for ConstantRates {
    fn growth_rate(
        &self,
        _control: FloatValue,
        _volume: FloatValue,
        _equilibrium: FloatValue,
    ) -> FloatValue {
        self.growth_rate
    }

    fn decay_rate(
        &self,
        _control: FloatValue,
        _volume: FloatValue,
        _equilibrium: FloatValue,
    ) -> FloatValue {
        self.decay_rate
    }

    fn validate(&self) -> ComicsResult<()> {
        if self.growth_rate <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "growth_rate",
                format!("must be positive, got {}", self.growth_rate),
            ));
        }
        if self.decay_rate <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "decay_rate",
                format!("must be positive, got {}", self.decay_rate),
            ));
        }
        Ok(())
    }
}

/// Distance-dependent rates tuned against transient PISM simulations.
///
/// Growth accelerates once the volume falls more than `growth_threshold`
/// below the lower equilibrium branch; decay accelerates linearly with the
/// excess above the upper branch.
///
/// unit: m sea-level equivalent per 100 yr step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PismRates {
    pub base_growth: FloatValue,
    pub growth_gain: FloatValue,
    /// Deficit below equilibrium before the accelerated growth term kicks in.
    pub growth_threshold: FloatValue,
    pub base_decay: FloatValue,
    pub decay_gain: FloatValue,
}

impl Default for PismRates {
    fn default() -> Self {
        Self {
            base_growth: 0.004,
            growth_gain: 0.012,
            growth_threshold: 9.0,
            base_decay: 0.01,
            decay_gain: 0.01,
        }
    }
}

#[typetag::serde]
impl RatePolicy for PismRates {
    fn growth_rate(
        &self,
        _control: FloatValue,
        volume: FloatValue,
        equilibrium: FloatValue,
    ) -> FloatValue {
        let deficit = (equilibrium - volume - self.growth_threshold).max(0.0);
        self.base_growth + self.growth_gain * deficit.sqrt()
    }

    fn decay_rate(
        &self,
        _control: FloatValue,
        volume: FloatValue,
        equilibrium: FloatValue,
    ) -> FloatValue {
        self.base_decay + (volume - equilibrium) * self.decay_gain
    }

    fn validate(&self) -> ComicsResult<()> {
        if self.base_growth <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "base_growth",
                format!("must be positive, got {}", self.base_growth),
            ));
        }
        if self.base_decay <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "base_decay",
                format!("must be positive, got {}", self.base_decay),
            ));
        }
        Ok(())
    }
}

/// Wraps another policy and scales its rates, for sensitivity runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaledRates {
    inner: Arc<dyn RatePolicy>,
    pub growth_factor: FloatValue,
    pub decay_factor: FloatValue,
}

impl ScaledRates {
    pub fn new(
        inner: Arc<dyn RatePolicy>,
        growth_factor: FloatValue,
        decay_factor: FloatValue,
    ) -> Self {
        Self {
            inner,
            growth_factor,
            decay_factor,
        }
    }
}

#[typetag::serde]
impl RatePolicy for ScaledRates {
    fn growth_rate(
        &self,
        control: FloatValue,
        volume: FloatValue,
        equilibrium: FloatValue,
    ) -> FloatValue {
        self.growth_factor * self.inner.growth_rate(control, volume, equilibrium)
    }

    fn decay_rate(
        &self,
        control: FloatValue,
        volume: FloatValue,
        equilibrium: FloatValue,
    ) -> FloatValue {
        self.decay_factor * self.inner.decay_rate(control, volume, equilibrium)
    }

    fn validate(&self) -> ComicsResult<()> {
        if self.growth_factor <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "growth_factor",
                format!("must be positive, got {}", self.growth_factor),
            ));
        }
        if self.decay_factor <= 0.0 {
            return Err(ComicsError::InvalidParameter(
                "decay_factor",
                format!("must be positive, got {}", self.decay_factor),
            ));
        }
        self.inner.validate()
    }
}
