//! Control parameter - equilibrium ice volume (C-Veq) relations.
//!
//! Each relation maps the control parameter to the ice volume the sheet would
//! relax toward if the forcing stopped changing. Relations with hysteresis
//! expose distinct upper and lower branches: the ice sheet decays above the
//! upper branch, grows below the lower branch, and holds anywhere in between.

use crate::errors::{ComicsError, ComicsResult};
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A pure mapping from control parameter value to equilibrium ice volume.
///
/// Stateless; supplied once when the integrator is constructed. Implementors
/// are serializable plug-ins so that a full model configuration can be
/// persisted and restored.
#[typetag::serde(tag = "type")]
pub trait EquilibriumRelation: Debug + Send + Sync {
    /// Equilibrium volume on the upper hysteresis branch.
    ///
    /// Ice volume above this value decays.
    fn upper(&self, control: FloatValue) -> ComicsResult<FloatValue>;

    /// Equilibrium volume on the lower hysteresis branch.
    ///
    /// Ice volume below this value grows. Relations without hysteresis keep
    /// the default, which coincides with the upper branch.
    fn lower(&self, control: FloatValue) -> ComicsResult<FloatValue> {
        self.upper(control)
    }
}

/// Linear C-Veq relation without hysteresis: `veq = intercept + slope * control`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRelation {
    pub intercept: FloatValue,
    pub slope: FloatValue,
}

impl LinearRelation {
    pub fn new(intercept: FloatValue, slope: FloatValue) -> Self {
        Self { intercept, slope }
    }

    /// The symmetric `veq = 1 - control` relation used by idealised runs.
    pub fn simple() -> Self {
        Self::new(1.0, -1.0)
    }
}

#[typetag::serde]
impl EquilibriumRelation for LinearRelation {
    fn upper(&self, control: FloatValue) -> ComicsResult<FloatValue> {
        Ok(self.intercept + self.slope * control)
    }
}

/// Piecewise linear curve through a set of (control, volume) breakpoints.
///
/// Defined only on the closed control interval spanned by the breakpoints.
/// Evaluation outside that interval is an [`Evaluation`](ComicsError::Evaluation)
/// error rather than an extrapolation, since an extrapolated equilibrium
/// would silently corrupt the trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecewiseLinear {
    points: Vec<(FloatValue, FloatValue)>,
}

impl PiecewiseLinear {
    /// Create a curve from (control, volume) breakpoints.
    ///
    /// # Panics
    /// Panics if fewer than two points are given or the control coordinates
    /// are not strictly increasing.
    pub fn new(points: Vec<(FloatValue, FloatValue)>) -> Self {
        assert!(
            points.len() >= 2,
            "piecewise curve needs at least two breakpoints"
        );
        assert!(
            points.windows(2).all(|w| w[0].0 < w[1].0),
            "breakpoints must be strictly increasing in control"
        );

        Self { points }
    }

    /// Linearly interpolate the volume at `control`.
    pub fn evaluate(&self, control: FloatValue) -> ComicsResult<FloatValue> {
        let (c_min, _) = self.points[0];
        let (c_max, _) = self.points[self.points.len() - 1];
        if control < c_min || control > c_max {
            return Err(ComicsError::Evaluation(
                control,
                format!("outside the defined range [{c_min}, {c_max}]"),
            ));
        }

        for w in self.points.windows(2) {
            if control <= w[1].0 {
                let (c0, v0) = w[0];
                let (c1, v1) = w[1];
                return Ok(v0 + (v1 - v0) * (control - c0) / (c1 - c0));
            }
        }

        Err(ComicsError::Evaluation(
            control,
            "no covering segment".to_string(),
        ))
    }
}

#[typetag::serde]
impl EquilibriumRelation for PiecewiseLinear {
    fn upper(&self, control: FloatValue) -> ComicsResult<FloatValue> {
        self.evaluate(control)
    }
}

/// C-Veq relation with distinct upper and lower hysteresis branches.
///
/// The band between the branches is a set of stable states: any volume inside
/// it is held. The lower branch should not exceed the upper branch anywhere
/// in the shared control range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HysteresisRelation {
    upper: PiecewiseLinear,
    lower: PiecewiseLinear,
}

impl HysteresisRelation {
    pub fn new(upper: PiecewiseLinear, lower: PiecewiseLinear) -> Self {
        Self { upper, lower }
    }

    /// Piecewise symmetric linear relation with a modest hysteresis band
    /// opening around the midpoint of the control range.
    pub fn piecewise_symmetric() -> Self {
        Self::new(
            PiecewiseLinear::new(vec![(0.0, 1.0), (0.5, 0.7), (1.0, 0.0)]),
            PiecewiseLinear::new(vec![(0.0, 1.0), (0.5, 0.3), (1.0, 0.0)]),
        )
    }

    /// Branches fitted to the PISM Antarctic steady states of
    /// Stap et al. (2019), GRL.
    ///
    /// unit: m sea-level equivalent
    pub fn pism() -> Self {
        Self::new(
            PiecewiseLinear::new(vec![
                (0.0, 18.1),
                (0.2671, 16.7),
                (0.5342, 6.5),
                (0.7671, 3.3),
                (1.0, 1.8),
            ]),
            PiecewiseLinear::new(vec![
                (0.0, 18.1),
                (0.2671, 15.1),
                (0.5342, 5.1),
                (0.7671, 2.2),
                (1.0, 1.3),
            ]),
        )
    }
}

#[typetag::serde]
impl EquilibriumRelation for HysteresisRelation {
    fn upper(&self, control: FloatValue) -> ComicsResult<FloatValue> {
        self.upper.evaluate(control)
    }

    fn lower(&self, control: FloatValue) -> ComicsResult<FloatValue> {
        self.lower.evaluate(control)
    }
}
