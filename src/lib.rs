//! Conceptual model of transient ice-sheet variability.
//!
//! The ice volume of a single ice sheet is relaxed toward an equilibrium
//! volume set by a prescribed control parameter (a climate forcing proxy such
//! as CO2 or temperature):
//! - volume below the equilibrium grows by the growth rate,
//! - volume above the equilibrium shrinks by the decay rate.
//!
//! The equilibrium relation may carry distinct upper and lower hysteresis
//! branches, in which case the volume holds wherever it sits inside the band
//! between them. Despite its simplicity this reproduces qualitative features
//! of transient ice sheet behaviour such as lagged, asymmetric responses to
//! cyclic forcing.
//!
//! See Stap, L.B., Knorr, G., and Lohmann, G.: Anti-phased Miocene ice volume
//! and CO2 changes by transient Antarctic ice sheet variability,
//! Paleoceanography and Paleoclimatology, 2020.

pub mod equilibrium;
pub mod errors;
pub mod forcing;
pub mod integrator;
pub mod rates;
pub mod scenario;
pub mod timeseries;

pub use errors::{ComicsError, ComicsResult};
