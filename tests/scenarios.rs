//! End-to-end scenario tests.
//!
//! These runs exercise the integrator through the scenario layer the way a
//! paleoclimate experiment would: cyclic forcing over many cycles, hysteresis
//! relations, paired sensitivity runs.

use approx::assert_relative_eq;
use comics::equilibrium::{EquilibriumRelation, HysteresisRelation, LinearRelation};
use comics::forcing::{OrbitalForcing, TriangleForcing};
use comics::integrator::TransientVolumeIntegrator;
use comics::rates::{ConstantRates, PismRates, RatePolicy};
use comics::scenario::{ComparisonConfig, ForcingVariant, Scenario, StartOption};
use comics::timeseries::{FloatValue, Timeseries};
use ndarray::Array1;
use std::sync::Arc;

mod triangle_cycles {
    use super::*;

    /// Slow rates against a fast cycle: the ice volume must lag the
    /// equilibrium and stay strictly inside the equilibrium envelope once
    /// spun up.
    #[test]
    fn test_volume_lags_equilibrium_under_cyclic_forcing() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(TriangleForcing::new(400.0)))
            .with_relation(Arc::new(LinearRelation::simple()))
            .with_rates(Arc::new(ConstantRates::new(0.002, 0.004)))
            .with_steps(2000)
            .with_start(StartOption::Custom(0.0))
            .build()
            .unwrap();

        let output = scenario.run().unwrap();
        assert_eq!(output.ice_volume.len(), 2000);

        // Per-step change is bounded by the configured rates
        for w in output.ice_volume.values().to_vec().windows(2) {
            let delta = w[1] - w[0];
            assert!(delta <= 0.002 + 1e-12 && delta >= -0.004 - 1e-12);
        }

        // After the first full cycle the volume oscillates within the
        // equilibrium range instead of tracking it exactly
        let spun_up: Vec<FloatValue> = output.ice_volume.values().to_vec()[400..].to_vec();
        let max = spun_up.iter().cloned().fold(FloatValue::MIN, FloatValue::max);
        let min = spun_up.iter().cloned().fold(FloatValue::MAX, FloatValue::min);
        assert!(max < 1.0);
        assert!(min > 0.0);
        assert!(max - min < 1.0);
    }

    /// With clamping and rates much larger than the forcing sweep, the
    /// trajectory snaps onto the equilibrium series exactly.
    #[test]
    fn test_fast_clamped_ice_sheet_tracks_equilibrium() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(TriangleForcing::new(400.0)))
            .with_relation(Arc::new(LinearRelation::simple()))
            .with_rates(Arc::new(ConstantRates::new(100.0, 100.0)))
            .with_clamping(true)
            .with_steps(1000)
            .build()
            .unwrap();

        let output = scenario.run().unwrap();
        for (volume, veq) in output
            .ice_volume
            .values()
            .iter()
            .zip(output.equilibrium_upper.values().iter())
        {
            assert_relative_eq!(*volume, *veq, epsilon = 1e-12);
        }
    }

    /// Reducing the forcing amplitude shrinks the ice volume response.
    #[test]
    fn test_reduced_amplitude_shrinks_the_response() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(TriangleForcing::new(400.0)))
            .with_relation(Arc::new(LinearRelation::simple()))
            .with_rates(Arc::new(ConstantRates::new(0.002, 0.004)))
            .with_steps(2000)
            .with_start(StartOption::Custom(0.5))
            .build()
            .unwrap();

        let config = ComparisonConfig {
            variant: ForcingVariant::AmplitudeReduced {
                factor: 0.5,
                center: 0.5,
            },
            start: StartOption::Custom(0.5),
            ..ComparisonConfig::default()
        };
        let (full, reduced) = scenario.run_comparison(&config).unwrap();

        let range = |ts: &Timeseries| {
            let values = ts.values().to_vec();
            let tail = &values[400..];
            tail.iter().cloned().fold(FloatValue::MIN, FloatValue::max)
                - tail.iter().cloned().fold(FloatValue::MAX, FloatValue::min)
        };
        assert!(range(&reduced.ice_volume) < range(&full.ice_volume));
    }
}

mod hysteresis_runs {
    use super::*;

    /// Under a hysteresis relation, forcing that sweeps back and forth leaves
    /// the volume parked on different branches depending on its history, so
    /// identical control values can coexist with different volumes.
    #[test]
    fn test_history_dependence_under_hysteresis() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(TriangleForcing::new(400.0)))
            .with_relation(Arc::new(HysteresisRelation::piecewise_symmetric()))
            .with_rates(Arc::new(ConstantRates::new(0.01, 0.01)))
            .with_steps(800)
            .with_start(StartOption::Custom(0.5))
            .build()
            .unwrap();

        let output = scenario.run().unwrap();

        // The forcing visits c = 0.5 twice per cycle (descending and
        // ascending legs). Collect the volumes seen there.
        let mut volumes_at_half = vec![];
        for ((_, c), (_, v)) in output.control.iter().zip(output.ice_volume.iter()) {
            if (c - 0.5).abs() < 1e-9 {
                volumes_at_half.push(v);
            }
        }
        assert!(volumes_at_half.len() >= 2);
        let spread = volumes_at_half
            .iter()
            .cloned()
            .fold(FloatValue::MIN, FloatValue::max)
            - volumes_at_half
                .iter()
                .cloned()
                .fold(FloatValue::MAX, FloatValue::min);
        assert!(spread > 0.0, "expected path dependence at c=0.5");
    }

    /// PISM-derived branches and rates with a cold start: the volume decays
    /// from the glacial state and stays within the physically meaningful
    /// envelope of the branch curves.
    #[test]
    fn test_pism_cold_start_deglaciates() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(TriangleForcing::new(400.0)))
            .with_relation(Arc::new(HysteresisRelation::pism()))
            .with_rates(Arc::new(PismRates::default()))
            .with_steps(2000)
            .with_start(StartOption::Cold)
            .build()
            .unwrap();

        let output = scenario.run().unwrap();
        let volumes = output.ice_volume.values();

        // Starts above every equilibrium state, so the first move is decay
        assert!(volumes[0] < StartOption::Cold.initial_volume());
        // Never grows past the largest equilibrium volume once below it
        let (_, final_volume) = output.ice_volume.last().unwrap();
        assert!(final_volume < 18.1);
        assert!(final_volume >= 0.0);
    }
}

mod orbital_runs {
    use super::*;

    #[test]
    fn test_obliquity_forcing_drives_a_bounded_response() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(OrbitalForcing::obliquity()))
            .with_relation(Arc::new(LinearRelation::simple()))
            .with_rates(Arc::new(ConstantRates::new(0.002, 0.004)))
            .with_steps(4000)
            .with_start(StartOption::Custom(0.5))
            .build()
            .unwrap();

        let output = scenario.run().unwrap();
        // Forcing spans [0, 0.5], so veq spans [0.5, 1.0]. The relaxed
        // volume lags inside that band, with one Euler step of slack where
        // it overshoots the equilibrium near the trough.
        let values = output.ice_volume.values().to_vec();
        let tail = &values[1000..];
        assert!(tail.iter().all(|&v| v > 0.45 && v < 1.0));
    }
}

mod configuration_round_trips {
    use super::*;

    /// A configured integrator survives serialization, and the restored copy
    /// produces a bit-identical trajectory.
    #[test]
    fn test_integrator_round_trips_through_serde() {
        let integrator = TransientVolumeIntegrator::new(
            Arc::new(HysteresisRelation::pism()),
            Arc::new(PismRates::default()),
        )
        .with_clamping(true);

        let restored: TransientVolumeIntegrator =
            serde_json::from_str(&serde_json::to_string(&integrator).unwrap()).unwrap();

        let series = Timeseries::from_values(
            Array1::from_iter((0..200).map(|i| 0.5 + 0.4 * ((i as FloatValue) / 50.0).sin())),
            1.0,
            1.0,
        );
        let original_run = integrator.run(10.0, &series, 1.0).unwrap();
        let restored_run = restored.run(10.0, &series, 1.0).unwrap();
        assert_eq!(original_run, restored_run);
    }

    #[test]
    fn test_rate_policy_round_trips_through_serde() {
        let rates: Box<dyn RatePolicy> = Box::new(PismRates::default());
        let restored: Box<dyn RatePolicy> =
            serde_json::from_str(&serde_json::to_string(&rates).unwrap()).unwrap();
        assert_relative_eq!(
            restored.growth_rate(0.1, 2.0, 16.0),
            rates.growth_rate(0.1, 2.0, 16.0)
        );
    }

    #[test]
    fn test_scenario_round_trips_through_serde() {
        let scenario = Scenario::builder()
            .with_forcing(Arc::new(TriangleForcing::new(400.0)))
            .with_relation(Arc::new(LinearRelation::simple()))
            .with_rates(Arc::new(ConstantRates::new(0.002, 0.004)))
            .with_steps(500)
            .build()
            .unwrap();

        let restored: Scenario =
            serde_json::from_str(&serde_json::to_string(&scenario).unwrap()).unwrap();
        assert_eq!(scenario.run().unwrap(), restored.run().unwrap());
    }
}

/// The relation trait seam accepts caller-defined relations, not just the
/// bundled ones.
mod custom_relations {
    use super::*;
    use comics::errors::ComicsResult;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct QuadraticRelation {
        scale: FloatValue,
    }

    #[typetag::serde]
    impl EquilibriumRelation for QuadraticRelation {
        fn upper(&self, control: FloatValue) -> ComicsResult<FloatValue> {
            Ok(self.scale * (1.0 - control * control))
        }
    }

    #[test]
    fn test_custom_relation_plugs_into_the_integrator() {
        let integrator = TransientVolumeIntegrator::new(
            Arc::new(QuadraticRelation { scale: 10.0 }),
            Arc::new(ConstantRates::new(1.0, 1.0)),
        )
        .with_clamping(true);

        let series = Timeseries::from_values(Array1::from_elem(20, 0.0), 1.0, 1.0);
        let trajectory = integrator.run(0.0, &series, 1.0).unwrap();
        let (_, final_volume) = trajectory.last().unwrap();
        assert_relative_eq!(final_volume, 10.0);
    }
}
