//! DecisionEngine — pure threshold-driven tier stepping.
//!
//! Given a sample, the current tier, and a policy, recommends scaling one
//! catalog step up, one step down, or holding. The engine never applies the
//! change itself.

use std::sync::Arc;

use tracing::debug;

use tierscale_core::{
    Action, Decision, Direction, Reason, ScalingPolicy, Tier, TierCatalog, TierResult,
    UtilizationSample,
};

/// Outcome of one threshold check.
enum Step {
    /// Threshold not crossed.
    Idle,
    Move(Tier),
    Blocked(Reason),
}

/// Stateless decision engine over a shared, immutable catalog.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    catalog: Arc<TierCatalog>,
}

impl DecisionEngine {
    pub fn new(catalog: Arc<TierCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// Parse the sample's reported tier, then decide.
    pub fn decide_sample(
        &self,
        sample: &UtilizationSample,
        policy: &ScalingPolicy,
    ) -> TierResult<Decision> {
        let current = sample.tier()?;
        self.decide(sample, &current, policy)
    }

    /// Decide the next action for `current` given `sample`.
    ///
    /// Both thresholds are checked on every call and catalog errors from
    /// either check propagate. If both would move the tier (only possible
    /// with `low_threshold >= high_threshold`), scale-up wins.
    pub fn decide(
        &self,
        sample: &UtilizationSample,
        current: &Tier,
        policy: &ScalingPolicy,
    ) -> TierResult<Decision> {
        let current = *current;

        if sample.data_points < policy.required_data_points {
            debug!(
                tier = %current,
                data_points = sample.data_points,
                required = policy.required_data_points,
                "not enough data points"
            );
            return Ok(Decision::hold(current, Reason::InsufficientData));
        }

        let avg = sample.moving_avg_cpu_percent;

        let up = if avg > policy.high_threshold {
            match self.catalog.neighbor_of(&current, Direction::Next)? {
                None => Step::Blocked(Reason::NoLargerTier),
                Some(_) if current.cores() >= policy.max_cores => Step::Blocked(Reason::AtMaxCores),
                Some(next) if next != current => Step::Move(next),
                Some(_) => Step::Idle,
            }
        } else {
            Step::Idle
        };

        let down = if avg < policy.low_threshold {
            match self.catalog.neighbor_of(&current, Direction::Previous)? {
                None => Step::Blocked(Reason::NoSmallerTier),
                Some(_) if current.cores() <= policy.min_cores => Step::Blocked(Reason::AtMinCores),
                Some(prev) if prev != current => Step::Move(prev),
                Some(_) => Step::Idle,
            }
        } else {
            Step::Idle
        };

        let decision = match (up, down) {
            (Step::Move(target), _) => Decision {
                action: Action::ScaleUp,
                current,
                target,
                reason: Reason::HighThreshold,
            },
            (_, Step::Move(target)) => Decision {
                action: Action::ScaleDown,
                current,
                target,
                reason: Reason::LowThreshold,
            },
            (Step::Blocked(reason), _) | (_, Step::Blocked(reason)) => {
                Decision::hold(current, reason)
            }
            (Step::Idle, Step::Idle) => Decision::hold(current, Reason::WithinBand),
        };

        debug!(
            action = %decision.action,
            from = %decision.current,
            to = %decision.target,
            reason = %decision.reason,
            moving_avg = avg,
            high = policy.high_threshold,
            low = policy.low_threshold,
            "decision evaluated"
        );
        Ok(decision)
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(Arc::new(TierCatalog::hyperscale()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierscale_core::TierError;

    fn policy() -> ScalingPolicy {
        ScalingPolicy {
            min_cores: 2,
            max_cores: 80,
            high_threshold: 70.0,
            low_threshold: 20.0,
            required_data_points: 5,
        }
    }

    fn sample(label: &str, moving_avg: f64, data_points: u32) -> UtilizationSample {
        UtilizationSample {
            timestamp: 1000,
            service_objective: label.to_string(),
            avg_cpu_percent: moving_avg,
            moving_avg_cpu_percent: moving_avg,
            data_points,
        }
    }

    fn tier(label: &str) -> Tier {
        Tier::parse(label).unwrap()
    }

    #[test]
    fn scenario_a_scale_up_one_step() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_8", 85.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_8"), &policy()).unwrap();
        assert_eq!(decision.action, Action::ScaleUp);
        assert_eq!(decision.target, tier("hs_gen5_10"));
        assert_eq!(decision.reason, Reason::HighThreshold);
        assert!(decision.is_change());
    }

    #[test]
    fn scenario_b_hold_at_top_of_catalog() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_80", 95.0, 5);
        let mut p = policy();
        p.max_cores = 128;
        let decision = engine.decide(&s, &tier("hs_gen5_80"), &p).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.target, tier("hs_gen5_80"));
        assert_eq!(decision.reason, Reason::NoLargerTier);
    }

    #[test]
    fn scenario_b_hold_with_spec_policy() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_80", 95.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_80"), &policy()).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.target, decision.current);
    }

    #[test]
    fn scenario_c_insufficient_data() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_8", 50.0, 2);
        let decision = engine.decide(&s, &tier("hs_gen5_8"), &policy()).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.reason, Reason::InsufficientData);
        assert_eq!(decision.reason.to_string(), "insufficient data points");
    }

    #[test]
    fn scenario_d_hold_at_min_cores() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_2", 5.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_2"), &policy()).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.target, tier("hs_gen5_2"));
    }

    #[test]
    fn scenario_e_unknown_generation() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen6_8", 85.0, 5);
        assert_eq!(
            engine.decide_sample(&s, &policy()),
            Err(TierError::UnknownGeneration(6))
        );
        assert_eq!(tier("HS_GEN5_8"), tier("hs_gen5_8"));
    }

    #[test]
    fn sufficiency_gate_ignores_extreme_load() {
        let engine = DecisionEngine::default();
        for (avg, points) in [(100.0, 0), (0.0, 4), (99.9, 1), (0.1, 3)] {
            let s = sample("hs_gen5_8", avg, points);
            let decision = engine.decide(&s, &tier("hs_gen5_8"), &policy()).unwrap();
            assert_eq!(decision.action, Action::Hold, "avg={avg} points={points}");
            assert_eq!(decision.reason, Reason::InsufficientData);
        }
    }

    #[test]
    fn no_scale_up_at_max_cores() {
        let engine = DecisionEngine::default();
        let mut p = policy();
        p.max_cores = 16;
        let s = sample("hs_gen5_16", 90.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_16"), &p).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.reason, Reason::AtMaxCores);
    }

    #[test]
    fn no_scale_down_at_min_cores() {
        let engine = DecisionEngine::default();
        let mut p = policy();
        p.min_cores = 8;
        let s = sample("hs_gen5_8", 3.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_8"), &p).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.reason, Reason::AtMinCores);
    }

    #[test]
    fn bounds_check_current_cores_not_target() {
        // 40 < 64 so the step to 80 is allowed even though 80 > max_cores.
        let engine = DecisionEngine::default();
        let mut p = policy();
        p.max_cores = 64;
        let s = sample("hs_gen5_40", 90.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_40"), &p).unwrap();
        assert_eq!(decision.action, Action::ScaleUp);
        assert_eq!(decision.target, tier("hs_gen5_80"));
    }

    #[test]
    fn scale_down_one_step() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen4_16", 10.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen4_16"), &policy()).unwrap();
        assert_eq!(decision.action, Action::ScaleDown);
        assert_eq!(decision.target, tier("hs_gen4_10"));
        assert_eq!(decision.reason, Reason::LowThreshold);
    }

    #[test]
    fn no_scale_down_below_first_tier() {
        let engine = DecisionEngine::default();
        let mut p = policy();
        p.min_cores = 0;
        let s = sample("hs_gen4_1", 1.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen4_1"), &p).unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.reason, Reason::NoSmallerTier);
    }

    #[test]
    fn within_band_holds() {
        let engine = DecisionEngine::default();
        for avg in [20.0, 45.0, 70.0] {
            let s = sample("hs_gen5_8", avg, 5);
            let decision = engine.decide(&s, &tier("hs_gen5_8"), &policy()).unwrap();
            assert_eq!(decision.action, Action::Hold, "avg={avg}");
            assert_eq!(decision.reason, Reason::WithinBand);
            assert_eq!(decision.reason.to_string(), "within band");
        }
    }

    #[test]
    fn scale_up_wins_when_both_thresholds_fire() {
        let engine = DecisionEngine::default();
        let p = ScalingPolicy {
            high_threshold: 30.0,
            low_threshold: 60.0,
            ..policy()
        };
        let s = sample("hs_gen5_8", 45.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_8"), &p).unwrap();
        assert_eq!(decision.action, Action::ScaleUp);
        assert_eq!(decision.target, tier("hs_gen5_10"));
    }

    #[test]
    fn scale_down_applies_when_scale_up_is_blocked() {
        let engine = DecisionEngine::default();
        let p = ScalingPolicy {
            high_threshold: 30.0,
            low_threshold: 60.0,
            max_cores: 8,
            ..policy()
        };
        let s = sample("hs_gen5_8", 45.0, 5);
        let decision = engine.decide(&s, &tier("hs_gen5_8"), &p).unwrap();
        assert_eq!(decision.action, Action::ScaleDown);
        assert_eq!(decision.target, tier("hs_gen5_6"));
    }

    #[test]
    fn tier_outside_catalog_fails_when_threshold_crossed() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_7", 90.0, 5);
        assert_eq!(
            engine.decide_sample(&s, &policy()),
            Err(TierError::TierNotInCatalog("HS_GEN5_7".to_string()))
        );
    }

    #[test]
    fn invalid_label_aborts_before_deciding() {
        let engine = DecisionEngine::default();
        let s = sample("bc_gen5_8", 90.0, 5);
        assert!(matches!(
            engine.decide_sample(&s, &policy()),
            Err(TierError::InvalidTierFormat { .. })
        ));
    }

    #[test]
    fn decide_sample_parses_mixed_case_label() {
        let engine = DecisionEngine::default();
        let s = sample("HS_Gen5_8", 85.0, 5);
        let decision = engine.decide_sample(&s, &policy()).unwrap();
        assert_eq!(decision.current, tier("hs_gen5_8"));
        assert_eq!(decision.target.label(), "HS_GEN5_10");
    }

    #[test]
    fn decision_serializes_with_labels() {
        let engine = DecisionEngine::default();
        let s = sample("hs_gen5_8", 85.0, 5);
        let decision = engine.decide_sample(&s, &policy()).unwrap();
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["action"], "scale_up");
        assert_eq!(json["target"], "HS_GEN5_10");
        assert_eq!(json["reason"], "high_threshold");
    }
}
