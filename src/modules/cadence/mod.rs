//! Step pacing computation.
//!
//! Draws a base delay and scroll distance from the current profile, stretches
//! the delay by a risk surcharge, then perturbs both so no two steps are
//! identical even under identical state. Fixed-interval traffic is one of the
//! cheapest bot heuristics to trip.

use rand::Rng;

use super::profiles::PacingProfile;
use super::telemetry::StepHints;

/// Stateless planner; a fresh immutable hint per call.
#[derive(Debug, Clone, Copy)]
pub struct CadencePlanner {
    jitter: f32,
    surcharge_cap: f32,
}

impl CadencePlanner {
    pub fn new(jitter: f32, surcharge_cap: f32) -> Self {
        Self {
            jitter: jitter.clamp(0.0, 0.5),
            surcharge_cap: surcharge_cap.max(1.0),
        }
    }

    /// Compute the next wait and scroll for the given posture and risk.
    ///
    /// `delay = base * (1 + risk / ceiling)`, capped at `surcharge_cap`
    /// times base, then jittered. Scroll distance gets jitter only; risk
    /// slows a session down, it does not change how far it reads.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        profile: &PacingProfile,
        accumulated_risk: i32,
        rng: &mut R,
    ) -> StepHints {
        let base_delay = profile.delay_range_ms.sample(rng) as f32;
        let base_scroll = profile.scroll_range_px.sample(rng) as f32;

        let risk = accumulated_risk.max(0) as f32;
        let ceiling = profile.risk_ceiling.max(1) as f32;
        let surcharge = (1.0 + risk / ceiling).min(self.surcharge_cap);

        let delay = base_delay * surcharge * self.jitter_factor(rng);
        let scroll = base_scroll * self.jitter_factor(rng);

        StepHints {
            delay_ms: delay.round().max(0.0) as u64,
            scroll_px: scroll.round().max(1.0) as u32,
        }
    }

    fn jitter_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.jitter == 0.0 {
            return 1.0;
        }
        rng.gen_range(1.0 - self.jitter..=1.0 + self.jitter)
    }
}

impl Default for CadencePlanner {
    fn default() -> Self {
        Self::new(0.15, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::profiles::{ProfileName, profile};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_risk_stays_inside_jittered_profile_bounds() {
        let planner = CadencePlanner::default();
        let normal = profile(ProfileName::Normal);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let hints = planner.plan(normal, 0, &mut rng);
            let lo = (normal.delay_range_ms.min as f32 * 0.85) as u64;
            let hi = (normal.delay_range_ms.max as f32 * 1.15).ceil() as u64;
            assert!(hints.delay_ms >= lo && hints.delay_ms <= hi);

            let slo = (normal.scroll_range_px.min as f32 * 0.85) as u32;
            let shi = (normal.scroll_range_px.max as f32 * 1.15).ceil() as u32;
            assert!(hints.scroll_px >= slo && hints.scroll_px <= shi);
        }
    }

    #[test]
    fn delay_is_monotone_in_risk_for_a_fixed_stream() {
        let planner = CadencePlanner::default();
        let normal = profile(ProfileName::Normal);

        let mut previous = 0u64;
        for risk in 0..=12 {
            // Same seed pins the base and jitter draws, isolating the
            // surcharge contribution.
            let mut rng = StdRng::seed_from_u64(99);
            let hints = planner.plan(normal, risk, &mut rng);
            assert!(hints.delay_ms >= previous);
            previous = hints.delay_ms;
        }
    }

    #[test]
    fn surcharge_is_capped() {
        let planner = CadencePlanner::new(0.0, 5.0);
        let normal = profile(ProfileName::Normal);
        let mut rng = StdRng::seed_from_u64(5);
        let hints = planner.plan(normal, 1_000, &mut rng);
        let hard_max = normal.delay_range_ms.max as u64 * 5;
        assert!(hints.delay_ms <= hard_max);
    }

    #[test]
    fn consecutive_steps_differ_under_identical_state() {
        let planner = CadencePlanner::default();
        let cautious = profile(ProfileName::Cautious);
        let mut rng = StdRng::seed_from_u64(3);
        let a = planner.plan(cautious, 2, &mut rng);
        let b = planner.plan(cautious, 2, &mut rng);
        assert_ne!(a, b);
    }
}
