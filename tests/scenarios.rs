//! End-to-end session scenarios driven with a seeded rng and explicit
//! timestamps, mirroring how a scraping loop drives the engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use scrollpacer::{
    EngineConfig, EngineOptions, Phase, ProfileName, ScrollEngine, StopReason, TelemetrySample,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
}

fn engine(options: EngineOptions, seed: u64) -> ScrollEngine<StdRng> {
    ScrollEngine::with_rng(options, EngineConfig::default(), StdRng::seed_from_u64(seed)).unwrap()
}

fn healthy_at(batch: u32, total: u64, when: DateTime<Utc>) -> TelemetrySample {
    TelemetrySample::healthy(batch, total, 300).at(when)
}

#[test]
fn plan_completion_stops_after_the_final_batch() {
    let mut engine = engine(
        EngineOptions::new(40)
            .initial_profile("normal")
            .session_id("plan-complete"),
        1,
    );

    let mut stopped_at = None;
    for step in 1..=5u64 {
        assert!(stopped_at.is_none(), "engine kept running past the plan");
        let when = t0() + Duration::seconds(step as i64 * 3);
        let verdict = engine.process_telemetry(healthy_at(10, step * 10, when));
        if verdict.should_stop {
            assert_eq!(verdict.reason, Some(StopReason::PlanComplete));
            stopped_at = Some(step);
            break;
        }
    }

    assert_eq!(stopped_at, Some(4));
    assert!(!engine.should_continue());

    let summary = engine.get_summary();
    assert_eq!(summary.items_fetched, 40);
    assert_eq!(summary.items_planned, 40);
    assert_eq!(summary.steps_taken, 4);
    assert_eq!(summary.terminated_reason, Some(StopReason::PlanComplete));
}

#[test]
fn second_captcha_terminates_regardless_of_healthy_telemetry() {
    let mut engine = engine(
        EngineOptions::new(200).initial_profile("normal"),
        2,
    );

    let mut captcha = TelemetrySample::healthy(0, 0, 400).at(t0());
    captcha.captcha_seen = true;
    let verdict = engine.process_telemetry(captcha.clone());
    assert!(!verdict.should_stop);

    // Plenty of healthy progress in between does not argue the second
    // captcha away.
    for step in 1..=3u64 {
        let when = t0() + Duration::seconds(step as i64 * 4);
        let verdict = engine.process_telemetry(healthy_at(5, step * 5, when));
        assert!(!verdict.should_stop);
    }

    let verdict = engine.process_telemetry(captcha.at(t0() + Duration::seconds(30)));
    assert!(verdict.should_stop);
    assert_eq!(verdict.reason, Some(StopReason::CaptchaRepeated));
    assert!(!engine.should_continue());
    assert_eq!(
        engine.get_summary().terminated_reason,
        Some(StopReason::CaptchaRepeated)
    );
}

#[test]
fn rate_limit_cools_down_demotes_then_promotes_back() {
    let mut engine = engine(
        EngineOptions::new(100).initial_profile("aggressive"),
        3,
    );
    assert_eq!(engine.current_profile().name, ProfileName::Aggressive);

    let mut burst = TelemetrySample::healthy(0, 0, 0).at(t0());
    burst.rate_limit_seen = true;
    burst.xhr_errors = 3;
    let verdict = engine.process_telemetry(burst);

    assert!(verdict.needs_cooldown);
    assert!(!verdict.should_stop);
    assert_eq!(verdict.cooldown_ms, 10_000);
    assert!(matches!(engine.phase(), Phase::Cooldown { .. }));
    assert_eq!(engine.current_profile().name, ProfileName::Normal);

    // Mid-cooldown hints cover exactly the remaining window.
    let hints = engine.hints_at(t0() + Duration::seconds(1));
    assert_eq!(hints.delay_ms, 9_000);
    assert_eq!(
        hints.scroll_px,
        engine.current_profile().scroll_range_px.min
    );

    // Once the window passes, the engine resumes planning normally.
    let resumed = engine.hints_at(t0() + Duration::seconds(11));
    assert!(matches!(engine.phase(), Phase::Running));
    assert!(resumed.delay_ms >= 1_000);

    // Sustained health decays the risk and earns the faster posture back.
    for step in 1..=4u64 {
        let when = t0() + Duration::seconds(11 + step as i64 * 3);
        let verdict = engine.process_telemetry(healthy_at(5, step * 5, when));
        assert!(!verdict.should_stop);
    }
    assert_eq!(engine.current_profile().name, ProfileName::Aggressive);

    let history = engine.get_summary().profile_history;
    assert_eq!(
        history,
        vec![
            ProfileName::Aggressive,
            ProfileName::Normal,
            ProfileName::Aggressive
        ]
    );
}

#[test]
fn stalled_feed_aborts_instead_of_looping() {
    let mut engine = engine(
        EngineOptions::new(100).initial_profile("normal"),
        4,
    );

    let mut last = None;
    for step in 1..=3u64 {
        let mut sample = TelemetrySample::healthy(0, 0, 250);
        sample.empty_response = true;
        last = Some(engine.process_telemetry(
            sample.at(t0() + Duration::seconds(step as i64 * 3)),
        ));
    }

    let verdict = last.unwrap();
    assert!(verdict.should_stop);
    assert_eq!(verdict.reason, Some(StopReason::Stalled));
    assert!(!engine.should_continue());

    let summary = engine.get_summary();
    assert_eq!(summary.steps_taken, 3);
    assert_eq!(summary.items_fetched, 0);
}

#[test]
fn healthy_run_decays_risk_monotonically() {
    let mut engine = engine(
        EngineOptions::new(500).initial_profile("cautious"),
        5,
    );

    for step in 1..=2u64 {
        let mut sample = TelemetrySample::healthy(0, 0, 250);
        sample.xhr_errors = 2;
        engine.process_telemetry(sample.at(t0() + Duration::seconds(step as i64 * 3)));
    }
    let start_risk = engine.accumulated_risk();
    assert_eq!(start_risk, 4);

    let mut previous = start_risk;
    for step in 1..=6u64 {
        let when = t0() + Duration::seconds(10 + step as i64 * 3);
        engine.process_telemetry(healthy_at(8, step * 8, when));
        let risk = engine.accumulated_risk();
        assert!(risk <= previous);
        previous = risk;
    }
    assert!(previous < start_risk);
    assert_eq!(previous, 0);
}

#[test]
fn cooldown_length_scales_with_overshoot() {
    let mut engine = engine(
        EngineOptions::new(1_000).initial_profile("cautious"),
        6,
    );

    let mut burst = TelemetrySample::healthy(0, 0, 0);
    burst.rate_limit_seen = true;
    burst.xhr_errors = 3;

    let first = engine.process_telemetry(burst.clone().at(t0()));
    assert!(!first.needs_cooldown);
    assert_eq!(engine.accumulated_risk(), 5);

    // Second burst lands at 10, one point over the cautious ceiling of 9.
    let second = engine.process_telemetry(burst.at(t0() + Duration::seconds(5)));
    assert!(second.needs_cooldown);
    assert_eq!(second.cooldown_ms, 15_000);
    // Nothing below cautious to demote to.
    assert_eq!(engine.get_summary().profile_history, vec![ProfileName::Cautious]);
}

#[test]
fn step_ceiling_catches_silent_extraction_failure() {
    let config = EngineConfig::builder()
        .step_ceiling_floor(5)
        .build()
        .unwrap();
    let mut engine = ScrollEngine::with_rng(
        EngineOptions::new(1).initial_profile("normal"),
        config,
        StdRng::seed_from_u64(7),
    )
    .unwrap();

    // Payloads arrive malformed but never empty: no stall, no risk, no
    // progress.
    let mut verdict = None;
    for step in 1..=5u64 {
        let sample = TelemetrySample::healthy(0, 0, 250)
            .at(t0() + Duration::seconds(step as i64 * 3));
        verdict = Some(engine.process_telemetry(sample));
    }

    let verdict = verdict.unwrap();
    assert!(verdict.should_stop);
    assert_eq!(verdict.reason, Some(StopReason::StepCeiling));
    assert!(!engine.should_continue());
}

#[test]
fn seeded_hints_stay_inside_the_posture_envelope() {
    let mut engine = engine(
        EngineOptions::new(10_000).initial_profile("cautious"),
        8,
    );
    let profile = engine.current_profile();
    let delay_lo = (profile.delay_range_ms.min as f32 * 0.85) as u64;
    let delay_hi = (profile.delay_range_ms.max as f32 * 1.15).ceil() as u64;

    let mut seen = std::collections::HashSet::new();
    for step in 0..100i64 {
        let hints = engine.hints_at(t0() + Duration::seconds(step));
        assert!(hints.delay_ms >= delay_lo && hints.delay_ms <= delay_hi);
        seen.insert((hints.delay_ms, hints.scroll_px));
    }
    // Jitter means a fixed state still never repeats itself step to step.
    assert!(seen.len() > 90);
}
