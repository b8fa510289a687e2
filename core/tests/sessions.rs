//! Session activity, duration bounds and trial bounds.

use pulsemetrics_core::{
    config::{PipelineConfig, MAX_SESSION_MINUTES, MAX_TRIAL_DAYS},
    error::DatagenError,
    event_generator::generate_events,
    pipeline::Pipeline,
    rng::{GeneratorSlot, RngBank},
    session_generator::{generate_sessions, SessionRecord},
    subscription_generator::generate_subscriptions,
    user_generator::{generate_users, UserRecord},
};
use std::collections::HashSet;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_users(config: &PipelineConfig, bank: &RngBank) -> Vec<UserRecord> {
    generate_users(
        config.users.count,
        config.start_date,
        config.end_date,
        &config.users,
        &mut bank.for_slot(GeneratorSlot::Users),
    )
    .unwrap()
}

fn make_sessions(config: &PipelineConfig, seed: u64) -> (Vec<UserRecord>, Vec<SessionRecord>) {
    let bank = RngBank::new(seed);
    let users = make_users(config, &bank);
    let sessions = generate_sessions(
        &users,
        config.end_date,
        &config.sessions,
        &mut bank.for_slot(GeneratorSlot::Sessions),
    )
    .unwrap();
    (users, sessions)
}

// ── Activity ─────────────────────────────────────────────────────────────────

#[test]
fn no_active_users_means_no_sessions_or_events() {
    let mut config = PipelineConfig::default_test();
    config.sessions.active_user_rate = 0.0;
    config.sessions.per_active_user_mean = 50.0;

    let (_, sessions) = make_sessions(&config, 11);
    assert!(sessions.is_empty(), "Expected 0 sessions, got {}", sessions.len());

    let events = generate_events(
        &sessions,
        &config.events,
        &mut RngBank::new(11).for_slot(GeneratorSlot::Events),
    )
    .unwrap();
    assert!(events.is_empty());
}

#[test]
fn every_user_is_active_at_full_rate() {
    let mut config = PipelineConfig::default_test();
    config.sessions.active_user_rate = 1.0;
    config.sessions.per_active_user_mean = 50.0;
    config.sessions.per_active_user_std = 0.0;

    let (users, sessions) = make_sessions(&config, 12);
    let with_sessions: HashSet<_> = sessions.iter().map(|s| s.user_id).collect();
    assert_eq!(with_sessions.len(), users.len(), "some users were left inactive");
    assert_eq!(sessions.len(), users.len() * 50);
}

// ── Bounds ───────────────────────────────────────────────────────────────────

#[test]
fn oversized_session_durations_are_rejected() {
    let mut config = PipelineConfig::default_test();
    config.sessions.duration_minutes_mean = 1e20;
    config.sessions.duration_minutes_std = 0.0;
    assert!(matches!(
        Pipeline::build(config.clone()).err(),
        Some(DatagenError::InvalidConfig { .. })
    ));

    // Called directly, the generator reports the overflow instead of panicking.
    let bank = RngBank::new(13);
    let users = make_users(&config, &bank);
    let result = generate_sessions(
        &users,
        config.end_date,
        &config.sessions,
        &mut bank.for_slot(GeneratorSlot::Sessions),
    );
    assert!(matches!(result, Err(DatagenError::InvalidConfig { .. })));

    config.sessions.duration_minutes_mean = MAX_SESSION_MINUTES;
    assert!(Pipeline::build(config).is_ok());
}

#[test]
fn sessions_never_run_past_the_window() {
    let mut config = PipelineConfig::default_test();
    config.sessions.duration_minutes_mean = MAX_SESSION_MINUTES;
    config.sessions.duration_minutes_std = MAX_SESSION_MINUTES;

    let (_, sessions) = make_sessions(&config, 14);
    assert!(!sessions.is_empty());
    for s in &sessions {
        assert!(s.session_end >= s.session_start);
        assert!(s.session_end.date() <= config.end_date);
        assert_eq!(s.duration_seconds, (s.session_end - s.session_start).num_seconds());
    }
}

#[test]
fn overlong_trials_are_rejected() {
    let mut config = PipelineConfig::default_test();
    config.subscriptions.trial_days = u32::MAX;
    assert!(matches!(
        Pipeline::build(config.clone()).err(),
        Some(DatagenError::InvalidConfig { .. })
    ));

    let bank = RngBank::new(15);
    let users = make_users(&config, &bank);
    let result = generate_subscriptions(
        &users,
        config.end_date,
        &config.subscriptions,
        &mut bank.for_slot(GeneratorSlot::Subscriptions),
    );
    assert!(matches!(result, Err(DatagenError::InvalidConfig { .. })));

    config.subscriptions.trial_days = MAX_TRIAL_DAYS;
    assert!(Pipeline::build(config).is_ok());
}
