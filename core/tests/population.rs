//! User table generation tests.

use pulsemetrics_core::{
    config::{PipelineConfig, WeightedChoice},
    rng::{GeneratorSlot, RngBank},
    user_generator::{generate_users, UserRecord},
};
use std::collections::HashSet;

fn make_users(config: &PipelineConfig, seed: u64) -> Vec<UserRecord> {
    let mut rng = RngBank::new(seed).for_slot(GeneratorSlot::Users);
    generate_users(
        config.users.count,
        config.start_date,
        config.end_date,
        &config.users,
        &mut rng,
    )
    .unwrap()
}

#[test]
fn generates_exactly_the_requested_count() {
    let mut config = PipelineConfig::default_test();
    for count in [0, 1, 100, 1_000] {
        config.users.count = count;
        let users = make_users(&config, 42);
        assert_eq!(users.len(), count, "Expected {count} users, got {}", users.len());
    }
}

#[test]
fn user_ids_and_emails_are_unique() {
    let mut config = PipelineConfig::default_test();
    config.users.count = 2_000;
    let users = make_users(&config, 7);

    let ids: HashSet<_> = users.iter().map(|u| u.user_id).collect();
    assert_eq!(ids.len(), users.len(), "Duplicate user ids");
    assert!(
        users.iter().all(|u| u.user_id.as_uuid().get_version_num() == 4),
        "user ids must be v4 UUIDs"
    );

    let emails: HashSet<_> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails.len(), users.len(), "Duplicate e-mail addresses");
}

#[test]
fn signup_dates_fall_inside_the_range() {
    let config = PipelineConfig::default_test();
    let users = make_users(&config, 11);

    for u in &users {
        assert!(
            u.signup_date >= config.start_date && u.signup_date <= config.end_date,
            "signup {} outside [{}, {}]",
            u.signup_date,
            config.start_date,
            config.end_date
        );
    }
}

#[test]
fn single_day_range_puts_every_signup_on_that_day() {
    let mut config = PipelineConfig::default_test();
    config.end_date = config.start_date;
    let users = make_users(&config, 3);
    assert!(users.iter().all(|u| u.signup_date == config.start_date));
}

#[test]
fn channels_come_from_the_weighted_set() {
    let mut config = PipelineConfig::default_test();
    config.users.count = 5_000;
    config.users.channels = vec![
        WeightedChoice::new("organic", 3.0),
        WeightedChoice::new("paid_search", 1.0),
        WeightedChoice::new("never", 0.0),
    ];
    let users = make_users(&config, 19);

    let organic = users.iter().filter(|u| u.acquisition_channel == "organic").count();
    let paid = users.iter().filter(|u| u.acquisition_channel == "paid_search").count();
    assert_eq!(organic + paid, users.len(), "Unexpected channel drawn");

    // 3:1 weights -> roughly 75% organic.
    let share = organic as f64 / users.len() as f64;
    assert!((share - 0.75).abs() < 0.03, "organic share {share:.3} far from 0.75");
}
