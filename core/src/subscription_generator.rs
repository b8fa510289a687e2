//! Subscription lifecycle generator.
//!
//! Depends on: users.
//!
//! LIFECYCLE (the only state machine in the pipeline):
//!   trial    → active | churned
//!   active   → upgraded | churned
//!   upgraded, churned: terminal
//!
//! RULES:
//!   - Every user gets exactly one subscription row, starting as a trial
//!     on the signup date.
//!   - A trial that has not ended by end_date stays `trial`.
//!   - A trial that ends without converting stays `trial` (expired trial).
//!   - At each monthly boundary of a paid subscription, churn is rolled
//!     first; upgrade is rolled only when the subscription did not churn.
//!   - The top plan cannot upgrade.

use crate::{
    config::SubscriptionConfig,
    error::{DatagenError, DatagenResult},
    rng::StreamRng,
    sink::{Column, Record},
    types::{SubscriptionId, TableKind, UserId},
    user_generator::UserRecord,
};
use chrono::{Days, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Trial,
    Active,
    Churned,
    Upgraded,
}

impl SubscriptionState {
    pub const ALL: [SubscriptionState; 4] = [
        SubscriptionState::Trial,
        SubscriptionState::Active,
        SubscriptionState::Churned,
        SubscriptionState::Upgraded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial    => "trial",
            Self::Active   => "active",
            Self::Churned  => "churned",
            Self::Upgraded => "upgraded",
        }
    }

    pub fn can_transition_to(&self, next: SubscriptionState) -> bool {
        use SubscriptionState::*;
        matches!(
            (self, next),
            (Trial, Active) | (Trial, Churned) | (Active, Upgraded) | (Active, Churned)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Churned | Self::Upgraded)
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub subscription_id: SubscriptionId,
    pub user_id:         UserId,
    pub plan:            String,
    pub status:          SubscriptionState,
    pub monthly_price:   f64,
    pub trial_start:     NaiveDate,
    pub trial_end:       NaiveDate,
    pub paid_start:      Option<NaiveDate>,
    pub previous_plan:   Option<String>,
    pub upgraded_at:     Option<NaiveDate>,
    pub churned_at:      Option<NaiveDate>,
    pub valid_from:      NaiveDate,
    /// None while the subscription is still billing at end of range.
    pub valid_to:        Option<NaiveDate>,
}

impl Record for SubscriptionRecord {
    const TABLE: TableKind = TableKind::Subscriptions;
    const COLUMNS: &'static [Column] = &[
        Column::new("subscription_id", "TEXT PRIMARY KEY"),
        Column::new("user_id", "TEXT NOT NULL REFERENCES users(user_id)"),
        Column::new("plan", "TEXT NOT NULL"),
        Column::new("status", "TEXT NOT NULL"),
        Column::new("monthly_price", "REAL NOT NULL"),
        Column::new("trial_start", "TEXT NOT NULL"),
        Column::new("trial_end", "TEXT NOT NULL"),
        Column::new("paid_start", "TEXT"),
        Column::new("previous_plan", "TEXT"),
        Column::new("upgraded_at", "TEXT"),
        Column::new("churned_at", "TEXT"),
        Column::new("valid_from", "TEXT NOT NULL"),
        Column::new("valid_to", "TEXT"),
    ];
}

impl SubscriptionRecord {
    pub fn has_paid_period(&self) -> bool {
        self.paid_start.is_some()
    }

    /// Inclusive first and last day on which a billing cycle may fall.
    /// Churned subscriptions stop billing the day before churn.
    pub fn paid_window(&self, end_date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = self.paid_start?;
        let last = match self.churned_at {
            Some(churned) => churned - Duration::days(1),
            None => end_date,
        };
        (last >= from).then_some((from, last))
    }

    /// Monthly price billed on `date`: the pre-upgrade plan before the upgrade.
    pub fn price_on(&self, date: NaiveDate, config: &SubscriptionConfig) -> (String, f64) {
        match (&self.previous_plan, self.upgraded_at) {
            (Some(previous), Some(upgraded_at)) if date < upgraded_at => {
                let price = config.plan(previous).map(|p| p.monthly_price).unwrap_or(0.0);
                (previous.clone(), price)
            }
            _ => (self.plan.clone(), self.monthly_price),
        }
    }
}

pub fn generate_subscriptions(
    users: &[UserRecord],
    end_date: NaiveDate,
    config: &SubscriptionConfig,
    rng: &mut StreamRng,
) -> DatagenResult<Vec<SubscriptionRecord>> {
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        out.push(simulate_lifecycle(user, end_date, config, rng)?);
    }

    let paid = out.iter().filter(|s| s.has_paid_period()).count();
    log::debug!("subscriptions: generated {} rows ({paid} paid)", out.len());
    Ok(out)
}

fn simulate_lifecycle(
    user: &UserRecord,
    end_date: NaiveDate,
    config: &SubscriptionConfig,
    rng: &mut StreamRng,
) -> DatagenResult<SubscriptionRecord> {
    let trial_plan = rng
        .pick_weighted(&config.plans, |p| p.weight)
        .ok_or_else(|| DatagenError::invalid_config("no plan has a positive weight"))?;
    let subscription_id = SubscriptionId::from_uuid(rng.next_uuid());

    let trial_start = user.signup_date;
    let trial_end = trial_start
        .checked_add_days(Days::new(u64::from(config.trial_days)))
        .ok_or_else(|| {
            DatagenError::invalid_config(format!(
                "a {}-day trial starting {trial_start} runs past the calendar",
                config.trial_days
            ))
        })?;

    let mut record = SubscriptionRecord {
        subscription_id,
        user_id: user.user_id,
        plan: trial_plan.name.clone(),
        status: SubscriptionState::Trial,
        monthly_price: trial_plan.monthly_price,
        trial_start,
        trial_end,
        paid_start: None,
        previous_plan: None,
        upgraded_at: None,
        churned_at: None,
        valid_from: trial_start,
        valid_to: Some(trial_end.min(end_date)),
    };

    if trial_end > end_date || !rng.chance(config.trial_conversion_rate) {
        return Ok(record);
    }

    transition(&mut record, SubscriptionState::Active);
    record.paid_start = Some(trial_end);
    record.valid_to = None;

    let mut month = 1u32;
    while let Some(boundary) = trial_end.checked_add_months(Months::new(month)) {
        if boundary > end_date {
            break;
        }

        if rng.chance(config.monthly_churn_rate) {
            transition(&mut record, SubscriptionState::Churned);
            record.churned_at = Some(boundary);
            record.valid_to = Some(boundary);
            break;
        }

        if rng.chance(config.upgrade_probability) {
            if let Some(next) = config.next_plan_after(&record.plan) {
                transition(&mut record, SubscriptionState::Upgraded);
                record.previous_plan = Some(std::mem::replace(&mut record.plan, next.name.clone()));
                record.monthly_price = next.monthly_price;
                record.upgraded_at = Some(boundary);
                break;
            }
        }
        month += 1;
    }

    Ok(record)
}

fn transition(record: &mut SubscriptionRecord, next: SubscriptionState) {
    debug_assert!(
        record.status.can_transition_to(next),
        "illegal subscription transition {} -> {next}",
        record.status
    );
    record.status = next;
}
