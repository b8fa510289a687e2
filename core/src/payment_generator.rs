//! Payment generator.
//!
//! Depends on: subscriptions.
//! One payment attempt per monthly billing cycle inside a subscription's
//! paid window. Trial-only subscriptions produce nothing.

use crate::{
    config::{PaymentConfig, SubscriptionConfig},
    error::DatagenResult,
    rng::StreamRng,
    session_generator::start_of_day,
    sink::{Column, Record},
    subscription_generator::SubscriptionRecord,
    types::{PaymentId, SubscriptionId, TableKind, UserId},
};
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id:        PaymentId,
    pub subscription_id:   SubscriptionId,
    pub user_id:           UserId,
    pub plan:              String,
    pub amount:            f64,
    pub payment_timestamp: NaiveDateTime,
    pub status:            PaymentStatus,
}

impl Record for PaymentRecord {
    const TABLE: TableKind = TableKind::Payments;
    const COLUMNS: &'static [Column] = &[
        Column::new("payment_id", "TEXT PRIMARY KEY"),
        Column::new("subscription_id", "TEXT NOT NULL REFERENCES subscriptions(subscription_id)"),
        Column::new("user_id", "TEXT NOT NULL REFERENCES users(user_id)"),
        Column::new("plan", "TEXT NOT NULL"),
        Column::new("amount", "REAL NOT NULL"),
        Column::new("payment_timestamp", "TEXT NOT NULL"),
        Column::new("status", "TEXT NOT NULL"),
    ];
}

pub fn generate_payments(
    subscriptions: &[SubscriptionRecord],
    end_date: NaiveDate,
    plans: &SubscriptionConfig,
    config: &PaymentConfig,
    rng: &mut StreamRng,
) -> DatagenResult<Vec<PaymentRecord>> {
    let mut payments = Vec::new();

    for sub in subscriptions {
        let Some((first, last)) = sub.paid_window(end_date) else {
            continue;
        };

        for cycle_date in billing_cycles(first, last) {
            let (plan, amount) = sub.price_on(cycle_date, plans);
            let status = if rng.chance(config.failure_rate) {
                PaymentStatus::Failed
            } else {
                PaymentStatus::Succeeded
            };
            let second = rng.next_u64_below(SECONDS_PER_DAY) as i64;

            payments.push(PaymentRecord {
                payment_id: PaymentId::from_uuid(rng.next_uuid()),
                subscription_id: sub.subscription_id,
                user_id: sub.user_id,
                plan,
                amount,
                payment_timestamp: start_of_day(cycle_date) + Duration::seconds(second),
                status,
            });
        }
    }

    let failed = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Failed)
        .count();
    log::debug!("payments: generated {} rows ({failed} failed)", payments.len());
    Ok(payments)
}

/// Monthly dates from `first` through `last`, inclusive.
pub fn billing_cycles(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut cycles = Vec::new();
    let mut month = 0u32;
    while let Some(date) = first.checked_add_months(Months::new(month)) {
        if date > last {
            break;
        }
        cycles.push(date);
        month += 1;
    }
    cycles
}
