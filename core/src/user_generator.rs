//! User generator. Users are the root entity table.
//!
//! Depends on: configuration only.

use crate::{
    config::UserConfig,
    error::{DatagenError, DatagenResult},
    name_generator::NameGenerator,
    rng::StreamRng,
    sink::{Column, Record},
    types::{TableKind, UserId},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id:             UserId,
    pub name:                String,
    pub email:               String,
    pub signup_date:         NaiveDate,
    pub acquisition_channel: String,
}

impl Record for UserRecord {
    const TABLE: TableKind = TableKind::Users;
    const COLUMNS: &'static [Column] = &[
        Column::new("user_id", "TEXT PRIMARY KEY"),
        Column::new("name", "TEXT NOT NULL"),
        Column::new("email", "TEXT NOT NULL"),
        Column::new("signup_date", "TEXT NOT NULL"),
        Column::new("acquisition_channel", "TEXT NOT NULL"),
    ];
}

/// Generate exactly `count` users with signups uniform over
/// `[start_date, end_date]`.
pub fn generate_users(
    count: usize,
    start_date: NaiveDate,
    end_date: NaiveDate,
    config: &UserConfig,
    rng: &mut StreamRng,
) -> DatagenResult<Vec<UserRecord>> {
    let span_days = (end_date - start_date).num_days();
    if span_days < 0 {
        return Err(DatagenError::invalid_config(format!(
            "user signup range is inverted: {start_date} > {end_date}"
        )));
    }

    let mut users = Vec::with_capacity(count);
    for i in 0..count {
        let channel = rng
            .pick_weighted(&config.channels, |c| c.weight)
            .ok_or_else(|| DatagenError::invalid_config("no acquisition channel has a positive weight"))?;
        let offset = rng.next_u64_below(span_days as u64 + 1) as i64;
        let identity = NameGenerator::generate_identity(rng, &config.email_domains, i + 1);

        users.push(UserRecord {
            user_id: UserId::from_uuid(rng.next_uuid()),
            name: identity.name,
            email: identity.email,
            signup_date: start_date + Duration::days(offset),
            acquisition_channel: channel.name.clone(),
        });
    }

    log::debug!("users: generated {} rows", users.len());
    Ok(users)
}
