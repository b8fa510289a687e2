//! Session generator.
//!
//! Depends on: users.
//! Per user: decide whether the user is active at all, draw a session
//! count from Normal(mean, std) clamped at zero, then place each session
//! uniformly between the signup day and the end of the date range.

use crate::{
    config::SessionConfig,
    error::{DatagenError, DatagenResult},
    rng::StreamRng,
    sink::{Column, Record},
    types::{SessionId, TableKind, UserId},
    user_generator::UserRecord,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const MIN_SESSION_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id:       SessionId,
    pub user_id:          UserId,
    pub session_start:    NaiveDateTime,
    pub session_end:      NaiveDateTime,
    pub duration_seconds: i64,
    pub device:           String,
}

impl Record for SessionRecord {
    const TABLE: TableKind = TableKind::Sessions;
    const COLUMNS: &'static [Column] = &[
        Column::new("session_id", "TEXT PRIMARY KEY"),
        Column::new("user_id", "TEXT NOT NULL REFERENCES users(user_id)"),
        Column::new("session_start", "TEXT NOT NULL"),
        Column::new("session_end", "TEXT NOT NULL"),
        Column::new("duration_seconds", "INTEGER NOT NULL"),
        Column::new("device", "TEXT NOT NULL"),
    ];
}

/// First instant of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last whole second of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::seconds(1)
}

pub fn generate_sessions(
    users: &[UserRecord],
    end_date: NaiveDate,
    config: &SessionConfig,
    rng: &mut StreamRng,
) -> DatagenResult<Vec<SessionRecord>> {
    let window_end = end_of_day(end_date);
    let mut sessions = Vec::new();
    let mut inactive = 0usize;

    for user in users {
        let window_start = start_of_day(user.signup_date);
        if window_start > window_end {
            // Signed up after the range closes: nothing to observe.
            continue;
        }

        if !rng.chance(config.active_user_rate) {
            inactive += 1;
            continue;
        }

        let n = rng.count(config.per_active_user_mean, config.per_active_user_std);
        let span = (window_end - window_start).num_seconds();

        for _ in 0..n {
            let offset = rng.next_u64_below(span as u64 + 1) as i64;
            let session_start = window_start + Duration::seconds(offset);

            let minutes = rng.normal(config.duration_minutes_mean, config.duration_minutes_std);
            let seconds = ((minutes * 60.0).round() as i64).max(MIN_SESSION_SECONDS);
            let wanted = Duration::try_seconds(seconds).ok_or_else(|| {
                DatagenError::invalid_config(format!(
                    "session duration of {minutes} minutes is out of range"
                ))
            })?;
            // Past the end of chrono's calendar is past the window end too.
            let session_end = session_start
                .checked_add_signed(wanted)
                .map_or(window_end, |end| end.min(window_end));

            let device = rng
                .pick_weighted(&config.devices, |d| d.weight)
                .ok_or_else(|| DatagenError::invalid_config("no device has a positive weight"))?;

            sessions.push(SessionRecord {
                session_id: SessionId::from_uuid(rng.next_uuid()),
                user_id: user.user_id,
                session_start,
                session_end,
                duration_seconds: (session_end - session_start).num_seconds(),
                device: device.name.clone(),
            });
        }
    }

    log::debug!(
        "sessions: generated {} rows for {} users ({inactive} inactive)",
        sessions.len(),
        users.len()
    );
    Ok(sessions)
}
