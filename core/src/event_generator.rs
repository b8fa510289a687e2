//! Event generator.
//!
//! Depends on: sessions.
//! Same per-parent fan-out as sessions: draw a count per session, then
//! sample a type (and a feature for feature-bearing types) per event.
//! Events of one session are emitted in chronological order.

use crate::{
    config::EventConfig,
    error::{DatagenError, DatagenResult},
    rng::StreamRng,
    session_generator::SessionRecord,
    sink::{Column, Record},
    types::{EventId, SessionId, TableKind, UserId},
};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id:        EventId,
    pub session_id:      SessionId,
    pub user_id:         UserId,
    pub event_type:      String,
    pub feature:         Option<String>,
    pub event_timestamp: NaiveDateTime,
}

impl Record for EventRecord {
    const TABLE: TableKind = TableKind::Events;
    const COLUMNS: &'static [Column] = &[
        Column::new("event_id", "TEXT PRIMARY KEY"),
        Column::new("session_id", "TEXT NOT NULL REFERENCES sessions(session_id)"),
        Column::new("user_id", "TEXT NOT NULL REFERENCES users(user_id)"),
        Column::new("event_type", "TEXT NOT NULL"),
        Column::new("feature", "TEXT"),
        Column::new("event_timestamp", "TEXT NOT NULL"),
    ];
}

pub fn generate_events(
    sessions: &[SessionRecord],
    config: &EventConfig,
    rng: &mut StreamRng,
) -> DatagenResult<Vec<EventRecord>> {
    let mut events = Vec::new();

    for session in sessions {
        let n = rng.count(config.per_session_mean, config.per_session_std);
        if n == 0 {
            continue;
        }

        let span = (session.session_end - session.session_start).num_seconds().max(0);
        let mut offsets: Vec<i64> = (0..n)
            .map(|_| rng.next_u64_below(span as u64 + 1) as i64)
            .collect();
        offsets.sort_unstable();

        for offset in offsets {
            let event_type = rng
                .pick_weighted(&config.event_types, |t| t.weight)
                .ok_or_else(|| DatagenError::invalid_config("no event type has a positive weight"))?;
            let feature = if event_type.carries_feature {
                rng.pick(&config.features).cloned()
            } else {
                None
            };

            events.push(EventRecord {
                event_id: EventId::from_uuid(rng.next_uuid()),
                session_id: session.session_id,
                user_id: session.user_id,
                event_type: event_type.name.clone(),
                feature,
                event_timestamp: session.session_start + Duration::seconds(offset),
            });
        }
    }

    log::debug!(
        "events: generated {} rows for {} sessions",
        events.len(),
        sessions.len()
    );
    Ok(events)
}
