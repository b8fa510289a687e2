//! Shared primitive types used across the entire pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(
    /// Primary key of the users table.
    UserId
);
entity_id!(
    /// Primary key of the sessions table.
    SessionId
);
entity_id!(
    /// Primary key of the events table.
    EventId
);
entity_id!(
    /// Primary key of the subscriptions table.
    SubscriptionId
);
entity_id!(
    /// Primary key of the payments table.
    PaymentId
);

/// The five entity tables, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Users,
    Sessions,
    Events,
    Subscriptions,
    Payments,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::Users,
        TableKind::Sessions,
        TableKind::Events,
        TableKind::Subscriptions,
        TableKind::Payments,
    ];

    /// Stable table name. Used for file stems and SQL table names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Users         => "users",
            Self::Sessions      => "sessions",
            Self::Events        => "events",
            Self::Subscriptions => "subscriptions",
            Self::Payments      => "payments",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
