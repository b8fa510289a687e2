//! PulseMetrics synthetic dataset generator.
//!
//! Produces users, sessions, events, subscriptions and payments for
//! seeding an analytics warehouse demo. See `pipeline` for the run order.

pub mod config;
pub mod error;
pub mod event;
pub mod event_generator;
pub mod name_generator;
pub mod payment_generator;
pub mod pipeline;
pub mod rng;
pub mod session_generator;
pub mod sink;
pub mod step;
pub mod subscription_generator;
pub mod types;
pub mod user_generator;
