//! Step trait and the in-memory dataset steps read from and write to.
//!
//! RULE: Every generation step implements Step.
//! A step reads only the tables it declares in requires(), and writes
//! only the table it declares in produces(). The pipeline checks the
//! declared dependencies against the registration order before running.

use crate::{
    config::PipelineConfig,
    error::{DatagenError, DatagenResult},
    event_generator::{generate_events, EventRecord},
    payment_generator::{generate_payments, PaymentRecord},
    rng::{GeneratorSlot, StreamRng},
    session_generator::{generate_sessions, SessionRecord},
    sink::{TableSink, WriteReport},
    subscription_generator::{generate_subscriptions, SubscriptionRecord},
    types::TableKind,
    user_generator::{generate_users, UserRecord},
};

/// The tables currently resident in memory.
#[derive(Debug, Default)]
pub struct Dataset {
    pub users:         Option<Vec<UserRecord>>,
    pub sessions:      Option<Vec<SessionRecord>>,
    pub events:        Option<Vec<EventRecord>>,
    pub subscriptions: Option<Vec<SubscriptionRecord>>,
    pub payments:      Option<Vec<PaymentRecord>>,
}

impl Dataset {
    pub fn users(&self) -> DatagenResult<&[UserRecord]> {
        self.users.as_deref().ok_or_else(|| missing(TableKind::Users))
    }

    pub fn sessions(&self) -> DatagenResult<&[SessionRecord]> {
        self.sessions.as_deref().ok_or_else(|| missing(TableKind::Sessions))
    }

    pub fn events(&self) -> DatagenResult<&[EventRecord]> {
        self.events.as_deref().ok_or_else(|| missing(TableKind::Events))
    }

    pub fn subscriptions(&self) -> DatagenResult<&[SubscriptionRecord]> {
        self.subscriptions.as_deref().ok_or_else(|| missing(TableKind::Subscriptions))
    }

    pub fn payments(&self) -> DatagenResult<&[PaymentRecord]> {
        self.payments.as_deref().ok_or_else(|| missing(TableKind::Payments))
    }

    pub fn is_resident(&self, table: TableKind) -> bool {
        self.row_count(table).is_some()
    }

    pub fn row_count(&self, table: TableKind) -> Option<usize> {
        match table {
            TableKind::Users         => self.users.as_ref().map(Vec::len),
            TableKind::Sessions      => self.sessions.as_ref().map(Vec::len),
            TableKind::Events        => self.events.as_ref().map(Vec::len),
            TableKind::Subscriptions => self.subscriptions.as_ref().map(Vec::len),
            TableKind::Payments      => self.payments.as_ref().map(Vec::len),
        }
    }

    /// Drop a table once nothing downstream needs it.
    pub fn release(&mut self, table: TableKind) {
        match table {
            TableKind::Users         => self.users = None,
            TableKind::Sessions      => self.sessions = None,
            TableKind::Events        => self.events = None,
            TableKind::Subscriptions => self.subscriptions = None,
            TableKind::Payments      => self.payments = None,
        }
    }

    /// Hand a resident table to `sink`.
    pub fn persist<S: TableSink>(&self, table: TableKind, sink: &mut S) -> DatagenResult<WriteReport> {
        match table {
            TableKind::Users         => sink.write_table(self.users()?),
            TableKind::Sessions      => sink.write_table(self.sessions()?),
            TableKind::Events        => sink.write_table(self.events()?),
            TableKind::Subscriptions => sink.write_table(self.subscriptions()?),
            TableKind::Payments      => sink.write_table(self.payments()?),
        }
    }
}

fn missing(table: TableKind) -> DatagenError {
    DatagenError::MissingTable { table }
}

/// The contract every generation step must fulfill.
pub trait Step {
    /// Unique stable name for this step.
    fn name(&self) -> &'static str;

    /// The table this step materializes.
    fn produces(&self) -> TableKind;

    /// Tables that must already be resident when this step runs.
    fn requires(&self) -> &'static [TableKind];

    /// RNG stream this step draws from.
    fn slot(&self) -> GeneratorSlot;

    /// Generate the table into `dataset`. Returns the row count.
    fn execute(
        &self,
        dataset: &mut Dataset,
        config: &PipelineConfig,
        rng: &mut StreamRng,
    ) -> DatagenResult<usize>;
}

// ── Built-in steps ───────────────────────────────────────────────

pub struct UsersStep;

impl Step for UsersStep {
    fn name(&self) -> &'static str { "users" }
    fn produces(&self) -> TableKind { TableKind::Users }
    fn requires(&self) -> &'static [TableKind] { &[] }
    fn slot(&self) -> GeneratorSlot { GeneratorSlot::Users }

    fn execute(
        &self,
        dataset: &mut Dataset,
        config: &PipelineConfig,
        rng: &mut StreamRng,
    ) -> DatagenResult<usize> {
        let users = generate_users(
            config.users.count,
            config.start_date,
            config.end_date,
            &config.users,
            rng,
        )?;
        let n = users.len();
        dataset.users = Some(users);
        Ok(n)
    }
}

pub struct SessionsStep;

impl Step for SessionsStep {
    fn name(&self) -> &'static str { "sessions" }
    fn produces(&self) -> TableKind { TableKind::Sessions }
    fn requires(&self) -> &'static [TableKind] { &[TableKind::Users] }
    fn slot(&self) -> GeneratorSlot { GeneratorSlot::Sessions }

    fn execute(
        &self,
        dataset: &mut Dataset,
        config: &PipelineConfig,
        rng: &mut StreamRng,
    ) -> DatagenResult<usize> {
        let sessions = generate_sessions(dataset.users()?, config.end_date, &config.sessions, rng)?;
        let n = sessions.len();
        dataset.sessions = Some(sessions);
        Ok(n)
    }
}

pub struct EventsStep;

impl Step for EventsStep {
    fn name(&self) -> &'static str { "events" }
    fn produces(&self) -> TableKind { TableKind::Events }
    fn requires(&self) -> &'static [TableKind] { &[TableKind::Sessions] }
    fn slot(&self) -> GeneratorSlot { GeneratorSlot::Events }

    fn execute(
        &self,
        dataset: &mut Dataset,
        config: &PipelineConfig,
        rng: &mut StreamRng,
    ) -> DatagenResult<usize> {
        let events = generate_events(dataset.sessions()?, &config.events, rng)?;
        let n = events.len();
        dataset.events = Some(events);
        Ok(n)
    }
}

pub struct SubscriptionsStep;

impl Step for SubscriptionsStep {
    fn name(&self) -> &'static str { "subscriptions" }
    fn produces(&self) -> TableKind { TableKind::Subscriptions }
    fn requires(&self) -> &'static [TableKind] { &[TableKind::Users] }
    fn slot(&self) -> GeneratorSlot { GeneratorSlot::Subscriptions }

    fn execute(
        &self,
        dataset: &mut Dataset,
        config: &PipelineConfig,
        rng: &mut StreamRng,
    ) -> DatagenResult<usize> {
        let subscriptions =
            generate_subscriptions(dataset.users()?, config.end_date, &config.subscriptions, rng)?;
        let n = subscriptions.len();
        dataset.subscriptions = Some(subscriptions);
        Ok(n)
    }
}

pub struct PaymentsStep;

impl Step for PaymentsStep {
    fn name(&self) -> &'static str { "payments" }
    fn produces(&self) -> TableKind { TableKind::Payments }
    fn requires(&self) -> &'static [TableKind] { &[TableKind::Subscriptions] }
    fn slot(&self) -> GeneratorSlot { GeneratorSlot::Payments }

    fn execute(
        &self,
        dataset: &mut Dataset,
        config: &PipelineConfig,
        rng: &mut StreamRng,
    ) -> DatagenResult<usize> {
        let payments = generate_payments(
            dataset.subscriptions()?,
            config.end_date,
            &config.subscriptions,
            &config.payments,
            rng,
        )?;
        let n = payments.len();
        dataset.payments = Some(payments);
        Ok(n)
    }
}
