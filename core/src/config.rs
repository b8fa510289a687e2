use crate::error::{DatagenError, DatagenResult};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest mean (and spread) of a session duration: one week.
pub const MAX_SESSION_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Longest free trial: one year.
pub const MAX_TRIAL_DAYS: u32 = 365;

// ── Taxonomies ─────────────────────────────────────────────────────

/// A named option with a relative sampling weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedChoice {
    pub name: String,
    pub weight: f64,
}

impl WeightedChoice {
    pub fn new(name: &str, weight: f64) -> Self {
        Self { name: name.into(), weight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeConfig {
    pub name: String,
    pub weight: f64,
    /// Events of this type reference one of the tracked features.
    #[serde(default)]
    pub carries_feature: bool,
}

/// A subscription plan. Plans are listed in ascending tier order;
/// an upgrade always moves to the next entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub name: String,
    pub monthly_price: f64,
    /// Relative weight when choosing the plan a trial starts on.
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

impl std::str::FromStr for OutputFormat {
    type Err = DatagenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DatagenError::invalid_config(format!(
                "unknown output format '{other}' (expected csv or sqlite)"
            ))),
        }
    }
}

// ── Per-generator parameters ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub count: usize,
    pub channels: Vec<WeightedChoice>,
    pub email_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fraction of users that produce any sessions at all.
    pub active_user_rate: f64,
    pub per_active_user_mean: f64,
    pub per_active_user_std: f64,
    pub duration_minutes_mean: f64,
    pub duration_minutes_std: f64,
    pub devices: Vec<WeightedChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub per_session_mean: f64,
    pub per_session_std: f64,
    pub event_types: Vec<EventTypeConfig>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub plans: Vec<PlanConfig>,
    pub trial_days: u32,
    pub trial_conversion_rate: f64,
    pub monthly_churn_rate: f64,
    pub upgrade_probability: f64,
}

impl SubscriptionConfig {
    pub fn plan(&self, name: &str) -> Option<&PlanConfig> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// The plan one tier above `name`, if any.
    pub fn next_plan_after(&self, name: &str) -> Option<&PlanConfig> {
        let idx = self.plans.iter().position(|p| p.name == name)?;
        self.plans.get(idx + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub failure_rate: f64,
}

// ── Top level ──────────────────────────────────────────────────────

/// Every tunable of a run. Built once at startup and passed by reference
/// into each generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Master seed. None derives one from the wall clock at startup.
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub users: UserConfig,
    pub sessions: SessionConfig,
    pub events: EventConfig,
    pub subscriptions: SubscriptionConfig,
    pub payments: PaymentConfig,
}

impl PipelineConfig {
    /// Load from a JSON file. Fields missing from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Cannot parse {}", path.display()))?;
        Ok(config)
    }

    /// Reject parameter combinations the generators cannot honour.
    pub fn validate(&self) -> DatagenResult<()> {
        if self.end_date < self.start_date {
            return Err(DatagenError::invalid_config(format!(
                "end_date {} is before start_date {}",
                self.end_date, self.start_date
            )));
        }

        check_weights("users.channels", self.users.channels.iter().map(|c| c.weight))?;
        check_weights("sessions.devices", self.sessions.devices.iter().map(|d| d.weight))?;
        check_weights("events.event_types", self.events.event_types.iter().map(|e| e.weight))?;
        check_weights("subscriptions.plans", self.subscriptions.plans.iter().map(|p| p.weight))?;

        if self.users.email_domains.is_empty() {
            return Err(DatagenError::invalid_config("users.email_domains is empty"));
        }
        let feature_events = self.events.event_types.iter().any(|e| e.carries_feature);
        if feature_events && self.events.features.is_empty() {
            return Err(DatagenError::invalid_config(
                "events.features is empty but some event types carry a feature",
            ));
        }
        if let Some(p) = self.subscriptions.plans.iter().find(|p| p.monthly_price < 0.0) {
            return Err(DatagenError::invalid_config(format!(
                "plan '{}' has a negative monthly_price",
                p.name
            )));
        }

        check_probability("sessions.active_user_rate", self.sessions.active_user_rate)?;
        check_probability("subscriptions.trial_conversion_rate", self.subscriptions.trial_conversion_rate)?;
        check_probability("subscriptions.monthly_churn_rate", self.subscriptions.monthly_churn_rate)?;
        check_probability("subscriptions.upgrade_probability", self.subscriptions.upgrade_probability)?;
        check_probability("payments.failure_rate", self.payments.failure_rate)?;

        check_non_negative("sessions.per_active_user_mean", self.sessions.per_active_user_mean)?;
        check_non_negative("sessions.per_active_user_std", self.sessions.per_active_user_std)?;
        check_non_negative("sessions.duration_minutes_mean", self.sessions.duration_minutes_mean)?;
        check_non_negative("sessions.duration_minutes_std", self.sessions.duration_minutes_std)?;
        check_non_negative("events.per_session_mean", self.events.per_session_mean)?;
        check_non_negative("events.per_session_std", self.events.per_session_std)?;

        check_at_most("sessions.duration_minutes_mean", self.sessions.duration_minutes_mean, MAX_SESSION_MINUTES)?;
        check_at_most("sessions.duration_minutes_std", self.sessions.duration_minutes_std, MAX_SESSION_MINUTES)?;
        if self.subscriptions.trial_days > MAX_TRIAL_DAYS {
            return Err(DatagenError::invalid_config(format!(
                "subscriptions.trial_days must be at most {MAX_TRIAL_DAYS}, got {}",
                self.subscriptions.trial_days
            )));
        }
        Ok(())
    }

    /// Small, fast config with a fixed seed for use in tests.
    pub fn default_test() -> Self {
        Self {
            seed: Some(42),
            output_dir: PathBuf::from("target/test-output"),
            start_date: ymd(2024, 1, 1),
            end_date: ymd(2024, 12, 31),
            users: UserConfig {
                count: 200,
                ..UserConfig::default()
            },
            sessions: SessionConfig {
                per_active_user_mean: 6.0,
                per_active_user_std: 3.0,
                ..SessionConfig::default()
            },
            events: EventConfig {
                per_session_mean: 5.0,
                per_session_std: 2.0,
                ..EventConfig::default()
            },
            subscriptions: SubscriptionConfig {
                trial_conversion_rate: 0.5,
                monthly_churn_rate: 0.10,
                upgrade_probability: 0.10,
                ..SubscriptionConfig::default()
            },
            payments: PaymentConfig { failure_rate: 0.05 },
            ..Self::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            output_dir: PathBuf::from("data/raw"),
            output_format: OutputFormat::Csv,
            start_date: ymd(2023, 1, 1),
            end_date: ymd(2024, 12, 31),
            users: UserConfig::default(),
            sessions: SessionConfig::default(),
            events: EventConfig::default(),
            subscriptions: SubscriptionConfig::default(),
            payments: PaymentConfig::default(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            channels: vec![
                WeightedChoice::new("organic", 0.35),
                WeightedChoice::new("paid_search", 0.25),
                WeightedChoice::new("social", 0.20),
                WeightedChoice::new("referral", 0.12),
                WeightedChoice::new("email", 0.08),
            ],
            email_domains: vec![
                "example.com".into(),
                "mail.test".into(),
                "inbox.example".into(),
            ],
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active_user_rate: 0.80,
            per_active_user_mean: 15.0,
            per_active_user_std: 8.0,
            duration_minutes_mean: 12.0,
            duration_minutes_std: 6.0,
            devices: vec![
                WeightedChoice::new("desktop", 0.55),
                WeightedChoice::new("mobile", 0.35),
                WeightedChoice::new("tablet", 0.10),
            ],
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        let event_type = |name: &str, weight: f64, carries_feature: bool| EventTypeConfig {
            name: name.into(),
            weight,
            carries_feature,
        };
        Self {
            per_session_mean: 8.0,
            per_session_std: 4.0,
            event_types: vec![
                event_type("page_view", 0.35, false),
                event_type("feature_used", 0.25, true),
                event_type("button_click", 0.15, false),
                event_type("search", 0.08, false),
                event_type("settings_change", 0.05, false),
                event_type("export", 0.05, true),
                event_type("share", 0.04, true),
                event_type("error", 0.03, false),
            ],
            features: [
                "dashboard",
                "reports",
                "analytics",
                "integrations",
                "api",
                "alerts",
                "collaboration",
                "data_export",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            plans: vec![
                PlanConfig { name: "starter".into(),    monthly_price: 29.0,  weight: 0.50 },
                PlanConfig { name: "pro".into(),        monthly_price: 99.0,  weight: 0.35 },
                PlanConfig { name: "enterprise".into(), monthly_price: 299.0, weight: 0.15 },
            ],
            trial_days: 14,
            trial_conversion_rate: 0.25,
            monthly_churn_rate: 0.05,
            upgrade_probability: 0.08,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self { failure_rate: 0.03 }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("hardcoded calendar date is valid")
}

fn check_weights(field: &str, weights: impl Iterator<Item = f64>) -> DatagenResult<()> {
    let mut total = 0.0;
    let mut count = 0usize;
    for w in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(DatagenError::invalid_config(format!(
                "{field} contains an invalid weight {w}"
            )));
        }
        total += w;
        count += 1;
    }
    if count == 0 {
        return Err(DatagenError::invalid_config(format!("{field} is empty")));
    }
    if total <= 0.0 {
        return Err(DatagenError::invalid_config(format!("{field} weights sum to zero")));
    }
    Ok(())
}

fn check_probability(field: &str, p: f64) -> DatagenResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(DatagenError::invalid_config(format!(
            "{field} must be within [0, 1], got {p}"
        )));
    }
    Ok(())
}

fn check_non_negative(field: &str, v: f64) -> DatagenResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(DatagenError::invalid_config(format!(
            "{field} must be a non-negative number, got {v}"
        )));
    }
    Ok(())
}

fn check_at_most(field: &str, v: f64, max: f64) -> DatagenResult<()> {
    if v > max {
        return Err(DatagenError::invalid_config(format!(
            "{field} must be at most {max}, got {v}"
        )));
    }
    Ok(())
}
