//! Validated booking requests.
//!
//! A [`BookingRequest`] is only ever produced by
//! [`crate::config::request_file::RequestLoader`], which enforces the
//! invariants below; the engine treats it as immutable input:
//!
//! - `check_out` is strictly after `check_in`
//! - every contact field is non-empty
//! - `accept_terms` is `true`
//! - `retry.poll_interval_seconds > 0`

use crate::schedule::ScheduleConfig;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginProvider {
    /// Username/password form of the reservation site itself.
    Default,
    /// Single sign-on through the Swiss Alpine Club portal.
    Sac,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Dorm,
    Private,
    /// Any other room vocabulary, matched literally.
    Other(String),
}

const DORM_KEYWORDS: &[&str] = &[
    "dorm",
    "dormitorio",
    "dortoir",
    "dormitory",
    "schlafsaal",
    "lager",
];

const PRIVATE_KEYWORDS: &[&str] = &["priv", "zimmer", "private", "chambre", "room", "camera"];

impl RoomType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "dorm" | "dormitory" => RoomType::Dorm,
            "private" | "room" => RoomType::Private,
            _ => RoomType::Other(value.trim().to_string()),
        }
    }

    /// Words that identify this room type's counter field, in any of the
    /// site's languages.
    pub fn keywords(&self) -> Vec<String> {
        match self {
            RoomType::Dorm => DORM_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            RoomType::Private => PRIVATE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            RoomType::Other(word) => vec![word.clone()],
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Dorm => write!(f, "dorm"),
            RoomType::Private => write!(f, "private"),
            RoomType::Other(word) => write!(f, "{}", word),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub room_type: Option<RoomType>,
    pub remarks: Option<String>,
}

/// Details of the overnight stay page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StayDetails {
    pub children_count: u32,
    pub guides_count: u32,
    pub vegetarian_count: u32,
    pub lunch_packages: u32,
    pub group_name: Option<String>,
    pub access_to_hut: Option<String>,
    pub allergies: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    pub poll_interval_seconds: u64,
    pub jitter_seconds: u64,
    /// 0 means unbounded.
    pub max_attempts: u32,
    pub allow_alternative_dates: bool,
    pub allow_waitlist: bool,
    pub auto_poll_if_full: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 300,
            jitter_seconds: 30,
            max_attempts: 0,
            allow_alternative_dates: false,
            allow_waitlist: false,
            auto_poll_if_full: false,
        }
    }
}

impl RetryPolicy {
    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            interval: Duration::from_secs(self.poll_interval_seconds),
            jitter: Duration::from_secs(self.jitter_seconds),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    /// Where the request came from (file name, list index); used in reports.
    pub label: String,
    pub login_provider: LoginProvider,
    pub hut_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub party_size: u32,
    pub preferences: Preferences,
    pub contact: Contact,
    pub half_board: bool,
    pub stay: StayDetails,
    pub accept_terms: bool,
    pub retry: RetryPolicy,
}

impl BookingRequest {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn schedule(&self) -> ScheduleConfig {
        self.retry.schedule()
    }

    /// Whether an unavailable outcome is retried on the polling schedule.
    pub fn polls(&self) -> bool {
        self.retry.auto_poll_if_full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_type_vocabulary() {
        assert_eq!(RoomType::parse("Dorm"), RoomType::Dorm);
        assert_eq!(RoomType::parse(" private "), RoomType::Private);
        assert_eq!(RoomType::parse("Suite"), RoomType::Other("Suite".into()));
        assert!(RoomType::Dorm.keywords().contains(&"lager".to_string()));
        assert_eq!(RoomType::Other("Suite".into()).keywords(), vec!["Suite"]);
    }

    #[test]
    fn retry_policy_maps_to_schedule() {
        let policy = RetryPolicy {
            poll_interval_seconds: 120,
            jitter_seconds: 0,
            max_attempts: 4,
            ..RetryPolicy::default()
        };
        let schedule = policy.schedule();
        assert_eq!(schedule.interval, Duration::from_secs(120));
        assert_eq!(schedule.jitter, Duration::ZERO);
        assert_eq!(schedule.max_attempts, 4);
    }
}
