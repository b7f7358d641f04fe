//! Loading and validating booking request files.
//!
//! A file holds either one request mapping or a `requests:` sequence of them.
//! Every request is validated into an immutable [`BookingRequest`]; the first
//! violation is reported with the offending key.

use crate::request::{
    BookingRequest, Contact, LoginProvider, Preferences, RetryPolicy, RoomType, StayDetails,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Failed to read request file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse request file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{source_label}: no booking requests found")]
    Empty { source_label: String },
    #[error("{source_label}: {key} is required and must be {expected}")]
    Missing {
        source_label: String,
        key: String,
        expected: &'static str,
    },
    #[error("{source_label}: {key} {reason}")]
    Invalid {
        source_label: String,
        key: String,
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequestDocument {
    Many { requests: Vec<RawRequest> },
    One(Box<RawRequest>),
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawRequest {
    login_provider: Option<String>,
    hut_name: Option<String>,
    check_in: Option<String>,
    check_out: Option<String>,
    party_size: Option<i64>,
    contact: Option<RawContact>,
    preferences: Option<RawPreferences>,
    half_board: Option<bool>,
    allow_alternative_dates: Option<bool>,
    children_count: Option<i64>,
    guides_count: Option<i64>,
    vegetarian_count: Option<i64>,
    lunch_packages: Option<i64>,
    group_name: Option<String>,
    access_to_hut: Option<String>,
    allergies: Option<String>,
    comments: Option<String>,
    accept_terms: Option<bool>,
    #[serde(default)]
    retry: RawRetry,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawContact {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address_line1: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawPreferences {
    room_type: Option<String>,
    remarks: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawRetry {
    poll_interval_seconds: Option<i64>,
    jitter_seconds: Option<i64>,
    max_attempts: Option<i64>,
    allow_alternative_dates: Option<bool>,
    allow_waitlist: Option<bool>,
    auto_poll_if_full: Option<bool>,
}

/// Command-line overrides applied to every loaded request before validation.
#[derive(Debug, Clone, Default)]
pub struct RetryOverrides {
    /// Force polling on for every request.
    pub poll: bool,
    pub interval_seconds: Option<i64>,
    pub jitter_seconds: Option<i64>,
    pub max_attempts: Option<i64>,
    pub allow_alternative_dates: bool,
    pub allow_waitlist: bool,
}

impl RetryOverrides {
    fn apply(&self, retry: &mut RawRetry) {
        if self.poll {
            retry.auto_poll_if_full = Some(true);
        }
        if let Some(v) = self.interval_seconds {
            retry.poll_interval_seconds = Some(v);
        }
        if let Some(v) = self.jitter_seconds {
            retry.jitter_seconds = Some(v);
        }
        if let Some(v) = self.max_attempts {
            retry.max_attempts = Some(v);
        }
        if self.allow_alternative_dates {
            retry.allow_alternative_dates = Some(true);
        }
        if self.allow_waitlist {
            retry.allow_waitlist = Some(true);
        }
    }
}

pub struct RequestLoader;

impl RequestLoader {
    pub async fn load_from(
        path: &Path,
        overrides: &RetryOverrides,
    ) -> Result<Vec<BookingRequest>, ValidationError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ValidationError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse_str(&content, &stem, overrides).map_err(|e| match e {
            ValidationError::Parse { source, .. } => ValidationError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate YAML text. `source_label` names the requests in errors
    /// and reports.
    pub fn parse_str(
        content: &str,
        source_label: &str,
        overrides: &RetryOverrides,
    ) -> Result<Vec<BookingRequest>, ValidationError> {
        let document: RequestDocument =
            serde_yaml::from_str(content).map_err(|source| ValidationError::Parse {
                path: PathBuf::from(source_label),
                source,
            })?;

        let raws: Vec<(String, RawRequest)> = match document {
            RequestDocument::One(raw) => vec![(source_label.to_string(), *raw)],
            RequestDocument::Many { requests } => requests
                .into_iter()
                .enumerate()
                .map(|(i, raw)| (format!("{}#{}", source_label, i + 1), raw))
                .collect(),
        };
        if raws.is_empty() {
            return Err(ValidationError::Empty {
                source_label: source_label.to_string(),
            });
        }

        raws.into_iter()
            .map(|(label, mut raw)| {
                overrides.apply(&mut raw.retry);
                Validator { label: &label }.request(raw, label.clone())
            })
            .collect()
    }
}

struct Validator<'a> {
    label: &'a str,
}

impl Validator<'_> {
    fn missing(&self, key: &str, expected: &'static str) -> ValidationError {
        ValidationError::Missing {
            source_label: self.label.to_string(),
            key: key.to_string(),
            expected,
        }
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> ValidationError {
        ValidationError::Invalid {
            source_label: self.label.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn require_str(&self, value: Option<String>, key: &str) -> Result<String, ValidationError> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| self.missing(key, "a non-empty string"))
    }

    fn optional_str(&self, value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn optional_count(&self, value: Option<i64>, key: &str) -> Result<u32, ValidationError> {
        match value {
            None => Ok(0),
            Some(v) if v < 0 => Err(self.invalid(key, "must be >= 0")),
            Some(v) => u32::try_from(v).map_err(|_| self.invalid(key, "is too large")),
        }
    }

    fn date(&self, value: Option<String>, key: &str) -> Result<NaiveDate, ValidationError> {
        let raw = self.require_str(value, key)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| self.invalid(key, "must be in YYYY-MM-DD format"))
    }

    fn request(&self, raw: RawRequest, label: String) -> Result<BookingRequest, ValidationError> {
        let provider = self
            .require_str(raw.login_provider, "config.login_provider")?
            .to_lowercase();
        let login_provider = match provider.as_str() {
            "default" => LoginProvider::Default,
            "sac" => LoginProvider::Sac,
            _ => {
                return Err(self.invalid("config.login_provider", "must be 'default' or 'sac'"));
            }
        };

        let hut_name = self.require_str(raw.hut_name, "config.hut_name")?;
        let check_in = self.date(raw.check_in, "config.check_in")?;
        let check_out = self.date(raw.check_out, "config.check_out")?;
        if check_out <= check_in {
            return Err(self.invalid("config.check_out", "must be after check_in"));
        }

        let party_size = match raw.party_size {
            None => return Err(self.missing("config.party_size", "an integer")),
            Some(v) if v <= 0 => return Err(self.invalid("config.party_size", "must be >= 1")),
            Some(v) => u32::try_from(v).map_err(|_| self.invalid("config.party_size", "is too large"))?,
        };

        let contact = self.contact(raw.contact)?;

        let preferences = raw.preferences.unwrap_or_default();
        let preferences = Preferences {
            room_type: self
                .optional_str(preferences.room_type)
                .map(|v| RoomType::parse(&v)),
            remarks: self.optional_str(preferences.remarks),
        };

        let half_board = raw
            .half_board
            .ok_or_else(|| self.missing("config.half_board", "a boolean"))?;

        let stay = StayDetails {
            children_count: self.optional_count(raw.children_count, "config.children_count")?,
            guides_count: self.optional_count(raw.guides_count, "config.guides_count")?,
            vegetarian_count: self
                .optional_count(raw.vegetarian_count, "config.vegetarian_count")?,
            lunch_packages: self.optional_count(raw.lunch_packages, "config.lunch_packages")?,
            group_name: self.optional_str(raw.group_name),
            access_to_hut: self.optional_str(raw.access_to_hut),
            allergies: self.optional_str(raw.allergies),
            comments: self.optional_str(raw.comments),
        };

        match raw.accept_terms {
            None => return Err(self.missing("config.accept_terms", "true")),
            Some(false) => {
                return Err(self.invalid("config.accept_terms", "must be true to proceed"));
            }
            Some(true) => {}
        }

        let retry = self.retry(raw.retry, raw.allow_alternative_dates)?;

        Ok(BookingRequest {
            label,
            login_provider,
            hut_name,
            check_in,
            check_out,
            party_size,
            preferences,
            contact,
            half_board,
            stay,
            accept_terms: true,
            retry,
        })
    }

    fn contact(&self, raw: Option<RawContact>) -> Result<Contact, ValidationError> {
        let raw = raw.ok_or_else(|| self.missing("config.contact", "a mapping"))?;
        Ok(Contact {
            first_name: self.require_str(raw.first_name, "contact.first_name")?,
            last_name: self.require_str(raw.last_name, "contact.last_name")?,
            email: self.require_str(raw.email, "contact.email")?,
            phone: self.require_str(raw.phone, "contact.phone")?,
            address_line1: self.require_str(raw.address_line1, "contact.address_line1")?,
            city: self.require_str(raw.city, "contact.city")?,
            postal_code: self.require_str(raw.postal_code, "contact.postal_code")?,
            country: self.require_str(raw.country, "contact.country")?,
        })
    }

    fn retry(
        &self,
        raw: RawRetry,
        legacy_alternative_dates: Option<bool>,
    ) -> Result<RetryPolicy, ValidationError> {
        let defaults = RetryPolicy::default();

        let poll_interval_seconds = match raw.poll_interval_seconds {
            None => defaults.poll_interval_seconds,
            Some(v) if v <= 0 => {
                return Err(self.invalid("retry.poll_interval_seconds", "must be > 0"));
            }
            Some(v) => v as u64,
        };
        let jitter_seconds = match raw.jitter_seconds {
            None => defaults.jitter_seconds,
            Some(v) if v < 0 => return Err(self.invalid("retry.jitter_seconds", "must be >= 0")),
            Some(v) => v as u64,
        };
        let max_attempts = match raw.max_attempts {
            None => defaults.max_attempts,
            Some(v) if v < 0 => return Err(self.invalid("retry.max_attempts", "must be >= 0")),
            Some(v) => u32::try_from(v)
                .map_err(|_| self.invalid("retry.max_attempts", "is too large"))?,
        };

        Ok(RetryPolicy {
            poll_interval_seconds,
            jitter_seconds,
            max_attempts,
            allow_alternative_dates: raw
                .allow_alternative_dates
                .or(legacy_alternative_dates)
                .unwrap_or(defaults.allow_alternative_dates),
            allow_waitlist: raw.allow_waitlist.unwrap_or(defaults.allow_waitlist),
            auto_poll_if_full: raw.auto_poll_if_full.unwrap_or(defaults.auto_poll_if_full),
        })
    }
}
