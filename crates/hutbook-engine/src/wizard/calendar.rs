//! Date formats and month navigation of the site's date picker.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Upper bound on month-stepper clicks for one target date.
pub const MAX_MONTH_STEPS: u32 = 24;

const UI_DATE_FORMAT: &str = "%d.%m.%Y";

static NUMERIC_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s*/\s*(\d{4})$").expect("valid regex"));

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}\.\d{2}\.\d{4})\D+(\d{2}\.\d{2}\.\d{4})").expect("valid regex")
});

const MONTH_NAMES: &[(&str, u32)] = &[
    // it
    ("gennaio", 1),
    ("febbraio", 2),
    ("marzo", 3),
    ("aprile", 4),
    ("maggio", 5),
    ("giugno", 6),
    ("luglio", 7),
    ("agosto", 8),
    ("settembre", 9),
    ("ottobre", 10),
    ("novembre", 11),
    ("dicembre", 12),
    // en
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    // de
    ("januar", 1),
    ("februar", 2),
    ("märz", 3),
    ("mai", 5),
    ("juni", 6),
    ("juli", 7),
    ("oktober", 10),
    ("dezember", 12),
    // fr
    ("janvier", 1),
    ("février", 2),
    ("mars", 3),
    ("avril", 4),
    ("juin", 6),
    ("juillet", 7),
    ("août", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("décembre", 12),
];

/// `2026-02-01` is shown as `01.02.2026`.
pub fn format_ui_date(date: NaiveDate) -> String {
    date.format(UI_DATE_FORMAT).to_string()
}

pub fn parse_ui_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), UI_DATE_FORMAT).ok()
}

/// A (year, month) pair as displayed by the picker header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarPeriod {
    pub year: i32,
    pub month: u32,
}

impl CalendarPeriod {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    fn index(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

/// Month name or abbreviation in any of the site's languages.
fn month_from_name(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.');
    if let Some((_, month)) = MONTH_NAMES.iter().find(|(name, _)| *name == token) {
        return Some(*month);
    }
    if token.chars().count() < 3 {
        return None;
    }
    let mut found = MONTH_NAMES
        .iter()
        .filter(|(name, _)| name.starts_with(token))
        .map(|(_, month)| *month);
    let first = found.next()?;
    found.all(|m| m == first).then_some(first)
}

/// Parse the picker header: `02/2026`, `febbraio 2026`, `FEB 2026`, `März 2026`.
pub fn parse_calendar_period(text: &str) -> Option<CalendarPeriod> {
    let value = text.trim().to_lowercase();

    if let Some(caps) = NUMERIC_PERIOD.captures(&value) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return (1..=12).contains(&month).then(|| CalendarPeriod::new(year, month));
    }

    let parts: Vec<&str> = value.split_whitespace().collect();
    if let [name, year] = parts.as_slice() {
        let year: i32 = year.parse().ok()?;
        return month_from_name(name).map(|month| CalendarPeriod::new(year, month));
    }
    None
}

/// Clicks needed to move the picker from `current` to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthStep {
    Stay,
    Forward(u32),
    Backward(u32),
}

pub fn month_steps(current: CalendarPeriod, target: CalendarPeriod) -> MonthStep {
    let delta = target.index() - current.index();
    match delta {
        0 => MonthStep::Stay,
        d if d > 0 => MonthStep::Forward(d as u32),
        d => MonthStep::Backward(d.unsigned_abs() as u32),
    }
}

/// The first two `dd.mm.yyyy` dates of a rendered range such as
/// `01.02.2026 - 03.02.2026`.
pub fn parse_date_range(text: &str) -> Option<(NaiveDate, NaiveDate)> {
    let caps = DATE_RANGE.captures(text)?;
    Some((parse_ui_date(&caps[1])?, parse_ui_date(&caps[2])?))
}
