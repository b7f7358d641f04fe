//! What to do when the availability step cannot proceed.

use crate::request::BookingRequest;

/// Decision rounds before the step gives up.
pub const MAX_ROUNDS: usize = 4;

/// Secondary "proceed" clicks allowed while waiting for the step outcome.
pub const MAX_SECONDARY_CLICKS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityPolicy {
    pub allow_waitlist: bool,
    pub allow_alternative_dates: bool,
}

/// What the driver observed on the availability step, plus what it already
/// tried in earlier rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityFacts {
    pub proceed_enabled: bool,
    pub waitlist_present: bool,
    pub waitlist_tried: bool,
    pub alternative_tried: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityDecision {
    Proceed,
    JoinWaitlist,
    AcceptAlternative,
    Unavailable(String),
}

impl AvailabilityPolicy {
    pub fn for_request(request: &BookingRequest) -> Self {
        Self {
            allow_waitlist: request.retry.allow_waitlist,
            allow_alternative_dates: request.retry.allow_alternative_dates,
        }
    }

    pub fn decide(&self, facts: &AvailabilityFacts) -> AvailabilityDecision {
        if facts.proceed_enabled {
            return AvailabilityDecision::Proceed;
        }
        if facts.waitlist_present && self.allow_waitlist && !facts.waitlist_tried {
            return AvailabilityDecision::JoinWaitlist;
        }
        if self.allow_alternative_dates && !facts.alternative_tried {
            return AvailabilityDecision::AcceptAlternative;
        }

        let reason = if facts.alternative_tried || facts.waitlist_tried {
            "availability check is still disabled after trying the offered alternatives"
        } else if self.allow_alternative_dates || self.allow_waitlist {
            "requested dates not available and no alternative was offered"
        } else {
            "requested dates not available; set allow_alternative_dates or allow_waitlist to continue"
        };
        AvailabilityDecision::Unavailable(reason.to_string())
    }
}

/// Snapshot of the controls watched after a proceed click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSignals {
    /// A marker of the following step is visible.
    pub next_step_visible: bool,
    /// Primary proceed control: `None` when absent, else whether it is enabled.
    pub primary: Option<bool>,
    /// Secondary proceed control: `None` when absent, else whether it is enabled.
    pub secondary: Option<bool>,
}

/// Clicks made so far while waiting for the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollProgress {
    pub primary_clicked: bool,
    pub secondary_clicks: u32,
    /// The secondary control may be used before the primary was clicked
    /// (it then offers alternative dates).
    pub secondary_allowed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    Advanced,
    ClickPrimary,
    ClickSecondary,
    StillDisabled,
    Pending,
}

pub fn classify(signals: &PageSignals, progress: &PollProgress) -> PollVerdict {
    if signals.next_step_visible {
        return PollVerdict::Advanced;
    }
    let may_click_secondary = (progress.primary_clicked || progress.secondary_allowed)
        && progress.secondary_clicks < MAX_SECONDARY_CLICKS;
    if signals.secondary == Some(true) && may_click_secondary {
        return PollVerdict::ClickSecondary;
    }
    match signals.primary {
        Some(true) if !progress.primary_clicked => PollVerdict::ClickPrimary,
        Some(false) => PollVerdict::StillDisabled,
        _ => PollVerdict::Pending,
    }
}
