use serde::Serialize;
use std::fmt;

/// Position of an attempt in the booking wizard. Transitions only move
/// forward, one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum WizardState {
    LoggedOut,
    ReservationList,
    HutChosen,
    WizardReady,
    DatesSelected,
    PartySizeSet,
    AvailabilityResolved,
    OvernightFilled,
    PersonalFilled,
    SummaryReady,
    Submitted,
}

impl WizardState {
    pub const ALL: [WizardState; 11] = [
        WizardState::LoggedOut,
        WizardState::ReservationList,
        WizardState::HutChosen,
        WizardState::WizardReady,
        WizardState::DatesSelected,
        WizardState::PartySizeSet,
        WizardState::AvailabilityResolved,
        WizardState::OvernightFilled,
        WizardState::PersonalFilled,
        WizardState::SummaryReady,
        WizardState::Submitted,
    ];

    pub fn next(self) -> Option<WizardState> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == WizardState::Submitted
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_form_a_single_chain() {
        let mut state = WizardState::LoggedOut;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            visited.push(next);
            state = next;
        }
        assert_eq!(visited, WizardState::ALL.to_vec());
        assert!(state.is_terminal());
    }
}
