use crate::resolution::ResolutionError;
use crate::wizard::WizardState;
use hutbook_common::error::BackendError;
use thiserror::Error;

/// Failures of one wizard pass.
///
/// Only [`WizardError::AvailabilityNotFound`] is retryable; everything else
/// points at a structural mismatch with the site and aborts the run.
#[derive(Debug, Error, Clone)]
pub enum WizardError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Step '{step}' did not advance: '{marker}' not seen within {waited_ms} ms")]
    StageDidNotAdvance {
        step: &'static str,
        marker: String,
        waited_ms: u64,
    },

    #[error("Step '{step}' is incomplete: '{control}' is disabled")]
    IncompleteStep { step: &'static str, control: String },

    #[error("Availability not found: {0}")]
    AvailabilityNotFound(String),

    #[error("Step '{step}' requires state {expected:?} but the wizard is at {actual:?}")]
    OutOfOrder {
        step: &'static str,
        expected: WizardState,
        actual: WizardState,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Fatal(String),
}

impl WizardError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, WizardError::AvailabilityNotFound(_))
    }

    /// Taxonomy name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            WizardError::Resolution(ResolutionError::NotFound { .. }) => "ElementNotFound",
            WizardError::Resolution(ResolutionError::Ambiguous { .. }) => "AmbiguousSelection",
            WizardError::Resolution(ResolutionError::ValueMismatch { .. }) => "ValueMismatch",
            WizardError::StageDidNotAdvance { .. } => "StageDidNotAdvance",
            WizardError::IncompleteStep { .. } => "IncompleteStep",
            WizardError::AvailabilityNotFound(_) => "AvailabilityNotFound",
            WizardError::Resolution(ResolutionError::Backend { .. })
            | WizardError::OutOfOrder { .. }
            | WizardError::Backend(_)
            | WizardError::Fatal(_) => "Fatal",
        }
    }
}
