pub mod availability;
pub mod calendar;
pub mod driver;
pub mod selectors;
pub mod state;

pub use availability::{AvailabilityDecision, AvailabilityFacts, AvailabilityPolicy};
pub use driver::WizardStepDriver;
pub use state::WizardState;
