//! Locating unstable page controls.
//!
//! Each logical field is described by an [`ElementQuery`]: an ordered list of
//! strategies evaluated by one generic [`ElementResolver`]. Resolution never
//! guesses between equally good candidates.

pub mod matching;
pub mod query;
pub mod resolver;
pub mod result;

pub use query::{ElementQuery, Strategy, TextField};
pub use resolver::ElementResolver;
pub use result::{FillOutcome, Resolution, ResolutionError, ResolvedElement};
