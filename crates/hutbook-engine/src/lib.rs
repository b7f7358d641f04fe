pub mod attempt;
pub mod backend;
pub mod config;
pub mod credentials;
pub mod error;
pub mod request;
pub mod resolution;
pub mod schedule;
pub mod screenshots;
pub mod wizard;

pub use hutbook_common::protocol;
