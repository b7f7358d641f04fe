pub mod loader;
pub mod request_file;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use request_file::{RequestLoader, RetryOverrides, ValidationError};
pub use schema::{EngineConfig, ScreenshotConfig, SiteConfig, Timeouts};
