use async_trait::async_trait;
pub use hutbook_common::error::BackendError;
use hutbook_common::protocol::{ProbeAction, ProbeResponse};

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
    pub status: u16, // generic status code (e.g. 200)
}

/// The Backend trait is the browser automation surface every driver implements.
///
/// One backend drives one page. Callers never issue overlapping operations:
/// every method is awaited before the next one starts.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, connect to WebDriver, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// URL of the page currently loaded.
    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Execute one page probe command.
    async fn execute_probe(&mut self, command: ProbeAction)
    -> Result<ProbeResponse, BackendError>;

    /// Capture a screenshot of the whole page.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError>;

    /// Press a key on the focused element ("Escape", "Tab", ...).
    async fn press_key(&mut self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("press_key".into()))
    }
}

/// Produces a fresh, not yet launched backend for every booking attempt.
pub trait BackendFactory: Send + Sync {
    type Output: Backend;

    fn create(&self) -> Self::Output;
}

impl<F, B> BackendFactory for F
where
    F: Fn() -> B + Send + Sync,
    B: Backend,
{
    type Output = B;

    fn create(&self) -> B {
        self()
    }
}
