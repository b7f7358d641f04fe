use crate::cdp::CdpClient;
use crate::inject::run_probe;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::page::ScreenshotParams;
use hutbook_engine::backend::{Backend, BackendError, NavigationResult};
use hutbook_engine::protocol::{ProbeAction, ProbeResponse};
use tracing::{debug, info};

/// Chromium controlled through the DevTools protocol.
pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    /// `visible` opens a headed window, useful when watching a run.
    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
        }
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    async fn navigation_result(
        page: &chromiumoxide::Page,
    ) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// DOM `code` and Windows virtual key code for the keys the wizard presses.
fn key_codes(key: &str) -> Option<(&'static str, i64)> {
    match key {
        "Escape" => Some(("Escape", 27)),
        "Tab" => Some(("Tab", 9)),
        "Enter" => Some(("Enter", 13)),
        _ => None,
    }
}

fn key_event(
    kind: DispatchKeyEventType,
    key: &str,
) -> Result<DispatchKeyEventParams, BackendError> {
    let mut builder = DispatchKeyEventParams::builder().r#type(kind).key(key);
    if let Some((code, vk)) = key_codes(key) {
        builder = builder.code(code).windows_virtual_key_code(vk);
    }
    builder
        .build()
        .map_err(|e| BackendError::Other(format!("Failed to build key event: {:?}", e)))
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching headless backend (Chromium)");
        let client = CdpClient::launch(self.visible)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;

        info!("Navigating to {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::navigation_result(&client.page).await
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        client
            .page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| BackendError::Navigation(e.to_string()))
    }

    async fn execute_probe(
        &mut self,
        command: ProbeAction,
    ) -> Result<ProbeResponse, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        debug!("probe {}", command.name());

        let value = serde_json::to_value(&command)?;
        let reply = run_probe(&client.page, value)
            .await
            .map_err(|e| BackendError::Probe(e.to_string()))?;

        Ok(serde_json::from_value(reply)?)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        client
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| BackendError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;

        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let event = key_event(kind, key)?;
            client
                .page
                .execute(event)
                .await
                .map_err(|e| BackendError::Other(format!("press_key({}) failed: {}", key, e)))?;
        }
        Ok(())
    }
}
