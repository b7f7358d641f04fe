use crate::webdriver::{self, WebDriverClient};
use async_trait::async_trait;
use hutbook_engine::backend::{Backend, BackendError, NavigationResult};
use hutbook_engine::protocol::{ActionResult, ProbeAction, ProbeData, ProbeResponse};
use hutbook_probe::{PROBE_JS, PROBE_READY_CHECK};
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_PROBE_ATTEMPTS: u32 = 3;
const PROBE_RETRY_DELAY: Duration = Duration::from_millis(200);

const PROBE_CALL: &str = "return window.Hutbook.process(arguments[0]);";

const KEY_SCRIPT: &str = r#"
    const key = arguments[0];
    const target = document.activeElement || document.body;
    for (const type of ['keydown', 'keyup']) {
        target.dispatchEvent(new KeyboardEvent(type, { key: key, code: key, bubbles: true }));
    }
"#;

/// A browser driven through an external WebDriver server (chromedriver,
/// geckodriver, ...).
pub struct EmbeddedBackend {
    client: Option<WebDriverClient>,
    webdriver_url: String,
    headless: bool,
}

impl EmbeddedBackend {
    /// Connect to the WebDriver server at `webdriver_url`, headless.
    pub fn with_url(webdriver_url: String) -> Self {
        Self {
            client: None,
            webdriver_url,
            headless: true,
        }
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.headless = !visible;
        self
    }

    async fn get_navigation_result(
        client: &WebDriverClient,
    ) -> Result<NavigationResult, BackendError> {
        let title = client.client.title().await.unwrap_or_default();
        let url = client
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();

        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }
}

impl Default for EmbeddedBackend {
    fn default() -> Self {
        Self::with_url(webdriver::DEFAULT_WEBDRIVER_URL.to_string())
    }
}

/// A click that starts a navigation can tear the document down before the
/// probe answers; WebDriver then reports `null`.
fn navigation_reply(command: &ProbeAction) -> Option<ProbeResponse> {
    match command {
        ProbeAction::Click(_) => Some(ProbeResponse::Ok {
            data: Box::new(ProbeData::Action(ActionResult {
                success: true,
                message: Some("Page navigated during click".into()),
            })),
            warnings: vec!["Probe returned null, assuming navigation occurred".into()],
        }),
        _ => None,
    }
}

#[async_trait]
impl Backend for EmbeddedBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Connecting to WebDriver at {}", self.webdriver_url);
        let caps = webdriver::chrome_capabilities(self.headless);
        let client = WebDriverClient::connect(&self.webdriver_url, caps)
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

        info!("Navigating to: {}", url);
        client
            .client
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(client).await
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;
        client
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| BackendError::Navigation(e.to_string()))
    }

    async fn execute_probe(
        &mut self,
        command: ProbeAction,
    ) -> Result<ProbeResponse, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;
        let ready_check = format!("return {};", PROBE_READY_CHECK);
        let args = serde_json::to_value(&command)?;

        let mut last_error = None;
        for attempt in 1..=MAX_PROBE_ATTEMPTS {
            if attempt > 1 {
                warn!("Retrying probe {} (attempt {})", command.name(), attempt);
                tokio::time::sleep(PROBE_RETRY_DELAY).await;
            }

            let installed = match client.client.execute(&ready_check, vec![]).await {
                Ok(val) => val.as_bool().unwrap_or(false),
                Err(_) => false,
            };
            if !installed {
                debug!("Injecting page probe");
                if let Err(e) = client.client.execute(PROBE_JS, vec![]).await {
                    last_error = Some(BackendError::Probe(format!(
                        "Failed to inject probe: {}",
                        e
                    )));
                    continue;
                }
            }

            match client.client.execute(PROBE_CALL, vec![args.clone()]).await {
                Ok(reply) if reply.is_null() => {
                    if let Some(response) = navigation_reply(&command) {
                        info!("Probe returned null after {}", command.name());
                        return Ok(response);
                    }
                    last_error = Some(BackendError::Probe("Probe returned null".into()));
                }
                Ok(reply) => match serde_json::from_value::<ProbeResponse>(reply) {
                    Ok(response) => return Ok(response),
                    Err(e) => {
                        last_error = Some(BackendError::Serialization(e.to_string()));
                    }
                },
                Err(e) => {
                    let err_msg = e.to_string();
                    if err_msg.contains("Hutbook is not defined")
                        || err_msg.contains("undefined is not an object")
                    {
                        last_error = Some(BackendError::Probe(err_msg));
                        continue;
                    }
                    return Err(BackendError::Probe(err_msg));
                }
            }
        }

        Err(last_error.unwrap_or(BackendError::Probe("Failed after maximum retries".into())))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;
        client
            .client
            .screenshot()
            .await
            .map_err(|e| BackendError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;
        client
            .client
            .execute(KEY_SCRIPT, vec![serde_json::Value::from(key)])
            .await
            .map_err(|e| BackendError::Other(format!("press_key failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hutbook_engine::protocol::{ClickRequest, InteractionMode, QueryRequest};

    #[test]
    fn null_reply_counts_as_success_only_for_clicks() {
        let click = ProbeAction::Click(ClickRequest {
            id: 3,
            mode: InteractionMode::Plain,
        });
        assert!(matches!(
            navigation_reply(&click),
            Some(ProbeResponse::Ok { .. })
        ));

        let query = ProbeAction::Query(QueryRequest {
            css: "button".into(),
            scope: None,
        });
        assert!(navigation_reply(&query).is_none());
    }

    #[tokio::test]
    async fn unlaunched_backend_is_not_ready() {
        let mut backend = EmbeddedBackend::default();
        assert!(!backend.is_ready().await);
        assert!(matches!(
            backend.screenshot().await,
            Err(BackendError::NotReady)
        ));
    }
}
