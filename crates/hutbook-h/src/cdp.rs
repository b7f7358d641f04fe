use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Overrides the Chromium executable.
pub const CHROME_BIN_VAR: &str = "CHROME_BIN";
/// Keeps the browser profile (and its cookies) in a fixed directory.
pub const USER_DATA_DIR_VAR: &str = "HUTBOOK_USER_DATA_DIR";

const WINDOW_SIZE: (u32, u32) = (1366, 900);

type CdpError = Box<dyn std::error::Error + Send + Sync>;

/// One Chromium process with a single page.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(visible: bool) -> Result<Self, CdpError> {
        let mut config_builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1);
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if visible {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Ok(chrome_bin) = std::env::var(CHROME_BIN_VAR) {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let (browser, mut handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        let mut console_events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;
        tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let args: Vec<String> = event
                    .args
                    .iter()
                    .map(|arg| arg.description.clone().unwrap_or_default())
                    .collect();
                tracing::debug!("Browser console [{:?}]: {}", event.r#type, args.join(" "));
            }
        });

        // The reservation site uses confirm() before leaving a half-filled
        // wizard; dialogs block script evaluation until answered.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;
        let dialog_page = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!("Accepting dialog: {} ({:?})", event.message, event.r#type);
                if let Err(e) = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                {
                    tracing::warn!("Failed to accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), CdpError> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if self.cleanup_user_data_dir
            && let Some(dir) = &self.user_data_dir
            && let Err(e) = std::fs::remove_dir_all(dir)
        {
            tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
        }
        Ok(())
    }
}

/// `HUTBOOK_USER_DATA_DIR` if set; otherwise a fresh temporary profile that
/// is removed on close.
fn resolve_user_data_dir() -> Result<(PathBuf, bool), CdpError> {
    if let Ok(dir) = std::env::var(USER_DATA_DIR_VAR) {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!("Using browser profile {}", path.display());
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let unique = format!("hutbook-chromium-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::debug!("Using isolated browser profile {}", path.display());
    Ok((path, true))
}
