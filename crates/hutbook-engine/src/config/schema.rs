use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub screenshots: ScreenshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_list_path")]
    pub list_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            list_path: default_list_path(),
        }
    }
}

impl SiteConfig {
    pub fn login_url(&self) -> String {
        join_url(&self.base_url, &self.login_path)
    }

    pub fn list_url(&self) -> String {
        join_url(&self.base_url, &self.list_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn default_base_url() -> String {
    "https://www.hut-reservation.org".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_list_path() -> String {
    "/reservation/list".to_string()
}

/// Bounded waits used by the resolver and the wizard driver, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    /// Waiting for a control to become visible.
    #[serde(default = "default_element_ms")]
    pub element_ms: u64,
    /// Retrying a plain click/fill refused by an overlay.
    #[serde(default = "default_interaction_ms")]
    pub interaction_ms: u64,
    /// Waiting for the next step's markers after a transition.
    #[serde(default = "default_stage_ms")]
    pub stage_ms: u64,
    /// Waiting for the wizard after confirming the hut.
    #[serde(default = "default_wizard_ready_ms")]
    pub wizard_ready_ms: u64,
    /// Polling for the outcome of the availability check.
    #[serde(default = "default_availability_ms")]
    pub availability_ms: u64,
    /// Waiting for the hut search to list options.
    #[serde(default = "default_hut_options_ms")]
    pub hut_options_ms: u64,
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_ms: default_element_ms(),
            interaction_ms: default_interaction_ms(),
            stage_ms: default_stage_ms(),
            wizard_ready_ms: default_wizard_ready_ms(),
            availability_ms: default_availability_ms(),
            hut_options_ms: default_hut_options_ms(),
            poll_ms: default_poll_ms(),
        }
    }
}

impl Timeouts {
    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    pub fn interaction(&self) -> Duration {
        Duration::from_millis(self.interaction_ms)
    }

    pub fn stage(&self) -> Duration {
        Duration::from_millis(self.stage_ms)
    }

    pub fn wizard_ready(&self) -> Duration {
        Duration::from_millis(self.wizard_ready_ms)
    }

    pub fn availability(&self) -> Duration {
        Duration::from_millis(self.availability_ms)
    }

    pub fn hut_options(&self) -> Duration {
        Duration::from_millis(self.hut_options_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

fn default_element_ms() -> u64 {
    15000
}

fn default_interaction_ms() -> u64 {
    3000
}

fn default_stage_ms() -> u64 {
    15000
}

fn default_wizard_ready_ms() -> u64 {
    20000
}

fn default_availability_ms() -> u64 {
    10000
}

fn default_hut_options_ms() -> u64 {
    5000
}

fn default_poll_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    #[serde(default = "default_screenshots_enabled")]
    pub enabled: bool,
    #[serde(default = "default_screenshot_dir")]
    pub dir: PathBuf,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_screenshots_enabled(),
            dir: default_screenshot_dir(),
        }
    }
}

fn default_screenshots_enabled() -> bool {
    true
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screens")
}
