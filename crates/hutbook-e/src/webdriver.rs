use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

type WebDriverError = Box<dyn std::error::Error + Send + Sync>;

/// Capabilities for a chromedriver session; `headless` adds `--headless=new`.
pub fn chrome_capabilities(headless: bool) -> Map<String, Value> {
    let mut args = vec!["--window-size=1366,900".to_string()];
    if headless {
        args.push("--headless=new".to_string());
    }
    let mut caps = Map::new();
    caps.insert("browserName".into(), json!("chrome"));
    caps.insert("goog:chromeOptions".into(), json!({ "args": args }));
    caps
}

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(url: &str, capabilities: Map<String, Value>) -> Result<Self, WebDriverError> {
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(url)
            .await
            .map_err(|e| format!("Failed to connect to WebDriver at {}: {}", url, e))?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), WebDriverError> {
        self.client
            .close()
            .await
            .map_err(|e| format!("Failed to close session: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_flag_reaches_chrome_args() {
        let caps = chrome_capabilities(true);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));

        let caps = chrome_capabilities(false);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }
}
