use anyhow::{Context, Result};
use base64::Engine;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info};

use crate::driver::GLOBAL_DRIVER_MANAGER;
use crate::types::ViewportSize;

/// Browser instance for WebDriver automation
pub struct Browser {
    pub(crate) client: Client,
}

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

fn build_capabilities(
    browser_type: BrowserType,
    viewport: Option<&ViewportSize>,
    headless: bool,
) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut caps = serde_json::Map::new();
    match browser_type {
        BrowserType::Firefox => {
            let mut args = Vec::new();
            if headless {
                args.push("--headless".to_string());
            }
            if let Some(vp) = viewport {
                args.push(format!("--width={}", vp.width));
                args.push(format!("--height={}", vp.height));
            }
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
        BrowserType::Chrome => {
            let mut args = vec!["--no-sandbox".to_string()];
            if headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
                args.push("--disable-dev-shm-usage".to_string());
            }
            if let Some(vp) = viewport {
                args.push(format!("--window-size={},{}", vp.width, vp.height));
            }
            // Chrome refuses to share a user-data-dir between sessions
            let profile_dir = tempfile::Builder::new()
                .prefix("fieldpilot-chrome-")
                .tempdir()?;
            args.push(format!(
                "--user-data-dir={}",
                profile_dir.into_path().display()
            ));
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
    }
    Ok(caps)
}

fn is_stale_session_error(error: &fantoccini::error::NewSessionError) -> bool {
    let text = error.to_string();
    text.contains("Session is already started") || text.contains("session not created")
}

impl Browser {
    /// Connect to a browser through its WebDriver, starting the driver if
    /// needed. A driver stuck with a stale session is killed and restarted
    /// once before giving up.
    pub async fn new(
        browser_type: BrowserType,
        viewport: Option<ViewportSize>,
        headless: bool,
    ) -> Result<Self> {
        let webdriver_url = GLOBAL_DRIVER_MANAGER.ensure_driver(&browser_type).await?;
        let caps = build_capabilities(browser_type, viewport.as_ref(), headless)?;
        debug!("Connecting to WebDriver at {}", webdriver_url);

        let client = match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(&webdriver_url)
            .await
        {
            Ok(client) => client,
            Err(e) if is_stale_session_error(&e) => {
                info!("WebDriver holds a stale session, restarting it");
                GLOBAL_DRIVER_MANAGER.kill_driver(&browser_type);
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;

                let new_url = GLOBAL_DRIVER_MANAGER
                    .ensure_driver(&browser_type)
                    .await
                    .context("Failed to restart WebDriver after a stale session")?;
                ClientBuilder::rustls()
                    .capabilities(caps)
                    .connect(&new_url)
                    .await
                    .context("Failed to connect to WebDriver after restart")?
            }
            Err(e) => return Err(e).context("Failed to connect to WebDriver"),
        };

        if let Some(vp) = viewport {
            // Best-effort; headless window size usually came from the args
            if let Err(e) = client.set_window_size(vp.width, vp.height).await {
                debug!("Could not set window size: {}", e);
            }
        }

        Ok(Browser { client })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        // Wait for the page to be ready to avoid stale element references
        let wait_script = "return document.readyState === 'complete';";
        for _ in 0..20 {
            match self.client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => tokio::time::sleep(tokio::time::Duration::from_millis(100)).await,
            }
        }

        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    pub async fn execute(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.client
            .execute(script, args)
            .await
            .context("Failed to execute script")
    }

    /// Capture the visible viewport as a base64-encoded PNG.
    ///
    /// Best-effort: callers are expected to degrade to text-only context
    /// when this fails.
    pub async fn screenshot_base64(&self) -> Result<String> {
        let png = self
            .client
            .screenshot()
            .await
            .context("Failed to capture screenshot")?;
        Ok(base64::engine::general_purpose::STANDARD.encode(&png))
    }

    /// Show a transient toast on the page. Failures are ignored; the
    /// notification layer never breaks the action it reports on.
    pub async fn notify(&self, message: &str, is_error: bool) {
        let script = r#"
            (function(message, isError) {
                const toast = document.createElement('div');
                toast.setAttribute('data-fieldpilot-toast', '');
                toast.textContent = message;
                toast.style.cssText =
                    'position:fixed;bottom:24px;right:24px;z-index:2147483647;' +
                    'padding:10px 16px;border-radius:6px;color:#fff;' +
                    'font:13px/1.4 system-ui,sans-serif;box-shadow:0 2px 8px rgba(0,0,0,.3);' +
                    'background:' + (isError ? '#c0392b' : '#2d7d46') + ';';
                document.body.appendChild(toast);
                setTimeout(() => toast.remove(), 4000);
            })(arguments[0], arguments[1]);
        "#;
        if let Err(e) = self
            .client
            .execute(script, vec![json!(message), json!(is_error)])
            .await
        {
            debug!("Could not show on-page notification: {}", e);
        }
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
