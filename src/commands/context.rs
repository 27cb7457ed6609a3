use anyhow::Result;
use tracing::info;

use crate::commands::utils;
use crate::context::{self, CaptureOptions};
use crate::settings::SettingsStore;
use crate::types::OutputFormat;

pub async fn handle_context(
    url: String,
    screenshot: bool,
    browser: String,
    viewport: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Capturing page context for {}", url);
    let settings = SettingsStore::new()?.load()?;
    let browser = utils::open_browser(&browser, viewport, no_headless).await?;

    let result = async {
        browser.goto(&url).await?;
        let opts = CaptureOptions {
            readability_url: settings.readability_url.clone(),
            screenshot,
        };
        let page = context::capture(&browser, &opts).await?;

        utils::print_result(format, &page, || {
            let mut out = page.text.clone();
            if page.screenshot.is_some() {
                out.push_str("\n\n(screenshot captured)");
            }
            out
        })
    }
    .await;

    browser.close().await?;
    result
}
