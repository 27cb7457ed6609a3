use anyhow::Result;
use serde::Serialize;

use crate::browser::{Browser, BrowserType};
use crate::types::{OutputFormat, ViewportSize};

/// Open a fresh browser session from the shared CLI flags
pub async fn open_browser(
    browser: &str,
    viewport: Option<String>,
    no_headless: bool,
) -> Result<Browser> {
    let browser_type: BrowserType = browser.parse()?;
    let viewport = viewport.as_deref().map(ViewportSize::parse).transpose()?;
    Browser::new(browser_type, viewport, !no_headless).await
}

/// Print a result in the requested format. JSON goes to stdout pretty-printed;
/// simple format takes a caller-rendered line.
pub fn print_result<T: Serialize>(
    format: OutputFormat,
    value: &T,
    simple: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Simple => println!("{}", simple()),
    }
    Ok(())
}
