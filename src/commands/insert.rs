use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::commands::utils;
use crate::detector;
use crate::inserter::{self, InsertOptions};
use crate::types::OutputFormat;

/// Insert literal text into a field, without touching the backend.
#[allow(clippy::too_many_arguments)]
pub async fn handle_insert(
    url: String,
    selector: String,
    text: String,
    legacy_events: bool,
    browser: String,
    viewport: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Inserting text into {} on {}", selector, url);
    let browser = utils::open_browser(&browser, viewport, no_headless).await?;

    let result = async {
        browser.goto(&url).await?;
        detector::install(&browser).await?;

        let field = detector::describe(&browser, &selector, None)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("No field found matching selector: {}", selector)
            })?;

        inserter::insert(&browser, &field, &text, InsertOptions { legacy_events }).await?;

        utils::print_result(
            format,
            &json!({ "selector": &field.selector, "inserted": true }),
            || format!("Inserted into {}", field.selector),
        )
    }
    .await;

    browser.close().await?;
    result
}
