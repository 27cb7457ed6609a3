use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::commands::utils;
use crate::detector;
use crate::question;
use crate::types::OutputFormat;

pub async fn handle_infer(
    url: String,
    selector: String,
    browser: String,
    viewport: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Inferring question for {} on {}", selector, url);
    let browser = utils::open_browser(&browser, viewport, no_headless).await?;

    let result = async {
        browser.goto(&url).await?;
        detector::install(&browser).await?;

        let field = detector::describe(&browser, &selector, None)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("No field found matching selector: {}", selector)
            })?;

        let candidates = question::gather(&browser, &field).await?;
        let resolved = question::resolve(&candidates);

        utils::print_result(
            format,
            &json!({
                "selector": selector,
                "question": resolved.as_ref().map(|(q, _)| q),
                "source": resolved.as_ref().map(|(_, s)| s),
                "candidates": candidates,
            }),
            || match &resolved {
                Some((q, source)) => format!("{} (from {:?})", q, source),
                None => "No question could be inferred".to_string(),
            },
        )
    }
    .await;

    browser.close().await?;
    result
}
