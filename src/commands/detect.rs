use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::commands::utils;
use crate::detector;
use crate::types::OutputFormat;

pub async fn handle_detect(
    url: String,
    browser: String,
    viewport: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Detecting editable fields on {}", url);
    let browser = utils::open_browser(&browser, viewport, no_headless).await?;

    let result = async {
        browser.goto(&url).await?;
        let mut fields = detector::install(&browser).await?;

        // Dynamic pages register their editors late; the in-page rescan
        // fires after STARTUP_RESCAN_MS, so wait it out and collect.
        tokio::time::sleep(std::time::Duration::from_millis(
            detector::STARTUP_RESCAN_MS + 200,
        ))
        .await;
        fields.extend(detector::drain_new(&browser).await?);

        utils::print_result(
            format,
            &json!({ "url": &url, "count": fields.len(), "fields": &fields }),
            || {
                let mut out = format!("{} field(s) on {}\n", fields.len(), url);
                for f in &fields {
                    out.push_str(&format!(
                        "  {} [{}{}]{}\n",
                        f.selector,
                        f.tag,
                        f.input_type
                            .as_deref()
                            .map(|t| format!(" type={}", t))
                            .unwrap_or_default(),
                        f.frame
                            .map(|i| format!(" (iframe {})", i))
                            .unwrap_or_default(),
                    ));
                }
                out.trim_end().to_string()
            },
        )
    }
    .await;

    browser.close().await?;
    result
}
