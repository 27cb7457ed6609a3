use anyhow::Result;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::info;

use crate::commands::utils;
use crate::detector;
use crate::focus::{self, ActiveRef};
use crate::types::OutputFormat;

/// Watch a page for focus changes and newly appearing fields, printing one
/// event per line until the duration runs out.
pub async fn handle_watch(
    url: String,
    duration: u64,
    browser: String,
    viewport: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Watching {} for {}s", url, duration);
    let browser = utils::open_browser(&browser, viewport, no_headless).await?;

    let result = async {
        browser.goto(&url).await?;
        let fields = detector::install(&browser).await?;
        focus::install(&browser).await?;
        emit_event(format, "detected", &json!({ "count": fields.len() }));

        let deadline = Instant::now() + Duration::from_secs(duration);
        let mut signals = Vec::new();
        let mut active: Option<ActiveRef> = None;

        while Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(focus::POLL_INTERVAL_MS)).await;

            for field in detector::drain_new(&browser).await? {
                emit_event(format, "field", &serde_json::to_value(&field)?);
            }

            signals.extend(focus::drain(&browser).await?);
            if let Some(polled) = focus::poll_active(&browser).await? {
                signals.push(polled);
            }

            let next = focus::arbitrate(&signals, focus::now_ms());
            if next != active {
                match &next {
                    Some(r) => emit_event(
                        format,
                        "focus",
                        &json!({ "selector": r.selector, "frame": r.frame }),
                    ),
                    None => emit_event(format, "blur", &json!({})),
                }
                active = next;
            }
        }
        Ok(())
    }
    .await;

    browser.close().await?;
    result
}

fn emit_event(format: OutputFormat, event: &str, detail: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "event": event, "detail": detail }));
        }
        OutputFormat::Simple => {
            println!("{}: {}", event, detail);
        }
    }
}
