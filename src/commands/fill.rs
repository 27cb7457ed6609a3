use anyhow::Result;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::info;

use crate::commands::utils;
use crate::detector;
use crate::focus;
use crate::session::{AskOutcome, Session, TriggerOutcome};
use crate::settings::SettingsStore;
use crate::types::{FieldInfo, OutputFormat};

/// Run the full pipeline: locate the field, resolve its question, query the
/// chat backend and insert the answer.
#[allow(clippy::too_many_arguments)]
pub async fn handle_fill(
    url: String,
    selector: Option<String>,
    question: Option<String>,
    wait: u64,
    browser: String,
    viewport: Option<String>,
    no_headless: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Filling a field on {}", url);
    let settings = SettingsStore::new()?.load()?;
    let mut session = Session::new(settings)?;
    let browser = utils::open_browser(&browser, viewport, no_headless).await?;

    let result = async {
        browser.goto(&url).await?;
        detector::install(&browser).await?;

        let field = match &selector {
            Some(s) => detector::describe(&browser, s, None).await?.ok_or_else(|| {
                anyhow::anyhow!("No field found matching selector: {}", s)
            })?,
            None => wait_for_focus(&browser, wait).await?,
        };
        info!("Target field: {}", field.selector);

        match session.trigger() {
            TriggerOutcome::Started => {}
            TriggerOutcome::OpenExisting(url) => {
                return utils::print_result(
                    format,
                    &json!({ "conversation_url": &url }),
                    || format!("Conversation already open: {}", url),
                );
            }
            TriggerOutcome::Busy => {
                anyhow::bail!("A request is already in progress");
            }
        }

        match session.ask(&browser, &field, question.as_deref()).await? {
            AskOutcome::Answered {
                answer,
                conversation_url,
            } => utils::print_result(
                format,
                &json!({
                    "selector": &field.selector,
                    "answer": &answer,
                    "conversation_url": &conversation_url,
                }),
                || format!("Inserted answer into {}\n{}", field.selector, answer),
            ),
            AskOutcome::Cancelled => utils::print_result(
                format,
                &json!({ "cancelled": true }),
                || "Cancelled".to_string(),
            ),
        }
    }
    .await;

    browser.close().await?;
    result
}

/// Wait for the user to focus an editable field, using the same signal
/// arbitration the watch command runs.
async fn wait_for_focus(browser: &crate::browser::Browser, wait: u64) -> Result<FieldInfo> {
    eprintln!("Focus the field you want filled (waiting up to {}s)...", wait);
    focus::install(browser).await?;

    let deadline = Instant::now() + Duration::from_secs(wait);
    let mut signals = Vec::new();

    while Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(focus::POLL_INTERVAL_MS)).await;

        signals.extend(focus::drain(browser).await?);
        if let Some(polled) = focus::poll_active(browser).await? {
            signals.push(polled);
        }

        if let Some(active) = focus::arbitrate(&signals, focus::now_ms())
            && let Some(field) = detector::describe(browser, &active.selector, active.frame).await?
        {
            return Ok(field);
        }
    }

    anyhow::bail!(
        "Waiting for a field to receive focus timed out after {}s",
        wait
    )
}
