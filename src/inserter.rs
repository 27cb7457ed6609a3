//! Answer insertion.
//!
//! Writes the returned text back into the original field with the mutation its type
//! requires (`.value` for native inputs and textareas, `.innerHTML` for
//! editable regions) and dispatches synthetic events so framework-managed
//! fields observe the change. Tolerates the field having been removed from
//! the document between request and response.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::browser::Browser;
use crate::types::{FieldInfo, FieldKind};

/// Extra event dispatch for host pages that listen on key events instead of
/// `input`/`change`
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOptions {
    /// Additionally dispatch `keyup` and `blur` after insertion
    pub legacy_events: bool,
}

const INSERT_SCRIPT: &str = r#"
    return (function(selector, frame, text, kind, legacyEvents) {
        let doc = document;
        if (frame !== null) {
            const iframes = document.querySelectorAll('iframe');
            if (frame >= iframes.length) {
                return { ok: false, error: 'iframe no longer present' };
            }
            try {
                doc = iframes[frame].contentDocument;
            } catch (e) {
                return { ok: false, error: 'iframe not accessible' };
            }
            if (!doc) return { ok: false, error: 'iframe not accessible' };
        }

        const el = doc.querySelector(selector);
        if (!el || !doc.contains(el)) {
            return { ok: false, error: 'field is no longer attached to the document' };
        }

        if (kind === 'input' || kind === 'textarea') {
            el.value = text;
        } else {
            el.innerHTML = text;
            // Collapse the selection to the end of the inserted text
            const win = doc.defaultView;
            const selection = win.getSelection();
            if (selection) {
                const range = doc.createRange();
                range.selectNodeContents(el);
                range.collapse(false);
                selection.removeAllRanges();
                selection.addRange(range);
            }
        }

        el.dispatchEvent(new Event('input', { bubbles: true }));
        el.dispatchEvent(new Event('change', { bubbles: true }));
        if (legacyEvents) {
            el.dispatchEvent(new Event('keyup', { bubbles: true }));
            el.dispatchEvent(new Event('blur', { bubbles: true }));
        }

        return { ok: true, error: null };
    })(arguments[0], arguments[1], arguments[2], arguments[3], arguments[4]);
"#;

/// Insert `text` into the field, dispatching synthetic events. Last write
/// wins: inserting the same answer twice leaves the value unchanged.
pub async fn insert(
    browser: &Browser,
    field: &FieldInfo,
    text: &str,
    opts: InsertOptions,
) -> Result<()> {
    let kind = match field.kind() {
        FieldKind::Input => "input",
        FieldKind::Textarea => "textarea",
        FieldKind::Editable => "editable",
    };

    let result = browser
        .execute(
            INSERT_SCRIPT,
            vec![
                json!(field.selector),
                json!(field.frame),
                json!(text),
                json!(kind),
                json!(opts.legacy_events),
            ],
        )
        .await?;

    let ok = result
        .get("ok")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !ok {
        let reason = result
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("insertion failed");
        browser.notify(&format!("Could not insert answer: {}", reason), true).await;
        anyhow::bail!(
            "No field found matching selector: {} ({})",
            field.selector,
            reason
        );
    }

    info!("Inserted {} chars into {}", text.chars().count(), field.selector);
    Ok(())
}
