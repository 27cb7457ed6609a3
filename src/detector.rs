//! Field detection over the live DOM.
//!
//! A fixed selector list covers native inputs, textareas, contenteditable
//! regions, ARIA textboxes and the container classes of common rich-text
//! editors. Scans run on demand, on DOM mutation and once after a startup
//! delay; same-origin iframes are included, cross-origin iframes are skipped
//! silently.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;

use crate::browser::Browser;
use crate::types::FieldInfo;

/// Selectors accepted as editable fields
pub const FIELD_SELECTORS: &[&str] = &[
    "input[type='text']",
    "input[type='email']",
    "input[type='search']",
    "input[type='url']",
    "input[type='tel']",
    "input[type='number']",
    "input[type='password']",
    "input:not([type])",
    "textarea",
    "[contenteditable='true']",
    "[role='textbox']",
    ".ql-editor",
    ".ProseMirror",
    ".CodeMirror textarea",
    ".monaco-editor textarea",
    ".notion-page-content",
    ".public-DraftEditor-content",
    ".cell-editor",
];

/// Marker attribute set on fields that already have listeners attached
pub const INIT_MARKER: &str = "data-fieldpilot-init";

/// Delay before the post-load re-scan, for late-rendering UI
pub const STARTUP_RESCAN_MS: u64 = 1500;

/// The combined selector list as a single CSS group
pub fn selector_list() -> String {
    FIELD_SELECTORS.join(", ")
}

// Installs the detector into the page: scans the document and same-origin
// iframes, marks matched elements, attaches focus/blur listeners that feed
// the focus-signal queue, and re-scans on mutation and after a startup
// delay. Returns the fields found by the initial scan.
const INSTALL_SCRIPT: &str = r#"
    return (function(selectorList, startupDelay) {
        if (window.__fieldpilot_detector) {
            return window.__fieldpilot_detector.scan();
        }

        window.__fieldpilot_signals = window.__fieldpilot_signals || [];
        window.__fieldpilot_new_fields = [];

        function pushSignal(signal) {
            window.__fieldpilot_signals.push(signal);
            if (window.__fieldpilot_signals.length > 500) {
                window.__fieldpilot_signals.shift();
            }
        }

        function cssPath(el) {
            if (el.id) return '#' + CSS.escape(el.id);
            const parts = [];
            while (el && el.nodeType === 1 && el.tagName !== 'HTML') {
                let part = el.tagName.toLowerCase();
                const parent = el.parentElement;
                if (parent) {
                    const siblings = Array.from(parent.children)
                        .filter(c => c.tagName === el.tagName);
                    if (siblings.length > 1) {
                        part += ':nth-of-type(' + (siblings.indexOf(el) + 1) + ')';
                    }
                }
                parts.unshift(part);
                el = parent;
            }
            return parts.join(' > ');
        }

        function describe(el, frame) {
            const rect = el.getBoundingClientRect();
            const style = el.ownerDocument.defaultView.getComputedStyle(el);
            return {
                selector: cssPath(el),
                tag: el.tagName.toLowerCase(),
                input_type: el.getAttribute('type'),
                id: el.id || null,
                placeholder: el.getAttribute('placeholder'),
                aria_label: el.getAttribute('aria-label'),
                editable: el.isContentEditable === true,
                bounds: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
                visible: rect.width > 0 && rect.height > 0 &&
                         style.display !== 'none' && style.visibility !== 'hidden',
                frame: frame
            };
        }

        function documents() {
            const out = [{ doc: document, frame: null }];
            const iframes = document.querySelectorAll('iframe');
            for (let i = 0; i < iframes.length; i++) {
                try {
                    const doc = iframes[i].contentDocument;
                    if (doc) out.push({ doc: doc, frame: i });
                } catch (e) {
                    // cross-origin iframe, inaccessible by design
                }
            }
            return out;
        }

        function attachListeners(el, frame) {
            el.addEventListener('focus', function() {
                pushSignal({
                    target: cssPath(el), frame: frame,
                    source: 'focus', at_ms: Date.now(), to_trigger: false
                });
            }, true);
            el.addEventListener('blur', function(event) {
                // data-fieldpilot-trigger is an opt-in for host pages that
                // render their own trigger control next to the field
                const related = event.relatedTarget;
                pushSignal({
                    target: related ? cssPath(related) : null, frame: frame,
                    source: 'blur', at_ms: Date.now(),
                    to_trigger: !!(related && related.hasAttribute &&
                                   related.hasAttribute('data-fieldpilot-trigger'))
                });
            }, true);
        }

        function scan() {
            const found = [];
            for (const entry of documents()) {
                let nodes;
                try {
                    nodes = entry.doc.querySelectorAll(selectorList);
                } catch (e) {
                    continue;
                }
                for (const el of nodes) {
                    if (el.hasAttribute('data-fieldpilot-init')) continue;
                    el.setAttribute('data-fieldpilot-init', '');
                    attachListeners(el, entry.frame);
                    found.push(describe(el, entry.frame));
                }
            }
            return found;
        }

        // Background re-scans feed the drain queue; direct scans return
        // their findings to the caller instead.
        function scanAndQueue() {
            const found = scan();
            if (found.length) {
                window.__fieldpilot_new_fields =
                    window.__fieldpilot_new_fields.concat(found);
            }
        }

        window.__fieldpilot_detector = { scan: scan };

        if (document.body) {
            new MutationObserver(scanAndQueue)
                .observe(document.body, { childList: true, subtree: true });
        }
        setTimeout(scanAndQueue, startupDelay);

        return scan();
    })(arguments[0], arguments[1]);
"#;

/// Install the detector into the current page and return the fields found
/// by the initial scan. Idempotent: a second call just re-scans.
pub async fn install(browser: &Browser) -> Result<Vec<FieldInfo>> {
    let result = browser
        .execute(
            INSTALL_SCRIPT,
            vec![json!(selector_list()), json!(STARTUP_RESCAN_MS)],
        )
        .await?;
    let fields: Vec<FieldInfo> =
        serde_json::from_value(result).context("Failed to parse detected fields")?;
    debug!("Detector found {} field(s)", fields.len());
    Ok(fields)
}

/// Drain fields discovered since the last call (mutation and startup
/// re-scans feed this queue). Requires `install` to have run.
pub async fn drain_new(browser: &Browser) -> Result<Vec<FieldInfo>> {
    let script = r#"
        const found = window.__fieldpilot_new_fields || [];
        window.__fieldpilot_new_fields = [];
        return found;
    "#;
    let result = browser.execute(script, vec![]).await?;
    Ok(serde_json::from_value(result).unwrap_or_default())
}

/// Re-describe a single field by selector, or None if it is gone.
/// Used to recompute the bounding box on activation.
pub async fn describe(
    browser: &Browser,
    selector: &str,
    frame: Option<usize>,
) -> Result<Option<FieldInfo>> {
    let script = r#"
        return (function(selector, frame) {
            let doc = document;
            if (frame !== null) {
                const iframes = document.querySelectorAll('iframe');
                if (frame >= iframes.length) return null;
                try {
                    doc = iframes[frame].contentDocument;
                } catch (e) {
                    return null;
                }
                if (!doc) return null;
            }
            const el = doc.querySelector(selector);
            if (!el) return null;
            const rect = el.getBoundingClientRect();
            const style = doc.defaultView.getComputedStyle(el);
            return {
                selector: selector,
                tag: el.tagName.toLowerCase(),
                input_type: el.getAttribute('type'),
                id: el.id || null,
                placeholder: el.getAttribute('placeholder'),
                aria_label: el.getAttribute('aria-label'),
                editable: el.isContentEditable === true,
                bounds: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
                visible: rect.width > 0 && rect.height > 0 &&
                         style.display !== 'none' && style.visibility !== 'hidden',
                frame: frame
            };
        })(arguments[0], arguments[1]);
    "#;
    let result = browser
        .execute(script, vec![json!(selector), json!(frame)])
        .await?;
    if result.is_null() {
        return Ok(None);
    }
    let field: FieldInfo =
        serde_json::from_value(result).context("Failed to parse field description")?;
    Ok(Some(field))
}

#[cfg(test)]
#[path = "detector_test.rs"]
mod detector_test;
