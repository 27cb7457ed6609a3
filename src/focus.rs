//! Active-field tracking.
//!
//! Many web apps signal focus without ever firing a standard `focus` event,
//! so several independent producers feed one signal queue in the page:
//! native focus/blur listeners (attached by the detector), a capturing
//! global click listener, a mousedown-then-recheck heuristic for custom
//! widgets, and an attribute-mutation heuristic for focus-like visual state.
//! The Rust side drains the queue and runs a single arbitration function:
//! most recent signal wins, ties break by source priority.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::browser::Browser;
use crate::detector::selector_list;

/// How long a blur is held before it clears the active field
pub const BLUR_GRACE_MS: f64 = 200.0;

/// Delay before the mousedown heuristic re-checks the pressed element
pub const MOUSEDOWN_RECHECK_MS: u64 = 100;

/// Interval for confirmation polling against `document.activeElement`
pub const POLL_INTERVAL_MS: u64 = 500;

/// Where a focus signal came from. Priority (for timestamp ties) is the
/// declaration order, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Focus,
    Click,
    Mousedown,
    Mutation,
    Poll,
    Blur,
}

impl SignalSource {
    fn priority(self) -> u8 {
        match self {
            SignalSource::Focus => 5,
            SignalSource::Click => 4,
            SignalSource::Mousedown => 3,
            SignalSource::Mutation => 2,
            SignalSource::Poll => 1,
            SignalSource::Blur => 0,
        }
    }
}

/// One focus signal drained from the page-side queue.
///
/// For gain signals `target` is the field that became active. For blur
/// signals `target` is the element focus moved to (if any), so the
/// trigger-control exception can be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSignal {
    pub target: Option<String>,
    #[serde(default)]
    pub frame: Option<usize>,
    pub source: SignalSource,
    pub at_ms: f64,
    /// Focus moved to an element carrying `data-fieldpilot-trigger`. This
    /// tool injects no such control; host pages that render their own
    /// trigger surface set the attribute so the click lands while the
    /// field is still considered active.
    #[serde(default)]
    pub to_trigger: bool,
}

/// The field currently considered active
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRef {
    pub selector: String,
    pub frame: Option<usize>,
}

/// Current wall-clock time in epoch milliseconds, the clock the page-side
/// producers stamp signals with (`Date.now()`). Arbitration must run against
/// this clock, not the newest signal's timestamp, or a trailing blur would
/// never age past the grace period.
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

/// Pick the active field from a set of competing signals.
///
/// Most recent signal wins; signals with identical timestamps break the tie
/// by source priority (focus > click > mousedown > mutation > poll > blur).
/// A blur only clears the active field once `BLUR_GRACE_MS` has elapsed, and
/// never when focus moved to the trigger control.
pub fn arbitrate(signals: &[FocusSignal], now_ms: f64) -> Option<ActiveRef> {
    let latest = signals.iter().max_by(|a, b| {
        a.at_ms
            .partial_cmp(&b.at_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.source.priority().cmp(&b.source.priority()))
    })?;

    let latest_gain = || {
        signals
            .iter()
            .filter(|s| s.source != SignalSource::Blur && s.target.is_some())
            .max_by(|a, b| {
                a.at_ms
                    .partial_cmp(&b.at_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.source.priority().cmp(&b.source.priority()))
            })
            .map(|s| ActiveRef {
                selector: s.target.clone().expect("gain signal has target"),
                frame: s.frame,
            })
    };

    if latest.source == SignalSource::Blur {
        if latest.to_trigger || now_ms - latest.at_ms < BLUR_GRACE_MS {
            // Grace period, or focus moved to the trigger: keep the field
            return latest_gain();
        }
        return None;
    }

    latest.target.as_ref().map(|t| ActiveRef {
        selector: t.clone(),
        frame: latest.frame,
    })
}

// Global producers installed once per page. Element-level focus/blur
// listeners come from the detector; these catch everything else.
const INSTALL_SCRIPT: &str = r#"
    (function(selectorList, recheckDelay) {
        if (window.__fieldpilot_focus) return;
        window.__fieldpilot_focus = true;
        window.__fieldpilot_signals = window.__fieldpilot_signals || [];

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

        function matching(el) {
            if (!el || el.nodeType !== 1) return null;
            if (el.matches && el.matches(selectorList)) return el;
            return el.closest ? el.closest(selectorList) : null;
        }

        function record(el, source) {
            pushSignal({
                target: cssPath(el), frame: null,
                source: source, at_ms: Date.now(), to_trigger: false
            });
        }

        // (b) capture-phase listeners accept any matching element, even
        // ones the detector has not marked yet
        document.addEventListener('focusin', function(event) {
            const el = matching(event.target);
            if (el) record(el, 'focus');
        }, true);

        document.addEventListener('click', function(event) {
            const el = matching(event.target);
            if (el) record(el, 'click');
        }, true);

        // (c) mousedown + delayed re-check for widgets that never emit
        // standard focus events
        document.addEventListener('mousedown', function(event) {
            const pressed = event.target;
            setTimeout(function() {
                const el = matching(pressed) ||
                           matching(document.activeElement);
                if (el) record(el, 'mousedown');
            }, recheckDelay);
        }, true);

        // (d) class/style changes implying a focus-like visual state
        const FOCUS_HINTS = /focus|selected|active/i;
        new MutationObserver(function(mutations) {
            for (const m of mutations) {
                if (m.type !== 'attributes') continue;
                const el = matching(m.target);
                if (!el) continue;
                if (m.attributeName === 'class') {
                    if (FOCUS_HINTS.test(m.target.className || '') ||
                        m.target.getAttribute('aria-selected') === 'true') {
                        record(el, 'mutation');
                    }
                } else if (m.attributeName === 'style') {
                    const style = m.target.style;
                    if ((style.outline && style.outline !== 'none') ||
                        (style.boxShadow && style.boxShadow !== 'none')) {
                        record(el, 'mutation');
                    }
                } else if (m.attributeName === 'aria-selected') {
                    if (m.target.getAttribute('aria-selected') === 'true') {
                        record(el, 'mutation');
                    }
                }
            }
        }).observe(document.documentElement, {
            attributes: true,
            subtree: true,
            attributeFilter: ['class', 'style', 'aria-selected']
        });
    })(arguments[0], arguments[1]);
"#;

/// Install the global focus-signal producers. Idempotent.
pub async fn install(browser: &Browser) -> Result<()> {
    browser
        .execute(
            INSTALL_SCRIPT,
            vec![json!(selector_list()), json!(MOUSEDOWN_RECHECK_MS)],
        )
        .await?;
    Ok(())
}

/// Drain queued signals from the page
pub async fn drain(browser: &Browser) -> Result<Vec<FocusSignal>> {
    let script = r#"
        const signals = window.__fieldpilot_signals || [];
        window.__fieldpilot_signals = [];
        return signals;
    "#;
    let result = browser.execute(script, vec![]).await?;
    Ok(serde_json::from_value(result).unwrap_or_default())
}

/// Confirmation poll: report `document.activeElement` as a signal when it
/// matches the selector list (descending into same-origin iframes).
pub async fn poll_active(browser: &Browser) -> Result<Option<FocusSignal>> {
    let script = r#"
        return (function(selectorList) {
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

            let el = document.activeElement;
            let frame = null;
            if (el && el.tagName === 'IFRAME') {
                const iframes = Array.from(document.querySelectorAll('iframe'));
                try {
                    const inner = el.contentDocument;
                    if (inner && inner.activeElement) {
                        frame = iframes.indexOf(el);
                        el = inner.activeElement;
                    }
                } catch (e) {
                    return null;
                }
            }
            if (!el || !el.matches || !el.matches(selectorList)) return null;
            return {
                target: cssPath(el), frame: frame,
                source: 'poll', at_ms: Date.now(), to_trigger: false
            };
        })(arguments[0]);
    "#;
    let result = browser
        .execute(script, vec![json!(selector_list())])
        .await?;
    if result.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(result).ok())
}

#[cfg(test)]
#[path = "focus_test.rs"]
mod focus_test;
