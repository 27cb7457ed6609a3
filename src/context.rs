//! Page-context capture.
//!
//! Two strategies, both supported: direct DOM scraping (clone the main
//! content region, strip non-content nodes, extract heading-delimited
//! sections with a flat text fallback) and an optional external readability
//! service for pages judged public. Cleanup and truncation happen on the
//! Rust side as pure functions over the extracted snapshot.

use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::types::PageContext;

/// Character budget for the extracted text
pub const CHAR_BUDGET: usize = 20_000;

/// Appended when the extracted text exceeds the budget
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Lines shorter than this are considered noise and dropped
pub const MIN_LINE_CHARS: usize = 10;

/// Readability output thinner than this falls back to direct scraping
pub const MIN_READABLE_CHARS: usize = 100;

/// URL markers that flag a page as non-public
const PRIVATE_URL_MARKERS: &[&str] = &[
    "login",
    "signin",
    "admin",
    "account",
    "dashboard",
    "settings",
];

/// How to build the context for one request
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Try the readability service before direct scraping
    pub readability_url: Option<String>,
    /// Capture a screenshot of the visible tab (best-effort)
    pub screenshot: bool,
}

/// Elements removed from the cloned content before text extraction. Form
/// controls go, but `form` itself stays: its labels and prose are exactly
/// the context worth capturing on the pages this tool targets.
const STRIP_SELECTORS: &str = "script, style, noscript, svg, canvas, iframe, \
    nav, aside, footer, input, textarea, select, button, template";

// Clone the main content region, strip non-content elements by tag and by a
// denylist of class/id/role patterns, then emit heading-delimited sections,
// falling back to flat paragraph text when the page has no headings.
const EXTRACT_SCRIPT: &str = r#"
    return (function(stripSelectors) {
        const root = document.querySelector('main')
            || document.querySelector('article')
            || document.querySelector('#content')
            || document.body;
        if (!root) return '';

        const clone = root.cloneNode(true);

        clone.querySelectorAll(stripSelectors).forEach(el => el.remove());

        const NOISE = /(^|[-_ ])(ad|ads|advert|banner|cookie|popup|modal|menu|sidebar|breadcrumb|pagination|share|social|comment)([-_ ]|$)/i;
        clone.querySelectorAll('[class], [id], [role]').forEach(el => {
            const probe = (el.className && typeof el.className === 'string' ? el.className : '')
                + ' ' + (el.id || '') + ' ' + (el.getAttribute('role') || '');
            if (NOISE.test(probe)) el.remove();
        });
        clone.querySelectorAll('[hidden], [aria-hidden="true"]').forEach(el => el.remove());

        const headings = clone.querySelectorAll('h1, h2, h3, h4, h5, h6');
        if (headings.length > 0) {
            const sections = [];
            headings.forEach(heading => {
                const title = heading.textContent.trim();
                let prose = '';
                let node = heading.nextElementSibling;
                while (node && !/^H[1-6]$/.test(node.tagName)) {
                    prose += ' ' + node.textContent;
                    node = node.nextElementSibling;
                }
                sections.push(title + '\n' + prose.trim());
            });
            return sections.join('\n');
        }

        // Flat fallback: walk text nodes directly
        const walker = document.createTreeWalker(clone, NodeFilter.SHOW_TEXT);
        const lines = [];
        let node;
        while ((node = walker.nextNode())) {
            const text = node.textContent.trim();
            if (text) lines.push(text);
        }
        return lines.join('\n');
    })(arguments[0]);
"#;

/// Normalize whitespace, strip control characters and drop noise lines.
pub fn clean_extracted_text(raw: &str) -> String {
    let mut lines = Vec::new();
    for line in raw.lines() {
        let cleaned: String = line
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect();
        let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.chars().count() >= MIN_LINE_CHARS {
            lines.push(normalized);
        }
    }
    lines.join("\n")
}

/// Truncate to `budget` characters, appending the truncation marker when
/// anything was cut. Text at or under the budget passes through unchanged.
pub fn truncate_with_marker(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(budget).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Heuristic: is this page public enough for a third-party readability
/// service? Local hosts and URLs carrying private-area markers are not.
pub fn is_public_url(page_url: &str) -> bool {
    let parsed = match url::Url::parse(page_url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return false,
    }

    match parsed.host_str() {
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | None => return false,
        Some(_) => {}
    }

    let lower = page_url.to_lowercase();
    !PRIVATE_URL_MARKERS.iter().any(|m| lower.contains(m))
}

/// Request a markdown rendering of the page from the readability service
async fn fetch_readability(endpoint: &str, page_url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;

    let response = client
        .post(endpoint)
        .json(&json!({ "url": page_url }))
        .send()
        .await
        .context("Readability service request failed")?;

    if !response.status().is_success() {
        anyhow::bail!(
            "Readability service returned HTTP {}",
            response.status().as_u16()
        );
    }

    Ok(response.text().await?)
}

/// Scrape the current page directly and clean the result
pub async fn scrape(browser: &Browser) -> Result<String> {
    let raw = browser
        .execute(EXTRACT_SCRIPT, vec![json!(STRIP_SELECTORS)])
        .await?;
    let raw = raw.as_str().unwrap_or_default();
    Ok(truncate_with_marker(&clean_extracted_text(raw), CHAR_BUDGET))
}

/// Build a fresh PageContext for the current page.
///
/// Readability-service and screenshot failures degrade silently; only a
/// failure of the direct scrape itself is an error.
pub async fn capture(browser: &Browser, opts: &CaptureOptions) -> Result<PageContext> {
    let page_url = browser.current_url().await?;

    let mut text = None;
    if let Some(endpoint) = &opts.readability_url {
        if is_public_url(&page_url) {
            match fetch_readability(endpoint, &page_url).await {
                Ok(markdown) if markdown.chars().count() >= MIN_READABLE_CHARS => {
                    debug!("Using readability service output");
                    text = Some(truncate_with_marker(&markdown, CHAR_BUDGET));
                }
                Ok(_) => {
                    debug!("Readability output too thin, falling back to scraping");
                }
                Err(e) => {
                    warn!("Readability service failed, falling back to scraping: {}", e);
                }
            }
        } else {
            debug!("Page judged non-public, skipping readability service");
        }
    }

    let text = match text {
        Some(t) => t,
        None => scrape(browser).await?,
    };

    let screenshot = if opts.screenshot {
        match browser.screenshot_base64().await {
            Ok(data) => Some(data),
            Err(e) => {
                // Screenshot capture is best-effort
                warn!("Screenshot capture failed, continuing text-only: {}", e);
                None
            }
        }
    } else {
        None
    };

    info!(
        "Captured page context: {} chars, screenshot: {}",
        text.chars().count(),
        screenshot.is_some()
    );

    Ok(PageContext { text, screenshot })
}

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;
