//! Question inference.
//!
//! A field rarely states its question outright; the surrounding DOM usually
//! does. One JS pass harvests every candidate, then a pure resolver applies
//! the priority order: label-for, placeholder, aria-label, nearest ancestor
//! heading/label, preceding sibling text, and (for editable regions) the
//! first prompt-like element of the enclosing block.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::{BufRead, Write};

use crate::browser::Browser;
use crate::types::FieldInfo;

/// Everything the page offered as a possible question for one field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionCandidates {
    pub label_for: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub ancestor_heading: Option<String>,
    pub preceding_text: Option<String>,
    pub container_prompt: Option<String>,
}

/// Which candidate won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    LabelFor,
    Placeholder,
    AriaLabel,
    AncestorHeading,
    PrecedingSibling,
    ContainerPrompt,
}

/// Resolve the candidates in priority order. Whitespace-only candidates are
/// skipped. `None` means nothing was found and the caller should prompt the
/// user interactively.
pub fn resolve(candidates: &QuestionCandidates) -> Option<(String, QuestionSource)> {
    let pick = |text: &Option<String>, source: QuestionSource| {
        text.as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| (t.to_string(), source))
    };

    pick(&candidates.label_for, QuestionSource::LabelFor)
        .or_else(|| pick(&candidates.placeholder, QuestionSource::Placeholder))
        .or_else(|| pick(&candidates.aria_label, QuestionSource::AriaLabel))
        .or_else(|| pick(&candidates.ancestor_heading, QuestionSource::AncestorHeading))
        .or_else(|| pick(&candidates.preceding_text, QuestionSource::PrecedingSibling))
        .or_else(|| pick(&candidates.container_prompt, QuestionSource::ContainerPrompt))
}

const GATHER_SCRIPT: &str = r#"
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

        const out = {
            label_for: null,
            placeholder: el.getAttribute('placeholder'),
            aria_label: el.getAttribute('aria-label'),
            ancestor_heading: null,
            preceding_text: null,
            container_prompt: null
        };

        if (el.id) {
            const label = doc.querySelector(
                'label[for="' + CSS.escape(el.id) + '"]');
            if (label) out.label_for = label.textContent.trim();
        }

        // Walk up the ancestor chain looking for a label or heading among
        // each ancestor's descendants, bounded at the body
        let ancestor = el.parentElement;
        while (ancestor && ancestor !== doc.body) {
            const heading = ancestor.querySelector(
                'label, legend, h1, h2, h3, h4, h5, h6');
            if (heading && heading.textContent.trim() &&
                !heading.contains(el)) {
                out.ancestor_heading = heading.textContent.trim();
                break;
            }
            ancestor = ancestor.parentElement;
        }

        // Nearest preceding sibling with non-empty text
        let sibling = el.previousElementSibling;
        while (sibling) {
            const text = sibling.textContent.trim();
            if (text) {
                out.preceding_text = text;
                break;
            }
            sibling = sibling.previousElementSibling;
        }

        // For editable regions: first prompt-like element of the enclosing
        // block container
        if (el.isContentEditable) {
            const block = el.closest(
                'section, article, form, fieldset, [class*="card"], [class*="cell"], [class*="block"]');
            if (block) {
                const prompt = block.querySelector(
                    'h1, h2, h3, h4, h5, h6, label, [class*="title"], [class*="question"], [class*="prompt"]');
                if (prompt && !prompt.contains(el) &&
                    prompt.textContent.trim()) {
                    out.container_prompt = prompt.textContent.trim();
                }
            }
        }

        return out;
    })(arguments[0], arguments[1]);
"#;

/// Collect question candidates for a field from the live page
pub async fn gather(browser: &Browser, field: &FieldInfo) -> Result<QuestionCandidates> {
    let result = browser
        .execute(GATHER_SCRIPT, vec![json!(field.selector), json!(field.frame)])
        .await?;
    if result.is_null() {
        anyhow::bail!(
            "No field found matching selector: {} (it may have been removed)",
            field.selector
        );
    }
    Ok(serde_json::from_value(result).unwrap_or_default())
}

/// Infer the question for a field, or None when the page offers nothing
pub async fn infer(
    browser: &Browser,
    field: &FieldInfo,
) -> Result<Option<(String, QuestionSource)>> {
    let candidates = gather(browser, field).await?;
    Ok(resolve(&candidates))
}

/// Apply the submission rules: a non-empty line is the question, an empty
/// line accepts the suggested default, and an empty line with no default
/// cancels (returns None). Cancelling is not an error.
pub fn resolve_submission(line: &str, default: Option<&str>) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return default.map(str::to_string).filter(|d| !d.is_empty());
    }
    Some(line.to_string())
}

/// Interactive question prompt: shown on stderr, read from stdin
pub fn prompt_interactive(default: Option<&str>) -> Result<Option<String>> {
    let mut stderr = std::io::stderr();
    match default {
        Some(d) => write!(stderr, "Question [{}]: ", d)?,
        None => write!(stderr, "Question: ")?,
    }
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(resolve_submission(&line, default))
}

#[cfg(test)]
#[path = "question_test.rs"]
mod question_test;
