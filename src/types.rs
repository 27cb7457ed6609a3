use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let (width, height) = s
            .split_once('x')
            .filter(|(w, h)| !w.contains('x') && !h.contains('x'))
            .ok_or_else(|| {
                anyhow::anyhow!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)")
            })?;
        Ok(ViewportSize {
            width: width
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?,
            height: height
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?,
        })
    }
}

/// How a field accepts text, which decides the insertion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Native `<input>` element, written through `.value`
    Input,
    /// Native `<textarea>` element, written through `.value`
    Textarea,
    /// Contenteditable region or rich-text editor container, written through `.innerHTML`
    Editable,
}

/// Bounding box of an element in page coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A candidate editable field discovered on the page.
///
/// The `selector` is a generated CSS path that re-locates the element inside
/// its owning document. `frame` is the index of the same-origin iframe the
/// field lives in, or `None` for the top document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Generated CSS path addressing the element within its document
    pub selector: String,
    /// Lowercase tag name
    pub tag: String,
    /// Value of the `type` attribute for inputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    /// Whether the element is contenteditable
    pub editable: bool,
    /// Bounding box at discovery time; recomputed on activation
    pub bounds: BoundingBox,
    pub visible: bool,
    /// Index of the same-origin iframe containing the field (None = top document)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<usize>,
}

impl FieldInfo {
    /// Insertion strategy for this field
    pub fn kind(&self) -> FieldKind {
        match self.tag.as_str() {
            "input" => FieldKind::Input,
            "textarea" => FieldKind::Textarea,
            _ => FieldKind::Editable,
        }
    }
}

/// Page context sent alongside the question. Built fresh per request,
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    /// Cleaned and truncated text summary of the page
    pub text: String,
    /// Base64-encoded PNG of the visible viewport, when capture succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

/// A conversation on the chat backend, surfaced to the user as a "project"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(alias = "uuid")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
