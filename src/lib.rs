//! # fieldpilot
#![allow(clippy::uninlined_format_args)]
//!
//! CLI tool that fills web form fields with answers from a chat backend.
//!
//! Detects editable fields on a page, works out the implicit question a field
//! is asking, captures the surrounding page context, asks the chat backend,
//! and inserts the answer back into the field.
//!
//! ## Installation
//!
//! ```bash
//! cargo install fieldpilot
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # List the editable fields on a page
//! fieldpilot detect "https://example.com/apply"
//!
//! # Infer the question a field is asking
//! fieldpilot infer "https://example.com/apply" "textarea#motivation"
//!
//! # Fill a field end to end (question inference, backend, insertion)
//! fieldpilot fill "https://example.com/apply" --selector "textarea#motivation"
//!
//! # Or let focus pick the field: omit --selector and click the field
//! fieldpilot fill "https://example.com/apply" --no-headless
//!
//! # Insert literal text without the backend
//! fieldpilot insert "https://example.com/apply" "input#name" "Jane Doe"
//!
//! # Capture the page context that would accompany a question
//! fieldpilot context "https://example.com/apply" --screenshot
//! ```
//!
//! ### Backend Setup
//!
//! ```bash
//! # Store the ambient session cookie and check it works
//! fieldpilot config set session_cookie "sk-..."
//! fieldpilot status
//!
//! # List conversations
//! fieldpilot projects
//! ```
//!
//! ### Browser and Viewport Options
//!
//! ```bash
//! # Use Chrome instead of Firefox (default)
//! fieldpilot detect "https://example.com" --browser chrome
//!
//! # Set custom viewport size
//! fieldpilot detect "https://example.com" --viewport 375x667
//!
//! # Run in visible mode (not headless)
//! fieldpilot fill "https://example.com" --no-headless
//! ```

/// Chat backend HTTP client
pub mod backend;

/// WebDriver browser control
pub mod browser;

/// Page context capture and cleanup
pub mod context;

/// Editable field discovery
pub mod detector;

/// Automatic WebDriver process management
pub mod driver;

/// Focus signal collection and arbitration
pub mod focus;

/// Answer insertion into fields
pub mod inserter;

/// Question inference from page structure
pub mod question;

/// Trigger state machine and the ask pipeline
pub mod session;

/// Persisted user settings
pub mod settings;

/// Shared type definitions
pub mod types;

pub use backend::BackendClient;
pub use browser::{Browser, BrowserType};
pub use session::Session;
pub use settings::{Settings, SettingsStore};
pub use types::{BoundingBox, FieldInfo, FieldKind, OutputFormat, PageContext, Project, ViewportSize};
