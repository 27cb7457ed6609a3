//! Per-run state: the trigger state machine, the cached conversation URL,
//! and the ask pipeline that ties detection, inference, context capture,
//! the chat backend and insertion together.

use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, IMAGE_MARKER_CLOSE, IMAGE_MARKER_OPEN};
use crate::browser::Browser;
use crate::context::{self, CaptureOptions};
use crate::inserter::{self, InsertOptions};
use crate::question;
use crate::settings::Settings;
use crate::types::{FieldInfo, Project};

/// How long a finished conversation URL keeps answering repeat triggers
pub const CONVERSATION_URL_TTL: Duration = Duration::from_secs(10);

/// Whether a request is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Processing,
}

/// Result of pressing the trigger while a session exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// No request in flight, the caller should start one
    Started,
    /// A recent request finished; open its conversation instead
    OpenExisting(String),
    /// A request is already in flight and nothing is cached
    Busy,
}

/// Result of a completed ask pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    Answered {
        answer: String,
        conversation_url: String,
    },
    /// The user declined to provide a question; not an error
    Cancelled,
}

/// Owns all mutable per-run state. One session per CLI invocation.
pub struct Session {
    backend: BackendClient,
    settings: Settings,
    state: TriggerState,
    conversation_url: Option<(String, Instant)>,
    projects: Option<Vec<Project>>,
}

impl Session {
    pub fn new(settings: Settings) -> Result<Self> {
        let backend = BackendClient::new(
            &settings.backend_url,
            settings.session_cookie.as_deref(),
        )?;
        Ok(Self {
            backend,
            settings,
            state: TriggerState::Idle,
            conversation_url: None,
            projects: None,
        })
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Conversation URL from the last successful ask, if still fresh
    pub fn cached_conversation_url(&self) -> Option<&str> {
        match &self.conversation_url {
            Some((url, at)) if at.elapsed() < CONVERSATION_URL_TTL => Some(url),
            _ => None,
        }
    }

    /// Advance the trigger state machine. Only `Started` moves the session
    /// into `Processing`; the caller must pair it with `finish` or `fail`.
    pub fn trigger(&mut self) -> TriggerOutcome {
        if let Some(url) = self.cached_conversation_url() {
            debug!("Trigger while conversation URL is cached, reusing it");
            return TriggerOutcome::OpenExisting(url.to_string());
        }
        match self.state {
            TriggerState::Processing => TriggerOutcome::Busy,
            TriggerState::Idle => {
                self.state = TriggerState::Processing;
                TriggerOutcome::Started
            }
        }
    }

    /// Record success: back to idle, conversation URL cached for the TTL
    pub fn finish(&mut self, conversation_url: String) {
        self.state = TriggerState::Idle;
        self.conversation_url = Some((conversation_url, Instant::now()));
    }

    /// Record failure: back to idle, nothing cached
    pub fn fail(&mut self) {
        self.state = TriggerState::Idle;
        self.conversation_url = None;
    }

    /// Conversations list, fetched from the backend once and then served
    /// from the session cache.
    pub async fn projects(&mut self) -> Result<&[Project]> {
        if self.projects.is_none() {
            let org = self.backend.primary_organization().await?;
            let projects = self.backend.list_conversations(&org.uuid).await?;
            debug!("Fetched {} conversations", projects.len());
            self.projects = Some(projects);
        }
        Ok(self.projects.as_deref().unwrap_or_default())
    }

    /// Run the full pipeline for one field: resolve the question, capture
    /// page context, post to the backend, wait for the answer and insert it.
    ///
    /// The field reference captured at the start is the only one ever
    /// written to; if the user focuses another field while the answer is
    /// pending, insertion still targets the original field, and fails with
    /// a field-not-found error when that field has left the document.
    pub async fn ask(
        &mut self,
        browser: &Browser,
        field: &FieldInfo,
        explicit_question: Option<&str>,
    ) -> Result<AskOutcome> {
        let question = match self.resolve_question(browser, field, explicit_question).await? {
            Some(q) => q,
            None => {
                info!("No question provided, cancelling");
                return Ok(AskOutcome::Cancelled);
            }
        };
        info!("Question: {}", question);

        browser.notify("Working on an answer…", false).await;

        let opts = CaptureOptions {
            readability_url: self.settings.readability_url.clone(),
            screenshot: true,
        };
        let page = context::capture(browser, &opts).await?;
        debug!(
            "Captured {} chars of context (screenshot: {})",
            page.text.chars().count(),
            page.screenshot.is_some()
        );

        let prompt = compose_prompt(&question, &page.text, page.screenshot.as_deref());

        let result = self.ask_backend(&question, &prompt).await;
        let (answer, conversation_url) = match result {
            Ok(pair) => pair,
            Err(e) => {
                self.fail();
                browser
                    .notify(&format!("Request failed: {}", e), true)
                    .await;
                return Err(e);
            }
        };

        if let Err(e) = inserter::insert(browser, field, &answer, InsertOptions::default()).await {
            self.fail();
            return Err(e);
        }

        browser.notify("Answer inserted", false).await;
        self.finish(conversation_url.clone());
        Ok(AskOutcome::Answered {
            answer,
            conversation_url,
        })
    }

    /// Create the conversation, post the prompt and poll for the answer
    async fn ask_backend(&self, question: &str, prompt: &str) -> Result<(String, String)> {
        let org = self.backend.primary_organization().await?;
        let conversation = self
            .backend
            .create_conversation(&org.uuid, question)
            .await?;
        self.backend
            .send_message(&org.uuid, &conversation.uuid, prompt)
            .await?;
        let answer = self
            .backend
            .fetch_answer(&org.uuid, &conversation.uuid)
            .await?;
        Ok((answer, self.backend.conversation_url(&conversation.uuid)))
    }

    /// Question precedence: an explicit question wins; otherwise the page
    /// inference, used directly when `auto_detect` is on or offered as the
    /// prompt default when it is off.
    async fn resolve_question(
        &self,
        browser: &Browser,
        field: &FieldInfo,
        explicit: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(q) = explicit {
            let q = q.trim();
            if !q.is_empty() {
                return Ok(Some(q.to_string()));
            }
        }

        let inferred = question::infer(browser, field).await?;
        match inferred {
            Some((q, source)) if self.settings.auto_detect => {
                debug!("Inferred question from {:?}", source);
                Ok(Some(q))
            }
            Some((q, _)) => question::prompt_interactive(Some(&q)),
            None => {
                warn!("Could not infer a question for {}", field.selector);
                question::prompt_interactive(None)
            }
        }
    }
}

/// Build the prompt sent to the backend: the question, the page context,
/// and the embedded screenshot marker when one was captured.
pub fn compose_prompt(question: &str, page_text: &str, screenshot: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str(question);
    if !page_text.is_empty() {
        prompt.push_str("\n\nPage context:\n");
        prompt.push_str(page_text);
    }
    if let Some(data) = screenshot {
        prompt.push_str("\n\n");
        prompt.push_str(IMAGE_MARKER_OPEN);
        prompt.push_str(data);
        prompt.push_str(IMAGE_MARKER_CLOSE);
    }
    prompt
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
