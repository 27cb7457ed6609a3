//! Chat backend client.
//!
//! A small set of authenticated HTTP calls against the chat service: list
//! organizations (doubles as the login check), list conversations, create a
//! conversation, post a message, and poll the transcript for the answer.
//! Auth rides on the ambient session cookie; there is no other credential
//! handling, and failed calls are never retried.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::Project;

/// Initial transcript polling interval
pub const POLL_INITIAL: Duration = Duration::from_secs(2);

/// Backoff multiplier applied after each empty poll
pub const POLL_BACKOFF: f64 = 1.5;

/// Polling interval cap
pub const POLL_MAX: Duration = Duration::from_secs(10);

/// Overall deadline for an answer
pub const ANSWER_DEADLINE: Duration = Duration::from_secs(90);

/// Maximum length of a generated conversation name
pub const NAME_MAX_CHARS: usize = 50;

/// Marker embedding a screenshot into a prompt, closed by `]]`
pub const IMAGE_MARKER_OPEN: &str = "[[screenshot:";
pub const IMAGE_MARKER_CLOSE: &str = "]]";

/// Errors from the chat backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("chat backend returned HTTP {status}")]
    Status { status: u16 },
    #[error("chat backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no answer from the conversation within {0:?} (request timed out)")]
    AnswerTimeout(Duration),
    #[error("chat backend session is not logged in")]
    NotLoggedIn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ConversationTranscript {
    #[allow(dead_code)]
    uuid: String,
    #[serde(default)]
    chat_messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConversationSummary {
    uuid: String,
    name: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Derive a conversation name from the question: control characters
/// stripped, whitespace collapsed, truncated to `NAME_MAX_CHARS` with an
/// ellipsis.
pub fn conversation_name(question: &str) -> String {
    // Keep whitespace controls (\n, \t) so collapsing still separates words
    let cleaned: String = question
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "New conversation".to_string();
    }
    if collapsed.chars().count() <= NAME_MAX_CHARS {
        return collapsed;
    }
    let mut name: String = collapsed.chars().take(NAME_MAX_CHARS).collect();
    name.push('…');
    name
}

/// Split an embedded image marker out of a prompt. Returns the prompt with
/// the marker removed and the base64 payload, if any.
pub fn split_image_marker(prompt: &str) -> (String, Option<String>) {
    let Some(start) = prompt.find(IMAGE_MARKER_OPEN) else {
        return (prompt.to_string(), None);
    };
    let payload_start = start + IMAGE_MARKER_OPEN.len();
    let Some(end_rel) = prompt[payload_start..].find(IMAGE_MARKER_CLOSE) else {
        return (prompt.to_string(), None);
    };
    let payload = prompt[payload_start..payload_start + end_rel].to_string();
    let mut text = String::with_capacity(prompt.len());
    text.push_str(&prompt[..start]);
    text.push_str(&prompt[payload_start + end_rel + IMAGE_MARKER_CLOSE.len()..]);
    (text.trim().to_string(), Some(payload))
}

/// Client for the chat service HTTP API
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client for the given backend. The session cookie, when
    /// present, is attached to every request.
    pub fn new(base_url: &str, session_cookie: Option<&str>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(cookie) = session_cookie {
            headers.insert(
                reqwest::header::COOKIE,
                format!("sessionKey={}", cookie).parse()?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Public base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser-facing URL of a conversation
    pub fn conversation_url(&self, conversation_id: &str) -> String {
        format!("{}/chat/{}", self.base_url, conversation_id)
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// List organizations. Also serves as the login-status check: a 401/403
    /// here means the ambient session is not authenticated.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, BackendError> {
        let response = self.http.get(self.api("/organizations")).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Login check: true when the backend accepts the session
    pub async fn check_login(&self) -> Result<bool, BackendError> {
        match self.list_organizations().await {
            Ok(_) => Ok(true),
            Err(BackendError::Status { status: 401 | 403 }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// First organization of the session, used as the default scope
    pub async fn primary_organization(&self) -> Result<Organization, BackendError> {
        self.list_organizations()
            .await?
            .into_iter()
            .next()
            .ok_or(BackendError::NotLoggedIn)
    }

    /// List recent conversations ("projects") under an organization
    pub async fn list_conversations(&self, org_id: &str) -> Result<Vec<Project>, BackendError> {
        let response = self
            .http
            .get(self.api(&format!("/organizations/{}/chat_conversations", org_id)))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let summaries: Vec<ConversationSummary> = response.json().await?;
        Ok(summaries
            .into_iter()
            .map(|s| Project {
                id: s.uuid,
                name: s.name,
                updated_at: s.updated_at,
            })
            .collect())
    }

    /// Create a fresh conversation named after the question
    pub async fn create_conversation(
        &self,
        org_id: &str,
        question: &str,
    ) -> Result<Conversation, BackendError> {
        let uuid = Uuid::new_v4().to_string();
        let name = conversation_name(question);
        debug!("Creating conversation '{}' ({})", name, uuid);

        let response = self
            .http
            .post(self.api(&format!("/organizations/{}/chat_conversations", org_id)))
            .json(&json!({ "uuid": uuid, "name": name }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Post the prompt to a conversation. An embedded image marker is
    /// stripped from the text and sent as a single base64 attachment.
    pub async fn send_message(
        &self,
        org_id: &str,
        conversation_id: &str,
        prompt: &str,
    ) -> Result<(), BackendError> {
        let (text, image) = split_image_marker(prompt);

        let mut body = json!({ "text": text });
        if let Some(data) = image {
            body["attachments"] = json!([{
                "media_type": "image/png",
                "data": data,
            }]);
        }

        let response = self
            .http
            .post(self.api(&format!(
                "/organizations/{}/chat_conversations/{}/messages",
                org_id, conversation_id
            )))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn fetch_transcript(
        &self,
        org_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, BackendError> {
        let response = self
            .http
            .get(self.api(&format!(
                "/organizations/{}/chat_conversations/{}",
                org_id, conversation_id
            )))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let transcript: ConversationTranscript = response.json().await?;
        Ok(transcript.chat_messages)
    }

    /// Poll the conversation transcript until the answer arrives.
    ///
    /// The answer is the text of the second message (the first is our own
    /// prompt). Polls every `POLL_INITIAL`, backing off by `POLL_BACKOFF`
    /// up to `POLL_MAX`, until `ANSWER_DEADLINE`.
    pub async fn fetch_answer(
        &self,
        org_id: &str,
        conversation_id: &str,
    ) -> Result<String, BackendError> {
        let started = tokio::time::Instant::now();
        let mut interval = POLL_INITIAL;

        loop {
            tokio::time::sleep(interval).await;

            let messages = self.fetch_transcript(org_id, conversation_id).await?;
            if let Some(answer) = messages.get(1) {
                if !answer.text.is_empty() {
                    info!(
                        "Answer received after {:.1}s",
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(answer.text.clone());
                }
            }

            if started.elapsed() + interval > ANSWER_DEADLINE {
                return Err(BackendError::AnswerTimeout(ANSWER_DEADLINE));
            }

            interval = std::cmp::min(interval.mul_f64(POLL_BACKOFF), POLL_MAX);
            debug!("Answer not ready, next poll in {:?}", interval);
        }
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;
