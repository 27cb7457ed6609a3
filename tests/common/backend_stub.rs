// Stub chat backend mimicking the conversation API

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
#[allow(dead_code)]
pub struct StubState {
    /// Whether /api/organizations accepts the caller
    pub logged_in: Arc<AtomicBool>,
    /// When set, every route answers with this status
    pub fail_status: Arc<Mutex<Option<u16>>>,
    /// The assistant reply served in transcripts, None = still generating
    pub answer: Arc<Mutex<Option<String>>>,
    /// Bodies posted to the messages endpoint
    pub messages: Arc<Mutex<Vec<Value>>>,
    /// Conversations created so far, (uuid, name)
    pub conversations: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            logged_in: Arc::new(AtomicBool::new(true)),
            fail_status: Arc::new(Mutex::new(None)),
            answer: Arc::new(Mutex::new(Some("Stubbed answer".to_string()))),
            messages: Arc::new(Mutex::new(Vec::new())),
            conversations: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[allow(dead_code)]
pub fn create_app(state: StubState) -> Router {
    Router::new()
        .route("/api/organizations", get(list_organizations))
        .route(
            "/api/organizations/:org/chat_conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/organizations/:org/chat_conversations/:id",
            get(get_transcript),
        )
        .route(
            "/api/organizations/:org/chat_conversations/:id/messages",
            axum::routing::post(post_message),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the stub on an ephemeral port and return its base URL
#[allow(dead_code)]
pub async fn spawn(state: StubState) -> String {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub backend");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub backend died");
    });
    format!("http://{}", addr)
}

async fn forced_failure(state: &StubState) -> Option<StatusCode> {
    let fail = state.fail_status.lock().await;
    fail.map(|code| StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
}

async fn list_organizations(State(state): State<StubState>) -> impl IntoResponse {
    if let Some(status) = forced_failure(&state).await {
        return (status, Json(json!({}))).into_response();
    }
    if !state.logged_in.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    Json(json!([{ "uuid": "org-1", "name": "Stub Org" }])).into_response()
}

async fn list_conversations(
    State(state): State<StubState>,
    Path(_org): Path<String>,
) -> impl IntoResponse {
    if let Some(status) = forced_failure(&state).await {
        return (status, Json(json!({}))).into_response();
    }
    let conversations = state.conversations.lock().await;
    let list: Vec<Value> = conversations
        .iter()
        .map(|(uuid, name)| {
            json!({ "uuid": uuid, "name": name, "updated_at": "2025-01-15T10:00:00Z" })
        })
        .collect();
    Json(Value::Array(list)).into_response()
}

async fn create_conversation(
    State(state): State<StubState>,
    Path(_org): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Some(status) = forced_failure(&state).await {
        return (status, Json(json!({}))).into_response();
    }
    let uuid = body["uuid"].as_str().unwrap_or("conv-1").to_string();
    let name = body["name"].as_str().unwrap_or("").to_string();
    state
        .conversations
        .lock()
        .await
        .push((uuid.clone(), name.clone()));
    Json(json!({ "uuid": uuid, "name": name })).into_response()
}

async fn post_message(
    State(state): State<StubState>,
    Path((_org, _id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Some(status) = forced_failure(&state).await {
        return (status, Json(json!({}))).into_response();
    }
    state.messages.lock().await.push(body);
    Json(json!({ "ok": true })).into_response()
}

async fn get_transcript(
    State(state): State<StubState>,
    Path((_org, id)): Path<(String, String)>,
) -> impl IntoResponse {
    if let Some(status) = forced_failure(&state).await {
        return (status, Json(json!({}))).into_response();
    }
    let messages = state.messages.lock().await;
    let mut chat_messages = Vec::new();
    if let Some(first) = messages.first() {
        chat_messages.push(json!({
            "sender": "human",
            "text": first["text"].as_str().unwrap_or(""),
        }));
        if let Some(answer) = state.answer.lock().await.as_ref() {
            chat_messages.push(json!({ "sender": "assistant", "text": answer }));
        }
    }
    Json(json!({ "uuid": id, "chat_messages": chat_messages })).into_response()
}
