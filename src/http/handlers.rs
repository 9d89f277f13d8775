//! Route handlers.
//!
//! Store calls are synchronous, so each handler runs its store work on the
//! blocking pool.

use super::error::ApiError;
use super::requests::{
    AppendMessageRequest, CreateConversationRequest, MarkMessageRequest, MessageResponse,
    SearchQuery, SummaryResponse, TagMessageRequest,
};
use super::AppState;
use crate::models::{
    BaseMessage, Conversation, ConversationCreated, Identity, Message, MessageId,
};
use crate::{Error, Result};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

type ApiResult<T> = std::result::Result<T, ApiError>;

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "join_blocking_task".to_string(),
            cause: e.to_string(),
        })?
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// `PUT /conversation`
pub async fn create_conversation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateConversationRequest>, JsonRejection>,
) -> ApiResult<Json<ConversationCreated>> {
    let Json(request) = payload?;
    let identity = Identity::parse(request.user_identity)?;
    let seed = state.seed.clone();

    let created =
        run_blocking(move || state.store.create_conversation(&identity, seed)).await?;
    Ok(Json(created))
}

/// `GET /conversation/{userIdentity}`
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(user_identity): Path<String>,
) -> ApiResult<Json<Conversation>> {
    let identity = Identity::for_lookup(user_identity)?;
    let conversation = run_blocking(move || state.store.get_conversation(&identity)).await?;
    Ok(Json(conversation))
}

/// `DELETE /conversation/{userIdentity}`
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(user_identity): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let identity = Identity::for_lookup(user_identity)?;
    let message = format!("Conversation for {identity} deleted");
    run_blocking(move || state.store.delete_conversation(&identity)).await?;
    Ok(Json(MessageResponse { message }))
}

/// `POST /add/conversation`
pub async fn append_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AppendMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let Json(request) = payload?;
    let identity = Identity::for_lookup(request.user_identity)?;
    if let Some(claimed) = request.conversation_id.as_deref() {
        tracing::trace!(conversation_id = claimed, "Ignoring client conversation id");
    }

    let base = BaseMessage::from(request.message);
    let message = run_blocking(move || state.store.append_message(&identity, base)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /conversation/tag`
pub async fn tag_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TagMessageRequest>, JsonRejection>,
) -> ApiResult<Json<Message>> {
    let Json(request) = payload?;
    let identity = Identity::for_lookup(request.user_identity)?;
    let message_id = MessageId::new(request.message_id);

    let message = run_blocking(move || {
        state
            .store
            .tag_message(&identity, &message_id, request.tag)
    })
    .await?;
    Ok(Json(message))
}

/// `POST /conversation/mark`
pub async fn mark_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MarkMessageRequest>, JsonRejection>,
) -> ApiResult<Json<Message>> {
    let Json(request) = payload?;
    let identity = Identity::for_lookup(request.user_identity)?;
    let message_id = MessageId::new(request.message_id);

    let message = run_blocking(move || {
        state
            .store
            .mark_message(&identity, &message_id, request.read)
    })
    .await?;
    Ok(Json(message))
}

/// `GET /conversation/{userIdentity}/search?q=term`
pub async fn search_messages(
    State(state): State<AppState>,
    Path(user_identity): Path<String>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Message>>> {
    let Query(query) = query?;
    let identity = Identity::for_lookup(user_identity)?;
    let term = query.q.unwrap_or_default();

    let messages = run_blocking(move || state.store.search_messages(&identity, &term)).await?;
    Ok(Json(messages))
}

/// `GET /conversation/{userIdentity}/summary`
pub async fn summarize(
    State(state): State<AppState>,
    Path(user_identity): Path<String>,
) -> ApiResult<Json<SummaryResponse>> {
    let identity = Identity::for_lookup(user_identity)?;
    let summary = run_blocking(move || state.store.summarize(&identity)).await?;
    Ok(Json(SummaryResponse { summary }))
}
