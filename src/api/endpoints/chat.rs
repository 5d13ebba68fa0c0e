//! `POST /api/chat`: answer one patient question.

use std::time::Instant;

use axum::extract::State;
use axum::Extension;
use axum::Json;
use rusqlite::Connection;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ChatRequest, UserContext};
use crate::core_state::CoreState;
use crate::pipeline::rag::conversation::ConversationManager;
use crate::pipeline::rag::orchestrator::ChatPipeline;
use crate::pipeline::rag::profile::PatientProfiles;
use crate::pipeline::rag::retrieval::FtsChunkSearch;
use crate::pipeline::rag::types::{ChatResponse, NoStorage, PatientQuery, ResponseLength};

pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }

    let response_length = req
        .response_length
        .as_deref()
        .map(ResponseLength::from_str_lossy)
        .unwrap_or_default();
    let session_id = req.session().to_string();
    let core = ctx.core.clone();

    // Pipeline is synchronous (SQLite + blocking HTTP providers).
    let response = tokio::task::spawn_blocking(move || {
        answer_blocking(&core, &user.user_id, &session_id, &req.message, response_length)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Chat task failed: {e}")))??;

    Ok(Json(response))
}

fn answer_blocking(
    core: &CoreState,
    user_id: &str,
    session_id: &str,
    message: &str,
    response_length: ResponseLength,
) -> Result<ChatResponse, ApiError> {
    let started = Instant::now();
    let query = |conversation_id| PatientQuery {
        text: message.to_string(),
        user_id: user_id.to_string(),
        response_length,
        conversation_id,
    };

    let response = match core.open_db() {
        Ok(conn) => answer_with_storage(&conn, core, user_id, session_id, message, query)?,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Database unavailable, answering without references, profile or history"
            );
            ChatPipeline::new(&NoStorage, &NoStorage, &NoStorage, core.generator())
                .answer(&query(None))?
        }
    };

    tracing::info!(
        query_type = response.query_type.as_str(),
        is_urgent = response.is_urgent,
        retrieved_count = response.retrieved_count,
        api_used = ?response.api_used,
        latency_ms = started.elapsed().as_millis() as u64,
        "Chat answered"
    );

    Ok(response)
}

fn answer_with_storage(
    conn: &Connection,
    core: &CoreState,
    user_id: &str,
    session_id: &str,
    message: &str,
    query: impl Fn(Option<Uuid>) -> PatientQuery,
) -> Result<ChatResponse, ApiError> {
    let conversations = ConversationManager::new(conn);

    let conversation_id = conversations
        .find_for_session(user_id, session_id)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Conversation lookup failed, answering without history");
            None
        });

    let search = FtsChunkSearch::new(conn);
    let profiles = PatientProfiles::new(conn);
    let response = ChatPipeline::new(&search, &profiles, &conversations, core.generator())
        .answer(&query(conversation_id))?;

    // The answer is returned even when the exchange cannot be stored.
    if let Err(e) =
        conversations.record_exchange(user_id, session_id, message.trim(), &response.answer)
    {
        tracing::warn!(error = %e, "Failed to record chat exchange");
    }

    Ok(response)
}
