//! HTTP transport for the conversation store.
//!
//! Routes parse typed request bodies, call one store operation and map the
//! outcome to a status code:
//!
//! | Outcome | Status |
//! |---------|--------|
//! | success | 200 (201 for append) |
//! | not found | 404 |
//! | invalid payload or malformed JSON | 400 |
//! | storage unavailable | 503 |
//! | anything else | 500 |

mod error;
mod handlers;
mod requests;

pub use error::{ApiError, ErrorBody};
pub use requests::{
    AppendMessageRequest, CreateConversationRequest, MarkMessageRequest, MessageBody,
    MessageResponse, SearchQuery, SummaryResponse, TagMessageRequest,
};

use crate::models::BaseMessage;
use crate::services::ConversationStore;
use crate::storage::PersistenceBackend;
use crate::{Error, Result};
use axum::Router;
use axum::http::{HeaderValue, header};
use axum::routing::{get, post, put};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Store type served over HTTP.
pub type SharedStore = Arc<ConversationStore<Box<dyn PersistenceBackend>>>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The conversation store.
    pub store: SharedStore,
    /// Seed message for new conversations.
    pub seed: BaseMessage,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub const fn new(store: SharedStore, seed: BaseMessage) -> Self {
        Self { store, seed }
    }
}

/// Builds the router with CORS, request tracing and response headers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/conversation", put(handlers::create_conversation))
        .route(
            "/conversation/{userIdentity}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/conversation/{userIdentity}/search",
            get(handlers::search_messages),
        )
        .route(
            "/conversation/{userIdentity}/summary",
            get(handlers::summarize),
        )
        .route("/conversation/tag", post(handlers::tag_message))
        .route("/conversation/mark", post(handlers::mark_message))
        .route("/add/conversation", post(handlers::append_message))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves a host name or IP literal and port to a bind address.
///
/// # Errors
///
/// Returns an error if the host does not resolve.
pub async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let resolve_error = |cause: String| Error::OperationFailed {
        operation: "resolve_addr".to_string(),
        cause: format!("{host}:{port}: {cause}"),
    };

    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| resolve_error(e.to_string()))?
        .next()
        .ok_or_else(|| resolve_error("no addresses found".to_string()))
}

/// Serves the router on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "bind".to_string(),
            cause: format!("{addr}: {e}"),
        })?;

    let local = listener.local_addr().unwrap_or(addr);
    tracing::info!(addr = %local, backend = state.store.backend().name(), "Serving conversations over HTTP");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "serve".to_string(),
            cause: e.to_string(),
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down HTTP server");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_addr_accepts_ip_literal() {
        let addr = resolve_addr("127.0.0.1", 4943).await.unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4943)));
    }

    #[tokio::test]
    async fn test_resolve_addr_accepts_hostname() {
        let addr = resolve_addr("localhost", 4943).await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 4943);
    }

    #[tokio::test]
    async fn test_resolve_addr_rejects_garbage() {
        assert!(resolve_addr("not a host", 4943).await.is_err());
    }
}
