//! HTTP Handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use advisor_core::{Conversation, GenerationOptions, Message};
use coin_resolver::{prompts::ADVISOR_PROMPT, CoinQuote, Resolution, UNRESOLVED_MESSAGE};

use crate::state::AppState;

/// Context budget for the advisory conversation
const CHAT_CONTEXT_TOKENS: u32 = 6000;

const DEFAULT_TRENDING_LIMIT: usize = 5;
const MAX_TRENDING_LIMIT: usize = 50;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub llm_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: bool,
    pub quote: Option<CoinQuote>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub quote: Option<CoinQuote>,
    pub conversation_id: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TrendingCoin {
    pub name: String,
    pub symbol: String,
    pub logo: Option<String>,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub coins: Vec<TrendingCoin>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_string(),
        llm_connected,
    })
}

/// Resolve free text to a USD quote
pub async fn resolve_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_QUERY", "query must not be empty"));
    }

    let response = match state.pipeline.resolve(&payload.query).await {
        Resolution::Resolved(quote) => ResolveResponse {
            resolved: true,
            message: quote.summary(),
            quote: Some(quote),
        },
        Resolution::Unresolved => ResolveResponse {
            resolved: false,
            quote: None,
            message: UNRESOLVED_MESSAGE.into(),
        },
    };
    Ok(Json(response))
}

/// Advisory chat: resolve the coin, then let the model advise on the quote
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "message must not be empty"));
    }

    let model = payload.model.clone().unwrap_or_else(|| state.default_model.clone());
    let conversation_id = payload
        .conversation_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let Some(quote) = state.pipeline.resolve(&payload.message).await.into_quote() else {
        return Ok(Json(ChatResponse {
            message: UNRESOLVED_MESSAGE.into(),
            quote: None,
            conversation_id,
            model,
        }));
    };

    let mut conversation = Conversation::with_system_prompt(ADVISOR_PROMPT).with_max_context(CHAT_CONTEXT_TOKENS);
    conversation.extend_history(payload.history);
    conversation.push(Message::user(format!(
        "Market data: {}\n\n{}",
        quote.summary(),
        payload.message
    )));
    conversation.truncate_to_fit();

    let options = GenerationOptions {
        model: model.clone(),
        ..Default::default()
    };

    let completion = state
        .provider
        .complete(conversation.messages(), &options)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, provider = state.provider.name(), "advisory generation failed");
            api_error(StatusCode::BAD_GATEWAY, "LLM_ERROR", e.user_message())
        })?;

    Ok(Json(ChatResponse {
        message: completion.content,
        quote: Some(quote),
        conversation_id,
        model: completion.model,
    }))
}

/// Most-searched coins with their logos
pub async fn trending_handler(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<TrendingResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TRENDING_LIMIT).clamp(1, MAX_TRENDING_LIMIT);

    let searched = state.tracker.trending(limit).await.map_err(|e| {
        tracing::error!(error = %e, "failed to load trending coins");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TRENDING_ERROR",
            "Failed to fetch trending coins",
        )
    })?;

    let aggregator = state.pipeline.aggregator();
    let logos = join_all(searched.iter().map(|coin| aggregator.logo(&coin.name))).await;

    let coins = searched
        .into_iter()
        .zip(logos)
        .map(|(coin, logo)| TrendingCoin {
            name: coin.name,
            symbol: coin.symbol,
            logo,
            count: coin.count,
        })
        .collect();

    Ok(Json(TrendingResponse { coins }))
}
