//! API service routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreditOperation, GiftStatus, NewGift, NewMessage, NewUser, UserResponse},
    seed,
    state::AppState,
    validation,
};

/// Request for a credit balance adjustment
#[derive(Deserialize)]
pub struct AdjustCreditsRequest {
    pub amount: i64,
    pub operation: CreditOperation,
}

/// Response for a credit balance adjustment
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustCreditsResponse {
    pub new_balance: i64,
}

/// Request naming the catalog character to purchase or select
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterActionRequest {
    pub character_id: String,
}

/// Request identifying the user acting on a gift
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftActionRequest {
    pub user_id: Uuid,
}

/// Response for a newly created gift
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGiftResponse {
    pub gift_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Response for a settled gift
#[derive(Serialize)]
pub struct GiftStatusResponse {
    pub status: GiftStatus,
}

/// Query parameters for a conversation listing
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub user_id: Uuid,
    pub peer_id: Uuid,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user))
        .route("/users/:id/credits", post(adjust_credits))
        .route("/users/:id/credits/history", get(get_credit_history))
        .route("/users/:id/inventory", get(get_inventory))
        .route("/users/:id/purchase", post(purchase_character))
        .route("/users/:id/select-character", post(select_character))
        .route("/users/:id/gifts/pending", get(get_pending_gifts))
        .route("/characters", get(get_characters))
        .route("/characters/:id", get(get_character))
        .route("/gifts", post(send_gift))
        .route("/gifts/:id/claim", post(claim_gift))
        .route("/gifts/:id/reject", post(reject_gift))
        .route("/messages", post(send_message).get(get_conversation))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let starter = state
        .catalog_repository
        .get_by_id(seed::STARTER_CHARACTER)
        .await?
        .ok_or(ApiError::Storage(sqlx::Error::RowNotFound))?;

    let user = state.user_repository.create(&payload, &starter).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(UserResponse::from(user)))
}

/// Adjust a user's credit balance
pub async fn adjust_credits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustCreditsRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_balance = state
        .ledger_repository
        .adjust_balance(id, payload.amount, payload.operation)
        .await?;

    Ok(Json(AdjustCreditsResponse { new_balance }))
}

/// Get a user's transaction history
pub async fn get_credit_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let history = state.ledger_repository.history(id).await?;

    Ok(Json(history))
}

/// Get a user's inventory, newest items first
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let items = state.inventory_repository.list_by_owner(id).await?;

    Ok(Json(items))
}

/// Purchase a catalog character
pub async fn purchase_character(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CharacterActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let character = state
        .catalog_repository
        .get_by_id(&payload.character_id)
        .await?
        .ok_or(ApiError::NotFound("Character"))?;

    let new_balance = state
        .user_repository
        .purchase_character(id, &character)
        .await?;

    Ok(Json(AdjustCreditsResponse { new_balance }))
}

/// Select the user's current character
pub async fn select_character(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CharacterActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .select_character(id, &payload.character_id)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// List the character catalog
pub async fn get_characters(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let characters = state.catalog_repository.list_active().await?;

    Ok(Json(characters))
}

/// Get a catalog character by ID
pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let character = state
        .catalog_repository
        .get_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound("Character"))?;

    Ok(Json(character))
}

/// Send a gift
pub async fn send_gift(
    State(state): State<AppState>,
    Json(payload): Json<NewGift>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_gift_item(payload.item_type, &payload.item_data)
        .map_err(ApiError::Validation)?;

    let gift = state.gift_repository.send(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendGiftResponse {
            gift_id: gift.id,
            created_at: gift.created_at,
        }),
    ))
}

/// List a user's pending gifts, most recent first
pub async fn get_pending_gifts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let gifts = state.gift_repository.list_pending_for_recipient(id).await?;

    Ok(Json(gifts))
}

/// Claim a pending gift
pub async fn claim_gift(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GiftActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let gift = state.gift_repository.claim(id, payload.user_id).await?;

    Ok(Json(GiftStatusResponse { status: gift.status }))
}

/// Reject a pending gift
pub async fn reject_gift(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GiftActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let gift = state.gift_repository.reject(id, payload.user_id).await?;

    Ok(Json(GiftStatusResponse { status: gift.status }))
}

/// Send a direct message
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<NewMessage>,
) -> ApiResult<impl IntoResponse> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::Validation("Message body is required".to_string()));
    }

    let message = state.message_repository.send(&payload).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// List the conversation between two users, oldest first
pub async fn get_conversation(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> ApiResult<impl IntoResponse> {
    let messages = state
        .message_repository
        .conversation(query.user_id, query.peer_id)
        .await?;

    Ok(Json(messages))
}
