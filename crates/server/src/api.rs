//! JSON HTTP API of a ledger node.
//!
//! Every response body is JSON. Rejections carry `{"message": ...}` with a
//! 4xx status; registry or ledger failures are reported as 500.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_chain::{Blockchain, BlockchainError};
use ledger_consensus::{MiningError, PeerClient, CHAIN_PATH, NODES_PATH, REGISTER_PATH};
use ledger_core::{NodeRecord, PublicKey, RegistryError, SignedBlock, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Mining(#[from] MiningError),

    #[error("Non-validators cannot make a node a validator")]
    NotAValidator,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Malformed(#[from] JsonRejection),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Internal(String),
}

impl From<BlockchainError> for ApiError {
    fn from(err: BlockchainError) -> Self {
        match err {
            BlockchainError::Mining(e) => ApiError::Mining(e),
            BlockchainError::Registry(e) => ApiError::Registry(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Mining(MiningError::NotAValidator) => (
                StatusCode::BAD_REQUEST,
                "Cannot mine block since you are not a validator".to_string(),
            ),
            ApiError::Mining(MiningError::ConsecutiveMining) => (
                StatusCode::BAD_REQUEST,
                "Cannot mine block since you mined the last block".to_string(),
            ),
            ApiError::Mining(MiningError::Registry(e)) | ApiError::Registry(e) => {
                error!(error = %e, "registry failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::NotAValidator => (
                StatusCode::BAD_REQUEST,
                ApiError::NotAValidator.to_string(),
            ),
            ApiError::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Malformed(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTransaction {
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
}

/// A node address and identity, as posted to the node endpoints.
#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    pub url: String,
    pub public_key: String,
}

impl NodeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.url.trim().is_empty() {
            return Err(ApiError::InvalidInput("url cannot be empty".into()));
        }
        PublicKey::from_identity(&self.public_key)
            .map_err(|e| ApiError::InvalidInput(format!("invalid public_key: {e}")))?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsensusResponse {
    pub message: String,
    pub chain: Vec<SignedBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

// ============================================================================
// Router
// ============================================================================

/// Build the router for `node`.
pub fn router<C: PeerClient + 'static>(node: Arc<Blockchain<C>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route(CHAIN_PATH, get(get_chain::<C>))
        .route("/api/transactions/unverified", get(get_unverified::<C>))
        .route("/api/transactions/verified", get(get_verified::<C>))
        .route("/api/transactions/new", post(new_transaction::<C>))
        .route("/api/mine", get(mine::<C>))
        .route("/api/verify_chain", get(verify_chain::<C>))
        .route(NODES_PATH, get(get_nodes::<C>))
        .route("/api/nodes/resolve", get(resolve::<C>))
        .route("/api/nodes/validatorify", post(validatorify::<C>))
        .route(REGISTER_PATH, post(register::<C>))
        .with_state(node)
        .layer(cors)
}

// ============================================================================
// Handlers
// ============================================================================

type Node<C> = State<Arc<Blockchain<C>>>;

async fn get_chain<C: PeerClient>(State(node): Node<C>) -> Json<Vec<SignedBlock>> {
    Json(node.chain().await)
}

async fn get_unverified<C: PeerClient>(State(node): Node<C>) -> Json<Vec<Transaction>> {
    Json(node.pending_transactions().await)
}

async fn get_verified<C: PeerClient>(State(node): Node<C>) -> Json<Vec<Transaction>> {
    Json(node.verified_transactions().await)
}

async fn new_transaction<C: PeerClient>(
    State(node): Node<C>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    let tx = Transaction::new(request.sender, request.recipient, request.amount);
    let index = node.submit_transaction(tx).await;
    Ok(MessageResponse::new(format!(
        "Transaction will be added to block {index}"
    )))
}

async fn mine<C: PeerClient>(State(node): Node<C>) -> ApiResult<SignedBlock> {
    Ok(Json(node.mine().await?))
}

async fn verify_chain<C: PeerClient>(State(node): Node<C>) -> Json<VerifyResponse> {
    let valid = match node.verify_chain().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "local chain failed validation");
            false
        }
    };
    Json(VerifyResponse { valid })
}

async fn get_nodes<C: PeerClient>(State(node): Node<C>) -> ApiResult<Vec<NodeRecord>> {
    Ok(Json(node.registry().list(false)?))
}

async fn resolve<C: PeerClient>(State(node): Node<C>) -> ApiResult<ConsensusResponse> {
    let replaced = node.resolve().await?;
    let message = if replaced { "Replaced" } else { "Authoritative" };
    Ok(Json(ConsensusResponse {
        message: message.to_string(),
        chain: node.chain().await,
    }))
}

async fn validatorify<C: PeerClient>(
    State(node): Node<C>,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    if !node.is_validator()? {
        return Err(ApiError::NotAValidator);
    }
    let Json(request) = payload?;
    request.validate()?;

    node.registry()
        .upsert(&[NodeRecord::new(&request.url, &request.public_key, true)])?;
    info!(url = %request.url, "promoted node to validator");

    let short: String = request.public_key.chars().take(9).collect();
    Ok(MessageResponse::new(format!("Made {short} a validator")))
}

async fn register<C: PeerClient>(
    State(node): Node<C>,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    request.validate()?;

    let registry = node.registry();
    let is_validator = registry.is_validator(&request.public_key)?;
    registry.upsert(&[NodeRecord::new(&request.url, &request.public_key, is_validator)])?;
    info!(url = %request.url, is_validator, "registered node");

    Ok(MessageResponse::new(format!("Registered {}", request.url)))
}
