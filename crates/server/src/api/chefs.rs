//! Chef, debt and order history API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use quickeats_core::engine::{ChefDebt, DebtOverview, OrderHistory, RemovedChef};
use quickeats_core::{Chef, ChefStatus};

use super::error::ApiError;
use super::tickets::ActorParams;
use crate::state::AppState;

/// Maximum allowed limit for order history queries
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct SetStatusBody {
    pub actor_id: String,
    pub status: ChefStatus,
    /// Display name; defaults to the stored name.
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearDebtResponse {
    pub chef_id: String,
    pub cleared: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct OrderHistoryParams {
    pub actor_id: String,
    pub chef_id: Option<String>,
    pub limit: Option<i64>,
}

/// All registered chefs
pub async fn list_chefs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Chef>>, ApiError> {
    Ok(Json(state.engine().list_chefs()?))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(chef_id): Path<String>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<Chef>, ApiError> {
    let chef = state
        .engine()
        .set_chef_status(&body.actor_id, &chef_id, body.name.as_deref(), body.status)
        .await?;
    Ok(Json(chef))
}

pub async fn remove_chef(
    State(state): State<Arc<AppState>>,
    Path(chef_id): Path<String>,
    Json(body): Json<ActorParams>,
) -> Result<Json<RemovedChef>, ApiError> {
    Ok(Json(
        state.engine().remove_chef(&body.actor_id, &chef_id).await?,
    ))
}

pub async fn chef_debt(
    State(state): State<Arc<AppState>>,
    Path(chef_id): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<Json<ChefDebt>, ApiError> {
    Ok(Json(
        state.engine().chef_debt(&params.actor_id, &chef_id).await?,
    ))
}

pub async fn clear_debt(
    State(state): State<Arc<AppState>>,
    Path(chef_id): Path<String>,
    Json(body): Json<ActorParams>,
) -> Result<Json<ClearDebtResponse>, ApiError> {
    let cleared = state.engine().clear_debt(&body.actor_id, &chef_id).await?;
    Ok(Json(ClearDebtResponse { chef_id, cleared }))
}

/// Outstanding debt across all chefs (admin only)
pub async fn all_debts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActorParams>,
) -> Result<Json<DebtOverview>, ApiError> {
    Ok(Json(state.engine().all_debts(&params.actor_id).await?))
}

pub async fn order_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OrderHistoryParams>,
) -> Result<Json<OrderHistory>, ApiError> {
    let limit = params.limit.map(|l| l.clamp(1, MAX_LIMIT));
    let history = state
        .engine()
        .order_history(&params.actor_id, params.chef_id.as_deref(), limit)
        .await?;
    Ok(Json(history))
}
