//! HTTP request handlers for the REST adapter.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;

use crate::domain::plan::{NewTradingPlan, TradingPlan, TradingPlanPatch};
use crate::domain::stats::{DashboardStats, StatsBreakdown};
use crate::domain::trade::{NewTrade, Trade, TradePatch};
use crate::domain::user::User;
use crate::domain::validation;

use super::auth::{AuthSession, Credentials};
use super::{ApiError, AppState};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// Malformed bodies (bad JSON, wrong types, unknown keys) become 400s with
/// the rejection's own description.
fn decode<T>(payload: JsonBody<T>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    Ok(Json(state.store.list_trades()?))
}

pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Trade>, ApiError> {
    match state.store.get_trade(id)? {
        Some(trade) => Ok(Json(trade)),
        None => Err(ApiError::not_found("trade not found")),
    }
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<NewTrade>,
) -> Result<(StatusCode, Json<Trade>), ApiError> {
    let new = decode(payload)?;
    validation::validate_new_trade(&new)?;
    let trade = state.store.create_trade(new)?;
    Ok((StatusCode::CREATED, Json(trade)))
}

pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: JsonBody<TradePatch>,
) -> Result<Json<Trade>, ApiError> {
    let patch = decode(payload)?;
    validation::validate_trade_patch(&patch)?;
    match state.store.update_trade(id, patch)? {
        Some(trade) => Ok(Json(trade)),
        None => Err(ApiError::not_found("trade not found")),
    }
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_trade(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("trade not found"))
    }
}

pub async fn list_plans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TradingPlan>>, ApiError> {
    Ok(Json(state.store.list_plans()?))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TradingPlan>, ApiError> {
    match state.store.get_plan(id)? {
        Some(plan) => Ok(Json(plan)),
        None => Err(ApiError::not_found("trading plan not found")),
    }
}

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<NewTradingPlan>,
) -> Result<(StatusCode, Json<TradingPlan>), ApiError> {
    let new = decode(payload)?;
    validation::validate_new_plan(&new)?;
    let plan = state.store.create_plan(new)?;
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: JsonBody<TradingPlanPatch>,
) -> Result<Json<TradingPlan>, ApiError> {
    let patch = decode(payload)?;
    validation::validate_plan_patch(&patch)?;
    match state.store.update_plan(id, patch)? {
        Some(plan) => Ok(Json(plan)),
        None => Err(ApiError::not_found("trading plan not found")),
    }
}

pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_plan(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("trading plan not found"))
    }
}

pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let trades = state.store.list_trades()?;
    Ok(Json(DashboardStats::compute(&trades, state.starting_capital)))
}

pub async fn dashboard_breakdown(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsBreakdown>, ApiError> {
    let trades = state.store.list_trades()?;
    Ok(Json(StatsBreakdown::compute(&trades)))
}

pub async fn login(
    mut auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
    payload: JsonBody<Credentials>,
) -> Result<Json<User>, ApiError> {
    let creds = decode(payload)?;

    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::unauthorized("invalid credentials")),
        Err(e) => return Err(ApiError::internal(e)),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| ApiError::internal(e))?;

    let record = state.store.upsert_user(user.to_record())?;
    Ok(Json(record))
}

pub async fn logout(mut auth_session: AuthSession) -> Result<StatusCode, ApiError> {
    auth_session
        .logout()
        .await
        .map_err(|e| ApiError::internal(e))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_user(
    auth_session: AuthSession,
    State(state): State<Arc<AppState>>,
) -> Result<Json<User>, ApiError> {
    let Some(user) = auth_session.user else {
        return Err(ApiError::unauthorized("not logged in"));
    };
    match state.store.get_user(&user.username)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::not_found("user not found")),
    }
}
