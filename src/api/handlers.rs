//! HTTP handlers for the process API

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use super::state::AppState;
use crate::dashboard::ResponsibleSummary;
use crate::error::ApiError;
use crate::models::{CollaboratorRequest, Process, StatusUpdateRequest};
use crate::pagination::Page;
use crate::query::{DashboardParams, ListParams};
use crate::service::{
    MSG_COLLABORATOR_REQUIRED, MSG_COLLABORATOR_UPDATED, MSG_INCOMPLETE_DATA, MSG_STATUS_UPDATED,
};

const MSG_LIST_FAILED: &str = "Erro interno ao buscar processos";
const MSG_UPDATE_FAILED: &str = "Erro ao atualizar processo";
const MSG_ASSIGN_FAILED: &str = "Erro ao atualizar colaborador";
const MSG_DASHBOARD_FAILED: &str = "Erro ao gerar dashboard";
const MSG_INVALID_QUERY: &str = "Parâmetros de consulta inválidos";

/// Decoded query string pairs, in request order
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn query_pairs(query: QueryPairs) -> Result<Vec<(String, String)>, ApiError> {
    query.map(|Query(pairs)| pairs).map_err(|rejection| {
        debug!("Rejected query string: {}", rejection);
        ApiError::InvalidInput(MSG_INVALID_QUERY.to_string())
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub db: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
}

impl SuccessResponse {
    fn ok(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        db: if state.is_connected() {
            "connected"
        } else {
            "disconnected"
        },
    })
}

pub async fn list_processes(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<Page<Process>>, ApiError> {
    let service = state.service()?;
    let params = ListParams::from_pairs(query_pairs(query)?);
    let page = service
        .list(&params)
        .await
        .map_err(|e| e.with_internal_message(MSG_LIST_FAILED))?;
    Ok(Json(page))
}

pub async fn update_process(
    State(state): State<AppState>,
    Path(nup): Path<String>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let service = state.service()?;
    let Json(request) = body.map_err(|rejection| {
        debug!("Rejected status update body: {}", rejection);
        ApiError::InvalidInput(MSG_INCOMPLETE_DATA.to_string())
    })?;

    service
        .update_status(&nup, request)
        .await
        .map_err(|e| e.with_internal_message(MSG_UPDATE_FAILED))?;
    Ok(SuccessResponse::ok(MSG_STATUS_UPDATED))
}

pub async fn assign_collaborator(
    State(state): State<AppState>,
    Path(nup): Path<String>,
    body: Result<Json<CollaboratorRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let service = state.service()?;
    let Json(request) = body.map_err(|rejection| {
        debug!("Rejected collaborator body: {}", rejection);
        ApiError::InvalidInput(MSG_COLLABORATOR_REQUIRED.to_string())
    })?;

    service
        .assign_collaborator(&nup, request)
        .await
        .map_err(|e| e.with_internal_message(MSG_ASSIGN_FAILED))?;
    Ok(SuccessResponse::ok(MSG_COLLABORATOR_UPDATED))
}

pub async fn dashboard_summary(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<Vec<ResponsibleSummary>>, ApiError> {
    let service = state.service()?;
    let params = DashboardParams::from_pairs(query_pairs(query)?);
    let summary = service
        .dashboard(&params)
        .await
        .map_err(|e| e.with_internal_message(MSG_DASHBOARD_FAILED))?;
    Ok(Json(summary))
}
