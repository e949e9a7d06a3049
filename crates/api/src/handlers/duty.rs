use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rosterd_core::{
    errors::RosterError,
    models::duty::{
        BulkUpsertItem, BulkUpsertResponse, DutyResponse, GenerateRotationRequest,
        RotationResponse,
    },
    permissions,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{
        actor::{resolve_actor, ActorId},
        error_handling::AppError,
    },
    ApiState,
};

#[derive(Debug, Deserialize)]
pub struct ListDutiesParams {
    pub office: Option<Uuid>,
    pub user: Option<Uuid>,
    pub schedule: Option<Uuid>,
    pub duty_chart: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn list_duties(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Query(params): Query<ListDutiesParams>,
) -> Result<Json<Vec<DutyResponse>>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    if let Some(office) = params.office {
        rosterd_db::repositories::authz::ensure_office_access(
            &state.db_pool,
            &actor,
            office,
            permissions::VIEW_ANY_OFFICE_CHART,
        )
        .await?;
    }

    let duties = rosterd_db::repositories::duty::list_duties(
        &state.db_pool,
        params.office,
        params.user,
        params.schedule,
        params.duty_chart,
        params.date_from,
        params.date_to,
    )
    .await?;

    let responses = duties
        .into_iter()
        .map(|d| DutyResponse {
            id: d.id,
            user: d.user_id,
            user_name: Some(d.user_name),
            office: d.office_id,
            office_name: Some(d.office_name),
            schedule: d.schedule_id,
            schedule_name: Some(d.schedule_name),
            start_time: Some(d.start_time),
            end_time: Some(d.end_time),
            date: d.date,
            duty_chart: d.duty_chart_id,
            is_completed: d.is_completed,
            currently_available: d.currently_available,
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct BulkUpsertPayload {
    pub duties: Vec<BulkUpsertItem>,
}

/// Apply a batch of assignments atomically. Every item's office must be
/// within the actor's reach before any row is written.
#[axum::debug_handler]
pub async fn bulk_upsert(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Json(payload): Json<BulkUpsertPayload>,
) -> Result<Json<BulkUpsertResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let mut offices: Vec<Uuid> = payload.duties.iter().map(|i| i.office).collect();
    offices.sort();
    offices.dedup();
    for office in offices {
        rosterd_db::repositories::authz::ensure_office_access(
            &state.db_pool,
            &actor,
            office,
            permissions::ASSIGN_ANY_OFFICE,
        )
        .await?;
    }

    // Rostering an employee outside their own offices needs the blanket slug.
    let assign_any_office = actor.is_global_admin()
        || rosterd_db::repositories::authz::has_permission(
            &state.db_pool,
            actor.id,
            permissions::ASSIGN_ANY_OFFICE,
        )
        .await?;

    let response = rosterd_db::repositories::duty::bulk_upsert(
        &state.db_pool,
        &payload.duties,
        assign_any_office,
    )
    .await?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn generate_rotation(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Json(payload): Json<GenerateRotationRequest>,
) -> Result<Json<RotationResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let chart =
        rosterd_db::repositories::duty_chart::get_duty_chart_by_id(&state.db_pool, payload.duty_chart)
            .await?
            .ok_or_else(|| RosterError::NotFound("Duty chart not found".to_string()))?;

    rosterd_db::repositories::authz::ensure_office_access(
        &state.db_pool,
        &actor,
        chart.office_id,
        permissions::ASSIGN_ANY_OFFICE,
    )
    .await?;

    let response =
        rosterd_db::repositories::duty::generate_rotation(&state.db_pool, &payload).await?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn delete_duty(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let duty = rosterd_db::repositories::duty::get_duty_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound(format!("Duty with ID {} not found", id)))?;

    rosterd_db::repositories::authz::ensure_office_access(
        &state.db_pool,
        &actor,
        duty.office_id,
        permissions::ASSIGN_ANY_OFFICE,
    )
    .await?;

    rosterd_db::repositories::duty::delete_duty(&state.db_pool, id).await?;

    Ok(Json(serde_json::json!({ "deleted": id })))
}
