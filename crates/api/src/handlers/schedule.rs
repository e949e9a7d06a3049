use axum::{
    extract::{Path, Query, State},
    Json,
};
use rosterd_core::{
    errors::RosterError,
    models::schedule::{CreateScheduleRequest, ScheduleResponse, UpdateScheduleRequest},
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

async fn office_name(pool: &sqlx::PgPool, office_id: Option<Uuid>) -> Result<Option<String>, AppError> {
    let name = match office_id {
        Some(id) => rosterd_db::repositories::directory::get_office_by_id(pool, id)
            .await?
            .map(|o| o.name),
        None => None,
    };
    Ok(name)
}

fn to_response(s: rosterd_db::models::DbSchedule, office_name: Option<String>) -> ScheduleResponse {
    ScheduleResponse {
        id: s.id,
        name: s.name,
        start_time: s.start_time,
        end_time: s.end_time,
        office: s.office_id,
        office_name,
        shift_type: s.shift_type,
        alias: s.alias,
        status: s.status,
    }
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    match payload.office {
        // Office-less schedules are global templates; creating one is a
        // privileged operation.
        None => {
            if !actor.is_global_admin()
                && !rosterd_db::repositories::authz::has_permission(
                    &state.db_pool,
                    actor.id,
                    permissions::MANAGE_GLOBAL_TEMPLATES,
                )
                .await?
            {
                return Err(AppError(RosterError::Authorization(
                    "Creating global schedule templates requires elevated access".to_string(),
                )));
            }
        }
        Some(office) => {
            rosterd_db::repositories::directory::get_office_by_id(&state.db_pool, office)
                .await?
                .ok_or_else(|| RosterError::NotFound("Office not found".to_string()))?;
            rosterd_db::repositories::authz::ensure_office_access(
                &state.db_pool,
                &actor,
                office,
                permissions::CREATE_ANY_OFFICE_CHART,
            )
            .await?;
        }
    }

    let db_schedule = rosterd_db::repositories::schedule::create_schedule(
        &state.db_pool,
        &payload.name,
        payload.start_time,
        payload.end_time,
        payload.office,
        payload.shift_type.as_deref(),
        payload.alias.as_deref(),
        payload.status.as_deref().unwrap_or("active"),
    )
    .await?;

    let office_name = office_name(&state.db_pool, db_schedule.office_id).await?;
    Ok(Json(to_response(db_schedule, office_name)))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let db_schedule = rosterd_db::repositories::schedule::get_schedule_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound(format!("Schedule with ID {} not found", id)))?;

    let office_name = office_name(&state.db_pool, db_schedule.office_id).await?;
    Ok(Json(to_response(db_schedule, office_name)))
}

#[derive(Debug, Deserialize)]
pub struct ListSchedulesParams {
    pub office: Option<Uuid>,
    pub duty_chart: Option<Uuid>,
}

/// List schedules. `?duty_chart=` returns the schedules attached to that
/// chart; `?office=` returns the office's own plus unshadowed global
/// templates. Without a filter, only the global templates are returned.
#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ListSchedulesParams>,
) -> Result<Json<Vec<ScheduleResponse>>, AppError> {
    let schedules = match (params.duty_chart, params.office) {
        (Some(chart), _) => {
            rosterd_db::repositories::duty_chart::get_duty_chart_by_id(&state.db_pool, chart)
                .await?
                .ok_or_else(|| RosterError::NotFound("Duty chart not found".to_string()))?;
            rosterd_db::repositories::schedule::list_schedules_for_chart(&state.db_pool, chart)
                .await?
        }
        (None, Some(office)) => {
            rosterd_db::repositories::schedule::list_schedules_for_office(&state.db_pool, office)
                .await?
        }
        (None, None) => {
            rosterd_db::repositories::schedule::list_global_templates(&state.db_pool).await?
        }
    };

    let mut responses = Vec::with_capacity(schedules.len());
    for s in schedules {
        let office_name = office_name(&state.db_pool, s.office_id).await?;
        responses.push(to_response(s, office_name));
    }

    Ok(Json(responses))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let existing = rosterd_db::repositories::schedule::get_schedule_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound(format!("Schedule with ID {} not found", id)))?;

    match existing.office_id {
        None => {
            if !actor.is_global_admin()
                && !rosterd_db::repositories::authz::has_permission(
                    &state.db_pool,
                    actor.id,
                    permissions::MANAGE_GLOBAL_TEMPLATES,
                )
                .await?
            {
                return Err(AppError(RosterError::Authorization(
                    "Updating global schedule templates requires elevated access".to_string(),
                )));
            }
        }
        Some(office) => {
            rosterd_db::repositories::authz::ensure_office_access(
                &state.db_pool,
                &actor,
                office,
                permissions::CREATE_ANY_OFFICE_CHART,
            )
            .await?;
        }
    }

    let db_schedule = rosterd_db::repositories::schedule::update_schedule(
        &state.db_pool,
        id,
        payload.name.as_deref(),
        payload.start_time,
        payload.end_time,
        payload.shift_type.as_deref(),
        payload.alias.as_deref(),
        payload.status.as_deref(),
    )
    .await?;

    let office_name = office_name(&state.db_pool, db_schedule.office_id).await?;
    Ok(Json(to_response(db_schedule, office_name)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let existing = rosterd_db::repositories::schedule::get_schedule_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound(format!("Schedule with ID {} not found", id)))?;

    match existing.office_id {
        None => {
            if !actor.is_global_admin()
                && !rosterd_db::repositories::authz::has_permission(
                    &state.db_pool,
                    actor.id,
                    permissions::MANAGE_GLOBAL_TEMPLATES,
                )
                .await?
            {
                return Err(AppError(RosterError::Authorization(
                    "Deleting global schedule templates requires elevated access".to_string(),
                )));
            }
        }
        Some(office) => {
            rosterd_db::repositories::authz::ensure_office_access(
                &state.db_pool,
                &actor,
                office,
                permissions::CREATE_ANY_OFFICE_CHART,
            )
            .await?;
        }
    }

    rosterd_db::repositories::schedule::delete_schedule(&state.db_pool, id).await?;

    Ok(Json(serde_json::json!({ "deleted": id })))
}
