use axum::{
    extract::{Path, Query, State},
    Json,
};
use rosterd_core::{
    errors::RosterError,
    models::duty_chart::{CreateDutyChartRequest, DutyChartResponse, UpdateDutyChartRequest},
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

async fn to_response(
    pool: &sqlx::PgPool,
    chart: rosterd_db::models::DbDutyChart,
) -> Result<DutyChartResponse, AppError> {
    let office = rosterd_db::repositories::directory::get_office_by_id(pool, chart.office_id)
        .await?
        .ok_or_else(|| RosterError::NotFound("Office not found".to_string()))?;

    let schedule_ids = rosterd_db::repositories::duty_chart::get_chart_schedule_ids(pool, chart.id)
        .await?;

    let mut schedule_names = Vec::with_capacity(schedule_ids.len());
    for id in &schedule_ids {
        let sched = rosterd_db::repositories::schedule::get_schedule_by_id(pool, *id)
            .await?
            .ok_or_else(|| RosterError::NotFound("Schedule not found".to_string()))?;
        schedule_names.push(sched.name);
    }

    Ok(DutyChartResponse {
        id: chart.id,
        office: chart.office_id,
        office_name: office.name,
        effective_date: chart.effective_date,
        end_date: chart.end_date,
        name: chart.name,
        schedules: schedule_ids,
        schedule_names,
    })
}

#[axum::debug_handler]
pub async fn create_duty_chart(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Json(payload): Json<CreateDutyChartRequest>,
) -> Result<Json<DutyChartResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    rosterd_db::repositories::directory::get_office_by_id(&state.db_pool, payload.office)
        .await?
        .ok_or_else(|| RosterError::NotFound("Office not found".to_string()))?;
    rosterd_db::repositories::authz::ensure_office_access(
        &state.db_pool,
        &actor,
        payload.office,
        permissions::CREATE_ANY_OFFICE_CHART,
    )
    .await?;

    // Chart schedules must be visible to the chart's office.
    for schedule_id in &payload.schedules {
        let sched =
            rosterd_db::repositories::schedule::get_schedule_by_id(&state.db_pool, *schedule_id)
                .await?
                .ok_or_else(|| {
                    RosterError::NotFound(format!("Schedule {schedule_id} not found"))
                })?;
        if let Some(schedule_office) = sched.office_id {
            if schedule_office != payload.office {
                return Err(AppError(RosterError::Validation(format!(
                    "Schedule '{}' belongs to a different office",
                    sched.name
                ))));
            }
        }
    }

    let chart = rosterd_db::repositories::duty_chart::create_duty_chart(
        &state.db_pool,
        payload.office,
        payload.effective_date,
        payload.end_date,
        payload.name.as_deref(),
        &payload.schedules,
    )
    .await?;

    let response = to_response(&state.db_pool, chart).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn get_duty_chart(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<DutyChartResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let chart = rosterd_db::repositories::duty_chart::get_duty_chart_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound(format!("Duty chart with ID {} not found", id)))?;

    rosterd_db::repositories::authz::ensure_office_access(
        &state.db_pool,
        &actor,
        chart.office_id,
        permissions::VIEW_ANY_OFFICE_CHART,
    )
    .await?;

    let response = to_response(&state.db_pool, chart).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ListDutyChartsParams {
    pub office: Option<Uuid>,
}

#[axum::debug_handler]
pub async fn list_duty_charts(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Query(params): Query<ListDutyChartsParams>,
) -> Result<Json<Vec<DutyChartResponse>>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    // Without an office filter the listing is scoped to the offices the
    // actor can see.
    let charts = match params.office {
        Some(office) => {
            rosterd_db::repositories::authz::ensure_office_access(
                &state.db_pool,
                &actor,
                office,
                permissions::VIEW_ANY_OFFICE_CHART,
            )
            .await?;
            rosterd_db::repositories::duty_chart::list_duty_charts(&state.db_pool, Some(office))
                .await?
        }
        None => {
            let all =
                rosterd_db::repositories::duty_chart::list_duty_charts(&state.db_pool, None)
                    .await?;
            if actor.is_global_admin()
                || rosterd_db::repositories::authz::has_permission(
                    &state.db_pool,
                    actor.id,
                    permissions::VIEW_ANY_OFFICE_CHART,
                )
                .await?
            {
                all
            } else {
                let allowed =
                    rosterd_db::repositories::authz::allowed_office_ids(&state.db_pool, actor.id)
                        .await?;
                all.into_iter()
                    .filter(|c| allowed.contains(&c.office_id))
                    .collect()
            }
        }
    };

    let mut responses = Vec::with_capacity(charts.len());
    for chart in charts {
        responses.push(to_response(&state.db_pool, chart).await?);
    }

    Ok(Json(responses))
}

#[axum::debug_handler]
pub async fn update_duty_chart(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDutyChartRequest>,
) -> Result<Json<DutyChartResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    let chart = rosterd_db::repositories::duty_chart::get_duty_chart_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound(format!("Duty chart with ID {} not found", id)))?;

    rosterd_db::repositories::authz::ensure_office_access(
        &state.db_pool,
        &actor,
        chart.office_id,
        permissions::CREATE_ANY_OFFICE_CHART,
    )
    .await?;

    // end_date is only touched when explicitly supplied: `Some(None)` would
    // clear it, which this endpoint does not support.
    let updated = rosterd_db::repositories::duty_chart::update_duty_chart(
        &state.db_pool,
        id,
        payload.effective_date,
        payload.end_date.map(Some),
        payload.name.as_deref(),
        payload.schedules.as_deref(),
    )
    .await?;

    let response = to_response(&state.db_pool, updated).await?;
    Ok(Json(response))
}
