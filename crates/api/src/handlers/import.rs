//! Spreadsheet import endpoint. The uploaded workbook is parsed into rows,
//! reconciled against a snapshot of the roster, and either previewed
//! (dry run) or committed into a duty chart. Dry run and commit run the
//! same pipeline; only the final write differs.

use std::io::Cursor;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use calamine::{Data, DataType, Reader, Xlsx};
use chrono::Utc;
use rosterd_core::{
    errors::RosterError,
    import::{reconcile, DateCell, HeaderLayout, ImportRow, ResolvedDuty, RowError},
    models::duty_chart::ChartWindow,
    permissions,
};
use serde::{Deserialize, Serialize};
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
pub struct ImportParams {
    pub office: Uuid,
    /// Preview only; nothing is written.
    #[serde(default)]
    pub dry_run: bool,
    /// Import into this chart instead of creating or extending one.
    pub duty_chart: Option<Uuid>,
    /// Name for a newly created chart.
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub dry_run: bool,
    pub duty_chart: Option<Uuid>,
    pub created: usize,
    pub skipped_inactive: usize,
    pub resolved: Vec<ResolvedDuty>,
    pub errors: Vec<RowError>,
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => match other.as_date() {
            Some(d) => d.to_string(),
            None => other.to_string().trim().to_string(),
        },
    }
}

fn time_text(cell: &Data) -> String {
    if let Some(t) = cell.as_time() {
        return t.format("%H:%M:%S").to_string();
    }
    cell_text(cell)
}

fn date_cell(cell: &Data) -> DateCell {
    if let Some(d) = cell.as_date() {
        return DateCell::Day(d);
    }
    let text = cell_text(cell);
    if text.is_empty() {
        DateCell::Empty
    } else {
        DateCell::Text(text)
    }
}

/// Parse the first worksheet into import rows. Row 1 must be the header row;
/// column order is free as long as every expected column is present.
fn parse_workbook(bytes: &[u8]) -> Result<Vec<ImportRow>, RosterError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = Xlsx::new(cursor)
        .map_err(|e| RosterError::Validation(format!("Could not read workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RosterError::Validation("Workbook has no sheets".to_string()))?
        .map_err(|e| RosterError::Validation(format!("Could not read sheet: {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let layout = HeaderLayout::resolve(&headers)?;

    let empty = Data::Empty;
    let mut rows = Vec::new();
    for (i, row) in rows_iter.enumerate() {
        let cell = |idx: usize| row.get(idx).unwrap_or(&empty);
        rows.push(ImportRow {
            // Header is sheet row 1.
            row_number: i + 2,
            date: date_cell(cell(layout.date)),
            employee_id: cell_text(cell(layout.employee_id)),
            employee_name: cell_text(cell(layout.employee_name)),
            schedule: cell_text(cell(layout.schedule)),
            office: cell_text(cell(layout.office)),
            start_time: time_text(cell(layout.start_time)),
            end_time: time_text(cell(layout.end_time)),
        });
    }

    Ok(rows)
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, RosterError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RosterError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| RosterError::Validation(format!("Could not read upload: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(RosterError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}

#[axum::debug_handler]
pub async fn import_duty_chart(
    State(state): State<Arc<ApiState>>,
    actor_id: ActorId,
    Query(params): Query<ImportParams>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let actor = resolve_actor(&state.db_pool, actor_id).await?;

    rosterd_db::repositories::directory::get_office_by_id(&state.db_pool, params.office)
        .await?
        .ok_or_else(|| RosterError::NotFound("Office not found".to_string()))?;
    rosterd_db::repositories::authz::ensure_office_access(
        &state.db_pool,
        &actor,
        params.office,
        permissions::CREATE_ANY_OFFICE_CHART,
    )
    .await?;

    let assign_any_office = actor.is_global_admin()
        || rosterd_db::repositories::authz::has_permission(
            &state.db_pool,
            actor.id,
            permissions::ASSIGN_ANY_OFFICE,
        )
        .await?;

    let bytes = read_file_field(&mut multipart).await?;
    let rows = parse_workbook(&bytes)?;

    let today = Utc::now().date_naive();

    // With an explicit target chart the rows must fit its window; otherwise
    // any non-past date is acceptable and the chart is fitted to the file
    // afterwards.
    let window = match params.duty_chart {
        Some(chart_id) => {
            let chart =
                rosterd_db::repositories::duty_chart::get_duty_chart_by_id(&state.db_pool, chart_id)
                    .await?
                    .ok_or_else(|| RosterError::NotFound("Duty chart not found".to_string()))?;
            if chart.office_id != params.office {
                return Err(AppError(RosterError::Validation(
                    "Duty chart belongs to a different office".to_string(),
                )));
            }
            ChartWindow::new(chart.effective_date, chart.end_date)?
        }
        None => ChartWindow::new(today, None)?,
    };

    let ctx = rosterd_db::repositories::import::load_import_context(
        &state.db_pool,
        params.office,
        window,
        today,
        assign_any_office,
    )
    .await?;

    let report = reconcile(&ctx, &rows);

    tracing::info!(
        "Import for office {}: {} resolved, {} skipped, {} errors (dry_run={})",
        params.office,
        report.resolved.len(),
        report.skipped_inactive,
        report.errors.len(),
        params.dry_run,
    );

    // A file with any bad row is never partially committed.
    if params.dry_run || !report.is_clean() || report.resolved.is_empty() {
        return Ok(Json(ImportResponse {
            dry_run: params.dry_run,
            duty_chart: params.duty_chart,
            created: 0,
            skipped_inactive: report.skipped_inactive,
            resolved: report.resolved,
            errors: report.errors,
        }));
    }

    let first_date = report.resolved.iter().map(|r| r.date).min();
    let last_date = report.resolved.iter().map(|r| r.date).max();
    let (first_date, last_date) = match (first_date, last_date) {
        (Some(a), Some(b)) => (a, b),
        _ => (today, today),
    };

    let chart = match params.duty_chart {
        Some(chart_id) => {
            rosterd_db::repositories::duty_chart::get_duty_chart_by_id(&state.db_pool, chart_id)
                .await?
                .ok_or_else(|| RosterError::NotFound("Duty chart not found".to_string()))?
        }
        None => {
            rosterd_db::repositories::import::create_or_extend_chart(
                &state.db_pool,
                params.office,
                first_date,
                last_date,
                params.name.as_deref(),
            )
            .await?
        }
    };

    let created =
        rosterd_db::repositories::import::commit_import(&state.db_pool, &chart, &report.resolved)
            .await?;

    Ok(Json(ImportResponse {
        dry_run: false,
        duty_chart: Some(chart.id),
        created,
        skipped_inactive: report.skipped_inactive,
        resolved: report.resolved,
        errors: Vec::new(),
    }))
}
