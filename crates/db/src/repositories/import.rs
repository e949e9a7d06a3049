//! Storage side of the spreadsheet import. The reconciliation itself is
//! pure; this module loads the snapshot it runs against and commits the
//! resolved rows, dry-run and commit sharing the same pipeline up to the
//! final write.

use crate::models::DbDutyChart;
use crate::repositories::{directory, duty_chart, schedule};
use chrono::NaiveDate;
use eyre::Result;
use rosterd_core::conflict::{self, CandidateDuty, ExistingDuty};
use rosterd_core::errors::{RosterError, RosterResult};
use rosterd_core::import::{
    CommittedDuty, EmployeeRef, ImportContext, OfficeRef, ResolvedDuty, ScheduleRef,
};
use rosterd_core::models::duty_chart::ChartWindow;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

fn db_err(e: sqlx::Error) -> RosterError {
    RosterError::Database(e.into())
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct CommittedRow {
    user_id: Uuid,
    date: NaiveDate,
    schedule_id: Uuid,
    schedule_name: String,
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
}

/// Every duty whose date falls inside the window, across all users. The
/// reconciler indexes these by (user, date) itself.
async fn committed_duties_in_window(
    pool: &Pool<Postgres>,
    window: &ChartWindow,
) -> Result<Vec<CommittedDuty>> {
    let rows = sqlx::query_as::<_, CommittedRow>(
        r#"
        SELECT d.user_id, d.date, d.schedule_id, s.name AS schedule_name,
               s.start_time, s.end_time
        FROM duties d
        JOIN schedules s ON s.id = d.schedule_id
        WHERE d.date >= $1 AND ($2::date IS NULL OR d.date <= $2)
        "#,
    )
    .bind(window.effective_date)
    .bind(window.end_date)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| CommittedDuty {
            user_id: r.user_id,
            date: r.date,
            schedule_id: r.schedule_id,
            schedule_name: r.schedule_name,
            start_time: r.start_time,
            end_time: r.end_time,
        })
        .collect())
}

/// Snapshot of everything the reconciler needs: the target office, its
/// visible schedules, the full employee directory and the duties already
/// committed inside the window.
pub async fn load_import_context(
    pool: &Pool<Postgres>,
    office_id: Uuid,
    window: ChartWindow,
    today: NaiveDate,
    assign_any_office: bool,
) -> RosterResult<ImportContext> {
    let office = directory::get_office_by_id(pool, office_id)
        .await?
        .ok_or_else(|| RosterError::NotFound("Office not found".to_string()))?;

    let employees = directory::list_users(pool)
        .await?
        .into_iter()
        .map(|u| EmployeeRef {
            id: u.id,
            employee_id: u.employee_id,
            full_name: u.full_name,
            office_id: u.office_id,
            is_active: u.is_active,
        })
        .collect();

    let schedules = schedule::list_schedules_for_office(pool, office_id)
        .await?
        .into_iter()
        .map(|s| ScheduleRef {
            id: s.id,
            name: s.name,
            office_id: s.office_id,
            start_time: s.start_time,
            end_time: s.end_time,
        })
        .collect();

    let committed = committed_duties_in_window(pool, &window).await?;

    Ok(ImportContext {
        office: OfficeRef { id: office.id, name: office.name },
        window,
        today,
        assign_any_office,
        employees,
        schedules,
        committed,
    })
}

/// The chart that will receive the imported duties: an existing chart of the
/// office containing the first imported date, widened to cover the last one,
/// or a brand-new chart spanning exactly the imported range.
pub async fn create_or_extend_chart(
    pool: &Pool<Postgres>,
    office_id: Uuid,
    first_date: NaiveDate,
    last_date: NaiveDate,
    name: Option<&str>,
) -> RosterResult<DbDutyChart> {
    if let Some(chart) = duty_chart::find_chart_containing(pool, office_id, first_date).await? {
        let window = ChartWindow::new(chart.effective_date, chart.end_date)?;
        if window.contains(last_date) {
            return Ok(chart);
        }
        tracing::debug!(
            "Extending duty chart {} end date to {}",
            chart.id, last_date
        );
        return duty_chart::update_duty_chart(
            pool,
            chart.id,
            None,
            Some(Some(last_date)),
            None,
            None,
        )
        .await;
    }

    duty_chart::create_duty_chart(pool, office_id, first_date, Some(last_date), name, &[]).await
}

/// Write the resolved rows inside one transaction, revalidating each against
/// the duties on disk under the (user, date) advisory lock. The snapshot the
/// dry run saw may be stale by commit time; a row that no longer passes
/// aborts the whole commit.
pub async fn commit_import(
    pool: &Pool<Postgres>,
    chart: &DbDutyChart,
    resolved: &[ResolvedDuty],
) -> RosterResult<usize> {
    let window = ChartWindow::new(chart.effective_date, chart.end_date)?;

    let mut tx = pool.begin().await.map_err(db_err)?;
    let mut inserted = 0;

    // The chart's schedule set grows to cover whatever the file used.
    let mut chart_schedules: Vec<Uuid> = resolved.iter().map(|r| r.schedule_id).collect();
    chart_schedules.sort();
    chart_schedules.dedup();
    for schedule_id in &chart_schedules {
        sqlx::query(
            r#"
            INSERT INTO duty_chart_schedules (duty_chart_id, schedule_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(chart.id)
        .bind(schedule_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
    }

    for row in resolved {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
            .bind(row.user_id.to_string())
            .bind(row.date.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let existing = sqlx::query_as::<_, CommittedRow>(
            r#"
            SELECT d.user_id, d.date, d.schedule_id, s.name AS schedule_name,
                   s.start_time, s.end_time
            FROM duties d
            JOIN schedules s ON s.id = d.schedule_id
            WHERE d.user_id = $1 AND d.date = $2
            "#,
        )
        .bind(row.user_id)
        .bind(row.date)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        let existing: Vec<ExistingDuty> = existing
            .into_iter()
            .map(|r| ExistingDuty {
                duty_id: Uuid::nil(),
                schedule_id: r.schedule_id,
                schedule_name: r.schedule_name,
                start_time: r.start_time,
                end_time: r.end_time,
            })
            .collect();

        let candidate = CandidateDuty {
            user_id: row.user_id,
            date: row.date,
            schedule_id: row.schedule_id,
            schedule_name: row.schedule_name.clone(),
            start_time: row.start_time,
            end_time: row.end_time,
            exclude_duty_id: None,
        };
        conflict::validate(&candidate, true, Some(&window), &existing).map_err(|e| {
            RosterError::Conflict(format!(
                "Row {}: state changed since the dry run: {e}",
                row.row_number
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO duties (id, user_id, office_id, schedule_id, date, duty_chart_id,
                                is_completed, currently_available, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, TRUE, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.user_id)
        .bind(chart.office_id)
        .bind(row.schedule_id)
        .bind(row.date)
        .bind(chart.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        inserted += 1;
    }

    tx.commit().await.map_err(db_err)?;

    tracing::debug!("Import committed {} duties into chart {}", inserted, chart.id);
    Ok(inserted)
}
