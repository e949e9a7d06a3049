//! Duty writes. Every write path locks the (user, date) pair with a
//! transaction-scoped advisory lock, re-reads that user's duties for the
//! date, and runs the conflict validator before touching the table. The
//! unique index on (user, chart, schedule, date) is the backstop, not the
//! gate.

use std::collections::HashMap;

use crate::models::{DbDuty, DbDutyDetail, DbSchedule, DbUserDutyRow};
use crate::repositories::{authz, directory, duty_chart, schedule};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use rosterd_core::conflict::{self, CandidateDuty, ConflictError, ExistingDuty};
use rosterd_core::errors::{RosterError, RosterResult};
use rosterd_core::models::duty::{
    BulkUpsertItem, BulkUpsertResponse, GenerateRotationRequest, RotationResponse,
};
use rosterd_core::rotation;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

fn db_err(e: sqlx::Error) -> RosterError {
    RosterError::Database(e.into())
}

/// Serializes concurrent writers touching the same (user, date). Held until
/// the transaction commits or rolls back.
async fn lock_user_date(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
        .bind(user_id.to_string())
        .bind(date.to_string())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn duties_for_user_date(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<DbUserDutyRow>> {
    let rows = sqlx::query_as::<_, DbUserDutyRow>(
        r#"
        SELECT d.id, d.duty_chart_id, d.schedule_id, s.name AS schedule_name,
               s.start_time, s.end_time
        FROM duties d
        JOIN schedules s ON s.id = d.schedule_id
        WHERE d.user_id = $1 AND d.date = $2
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

fn to_existing(rows: &[DbUserDutyRow]) -> Vec<ExistingDuty> {
    rows.iter()
        .map(|r| ExistingDuty {
            duty_id: r.id,
            schedule_id: r.schedule_id,
            schedule_name: r.schedule_name.clone(),
            start_time: r.start_time,
            end_time: r.end_time,
        })
        .collect()
}

pub async fn get_duty_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbDuty>> {
    let duty = sqlx::query_as::<_, DbDuty>(
        r#"
        SELECT id, user_id, office_id, schedule_id, date, duty_chart_id,
               is_completed, currently_available, created_at
        FROM duties
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(duty)
}

pub async fn list_duties(
    pool: &Pool<Postgres>,
    office_id: Option<Uuid>,
    user_id: Option<Uuid>,
    schedule_id: Option<Uuid>,
    duty_chart_id: Option<Uuid>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<Vec<DbDutyDetail>> {
    let duties = sqlx::query_as::<_, DbDutyDetail>(
        r#"
        SELECT d.id, d.user_id, u.full_name AS user_name,
               d.office_id, o.name AS office_name,
               d.schedule_id, s.name AS schedule_name, s.start_time, s.end_time,
               d.date, d.duty_chart_id, d.is_completed, d.currently_available
        FROM duties d
        JOIN users u ON u.id = d.user_id
        JOIN offices o ON o.id = d.office_id
        JOIN schedules s ON s.id = d.schedule_id
        WHERE ($1::uuid IS NULL OR d.office_id = $1)
          AND ($2::uuid IS NULL OR d.user_id = $2)
          AND ($3::uuid IS NULL OR d.schedule_id = $3)
          AND ($4::uuid IS NULL OR d.duty_chart_id = $4)
          AND ($5::date IS NULL OR d.date >= $5)
          AND ($6::date IS NULL OR d.date <= $6)
        ORDER BY d.date ASC, s.start_time ASC
        "#,
    )
    .bind(office_id)
    .bind(user_id)
    .bind(schedule_id)
    .bind(duty_chart_id)
    .bind(date_from)
    .bind(date_to)
    .fetch_all(pool)
    .await?;

    Ok(duties)
}

pub async fn delete_duty(pool: &Pool<Postgres>, id: Uuid) -> RosterResult<()> {
    let deleted = sqlx::query(r#"DELETE FROM duties WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_err)?;

    if deleted.rows_affected() == 0 {
        return Err(RosterError::NotFound("Duty not found".to_string()));
    }

    Ok(())
}

async fn insert_duty(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    office_id: Uuid,
    schedule_id: Uuid,
    date: NaiveDate,
    duty_chart_id: Option<Uuid>,
    is_completed: bool,
    currently_available: bool,
) -> Result<DbDuty> {
    let duty = sqlx::query_as::<_, DbDuty>(
        r#"
        INSERT INTO duties (id, user_id, office_id, schedule_id, date, duty_chart_id,
                            is_completed, currently_available, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, user_id, office_id, schedule_id, date, duty_chart_id,
                  is_completed, currently_available, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(office_id)
    .bind(schedule_id)
    .bind(date)
    .bind(duty_chart_id)
    .bind(is_completed)
    .bind(currently_available)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(duty)
}

/// Apply a batch of assignments in one transaction. Every item runs through
/// the conflict validator; those matching an existing (user, chart,
/// schedule, date) row then update its flags, new combinations are
/// inserted. The first failing item rolls
/// back the whole batch. `assign_any_office` lifts the restriction that an
/// employee may only be rostered into one of their own offices.
pub async fn bulk_upsert(
    pool: &Pool<Postgres>,
    items: &[BulkUpsertItem],
    assign_any_office: bool,
) -> RosterResult<BulkUpsertResponse> {
    if items.is_empty() {
        return Err(RosterError::Validation("No duty items supplied".to_string()));
    }

    tracing::debug!("Bulk upsert of {} duty items", items.len());

    let mut tx = pool.begin().await.map_err(db_err)?;
    let mut created = 0;
    let mut updated = 0;

    for item in items {
        let user = directory::get_user_by_id(pool, item.user)
            .await?
            .ok_or_else(|| RosterError::NotFound(format!("User {} not found", item.user)))?;

        if !assign_any_office {
            let user_offices = authz::allowed_office_ids(pool, item.user).await?;
            if !user_offices.contains(&item.office) {
                return Err(RosterError::Validation(format!(
                    "User '{}' does not belong to the target office",
                    user.full_name
                )));
            }
        }

        let sched = schedule::get_schedule_by_id(pool, item.schedule)
            .await?
            .ok_or_else(|| {
                RosterError::NotFound(format!("Schedule {} not found", item.schedule))
            })?;

        if let Some(schedule_office) = sched.office_id {
            if schedule_office != item.office {
                return Err(RosterError::Validation(format!(
                    "Schedule '{}' belongs to a different office",
                    sched.name
                )));
            }
        }

        let window = match item.duty_chart {
            Some(chart_id) => {
                let chart = duty_chart::get_duty_chart_by_id(pool, chart_id)
                    .await?
                    .ok_or_else(|| {
                        RosterError::NotFound(format!("Duty chart {chart_id} not found"))
                    })?;
                if chart.office_id != item.office {
                    return Err(RosterError::Validation(
                        "Duty chart belongs to a different office".to_string(),
                    ));
                }
                Some(rosterd_core::models::duty_chart::ChartWindow::new(
                    chart.effective_date,
                    chart.end_date,
                )?)
            }
            None => None,
        };

        lock_user_date(&mut tx, item.user, item.date).await?;

        let existing_row = sqlx::query_as::<_, DbDuty>(
            r#"
            SELECT id, user_id, office_id, schedule_id, date, duty_chart_id,
                   is_completed, currently_available, created_at
            FROM duties
            WHERE user_id = $1 AND schedule_id = $2 AND date = $3
              AND COALESCE(duty_chart_id, '00000000-0000-0000-0000-000000000000'::uuid)
                  = COALESCE($4, '00000000-0000-0000-0000-000000000000'::uuid)
            "#,
        )
        .bind(item.user)
        .bind(item.schedule)
        .bind(item.date)
        .bind(item.duty_chart)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let rows = duties_for_user_date(&mut tx, item.user, item.date).await?;
        let candidate = CandidateDuty {
            user_id: item.user,
            date: item.date,
            schedule_id: sched.id,
            schedule_name: sched.name.clone(),
            start_time: sched.start_time,
            end_time: sched.end_time,
            // Updating an existing row must not conflict with itself.
            exclude_duty_id: existing_row.as_ref().map(|r| r.id),
        };
        conflict::validate(&candidate, user.is_active, window.as_ref(), &to_existing(&rows))?;

        if let Some(row) = existing_row {
            sqlx::query(
                r#"
                UPDATE duties
                SET is_completed = $2, currently_available = $3
                WHERE id = $1
                "#,
            )
            .bind(row.id)
            .bind(item.is_completed.unwrap_or(row.is_completed))
            .bind(item.currently_available.unwrap_or(row.currently_available))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            updated += 1;
            continue;
        }

        insert_duty(
            &mut tx,
            item.user,
            item.office,
            item.schedule,
            item.date,
            item.duty_chart,
            item.is_completed.unwrap_or(false),
            item.currently_available.unwrap_or(true),
        )
        .await?;
        created += 1;
    }

    tx.commit().await.map_err(db_err)?;

    tracing::debug!("Bulk upsert done: created={}, updated={}", created, updated);
    Ok(BulkUpsertResponse { created, updated })
}

/// Generate a repeating rotation for one user inside a duty chart. Without
/// `overwrite`, days the validator rejects with a duplicate or overlap are
/// skipped. With `overwrite`, an existing duty on the same chart is
/// re-pointed at the pattern's schedule; conflicts with duties outside the
/// chart cannot be replaced and abort the rotation.
pub async fn generate_rotation(
    pool: &Pool<Postgres>,
    req: &GenerateRotationRequest,
) -> RosterResult<RotationResponse> {
    let chart = duty_chart::get_duty_chart_by_id(pool, req.duty_chart)
        .await?
        .ok_or_else(|| RosterError::NotFound("Duty chart not found".to_string()))?;
    let window = rosterd_core::models::duty_chart::ChartWindow::new(
        chart.effective_date,
        chart.end_date,
    )?;

    if !window.contains(req.start_date) || !window.contains(req.end_date) {
        return Err(RosterError::Validation(
            "Rotation range must lie inside the duty chart window".to_string(),
        ));
    }

    let user = directory::get_user_by_id(pool, req.user)
        .await?
        .ok_or_else(|| RosterError::NotFound("User not found".to_string()))?;
    if !user.is_active {
        return Err(RosterError::Validation("User is not activated".to_string()));
    }

    let chart_schedules = duty_chart::get_chart_schedule_ids(pool, chart.id).await?;
    let mut schedules: HashMap<Uuid, DbSchedule> = HashMap::new();
    for schedule_id in &req.pattern {
        if !chart_schedules.contains(schedule_id) {
            return Err(RosterError::Validation(format!(
                "Pattern schedule {schedule_id} is not part of the duty chart"
            )));
        }
        if !schedules.contains_key(schedule_id) {
            let sched = schedule::get_schedule_by_id(pool, *schedule_id)
                .await?
                .ok_or_else(|| {
                    RosterError::NotFound(format!("Schedule {schedule_id} not found"))
                })?;
            schedules.insert(*schedule_id, sched);
        }
    }

    let steps = rotation::expand_pattern(req.start_date, req.end_date, &req.pattern)?;

    tracing::debug!(
        "Generating rotation: user={}, chart={}, steps={}, overwrite={}",
        req.user, chart.id, steps.len(), req.overwrite
    );

    let mut tx = pool.begin().await.map_err(db_err)?;
    let mut created = 0;
    let mut updated = 0;
    let mut skipped = 0;

    for step in &steps {
        lock_user_date(&mut tx, req.user, step.date).await?;
        let rows = duties_for_user_date(&mut tx, req.user, step.date).await?;
        let sched = &schedules[&step.schedule_id];

        let same_chart = rows.iter().find(|r| r.duty_chart_id == Some(chart.id));

        if req.overwrite {
            if let Some(row) = same_chart {
                if row.schedule_id == step.schedule_id {
                    skipped += 1;
                    continue;
                }
                let candidate = CandidateDuty {
                    user_id: req.user,
                    date: step.date,
                    schedule_id: step.schedule_id,
                    schedule_name: sched.name.clone(),
                    start_time: sched.start_time,
                    end_time: sched.end_time,
                    exclude_duty_id: Some(row.id),
                };
                // The same-chart row is excluded, so any remaining conflict
                // comes from a duty outside the chart and cannot be replaced.
                conflict::validate(&candidate, true, Some(&window), &to_existing(&rows))?;
                sqlx::query(r#"UPDATE duties SET schedule_id = $2 WHERE id = $1"#)
                    .bind(row.id)
                    .bind(step.schedule_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
                updated += 1;
                continue;
            }
        }

        let candidate = CandidateDuty {
            user_id: req.user,
            date: step.date,
            schedule_id: step.schedule_id,
            schedule_name: sched.name.clone(),
            start_time: sched.start_time,
            end_time: sched.end_time,
            exclude_duty_id: None,
        };
        match conflict::validate(&candidate, true, Some(&window), &to_existing(&rows)) {
            Ok(()) => {
                insert_duty(
                    &mut tx,
                    req.user,
                    chart.office_id,
                    step.schedule_id,
                    step.date,
                    Some(chart.id),
                    false,
                    true,
                )
                .await?;
                created += 1;
            }
            Err(
                e @ (ConflictError::DuplicateSchedule { .. } | ConflictError::TimeOverlap { .. }),
            ) => {
                // No same-chart duty exists on this date, so the conflict is
                // with a duty outside the chart. Overwrite cannot touch those.
                if req.overwrite {
                    return Err(e.into());
                }
                skipped += 1;
            }
            Err(other) => return Err(other.into()),
        }
    }

    tx.commit().await.map_err(db_err)?;

    tracing::debug!(
        "Rotation done: created={}, updated={}, skipped={}",
        created, updated, skipped
    );
    Ok(RotationResponse { created, updated, skipped })
}
