use crate::models::DbSchedule;
use chrono::{NaiveTime, Utc};
use eyre::Result;
use rosterd_core::errors::{RosterError, RosterResult};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

fn check_time_range(start_time: NaiveTime, end_time: NaiveTime) -> RosterResult<()> {
    // Overnight shifts are not supported; a shift must end the day it starts.
    if end_time <= start_time {
        return Err(RosterError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn create_schedule(
    pool: &Pool<Postgres>,
    name: &str,
    start_time: NaiveTime,
    end_time: NaiveTime,
    office_id: Option<Uuid>,
    shift_type: Option<&str>,
    alias: Option<&str>,
    status: &str,
) -> RosterResult<DbSchedule> {
    check_time_range(start_time, end_time)?;

    // Pre-check ahead of the partial unique indexes so the common case gets
    // a clean conflict message instead of a database error.
    let duplicate = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM schedules
            WHERE LOWER(name) = LOWER($1)
              AND office_id IS NOT DISTINCT FROM $2
              AND start_time = $3
              AND end_time = $4
        );
        "#,
    )
    .bind(name)
    .bind(office_id)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(pool)
    .await
    .map_err(|e| RosterError::Database(e.into()))?;
    if duplicate {
        return Err(RosterError::Conflict(format!(
            "Schedule '{name}' with this time range already exists"
        )));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating schedule: id={}, name={}, office={:?}, range={}-{}",
        id, name, office_id, start_time, end_time
    );

    let schedule = sqlx::query_as::<_, DbSchedule>(
        r#"
        INSERT INTO schedules (id, name, start_time, end_time, office_id, shift_type, alias, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, name, start_time, end_time, office_id, shift_type, alias, status, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(start_time)
    .bind(end_time)
    .bind(office_id)
    .bind(shift_type)
    .bind(alias)
    .bind(status)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => RosterError::Conflict(
            format!("Schedule '{name}' with this time range already exists"),
        ),
        other => RosterError::Database(other.into()),
    })?;

    Ok(schedule)
}

pub async fn get_schedule_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSchedule>> {
    let schedule = sqlx::query_as::<_, DbSchedule>(
        r#"
        SELECT id, name, start_time, end_time, office_id, shift_type, alias, status, created_at
        FROM schedules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(schedule)
}

/// Active schedules visible to one office: its own plus the global templates
/// it has not shadowed with a same-named local schedule.
pub async fn list_schedules_for_office(
    pool: &Pool<Postgres>,
    office_id: Uuid,
) -> Result<Vec<DbSchedule>> {
    let schedules = sqlx::query_as::<_, DbSchedule>(
        r#"
        SELECT s.id, s.name, s.start_time, s.end_time, s.office_id, s.shift_type, s.alias, s.status, s.created_at
        FROM schedules s
        WHERE s.status = 'active'
          AND (
            s.office_id = $1
            OR (
                s.office_id IS NULL
                AND NOT EXISTS (
                    SELECT 1 FROM schedules l
                    WHERE l.office_id = $1
                      AND l.status = 'active'
                      AND LOWER(l.name) = LOWER(s.name)
                )
            )
          )
        ORDER BY s.start_time ASC, s.name ASC
        "#,
    )
    .bind(office_id)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

/// Schedules attached to one duty chart, active or not.
pub async fn list_schedules_for_chart(
    pool: &Pool<Postgres>,
    duty_chart_id: Uuid,
) -> Result<Vec<DbSchedule>> {
    let schedules = sqlx::query_as::<_, DbSchedule>(
        r#"
        SELECT s.id, s.name, s.start_time, s.end_time, s.office_id, s.shift_type, s.alias, s.status, s.created_at
        FROM schedules s
        JOIN duty_chart_schedules dcs ON dcs.schedule_id = s.id
        WHERE dcs.duty_chart_id = $1
        ORDER BY s.start_time ASC, s.name ASC
        "#,
    )
    .bind(duty_chart_id)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

/// Active global templates, office-less by definition.
pub async fn list_global_templates(pool: &Pool<Postgres>) -> Result<Vec<DbSchedule>> {
    let schedules = sqlx::query_as::<_, DbSchedule>(
        r#"
        SELECT id, name, start_time, end_time, office_id, shift_type, alias, status, created_at
        FROM schedules
        WHERE office_id IS NULL AND status = 'active'
        ORDER BY start_time ASC, name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_schedule(
    pool: &Pool<Postgres>,
    id: Uuid,
    name: Option<&str>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    shift_type: Option<&str>,
    alias: Option<&str>,
    status: Option<&str>,
) -> RosterResult<DbSchedule> {
    let schedule = get_schedule_by_id(pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound("Schedule not found".to_string()))?;

    let name = name.unwrap_or(&schedule.name);
    let start_time = start_time.unwrap_or(schedule.start_time);
    let end_time = end_time.unwrap_or(schedule.end_time);
    let shift_type = shift_type.or(schedule.shift_type.as_deref());
    let alias = alias.or(schedule.alias.as_deref());
    let status = status.unwrap_or(&schedule.status);

    check_time_range(start_time, end_time)?;

    let updated = sqlx::query_as::<_, DbSchedule>(
        r#"
        UPDATE schedules
        SET name = $2, start_time = $3, end_time = $4, shift_type = $5, alias = $6, status = $7
        WHERE id = $1
        RETURNING id, name, start_time, end_time, office_id, shift_type, alias, status, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(start_time)
    .bind(end_time)
    .bind(shift_type)
    .bind(alias)
    .bind(status)
    .fetch_one(pool)
    .await
    .map_err(|e| RosterError::Database(e.into()))?;

    Ok(updated)
}

/// Delete a schedule along with its duties and chart links.
pub async fn delete_schedule(pool: &Pool<Postgres>, id: Uuid) -> RosterResult<()> {
    get_schedule_by_id(pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound("Schedule not found".to_string()))?;

    let mut tx = pool.begin().await.map_err(|e| RosterError::Database(e.into()))?;
    sqlx::query(r#"DELETE FROM duties WHERE schedule_id = $1"#)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RosterError::Database(e.into()))?;
    sqlx::query(r#"DELETE FROM duty_chart_schedules WHERE schedule_id = $1"#)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RosterError::Database(e.into()))?;
    sqlx::query(r#"DELETE FROM schedules WHERE id = $1"#)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RosterError::Database(e.into()))?;
    tx.commit().await.map_err(|e| RosterError::Database(e.into()))?;

    Ok(())
}
