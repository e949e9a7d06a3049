use crate::models::DbDutyChart;
use chrono::{NaiveDate, Utc};
use eyre::Result;
use rosterd_core::errors::{RosterError, RosterResult};
use rosterd_core::models::duty_chart::ChartWindow;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_duty_chart(
    pool: &Pool<Postgres>,
    office_id: Uuid,
    effective_date: NaiveDate,
    end_date: Option<NaiveDate>,
    name: Option<&str>,
    schedule_ids: &[Uuid],
) -> RosterResult<DbDutyChart> {
    // Window validation up front so the CHECK constraint never fires.
    ChartWindow::new(effective_date, end_date)?;

    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating duty chart: id={}, office={}, window={}..{:?}",
        id, office_id, effective_date, end_date
    );

    let mut tx = pool.begin().await.map_err(|e| RosterError::Database(e.into()))?;

    let chart = sqlx::query_as::<_, DbDutyChart>(
        r#"
        INSERT INTO duty_charts (id, office_id, effective_date, end_date, name, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, office_id, effective_date, end_date, name, created_at
        "#,
    )
    .bind(id)
    .bind(office_id)
    .bind(effective_date)
    .bind(end_date)
    .bind(name)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| RosterError::Database(e.into()))?;

    for schedule_id in schedule_ids {
        sqlx::query(
            r#"
            INSERT INTO duty_chart_schedules (duty_chart_id, schedule_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(schedule_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RosterError::Database(e.into()))?;
    }

    tx.commit().await.map_err(|e| RosterError::Database(e.into()))?;

    Ok(chart)
}

pub async fn get_duty_chart_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbDutyChart>> {
    let chart = sqlx::query_as::<_, DbDutyChart>(
        r#"
        SELECT id, office_id, effective_date, end_date, name, created_at
        FROM duty_charts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(chart)
}

pub async fn list_duty_charts(
    pool: &Pool<Postgres>,
    office_id: Option<Uuid>,
) -> Result<Vec<DbDutyChart>> {
    let charts = sqlx::query_as::<_, DbDutyChart>(
        r#"
        SELECT id, office_id, effective_date, end_date, name, created_at
        FROM duty_charts
        WHERE $1::uuid IS NULL OR office_id = $1
        ORDER BY effective_date DESC
        "#,
    )
    .bind(office_id)
    .fetch_all(pool)
    .await?;

    Ok(charts)
}

pub async fn get_chart_schedule_ids(pool: &Pool<Postgres>, chart_id: Uuid) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT dcs.schedule_id
        FROM duty_chart_schedules dcs
        JOIN schedules s ON s.id = dcs.schedule_id
        WHERE dcs.duty_chart_id = $1
        ORDER BY s.start_time ASC
        "#,
    )
    .bind(chart_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn update_duty_chart(
    pool: &Pool<Postgres>,
    id: Uuid,
    effective_date: Option<NaiveDate>,
    end_date: Option<Option<NaiveDate>>,
    name: Option<&str>,
    schedule_ids: Option<&[Uuid]>,
) -> RosterResult<DbDutyChart> {
    let chart = get_duty_chart_by_id(pool, id)
        .await?
        .ok_or_else(|| RosterError::NotFound("Duty chart not found".to_string()))?;

    let effective_date = effective_date.unwrap_or(chart.effective_date);
    let end_date = end_date.unwrap_or(chart.end_date);
    let name = name.or(chart.name.as_deref());

    ChartWindow::new(effective_date, end_date)?;

    // Shrinking the window below already-assigned duties would strand them.
    let stranded = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM duties
            WHERE duty_chart_id = $1
              AND (date < $2 OR ($3::date IS NOT NULL AND date > $3))
        );
        "#,
    )
    .bind(id)
    .bind(effective_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
    .map_err(|e| RosterError::Database(e.into()))?;

    if stranded {
        return Err(RosterError::Validation(
            "Cannot shrink the chart window past already-assigned duties".to_string(),
        ));
    }

    let mut tx = pool.begin().await.map_err(|e| RosterError::Database(e.into()))?;

    let updated = sqlx::query_as::<_, DbDutyChart>(
        r#"
        UPDATE duty_charts
        SET effective_date = $2, end_date = $3, name = $4
        WHERE id = $1
        RETURNING id, office_id, effective_date, end_date, name, created_at
        "#,
    )
    .bind(id)
    .bind(effective_date)
    .bind(end_date)
    .bind(name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| RosterError::Database(e.into()))?;

    if let Some(schedule_ids) = schedule_ids {
        sqlx::query(r#"DELETE FROM duty_chart_schedules WHERE duty_chart_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RosterError::Database(e.into()))?;

        for schedule_id in schedule_ids {
            sqlx::query(
                r#"
                INSERT INTO duty_chart_schedules (duty_chart_id, schedule_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(schedule_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RosterError::Database(e.into()))?;
        }
    }

    tx.commit().await.map_err(|e| RosterError::Database(e.into()))?;

    Ok(updated)
}

/// The chart of `office_id` whose window contains `date`, if any.
pub async fn find_chart_containing(
    pool: &Pool<Postgres>,
    office_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DbDutyChart>> {
    let chart = sqlx::query_as::<_, DbDutyChart>(
        r#"
        SELECT id, office_id, effective_date, end_date, name, created_at
        FROM duty_charts
        WHERE office_id = $1
          AND effective_date <= $2
          AND (end_date IS NULL OR end_date >= $2)
        ORDER BY effective_date DESC
        LIMIT 1
        "#,
    )
    .bind(office_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(chart)
}
