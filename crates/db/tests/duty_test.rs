//! Transactional coordinator tests against a live Postgres instance.
//! Requires TEST_DATABASE_URL (defaults to the local rosterd_test database).
//! Every test seeds its own uniquely-named rows so runs are repeatable.

use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use rosterd_core::errors::RosterError;
use rosterd_core::models::duty::{BulkUpsertItem, GenerateRotationRequest};
use rosterd_db::mock::create_test_pool;
use rosterd_db::repositories::{duty, duty_chart, schedule};
use rosterd_db::DbPool;
use uuid::Uuid;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

async fn seed_office(pool: &DbPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO offices (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("Office {id}"))
        .execute(pool)
        .await
        .expect("insert office");
    id
}

async fn seed_user(pool: &DbPool, office: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, employee_id, full_name, office_id, is_active)
         VALUES ($1, $2, $3, $4, TRUE)",
    )
    .bind(id)
    .bind(format!("EMP-{id}"))
    .bind("Test Employee")
    .bind(office)
    .execute(pool)
    .await
    .expect("insert user");
    id
}

async fn deactivate_user(pool: &DbPool, user: Uuid) {
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user)
        .execute(pool)
        .await
        .expect("deactivate user");
}

async fn seed_schedule(
    pool: &DbPool,
    office: Uuid,
    start: NaiveTime,
    end: NaiveTime,
) -> Uuid {
    let schedule = schedule::create_schedule(
        pool,
        &format!("Shift {}", Uuid::new_v4()),
        start,
        end,
        Some(office),
        None,
        None,
        "active",
    )
    .await
    .expect("create schedule");
    schedule.id
}

fn item(user: Uuid, office: Uuid, schedule: Uuid, date: NaiveDate) -> BulkUpsertItem {
    BulkUpsertItem {
        user,
        office,
        schedule,
        date,
        duty_chart: None,
        is_completed: None,
        currently_available: None,
    }
}

#[tokio::test]
async fn test_bulk_upsert_is_idempotent() {
    let pool = create_test_pool().await;
    let office = seed_office(&pool).await;
    let user = seed_user(&pool, office).await;
    let morning = seed_schedule(&pool, office, t(8, 0), t(16, 0)).await;

    let items = vec![item(user, office, morning, d(2025, 3, 10))];

    let first = duty::bulk_upsert(&pool, &items, false)
        .await
        .expect("first upsert");
    assert_eq!(first.created, 1);
    assert_eq!(first.updated, 0);

    // Resubmitting the identical batch touches the same row.
    let second = duty::bulk_upsert(&pool, &items, false)
        .await
        .expect("second upsert");
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 1);
}

#[tokio::test]
async fn test_bulk_upsert_update_path_rejects_deactivated_user() {
    let pool = create_test_pool().await;
    let office = seed_office(&pool).await;
    let user = seed_user(&pool, office).await;
    let morning = seed_schedule(&pool, office, t(8, 0), t(16, 0)).await;

    let items = vec![item(user, office, morning, d(2025, 3, 11))];
    duty::bulk_upsert(&pool, &items, false)
        .await
        .expect("initial upsert");

    // The same item resubmitted after deactivation matches an existing row,
    // but a deactivated user must reject the batch on any write path.
    deactivate_user(&pool, user).await;
    let err = duty::bulk_upsert(&pool, &items, false)
        .await
        .expect_err("deactivated user should be rejected");
    assert!(
        matches!(err, RosterError::Validation(ref msg) if msg.contains("not activated")),
        "expected validation error, got {err:?}"
    );
}

#[tokio::test]
async fn test_bulk_upsert_rejects_overlap_with_existing_duty() {
    let pool = create_test_pool().await;
    let office = seed_office(&pool).await;
    let user = seed_user(&pool, office).await;
    let morning = seed_schedule(&pool, office, t(8, 0), t(16, 0)).await;
    let overlapping = seed_schedule(&pool, office, t(15, 0), t(23, 0)).await;

    duty::bulk_upsert(&pool, &[item(user, office, morning, d(2025, 3, 12))], false)
        .await
        .expect("seed duty");

    let err = duty::bulk_upsert(
        &pool,
        &[item(user, office, overlapping, d(2025, 3, 12))],
        false,
    )
    .await
    .expect_err("overlapping shift should be rejected");
    assert!(
        matches!(err, RosterError::Conflict(_)),
        "expected conflict error, got {err:?}"
    );
}

#[tokio::test]
async fn test_rotation_counts_created_then_skips_duplicates() {
    let pool = create_test_pool().await;
    let office = seed_office(&pool).await;
    let user = seed_user(&pool, office).await;
    let morning = seed_schedule(&pool, office, t(8, 0), t(16, 0)).await;

    let chart = duty_chart::create_duty_chart(
        &pool,
        office,
        d(2025, 3, 1),
        Some(d(2025, 3, 31)),
        None,
        &[morning],
    )
    .await
    .expect("create chart");

    let req = GenerateRotationRequest {
        user,
        duty_chart: chart.id,
        start_date: d(2025, 3, 10),
        end_date: d(2025, 3, 14),
        pattern: vec![morning],
        overwrite: false,
    };

    let first = duty::generate_rotation(&pool, &req)
        .await
        .expect("first rotation");
    assert_eq!(first.created, 5);
    assert_eq!(first.updated, 0);
    assert_eq!(first.skipped, 0);

    // Re-running the same rotation finds every day already assigned.
    let second = duty::generate_rotation(&pool, &req)
        .await
        .expect("second rotation");
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped, 5);
}

#[tokio::test]
async fn test_rotation_rejects_range_outside_chart_window() {
    let pool = create_test_pool().await;
    let office = seed_office(&pool).await;
    let user = seed_user(&pool, office).await;
    let morning = seed_schedule(&pool, office, t(8, 0), t(16, 0)).await;

    let chart = duty_chart::create_duty_chart(
        &pool,
        office,
        d(2025, 3, 1),
        Some(d(2025, 3, 31)),
        None,
        &[morning],
    )
    .await
    .expect("create chart");

    let req = GenerateRotationRequest {
        user,
        duty_chart: chart.id,
        start_date: d(2025, 3, 28),
        end_date: d(2025, 4, 2),
        pattern: vec![morning],
        overwrite: false,
    };

    let err = duty::generate_rotation(&pool, &req)
        .await
        .expect_err("range past the window should be rejected");
    assert!(
        matches!(err, RosterError::Validation(_)),
        "expected validation error, got {err:?}"
    );
}
