use crate::models::{DbOffice, DbUser};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, employee_id, full_name, office_id, role, is_active, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_office_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbOffice>> {
    let office = sqlx::query_as::<_, DbOffice>(
        r#"
        SELECT id, name, created_at
        FROM offices
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(office)
}

/// All users, for resolving spreadsheet rows. Import files may reference
/// employees from other offices, so this is deliberately unscoped.
pub async fn list_users(pool: &Pool<Postgres>) -> Result<Vec<DbUser>> {
    let users = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, employee_id, full_name, office_id, role, is_active, created_at
        FROM users
        ORDER BY full_name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}
