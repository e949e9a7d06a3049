//! Authorization gate: whether an actor may touch a given office's rosters.
//! Office reach is the actor's primary office plus any secondary
//! assignments; blanket permission slugs and the superadmin role widen it
//! to every office.

use eyre::Result;
use rosterd_core::errors::{RosterError, RosterResult};
use rosterd_core::models::actor::Actor;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// True when the user's role or a direct grant carries the permission slug.
pub async fn has_permission(pool: &Pool<Postgres>, user_id: Uuid, slug: &str) -> Result<bool> {
    let granted = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN users u ON u.role = rp.role
            WHERE u.id = $1 AND p.slug = $2 AND p.is_active
            UNION
            SELECT 1
            FROM permissions p
            JOIN user_permissions up ON up.permission_id = p.id
            WHERE up.user_id = $1 AND p.slug = $2 AND p.is_active
        );
        "#,
    )
    .bind(user_id)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(granted)
}

/// The offices the user can act on without a blanket permission: their
/// primary office plus secondary assignments.
pub async fn allowed_office_ids(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT office_id FROM users WHERE id = $1 AND office_id IS NOT NULL
        UNION
        SELECT office_id FROM user_secondary_offices WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Whether the actor can act on `office_id`, given the blanket permission
/// slug that would widen their reach to any office.
pub async fn actor_allows_office(
    pool: &Pool<Postgres>,
    actor: &Actor,
    office_id: Uuid,
    blanket_slug: &str,
) -> Result<bool> {
    if actor.is_global_admin() {
        return Ok(true);
    }
    if has_permission(pool, actor.id, blanket_slug).await? {
        return Ok(true);
    }
    let allowed = allowed_office_ids(pool, actor.id).await?;
    Ok(allowed.contains(&office_id))
}

/// [`actor_allows_office`] that fails with an authorization error instead of
/// returning false.
pub async fn ensure_office_access(
    pool: &Pool<Postgres>,
    actor: &Actor,
    office_id: Uuid,
    blanket_slug: &str,
) -> RosterResult<()> {
    let allowed = actor_allows_office(pool, actor, office_id, blanket_slug)
        .await
        .map_err(RosterError::Database)?;
    if !allowed {
        return Err(RosterError::Authorization(
            "You do not have access to this office".to_string(),
        ));
    }
    Ok(())
}
