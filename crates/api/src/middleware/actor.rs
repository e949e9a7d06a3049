//! # Actor Resolution
//!
//! Every mutating endpoint needs to know who is acting. The caller identity
//! arrives in the `X-Actor-Id` header as a user UUID; this module extracts
//! it and resolves it to an [`Actor`] with its role and office, which the
//! authorization gate then consults. There is no ambient current-user state.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use rosterd_core::errors::RosterError;
use rosterd_core::models::actor::Actor;
use sqlx::PgPool;
use uuid::Uuid;

use crate::middleware::error_handling::AppError;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The caller's user id, extracted from the `X-Actor-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(ACTOR_HEADER).ok_or_else(|| {
            AppError(RosterError::Authorization(
                "Missing X-Actor-Id header".to_string(),
            ))
        })?;

        let raw = header.to_str().map_err(|_| {
            AppError(RosterError::Authorization(
                "Invalid X-Actor-Id header".to_string(),
            ))
        })?;

        let id = Uuid::parse_str(raw.trim()).map_err(|_| {
            AppError(RosterError::Authorization(
                "X-Actor-Id is not a valid UUID".to_string(),
            ))
        })?;

        Ok(ActorId(id))
    }
}

/// Resolve the extracted id against the user directory. Unknown or
/// deactivated actors are rejected outright.
pub async fn resolve_actor(pool: &PgPool, id: ActorId) -> Result<Actor, RosterError> {
    let user = rosterd_db::repositories::directory::get_user_by_id(pool, id.0)
        .await?
        .ok_or_else(|| RosterError::Authorization("Unknown actor".to_string()))?;

    if !user.is_active {
        return Err(RosterError::Authorization(
            "Actor account is deactivated".to_string(),
        ));
    }

    Ok(Actor {
        id: user.id,
        full_name: user.full_name,
        office_id: user.office_id,
        role: user.role,
        is_active: user.is_active,
    })
}
