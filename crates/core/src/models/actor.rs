use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role slug granting unrestricted access through the authorization gate.
pub const ROLE_SUPERADMIN: &str = "SUPERADMIN";

/// The authenticated principal on whose behalf an operation runs. Session
/// management lives outside this service; the actor id arrives with the
/// request and is resolved against the user directory before any write path
/// touches data. No operation consults ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub full_name: String,
    pub office_id: Option<Uuid>,
    pub role: String,
    pub is_active: bool,
}

impl Actor {
    pub fn is_global_admin(&self) -> bool {
        self.role == ROLE_SUPERADMIN
    }
}
