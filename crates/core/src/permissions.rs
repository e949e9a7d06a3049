//! Permission slugs consulted through the authorization gate. The slugs match
//! the seeded RBAC catalog; the gate resolves them against role grants and
//! per-user grants.

/// Assign duties to employees outside the actor's own offices.
pub const ASSIGN_ANY_OFFICE: &str = "duties.assign_any_office";

/// Blanket read access to every office's charts.
pub const VIEW_ANY_OFFICE_CHART: &str = "duties.view_any_office_chart";

/// Blanket write access to every office's charts.
pub const CREATE_ANY_OFFICE_CHART: &str = "duties.create_any_office_chart";

/// Create or edit global schedule templates (office-less schedules).
pub const MANAGE_GLOBAL_TEMPLATES: &str = "duties.manage_global_templates";
