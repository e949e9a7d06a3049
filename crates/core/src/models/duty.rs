use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One employee's assignment to one shift on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
    pub id: Uuid,
    pub user_id: Uuid,
    pub office_id: Uuid,
    pub schedule_id: Uuid,
    pub date: NaiveDate,
    pub duty_chart_id: Option<Uuid>,
    pub is_completed: bool,
    pub currently_available: bool,
}

/// One candidate assignment in a bulk-upsert batch. Items are applied in
/// order inside a single transaction; the first failing item aborts the
/// whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpsertItem {
    pub user: Uuid,
    pub office: Uuid,
    pub schedule: Uuid,
    pub date: NaiveDate,
    pub duty_chart: Option<Uuid>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub currently_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpsertResponse {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRotationRequest {
    pub user: Uuid,
    pub duty_chart: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pattern: Vec<Uuid>,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationResponse {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub user_name: Option<String>,
    pub office: Uuid,
    pub office_name: Option<String>,
    pub schedule: Uuid,
    pub schedule_name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub date: NaiveDate,
    pub duty_chart: Option<Uuid>,
    pub is_completed: bool,
    pub currently_available: bool,
}
