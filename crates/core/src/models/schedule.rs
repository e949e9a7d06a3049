use chrono::{NaiveTime, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named shift template with a time range, optionally scoped to one office.
/// An office-less schedule is a global template visible to every office until
/// shadowed by an office-local schedule of the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub office_id: Option<Uuid>,
    pub shift_type: Option<String>,
    pub alias: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn is_global_template(&self) -> bool {
        self.office_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub office: Option<Uuid>,
    pub shift_type: Option<String>,
    pub alias: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub office: Option<Uuid>,
    pub shift_type: Option<String>,
    pub alias: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub office: Option<Uuid>,
    pub office_name: Option<String>,
    pub shift_type: Option<String>,
    pub alias: Option<String>,
    pub status: String,
}
