use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbOffice {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub employee_id: String,
    pub full_name: String,
    pub office_id: Option<Uuid>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSchedule {
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDutyChart {
    pub id: Uuid,
    pub office_id: Uuid,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDuty {
    pub id: Uuid,
    pub user_id: Uuid,
    pub office_id: Uuid,
    pub schedule_id: Uuid,
    pub date: NaiveDate,
    pub duty_chart_id: Option<Uuid>,
    pub is_completed: bool,
    pub currently_available: bool,
    pub created_at: DateTime<Utc>,
}

/// A duty joined with the names and shift times the list endpoints return.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDutyDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub office_id: Uuid,
    pub office_name: String,
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub date: NaiveDate,
    pub duty_chart_id: Option<Uuid>,
    pub is_completed: bool,
    pub currently_available: bool,
}

/// A duty for one (user, date), joined with its schedule's time range. This
/// is the shape the conflict validator consumes.
#[derive(Debug, Clone, FromRow)]
pub struct DbUserDutyRow {
    pub id: Uuid,
    pub duty_chart_id: Option<Uuid>,
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
