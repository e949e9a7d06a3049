use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{RosterError, RosterResult};

/// A bounded date window scoping a set of duty assignments to one office.
/// `end_date = None` means open-ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyChart {
    pub id: Uuid,
    pub office_id: Uuid,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub name: Option<String>,
    pub schedule_ids: Vec<Uuid>,
}

/// The [effective_date, end_date] containment window of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartWindow {
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl ChartWindow {
    pub fn new(effective_date: NaiveDate, end_date: Option<NaiveDate>) -> RosterResult<Self> {
        if let Some(end) = end_date {
            if end < effective_date {
                return Err(RosterError::Validation(
                    "End date must be on or after the effective date".to_string(),
                ));
            }
        }
        Ok(Self { effective_date, end_date })
    }

    /// Both boundary dates are inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.effective_date && self.end_date.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDutyChartRequest {
    pub office: Uuid,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub name: Option<String>,
    #[serde(default)]
    pub schedules: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDutyChartRequest {
    pub effective_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub name: Option<String>,
    pub schedules: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyChartResponse {
    pub id: Uuid,
    pub office: Uuid,
    pub office_name: String,
    pub effective_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub name: Option<String>,
    pub schedules: Vec<Uuid>,
    pub schedule_names: Vec<String>,
}
