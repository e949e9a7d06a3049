//! Import reconciliation: the pure pipeline behind spreadsheet ingestion.
//!
//! The api crate parses the uploaded workbook into [`ImportRow`]s, the db
//! crate snapshots the state the rows must reconcile against (target office,
//! chart window, employees, schedules, already-committed duties) into an
//! [`ImportContext`], and [`reconcile`] runs every check without touching
//! storage. Dry-run and commit share this code path; commit persists the
//! resolved rows only when the report is clean.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{self, BsDate};
use crate::conflict::{self, CandidateDuty, ExistingDuty};
use crate::errors::{RosterError, RosterResult};
use crate::models::duty_chart::ChartWindow;

/// Imports report at most this many row errors; the whole file is still
/// rejected when any row fails.
pub const MAX_REPORTED_ERRORS: usize = 20;

pub const COLUMN_DATE: &str = "Date";
/// Legacy template header; both spellings address the same column.
pub const COLUMN_DATE_BS: &str = "Date (BS)";
pub const COLUMN_EMPLOYEE_ID: &str = "Employee ID";
pub const COLUMN_EMPLOYEE_NAME: &str = "Employee Name";
pub const COLUMN_SCHEDULE: &str = "Schedule";
pub const COLUMN_OFFICE: &str = "Office";
pub const COLUMN_START_TIME: &str = "Start Time";
pub const COLUMN_END_TIME: &str = "End Time";

/// Column indexes resolved from the header row. Column order in the file is
/// not significant; presence is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    pub date: usize,
    pub employee_id: usize,
    pub employee_name: usize,
    pub schedule: usize,
    pub office: usize,
    pub start_time: usize,
    pub end_time: usize,
}

impl HeaderLayout {
    pub fn resolve(headers: &[String]) -> RosterResult<Self> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        let date = find(COLUMN_DATE).or_else(|| find(COLUMN_DATE_BS));
        let employee_id = find(COLUMN_EMPLOYEE_ID);
        let employee_name = find(COLUMN_EMPLOYEE_NAME);
        let schedule = find(COLUMN_SCHEDULE);
        let office = find(COLUMN_OFFICE);
        let start_time = find(COLUMN_START_TIME);
        let end_time = find(COLUMN_END_TIME);

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push(COLUMN_DATE);
        }
        if employee_id.is_none() {
            missing.push(COLUMN_EMPLOYEE_ID);
        }
        if employee_name.is_none() {
            missing.push(COLUMN_EMPLOYEE_NAME);
        }
        if schedule.is_none() {
            missing.push(COLUMN_SCHEDULE);
        }
        if office.is_none() {
            missing.push(COLUMN_OFFICE);
        }
        if start_time.is_none() {
            missing.push(COLUMN_START_TIME);
        }
        if end_time.is_none() {
            missing.push(COLUMN_END_TIME);
        }
        if !missing.is_empty() {
            return Err(RosterError::Validation(format!(
                "Missing columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            date: date.unwrap(),
            employee_id: employee_id.unwrap(),
            employee_name: employee_name.unwrap(),
            schedule: schedule.unwrap(),
            office: office.unwrap(),
            start_time: start_time.unwrap(),
            end_time: end_time.unwrap(),
        })
    }
}

/// Raw content of a date cell before calendar resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    /// The cell carried a native date value.
    Day(NaiveDate),
    /// The cell carried text still to be parsed.
    Text(String),
    Empty,
}

/// One spreadsheet row, cells stringified, 1-based `row_number` as shown in
/// the sheet (header is row 1).
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub row_number: usize,
    pub date: DateCell,
    pub employee_id: String,
    pub employee_name: String,
    pub schedule: String,
    pub office: String,
    pub start_time: String,
    pub end_time: String,
}

impl ImportRow {
    fn is_blank(&self) -> bool {
        self.employee_id.trim().is_empty() && self.employee_name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct EmployeeRef {
    pub id: Uuid,
    pub employee_id: String,
    pub full_name: String,
    pub office_id: Option<Uuid>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct ScheduleRef {
    pub id: Uuid,
    pub name: String,
    pub office_id: Option<Uuid>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A duty already persisted in any chart, for cross-chart duplicate and
/// overlap detection.
#[derive(Debug, Clone)]
pub struct CommittedDuty {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Everything a reconciliation run needs to know about the world.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub office: OfficeRef,
    pub window: ChartWindow,
    pub today: NaiveDate,
    /// Actor holds `duties.assign_any_office`.
    pub assign_any_office: bool,
    pub employees: Vec<EmployeeRef>,
    pub schedules: Vec<ScheduleRef>,
    pub committed: Vec<CommittedDuty>,
}

/// A row that survived every check and is ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDuty {
    pub row_number: usize,
    pub user_id: Uuid,
    pub employee_id: String,
    pub full_name: String,
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub resolved: Vec<ResolvedDuty>,
    /// Rows whose employee resolved but is deactivated; skipped, not errors.
    pub skipped_inactive: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolve a date cell to a Gregorian date. A year at or beyond the BS window
/// start cannot be Gregorian and is converted; BS day-of-month can reach 32,
/// so text is split into components before any calendar is chosen.
fn resolve_date(cell: &DateCell) -> Result<NaiveDate, String> {
    let (year, month, day) = match cell {
        DateCell::Day(d) => {
            use chrono::Datelike;
            (d.year(), d.month(), d.day())
        }
        DateCell::Text(text) => {
            let text = text.trim();
            // Accept an ISO timestamp tail ("2025-01-05 00:00:00") by taking
            // the date part.
            let date_part = text.split_whitespace().next().unwrap_or("");
            let parts: Vec<&str> = date_part.split(['-', '/']).collect();
            if parts.len() != 3 {
                return Err(format!("unparseable date '{text}'"));
            }
            let nums: Option<Vec<i64>> =
                parts.iter().map(|p| p.trim().parse::<i64>().ok()).collect();
            match nums {
                Some(nums) => (nums[0] as i32, nums[1] as u32, nums[2] as u32),
                None => return Err(format!("unparseable date '{text}'")),
            }
        }
        DateCell::Empty => return Err("missing date".to_string()),
    };

    if calendar::is_bs_year(year) {
        let bs = BsDate::new(year, month, day).map_err(|e| e.to_string())?;
        calendar::bs_to_ad(bs).map_err(|e| e.to_string())
    } else {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| format!("invalid date {year:04}-{month:02}-{day:02}"))
    }
}

/// Normalize a declared time string to hour:minute precision.
fn normalize_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
        .and_then(|t| {
            use chrono::Timelike;
            NaiveTime::from_hms_opt(t.hour(), t.minute(), 0)
        })
}

/// Accept an "ID" or "ID - Name" cell, stripping to the ID portion.
fn strip_employee_id(cell: &str) -> String {
    cell.split(" - ").next().unwrap_or("").trim().to_string()
}

fn resolve_employee<'a>(
    ctx: &'a ImportContext,
    id_cell: &str,
    name_cell: &str,
) -> Option<&'a EmployeeRef> {
    let id = strip_employee_id(id_cell);
    if !id.is_empty() {
        if let Some(emp) = ctx
            .employees
            .iter()
            .find(|e| e.employee_id.eq_ignore_ascii_case(&id))
        {
            return Some(emp);
        }
    }
    let name = name_cell.trim();
    if !name.is_empty() {
        return ctx
            .employees
            .iter()
            .find(|e| e.full_name.eq_ignore_ascii_case(name));
    }
    None
}

/// Office-scoped schedule first, global template as fallback.
fn resolve_schedule<'a>(ctx: &'a ImportContext, name: &str) -> Option<&'a ScheduleRef> {
    let name = name.trim();
    ctx.schedules
        .iter()
        .find(|s| s.office_id == Some(ctx.office.id) && s.name.eq_ignore_ascii_case(name))
        .or_else(|| {
            ctx.schedules
                .iter()
                .find(|s| s.office_id.is_none() && s.name.eq_ignore_ascii_case(name))
        })
}

/// Run the full reconciliation pipeline over parsed rows. Checks per row, in
/// order, short-circuiting on the first failure: office match, date
/// resolution and range, employee resolution, office scope, schedule and
/// declared-time match, duplicate/overlap against both the file itself and
/// all committed state. Error collection stops at [`MAX_REPORTED_ERRORS`].
pub fn reconcile(ctx: &ImportContext, rows: &[ImportRow]) -> ImportReport {
    let mut report = ImportReport::default();
    // Rows accepted so far, keyed by (user, date), acting as pseudo-committed
    // state for in-file duplicate and overlap detection.
    let mut accepted: HashMap<(Uuid, NaiveDate), Vec<ExistingDuty>> = HashMap::new();

    for row in rows {
        if report.errors.len() >= MAX_REPORTED_ERRORS {
            break;
        }
        if row.is_blank() {
            continue;
        }
        let mut fail = |row_number: usize, message: String, report: &mut ImportReport| {
            report.errors.push(RowError { row: row_number, message });
        };

        // Office match.
        let declared_office = row.office.trim();
        if !declared_office.eq_ignore_ascii_case(&ctx.office.name) {
            fail(
                row.row_number,
                format!(
                    "office '{declared_office}' does not match target office '{}'",
                    ctx.office.name
                ),
                &mut report,
            );
            continue;
        }

        // Date resolution and range checks.
        let date = match resolve_date(&row.date) {
            Ok(date) => date,
            Err(msg) => {
                fail(row.row_number, msg, &mut report);
                continue;
            }
        };
        if date < ctx.today {
            fail(
                row.row_number,
                format!("date {date} is in the past"),
                &mut report,
            );
            continue;
        }
        if !ctx.window.contains(date) {
            fail(
                row.row_number,
                format!("date {date} is outside the duty chart window"),
                &mut report,
            );
            continue;
        }

        // Employee resolution.
        let employee = match resolve_employee(ctx, &row.employee_id, &row.employee_name) {
            Some(emp) => emp,
            None => {
                let label = if row.employee_id.trim().is_empty() {
                    row.employee_name.trim()
                } else {
                    row.employee_id.trim()
                };
                fail(
                    row.row_number,
                    format!("employee '{label}' not found"),
                    &mut report,
                );
                continue;
            }
        };
        if !employee.is_active {
            report.skipped_inactive += 1;
            continue;
        }

        // Office scope for the target employee.
        if !ctx.assign_any_office && employee.office_id != Some(ctx.office.id) {
            fail(
                row.row_number,
                format!(
                    "employee '{}' does not belong to office '{}'",
                    employee.full_name, ctx.office.name
                ),
                &mut report,
            );
            continue;
        }

        // Schedule resolution and declared-time match.
        let schedule = match resolve_schedule(ctx, &row.schedule) {
            Some(s) => s,
            None => {
                fail(
                    row.row_number,
                    format!("schedule '{}' not found", row.schedule.trim()),
                    &mut report,
                );
                continue;
            }
        };
        let declared_start = normalize_time(&row.start_time);
        let declared_end = normalize_time(&row.end_time);
        match (declared_start, declared_end) {
            (Some(start), Some(end))
                if start == schedule.start_time && end == schedule.end_time => {}
            _ => {
                fail(
                    row.row_number,
                    format!(
                        "declared times {}-{} do not match schedule '{}' ({}-{})",
                        row.start_time.trim(),
                        row.end_time.trim(),
                        schedule.name,
                        schedule.start_time.format("%H:%M"),
                        schedule.end_time.format("%H:%M"),
                    ),
                    &mut report,
                );
                continue;
            }
        }

        // Duplicate and overlap detection: committed state across all charts
        // first, then rows already accepted from this file.
        let key = (employee.id, date);
        let mut existing: Vec<ExistingDuty> = ctx
            .committed
            .iter()
            .filter(|c| c.user_id == employee.id && c.date == date)
            .map(|c| ExistingDuty {
                duty_id: Uuid::nil(),
                schedule_id: c.schedule_id,
                schedule_name: c.schedule_name.clone(),
                start_time: c.start_time,
                end_time: c.end_time,
            })
            .collect();
        if let Some(in_file) = accepted.get(&key) {
            existing.extend(in_file.iter().cloned());
        }

        let candidate = CandidateDuty {
            user_id: employee.id,
            date,
            schedule_id: schedule.id,
            schedule_name: schedule.name.clone(),
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            exclude_duty_id: None,
        };
        // Window and activation were checked above; only the duplicate and
        // overlap checks remain.
        if let Err(err) = conflict::validate(&candidate, true, None, &existing) {
            fail(row.row_number, err.to_string(), &mut report);
            continue;
        }

        accepted.entry(key).or_default().push(ExistingDuty {
            duty_id: Uuid::nil(),
            schedule_id: schedule.id,
            schedule_name: schedule.name.clone(),
            start_time: schedule.start_time,
            end_time: schedule.end_time,
        });
        report.resolved.push(ResolvedDuty {
            row_number: row.row_number,
            user_id: employee.id,
            employee_id: employee.employee_id.clone(),
            full_name: employee.full_name.clone(),
            schedule_id: schedule.id,
            schedule_name: schedule.name.clone(),
            date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
        });
    }

    report
}
