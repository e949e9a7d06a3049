//! Conflict validator: the single source of truth for whether a candidate
//! duty may be written. Every write path (bulk upsert, rotation, import)
//! funnels candidates through [`validate`] before touching storage.
//!
//! The overlap test is half-open: two shifts conflict when
//! `candidate.start < existing.end && candidate.end > existing.start`, so a
//! shift ending 16:00 does not collide with one starting 16:00.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::duty_chart::ChartWindow;

/// A candidate assignment under validation.
#[derive(Debug, Clone)]
pub struct CandidateDuty {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Set when updating an existing row so it does not conflict with itself.
    pub exclude_duty_id: Option<Uuid>,
}

/// An already-persisted duty for the candidate's (user, date), joined with
/// its schedule's time range.
#[derive(Debug, Clone)]
pub struct ExistingDuty {
    pub duty_id: Uuid,
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("user is not activated")]
    UserNotActivated,

    #[error("duty date {date} is outside the duty chart window ({window})")]
    OutsideChartWindow { date: NaiveDate, window: String },

    #[error("duplicate shift assignment: '{schedule}' is already assigned on {date}")]
    DuplicateSchedule { schedule: String, date: NaiveDate },

    #[error(
        "time overlap on {date}: '{candidate}' ({candidate_start}-{candidate_end}) \
         overlaps '{existing}' ({existing_start}-{existing_end})"
    )]
    TimeOverlap {
        date: NaiveDate,
        candidate: String,
        candidate_start: NaiveTime,
        candidate_end: NaiveTime,
        existing: String,
        existing_start: NaiveTime,
        existing_end: NaiveTime,
    },
}

impl From<ConflictError> for RosterError {
    fn from(err: ConflictError) -> Self {
        match err {
            ConflictError::UserNotActivated | ConflictError::OutsideChartWindow { .. } => {
                RosterError::Validation(err.to_string())
            }
            ConflictError::DuplicateSchedule { .. } | ConflictError::TimeOverlap { .. } => {
                RosterError::Conflict(err.to_string())
            }
        }
    }
}

fn window_label(window: &ChartWindow) -> String {
    match window.end_date {
        Some(end) => format!("{} to {}", window.effective_date, end),
        None => format!("{} onwards", window.effective_date),
    }
}

/// Accept or reject one candidate against the state already on disk for its
/// (user, date). `existing` must hold every duty row for that key, minus the
/// row being updated when `exclude_duty_id` is set.
pub fn validate(
    candidate: &CandidateDuty,
    user_activated: bool,
    chart_window: Option<&ChartWindow>,
    existing: &[ExistingDuty],
) -> Result<(), ConflictError> {
    if !user_activated {
        return Err(ConflictError::UserNotActivated);
    }

    if let Some(window) = chart_window {
        if !window.contains(candidate.date) {
            return Err(ConflictError::OutsideChartWindow {
                date: candidate.date,
                window: window_label(window),
            });
        }
    }

    for duty in existing {
        if candidate.exclude_duty_id == Some(duty.duty_id) {
            continue;
        }

        if duty.schedule_id == candidate.schedule_id {
            return Err(ConflictError::DuplicateSchedule {
                schedule: duty.schedule_name.clone(),
                date: candidate.date,
            });
        }

        if candidate.start_time < duty.end_time && candidate.end_time > duty.start_time {
            return Err(ConflictError::TimeOverlap {
                date: candidate.date,
                candidate: candidate.schedule_name.clone(),
                candidate_start: candidate.start_time,
                candidate_end: candidate.end_time,
                existing: duty.schedule_name.clone(),
                existing_start: duty.start_time,
                existing_end: duty.end_time,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn candidate(start: NaiveTime, end: NaiveTime) -> CandidateDuty {
        CandidateDuty {
            user_id: Uuid::new_v4(),
            date: d(2025, 1, 5),
            schedule_id: Uuid::new_v4(),
            schedule_name: "Evening".to_string(),
            start_time: start,
            end_time: end,
            exclude_duty_id: None,
        }
    }

    fn morning(duty_id: Uuid) -> ExistingDuty {
        ExistingDuty {
            duty_id,
            schedule_id: Uuid::new_v4(),
            schedule_name: "Morning".to_string(),
            start_time: t(8, 0),
            end_time: t(16, 0),
        }
    }

    #[test]
    fn accepts_when_no_existing_duties() {
        let cand = candidate(t(8, 0), t(16, 0));
        assert_eq!(validate(&cand, true, None, &[]), Ok(()));
    }

    #[test]
    fn rejects_deactivated_user() {
        let cand = candidate(t(8, 0), t(16, 0));
        assert_eq!(
            validate(&cand, false, None, &[]),
            Err(ConflictError::UserNotActivated)
        );
    }

    #[test]
    fn rejects_overlapping_shift_naming_both_schedules() {
        // Scenario: Morning 08:00-16:00 already assigned, Evening 15:00-23:00 added.
        let cand = candidate(t(15, 0), t(23, 0));
        let err = validate(&cand, true, None, &[morning(Uuid::new_v4())]).unwrap_err();
        match err {
            ConflictError::TimeOverlap { candidate, existing, .. } => {
                assert_eq!(candidate, "Evening");
                assert_eq!(existing, "Morning");
            }
            other => panic!("expected TimeOverlap, got {other:?}"),
        }
    }

    #[test]
    fn accepts_back_to_back_shifts() {
        // Half-open intervals: 16:00-23:00 after 08:00-16:00 is fine.
        let cand = candidate(t(16, 0), t(23, 0));
        assert_eq!(validate(&cand, true, None, &[morning(Uuid::new_v4())]), Ok(()));
    }

    #[test]
    fn rejects_identical_schedule_even_without_time_overlap_check() {
        let existing = morning(Uuid::new_v4());
        let mut cand = candidate(t(8, 0), t(16, 0));
        cand.schedule_id = existing.schedule_id;
        assert_eq!(
            validate(&cand, true, None, &[existing]),
            Err(ConflictError::DuplicateSchedule {
                schedule: "Morning".to_string(),
                date: d(2025, 1, 5),
            })
        );
    }

    #[test]
    fn excluded_duty_does_not_conflict_with_itself() {
        let duty_id = Uuid::new_v4();
        let existing = morning(duty_id);
        let mut cand = candidate(t(8, 0), t(16, 0));
        cand.schedule_id = existing.schedule_id;
        cand.exclude_duty_id = Some(duty_id);
        assert_eq!(validate(&cand, true, None, &[existing]), Ok(()));
    }

    #[test]
    fn chart_window_boundaries_are_inclusive() {
        let window = ChartWindow::new(d(2025, 1, 1), Some(d(2025, 1, 31))).unwrap();

        let mut cand = candidate(t(8, 0), t(16, 0));
        cand.date = d(2025, 1, 1);
        assert_eq!(validate(&cand, true, Some(&window), &[]), Ok(()));

        cand.date = d(2025, 1, 31);
        assert_eq!(validate(&cand, true, Some(&window), &[]), Ok(()));

        cand.date = d(2024, 12, 31);
        assert!(matches!(
            validate(&cand, true, Some(&window), &[]),
            Err(ConflictError::OutsideChartWindow { .. })
        ));

        cand.date = d(2025, 2, 1);
        assert!(matches!(
            validate(&cand, true, Some(&window), &[]),
            Err(ConflictError::OutsideChartWindow { .. })
        ));
    }

    #[test]
    fn open_ended_window_accepts_any_later_date() {
        let window = ChartWindow::new(d(2025, 1, 1), None).unwrap();
        let mut cand = candidate(t(8, 0), t(16, 0));
        cand.date = d(2030, 6, 15);
        assert_eq!(validate(&cand, true, Some(&window), &[]), Ok(()));
    }
}
