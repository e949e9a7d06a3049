//! Rotation planner: expands a repeating shift pattern over a date range.
//! Pure — the transactional application of the plan lives in the db crate
//! and routes every step through the conflict validator.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::errors::{RosterError, RosterResult};

/// One planned day of a rotation: `pattern[i mod len]` for day index `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationStep {
    pub date: NaiveDate,
    pub schedule_id: Uuid,
}

pub fn expand_pattern(
    start_date: NaiveDate,
    end_date: NaiveDate,
    pattern: &[Uuid],
) -> RosterResult<Vec<RotationStep>> {
    if pattern.is_empty() {
        return Err(RosterError::Validation(
            "Rotation pattern must contain at least one schedule".to_string(),
        ));
    }
    if end_date < start_date {
        return Err(RosterError::Validation(
            "end_date must be on or after start_date".to_string(),
        ));
    }

    let days = (end_date - start_date).num_days() as usize + 1;
    let steps = (0..days)
        .map(|i| RotationStep {
            date: start_date + Duration::days(i as i64),
            schedule_id: pattern[i % pattern.len()],
        })
        .collect();

    Ok(steps)
}
