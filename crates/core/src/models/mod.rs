pub mod actor;
pub mod duty;
pub mod duty_chart;
pub mod schedule;
