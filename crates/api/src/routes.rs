pub mod duty;
pub mod duty_chart;
pub mod health;
pub mod schedule;
