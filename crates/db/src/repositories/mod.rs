pub mod authz;
pub mod directory;
pub mod duty;
pub mod duty_chart;
pub mod import;
pub mod schedule;
