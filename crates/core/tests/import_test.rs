use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use rosterd_core::import::{
    CommittedDuty, DateCell, EmployeeRef, HeaderLayout, ImportContext, ImportRow, OfficeRef,
    ScheduleRef, reconcile, MAX_REPORTED_ERRORS,
};
use rosterd_core::models::duty_chart::ChartWindow;
use uuid::Uuid;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

struct Fixture {
    ctx: ImportContext,
    morning_id: Uuid,
    evening_id: Uuid,
    ram_id: Uuid,
}

/// Office "North" with employees Ram (EMP001, active), Sita (EMP002, active),
/// Hari (EMP003, deactivated); schedules Morning 08:00-16:00 (office-local)
/// and Evening 16:00-23:00 (global template). Chart window covers January
/// 2025, "today" is 2025-01-01.
fn fixture() -> Fixture {
    let office_id = Uuid::new_v4();
    let morning_id = Uuid::new_v4();
    let evening_id = Uuid::new_v4();
    let ram_id = Uuid::new_v4();

    let ctx = ImportContext {
        office: OfficeRef { id: office_id, name: "North".to_string() },
        window: ChartWindow::new(d(2025, 1, 1), Some(d(2025, 1, 31))).unwrap(),
        today: d(2025, 1, 1),
        assign_any_office: false,
        employees: vec![
            EmployeeRef {
                id: ram_id,
                employee_id: "EMP001".to_string(),
                full_name: "Ram Shrestha".to_string(),
                office_id: Some(office_id),
                is_active: true,
            },
            EmployeeRef {
                id: Uuid::new_v4(),
                employee_id: "EMP002".to_string(),
                full_name: "Sita Koirala".to_string(),
                office_id: Some(office_id),
                is_active: true,
            },
            EmployeeRef {
                id: Uuid::new_v4(),
                employee_id: "EMP003".to_string(),
                full_name: "Hari Adhikari".to_string(),
                office_id: Some(office_id),
                is_active: false,
            },
        ],
        schedules: vec![
            ScheduleRef {
                id: morning_id,
                name: "Morning".to_string(),
                office_id: Some(office_id),
                start_time: t(8, 0),
                end_time: t(16, 0),
            },
            ScheduleRef {
                id: evening_id,
                name: "Evening".to_string(),
                office_id: None,
                start_time: t(16, 0),
                end_time: t(23, 0),
            },
        ],
        committed: Vec::new(),
    };

    Fixture { ctx, morning_id, evening_id, ram_id }
}

fn row(number: usize, date: &str, emp: &str, schedule: &str, start: &str, end: &str) -> ImportRow {
    ImportRow {
        row_number: number,
        date: DateCell::Text(date.to_string()),
        employee_id: emp.to_string(),
        employee_name: String::new(),
        schedule: schedule.to_string(),
        office: "North".to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

#[test]
fn clean_file_resolves_every_row() {
    let fx = fixture();
    let rows = vec![
        row(2, "2025-01-05", "EMP001", "Morning", "08:00", "16:00"),
        row(3, "2025-01-05", "EMP002", "Morning", "08:00", "16:00"),
        row(4, "2025-01-06", "EMP001", "Evening", "16:00", "23:00"),
    ];

    let report = reconcile(&fx.ctx, &rows);

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.resolved.len(), 3);
    assert_eq!(report.resolved[0].schedule_id, fx.morning_id);
    assert_eq!(report.resolved[2].schedule_id, fx.evening_id);
    assert_eq!(report.resolved[0].user_id, fx.ram_id);
}

#[test]
fn office_mismatch_rejects_row() {
    let fx = fixture();
    let mut bad = row(2, "2025-01-05", "EMP001", "Morning", "08:00", "16:00");
    bad.office = "Central".to_string();

    let report = reconcile(&fx.ctx, &[bad]);

    assert_eq!(report.resolved.len(), 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert!(report.errors[0].message.contains("Central"));
    assert!(report.errors[0].message.contains("North"));
}

#[test]
fn bs_dates_are_converted() {
    let fx = fixture();
    // BS 2081-09-17 is AD 2025-01-01.
    let rows = vec![row(2, "2081-09-17", "EMP001", "Morning", "08:00", "16:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.resolved[0].date, d(2025, 1, 1));
}

#[test]
fn native_date_cells_are_accepted() {
    let fx = fixture();
    let mut r = row(2, "", "EMP001", "Morning", "08:00", "16:00");
    r.date = DateCell::Day(d(2025, 1, 10));

    let report = reconcile(&fx.ctx, &[r]);

    assert!(report.is_clean());
    assert_eq!(report.resolved[0].date, d(2025, 1, 10));
}

#[test]
fn past_and_out_of_window_dates_reject() {
    let fx = fixture();
    let rows = vec![
        row(2, "2024-12-20", "EMP001", "Morning", "08:00", "16:00"),
        row(3, "2025-02-01", "EMP001", "Morning", "08:00", "16:00"),
        row(4, "not-a-date", "EMP001", "Morning", "08:00", "16:00"),
    ];

    let report = reconcile(&fx.ctx, &rows);

    assert_eq!(report.resolved.len(), 0);
    assert_eq!(report.errors.len(), 3);
    assert!(report.errors[0].message.contains("in the past"));
    assert!(report.errors[1].message.contains("outside the duty chart window"));
    assert!(report.errors[2].message.contains("unparseable"));
}

#[test]
fn chart_boundary_dates_are_accepted() {
    let fx = fixture();
    let rows = vec![
        row(2, "2025-01-01", "EMP001", "Morning", "08:00", "16:00"),
        row(3, "2025-01-31", "EMP002", "Morning", "08:00", "16:00"),
    ];

    let report = reconcile(&fx.ctx, &rows);
    assert!(report.is_clean());
    assert_eq!(report.resolved.len(), 2);
}

#[test]
fn combined_id_name_cell_strips_to_id() {
    let fx = fixture();
    let rows = vec![row(2, "2025-01-05", "EMP001 - Ram Shrestha", "Morning", "08:00", "16:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert!(report.is_clean());
    assert_eq!(report.resolved[0].user_id, fx.ram_id);
}

#[test]
fn falls_back_to_full_name_resolution() {
    let fx = fixture();
    let mut r = row(2, "2025-01-05", "", "Morning", "08:00", "16:00");
    r.employee_name = "Ram Shrestha".to_string();

    let report = reconcile(&fx.ctx, &[r]);

    assert!(report.is_clean());
    assert_eq!(report.resolved[0].user_id, fx.ram_id);
}

#[test]
fn unknown_employee_rejects_row() {
    let fx = fixture();
    let rows = vec![row(2, "2025-01-05", "EMP999", "Morning", "08:00", "16:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("EMP999"));
}

#[test]
fn deactivated_employee_is_skipped_not_rejected() {
    let fx = fixture();
    let rows = vec![
        row(2, "2025-01-05", "EMP003", "Morning", "08:00", "16:00"),
        row(3, "2025-01-05", "EMP001", "Morning", "08:00", "16:00"),
    ];

    let report = reconcile(&fx.ctx, &rows);

    assert!(report.is_clean());
    assert_eq!(report.skipped_inactive, 1);
    assert_eq!(report.resolved.len(), 1);
}

#[test]
fn foreign_office_employee_rejects_without_blanket_permission() {
    let mut fx = fixture();
    fx.ctx.employees[0].office_id = Some(Uuid::new_v4());
    let rows = vec![row(2, "2025-01-05", "EMP001", "Morning", "08:00", "16:00")];

    let report = reconcile(&fx.ctx, &rows);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("does not belong"));

    fx.ctx.assign_any_office = true;
    let report = reconcile(&fx.ctx, &rows);
    assert!(report.is_clean());
}

#[test]
fn declared_time_mismatch_rejects_row() {
    let fx = fixture();
    let rows = vec![row(2, "2025-01-05", "EMP001", "Morning", "08:30", "16:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("do not match schedule 'Morning'"));
}

#[test]
fn seconds_precision_times_still_match() {
    let fx = fixture();
    let rows = vec![row(2, "2025-01-05", "EMP001", "Morning", "08:00:00", "16:00:00")];

    let report = reconcile(&fx.ctx, &rows);
    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
}

#[test]
fn unknown_schedule_rejects_row() {
    let fx = fixture();
    let rows = vec![row(2, "2025-01-05", "EMP001", "Graveyard", "00:00", "08:00")];

    let report = reconcile(&fx.ctx, &rows);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("Graveyard"));
}

#[test]
fn duplicate_within_file_rejects_second_occurrence() {
    let fx = fixture();
    let rows = vec![
        row(2, "2025-01-05", "EMP001", "Morning", "08:00", "16:00"),
        row(3, "2025-01-05", "EMP001", "Morning", "08:00", "16:00"),
    ];

    let report = reconcile(&fx.ctx, &rows);

    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert!(report.errors[0].message.contains("duplicate shift assignment"));
}

#[test]
fn duplicate_against_committed_state_rejects() {
    let mut fx = fixture();
    fx.ctx.committed.push(CommittedDuty {
        user_id: fx.ram_id,
        date: d(2025, 1, 5),
        schedule_id: fx.morning_id,
        schedule_name: "Morning".to_string(),
        start_time: t(8, 0),
        end_time: t(16, 0),
    });
    let rows = vec![row(2, "2025-01-05", "EMP001", "Morning", "08:00", "16:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("duplicate shift assignment"));
}

#[test]
fn overlap_against_committed_state_rejects() {
    let mut fx = fixture();
    // Committed Day shift 12:00-20:00 overlaps the Evening template.
    fx.ctx.committed.push(CommittedDuty {
        user_id: fx.ram_id,
        date: d(2025, 1, 5),
        schedule_id: Uuid::new_v4(),
        schedule_name: "Day".to_string(),
        start_time: t(12, 0),
        end_time: t(20, 0),
    });
    let rows = vec![row(2, "2025-01-05", "EMP001", "Evening", "16:00", "23:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("time overlap"));
    assert!(report.errors[0].message.contains("Day"));
}

#[test]
fn error_reporting_caps_at_limit() {
    let fx = fixture();
    let rows: Vec<ImportRow> = (0..MAX_REPORTED_ERRORS + 10)
        .map(|i| row(i + 2, "2025-01-05", "EMP999", "Morning", "08:00", "16:00"))
        .collect();

    let report = reconcile(&fx.ctx, &rows);
    assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
}

#[test]
fn blank_rows_are_ignored() {
    let fx = fixture();
    let blank = row(2, "2025-01-05", "", "Morning", "08:00", "16:00");
    let report = reconcile(&fx.ctx, &[blank]);

    assert!(report.is_clean());
    assert_eq!(report.resolved.len(), 0);
}

#[test]
fn office_local_schedule_shadows_global_of_same_name() {
    let mut fx = fixture();
    // A local "Evening" with different hours takes precedence over the
    // global template.
    let local_evening = Uuid::new_v4();
    fx.ctx.schedules.push(ScheduleRef {
        id: local_evening,
        name: "Evening".to_string(),
        office_id: Some(fx.ctx.office.id),
        start_time: t(15, 0),
        end_time: t(22, 0),
    });
    let rows = vec![row(2, "2025-01-05", "EMP001", "Evening", "15:00", "22:00")];

    let report = reconcile(&fx.ctx, &rows);

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.resolved[0].schedule_id, local_evening);
}

#[test]
fn header_layout_accepts_any_column_order_and_bs_label() {
    let headers: Vec<String> = [
        "Office",
        "Schedule",
        "Date (BS)",
        "Employee Name",
        "Employee ID",
        "End Time",
        "Start Time",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let layout = HeaderLayout::resolve(&headers).unwrap();
    assert_eq!(layout.date, 2);
    assert_eq!(layout.employee_id, 4);
    assert_eq!(layout.office, 0);
}

#[test]
fn header_layout_reports_missing_columns() {
    let headers: Vec<String> =
        ["Date", "Employee ID", "Schedule"].iter().map(|s| s.to_string()).collect();

    let err = HeaderLayout::resolve(&headers).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Missing columns"));
    assert!(msg.contains("Employee Name"));
    assert!(msg.contains("Office"));
    assert!(msg.contains("Start Time"));
    assert!(msg.contains("End Time"));
}
