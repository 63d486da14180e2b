use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "scannerActive": state.scanner.active_session().is_some(),
            "pendingJobs": state.jobs.pending(),
            "attendanceRecords": state.school.attendance().len(),
        }),
    )
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let summary = state.school.summary();
    let today = state.clock.today();
    ok(
        &req.id,
        json!({
            "studentCount": summary.students,
            "teacherCount": summary.teachers,
            "courseCount": summary.courses,
            "unreadNotifications": summary.unread_notifications,
            "presentToday": state.school.present_today(today),
            "today": today.to_string(),
            "logoImageUrl": state.school.logo_image_url(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        _ => None,
    }
}
