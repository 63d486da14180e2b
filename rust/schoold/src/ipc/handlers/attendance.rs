use crate::attendance::Resolution;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

pub fn resolution_json(r: &Resolution<'_>) -> serde_json::Value {
    json!({
        "student": r.student,
        "status": r.presence,
        "openRecord": r.open_record,
    })
}

fn attendance_lookup(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let today = state.clock.today();
    let resolution = state.school.resolve_attendance(&student_id, today)?;
    Ok(resolution_json(&resolution))
}

fn attendance_scan(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let payload = params
        .get("payload")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing payload"))?;
    let today = state.clock.today();
    let resolution = state.school.resolve_scan(payload, today)?;
    Ok(resolution_json(&resolution))
}

fn attendance_check_in(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let now = state.clock.now();
    let record = state.school.check_in(&student_id, now).map_err(|e| {
        tracing::info!(student = %student_id, error = %e, "check-in rejected");
        e
    })?;
    tracing::info!(student = %record.student_id, record = %record.id, "checked in");
    Ok(json!({ "record": record, "status": "present" }))
}

fn attendance_check_out(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let now = state.clock.now();
    let record = state.school.check_out(&student_id, now).map_err(|e| {
        tracing::info!(student = %student_id, error = %e, "check-out rejected");
        e
    })?;
    tracing::info!(student = %record.student_id, record = %record.id, "checked out");
    Ok(json!({ "record": record, "status": "absent" }))
}

fn attendance_daily_log(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let today = state.clock.today();
    let records = state.school.daily_log(today);
    Ok(json!({
        "date": today.to_string(),
        "records": records,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.lookup" => attendance_lookup(state, &req.params),
        "attendance.scan" => attendance_scan(state, &req.params),
        "attendance.checkIn" => attendance_check_in(state, &req.params),
        "attendance.checkOut" => attendance_check_out(state, &req.params),
        "attendance.dailyLog" => attendance_daily_log(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
