use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn courses_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let teacher = get_required_str(params, "teacher")?;
    let course = state.school.add_course(name, teacher);
    Ok(json!({ "course": course }))
}

fn courses_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let removed = state.school.delete_course(&course_id)?;
    tracing::info!(course = %removed.id, "course deleted, enrollments updated");
    Ok(json!({ "courseId": removed.id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "courses.list" => Ok(json!({ "courses": state.school.courses() })),
        "courses.create" => courses_create(state, &req.params),
        "courses.delete" => courses_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
