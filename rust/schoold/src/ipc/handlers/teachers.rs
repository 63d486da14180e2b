use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_nullable_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn teachers_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let subject = get_required_str(params, "subject")?;
    let teacher = state.school.add_teacher(name, subject);
    Ok(json!({ "teacher": teacher }))
}

fn teachers_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    let name = get_required_str(params, "name")?;
    let subject = get_required_str(params, "subject")?;
    let teacher = state.school.update_teacher(&teacher_id, name, subject)?;
    Ok(json!({ "teacher": teacher }))
}

fn teachers_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    let removed = state.school.delete_teacher(&teacher_id)?;
    Ok(json!({ "teacherId": removed.id }))
}

fn teachers_set_photo(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    let url = get_nullable_str(params, "url")?;
    state.school.set_teacher_picture(&teacher_id, url)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "teachers.list" => Ok(json!({ "teachers": state.school.teachers() })),
        "teachers.create" => teachers_create(state, &req.params),
        "teachers.update" => teachers_update(state, &req.params),
        "teachers.delete" => teachers_delete(state, &req.params),
        "teachers.setPhoto" => teachers_set_photo(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
