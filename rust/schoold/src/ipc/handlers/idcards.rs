use crate::error::ConsoleError;
use crate::idcard;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn idcards_build(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let role_raw = get_required_str(params, "role")?;
    let role = Role::parse(&role_raw)
        .ok_or_else(|| HandlerErr::bad_params("role must be student or teacher"))?;
    let person_id = get_required_str(params, "personId")?;
    let logo = state.school.logo_image_url();

    let card = match role {
        Role::Student => state
            .school
            .student(&person_id)
            .map(|s| idcard::student_card(s, logo))
            .ok_or_else(|| ConsoleError::not_found("student", &person_id))?,
        Role::Teacher => state
            .school
            .teacher(&person_id)
            .map(|t| idcard::teacher_card(t, logo))
            .ok_or_else(|| ConsoleError::not_found("teacher", &person_id))?,
    };
    Ok(json!({ "card": card }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "idcards.build" => Some(respond(&req.id, idcards_build(state, &req.params))),
        _ => None,
    }
}
