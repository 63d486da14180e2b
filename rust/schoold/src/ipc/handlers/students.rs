use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_nullable_str, get_optional_str, get_required_str, get_required_u32, get_str_list,
};
use crate::ipc::types::{AppState, Request};
use crate::store::NewStudent;
use serde_json::json;

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let search = get_optional_str(params, "search").unwrap_or_default();
    let students = state.school.search_students(&search);
    Ok(json!({
        "students": students,
        "total": state.school.students().len(),
    }))
}

fn students_create(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let new = NewStudent {
        id: get_required_str(params, "id")?,
        name: get_required_str(params, "name")?,
        age: get_required_u32(params, "age")?,
        grade: get_required_str(params, "grade")?,
    };
    let student = state.school.add_student(new);
    tracing::info!(student = %student.id, "student added");
    Ok(json!({ "student": student }))
}

fn students_delete(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let removed = state.school.delete_student(&student_id)?;
    tracing::info!(student = %removed.id, "student deleted");
    Ok(json!({ "studentId": removed.id }))
}

fn students_set_photo(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let url = get_nullable_str(params, "url")?;
    state.school.set_student_picture(&student_id, url)?;
    Ok(json!({ "ok": true }))
}

fn students_assign_courses(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_ids = get_str_list(params, "courseIds")?;
    let student = state.school.assign_courses(&student_id, course_ids)?;
    Ok(json!({ "studentId": student.id, "courseIds": student.course_ids }))
}

fn students_add_history(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    let added = state.school.add_course_to_history(&student_id, &course_id)?;
    let history = state
        .school
        .student(&student_id)
        .map(|s| s.course_history.clone())
        .unwrap_or_default();
    Ok(json!({ "added": added, "courseHistory": history }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        "students.setPhoto" => students_set_photo(state, &req.params),
        "students.assignCourses" => students_assign_courses(state, &req.params),
        "students.addHistory" => students_add_history(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
