use crate::export;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn export_failed(e: anyhow::Error) -> HandlerErr {
    tracing::warn!(error = %format!("{e:#}"), "export failed");
    HandlerErr {
        code: "export_failed",
        message: format!("{e:#}"),
        details: None,
    }
}

fn export_snapshot(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let content = export::snapshot_text(&state.school).map_err(export_failed)?;
    Ok(json!({
        "fileName": export::SNAPSHOT_FILE_NAME,
        "mimeType": "application/json",
        "content": content,
    }))
}

fn export_students_csv(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let search = get_optional_str(params, "search").unwrap_or_default();
    let students = state.school.search_students(&search);
    let content = export::students_csv(&students, state.school.courses());
    Ok(json!({
        "fileName": export::STUDENTS_CSV_FILE_NAME,
        "mimeType": "text/csv;charset=utf-8",
        "rows": students.len(),
        "content": content,
    }))
}

fn export_bundle(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let search = get_optional_str(params, "search").unwrap_or_default();
    let summary =
        export::write_bundle(&state.school, &search, &out_path).map_err(export_failed)?;
    tracing::info!(path = %out_path.to_string_lossy(), entries = summary.entry_count, "export bundle written");
    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "studentRows": summary.student_rows,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "export.snapshot" => export_snapshot(state),
        "export.studentsCsv" => export_students_csv(state, &req.params),
        "export.bundle" => export_bundle(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
