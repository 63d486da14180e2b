use crate::capture::{DeviceError, Facing, FrameOutcome, ScanError};
use crate::error::ConsoleError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::attendance::resolution_json;
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

impl From<ScanError> for HandlerErr {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::NoSession => HandlerErr {
                code: "no_scan_session",
                message: "no such scanner session".to_string(),
                details: None,
            },
            ScanError::Closed(reason) => HandlerErr {
                code: "scan_session_closed",
                message: "scanner session already ended".to_string(),
                details: Some(json!({ "reason": reason })),
            },
        }
    }
}

fn scanner_open(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let facing_raw = get_optional_str(params, "facing");
    let facing = Facing::parse(facing_raw.as_deref())
        .ok_or_else(|| HandlerErr::bad_params("facing must be environment or user"))?;
    let opened = state.scanner.open(facing);
    Ok(json!({
        "sessionId": opened.session_id,
        "facing": opened.facing,
        "replacedSessionId": opened.replaced,
    }))
}

/// A decoded frame ends the session and goes straight to the resolver.
/// Resolver failures are reported inside the result since the camera has
/// already been released either way.
fn scanner_frame(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = get_required_str(params, "sessionId")?;
    let candidate = params.get("data").and_then(|v| v.as_str());
    match state.scanner.submit_frame(&session_id, candidate)? {
        FrameOutcome::Pending { frames } => Ok(json!({
            "decoded": false,
            "frames": frames,
            "releaseDevice": false,
        })),
        FrameOutcome::Decoded { data, frames } => {
            let today = state.clock.today();
            let lookup = match state.school.resolve_scan(&data, today) {
                Ok(r) => json!({ "ok": true, "resolution": resolution_json(&r) }),
                Err(e) => json!({
                    "ok": false,
                    "error": { "code": e.code(), "message": e.to_string(), "details": e.details() },
                }),
            };
            Ok(json!({
                "decoded": true,
                "frames": frames,
                "data": data,
                "releaseDevice": true,
                "lookup": lookup,
            }))
        }
    }
}

fn scanner_fail(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = get_required_str(params, "sessionId")?;
    let name = get_optional_str(params, "errorName").unwrap_or_default();
    let reason = state
        .scanner
        .fail(&session_id, DeviceError::from_dom_name(&name))?;
    let mut e = HandlerErr::from(ConsoleError::DeviceUnavailable(reason));
    if let Some(d) = e.details.as_mut() {
        d["releaseDevice"] = json!(true);
    }
    Err(e)
}

fn scanner_close(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let session_id = get_required_str(params, "sessionId")?;
    state.scanner.close(&session_id)?;
    Ok(json!({ "releaseDevice": true }))
}

fn scanner_status(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(match state.scanner.active_session() {
        Some((id, facing)) => json!({ "active": true, "sessionId": id, "facing": facing }),
        None => json!({ "active": false }),
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "scanner.open" => scanner_open(state, &req.params),
        "scanner.frame" => scanner_frame(state, &req.params),
        "scanner.fail" => scanner_fail(state, &req.params),
        "scanner.close" => scanner_close(state, &req.params),
        "scanner.status" => scanner_status(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
