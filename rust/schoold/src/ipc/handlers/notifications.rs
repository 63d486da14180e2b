use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn notifications_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "notifications": state.school.notifications(),
        "unreadCount": state.school.unread_count(),
    }))
}

fn notifications_mark_read(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "notificationId")?;
    state.school.mark_notification_read(&id)?;
    Ok(json!({ "unreadCount": state.school.unread_count() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "notifications.list" => notifications_list(state),
        "notifications.markRead" => notifications_mark_read(state, &req.params),
        "notifications.markAllRead" => {
            let changed = state.school.mark_all_notifications_read();
            Ok(json!({ "changed": changed, "unreadCount": 0 }))
        }
        _ => return None,
    };
    Some(respond(&req.id, result))
}
