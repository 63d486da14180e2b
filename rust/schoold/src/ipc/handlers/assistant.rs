use crate::assistant::{self, Control};
use crate::error::ConsoleError;
use crate::ipc::error::{err, ok, respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Reply, Request};
use crate::jobs::Completion;
use crate::model::Sender;
use serde_json::json;

fn start(state: &mut AppState, req: &Request, control: Control, prompt: String) -> Reply {
    if let Err(e) = state.assistant.begin(control) {
        return Reply::Now(HandlerErr::from(e).response(&req.id));
    }
    let service = state.assistant.service();
    tracing::debug!(control = control.name(), "assistant request started");
    state.jobs.spawn(req.id.clone(), control, move || match control {
        Control::Logo => service.generate_image(&prompt),
        Control::Chat | Control::Tasks => service.generate_text(&prompt),
    });
    Reply::Deferred
}

fn handle_send(state: &mut AppState, req: &Request) -> Reply {
    let text = match get_required_str(&req.params, "text") {
        Ok(t) => t,
        Err(e) => return Reply::Now(e.response(&req.id)),
    };
    if state.assistant.is_busy(Control::Chat) {
        return Reply::Now(HandlerErr::from(ConsoleError::Busy(Control::Chat.name())).response(&req.id));
    }
    state.assistant.push(Sender::User, text.clone());
    start(state, req, Control::Chat, text)
}

fn handle_tasks(state: &mut AppState, req: &Request) -> Reply {
    match get_required_str(&req.params, "topic") {
        Ok(topic) => start(state, req, Control::Tasks, assistant::task_prompt(&topic)),
        Err(e) => Reply::Now(e.response(&req.id)),
    }
}

fn handle_logo(state: &mut AppState, req: &Request) -> Reply {
    start(state, req, Control::Logo, assistant::LOGO_PROMPT.to_string())
}

/// Applies a finished service call to the state and builds the deferred
/// response for its request.
pub fn complete(state: &mut AppState, done: Completion) -> serde_json::Value {
    state.assistant.finish(done.control);
    match done.control {
        Control::Chat => {
            let text = assistant::text_or_fallback(done.output);
            let message = state.assistant.push(Sender::Ai, text);
            ok(&done.request_id, json!({ "message": message }))
        }
        Control::Tasks => {
            let text = assistant::text_or_fallback(done.output);
            ok(&done.request_id, json!({ "text": text }))
        }
        Control::Logo => match assistant::image_or_error(done.output) {
            Ok(url) => {
                state.school.set_logo_image_url(url);
                ok(
                    &done.request_id,
                    json!({ "logoImageUrl": state.school.logo_image_url() }),
                )
            }
            Err(e) => err(&done.request_id, e.code(), e.to_string(), e.details()),
        },
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Reply> {
    match req.method.as_str() {
        "assistant.transcript" => Some(Reply::Now(respond(
            &req.id,
            Ok(json!({
                "messages": state.assistant.transcript(),
                "busy": {
                    "chat": state.assistant.is_busy(Control::Chat),
                    "tasks": state.assistant.is_busy(Control::Tasks),
                    "logo": state.assistant.is_busy(Control::Logo),
                },
            })),
        ))),
        "assistant.send" => Some(handle_send(state, req)),
        "assistant.tasks" => Some(handle_tasks(state, req)),
        "assistant.logo" => Some(handle_logo(state, req)),
        _ => None,
    }
}
