use super::handlers;
use super::types::{AppState, Reply, Request};
use crate::ipc::error::err;
use crate::jobs::Completion;

pub fn handle_request(state: &mut AppState, req: Request) -> Reply {
    tracing::debug!(id = %req.id, method = %req.method, "request");

    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::students::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::teachers::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::courses::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::notifications::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::attendance::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::scanner::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::idcards::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(resp) = handlers::export::try_handle(state, &req) {
        return Reply::Now(resp);
    }
    if let Some(reply) = handlers::assistant::try_handle(state, &req) {
        return reply;
    }

    Reply::Now(err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    ))
}

pub fn complete_job(state: &mut AppState, done: Completion) -> serde_json::Value {
    state.jobs.settle();
    handlers::assistant::complete(state, done)
}
