mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::{complete_job, handle_request};
pub use types::{AppState, Reply, Request};
