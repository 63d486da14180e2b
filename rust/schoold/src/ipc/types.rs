use std::sync::Arc;

use serde::Deserialize;

use crate::assistant::{Assistant, GenerativeService};
use crate::attendance::{Clock, SystemClock};
use crate::capture::Scanner;
use crate::config::Config;
use crate::jobs::Jobs;
use crate::store::School;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Assistant calls answer later, from a worker completion.
pub enum Reply {
    Now(serde_json::Value),
    Deferred,
}

pub struct AppState {
    pub school: School,
    pub scanner: Scanner,
    pub assistant: Assistant,
    pub clock: Box<dyn Clock>,
    pub jobs: Jobs,
}

impl AppState {
    pub fn new(config: &Config, service: Arc<dyn GenerativeService>, jobs: Jobs) -> Self {
        let school = if config.seed_demo {
            School::seeded()
        } else {
            School::default()
        };
        Self {
            school,
            scanner: Scanner::default(),
            assistant: Assistant::new(service),
            clock: Box::new(SystemClock),
            jobs,
        }
    }
}
