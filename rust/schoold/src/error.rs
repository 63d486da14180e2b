use serde_json::json;
use thiserror::Error;

use crate::capture::DeviceError;

/// Every failure a console operation can report. None of them is fatal and
/// none of them leaves partially applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("student {student_id} is already checked in today")]
    AlreadyActive {
        student_id: String,
        record_id: String,
    },
    #[error("student {student_id} has no open check-in today")]
    NoActiveSession { student_id: String },
    #[error("unrecognized scan payload format")]
    UnrecognizedFormat,
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(DeviceError),
    #[error("{0}")]
    ServiceFailure(String),
    #[error("{0} request already in progress")]
    Busy(&'static str),
}

impl ConsoleError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ConsoleError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConsoleError::NotFound { .. } => "not_found",
            ConsoleError::AlreadyActive { .. } => "already_active",
            ConsoleError::NoActiveSession { .. } => "no_active_session",
            ConsoleError::UnrecognizedFormat => "unrecognized_format",
            ConsoleError::DeviceUnavailable(_) => "device_unavailable",
            ConsoleError::ServiceFailure(_) => "service_failure",
            ConsoleError::Busy(_) => "busy",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ConsoleError::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            ConsoleError::AlreadyActive {
                student_id,
                record_id,
            } => Some(json!({ "studentId": student_id, "recordId": record_id })),
            ConsoleError::NoActiveSession { student_id } => {
                Some(json!({ "studentId": student_id }))
            }
            ConsoleError::DeviceUnavailable(reason) => Some(json!({
                "reason": reason,
                "message": reason.message(),
            })),
            ConsoleError::Busy(control) => Some(json!({ "control": control })),
            ConsoleError::UnrecognizedFormat | ConsoleError::ServiceFailure(_) => None,
        }
    }
}
