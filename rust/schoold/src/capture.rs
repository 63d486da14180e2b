use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Why the UI could not hand us camera frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceError {
    PermissionDenied,
    NoCamera,
    Busy,
    InsecureContext,
    Unsupported,
    Other,
}

impl DeviceError {
    /// Maps the DOMException name reported by `getUserMedia`.
    pub fn from_dom_name(name: &str) -> DeviceError {
        match name.trim() {
            "NotAllowedError" | "PermissionDeniedError" => DeviceError::PermissionDenied,
            "NotFoundError" | "OverconstrainedError" => DeviceError::NoCamera,
            "NotReadableError" | "TrackStartError" => DeviceError::Busy,
            "SecurityError" | "TypeError" => DeviceError::InsecureContext,
            "NotSupportedError" | "Unsupported" => DeviceError::Unsupported,
            _ => DeviceError::Other,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DeviceError::PermissionDenied => {
                "Camera access was denied. Enable the camera permission in the browser settings."
            }
            DeviceError::NoCamera => "No camera was found. Make sure a camera is connected.",
            DeviceError::Busy => {
                "The camera cannot be read. Another application may be using it."
            }
            DeviceError::InsecureContext => {
                "Camera access is blocked. This feature only works over a secure (HTTPS) connection."
            }
            DeviceError::Unsupported => "This browser does not support camera capture.",
            DeviceError::Other => "Could not access the camera. Check the browser permissions.",
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Environment,
    User,
}

impl Facing {
    pub fn parse(s: Option<&str>) -> Option<Facing> {
        match s {
            None | Some("environment") => Some(Facing::Environment),
            Some("user") => Some(Facing::User),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    Decoded,
    Cancelled,
    DeviceError,
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    NoSession,
    /// Frames after a session ended never reach the decoder.
    Closed(CloseReason),
}

/// Held while the UI has camera tracks running for a session. Dropping it
/// counts as a release.
#[derive(Debug)]
struct DeviceLease {
    session_id: String,
    released: bool,
}

impl DeviceLease {
    fn release(&mut self, reason: CloseReason) {
        if !self.released {
            self.released = true;
            tracing::info!(session = %self.session_id, ?reason, "camera released");
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.release(CloseReason::Cancelled);
    }
}

#[derive(Debug)]
struct ScanSession {
    id: String,
    facing: Facing,
    frames: u64,
    lease: DeviceLease,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Pending { frames: u64 },
    Decoded { data: String, frames: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub session_id: String,
    pub facing: Facing,
    pub replaced: Option<String>,
}

/// Lifecycle of the QR scanner view. At most one session runs at a time; a
/// session ends on decode, close, device error or replacement, and each of
/// those releases the camera exactly once.
/// How many ended sessions keep their close reason. Older ids fall back to
/// `ScanError::NoSession`.
const ENDED_SESSIONS_KEPT: usize = 16;

#[derive(Debug, Default)]
pub struct Scanner {
    active: Option<ScanSession>,
    ended: VecDeque<(String, CloseReason)>,
}

impl Scanner {
    pub fn open(&mut self, facing: Facing) -> Opened {
        let replaced = self.finish(CloseReason::Replaced);
        let id = Uuid::new_v4().to_string();
        tracing::info!(session = %id, ?facing, "scanner opened");
        self.active = Some(ScanSession {
            id: id.clone(),
            facing,
            frames: 0,
            lease: DeviceLease {
                session_id: id.clone(),
                released: false,
            },
        });
        Opened {
            session_id: id,
            facing,
            replaced,
        }
    }

    /// `candidate` is the decoder's result for one frame; `None` means no
    /// code was found in it.
    pub fn submit_frame(
        &mut self,
        session_id: &str,
        candidate: Option<&str>,
    ) -> Result<FrameOutcome, ScanError> {
        let session = self.session_mut(session_id)?;
        session.frames += 1;
        let frames = session.frames;
        match candidate.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(FrameOutcome::Pending { frames }),
            Some(data) => {
                let data = data.to_string();
                self.finish(CloseReason::Decoded);
                Ok(FrameOutcome::Decoded { data, frames })
            }
        }
    }

    pub fn fail(&mut self, session_id: &str, error: DeviceError) -> Result<DeviceError, ScanError> {
        self.session_mut(session_id)?;
        tracing::warn!(session = %session_id, ?error, "camera unavailable");
        self.finish(CloseReason::DeviceError);
        Ok(error)
    }

    pub fn close(&mut self, session_id: &str) -> Result<(), ScanError> {
        self.session_mut(session_id)?;
        self.finish(CloseReason::Cancelled);
        Ok(())
    }

    pub fn active_session(&self) -> Option<(&str, Facing)> {
        self.active.as_ref().map(|s| (s.id.as_str(), s.facing))
    }

    fn session_mut(&mut self, session_id: &str) -> Result<&mut ScanSession, ScanError> {
        match self.active.as_mut() {
            Some(s) if s.id == session_id => Ok(s),
            _ => match self.ended.iter().rev().find(|(id, _)| id == session_id) {
                Some((_, reason)) => Err(ScanError::Closed(*reason)),
                None => Err(ScanError::NoSession),
            },
        }
    }

    fn finish(&mut self, reason: CloseReason) -> Option<String> {
        let mut session = self.active.take()?;
        session.lease.release(reason);
        if self.ended.len() == ENDED_SESSIONS_KEPT {
            self.ended.pop_front();
        }
        self.ended.push_back((session.id.clone(), reason));
        Some(session.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ends_session_and_rejects_later_frames() {
        let mut scanner = Scanner::default();
        let opened = scanner.open(Facing::Environment);
        let sid = opened.session_id;

        assert_eq!(
            scanner.submit_frame(&sid, None),
            Ok(FrameOutcome::Pending { frames: 1 })
        );
        assert_eq!(
            scanner.submit_frame(&sid, Some("78945612")),
            Ok(FrameOutcome::Decoded {
                data: "78945612".to_string(),
                frames: 2
            })
        );
        assert!(scanner.active_session().is_none());
        assert_eq!(
            scanner.submit_frame(&sid, Some("78945612")),
            Err(ScanError::Closed(CloseReason::Decoded))
        );
    }

    #[test]
    fn every_exit_path_releases_the_lease() {
        let mut scanner = Scanner::default();

        let a = scanner.open(Facing::Environment).session_id;
        scanner.close(&a).expect("close");
        assert_eq!(scanner.close(&a), Err(ScanError::Closed(CloseReason::Cancelled)));

        let b = scanner.open(Facing::User).session_id;
        assert_eq!(
            scanner.fail(&b, DeviceError::from_dom_name("NotAllowedError")),
            Ok(DeviceError::PermissionDenied)
        );
        assert_eq!(
            scanner.submit_frame(&b, None),
            Err(ScanError::Closed(CloseReason::DeviceError))
        );

        let c = scanner.open(Facing::Environment).session_id;
        let d = scanner.open(Facing::Environment);
        assert_eq!(d.replaced.as_deref(), Some(c.as_str()));
        assert_eq!(
            scanner.submit_frame(&c, None),
            Err(ScanError::Closed(CloseReason::Replaced))
        );
        assert!(scanner.active_session().is_some());
        assert!(scanner.ended.iter().all(|(id, _)| id != &d.session_id));
    }

    #[test]
    fn ended_history_is_bounded() {
        let mut scanner = Scanner::default();
        let first = scanner.open(Facing::Environment).session_id;
        scanner.close(&first).expect("close");
        for _ in 0..ENDED_SESSIONS_KEPT {
            let id = scanner.open(Facing::Environment).session_id;
            scanner.close(&id).expect("close");
        }
        assert_eq!(scanner.ended.len(), ENDED_SESSIONS_KEPT);
        assert_eq!(scanner.close(&first), Err(ScanError::NoSession));
    }

    #[test]
    fn unknown_session_is_reported() {
        let mut scanner = Scanner::default();
        assert_eq!(scanner.close("nope"), Err(ScanError::NoSession));
        assert_eq!(scanner.submit_frame("nope", None), Err(ScanError::NoSession));
    }

    #[test]
    fn dom_error_names_map_to_reasons() {
        assert_eq!(DeviceError::from_dom_name("NotFoundError"), DeviceError::NoCamera);
        assert_eq!(DeviceError::from_dom_name("NotReadableError"), DeviceError::Busy);
        assert_eq!(
            DeviceError::from_dom_name("SecurityError"),
            DeviceError::InsecureContext
        );
        assert_eq!(DeviceError::from_dom_name("AbortError"), DeviceError::Other);
    }
}
