use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::thread;

use crate::assistant::Control;

/// Everything the request loop reacts to. Only the loop touches `AppState`.
pub enum Event {
    Line(String),
    InputClosed,
    Completed(Completion),
}

pub struct Completion {
    pub request_id: String,
    pub control: Control,
    pub output: anyhow::Result<String>,
}

/// Runs blocking service calls on worker threads and posts the result back
/// to the loop as an `Event::Completed`.
pub struct Jobs {
    tx: Sender<Event>,
    pending: usize,
}

impl Jobs {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx, pending: 0 }
    }

    pub fn spawn<F>(&mut self, request_id: String, control: Control, work: F)
    where
        F: FnOnce() -> anyhow::Result<String> + Send + 'static,
    {
        self.pending += 1;
        let tx = self.tx.clone();
        thread::spawn(move || {
            // A panicking call still has to post a completion, or the control
            // stays busy and the loop never drains.
            let output = panic::catch_unwind(AssertUnwindSafe(work))
                .unwrap_or_else(|_| Err(anyhow::anyhow!("{} worker panicked", control.name())));
            let _ = tx.send(Event::Completed(Completion {
                request_id,
                control,
                output,
            }));
        });
    }

    pub fn settle(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn panicking_work_still_completes() {
        let (tx, rx) = mpsc::channel();
        let mut jobs = Jobs::new(tx);
        jobs.spawn("r1".to_string(), Control::Logo, || panic!("decoder blew up"));
        assert_eq!(jobs.pending(), 1);

        let event = rx.recv_timeout(Duration::from_secs(5)).expect("completion");
        let Event::Completed(done) = event else {
            panic!("expected a completion");
        };
        assert_eq!(done.request_id, "r1");
        assert_eq!(done.control, Control::Logo);
        assert!(done.output.is_err());
        jobs.settle();
        assert_eq!(jobs.pending(), 0);
    }

    #[test]
    fn successful_work_is_posted_back() {
        let (tx, rx) = mpsc::channel();
        let mut jobs = Jobs::new(tx);
        jobs.spawn("r2".to_string(), Control::Chat, || Ok("hola".to_string()));
        let Ok(Event::Completed(done)) = rx.recv_timeout(Duration::from_secs(5)) else {
            panic!("expected a completion");
        };
        assert_eq!(done.output.expect("ok output"), "hola");
    }
}
