//! KeypadService: the single task that owns the key handler.
//!
//! # Why one task? (for beginners)
//!
//! The gesture engine mutates its state both when a key event arrives and
//! when one of its timers expires.  Instead of guarding that state with a
//! lock, exactly one tokio task owns the [`KeyHandler`] and does both jobs:
//!
//! ```text
//!            ┌──────────────── KeypadService task ────────────────┐
//! handle() ─►│ mpsc request ──► KeyHandler::handle ──► oneshot ───┼─► Option<RawKeyEvent>
//!            │ sleep_until(next deadline) ──► fire_due_timers     │
//!            └────────────────────────────────────────────────────┘
//! ```
//!
//! Requests and timer expiries are therefore strictly serialized, and the
//! task sleeps exactly until the next deadline when nothing else happens.

use std::time::Instant as StdInstant;

use keypad_core::RawKeyEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::application::handler::KeyHandler;

/// Capacity of the request channel.
const REQUEST_QUEUE_DEPTH: usize = 64;

struct Request {
    event: RawKeyEvent,
    reply: oneshot::Sender<Option<RawKeyEvent>>,
}

/// Cloneable handle to the dispatch task.
///
/// The task stops once every handle has been dropped.
#[derive(Clone)]
pub struct KeypadService {
    requests: mpsc::Sender<Request>,
}

impl KeypadService {
    /// Spawns the dispatch task on the current tokio runtime.
    pub fn spawn(handler: KeyHandler) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        let task = tokio::spawn(run(handler, rx));
        (Self { requests: tx }, task)
    }

    /// Filters one raw event.
    ///
    /// Returns `None` when the event was consumed.  If the dispatch task is
    /// gone the event is passed through unchanged, so callers always get a
    /// value back.
    pub async fn handle(&self, event: RawKeyEvent) -> Option<RawKeyEvent> {
        let (reply, response) = oneshot::channel();
        let request = Request {
            event: event.clone(),
            reply,
        };
        if self.requests.send(request).await.is_err() {
            warn!("keypad service stopped, passing event through");
            return Some(event);
        }
        match response.await {
            Ok(result) => result,
            Err(_) => {
                warn!("keypad service dropped request, passing event through");
                Some(event)
            }
        }
    }
}

async fn run(mut handler: KeyHandler, mut requests: mpsc::Receiver<Request>) {
    debug!("keypad dispatch task started");
    loop {
        let deadline = handler.next_deadline();
        tokio::select! {
            request = requests.recv() => {
                let Some(Request { event, reply }) = request else {
                    break;
                };
                let result = handler.handle(now(), event);
                // The caller may have given up waiting; nothing to do then.
                let _ = reply.send(result);
            }
            _ = wait_for(deadline) => {
                handler.fire_due_timers(now());
            }
        }
    }
    debug!("keypad dispatch task stopped");
}

fn now() -> StdInstant {
    Instant::now().into_std()
}

async fn wait_for(deadline: Option<StdInstant>) {
    match deadline {
        Some(deadline) => sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
