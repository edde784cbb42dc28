//! One-shot grace timer for PromptJam room actors.
//!
//! A room arms the timer when its GM connection drops and disarms it when
//! the GM reconnects in time; if the timer expires first, the room tears
//! itself down. While disarmed the timer pends forever, so it can sit
//! permanently in a `tokio::select!` loop without a dummy branch.
//!
//! # Integration
//!
//! The timer is designed to live inside a room actor's select loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = timer.expired() => { /* broadcast reset, delete room */ }
//!     }
//! }
//! ```
//!
//! All timing goes through Tokio's clock, so tests run under
//! `#[tokio::test(start_paused = true)]` and control expiry
//! deterministically.

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::debug;

/// A cancellable one-shot deadline.
///
/// State machine: idle → armed → (expired | idle). [`GraceTimer::arm`]
/// replaces any existing deadline (last writer wins, matching GM rebind
/// semantics); [`GraceTimer::disarm`] is idempotent; expiry disarms the
/// timer so it fires at most once per arming.
#[derive(Debug, Default)]
pub struct GraceTimer {
    deadline: Option<TokioInstant>,
}

impl GraceTimer {
    /// Creates a timer with no deadline set.
    pub fn idle() -> Self {
        Self { deadline: None }
    }

    /// Arms the timer to expire `grace` from now.
    ///
    /// Arming an already-armed timer replaces the pending deadline.
    pub fn arm(&mut self, grace: Duration) {
        self.deadline = Some(TokioInstant::now() + grace);
        debug!(grace_ms = grace.as_millis() as u64, "grace timer armed");
    }

    /// Clears any pending deadline. Safe to call when idle.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("grace timer disarmed");
        }
    }

    /// Whether a deadline is currently pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the armed deadline passes; pends forever while idle.
    ///
    /// Cancel-safe: dropping the future mid-wait (the usual fate of the
    /// losing `select!` branch) leaves the deadline armed, and the next
    /// call resumes waiting on the same instant. Expiry clears the
    /// deadline, so a second call after firing pends again.
    pub async fn expired(&mut self) {
        let Some(deadline) = self.deadline else {
            // Never completes; select! keeps serving other branches.
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;
        self.deadline = None;
        debug!("grace timer expired");
    }
}
