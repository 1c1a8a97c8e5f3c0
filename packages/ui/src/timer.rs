//! Timers for the single-threaded event loop.
//!
//! `gloo_timers` on WASM, `tokio::time` on native (tests).

use futures::future::{select, Either};
use std::cell::Cell;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {0:?}")]
pub struct Elapsed(pub Duration);

/// Race `fut` against a timer. The loser is dropped, which cancels it.
pub async fn timeout<F: Future>(duration: Duration, fut: F) -> Result<F::Output, Elapsed> {
    let fut = pin!(fut);
    let timer = pin!(sleep(duration));
    match select(fut, timer).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(_) => Err(Elapsed(duration)),
    }
}

/// Coalesces bursts of events: only the last call of a burst settles `true`.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Cell<u64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Cell::new(0),
        }
    }

    /// Wait out the delay; `false` if a newer call arrived meanwhile.
    pub async fn settle(&self) -> bool {
        let ticket = self.generation.get().wrapping_add(1);
        self.generation.set(ticket);
        sleep(self.delay).await;
        self.generation.get() == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_output_when_fast() {
        let out = timeout(Duration::from_secs(1), async { 5 }).await;
        assert_eq!(out, Ok(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_elapses_on_pending_future() {
        let out = timeout(Duration::from_secs(1), futures::future::pending::<()>()).await;
        assert_eq!(out, Err(Elapsed(Duration::from_secs(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_only_last_call_settles() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let second = async {
            sleep(Duration::from_millis(30)).await;
            debouncer.settle().await
        };
        let (first, second) = futures::join!(debouncer.settle(), second);
        assert!(!first);
        assert!(second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_spaced_calls_all_settle() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        assert!(debouncer.settle().await);
        assert!(debouncer.settle().await);
    }
}
