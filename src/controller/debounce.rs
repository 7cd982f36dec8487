use std::time::Duration;

use tokio::time::{sleep_until, Instant};

pub const USERNAME_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds back a changing value until it has been stable for `window`.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Debouncer { window, pending: None }
    }

    /// Replace whatever is waiting and restart the window.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.window));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves with the latest value once its window has elapsed; never
    /// resolves while nothing is waiting. Cancel safe: dropping the future
    /// before it resolves leaves the pending value in place.
    pub async fn settled(&mut self) -> T {
        loop {
            let Some((_, deadline)) = self.pending.as_ref() else {
                return std::future::pending().await;
            };
            sleep_until(*deadline).await;

            if let Some((value, _)) = self.pending.take() {
                return value;
            }
        }
    }
}
