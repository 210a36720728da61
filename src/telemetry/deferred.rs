/*!
 * Deferred Results
 * A command's outcome, released to the caller once its simulated duration elapses
 *
 * The state change behind the outcome has already happened when the handle is
 * created; awaiting only delays the notification. Dropping the handle
 * discards the notification and nothing else.
 */

use futures::future::BoxFuture;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a command, available at `deadline`
#[must_use = "a deferred result does nothing unless awaited"]
#[derive(Debug)]
pub struct Deferred<T> {
    value: T,
    deadline: Instant,
}

impl<T> Deferred<T> {
    pub fn new(value: T, delay: Duration) -> Self {
        Self {
            value,
            deadline: Instant::now() + delay,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the outcome is released
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_ready(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Transform the outcome, keeping the deadline
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Deferred<U> {
        Deferred {
            value: f(self.value),
            deadline: self.deadline,
        }
    }

    /// Wait for the deadline and take the outcome
    pub async fn wait(self) -> T {
        tokio::time::sleep_until(self.deadline).await;
        self.value
    }
}

impl<T: Send + 'static> IntoFuture for Deferred<T> {
    type Output = T;
    type IntoFuture = BoxFuture<'static, T>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
