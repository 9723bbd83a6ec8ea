//! Dispatcher trait for delivering summaries.
//!
//! Provides a trait-based abstraction over the chat transport, so the
//! summary service can be exercised without network access.

use crate::error::{DispatchError, DispatchResult};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Delivers formatted text to a destination channel.
pub trait NotificationDispatcher: Send + Sync {
    /// Send `text` to `destination` (a chat id for Telegram).
    ///
    /// Timeouts are the implementation's concern.
    fn send<'a>(&'a self, destination: &'a str, text: &'a str) -> BoxFuture<'a, DispatchResult<()>>;
}

/// Message captured by [`MockDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: String,
    pub text: String,
}

/// Recording dispatcher for tests.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    sends: Mutex<Vec<SentMessage>>,
    /// When set, every send fails with this reason.
    failure: Mutex<Option<String>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (`Some`) or succeed (`None`).
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.lock() = reason.map(str::to_string);
    }

    /// Messages delivered so far (failed attempts are not recorded).
    pub fn get_sends(&self) -> Vec<SentMessage> {
        self.sends.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }
}

impl NotificationDispatcher for MockDispatcher {
    fn send<'a>(&'a self, destination: &'a str, text: &'a str) -> BoxFuture<'a, DispatchResult<()>> {
        Box::pin(async move {
            if let Some(reason) = self.failure.lock().clone() {
                return Err(DispatchError::Rejected(reason));
            }
            self.sends.lock().push(SentMessage {
                destination: destination.to_string(),
                text: text.to_string(),
            });
            Ok(())
        })
    }
}
