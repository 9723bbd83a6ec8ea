//! Notification dispatch for the PnL summary bot.
//!
//! - `NotificationDispatcher`: transport-agnostic "send text to a
//!   destination" seam used by the summary service
//! - `TelegramClient`: Telegram Bot API implementation (sendMessage for
//!   delivery, getUpdates long polling for inbound chat text)
//! - `MockDispatcher`: recording implementation for tests

pub mod dispatcher;
pub mod error;
pub mod telegram;

pub use dispatcher::{BoxFuture, MockDispatcher, NotificationDispatcher, SentMessage};
pub use error::{DispatchError, DispatchResult};
pub use telegram::{Chat, IncomingMessage, TelegramClient, Update};
