//! Telegram Bot API transport: wire types, REST client, and the
//! long-polling update loop.

pub mod api;
pub mod poller;
pub mod types;

pub use api::{ChatTransport, TelegramApi, TelegramError};
