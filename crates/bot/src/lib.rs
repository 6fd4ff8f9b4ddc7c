//! Chat transport, live-session tracking, and the enforcement loops.
//!
//! The binary in `main.rs` wires these together: a Telegram long-poll
//! feed dispatching into location ingestion and command handling, the
//! live-session sweeper, and the periodic location monitor that applies
//! automatic clock-outs.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod ingest;
pub mod live;
pub mod monitor;
pub mod notify;
pub mod scanner;
pub mod sessions;
pub mod telegram;
