//! Bot API
//!
//! Client for the remote bot-messaging service the probes act against.

pub mod client;
pub mod envelope;

pub use client::{notification_text, BotClient, DEFAULT_API_BASE};
