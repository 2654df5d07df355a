//! botprobe library
//!
//! Ordered live checks against a bot-messaging API: a Bot API client, an
//! update receiver that correlates asynchronous updates with the step
//! waiting for them, and the step groups that drive both.

pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod scenario;
pub mod updates;

pub use error::{ensure, ensure_eq, Error, Result};
