//! Update Correlation
//!
//! Waits on a remote, unordered, possibly noisy update stream and picks out
//! the next update relevant to the current step.

pub mod filter;
pub mod model;
pub mod receiver;
pub mod source;

pub use filter::{Identity, Originators, UpdateFilter};
pub use model::{
    CallbackQuery, Chat, Message, MessageKind, PollAnswer, PollOption, PollSnapshot, PollType,
    Update, UpdateKind, User,
};
pub use receiver::{ReceiverConfig, UpdateReceiver, DEFAULT_BACKOFF, DEFAULT_UPDATE_TIMEOUT};
pub use source::EventSource;
