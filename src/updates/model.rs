//! Update Model
//!
//! Wire types for updates, messages and poll snapshots as the Bot API
//! returns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user or bot account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique account id
    pub id: i64,
    /// Whether the account is a bot
    #[serde(default)]
    pub is_bot: bool,
    /// Display first name
    pub first_name: String,
    /// Username without the leading `@`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl User {
    /// Create a user with the given id and first name
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            is_bot: false,
            first_name: first_name.into(),
            username: None,
        }
    }

    /// Set username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Chat a message belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel"
    #[serde(rename = "type")]
    pub chat_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Chat {
    /// A supergroup chat
    pub fn supergroup(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            chat_type: "supergroup".to_string(),
            title: Some(title.into()),
            username: None,
        }
    }
}

/// Kind of poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollType {
    #[default]
    Regular,
    Quiz,
}

/// One answer option and its tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option text
    pub text: String,
    /// Number of users that voted for this option
    #[serde(default)]
    pub voter_count: u32,
}

impl PollOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voter_count: 0,
        }
    }
}

/// Point-in-time view of a poll
///
/// The id is stable across snapshots of the same poll and `is_closed`
/// only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSnapshot {
    /// Poll id, assigned by the server
    pub id: String,
    /// Poll question
    pub question: String,
    /// Options in the order they were submitted
    pub options: Vec<PollOption>,
    /// Total number of users that voted
    #[serde(default)]
    pub total_voter_count: u32,
    /// Whether the poll is closed
    #[serde(default)]
    pub is_closed: bool,
    /// Whether votes are anonymous
    #[serde(default)]
    pub is_anonymous: bool,
    /// Poll type
    #[serde(rename = "type", default)]
    pub poll_type: PollType,
    /// Whether more than one option may be chosen
    #[serde(default)]
    pub allows_multiple_answers: bool,
}

impl PollSnapshot {
    /// Create an open, anonymous regular poll with zero votes
    pub fn new<I, S>(id: impl Into<String>, question: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            question: question.into(),
            options: options.into_iter().map(PollOption::new).collect(),
            total_voter_count: 0,
            is_closed: false,
            is_anonymous: true,
            poll_type: PollType::Regular,
            allows_multiple_answers: false,
        }
    }

    /// Option texts in order
    pub fn option_texts(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.text.as_str()).collect()
    }

    /// Mark closed. Closing is terminal.
    pub fn close(&mut self) {
        self.is_closed = true;
    }
}

/// A user's vote in a non-anonymous poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Chosen option indexes. Empty when the vote was retracted.
    #[serde(default)]
    pub option_ids: Vec<u32>,
}

/// Coarse message classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Poll,
    Other,
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Id, unique inside the chat
    pub message_id: i64,
    /// Sender, absent for channel posts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Send time
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollSnapshot>,
}

impl Message {
    /// Classify the message by its payload
    pub fn kind(&self) -> MessageKind {
        if self.poll.is_some() {
            MessageKind::Poll
        } else if self.text.is_some() {
            MessageKind::Text
        } else {
            MessageKind::Other
        }
    }
}

/// Callback from an inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Kind of an update, derived from which payload it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    Poll,
    PollAnswer,
    CallbackQuery,
    /// Any payload this crate does not model
    Other,
}

impl UpdateKind {
    /// Name used in the `allowed_updates` request field
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            UpdateKind::Message => Some("message"),
            UpdateKind::EditedMessage => Some("edited_message"),
            UpdateKind::ChannelPost => Some("channel_post"),
            UpdateKind::Poll => Some("poll"),
            UpdateKind::PollAnswer => Some("poll_answer"),
            UpdateKind::CallbackQuery => Some("callback_query"),
            UpdateKind::Other => None,
        }
    }
}

/// One event fetched from the update buffer
///
/// Exactly one payload field is set for the kinds modelled here; unknown
/// payloads deserialize with every field empty and report
/// [`UpdateKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic, unique sequence id assigned by the source
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_answer: Option<PollAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    fn empty(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
            edited_message: None,
            channel_post: None,
            poll: None,
            poll_answer: None,
            callback_query: None,
        }
    }

    /// An update carrying a new message
    pub fn with_message(update_id: i64, message: Message) -> Self {
        Self {
            message: Some(message),
            ..Self::empty(update_id)
        }
    }

    /// An update carrying a poll state change
    pub fn with_poll(update_id: i64, poll: PollSnapshot) -> Self {
        Self {
            poll: Some(poll),
            ..Self::empty(update_id)
        }
    }

    /// An update carrying a poll answer
    pub fn with_poll_answer(update_id: i64, answer: PollAnswer) -> Self {
        Self {
            poll_answer: Some(answer),
            ..Self::empty(update_id)
        }
    }

    pub fn kind(&self) -> UpdateKind {
        if self.message.is_some() {
            UpdateKind::Message
        } else if self.edited_message.is_some() {
            UpdateKind::EditedMessage
        } else if self.channel_post.is_some() {
            UpdateKind::ChannelPost
        } else if self.poll.is_some() {
            UpdateKind::Poll
        } else if self.poll_answer.is_some() {
            UpdateKind::PollAnswer
        } else if self.callback_query.is_some() {
            UpdateKind::CallbackQuery
        } else {
            UpdateKind::Other
        }
    }

    /// The acting user, or `None` when the source does not say who acted
    /// (bare poll state changes, channel posts).
    pub fn originator(&self) -> Option<&User> {
        if let Some(msg) = &self.message {
            return msg.from.as_ref();
        }
        if let Some(msg) = &self.edited_message {
            return msg.from.as_ref();
        }
        if let Some(msg) = &self.channel_post {
            return msg.from.as_ref();
        }
        if let Some(answer) = &self.poll_answer {
            return answer.user.as_ref();
        }
        self.callback_query.as_ref().map(|q| &q.from)
    }
}
