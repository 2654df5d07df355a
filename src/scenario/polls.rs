//! Poll probe
//!
//! Sends a poll to the test supergroup, waits for a human vote to come back
//! as a poll update, closes the poll, then checks the server refuses a poll
//! with a single option.

use std::time::Duration;

use tracing::info;

use super::fixture::Slot;
use super::steps::{BoxFuture, StepGroup};
use crate::bot::BotClient;
use crate::error::{ensure, ensure_eq, Error, Result};
use crate::updates::{
    Message, MessageKind, PollSnapshot, ReceiverConfig, UpdateFilter, UpdateKind, UpdateReceiver,
};

pub const GROUP_NAME: &str = "polls";

pub const QUESTION: &str = "Who shot first?";
pub const OPTIONS: [&str; 3] = ["Han Solo", "Greedo", "I don't care"];

pub const VOTE_INSTRUCTIONS: &str = "Any member of the test supergroup should vote in the poll";

pub const SINGLE_OPTION_QUESTION: &str = "You should never see this poll";
pub const SINGLE_OPTION: &str = "The only poll option";

/// Server text for a poll with fewer than two options
pub const NOT_ENOUGH_OPTIONS: &str = "Bad Request: poll must have at least 2 option";

/// Step titles, in run order
pub mod titles {
    pub const SEND_POLL: &str = "Should send a poll";
    pub const POLL_STATE_UPDATE: &str = "Should poll state update";
    pub const STOP_POLL: &str = "Should stop the poll";
    pub const NOT_ENOUGH_OPTIONS: &str =
        "Should throw exception due to not having enough poll options";
}

/// State shared between poll steps
#[derive(Debug, Clone)]
pub struct PollFixture {
    /// Message carrying the poll sent by the first step
    pub poll_message: Slot<Message>,
}

impl Default for PollFixture {
    fn default() -> Self {
        Self {
            poll_message: Slot::new("poll_message"),
        }
    }
}

/// Context the poll steps run against
#[derive(Debug)]
pub struct PollProbe {
    bot: BotClient,
    receiver: UpdateReceiver<BotClient>,
    chat_id: i64,
    fixture: PollFixture,
}

impl PollProbe {
    pub fn new(bot: BotClient, chat_id: i64, receiver: ReceiverConfig) -> Result<Self> {
        if chat_id == 0 {
            return Err(Error::config("chat id is required"));
        }
        let receiver = UpdateReceiver::new(bot.clone(), receiver)?;
        Ok(Self {
            bot,
            receiver,
            chat_id,
            fixture: PollFixture::default(),
        })
    }

    /// Drop updates queued before the run so stale votes cannot match
    pub async fn prepare(&mut self) -> Result<usize> {
        let discarded = self.receiver.discard_pending().await?;
        info!(discarded, cursor = ?self.receiver.cursor(), "skipped pending updates");
        Ok(discarded)
    }

    pub fn fixture(&self) -> &PollFixture {
        &self.fixture
    }

    pub fn vote_timeout(&self) -> Duration {
        self.receiver.config().default_timeout
    }
}

/// The poll steps in run order
pub fn poll_group() -> StepGroup<PollProbe> {
    StepGroup::new(GROUP_NAME)
        .step(titles::SEND_POLL, should_send_poll)
        .step(titles::POLL_STATE_UPDATE, should_receive_poll_update)
        .step(titles::STOP_POLL, should_stop_poll)
        .step(titles::NOT_ENOUGH_OPTIONS, should_reject_single_option)
}

fn sent_poll(message: &Message) -> Result<&PollSnapshot> {
    message
        .poll
        .as_ref()
        .ok_or_else(|| Error::Assertion("message carries no poll".to_string()))
}

fn should_send_poll(probe: &mut PollProbe) -> BoxFuture<'_, Result> {
    Box::pin(async move {
        let message = probe.bot.send_poll(probe.chat_id, QUESTION, &OPTIONS).await?;

        ensure_eq(MessageKind::Poll, message.kind(), "message kind")?;
        let poll = sent_poll(&message)?;
        ensure(!poll.id.is_empty(), "poll id should not be empty")?;
        ensure(!poll.is_closed, "new poll should be open")?;
        ensure_eq(QUESTION, poll.question.as_str(), "question")?;
        ensure_eq(OPTIONS.to_vec(), poll.option_texts(), "options")?;
        ensure(
            poll.options.iter().all(|o| o.voter_count == 0),
            "new poll should have no votes",
        )?;

        probe.fixture.poll_message.set(message);
        Ok(())
    })
}

fn should_receive_poll_update(probe: &mut PollProbe) -> BoxFuture<'_, Result> {
    Box::pin(async move {
        let poll_id = sent_poll(probe.fixture.poll_message.get()?)?.id.clone();

        probe
            .bot
            .send_test_case_notification(probe.chat_id, titles::POLL_STATE_UPDATE, VOTE_INSTRUCTIONS)
            .await?;

        let filter = UpdateFilter::from_anyone([UpdateKind::Poll])?;
        let update = probe.receiver.await_next_default(&filter).await?;
        let poll = update
            .poll
            .ok_or_else(|| Error::Assertion("poll update without a poll".to_string()))?;

        ensure_eq(poll_id.as_str(), poll.id.as_str(), "poll id")?;
        ensure(!poll.is_closed, "poll should still be open")
    })
}

fn should_stop_poll(probe: &mut PollProbe) -> BoxFuture<'_, Result> {
    Box::pin(async move {
        let message = probe.fixture.poll_message.get()?;
        let poll_id = sent_poll(message)?.id.clone();
        let (chat_id, message_id) = (message.chat.id, message.message_id);

        let poll = probe.bot.stop_poll(chat_id, message_id).await?;

        ensure_eq(poll_id.as_str(), poll.id.as_str(), "poll id")?;
        ensure(poll.is_closed, "stopped poll should be closed")
    })
}

fn should_reject_single_option(probe: &mut PollProbe) -> BoxFuture<'_, Result> {
    Box::pin(async move {
        let sent = probe
            .bot
            .send_poll(probe.chat_id, SINGLE_OPTION_QUESTION, &[SINGLE_OPTION])
            .await;

        match sent {
            Err(Error::InvalidRequest { message, .. }) => {
                ensure_eq(NOT_ENOUGH_OPTIONS, message.as_str(), "error message")
            }
            Err(other) => Err(other),
            Ok(message) => Err(Error::Assertion(format!(
                "single-option poll was accepted as message {}",
                message.message_id
            ))),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::DEFAULT_BACKOFF;

    fn bot() -> BotClient {
        BotClient::new("1:t", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_group_titles_in_order() {
        insta::assert_json_snapshot!(poll_group().titles(), @r###"
        [
          "Should send a poll",
          "Should poll state update",
          "Should stop the poll",
          "Should throw exception due to not having enough poll options"
        ]
        "###);
    }

    #[test]
    fn test_probe_requires_chat() {
        let err = PollProbe::new(bot(), 0, ReceiverConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_probe_uses_receiver_timeout() {
        let config = ReceiverConfig {
            backoff: DEFAULT_BACKOFF,
            default_timeout: Duration::from_secs(90),
        };
        let probe = PollProbe::new(bot(), -100, config).unwrap();
        assert_eq!(probe.vote_timeout(), Duration::from_secs(90));
        assert!(!probe.fixture().poll_message.is_set());
    }

    #[tokio::test]
    async fn test_dependent_steps_report_unset_fixture() {
        let mut probe = PollProbe::new(bot(), -100, ReceiverConfig::default()).unwrap();

        let err = should_receive_poll_update(&mut probe).await.unwrap_err();
        assert_eq!(err, Error::UnsetState("poll_message"));

        let err = should_stop_poll(&mut probe).await.unwrap_err();
        assert_eq!(err, Error::UnsetState("poll_message"));
    }
}
