//! Update Receiver
//!
//! Waits on an [`EventSource`] for the next update matching a filter.
//!
//! The receiver owns a cursor: the highest update id it has consumed. Every
//! fetched update moves the cursor forward whether or not it matched, so an
//! unrelated update (a chat message sent while waiting for a vote) is never
//! re-examined by a later wait.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::filter::UpdateFilter;
use super::model::Update;
use super::source::EventSource;
use crate::error::{Error, Result};

/// Default pause between fetches that returned nothing relevant
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Default overall wait for a matching update
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Receiver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Pause between fetches. The last pause before the deadline is shortened.
    pub backoff: Duration,
    /// Wait used by [`UpdateReceiver::await_next_default`]
    pub default_timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            default_timeout: DEFAULT_UPDATE_TIMEOUT,
        }
    }
}

impl ReceiverConfig {
    pub fn validate(&self) -> Result {
        if self.backoff.is_zero() {
            return Err(Error::config("receiver backoff must be non-zero"));
        }
        if self.default_timeout.is_zero() {
            return Err(Error::config("receiver default timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Cursor-tracking poller over an [`EventSource`]
#[derive(Debug)]
pub struct UpdateReceiver<S> {
    source: S,
    cursor: Option<i64>,
    config: ReceiverConfig,
}

impl<S: EventSource> UpdateReceiver<S> {
    /// Create a receiver with no cursor. Fails on an invalid config.
    pub fn new(source: S, config: ReceiverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            cursor: None,
            config,
        })
    }

    /// Highest update id consumed so far
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Skip everything the source currently buffers.
    ///
    /// Sources hand out bounded pages, so this keeps fetching until a batch
    /// comes back empty or moves the cursor no further. Returns the number of
    /// updates discarded.
    pub async fn discard_pending(&mut self) -> Result<usize> {
        let mut discarded = 0;
        loop {
            let batch = self.source.fetch_since(self.cursor).await?;
            let mut advanced = 0;
            for update in batch {
                if self.advance(update.update_id) {
                    advanced += 1;
                }
            }
            if advanced == 0 {
                break;
            }
            discarded += advanced;
        }
        debug!(discarded, cursor = ?self.cursor, "discarded pending updates");
        Ok(discarded)
    }

    /// [`await_next`](Self::await_next) with the configured default timeout
    pub async fn await_next_default(&mut self, filter: &UpdateFilter) -> Result<Update> {
        let timeout = self.config.default_timeout;
        self.await_next(filter, timeout).await
    }

    /// Block until the next update matching `filter` arrives.
    ///
    /// Returns the earliest match of the first batch that contains one. The
    /// whole batch counts as consumed, so later matches in it are not
    /// delivered by subsequent calls. Fails with [`Error::Timeout`] once
    /// `timeout` elapses and with [`Error::Transport`] on the first failed
    /// fetch.
    pub async fn await_next(&mut self, filter: &UpdateFilter, timeout: Duration) -> Result<Update> {
        if timeout.is_zero() {
            return Err(Error::config("update timeout must be non-zero"));
        }

        let started = Instant::now();
        let deadline = started + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let batch = match tokio::time::timeout(
                remaining,
                self.source.fetch_since(self.cursor),
            )
            .await
            {
                Ok(batch) => batch?,
                Err(_) => return Err(self.timed_out(started)),
            };

            debug!(batch = batch.len(), cursor = ?self.cursor, "fetched updates");

            if let Some(update) = self.consume(batch, filter) {
                info!(
                    update_id = update.update_id,
                    kind = ?update.kind(),
                    cursor = ?self.cursor,
                    "received matching update"
                );
                return Ok(update);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(started));
            }
            tokio::time::sleep(self.config.backoff.min(remaining)).await;
        }
    }

    /// Walk the batch in id order, advancing past every update, and keep the
    /// first new one that matches.
    fn consume(&mut self, mut batch: Vec<Update>, filter: &UpdateFilter) -> Option<Update> {
        batch.sort_by_key(|u| u.update_id);

        let mut found = None;
        for update in batch {
            if !self.advance(update.update_id) {
                continue;
            }
            if found.is_none() && filter.matches(&update) {
                found = Some(update);
            }
        }
        found
    }

    /// Move the cursor to `update_id`. Returns false for ids already consumed.
    fn advance(&mut self, update_id: i64) -> bool {
        match self.cursor {
            Some(cursor) if update_id <= cursor => false,
            _ => {
                self.cursor = Some(update_id);
                true
            }
        }
    }

    fn timed_out(&self, started: Instant) -> Error {
        let elapsed = started.elapsed();
        warn!(elapsed = ?elapsed, cursor = ?self.cursor, "timed out waiting for update");
        Error::Timeout {
            elapsed,
            cursor: self.cursor,
        }
    }
}
