//! Event Source
//!
//! The remote buffer that holds updates until they are fetched.

use async_trait::async_trait;

use super::model::Update;
use crate::error::Result;

/// A fetch-since-cursor view of a remote update buffer
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch updates with `update_id > cursor` (everything buffered when
    /// `cursor` is `None`), in ascending id order.
    ///
    /// An empty batch is a normal outcome. Network and auth failures map to
    /// [`Error::Transport`](crate::Error::Transport).
    async fn fetch_since(&self, cursor: Option<i64>) -> Result<Vec<Update>>;
}
