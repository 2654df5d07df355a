//! Fixture slots
//!
//! State an earlier step produces for later steps of the same group. Steps
//! run strictly in order and reach the slot through `&mut` context, so no
//! locking is involved; reading a slot whose producer never ran is reported
//! as [`Error::UnsetState`] rather than passing silently.

use tracing::debug;

use crate::error::{Error, Result};

/// A named value that starts out unset
#[derive(Debug, Clone)]
pub struct Slot<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> Slot<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Store a value, returning the previous one.
    ///
    /// A producing step normally runs once per group, but re-running it
    /// replaces the value.
    pub fn set(&mut self, value: T) -> Option<T> {
        let previous = self.value.replace(value);
        if previous.is_some() {
            debug!(slot = self.name, "fixture slot overwritten");
        }
        previous
    }

    pub fn get(&self) -> Result<&T> {
        self.value.as_ref().ok_or(Error::UnsetState(self.name))
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Remove the value, leaving the slot unset
    pub fn take(&mut self) -> Result<T> {
        self.value.take().ok_or(Error::UnsetState(self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_slot_reports_its_name() {
        let slot: Slot<u32> = Slot::new("poll_message");
        assert!(!slot.is_set());
        assert_eq!(slot.get(), Err(Error::UnsetState("poll_message")));
    }

    #[test]
    fn test_overwrite_replaces_and_returns_previous() {
        let mut slot = Slot::new("poll_message");
        assert_eq!(slot.set("first"), None);
        assert_eq!(slot.set("rerun"), Some("first"));
        assert_eq!(slot.get(), Ok(&"rerun"));
    }

    #[test]
    fn test_set_get_take() {
        let mut slot = Slot::new("answer");
        assert_eq!(slot.set(41), None);
        assert_eq!(slot.set(42), Some(41));
        assert_eq!(slot.get(), Ok(&42));
        assert_eq!(slot.take(), Ok(42));
        assert!(matches!(slot.take(), Err(Error::UnsetState("answer"))));
    }
}
