//! Update Filter
//!
//! Pure predicate deciding whether an update satisfies a step's
//! expectation: its kind must be wanted, and its originator must be allowed.

use std::collections::HashSet;
use std::fmt;

use super::model::{Update, UpdateKind, User};
use crate::error::{Error, Result};

/// Identity of a permitted actor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Numeric account id
    Id(i64),
    /// Username, stored lowercase without the leading `@`
    Username(String),
}

impl Identity {
    /// Parse a config entry. Numbers are ids, anything else a username.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::config("empty identity"));
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Ok(Identity::Id(id));
        }
        let name = raw.strip_prefix('@').unwrap_or(raw);
        if name.is_empty() {
            return Err(Error::config(format!("invalid identity '{}'", raw)));
        }
        Ok(Identity::Username(name.to_lowercase()))
    }

    fn matches_user(&self, user: &User) -> bool {
        match self {
            Identity::Id(id) => user.id == *id,
            Identity::Username(name) => user
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(name)),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Id(id) => write!(f, "{}", id),
            Identity::Username(name) => write!(f, "@{}", name),
        }
    }
}

/// Which actors may originate a matching update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Originators {
    /// No originator filtering
    #[default]
    Any,
    /// Only these actors. Updates with an unknown originator never match.
    Only(HashSet<Identity>),
}

impl Originators {
    /// Restrict to the given identities
    pub fn only(ids: impl IntoIterator<Item = Identity>) -> Self {
        Originators::Only(ids.into_iter().collect())
    }

    pub fn allows(&self, originator: Option<&User>) -> bool {
        match self {
            Originators::Any => true,
            Originators::Only(ids) => {
                originator.is_some_and(|user| ids.iter().any(|id| id.matches_user(user)))
            }
        }
    }
}

/// Selects updates by kind and originator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFilter {
    kinds: HashSet<UpdateKind>,
    originators: Originators,
}

impl UpdateFilter {
    /// Build a filter. An empty kind set is a configuration error.
    pub fn new(
        kinds: impl IntoIterator<Item = UpdateKind>,
        originators: Originators,
    ) -> Result<Self> {
        let kinds: HashSet<UpdateKind> = kinds.into_iter().collect();
        if kinds.is_empty() {
            return Err(Error::config("update filter needs at least one kind"));
        }
        Ok(Self { kinds, originators })
    }

    /// Filter on kinds only, from any originator
    pub fn from_anyone(kinds: impl IntoIterator<Item = UpdateKind>) -> Result<Self> {
        Self::new(kinds, Originators::Any)
    }

    pub fn matches(&self, update: &Update) -> bool {
        self.kinds.contains(&update.kind()) && self.originators.allows(update.originator())
    }

    pub fn kinds(&self) -> &HashSet<UpdateKind> {
        &self.kinds
    }

    pub fn originators(&self) -> &Originators {
        &self.originators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::model::{Chat, Message, PollAnswer, PollSnapshot};
    use chrono::Utc;

    fn text_from(update_id: i64, user: User) -> Update {
        Update::with_message(
            update_id,
            Message {
                message_id: update_id,
                from: Some(user),
                date: Utc::now(),
                chat: Chat::supergroup(-100, "Tests"),
                text: Some("hi".to_string()),
                poll: None,
            },
        )
    }

    fn poll_update(update_id: i64) -> Update {
        Update::with_poll(update_id, PollSnapshot::new("p1", "Q?", ["a", "b"]))
    }

    #[test]
    fn test_empty_kinds_rejected() {
        let result = UpdateFilter::new(Vec::<UpdateKind>::new(), Originators::Any);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_rejects_unwanted_kind_regardless_of_originator() {
        let ann = User::new(1, "Ann").with_username("ann");
        let filter = UpdateFilter::new(
            [UpdateKind::Poll],
            Originators::only([Identity::Id(1)]),
        )
        .unwrap();
        assert!(!filter.matches(&text_from(1, ann)));
    }

    #[test]
    fn test_any_originator_accepts_unknown() {
        let filter = UpdateFilter::from_anyone([UpdateKind::Poll]).unwrap();
        assert!(filter.matches(&poll_update(1)));
    }

    #[test]
    fn test_only_rejects_unknown_and_strangers() {
        let filter = UpdateFilter::new(
            [UpdateKind::Poll, UpdateKind::Message],
            Originators::only([Identity::parse("@Ann").unwrap()]),
        )
        .unwrap();

        assert!(!filter.matches(&poll_update(1)));
        assert!(!filter.matches(&text_from(2, User::new(2, "Eve").with_username("eve"))));
        assert!(filter.matches(&text_from(3, User::new(1, "Ann").with_username("ANN"))));
    }

    #[test]
    fn test_only_by_numeric_id() {
        let filter = UpdateFilter::new(
            [UpdateKind::PollAnswer],
            Originators::only([Identity::parse("42").unwrap()]),
        )
        .unwrap();
        let vote = |id| {
            Update::with_poll_answer(
                1,
                PollAnswer {
                    poll_id: "p1".to_string(),
                    user: Some(User::new(id, "Voter")),
                    option_ids: vec![0],
                },
            )
        };
        assert!(filter.matches(&vote(42)));
        assert!(!filter.matches(&vote(43)));
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!(Identity::parse("123").unwrap(), Identity::Id(123));
        assert_eq!(
            Identity::parse(" @Tester ").unwrap(),
            Identity::Username("tester".to_string())
        );
        assert!(Identity::parse("").is_err());
        assert!(Identity::parse("@").is_err());
        assert_eq!(Identity::Username("ann".to_string()).to_string(), "@ann");
    }
}
