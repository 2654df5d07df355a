//! Scenarios
//!
//! Ordered step groups that drive a live bot and check what comes back.

pub mod fixture;
pub mod polls;
pub mod steps;

pub use fixture::Slot;
pub use polls::{poll_group, PollFixture, PollProbe};
pub use steps::{BoxFuture, GroupReport, StepFn, StepGroup, StepOutcome, StepReport};
