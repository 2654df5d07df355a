//! Ordered steps
//!
//! A group of steps that run one after another on the calling task, sharing
//! a context passed by `&mut`. A failed step does not stop the group; steps
//! that depend on it fail on their own when they find fixture state unset.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Boxed future type for step functions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A step body
pub type StepFn<C> = for<'a> fn(&'a mut C) -> BoxFuture<'a, Result>;

struct Step<C> {
    title: &'static str,
    run: StepFn<C>,
}

/// Steps executed strictly in declaration order
pub struct StepGroup<C> {
    name: &'static str,
    steps: Vec<Step<C>>,
}

impl<C> fmt::Debug for StepGroup<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepGroup")
            .field("name", &self.name)
            .field("steps", &self.titles())
            .finish()
    }
}

impl<C> StepGroup<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn step(mut self, title: &'static str, run: StepFn<C>) -> Self {
        self.steps.push(Step { title, run });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.title).collect()
    }

    /// Run every step in order against `ctx`
    pub async fn run(&self, ctx: &mut C) -> GroupReport {
        let run_id = Uuid::new_v4();
        info!(group = self.name, %run_id, steps = self.steps.len(), "starting step group");

        let mut reports = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let started = Instant::now();
            let result = (step.run)(ctx).await;
            let elapsed = started.elapsed();

            let outcome = match result {
                Ok(()) => {
                    info!(group = self.name, step = step.title, ?elapsed, "step passed");
                    StepOutcome::Passed
                }
                Err(e) => {
                    error!(
                        group = self.name,
                        step = step.title,
                        kind = e.kind(),
                        error = %e,
                        "step failed"
                    );
                    StepOutcome::Failed(e)
                }
            };

            reports.push(StepReport {
                title: step.title,
                outcome,
                elapsed,
            });
        }

        GroupReport {
            group: self.name,
            run_id,
            steps: reports,
        }
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(Error),
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub title: &'static str,
    pub outcome: StepOutcome,
    pub elapsed: Duration,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.outcome == StepOutcome::Passed
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            StepOutcome::Passed => None,
            StepOutcome::Failed(e) => Some(e),
        }
    }
}

/// Outcome of one group run
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: &'static str,
    pub run_id: Uuid,
    pub steps: Vec<StepReport>,
}

impl GroupReport {
    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn step(&self, title: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.title == title)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "group": self.group,
            "runId": self.run_id.to_string(),
            "passed": self.passed(),
            "failed": self.failed(),
            "steps": self.steps.iter().map(|s| json!({
                "title": s.title,
                "passed": s.passed(),
                "elapsedMs": s.elapsed.as_millis() as u64,
                "errorKind": s.error().map(|e| e.kind()),
                "error": s.error().map(|e| e.to_string()),
            })).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Display for GroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (run {})", self.group, self.run_id)?;
        for step in &self.steps {
            match step.error() {
                None => writeln!(f, "  PASS  {} ({:?})", step.title, step.elapsed)?,
                Some(e) => writeln!(f, "  FAIL  {} ({:?}): {}", step.title, step.elapsed, e)?,
            }
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}
