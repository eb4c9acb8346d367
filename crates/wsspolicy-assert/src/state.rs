#![forbid(unsafe_code)]

//! Assertion state base and the `Assertable` contract.

use wsspolicy_core::Error;
use wsspolicy_token::{EventKind, SecurityEvent, TokenRegistry};

/// Verdict of one assertion state on one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Satisfied by the event, already satisfied, or not concerned by it.
    Pass,
    /// The event did not satisfy the requirement, but a later event may.
    /// The alternative holding the state stays viable.
    Recoverable(String),
    /// The requirement can no longer be met in this message; the
    /// alternative holding the state is retired.
    Fatal(String),
}

impl Outcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }
}

/// Flag and message storage shared by every assertion state.
#[derive(Debug, Clone)]
pub struct AssertionState {
    name: String,
    asserted: bool,
    error_message: Option<String>,
}

impl AssertionState {
    pub fn new(name: impl Into<String>, asserted: bool) -> Self {
        Self {
            name: name.into(),
            asserted,
            error_message: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    pub fn set_asserted(&mut self, asserted: bool) {
        self.asserted = asserted;
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn clear_error_message(&mut self) {
        self.error_message = None;
    }
}

/// A stateful evaluator for one leaf policy requirement.
pub trait Assertable: std::fmt::Debug {
    /// Event kinds this state wants to see.
    fn event_kinds(&self) -> &[EventKind];

    /// Evaluate one event. `Err` is reserved for events this state cannot
    /// interpret at all, never for policy violations.
    fn assert_event(
        &mut self,
        event: &SecurityEvent,
        tokens: &TokenRegistry,
    ) -> Result<Outcome, Error>;

    fn state(&self) -> &AssertionState;

    fn state_mut(&mut self) -> &mut AssertionState;

    fn name(&self) -> &str {
        self.state().name()
    }

    fn is_asserted(&self) -> bool {
        self.state().is_asserted()
    }

    fn set_asserted(&mut self, asserted: bool) {
        self.state_mut().set_asserted(asserted);
    }

    fn error_message(&self) -> Option<&str> {
        self.state().error_message()
    }
}
