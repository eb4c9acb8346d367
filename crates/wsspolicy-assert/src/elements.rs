#![forbid(unsafe_code)]

//! Element protection assertions: `SignedElements`, `EncryptedElements`,
//! `RequiredElements`.
//!
//! Patterns are compiled from the policy XPaths once, when the state is
//! built. An event whose path matches no pattern is ignored, so an unrelated
//! element can neither satisfy nor break the assertion.

use crate::state::{Assertable, AssertionState, Outcome};
use tracing::debug;
use wsspolicy_core::{path_as_string, Error};
use wsspolicy_model::{ElementPattern, ElementsPolicy};
use wsspolicy_token::event::ProtectionType;
use wsspolicy_token::{EventKind, SecurityEvent, TokenRegistry};

fn compile_patterns(policy: &ElementsPolicy) -> Result<Vec<ElementPattern>, Error> {
    policy.xpaths.iter().map(ElementPattern::compile).collect()
}

/// `SignedElements` or `EncryptedElements`.
#[derive(Debug)]
pub struct ProtectedElementsAssertionState {
    state: AssertionState,
    patterns: Vec<ElementPattern>,
    protection: ProtectionType,
    kinds: [EventKind; 1],
}

impl ProtectedElementsAssertionState {
    pub fn signed(policy: &ElementsPolicy) -> Result<Self, Error> {
        Self::new(policy, ProtectionType::Signature)
    }

    pub fn encrypted(policy: &ElementsPolicy) -> Result<Self, Error> {
        Self::new(policy, ProtectionType::Encryption)
    }

    fn new(policy: &ElementsPolicy, protection: ProtectionType) -> Result<Self, Error> {
        let patterns = compile_patterns(policy)?;
        let (name, kind) = match protection {
            ProtectionType::Signature => ("SignedElements", EventKind::SignedElement),
            ProtectionType::Encryption => ("EncryptedElements", EventKind::EncryptedElement),
        };
        Ok(Self {
            // nothing to protect
            state: AssertionState::new(name, patterns.is_empty()),
            patterns,
            protection,
            kinds: [kind],
        })
    }

    pub fn patterns(&self) -> &[ElementPattern] {
        &self.patterns
    }
}

impl Assertable for ProtectedElementsAssertionState {
    fn event_kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    fn assert_event(
        &mut self,
        event: &SecurityEvent,
        _tokens: &TokenRegistry,
    ) -> Result<Outcome, Error> {
        let element = match (self.protection, event) {
            (ProtectionType::Signature, SecurityEvent::SignedElement(e))
            | (ProtectionType::Encryption, SecurityEvent::EncryptedElement(e)) => e,
            _ => {
                return Err(Error::UnexpectedEvent(format!(
                    "{} expects a {} event but got {}",
                    self.state.name(),
                    self.kinds[0],
                    event.kind()
                )))
            }
        };
        if self.state.is_asserted() {
            return Ok(Outcome::Pass);
        }
        let Some(pattern) = self
            .patterns
            .iter()
            .find(|p| p.matches(&element.element_path))
        else {
            return Ok(Outcome::Pass);
        };

        if element.protected {
            debug!(pattern = %pattern, "{} asserted", self.state.name());
            self.state.set_asserted(true);
            self.state.clear_error_message();
            return Ok(Outcome::Pass);
        }
        let verb = match self.protection {
            ProtectionType::Signature => "signed",
            ProtectionType::Encryption => "encrypted",
        };
        let message = format!(
            "Element {} must be {verb}",
            path_as_string(&element.element_path)
        );
        self.state.set_asserted(false);
        self.state.set_error_message(message.clone());
        Ok(Outcome::Fatal(message))
    }

    fn state(&self) -> &AssertionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssertionState {
        &mut self.state
    }
}

/// `RequiredElements`: every pattern must be seen at least once.
#[derive(Debug)]
pub struct RequiredElementsAssertionState {
    state: AssertionState,
    patterns: Vec<ElementPattern>,
    seen: Vec<bool>,
    kinds: [EventKind; 1],
}

impl RequiredElementsAssertionState {
    pub fn new(policy: &ElementsPolicy) -> Result<Self, Error> {
        let patterns = compile_patterns(policy)?;
        let mut state = Self {
            state: AssertionState::new("RequiredElements", false),
            seen: vec![false; patterns.len()],
            patterns,
            kinds: [EventKind::RequiredElement],
        };
        state.refresh();
        Ok(state)
    }

    fn refresh(&mut self) {
        match self.seen.iter().position(|seen| !seen) {
            Some(missing) => {
                self.state.set_asserted(false);
                self.state
                    .set_error_message(format!("Element {} must be present", self.patterns[missing]));
            }
            None => {
                self.state.set_asserted(true);
                self.state.clear_error_message();
            }
        }
    }
}

impl Assertable for RequiredElementsAssertionState {
    fn event_kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    fn assert_event(
        &mut self,
        event: &SecurityEvent,
        _tokens: &TokenRegistry,
    ) -> Result<Outcome, Error> {
        let SecurityEvent::RequiredElement(element) = event else {
            return Err(Error::UnexpectedEvent(format!(
                "RequiredElements expects a RequiredElement event but got {}",
                event.kind()
            )));
        };
        if self.state.is_asserted() {
            return Ok(Outcome::Pass);
        }
        for (pattern, seen) in self.patterns.iter().zip(self.seen.iter_mut()) {
            if pattern.matches(&element.element_path) {
                *seen = true;
            }
        }
        self.refresh();
        Ok(Outcome::Pass)
    }

    fn state(&self) -> &AssertionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssertionState {
        &mut self.state
    }
}
