#![forbid(unsafe_code)]

//! Policy alternatives over an arena of assertion states.
//!
//! Every alternative owns the states built from its assertions; states are
//! stored once in the arena and alternatives hold their ids. An alternative
//! is retired by the first fatal outcome of one of its states and is never
//! consulted again.

use tracing::{debug, warn};
use wsspolicy_assert::{build_assertion_states, Assertable, Outcome};
use wsspolicy_core::Error;
use wsspolicy_model::Policy;
use wsspolicy_token::{SecurityEvent, TokenRegistry};

/// Stable index of a state in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StateId(usize);

#[derive(Debug, Default)]
struct AssertionArena {
    states: Vec<Box<dyn Assertable>>,
}

impl AssertionArena {
    fn insert(&mut self, state: Box<dyn Assertable>) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    fn get(&self, id: StateId) -> &dyn Assertable {
        self.states[id.0].as_ref()
    }

    fn get_mut(&mut self, id: StateId) -> &mut dyn Assertable {
        self.states[id.0].as_mut()
    }
}

#[derive(Debug)]
struct AlternativeStates {
    states: Vec<StateId>,
    retired: Option<String>,
}

/// Evaluates one policy: its alternatives and their assertion states.
#[derive(Debug)]
pub struct PolicyEvaluator {
    arena: AssertionArena,
    alternatives: Vec<AlternativeStates>,
    last_fatal: Option<String>,
}

impl PolicyEvaluator {
    /// Build fresh states for every assertion of every alternative.
    pub fn build(policy: &Policy, initiator: bool) -> Result<Self, Error> {
        let mut arena = AssertionArena::default();
        let mut alternatives = Vec::with_capacity(policy.alternatives.len());
        for alternative in &policy.alternatives {
            let mut ids = Vec::new();
            for assertion in &alternative.assertions {
                for state in build_assertion_states(assertion, initiator)? {
                    ids.push(arena.insert(state));
                }
            }
            alternatives.push(AlternativeStates {
                states: ids,
                retired: None,
            });
        }
        Ok(Self {
            arena,
            alternatives,
            last_fatal: None,
        })
    }

    /// Route an event to the interested states of every viable alternative.
    ///
    /// Returns the fatal message when this event retired the last viable
    /// alternative.
    pub fn dispatch(
        &mut self,
        event: &SecurityEvent,
        tokens: &TokenRegistry,
    ) -> Result<Option<String>, Error> {
        let kind = event.kind();
        let had_viable = self.viable_count() > 0;
        for (index, alternative) in self.alternatives.iter_mut().enumerate() {
            if alternative.retired.is_some() {
                continue;
            }
            for id in &alternative.states {
                let state = self.arena.get_mut(*id);
                if !state.event_kinds().contains(&kind) {
                    continue;
                }
                match state.assert_event(event, tokens)? {
                    Outcome::Pass => {}
                    Outcome::Recoverable(message) => {
                        debug!(assertion = state.name(), %message, "assertion not yet satisfied");
                    }
                    Outcome::Fatal(message) => {
                        warn!(
                            alternative = index,
                            assertion = state.name(),
                            %message,
                            "policy alternative retired"
                        );
                        alternative.retired = Some(message.clone());
                        self.last_fatal = Some(message);
                        break;
                    }
                }
            }
        }
        if had_viable && self.viable_count() == 0 {
            return Ok(self.last_fatal.clone());
        }
        Ok(None)
    }

    pub fn viable_count(&self) -> usize {
        self.alternatives
            .iter()
            .filter(|a| a.retired.is_none())
            .count()
    }

    /// Some viable alternative has every state asserted.
    pub fn is_satisfied(&self) -> bool {
        self.alternatives
            .iter()
            .filter(|a| a.retired.is_none())
            .any(|a| a.states.iter().all(|id| self.arena.get(*id).is_asserted()))
    }

    /// `(assertion, error message)` of every unasserted state in viable
    /// alternatives.
    pub fn unsatisfied(&self) -> Vec<(String, Option<String>)> {
        self.alternatives
            .iter()
            .filter(|a| a.retired.is_none())
            .flat_map(|a| a.states.iter())
            .map(|id| self.arena.get(*id))
            .filter(|s| !s.is_asserted())
            .map(|s| (s.name().to_owned(), s.error_message().map(str::to_owned)))
            .collect()
    }

    /// Why the policy is not satisfied.
    pub fn failure_message(&self) -> String {
        if self.alternatives.is_empty() {
            return "Policy has no alternatives".into();
        }
        let first_unmet = self
            .alternatives
            .iter()
            .filter(|a| a.retired.is_none())
            .flat_map(|a| a.states.iter())
            .map(|id| self.arena.get(*id))
            .find(|s| !s.is_asserted());
        match first_unmet {
            Some(state) => match state.error_message() {
                Some(error) => format!("Assertion {} not satisfied: {error}", state.name()),
                None => format!("Assertion {} not satisfied", state.name()),
            },
            None => self
                .last_fatal
                .clone()
                .unwrap_or_else(|| "No policy alternative could be satisfied".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsspolicy_core::qname;
    use wsspolicy_core::ns;
    use wsspolicy_model::{Alternative, ElementsPolicy, PolicyAssertion, XPath};
    use wsspolicy_token::{SecurityToken, TokenType};

    fn signed_body() -> PolicyAssertion {
        PolicyAssertion::SignedElements(ElementsPolicy::new(vec![
            XPath::new("/soap:Envelope/soap:Body").with_namespace("soap", ns::SOAP11)
        ]))
    }

    #[test]
    fn test_fatal_retires_only_its_alternative() {
        let policy = Policy::new(vec![
            Alternative::new(vec![signed_body()]),
            Alternative::new(vec![]),
        ]);
        let mut eval = PolicyEvaluator::build(&policy, false).unwrap();
        let mut reg = TokenRegistry::new();
        let id = reg.insert(SecurityToken::new(TokenType::X509V3Token));

        let result = eval
            .dispatch(
                &SecurityEvent::signed_element(id, qname::soap11_body_path(), false),
                &reg,
            )
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(eval.viable_count(), 1);
        // the empty alternative is trivially satisfied
        assert!(eval.is_satisfied());
    }

    #[test]
    fn test_last_alternative_retired() {
        let policy = Policy::single(vec![signed_body()]);
        let mut eval = PolicyEvaluator::build(&policy, false).unwrap();
        let mut reg = TokenRegistry::new();
        let id = reg.insert(SecurityToken::new(TokenType::X509V3Token));
        let message = eval
            .dispatch(
                &SecurityEvent::signed_element(id, qname::soap11_body_path(), false),
                &reg,
            )
            .unwrap()
            .unwrap();
        assert!(message.ends_with("must be signed"));
        assert!(!eval.is_satisfied());
        assert_eq!(eval.failure_message(), message);
        assert!(eval.unsatisfied().is_empty());
    }

    #[test]
    fn test_failure_message_names_unmet_assertion() {
        let eval = PolicyEvaluator::build(&Policy::single(vec![signed_body()]), false).unwrap();
        assert_eq!(eval.failure_message(), "Assertion SignedElements not satisfied");
        assert_eq!(
            eval.unsatisfied(),
            vec![("SignedElements".to_owned(), None)]
        );
    }

    #[test]
    fn test_no_alternatives() {
        let eval = PolicyEvaluator::build(&Policy::default(), false).unwrap();
        assert!(!eval.is_satisfied());
        assert_eq!(eval.failure_message(), "Policy has no alternatives");
    }
}
