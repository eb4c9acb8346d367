#![forbid(unsafe_code)]

//! Assertion state construction from policy nodes.

use crate::elements::{ProtectedElementsAssertionState, RequiredElementsAssertionState};
use crate::protection::TokenProtectionAssertionState;
use crate::state::Assertable;
use crate::token::TokenAssertionState;
use wsspolicy_core::Error;
use wsspolicy_model::PolicyAssertion;

/// Build the fresh states evaluating one policy assertion.
///
/// `initiator` is the role of the local party; token inclusion and main
/// token role checks depend on it.
pub fn build_assertion_states(
    assertion: &PolicyAssertion,
    initiator: bool,
) -> Result<Vec<Box<dyn Assertable>>, Error> {
    let states: Vec<Box<dyn Assertable>> = match assertion {
        PolicyAssertion::Token(policy) => {
            vec![Box::new(TokenAssertionState::new(policy.clone(), initiator))]
        }
        PolicyAssertion::SignedElements(policy) => {
            vec![Box::new(ProtectedElementsAssertionState::signed(policy)?)]
        }
        PolicyAssertion::EncryptedElements(policy) => {
            vec![Box::new(ProtectedElementsAssertionState::encrypted(policy)?)]
        }
        PolicyAssertion::RequiredElements(policy) => {
            vec![Box::new(RequiredElementsAssertionState::new(policy)?)]
        }
        PolicyAssertion::Binding(binding) => {
            vec![Box::new(TokenProtectionAssertionState::new(binding))]
        }
    };
    Ok(states)
}
