#![forbid(unsafe_code)]

//! Assertion states for WS-SecurityPolicy enforcement.
//!
//! Each leaf policy assertion is evaluated by one stateful [`Assertable`]
//! that consumes the security events it subscribes to and keeps its own
//! asserted flag and error message.

pub mod builder;
pub mod elements;
pub mod protection;
pub mod state;
pub mod token;

mod https;
mod issued;
mod kerberos;
mod keyvalue;
mod saml;
mod sct;
mod username;
mod x509;

pub use builder::build_assertion_states;
pub use elements::{ProtectedElementsAssertionState, RequiredElementsAssertionState};
pub use protection::TokenProtectionAssertionState;
pub use state::{Assertable, AssertionState, Outcome};
pub use token::{qualifiers_compatible, TokenAssertionState};
