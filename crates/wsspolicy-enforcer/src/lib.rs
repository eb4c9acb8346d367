#![forbid(unsafe_code)]

//! Streaming WS-SecurityPolicy enforcement.
//!
//! A [`PolicyEnforcer`] receives the security events discovered while an
//! inbound message is validated, routes each to the assertion states of the
//! policy alternatives still in play, and decides whether at least one
//! alternative is satisfied.

pub mod alternatives;
pub mod context;
pub mod enforcer;


pub use alternatives::PolicyEvaluator;
pub use context::EnforcerContext;
pub use enforcer::PolicyEnforcer;
