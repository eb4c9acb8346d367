#![forbid(unsafe_code)]

//! Typed WS-SecurityPolicy assertion tree.
//!
//! The engine does not parse policy XML. A policy parser (or a config file
//! through serde) hands it a [`Policy`] already in normal form: a list of
//! alternatives, each a flat list of leaf assertions bound to the node they
//! were nested in.

pub mod policy;
pub mod token;
pub mod xpath;

pub use policy::{
    find_operation_policy, Alternative, BindingPolicy, BindingType, ElementsPolicy,
    OperationPolicy, Policy, PolicyAssertion,
};
pub use token::{
    DerivedKeys, IncludeTokenType, SupportingTokenType, TokenKind, TokenPolicy, TokenRole,
};
pub use xpath::{ElementPattern, XPath};
