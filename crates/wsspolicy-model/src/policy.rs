#![forbid(unsafe_code)]

//! Normalized policies: alternatives of leaf assertions.

use crate::token::TokenPolicy;
use crate::xpath::XPath;
use serde::{Deserialize, Serialize};
use wsspolicy_core::QName;

/// `SignedElements`, `EncryptedElements` or `RequiredElements` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementsPolicy {
    pub xpaths: Vec<XPath>,
}

impl ElementsPolicy {
    pub fn new(xpaths: Vec<XPath>) -> Self {
        Self { xpaths }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingType {
    TransportBinding,
    SymmetricBinding,
    AsymmetricBinding,
}

/// Security binding properties relevant to inbound token checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingPolicy {
    pub binding: BindingType,
    #[serde(default)]
    pub protect_tokens: bool,
}

impl BindingPolicy {
    pub fn new(binding: BindingType) -> Self {
        Self {
            binding,
            protect_tokens: false,
        }
    }

    pub fn with_protect_tokens(mut self, protect_tokens: bool) -> Self {
        self.protect_tokens = protect_tokens;
        self
    }
}

/// A leaf policy assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyAssertion {
    Token(TokenPolicy),
    SignedElements(ElementsPolicy),
    EncryptedElements(ElementsPolicy),
    RequiredElements(ElementsPolicy),
    Binding(BindingPolicy),
}

impl PolicyAssertion {
    pub fn name(&self) -> String {
        match self {
            Self::Token(t) => t.name(),
            Self::SignedElements(_) => "SignedElements".into(),
            Self::EncryptedElements(_) => "EncryptedElements".into(),
            Self::RequiredElements(_) => "RequiredElements".into(),
            Self::Binding(b) => format!("{:?}", b.binding),
        }
    }
}

/// One choice of a policy; every assertion in it must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub assertions: Vec<PolicyAssertion>,
}

impl Alternative {
    pub fn new(assertions: Vec<PolicyAssertion>) -> Self {
        Self { assertions }
    }
}

/// A policy in normal form: at least one alternative must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub alternatives: Vec<Alternative>,
}

impl Policy {
    pub fn new(alternatives: Vec<Alternative>) -> Self {
        Self { alternatives }
    }

    /// A policy with a single alternative.
    pub fn single(assertions: Vec<PolicyAssertion>) -> Self {
        Self::new(vec![Alternative::new(assertions)])
    }
}

/// The effective policy of one SOAP operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPolicy {
    pub operation: QName,
    pub policy: Policy,
}

impl OperationPolicy {
    pub fn new(operation: QName, policy: Policy) -> Self {
        Self { operation, policy }
    }
}

/// Find the policy for an operation: exact name first, then local name.
pub fn find_operation_policy<'a>(
    policies: &'a [OperationPolicy],
    operation: &QName,
) -> Option<&'a OperationPolicy> {
    policies
        .iter()
        .find(|p| p.operation == *operation)
        .or_else(|| policies.iter().find(|p| p.operation.local == operation.local))
}
