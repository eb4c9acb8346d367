#![forbid(unsafe_code)]

//! WS-SecurityPolicy enforcement for inbound WS-Security messages.

pub use wsspolicy_core as core;
pub use wsspolicy_token as token;
pub use wsspolicy_model as model;
pub use wsspolicy_assert as assert;
pub use wsspolicy_enforcer as enforcer;

pub use wsspolicy_core::{Error, FaultCode, PolicyViolation, QName, Result};
pub use wsspolicy_enforcer::{EnforcerContext, PolicyEnforcer};
pub use wsspolicy_model::{OperationPolicy, Policy};
pub use wsspolicy_token::{SecurityEvent, SecurityToken, TokenId};
