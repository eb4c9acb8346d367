#![forbid(unsafe_code)]

//! Security tokens and security events.
//!
//! Tokens found in a message are kept in a [`TokenRegistry`] arena; events
//! refer to them by [`TokenId`].

pub mod event;
pub mod registry;
pub mod token;

pub use event::{EventKind, SecurityEvent, TokenDetails, TokenEvent};
pub use registry::{TokenId, TokenRegistry};
pub use token::{KeyIdentifier, SecurityToken, TokenType, TokenUsage};
