#![forbid(unsafe_code)]

//! Core types for the WS-SecurityPolicy engine.
//!
//! Errors, fault codes, namespace constants and element paths shared by
//! every other crate in the workspace.

pub mod error;
pub mod ns;
pub mod qname;

pub use error::{Error, FaultCode, PolicyViolation, Result};
pub use qname::{path_as_string, path_matches, ElementPath, QName};
