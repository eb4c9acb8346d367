#![forbid(unsafe_code)]

use std::fmt;

/// WS-Security fault codes surfaced to the caller.
///
/// These mirror the `wsse:` fault QNames of SOAP Message Security 1.1.
/// The policy engine only ever raises `InvalidSecurity`; the remaining
/// codes let callers map their own failures onto the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    UnsupportedSecurityToken,
    UnsupportedAlgorithm,
    InvalidSecurity,
    InvalidSecurityToken,
    FailedAuthentication,
    FailedCheck,
    SecurityTokenUnavailable,
    MessageExpired,
}

impl FaultCode {
    /// Local part of the `wsse:` fault QName.
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::UnsupportedSecurityToken => "UnsupportedSecurityToken",
            Self::UnsupportedAlgorithm => "UnsupportedAlgorithm",
            Self::InvalidSecurity => "InvalidSecurity",
            Self::InvalidSecurityToken => "InvalidSecurityToken",
            Self::FailedAuthentication => "FailedAuthentication",
            Self::FailedCheck => "FailedCheck",
            Self::SecurityTokenUnavailable => "SecurityTokenUnavailable",
            Self::MessageExpired => "MessageExpired",
        }
    }

    /// Human-readable fault string.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedSecurityToken => "An unsupported token was provided",
            Self::UnsupportedAlgorithm => {
                "An unsupported signature or encryption algorithm was used"
            }
            Self::InvalidSecurity => {
                "An error was discovered processing the <wsse:Security> header"
            }
            Self::InvalidSecurityToken => "An invalid security token was provided",
            Self::FailedAuthentication => "The security token could not be authenticated or authorized",
            Self::FailedCheck => "The signature or decryption was invalid",
            Self::SecurityTokenUnavailable => "Referenced security token could not be retrieved",
            Self::MessageExpired => "The message has expired",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wsse:{}", self.local_name())
    }
}

/// A message that does not satisfy its security policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PolicyViolation {
    message: String,
}

impl PolicyViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced by the policy engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {source}", code.description())]
    Security {
        code: FaultCode,
        #[source]
        source: PolicyViolation,
    },

    #[error("illegal token usage: {0}")]
    IllegalTokenUsage(String),

    #[error("unexpected security event: {0}")]
    UnexpectedEvent(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("unknown security token: {0}")]
    UnknownToken(String),

    #[error("no policy found for operation {0}")]
    NoOperationPolicy(String),

    #[error("policy enforcer already finalized")]
    Finalized,
}

impl Error {
    /// Wrap a policy violation in an `InvalidSecurity` fault.
    pub fn invalid_security(violation: PolicyViolation) -> Self {
        Self::Security {
            code: FaultCode::InvalidSecurity,
            source: violation,
        }
    }

    /// The fault code for violations raised by the enforcer.
    pub fn fault_code(&self) -> Option<FaultCode> {
        match self {
            Self::Security { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The nested policy violation, if this error carries one.
    pub fn violation(&self) -> Option<&PolicyViolation> {
        match self {
            Self::Security { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
