#![forbid(unsafe_code)]

//! Enforcer context: configuration for one message.

use serde::{Deserialize, Serialize};

/// Configuration of a [`PolicyEnforcer`](crate::PolicyEnforcer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcerContext {
    /// The local party sent the original request and is now processing the
    /// response. `false` for a service processing an inbound request.
    pub initiator: bool,
    /// Log policy violations instead of raising them. `do_final` then
    /// reports the verdict as `Ok(false)`.
    pub soft_fail: bool,
}

impl EnforcerContext {
    /// Recipient side, violations raised.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initiator(mut self, initiator: bool) -> Self {
        self.initiator = initiator;
        self
    }

    pub fn with_soft_fail(mut self, soft_fail: bool) -> Self {
        self.soft_fail = soft_fail;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_json() {
        let ctx: EnforcerContext = serde_json::from_str(r#"{"soft_fail": true}"#).unwrap();
        assert_eq!(ctx, EnforcerContext::new().with_soft_fail(true));
        assert!(!ctx.initiator);

        let json = serde_json::to_string(&EnforcerContext::new().with_initiator(true)).unwrap();
        assert_eq!(json, r#"{"initiator":true,"soft_fail":false}"#);
    }
}
