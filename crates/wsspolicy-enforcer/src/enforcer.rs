#![forbid(unsafe_code)]

//! The policy enforcer state machine.
//!
//! The enforcer is collecting until `do_final` succeeds or a violation is
//! raised; both transitions are terminal. With per-operation policies the
//! effective policy is unknown until the operation event arrives, so
//! earlier events are queued and replayed, in arrival order, into the
//! states of the selected policy.

use crate::alternatives::PolicyEvaluator;
use crate::context::EnforcerContext;
use tracing::{debug, info, warn};
use wsspolicy_core::{Error, PolicyViolation, QName};
use wsspolicy_model::{find_operation_policy, OperationPolicy, Policy};
use wsspolicy_token::{SecurityEvent, SecurityToken, TokenId, TokenRegistry};

#[derive(Debug)]
enum Scope {
    Fixed,
    PerOperation {
        policies: Vec<OperationPolicy>,
        default: Option<Policy>,
        queue: Vec<SecurityEvent>,
    },
}

#[derive(Debug, Clone)]
enum Finalized {
    Satisfied,
    Violated(PolicyViolation),
}

/// Checks the security events of one inbound message against a policy.
#[derive(Debug)]
pub struct PolicyEnforcer {
    context: EnforcerContext,
    tokens: TokenRegistry,
    scope: Scope,
    evaluator: Option<PolicyEvaluator>,
    operation: Option<QName>,
    /// First violation suppressed in soft-fail mode.
    suppressed: Option<PolicyViolation>,
    finalized: Option<Finalized>,
}

impl PolicyEnforcer {
    /// Enforce a single policy; events are evaluated as they arrive.
    pub fn new(policy: &Policy, context: EnforcerContext) -> Result<Self, Error> {
        let evaluator = PolicyEvaluator::build(policy, context.initiator)?;
        Ok(Self {
            context,
            tokens: TokenRegistry::new(),
            scope: Scope::Fixed,
            evaluator: Some(evaluator),
            operation: None,
            suppressed: None,
            finalized: None,
        })
    }

    /// Enforce the policy of whichever operation the message turns out to
    /// invoke, falling back to `default`.
    pub fn for_operations(
        policies: Vec<OperationPolicy>,
        default: Option<Policy>,
        context: EnforcerContext,
    ) -> Result<Self, Error> {
        // reject broken policies up front rather than mid-message
        for op in &policies {
            PolicyEvaluator::build(&op.policy, context.initiator)?;
        }
        if let Some(policy) = &default {
            PolicyEvaluator::build(policy, context.initiator)?;
        }
        Ok(Self {
            context,
            tokens: TokenRegistry::new(),
            scope: Scope::PerOperation {
                policies,
                default,
                queue: Vec::new(),
            },
            evaluator: None,
            operation: None,
            suppressed: None,
            finalized: None,
        })
    }

    pub fn context(&self) -> &EnforcerContext {
        &self.context
    }

    /// Register a token found in the message.
    pub fn add_token(&mut self, token: SecurityToken) -> TokenId {
        self.tokens.insert(token)
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Token registry, e.g. to record key wrapping or late usages.
    pub fn tokens_mut(&mut self) -> &mut TokenRegistry {
        &mut self.tokens
    }

    /// The dispatched SOAP operation, once known.
    pub fn operation(&self) -> Option<&QName> {
        self.operation.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Feed one security event.
    ///
    /// Fails with an `InvalidSecurity` fault as soon as no policy
    /// alternative can be satisfied any more. Any error finalizes the
    /// enforcer; `do_final` then reports the same failure.
    pub fn register_security_event(&mut self, event: SecurityEvent) -> Result<(), Error> {
        if self.finalized.is_some() {
            return Err(Error::Finalized);
        }
        debug!(kind = %event.kind(), "security event");
        self.process(event).map_err(|e| self.abort(e))
    }

    fn process(&mut self, event: SecurityEvent) -> Result<(), Error> {
        if let SecurityEvent::Operation(op) = &event {
            self.operation = Some(op.operation.clone());
            if self.evaluator.is_none() {
                self.select_operation_policy(&op.operation)?;
            }
        }

        if self.evaluator.is_none() {
            if let Scope::PerOperation { queue, .. } = &mut self.scope {
                queue.push(event);
            }
            return Ok(());
        }
        self.dispatch(&event)
    }

    /// Finish the message. `Ok(true)` when some alternative is satisfied.
    ///
    /// Calling it again returns the same verdict.
    pub fn do_final(&mut self) -> Result<bool, Error> {
        if let Some(finalized) = &self.finalized {
            return match finalized.clone() {
                Finalized::Satisfied => Ok(true),
                Finalized::Violated(_) if self.context.soft_fail => Ok(false),
                Finalized::Violated(violation) => Err(Error::invalid_security(violation)),
            };
        }

        if self.evaluator.is_none() {
            let default = match &self.scope {
                Scope::PerOperation { default, .. } => default.clone(),
                Scope::Fixed => None,
            };
            match default {
                Some(policy) => {
                    debug!("no operation dispatched, using the default policy");
                    if let Err(e) = self.start_evaluation(&policy) {
                        return Err(self.abort(e));
                    }
                }
                None => {
                    return self
                        .conclude(PolicyViolation::new("No SOAP operation was dispatched"));
                }
            }
        }

        let (satisfied, message) = match &self.evaluator {
            Some(evaluator) => (evaluator.is_satisfied(), evaluator.failure_message()),
            None => (false, "No SOAP operation was dispatched".to_owned()),
        };
        if satisfied && self.suppressed.is_none() {
            info!("security policy satisfied");
            self.finalized = Some(Finalized::Satisfied);
            return Ok(true);
        }
        let violation = self
            .suppressed
            .clone()
            .unwrap_or_else(|| PolicyViolation::new(message));
        self.conclude(violation)
    }

    /// `(assertion, error message)` for every unsatisfied assertion of the
    /// alternatives still in play.
    pub fn unsatisfied(&self) -> Vec<(String, Option<String>)> {
        self.evaluator
            .as_ref()
            .map(PolicyEvaluator::unsatisfied)
            .unwrap_or_default()
    }

    fn select_operation_policy(&mut self, operation: &QName) -> Result<(), Error> {
        let policy = match &self.scope {
            Scope::Fixed => return Ok(()),
            Scope::PerOperation {
                policies, default, ..
            } => match find_operation_policy(policies, operation) {
                Some(op) => op.policy.clone(),
                None => default
                    .clone()
                    .ok_or_else(|| Error::NoOperationPolicy(operation.to_string()))?,
            },
        };
        debug!(%operation, "operation policy selected");
        self.start_evaluation(&policy)
    }

    /// Build the states for `policy` and replay queued events into them.
    fn start_evaluation(&mut self, policy: &Policy) -> Result<(), Error> {
        self.evaluator = Some(PolicyEvaluator::build(policy, self.context.initiator)?);
        let queue = match &mut self.scope {
            Scope::PerOperation { queue, .. } => std::mem::take(queue),
            Scope::Fixed => Vec::new(),
        };
        debug!(events = queue.len(), "replaying queued security events");
        for event in &queue {
            self.dispatch(event)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &SecurityEvent) -> Result<(), Error> {
        let Some(evaluator) = self.evaluator.as_mut() else {
            return Ok(());
        };
        match evaluator.dispatch(event, &self.tokens)? {
            Some(message) => self.raise(PolicyViolation::new(message)),
            None => Ok(()),
        }
    }

    /// A violation found while events are still arriving.
    fn raise(&mut self, violation: PolicyViolation) -> Result<(), Error> {
        if self.context.soft_fail {
            warn!(%violation, "security policy violated (soft fail)");
            self.suppressed.get_or_insert(violation);
            return Ok(());
        }
        warn!(%violation, "security policy violated");
        self.finalized = Some(Finalized::Violated(violation.clone()));
        Err(Error::invalid_security(violation))
    }

    /// Processing stopped on an error; nothing more is accepted.
    fn abort(&mut self, error: Error) -> Error {
        if self.finalized.is_none() {
            warn!(%error, "security event processing aborted");
            self.finalized = Some(Finalized::Violated(PolicyViolation::new(error.to_string())));
        }
        error
    }

    /// Final verdict for an unsatisfied policy.
    fn conclude(&mut self, violation: PolicyViolation) -> Result<bool, Error> {
        self.finalized = Some(Finalized::Violated(violation.clone()));
        if self.context.soft_fail {
            warn!(%violation, "security policy not satisfied (soft fail)");
            return Ok(false);
        }
        warn!(%violation, "security policy not satisfied");
        Err(Error::invalid_security(violation))
    }
}
