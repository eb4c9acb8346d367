#![forbid(unsafe_code)]

//! Token assertions: role filtering, inclusion, derived keys.
//!
//! Processing order for a token event:
//! 1. Already asserted: pass.
//! 2. Drop the event if none of the token's usages fits the node this
//!    assertion is nested in.
//! 3. Check `IncludeToken` against the token's presence in the message.
//! 4. Check the derived key requirement.
//! 5. Run the token-kind specific property checks.
//!
//! A failure is fatal only when the token is the main signature or main
//! encryption token. Supporting tokens fail softly so that another token of
//! the same kind later in the message can still satisfy the assertion.

use crate::state::{Assertable, AssertionState, Outcome};
use crate::{https, issued, kerberos, keyvalue, saml, sct, username, x509};
use wsspolicy_core::Error;
use wsspolicy_model::{IncludeTokenType, TokenKind, TokenPolicy, TokenRole};
use wsspolicy_token::event::TokenEvent;
use wsspolicy_token::{EventKind, SecurityEvent, SecurityToken, TokenRegistry, TokenUsage};

/// Result of a token-kind specific property check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenCheck {
    Pass,
    Fail(String),
}

#[derive(Debug)]
pub struct TokenAssertionState {
    state: AssertionState,
    policy: TokenPolicy,
    initiator: bool,
    kinds: [EventKind; 1],
}

impl TokenAssertionState {
    pub fn new(policy: TokenPolicy, initiator: bool) -> Self {
        let kind = event_kind_for(&policy.kind);
        Self {
            state: AssertionState::new(policy.name(), false),
            policy,
            initiator,
            kinds: [kind],
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Does a token with this usage concern the node this assertion sits in?
    fn usage_applies(&self, usage: TokenUsage) -> Result<bool, Error> {
        use TokenRole::*;
        let role = self.policy.role;
        let applies = match usage {
            TokenUsage::MainSignature => {
                let own = if self.initiator {
                    matches!(role, RecipientToken | RecipientSignatureToken)
                } else {
                    matches!(role, InitiatorToken | InitiatorSignatureToken)
                };
                own || matches!(role, SignatureToken | ProtectionToken | TransportToken)
            }
            TokenUsage::MainEncryption => {
                let own = if self.initiator {
                    matches!(role, InitiatorToken | InitiatorEncryptionToken)
                } else {
                    matches!(role, RecipientToken | RecipientEncryptionToken)
                };
                own || matches!(role, EncryptionToken | ProtectionToken | TransportToken)
            }
            TokenUsage::Signature | TokenUsage::Encryption => {
                return Err(Error::IllegalTokenUsage(format!(
                    "{} cannot be asserted against {}",
                    usage,
                    self.policy.name()
                )));
            }
            _ => match role {
                Supporting(supporting) => {
                    qualifiers_compatible(supporting.local_name(), usage.name())
                }
                _ => false,
            },
        };
        Ok(applies)
    }

    fn check_inclusion(&self, token: &SecurityToken) -> Option<&'static str> {
        let included = token.included_in_message;
        match self.policy.include_token {
            IncludeTokenType::Never if included => Some("Token must not be included"),
            IncludeTokenType::AlwaysToRecipient if self.initiator && included => {
                Some("Token must not be included")
            }
            IncludeTokenType::AlwaysToRecipient if !self.initiator && !included => {
                Some("Token must be included")
            }
            IncludeTokenType::AlwaysToInitiator if self.initiator && !included => {
                Some("Token must be included")
            }
            IncludeTokenType::AlwaysToInitiator if !self.initiator && included => {
                Some("Token must not be included")
            }
            IncludeTokenType::Always if !included => Some("Token must be included"),
            _ => None,
        }
    }

    fn check_token(
        &self,
        token: &SecurityToken,
        event: &TokenEvent,
    ) -> Result<TokenCheck, Error> {
        let details = &event.details;
        match &self.policy.kind {
            TokenKind::Username(p) => username::assert_token(p, details),
            TokenKind::X509(p) => x509::assert_token(p, &self.policy, token, details),
            TokenKind::Saml(p) => saml::assert_token(p, &self.policy, token, details),
            TokenKind::KeyValue(p) => keyvalue::assert_token(p, details),
            TokenKind::Kerberos(p) => kerberos::assert_token(p, &self.policy, token, details),
            TokenKind::Issued(p) => issued::assert_token(p, &self.policy, details),
            TokenKind::SecurityContext(p) => sct::assert_token(p, &self.policy, token, details),
            TokenKind::Https(p) => https::assert_token(p, details),
        }
    }
}

impl Assertable for TokenAssertionState {
    fn event_kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    fn assert_event(
        &mut self,
        event: &SecurityEvent,
        tokens: &TokenRegistry,
    ) -> Result<Outcome, Error> {
        if self.state.is_asserted() {
            return Ok(Outcome::Pass);
        }
        let SecurityEvent::Token(token_event) = event else {
            return Err(Error::UnexpectedEvent(format!(
                "{} expects a token event but got {}",
                self.policy.name(),
                event.kind()
            )));
        };
        let token = tokens.get(token_event.token)?;

        let mut ignored = 0;
        for usage in &token.usages {
            if !self.usage_applies(*usage)? {
                ignored += 1;
            }
        }
        if ignored >= token.usages.len() {
            // not for us
            return Ok(Outcome::Pass);
        }

        let mut error: Option<String> = None;

        if let Some(message) = self.check_inclusion(token) {
            error = Some(message.to_owned());
        }

        let has_derived_keys = tokens.has_derived_keys(token_event.token);
        match (self.policy.derived_keys, has_derived_keys) {
            (Some(_), false) => error = Some("Derived key must be used".into()),
            (None, true) => error = Some("Derived key must not be used".into()),
            _ => {}
        }

        if let TokenCheck::Fail(message) = self.check_token(token, token_event)? {
            error = Some(message);
        }

        match error {
            None => {
                self.state.set_asserted(true);
                self.state.clear_error_message();
                Ok(Outcome::Pass)
            }
            Some(message) => {
                self.state.set_error_message(message.clone());
                if token.usages.iter().any(TokenUsage::is_main) {
                    Ok(Outcome::Fatal(message))
                } else {
                    Ok(Outcome::Recoverable(message))
                }
            }
        }
    }

    fn state(&self) -> &AssertionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssertionState {
        &mut self.state
    }
}

/// Qualifier compatibility between a `*SupportingTokens` node name and a
/// supporting token usage name. Equal names always match; otherwise each
/// qualifier the node demands must be present in the usage name.
pub fn qualifiers_compatible(supporting_tokens_name: &str, usage_name: &str) -> bool {
    if supporting_tokens_name == usage_name {
        return true;
    }
    if supporting_tokens_name.contains("Endorsing") && !usage_name.contains("Endorsing") {
        return false;
    }
    if supporting_tokens_name.starts_with("Signed") && !usage_name.starts_with("Signed") {
        return false;
    }
    if supporting_tokens_name.contains("Encrypted") && !usage_name.contains("Encrypted") {
        return false;
    }
    true
}

/// The event kind a token assertion subscribes to.
pub fn event_kind_for(kind: &TokenKind) -> EventKind {
    match kind {
        TokenKind::Username(_) => EventKind::UsernameToken,
        TokenKind::X509(_) => EventKind::X509Token,
        TokenKind::Saml(_) => EventKind::SamlToken,
        TokenKind::KeyValue(_) => EventKind::KeyValueToken,
        TokenKind::Kerberos(_) => EventKind::KerberosToken,
        TokenKind::Issued(_) => EventKind::IssuedToken,
        TokenKind::SecurityContext(_) => EventKind::SecurityContextToken,
        TokenKind::Https(_) => EventKind::HttpsToken,
    }
}

/// Error for a token event routed to an assertion of another kind.
pub(crate) fn unexpected_details(expected: &str, details: &wsspolicy_token::TokenDetails) -> Error {
    Error::UnexpectedEvent(format!(
        "Expected a {expected} but got {}",
        details.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wsspolicy_model::token::X509TokenPolicy;
    use wsspolicy_model::{DerivedKeys, SupportingTokenType};
    use wsspolicy_token::event::X509TokenDetails;
    use wsspolicy_token::{TokenDetails, TokenId, TokenType};

    fn x509_details() -> TokenDetails {
        TokenDetails::X509(X509TokenDetails {
            issuer_name: None,
            version: 3,
        })
    }

    fn x509_policy(role: TokenRole, include: IncludeTokenType) -> TokenPolicy {
        TokenPolicy::new(role, TokenKind::X509(X509TokenPolicy::default()))
            .with_include_token(include)
    }

    fn x509_token(reg: &mut TokenRegistry, usage: TokenUsage, included: bool) -> TokenId {
        reg.insert(
            SecurityToken::new(TokenType::X509V3Token)
                .with_usage(usage)
                .included(included),
        )
    }

    #[test]
    fn test_asserted_on_matching_main_signature() {
        let mut reg = TokenRegistry::new();
        let id = x509_token(&mut reg, TokenUsage::MainSignature, true);
        let mut state =
            TokenAssertionState::new(x509_policy(TokenRole::InitiatorToken, IncludeTokenType::Always), false);
        let outcome = state
            .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Pass);
        assert!(state.is_asserted());
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn test_main_signature_role_depends_on_party() {
        let mut reg = TokenRegistry::new();
        let id = x509_token(&mut reg, TokenUsage::MainSignature, true);
        let ev = SecurityEvent::token(id, x509_details());

        // the initiator verifies signatures made with the recipient token
        let mut state =
            TokenAssertionState::new(x509_policy(TokenRole::InitiatorToken, IncludeTokenType::Always), true);
        assert_eq!(state.assert_event(&ev, &reg).unwrap(), Outcome::Pass);
        assert!(!state.is_asserted());

        let mut state =
            TokenAssertionState::new(x509_policy(TokenRole::RecipientToken, IncludeTokenType::Always), true);
        assert_eq!(state.assert_event(&ev, &reg).unwrap(), Outcome::Pass);
        assert!(state.is_asserted());
    }

    #[test]
    fn test_irrelevant_supporting_token_is_ignored() {
        let mut reg = TokenRegistry::new();
        let id = x509_token(&mut reg, TokenUsage::SupportingTokens, false);
        let policy = x509_policy(
            TokenRole::Supporting(SupportingTokenType::SignedEndorsing),
            IncludeTokenType::Always,
        );
        let mut state = TokenAssertionState::new(policy, false);
        assert_eq!(
            state
                .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
                .unwrap(),
            Outcome::Pass
        );
        assert!(!state.is_asserted());
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn test_token_without_usages_is_ignored() {
        let mut reg = TokenRegistry::new();
        let id = reg.insert(SecurityToken::new(TokenType::X509V3Token));
        let mut state =
            TokenAssertionState::new(x509_policy(TokenRole::SignatureToken, IncludeTokenType::Always), false);
        let outcome = state
            .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Pass);
        assert!(!state.is_asserted());
    }

    #[test]
    fn test_supporting_failure_is_recoverable() {
        let mut reg = TokenRegistry::new();
        let id = x509_token(&mut reg, TokenUsage::SignedSupportingTokens, false);
        let policy = x509_policy(
            TokenRole::Supporting(SupportingTokenType::Signed),
            IncludeTokenType::Always,
        );
        let mut state = TokenAssertionState::new(policy, false);
        let outcome = state
            .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Recoverable("Token must be included".into()));
        assert!(!state.is_asserted());

        // a conforming token later in the message satisfies the assertion
        let good = x509_token(&mut reg, TokenUsage::SignedSupportingTokens, true);
        let outcome = state
            .assert_event(&SecurityEvent::token(good, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Pass);
        assert!(state.is_asserted());
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn test_main_token_failure_is_fatal() {
        let mut reg = TokenRegistry::new();
        let id = x509_token(&mut reg, TokenUsage::MainEncryption, true);
        let mut state =
            TokenAssertionState::new(x509_policy(TokenRole::EncryptionToken, IncludeTokenType::Never), false);
        let outcome = state
            .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Fatal("Token must not be included".into()));
        assert_eq!(state.error_message(), Some("Token must not be included"));
    }

    #[test]
    fn test_illegal_usage() {
        let mut reg = TokenRegistry::new();
        let id = x509_token(&mut reg, TokenUsage::Signature, true);
        let mut state =
            TokenAssertionState::new(x509_policy(TokenRole::SignatureToken, IncludeTokenType::Always), false);
        let err = state
            .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
            .unwrap_err();
        assert!(matches!(err, Error::IllegalTokenUsage(_)));
    }

    #[test]
    fn test_derived_key_requirement() {
        let mut reg = TokenRegistry::new();
        let plain = x509_token(&mut reg, TokenUsage::MainSignature, true);
        let mut state = TokenAssertionState::new(
            x509_policy(TokenRole::SignatureToken, IncludeTokenType::Always)
                .with_derived_keys(DerivedKeys::RequireDerivedKeys),
            false,
        );
        let outcome = state
            .assert_event(&SecurityEvent::token(plain, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Fatal("Derived key must be used".into()));

        let wrapping = x509_token(&mut reg, TokenUsage::MainSignature, true);
        let dk = reg.insert(SecurityToken::new(TokenType::DerivedKeyToken));
        reg.wrap(wrapping, dk).unwrap();
        let outcome = state
            .assert_event(&SecurityEvent::token(wrapping, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Pass);
        assert!(state.is_asserted());

        let mut forbids = TokenAssertionState::new(
            x509_policy(TokenRole::SignatureToken, IncludeTokenType::Always),
            false,
        );
        let outcome = forbids
            .assert_event(&SecurityEvent::token(wrapping, x509_details()), &reg)
            .unwrap();
        assert_eq!(outcome, Outcome::Fatal("Derived key must not be used".into()));
    }

    #[test]
    fn test_qualifier_predicates() {
        assert!(qualifiers_compatible("SupportingTokens", "SignedEndorsingSupportingTokens"));
        assert!(qualifiers_compatible(
            "SignedSupportingTokens",
            "SignedEncryptedSupportingTokens"
        ));
        assert!(!qualifiers_compatible("SignedSupportingTokens", "SupportingTokens"));
        assert!(!qualifiers_compatible(
            "EndorsingSupportingTokens",
            "SignedSupportingTokens"
        ));
        assert!(!qualifiers_compatible(
            "EncryptedSupportingTokens",
            "EndorsingSupportingTokens"
        ));
        assert!(qualifiers_compatible(
            "EndorsingEncryptedSupportingTokens",
            "SignedEndorsingEncryptedSupportingTokens"
        ));
    }

    fn expected_inclusion_error(
        include: IncludeTokenType,
        initiator: bool,
        included: bool,
    ) -> Option<&'static str> {
        match (include, initiator, included) {
            (IncludeTokenType::Never, _, true) => Some("Token must not be included"),
            (IncludeTokenType::Never, _, false) => None,
            (IncludeTokenType::Once, _, _) => None,
            (IncludeTokenType::AlwaysToRecipient, true, true) => Some("Token must not be included"),
            (IncludeTokenType::AlwaysToRecipient, true, false) => None,
            (IncludeTokenType::AlwaysToRecipient, false, true) => None,
            (IncludeTokenType::AlwaysToRecipient, false, false) => Some("Token must be included"),
            (IncludeTokenType::AlwaysToInitiator, true, true) => None,
            (IncludeTokenType::AlwaysToInitiator, true, false) => Some("Token must be included"),
            (IncludeTokenType::AlwaysToInitiator, false, true) => Some("Token must not be included"),
            (IncludeTokenType::AlwaysToInitiator, false, false) => None,
            (IncludeTokenType::Always, _, true) => None,
            (IncludeTokenType::Always, _, false) => Some("Token must be included"),
        }
    }

    #[test]
    fn test_inclusion_matrix() {
        let all = [
            IncludeTokenType::Never,
            IncludeTokenType::Once,
            IncludeTokenType::AlwaysToRecipient,
            IncludeTokenType::AlwaysToInitiator,
            IncludeTokenType::Always,
        ];
        for include in all {
            for initiator in [true, false] {
                for included in [true, false] {
                    let mut reg = TokenRegistry::new();
                    let id = x509_token(&mut reg, TokenUsage::MainSignature, included);
                    let mut state = TokenAssertionState::new(
                        x509_policy(TokenRole::SignatureToken, include),
                        initiator,
                    );
                    let outcome = state
                        .assert_event(&SecurityEvent::token(id, x509_details()), &reg)
                        .unwrap();
                    let expected = match expected_inclusion_error(include, initiator, included) {
                        Some(m) => Outcome::Fatal(m.to_owned()),
                        None => Outcome::Pass,
                    };
                    assert_eq!(
                        outcome, expected,
                        "include={include:?} initiator={initiator} included={included}"
                    );
                    assert_eq!(state.is_asserted(), expected == Outcome::Pass);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_asserted_state_is_sticky(
            usages in proptest::collection::vec(0usize..12, 0..4),
            included in any::<bool>(),
        ) {
            let mut reg = TokenRegistry::new();
            let good = x509_token(&mut reg, TokenUsage::MainSignature, true);
            let mut state = TokenAssertionState::new(
                x509_policy(TokenRole::SignatureToken, IncludeTokenType::Once),
                false,
            );
            state.assert_event(&SecurityEvent::token(good, x509_details()), &reg).unwrap();
            prop_assert!(state.is_asserted());

            let mut token = SecurityToken::new(TokenType::X509V1Token).included(included);
            for u in usages {
                token.add_usage(TokenUsage::ALL[u]);
            }
            let other = reg.insert(token);
            let outcome = state.assert_event(&SecurityEvent::token(other, x509_details()), &reg);
            prop_assert_eq!(outcome.unwrap(), Outcome::Pass);
            prop_assert!(state.is_asserted());
            prop_assert_eq!(state.error_message(), None);
        }
    }
}
