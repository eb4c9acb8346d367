#![forbid(unsafe_code)]

//! Token protection (`sp:ProtectTokens`) cross-checks.
//!
//! Token and signed-element events are collected while the security header
//! is processed. The operation event marks the end of the header; only then
//! are the relationships between signing tokens checked:
//! - a signing token included in the message is signed by its own signature
//! - an endorsing token signs the main signature
//! - the main signature signs every `Signed*` supporting token
//!
//! Without `ProtectTokens` the state subscribes to nothing and stays
//! asserted.

use crate::state::{Assertable, AssertionState, Outcome};
use tracing::debug;
use wsspolicy_core::qname::header_signature_path;
use wsspolicy_core::{path_as_string, path_matches, ElementPath, Error};
use wsspolicy_model::BindingPolicy;
use wsspolicy_token::{EventKind, SecurityEvent, SecurityToken, TokenId, TokenRegistry, TokenUsage};

const PROTECT_TOKENS_KINDS: [EventKind; 10] = [
    EventKind::UsernameToken,
    EventKind::X509Token,
    EventKind::SamlToken,
    EventKind::KeyValueToken,
    EventKind::KerberosToken,
    EventKind::IssuedToken,
    EventKind::SecurityContextToken,
    EventKind::HttpsToken,
    EventKind::SignedElement,
    EventKind::Operation,
];

#[derive(Debug)]
struct SignedElement {
    signer: TokenId,
    path: ElementPath,
}

#[derive(Debug)]
pub struct TokenProtectionAssertionState {
    state: AssertionState,
    protect_tokens: bool,
    tokens: Vec<TokenId>,
    signed_elements: Vec<SignedElement>,
}

impl TokenProtectionAssertionState {
    pub fn new(binding: &BindingPolicy) -> Self {
        Self {
            state: AssertionState::new(format!("{:?}/ProtectTokens", binding.binding), true),
            protect_tokens: binding.protect_tokens,
            tokens: Vec::new(),
            signed_elements: Vec::new(),
        }
    }

    fn verify(&self, tokens: &TokenRegistry) -> Result<Option<String>, Error> {
        let signature_path = header_signature_path();
        for id in &self.tokens {
            // roles sit on the outermost token, the signature on the key it wraps
            let root = tokens.get(tokens.root_token(*id))?;
            let effective = tokens.effective_signature_token(*id);
            let token = tokens.get(effective)?;
            let token_path = token.element_path.as_deref().unwrap_or_default();

            if token.included_in_message
                && (is_signature_token(root) || is_signature_token(token))
                && !self.is_signed_by(token_path, effective, tokens)
            {
                return Ok(Some(format!(
                    "Token {} must be signed by its signature.",
                    path_as_string(token_path)
                )));
            }

            if is_endorsing_token(root) && !self.is_signed_by(&signature_path, effective, tokens) {
                return Ok(Some(format!(
                    "Token {} must sign the main signature.",
                    path_as_string(token_path)
                )));
            }

            if root.has_usage(TokenUsage::MainSignature)
                && !self.signs_signed_supporting_tokens(effective, tokens)?
            {
                return Ok(Some(
                    "Main signature must sign the Signed*Supporting-Tokens.".into(),
                ));
            }
        }
        Ok(None)
    }

    fn is_signed_by(&self, path: &[wsspolicy_core::QName], signer: TokenId, tokens: &TokenRegistry) -> bool {
        self.signed_elements.iter().any(|e| {
            tokens.effective_signature_token(e.signer) == signer
                && path_matches(&e.path, path, true, false)
        })
    }

    /// Each `Signed*` supporting token needs its own signed-element event
    /// from the main signature.
    fn signs_signed_supporting_tokens(
        &self,
        main_signature: TokenId,
        tokens: &TokenRegistry,
    ) -> Result<bool, Error> {
        let mut used = vec![false; self.signed_elements.len()];
        for id in &self.tokens {
            let token = tokens.get(*id)?;
            if !token.usages.iter().any(|u| u.name().starts_with("Signed")) {
                continue;
            }
            let token_path = token.element_path.as_deref().unwrap_or_default();
            let found = self.signed_elements.iter().enumerate().position(|(i, e)| {
                !used[i]
                    && tokens.effective_signature_token(e.signer) == main_signature
                    && path_matches(&e.path, token_path, true, false)
            });
            match found {
                Some(i) => used[i] = true,
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

fn is_signature_token(token: &SecurityToken) -> bool {
    token
        .usages
        .iter()
        .any(|u| u.name().contains("Signature") || u.name().contains("Endorsing"))
}

fn is_endorsing_token(token: &SecurityToken) -> bool {
    token.usages.iter().any(|u| u.name().contains("Endorsing"))
}

impl Assertable for TokenProtectionAssertionState {
    fn event_kinds(&self) -> &[EventKind] {
        if self.protect_tokens {
            &PROTECT_TOKENS_KINDS
        } else {
            &[]
        }
    }

    fn assert_event(
        &mut self,
        event: &SecurityEvent,
        tokens: &TokenRegistry,
    ) -> Result<Outcome, Error> {
        if !self.protect_tokens {
            return Ok(Outcome::Pass);
        }
        match event {
            SecurityEvent::Token(t) => {
                if !self.tokens.contains(&t.token) {
                    self.tokens.push(t.token);
                }
            }
            SecurityEvent::SignedElement(e) => {
                if e.protected {
                    self.signed_elements.push(SignedElement {
                        signer: e.token,
                        path: e.element_path.clone(),
                    });
                }
            }
            SecurityEvent::Operation(_) => {
                debug!(
                    tokens = self.tokens.len(),
                    signed_elements = self.signed_elements.len(),
                    "verifying token protection"
                );
                if let Some(message) = self.verify(tokens)? {
                    self.state.set_asserted(false);
                    self.state.set_error_message(message.clone());
                    return Ok(Outcome::Fatal(message));
                }
            }
            other => {
                return Err(Error::UnexpectedEvent(format!(
                    "token protection does not handle {} events",
                    other.kind()
                )))
            }
        }
        Ok(Outcome::Pass)
    }

    fn state(&self) -> &AssertionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssertionState {
        &mut self.state
    }
}
