#![forbid(unsafe_code)]

//! Token arena with the key-wrapping graph.

use crate::token::{SecurityToken, TokenType, TokenUsage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use wsspolicy_core::Error;

/// Stable handle of a token inside a [`TokenRegistry`].
///
/// Two handles are equal iff they name the same token; the engine uses this
/// as token identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(usize);

impl TokenId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

/// Owns every security token seen while processing one message.
#[derive(Debug, Default, Clone)]
pub struct TokenRegistry {
    tokens: Vec<SecurityToken>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Add a token and return its handle.
    pub fn insert(&mut self, token: SecurityToken) -> TokenId {
        self.tokens.push(token);
        TokenId(self.tokens.len() - 1)
    }

    pub fn get(&self, id: TokenId) -> Result<&SecurityToken, Error> {
        self.tokens
            .get(id.0)
            .ok_or_else(|| Error::UnknownToken(id.to_string()))
    }

    pub fn get_mut(&mut self, id: TokenId) -> Result<&mut SecurityToken, Error> {
        self.tokens
            .get_mut(id.0)
            .ok_or_else(|| Error::UnknownToken(id.to_string()))
    }

    /// Record that `wrapper` wraps `wrapped` (e.g. an encrypted key wrapping
    /// the derived keys computed from it).
    pub fn wrap(&mut self, wrapper: TokenId, wrapped: TokenId) -> Result<(), Error> {
        self.get(wrapped)?;
        let outer = self.get_mut(wrapper)?;
        if !outer.wrapped_tokens.contains(&wrapped) {
            outer.wrapped_tokens.push(wrapped);
        }
        self.get_mut(wrapped)?.key_wrapping_token = Some(wrapper);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterator over all tokens with their handles, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &SecurityToken)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (TokenId(i), t))
    }

    /// True if the token is a derived key, or if it wraps tokens and every
    /// wrapped token (recursively) has derived keys.
    pub fn has_derived_keys(&self, id: TokenId) -> bool {
        let mut visiting = HashSet::new();
        self.has_derived_keys_inner(id, &mut visiting)
    }

    fn has_derived_keys_inner(&self, id: TokenId, visiting: &mut HashSet<TokenId>) -> bool {
        let Some(token) = self.tokens.get(id.0) else {
            return false;
        };
        if token.token_type == TokenType::DerivedKeyToken {
            return true;
        }
        if token.wrapped_tokens.is_empty() || !visiting.insert(id) {
            return false;
        }
        let all_derived = token
            .wrapped_tokens
            .iter()
            .all(|w| self.has_derived_keys_inner(*w, visiting));
        visiting.remove(&id);
        all_derived
    }

    /// Walk key-wrapping edges up to the outermost token.
    pub fn root_token(&self, id: TokenId) -> TokenId {
        let mut current = id;
        let mut steps = 0;
        while let Some(parent) = self
            .tokens
            .get(current.0)
            .and_then(|t| t.key_wrapping_token)
        {
            steps += 1;
            if steps > self.tokens.len() {
                break;
            }
            current = parent;
        }
        current
    }

    /// The token that actually produced a signature: the root's wrapped
    /// token carrying a `Signature` usage, else the root itself.
    pub fn effective_signature_token(&self, id: TokenId) -> TokenId {
        let root = self.root_token(id);
        if let Some(token) = self.tokens.get(root.0) {
            for wrapped in &token.wrapped_tokens {
                if let Some(w) = self.tokens.get(wrapped.0) {
                    if w.has_usage(TokenUsage::Signature) {
                        return *wrapped;
                    }
                }
            }
        }
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derived_key_token() {
        let mut reg = TokenRegistry::new();
        let dk = reg.insert(SecurityToken::new(TokenType::DerivedKeyToken));
        assert!(reg.has_derived_keys(dk));
    }

    #[test]
    fn test_plain_token_without_wrapped_tokens() {
        let mut reg = TokenRegistry::new();
        let x509 = reg.insert(SecurityToken::new(TokenType::X509V3Token));
        assert!(!reg.has_derived_keys(x509));
    }

    #[test]
    fn test_all_wrapped_tokens_derived() {
        let mut reg = TokenRegistry::new();
        let ek = reg.insert(SecurityToken::new(TokenType::EncryptedKeyToken));
        let dk1 = reg.insert(SecurityToken::new(TokenType::DerivedKeyToken));
        let dk2 = reg.insert(SecurityToken::new(TokenType::DerivedKeyToken));
        reg.wrap(ek, dk1).unwrap();
        reg.wrap(ek, dk2).unwrap();
        assert!(reg.has_derived_keys(ek));
    }

    #[test]
    fn test_one_wrapped_token_not_derived() {
        let mut reg = TokenRegistry::new();
        let ek = reg.insert(SecurityToken::new(TokenType::EncryptedKeyToken));
        let dk = reg.insert(SecurityToken::new(TokenType::DerivedKeyToken));
        let x509 = reg.insert(SecurityToken::new(TokenType::X509V3Token));
        reg.wrap(ek, dk).unwrap();
        reg.wrap(ek, x509).unwrap();
        assert!(!reg.has_derived_keys(ek));
    }

    #[test]
    fn test_wrapping_cycle_terminates() {
        let mut reg = TokenRegistry::new();
        let a = reg.insert(SecurityToken::new(TokenType::EncryptedKeyToken));
        let b = reg.insert(SecurityToken::new(TokenType::EncryptedKeyToken));
        reg.wrap(a, b).unwrap();
        reg.wrap(b, a).unwrap();
        assert!(!reg.has_derived_keys(a));
        let _ = reg.root_token(a);
    }

    #[test]
    fn test_effective_signature_token() {
        let mut reg = TokenRegistry::new();
        let ek = reg.insert(SecurityToken::new(TokenType::EncryptedKeyToken));
        let dk = reg.insert(
            SecurityToken::new(TokenType::DerivedKeyToken).with_usage(TokenUsage::Signature),
        );
        reg.wrap(ek, dk).unwrap();
        assert_eq!(reg.root_token(dk), ek);
        assert_eq!(reg.effective_signature_token(dk), dk);
        assert_eq!(reg.effective_signature_token(ek), dk);

        let lone = reg.insert(SecurityToken::new(TokenType::X509V3Token));
        assert_eq!(reg.effective_signature_token(lone), lone);
    }

    #[test]
    fn test_wrap_unknown_token() {
        let mut reg = TokenRegistry::new();
        let a = reg.insert(SecurityToken::new(TokenType::X509V3Token));
        let mut other = TokenRegistry::new();
        other.insert(SecurityToken::new(TokenType::X509V3Token));
        let b = other.insert(SecurityToken::new(TokenType::X509V3Token));
        assert!(matches!(reg.wrap(a, b), Err(Error::UnknownToken(_))));
    }

    proptest! {
        #[test]
        fn prop_derived_iff_all_leaves_derived(flags in proptest::collection::vec(any::<bool>(), 1..8)) {
            let mut reg = TokenRegistry::new();
            let root = reg.insert(SecurityToken::new(TokenType::EncryptedKeyToken));
            for derived in &flags {
                let ty = if *derived { TokenType::DerivedKeyToken } else { TokenType::X509V3Token };
                let child = reg.insert(SecurityToken::new(ty));
                reg.wrap(root, child).unwrap();
            }
            prop_assert_eq!(reg.has_derived_keys(root), flags.iter().all(|d| *d));
        }
    }
}
