#![forbid(unsafe_code)]

//! SecurityContextToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::SecurityContextTokenPolicy;
use wsspolicy_model::TokenPolicy;
use wsspolicy_token::{KeyIdentifier, SecurityToken, TokenDetails};

pub(crate) fn assert_token(
    policy: &SecurityContextTokenPolicy,
    token_policy: &TokenPolicy,
    token: &SecurityToken,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::SecurityContext(sct) = details else {
        return Err(unexpected_details("SecurityContextTokenSecurityEvent", details));
    };
    if let Some(issuer) = token_policy.issuer_name.as_deref() {
        let actual = sct.issuer_name.as_deref().unwrap_or_default();
        if issuer != actual {
            return Ok(TokenCheck::Fail(format!(
                "IssuerName in Policy ({issuer}) didn't match with the one in the SecurityContextToken ({actual})"
            )));
        }
    }
    if policy.require_external_uri_reference
        && !sct.external
        && token.key_identifier != Some(KeyIdentifier::ExternalUriReference)
    {
        return Ok(TokenCheck::Fail("Policy enforces ExternalUriReference".into()));
    }
    Ok(TokenCheck::Pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsspolicy_model::{TokenKind, TokenRole};
    use wsspolicy_token::event::SecurityContextTokenDetails;
    use wsspolicy_token::TokenType;

    #[test]
    fn test_external_uri_reference() {
        let tp = TokenPolicy::new(
            TokenRole::ProtectionToken,
            TokenKind::SecurityContext(SecurityContextTokenPolicy::default()),
        );
        let policy = SecurityContextTokenPolicy {
            require_external_uri_reference: true,
        };
        let token = SecurityToken::new(TokenType::SecurityContextToken);
        let inline = TokenDetails::SecurityContext(SecurityContextTokenDetails {
            issuer_name: None,
            external: false,
        });
        assert_eq!(
            assert_token(&policy, &tp, &token, &inline).unwrap(),
            TokenCheck::Fail("Policy enforces ExternalUriReference".into())
        );
        let external = TokenDetails::SecurityContext(SecurityContextTokenDetails {
            issuer_name: None,
            external: true,
        });
        assert_eq!(
            assert_token(&policy, &tp, &token, &external).unwrap(),
            TokenCheck::Pass
        );
        let by_reference = token.with_key_identifier(KeyIdentifier::ExternalUriReference);
        assert_eq!(
            assert_token(&policy, &tp, &by_reference, &inline).unwrap(),
            TokenCheck::Pass
        );
    }
}
