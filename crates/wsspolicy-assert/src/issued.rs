#![forbid(unsafe_code)]

//! IssuedToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::IssuedTokenPolicy;
use wsspolicy_model::TokenPolicy;
use wsspolicy_token::TokenDetails;

pub(crate) fn assert_token(
    policy: &IssuedTokenPolicy,
    token_policy: &TokenPolicy,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::Issued(issued) = details else {
        return Err(unexpected_details("IssuedTokenSecurityEvent", details));
    };
    if let Some(issuer) = token_policy.issuer_name.as_deref() {
        let actual = issued.issuer.as_deref().unwrap_or_default();
        if issuer != actual {
            return Ok(TokenCheck::Fail(format!(
                "IssuerName in Policy ({issuer}) didn't match with the one in the IssuedToken ({actual})"
            )));
        }
    }
    if let Some(required) = policy.required_token_type.as_deref() {
        if issued.token_type.as_deref() != Some(required) {
            return Ok(TokenCheck::Fail(format!(
                "Policy enforces token type {required} but we got {}",
                issued.token_type.as_deref().unwrap_or("none")
            )));
        }
    }
    Ok(TokenCheck::Pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsspolicy_model::{SupportingTokenType, TokenKind, TokenRole};
    use wsspolicy_token::event::IssuedTokenDetails;

    const SAML2: &str = "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLV2.0";

    #[test]
    fn test_required_token_type() {
        let tp = TokenPolicy::new(
            TokenRole::Supporting(SupportingTokenType::Endorsing),
            TokenKind::Issued(IssuedTokenPolicy::default()),
        )
        .with_issuer_name("https://sts.example.com");
        let policy = IssuedTokenPolicy {
            required_token_type: Some(SAML2.into()),
        };
        let ok = TokenDetails::Issued(IssuedTokenDetails {
            issuer: Some("https://sts.example.com".into()),
            token_type: Some(SAML2.into()),
        });
        assert_eq!(assert_token(&policy, &tp, &ok).unwrap(), TokenCheck::Pass);

        let untyped = TokenDetails::Issued(IssuedTokenDetails {
            issuer: Some("https://sts.example.com".into()),
            token_type: None,
        });
        assert_eq!(
            assert_token(&policy, &tp, &untyped).unwrap(),
            TokenCheck::Fail(format!("Policy enforces token type {SAML2} but we got none"))
        );
    }
}
