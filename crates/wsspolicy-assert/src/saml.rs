#![forbid(unsafe_code)]

//! SamlToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::{SamlTokenPolicy, SamlTokenType};
use wsspolicy_model::TokenPolicy;
use wsspolicy_token::event::SamlVersion;
use wsspolicy_token::{KeyIdentifier, SecurityToken, TokenDetails};

pub(crate) fn assert_token(
    policy: &SamlTokenPolicy,
    token_policy: &TokenPolicy,
    token: &SecurityToken,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::Saml(saml) = details else {
        return Err(unexpected_details("SamlTokenSecurityEvent", details));
    };
    if let Some(issuer) = token_policy.issuer_name.as_deref() {
        let actual = saml.issuer_name.as_deref().unwrap_or_default();
        if issuer != actual {
            return Ok(TokenCheck::Fail(format!(
                "IssuerName in Policy ({issuer}) didn't match with the one in the SamlToken ({actual})"
            )));
        }
    }
    if policy.require_key_identifier_reference
        && token.key_identifier != Some(KeyIdentifier::X509KeyIdentifier)
    {
        return Ok(TokenCheck::Fail(format!(
            "Policy enforces KeyIdentifierReference but we got {}",
            token.token_type
        )));
    }
    if let Some(required) = policy.token_type {
        // the 1.0 token profile carries SAML 1.0 assertions
        let expected = match required {
            SamlTokenType::WssSamlV11Token10 => SamlVersion::V10,
            SamlTokenType::WssSamlV11Token11 => SamlVersion::V11,
            SamlTokenType::WssSamlV20Token11 => SamlVersion::V20,
            SamlTokenType::WssSamlV10Token10 | SamlTokenType::WssSamlV10Token11 => {
                return Ok(TokenCheck::Fail(format!("Unsupported token type: {required}")));
            }
        };
        if saml.version != expected {
            return Ok(TokenCheck::Fail(format!(
                "Policy enforces {} but we got {}",
                profile_name(required),
                saml.version
            )));
        }
    }
    Ok(TokenCheck::Pass)
}

fn profile_name(token_type: SamlTokenType) -> &'static str {
    match token_type {
        SamlTokenType::WssSamlV10Token10 => "SamlVersion10Profile10",
        SamlTokenType::WssSamlV10Token11 => "SamlVersion10Profile11",
        SamlTokenType::WssSamlV11Token10 => "SamlVersion11Profile10",
        SamlTokenType::WssSamlV11Token11 => "SamlVersion11Profile11",
        SamlTokenType::WssSamlV20Token11 => "SamlVersion20Profile11",
    }
}
