#![forbid(unsafe_code)]

//! HttpsToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::{HttpAuthenticationType, HttpsTokenPolicy};
use wsspolicy_token::event::HttpAuthentication;
use wsspolicy_token::TokenDetails;

pub(crate) fn assert_token(
    policy: &HttpsTokenPolicy,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::Https(https) = details else {
        return Err(unexpected_details("HttpsTokenSecurityEvent", details));
    };
    if policy.require_client_certificate && !https.client_certificate {
        return Ok(TokenCheck::Fail("Policy enforces HTTPClientCertificate".into()));
    }
    match (policy.authentication, https.authentication) {
        (Some(HttpAuthenticationType::HttpBasicAuthentication), HttpAuthentication::Basic)
        | (Some(HttpAuthenticationType::HttpDigestAuthentication), HttpAuthentication::Digest)
        | (None, _) => {}
        (Some(required), actual) => {
            return Ok(TokenCheck::Fail(format!(
                "Policy enforces {required:?} but we got {actual:?}"
            )));
        }
    }
    Ok(TokenCheck::Pass)
}
