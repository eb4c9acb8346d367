#![forbid(unsafe_code)]

//! UsernameToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::{PasswordRequirement, UsernameTokenPolicy, UsernameTokenType};
use wsspolicy_token::event::{PasswordType, UsernameTokenProfile};
use wsspolicy_token::TokenDetails;

pub(crate) fn assert_token(
    policy: &UsernameTokenPolicy,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::Username(ut) = details else {
        return Err(unexpected_details("UsernameTokenSecurityEvent", details));
    };
    match policy.password_type {
        Some(PasswordRequirement::NoPassword) if ut.password_type != PasswordType::None => {
            return Ok(TokenCheck::Fail(
                "UsernameToken contains a password but the policy prohibits it".into(),
            ));
        }
        Some(PasswordRequirement::HashPassword) if ut.password_type != PasswordType::Digest => {
            return Ok(TokenCheck::Fail(
                "UsernameToken does not contain a hashed password".into(),
            ));
        }
        None if ut.password_type == PasswordType::None => {
            return Ok(TokenCheck::Fail("UsernameToken must contain a password".into()));
        }
        _ => {}
    }

    // Created and Nonce are only meaningful next to a plain text password.
    if policy.created && (ut.created.is_none() || ut.password_type != PasswordType::Text) {
        return Ok(TokenCheck::Fail(
            "UsernameToken does not contain a created timestamp or password is not plain text"
                .into(),
        ));
    }
    if policy.nonce && (ut.nonce.is_none() || ut.password_type != PasswordType::Text) {
        return Ok(TokenCheck::Fail(
            "UsernameToken does not contain a nonce or password is not plain text".into(),
        ));
    }

    if let (Some(required), Some(profile)) = (policy.token_type, ut.profile) {
        match (required, profile) {
            (UsernameTokenType::WssUsernameToken10, UsernameTokenProfile::V11) => {
                return Ok(TokenCheck::Fail(
                    "Policy enforces UsernameToken profile 1.0 but we got 1.1".into(),
                ));
            }
            (UsernameTokenType::WssUsernameToken11, UsernameTokenProfile::V10) => {
                return Ok(TokenCheck::Fail(
                    "Policy enforces UsernameToken profile 1.1 but we got 1.0".into(),
                ));
            }
            _ => {}
        }
    }
    Ok(TokenCheck::Pass)
}
