#![forbid(unsafe_code)]

//! KeyValueToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::KeyValueTokenPolicy;
use wsspolicy_token::event::KeyValueType;
use wsspolicy_token::TokenDetails;

pub(crate) fn assert_token(
    policy: &KeyValueTokenPolicy,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::KeyValue(kv) = details else {
        return Err(unexpected_details("KeyValueTokenSecurityEvent", details));
    };
    if policy.rsa_key_value && kv.key_type != KeyValueType::Rsa {
        return Ok(TokenCheck::Fail(format!(
            "Policy enforces that a RsaKeyValue must be present in the KeyValueToken but we got a {}",
            kv.key_type.name()
        )));
    }
    Ok(TokenCheck::Pass)
}
