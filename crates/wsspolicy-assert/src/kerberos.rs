#![forbid(unsafe_code)]

//! KerberosToken property checks.

use crate::token::{unexpected_details, TokenCheck};
use crate::x509::key_identifier_name;
use wsspolicy_core::Error;
use wsspolicy_model::token::{KerberosTokenPolicy, KerberosTokenType};
use wsspolicy_model::TokenPolicy;
use wsspolicy_token::event::KerberosTicketType;
use wsspolicy_token::{KeyIdentifier, SecurityToken, TokenDetails};

pub(crate) fn assert_token(
    policy: &KerberosTokenPolicy,
    token_policy: &TokenPolicy,
    token: &SecurityToken,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::Kerberos(ticket) = details else {
        return Err(unexpected_details("KerberosTokenSecurityEvent", details));
    };
    if let Some(issuer) = token_policy.issuer_name.as_deref() {
        let actual = ticket.issuer_name.as_deref().unwrap_or_default();
        if issuer != actual {
            return Ok(TokenCheck::Fail(format!(
                "IssuerName in Policy ({issuer}) didn't match with the one in the KerberosToken ({actual})"
            )));
        }
    }
    if policy.require_key_identifier_reference
        && token.key_identifier != Some(KeyIdentifier::KerberosSha1Identifier)
    {
        return Ok(TokenCheck::Fail(format!(
            "Policy enforces KeyIdentifierReference but we got {}",
            key_identifier_name(token.key_identifier)
        )));
    }
    if let Some(required) = policy.token_type {
        let expected = match required {
            KerberosTokenType::WssKerberosV5ApReqToken11 => KerberosTicketType::KerberosV5ApReq,
            KerberosTokenType::WssGssKerberosV5ApReqToken11 => {
                KerberosTicketType::GssKerberosV5ApReq
            }
        };
        if ticket.ticket_type != expected {
            return Ok(TokenCheck::Fail(format!(
                "Policy enforces {required:?} but we got {:?}",
                ticket.ticket_type
            )));
        }
    }
    Ok(TokenCheck::Pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsspolicy_model::{TokenKind, TokenRole};
    use wsspolicy_token::event::KerberosTokenDetails;
    use wsspolicy_token::TokenType;

    #[test]
    fn test_ticket_type_and_key_identifier() {
        let tp = TokenPolicy::new(
            TokenRole::ProtectionToken,
            TokenKind::Kerberos(KerberosTokenPolicy::default()),
        );
        let policy = KerberosTokenPolicy {
            token_type: Some(KerberosTokenType::WssGssKerberosV5ApReqToken11),
            require_key_identifier_reference: true,
        };
        let token = SecurityToken::new(TokenType::KerberosToken)
            .with_key_identifier(KeyIdentifier::KerberosSha1Identifier);
        let gss = TokenDetails::Kerberos(KerberosTokenDetails {
            issuer_name: None,
            ticket_type: KerberosTicketType::GssKerberosV5ApReq,
        });
        assert_eq!(assert_token(&policy, &tp, &token, &gss).unwrap(), TokenCheck::Pass);

        let plain = TokenDetails::Kerberos(KerberosTokenDetails {
            issuer_name: None,
            ticket_type: KerberosTicketType::KerberosV5ApReq,
        });
        assert_eq!(
            assert_token(&policy, &tp, &token, &plain).unwrap(),
            TokenCheck::Fail(
                "Policy enforces WssGssKerberosV5ApReqToken11 but we got KerberosV5ApReq".into()
            )
        );

        let direct = SecurityToken::new(TokenType::KerberosToken)
            .with_key_identifier(KeyIdentifier::SecurityTokenDirectReference);
        assert_eq!(
            assert_token(&policy, &tp, &direct, &gss).unwrap(),
            TokenCheck::Fail(
                "Policy enforces KeyIdentifierReference but we got SecurityTokenDirectReference"
                    .into()
            )
        );
    }
}
