#![forbid(unsafe_code)]

//! X509Token property checks.

use crate::token::{unexpected_details, TokenCheck};
use wsspolicy_core::Error;
use wsspolicy_model::token::{X509TokenPolicy, X509TokenType};
use wsspolicy_model::TokenPolicy;
use wsspolicy_token::{KeyIdentifier, SecurityToken, TokenDetails, TokenType};

pub(crate) fn assert_token(
    policy: &X509TokenPolicy,
    token_policy: &TokenPolicy,
    token: &SecurityToken,
    details: &TokenDetails,
) -> Result<TokenCheck, Error> {
    let TokenDetails::X509(cert) = details else {
        return Err(unexpected_details("X509TokenSecurityEvent", details));
    };
    if !token.token_type.is_x509() {
        return Err(Error::UnexpectedEvent(format!(
            "Expected a X509 token but got {}",
            token.token_type
        )));
    }
    if let Some(issuer) = token_policy.issuer_name.as_deref() {
        let actual = cert.issuer_name.as_deref().unwrap_or_default();
        if issuer != actual {
            return Ok(TokenCheck::Fail(format!(
                "IssuerName in Policy ({issuer}) didn't match with the one in the certificate ({actual})"
            )));
        }
    }

    let key_identifier_requirements = [
        (
            policy.require_key_identifier_reference,
            KeyIdentifier::X509KeyIdentifier,
            "KeyIdentifierReference",
        ),
        (
            policy.require_issuer_serial_reference,
            KeyIdentifier::IssuerSerial,
            "IssuerSerialReference",
        ),
        (
            policy.require_thumbprint_reference,
            KeyIdentifier::ThumbprintIdentifier,
            "ThumbprintReference",
        ),
        (
            policy.require_embedded_token_reference,
            KeyIdentifier::SecurityTokenDirectReference,
            "EmbeddedTokenReference",
        ),
    ];
    for (required, expected, name) in key_identifier_requirements {
        if required && token.key_identifier != Some(expected) {
            return Ok(TokenCheck::Fail(format!(
                "Policy enforces {name} but we got {}",
                key_identifier_name(token.key_identifier)
            )));
        }
    }

    if let Some(required) = policy.token_type {
        match required {
            X509TokenType::WssX509V1Token11 => {
                if token.token_type != TokenType::X509V1Token || cert.version != 1 {
                    return Ok(TokenCheck::Fail(format!(
                        "X509Certificate Version {} mismatch; Policy enforces {required:?}",
                        cert.version
                    )));
                }
            }
            X509TokenType::WssX509V3Token10 | X509TokenType::WssX509V3Token11 => {
                if token.token_type != TokenType::X509V3Token && cert.version != 3 {
                    return Ok(TokenCheck::Fail(format!(
                        "X509Certificate Version {} mismatch; Policy enforces {required:?}",
                        cert.version
                    )));
                }
            }
            X509TokenType::WssX509Pkcs7Token10 | X509TokenType::WssX509Pkcs7Token11 => {
                if token.token_type != TokenType::X509Pkcs7Token {
                    return Ok(TokenCheck::Fail(format!(
                        "Unsupported token type: {}",
                        token.token_type
                    )));
                }
            }
            X509TokenType::WssX509PkiPathV1Token10 | X509TokenType::WssX509PkiPathV1Token11 => {
                if token.token_type != TokenType::X509PkiPathV1Token {
                    return Ok(TokenCheck::Fail(format!(
                        "Unsupported token type: {}",
                        token.token_type
                    )));
                }
            }
        }
    }
    Ok(TokenCheck::Pass)
}

pub(crate) fn key_identifier_name(key_identifier: Option<KeyIdentifier>) -> String {
    match key_identifier {
        Some(k) => format!("{k:?}"),
        None => "no key identifier".into(),
    }
}
