#![forbid(unsafe_code)]

//! Token assertions (WS-SecurityPolicy 1.3, section 5).

use serde::{Deserialize, Serialize};

/// `sp:IncludeToken` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IncludeTokenType {
    Never,
    Once,
    AlwaysToRecipient,
    AlwaysToInitiator,
    #[default]
    Always,
}

impl IncludeTokenType {
    /// Parse an `IncludeToken` URI of any SP version by its suffix.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let suffix = uri.rsplit_once("/IncludeToken/").map(|(_, s)| s)?;
        match suffix {
            "Never" => Some(Self::Never),
            "Once" => Some(Self::Once),
            "AlwaysToRecipient" => Some(Self::AlwaysToRecipient),
            "AlwaysToInitiator" => Some(Self::AlwaysToInitiator),
            "Always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// Derived key requirements of a token assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivedKeys {
    RequireDerivedKeys,
    RequireExplicitDerivedKeys,
    RequireImpliedDerivedKeys,
}

/// The `*SupportingTokens` assertion family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportingTokenType {
    Supporting,
    Signed,
    Endorsing,
    SignedEndorsing,
    Encrypted,
    SignedEncrypted,
    EndorsingEncrypted,
    SignedEndorsingEncrypted,
}

impl SupportingTokenType {
    /// Local name of the assertion element.
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::Supporting => "SupportingTokens",
            Self::Signed => "SignedSupportingTokens",
            Self::Endorsing => "EndorsingSupportingTokens",
            Self::SignedEndorsing => "SignedEndorsingSupportingTokens",
            Self::Encrypted => "EncryptedSupportingTokens",
            Self::SignedEncrypted => "SignedEncryptedSupportingTokens",
            Self::EndorsingEncrypted => "EndorsingEncryptedSupportingTokens",
            Self::SignedEndorsingEncrypted => "SignedEndorsingEncryptedSupportingTokens",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        [
            Self::Supporting,
            Self::Signed,
            Self::Endorsing,
            Self::SignedEndorsing,
            Self::Encrypted,
            Self::SignedEncrypted,
            Self::EndorsingEncrypted,
            Self::SignedEndorsingEncrypted,
        ]
        .into_iter()
        .find(|t| t.local_name() == name)
    }
}

/// The policy node a token assertion is nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenRole {
    InitiatorToken,
    InitiatorSignatureToken,
    InitiatorEncryptionToken,
    RecipientToken,
    RecipientSignatureToken,
    RecipientEncryptionToken,
    SignatureToken,
    EncryptionToken,
    ProtectionToken,
    TransportToken,
    Supporting(SupportingTokenType),
}

impl TokenRole {
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::InitiatorToken => "InitiatorToken",
            Self::InitiatorSignatureToken => "InitiatorSignatureToken",
            Self::InitiatorEncryptionToken => "InitiatorEncryptionToken",
            Self::RecipientToken => "RecipientToken",
            Self::RecipientSignatureToken => "RecipientSignatureToken",
            Self::RecipientEncryptionToken => "RecipientEncryptionToken",
            Self::SignatureToken => "SignatureToken",
            Self::EncryptionToken => "EncryptionToken",
            Self::ProtectionToken => "ProtectionToken",
            Self::TransportToken => "TransportToken",
            Self::Supporting(t) => t.local_name(),
        }
    }
}

// ── Token kinds ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordRequirement {
    NoPassword,
    HashPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsernameTokenType {
    WssUsernameToken10,
    WssUsernameToken11,
}

/// 5.4.1 UsernameToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsernameTokenPolicy {
    pub password_type: Option<PasswordRequirement>,
    pub created: bool,
    pub nonce: bool,
    pub token_type: Option<UsernameTokenType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum X509TokenType {
    WssX509V1Token11,
    WssX509V3Token10,
    WssX509V3Token11,
    WssX509Pkcs7Token10,
    WssX509Pkcs7Token11,
    WssX509PkiPathV1Token10,
    WssX509PkiPathV1Token11,
}

/// 5.4.3 X509Token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct X509TokenPolicy {
    pub token_type: Option<X509TokenType>,
    pub require_key_identifier_reference: bool,
    pub require_issuer_serial_reference: bool,
    pub require_embedded_token_reference: bool,
    pub require_thumbprint_reference: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamlTokenType {
    WssSamlV10Token10,
    WssSamlV10Token11,
    WssSamlV11Token10,
    WssSamlV11Token11,
    WssSamlV20Token11,
}

impl std::fmt::Display for SamlTokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// 5.4.8 SamlToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlTokenPolicy {
    pub token_type: Option<SamlTokenType>,
    pub require_key_identifier_reference: bool,
}

/// 5.4.11 KeyValueToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValueTokenPolicy {
    pub rsa_key_value: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KerberosTokenType {
    WssKerberosV5ApReqToken11,
    WssGssKerberosV5ApReqToken11,
}

/// 5.4.4 KerberosToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KerberosTokenPolicy {
    pub token_type: Option<KerberosTokenType>,
    pub require_key_identifier_reference: bool,
}

/// 5.4.2 IssuedToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuedTokenPolicy {
    /// `wst:TokenType` from the request security token template.
    pub required_token_type: Option<String>,
}

/// 5.4.6 SecurityContextToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityContextTokenPolicy {
    pub require_external_uri_reference: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpAuthenticationType {
    HttpBasicAuthentication,
    HttpDigestAuthentication,
}

/// 5.4.10 HttpsToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpsTokenPolicy {
    pub require_client_certificate: bool,
    pub authentication: Option<HttpAuthenticationType>,
}

/// Type-specific part of a token assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Username(UsernameTokenPolicy),
    X509(X509TokenPolicy),
    Saml(SamlTokenPolicy),
    KeyValue(KeyValueTokenPolicy),
    Kerberos(KerberosTokenPolicy),
    Issued(IssuedTokenPolicy),
    SecurityContext(SecurityContextTokenPolicy),
    Https(HttpsTokenPolicy),
}

impl TokenKind {
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::Username(_) => "UsernameToken",
            Self::X509(_) => "X509Token",
            Self::Saml(_) => "SamlToken",
            Self::KeyValue(_) => "KeyValueToken",
            Self::Kerberos(_) => "KerberosToken",
            Self::Issued(_) => "IssuedToken",
            Self::SecurityContext(_) => "SecurityContextToken",
            Self::Https(_) => "HttpsToken",
        }
    }
}

/// A token assertion together with the properties common to all tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPolicy {
    pub role: TokenRole,
    #[serde(default)]
    pub include_token: IncludeTokenType,
    #[serde(default)]
    pub derived_keys: Option<DerivedKeys>,
    #[serde(default)]
    pub issuer_name: Option<String>,
    pub kind: TokenKind,
}

impl TokenPolicy {
    pub fn new(role: TokenRole, kind: TokenKind) -> Self {
        Self {
            role,
            include_token: IncludeTokenType::default(),
            derived_keys: None,
            issuer_name: None,
            kind,
        }
    }

    pub fn with_include_token(mut self, include_token: IncludeTokenType) -> Self {
        self.include_token = include_token;
        self
    }

    pub fn with_derived_keys(mut self, derived_keys: DerivedKeys) -> Self {
        self.derived_keys = Some(derived_keys);
        self
    }

    pub fn with_issuer_name(mut self, issuer_name: impl Into<String>) -> Self {
        self.issuer_name = Some(issuer_name.into());
        self
    }

    /// `Role/Kind`, e.g. `SignedSupportingTokens/UsernameToken`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.role.local_name(), self.kind.local_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_token_from_uri() {
        assert_eq!(
            IncludeTokenType::from_uri(
                "http://docs.oasis-open.org/ws-sx/ws-securitypolicy/200702/IncludeToken/AlwaysToRecipient"
            ),
            Some(IncludeTokenType::AlwaysToRecipient)
        );
        assert_eq!(
            IncludeTokenType::from_uri(
                "http://schemas.xmlsoap.org/ws/2005/07/securitypolicy/IncludeToken/Always"
            ),
            Some(IncludeTokenType::Always)
        );
        assert_eq!(IncludeTokenType::from_uri("urn:nothing"), None);
    }

    #[test]
    fn test_supporting_token_names_roundtrip() {
        let t = SupportingTokenType::from_local_name("SignedEndorsingEncryptedSupportingTokens");
        assert_eq!(t, Some(SupportingTokenType::SignedEndorsingEncrypted));
        assert_eq!(SupportingTokenType::from_local_name("Tokens"), None);
    }

    #[test]
    fn test_token_policy_from_json() {
        let json = r#"{
            "role": {"Supporting": "Signed"},
            "include_token": "AlwaysToRecipient",
            "kind": {"Username": {"password_type": "HashPassword"}}
        }"#;
        let policy: TokenPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.role, TokenRole::Supporting(SupportingTokenType::Signed));
        assert_eq!(policy.derived_keys, None);
        assert_eq!(policy.name(), "SignedSupportingTokens/UsernameToken");
        match policy.kind {
            TokenKind::Username(u) => {
                assert_eq!(u.password_type, Some(PasswordRequirement::HashPassword));
                assert!(!u.created);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
