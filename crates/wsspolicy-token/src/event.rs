#![forbid(unsafe_code)]

//! Security events.
//!
//! Every event records a fact that an external validator has already
//! established: a token was found, an element was (or was not) signed or
//! encrypted, the SOAP operation is known. Events are immutable values and
//! carry token handles, never token data.

use crate::registry::TokenId;
use serde::{Deserialize, Serialize};
use wsspolicy_core::{ns, ElementPath, QName};

/// The kind of a [`SecurityEvent`], used to route it to interested states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    UsernameToken,
    X509Token,
    SamlToken,
    KeyValueToken,
    KerberosToken,
    IssuedToken,
    SecurityContextToken,
    HttpsToken,
    SignedElement,
    EncryptedElement,
    RequiredElement,
    Operation,
}

impl EventKind {
    /// Every token-found event kind.
    pub const TOKENS: [EventKind; 8] = [
        Self::UsernameToken,
        Self::X509Token,
        Self::SamlToken,
        Self::KeyValueToken,
        Self::KerberosToken,
        Self::IssuedToken,
        Self::SecurityContextToken,
        Self::HttpsToken,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::UsernameToken => "UsernameToken",
            Self::X509Token => "X509Token",
            Self::SamlToken => "SamlToken",
            Self::KeyValueToken => "KeyValueToken",
            Self::KerberosToken => "KerberosToken",
            Self::IssuedToken => "IssuedToken",
            Self::SecurityContextToken => "SecurityContextToken",
            Self::HttpsToken => "HttpsToken",
            Self::SignedElement => "SignedElement",
            Self::EncryptedElement => "EncryptedElement",
            Self::RequiredElement => "RequiredElement",
            Self::Operation => "Operation",
        }
    }

    pub fn is_token(&self) -> bool {
        Self::TOKENS.contains(self)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Token details ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordType {
    None,
    Digest,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsernameTokenProfile {
    V10,
    V11,
}

impl UsernameTokenProfile {
    /// Map a profile namespace URI to the profile version.
    pub fn from_namespace(uri: &str) -> Option<Self> {
        match uri {
            ns::USERNAMETOKEN_PROFILE10 => Some(Self::V10),
            ns::USERNAMETOKEN_PROFILE11 => Some(Self::V11),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameTokenDetails {
    pub password_type: PasswordType,
    /// `wsu:Created` value, if present.
    pub created: Option<String>,
    /// Base64 `wsse:Nonce`, if present.
    pub nonce: Option<String>,
    pub profile: Option<UsernameTokenProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct X509TokenDetails {
    /// Issuer distinguished name of the certificate.
    pub issuer_name: Option<String>,
    /// X.509 certificate version (1 or 3).
    pub version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamlVersion {
    V10,
    V11,
    V20,
}

impl std::fmt::Display for SamlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::V10 => "1.0",
            Self::V11 => "1.1",
            Self::V20 => "2.0",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlTokenDetails {
    pub issuer_name: Option<String>,
    pub version: SamlVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyValueType {
    Rsa,
    Dsa,
    Ec,
}

impl KeyValueType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rsa => "RsaKeyValue",
            Self::Dsa => "DsaKeyValue",
            Self::Ec => "ECKeyValue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueTokenDetails {
    pub key_type: KeyValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KerberosTicketType {
    KerberosV5ApReq,
    GssKerberosV5ApReq,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerberosTokenDetails {
    pub issuer_name: Option<String>,
    pub ticket_type: KerberosTicketType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokenDetails {
    /// Address of the issuing STS.
    pub issuer: Option<String>,
    /// Token type URI of the issued token.
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContextTokenDetails {
    pub issuer_name: Option<String>,
    /// Referenced through an external URI rather than included inline.
    pub external: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpAuthentication {
    None,
    Basic,
    Digest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpsTokenDetails {
    pub client_certificate: bool,
    pub authentication: HttpAuthentication,
}

/// Token-kind specific facts decoded from the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenDetails {
    Username(UsernameTokenDetails),
    X509(X509TokenDetails),
    Saml(SamlTokenDetails),
    KeyValue(KeyValueTokenDetails),
    Kerberos(KerberosTokenDetails),
    Issued(IssuedTokenDetails),
    SecurityContext(SecurityContextTokenDetails),
    Https(HttpsTokenDetails),
}

impl TokenDetails {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Username(_) => EventKind::UsernameToken,
            Self::X509(_) => EventKind::X509Token,
            Self::Saml(_) => EventKind::SamlToken,
            Self::KeyValue(_) => EventKind::KeyValueToken,
            Self::Kerberos(_) => EventKind::KerberosToken,
            Self::Issued(_) => EventKind::IssuedToken,
            Self::SecurityContext(_) => EventKind::SecurityContextToken,
            Self::Https(_) => EventKind::HttpsToken,
        }
    }
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEvent {
    pub token: TokenId,
    pub details: TokenDetails,
}

/// Kind of protection applied to an element, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionType {
    Signature,
    Encryption,
}

/// An element that was reported as signed or encrypted (or as lacking it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedElementEvent {
    /// The token that produced the signature or encryption.
    pub token: TokenId,
    pub element_path: ElementPath,
    pub protected: bool,
    #[serde(default)]
    pub protection_order: Vec<ProtectionType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredElementEvent {
    pub element_path: ElementPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub operation: QName,
}

/// A fact discovered while validating a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityEvent {
    Token(TokenEvent),
    SignedElement(ProtectedElementEvent),
    EncryptedElement(ProtectedElementEvent),
    RequiredElement(RequiredElementEvent),
    Operation(OperationEvent),
}

impl SecurityEvent {
    pub fn token(token: TokenId, details: TokenDetails) -> Self {
        Self::Token(TokenEvent { token, details })
    }

    pub fn signed_element(token: TokenId, element_path: ElementPath, signed: bool) -> Self {
        Self::SignedElement(ProtectedElementEvent {
            token,
            element_path,
            protected: signed,
            protection_order: vec![ProtectionType::Signature],
        })
    }

    pub fn encrypted_element(token: TokenId, element_path: ElementPath, encrypted: bool) -> Self {
        Self::EncryptedElement(ProtectedElementEvent {
            token,
            element_path,
            protected: encrypted,
            protection_order: vec![ProtectionType::Encryption],
        })
    }

    pub fn required_element(element_path: ElementPath) -> Self {
        Self::RequiredElement(RequiredElementEvent { element_path })
    }

    pub fn operation(operation: QName) -> Self {
        Self::Operation(OperationEvent { operation })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Token(e) => e.details.kind(),
            Self::SignedElement(_) => EventKind::SignedElement,
            Self::EncryptedElement(_) => EventKind::EncryptedElement,
            Self::RequiredElement(_) => EventKind::RequiredElement,
            Self::Operation(_) => EventKind::Operation,
        }
    }

    /// The token this event is about, if any.
    pub fn token_id(&self) -> Option<TokenId> {
        match self {
            Self::Token(e) => Some(e.token),
            Self::SignedElement(e) | Self::EncryptedElement(e) => Some(e.token),
            Self::RequiredElement(_) | Self::Operation(_) => None,
        }
    }
}
