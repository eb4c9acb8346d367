#![forbid(unsafe_code)]

//! Security token model.

use crate::registry::TokenId;
use serde::{Deserialize, Serialize};
use wsspolicy_core::ElementPath;

/// Concrete token types discovered in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    UsernameToken,
    X509V1Token,
    X509V3Token,
    X509Pkcs7Token,
    X509PkiPathV1Token,
    KeyValueToken,
    DerivedKeyToken,
    EncryptedKeyToken,
    Saml10Token,
    Saml11Token,
    Saml20Token,
    KerberosToken,
    SecurityContextToken,
    IssuedToken,
    HttpsToken,
}

impl TokenType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UsernameToken => "UsernameToken",
            Self::X509V1Token => "X509V1Token",
            Self::X509V3Token => "X509V3Token",
            Self::X509Pkcs7Token => "X509Pkcs7Token",
            Self::X509PkiPathV1Token => "X509PkiPathV1Token",
            Self::KeyValueToken => "KeyValueToken",
            Self::DerivedKeyToken => "DerivedKeyToken",
            Self::EncryptedKeyToken => "EncryptedKeyToken",
            Self::Saml10Token => "Saml10Token",
            Self::Saml11Token => "Saml11Token",
            Self::Saml20Token => "Saml20Token",
            Self::KerberosToken => "KerberosToken",
            Self::SecurityContextToken => "SecurityContextToken",
            Self::IssuedToken => "IssuedToken",
            Self::HttpsToken => "HttpsToken",
        }
    }

    pub fn is_x509(&self) -> bool {
        matches!(
            self,
            Self::X509V1Token | Self::X509V3Token | Self::X509Pkcs7Token | Self::X509PkiPathV1Token
        )
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The role a token plays in a message. A token may have several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenUsage {
    /// Generic signing key, below the level of a policy role.
    Signature,
    /// Generic encryption key, below the level of a policy role.
    Encryption,
    MainSignature,
    MainEncryption,
    SupportingTokens,
    SignedSupportingTokens,
    EndorsingSupportingTokens,
    SignedEndorsingSupportingTokens,
    EncryptedSupportingTokens,
    SignedEncryptedSupportingTokens,
    EndorsingEncryptedSupportingTokens,
    SignedEndorsingEncryptedSupportingTokens,
}

impl TokenUsage {
    pub const ALL: [TokenUsage; 12] = [
        Self::Signature,
        Self::Encryption,
        Self::MainSignature,
        Self::MainEncryption,
        Self::SupportingTokens,
        Self::SignedSupportingTokens,
        Self::SignedEndorsingSupportingTokens,
        Self::SignedEncryptedSupportingTokens,
        Self::SignedEndorsingEncryptedSupportingTokens,
        Self::EndorsingEncryptedSupportingTokens,
        Self::EndorsingSupportingTokens,
        Self::EncryptedSupportingTokens,
    ];

    /// Usage name. Qualifier checks are done on these strings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signature => "Signature",
            Self::Encryption => "Encryption",
            Self::MainSignature => "MainSignature",
            Self::MainEncryption => "MainEncryption",
            Self::SupportingTokens => "SupportingTokens",
            Self::SignedSupportingTokens => "SignedSupportingTokens",
            Self::EndorsingSupportingTokens => "EndorsingSupportingTokens",
            Self::SignedEndorsingSupportingTokens => "SignedEndorsingSupportingTokens",
            Self::EncryptedSupportingTokens => "EncryptedSupportingTokens",
            Self::SignedEncryptedSupportingTokens => "SignedEncryptedSupportingTokens",
            Self::EndorsingEncryptedSupportingTokens => "EndorsingEncryptedSupportingTokens",
            Self::SignedEndorsingEncryptedSupportingTokens => {
                "SignedEndorsingEncryptedSupportingTokens"
            }
        }
    }

    /// One of the `*SupportingTokens` usages.
    pub fn is_supporting(&self) -> bool {
        !matches!(
            self,
            Self::Signature | Self::Encryption | Self::MainSignature | Self::MainEncryption
        )
    }

    /// Main signature or main encryption; no other token can stand in.
    pub fn is_main(&self) -> bool {
        matches!(self, Self::MainSignature | Self::MainEncryption)
    }
}

impl std::fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a token was referenced from the signature or encryption using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyIdentifier {
    IssuerSerial,
    SkiKeyIdentifier,
    X509KeyIdentifier,
    X509SubjectName,
    ThumbprintIdentifier,
    EncryptedKeySha1Identifier,
    KerberosSha1Identifier,
    SecurityTokenDirectReference,
    EmbeddedKeyIdentifierRef,
    ExternalUriReference,
    KeyValue,
}

/// A credential found in the message.
///
/// Tokens are stored in a [`TokenRegistry`](crate::TokenRegistry) and
/// referenced by [`TokenId`]; the wrapping graph is maintained by the
/// registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityToken {
    /// `wsu:Id` or other document identifier, if any.
    pub id: Option<String>,
    pub token_type: TokenType,
    pub usages: Vec<TokenUsage>,
    /// Where the token sits in the document. `None` for tokens that were
    /// referenced but not included.
    pub element_path: Option<ElementPath>,
    pub included_in_message: bool,
    pub key_identifier: Option<KeyIdentifier>,
    #[serde(default)]
    pub(crate) wrapped_tokens: Vec<TokenId>,
    #[serde(default)]
    pub(crate) key_wrapping_token: Option<TokenId>,
}

impl SecurityToken {
    pub fn new(token_type: TokenType) -> Self {
        Self {
            id: None,
            token_type,
            usages: Vec::new(),
            element_path: None,
            included_in_message: false,
            key_identifier: None,
            wrapped_tokens: Vec::new(),
            key_wrapping_token: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.add_usage(usage);
        self
    }

    /// Set the element path; a token with a path is included in the message.
    pub fn with_element_path(mut self, path: ElementPath) -> Self {
        self.element_path = Some(path);
        self.included_in_message = true;
        self
    }

    pub fn included(mut self, included: bool) -> Self {
        self.included_in_message = included;
        self
    }

    pub fn with_key_identifier(mut self, key_identifier: KeyIdentifier) -> Self {
        self.key_identifier = Some(key_identifier);
        self
    }

    /// Add a usage, ignoring duplicates.
    pub fn add_usage(&mut self, usage: TokenUsage) {
        if !self.usages.contains(&usage) {
            self.usages.push(usage);
        }
    }

    pub fn has_usage(&self, usage: TokenUsage) -> bool {
        self.usages.contains(&usage)
    }

    pub fn wrapped_tokens(&self) -> &[TokenId] {
        &self.wrapped_tokens
    }

    pub fn key_wrapping_token(&self) -> Option<TokenId> {
        self.key_wrapping_token
    }
}
