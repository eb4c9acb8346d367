#![forbid(unsafe_code)]

//! XML namespace constants used across the engine.

/// SOAP 1.1 envelope namespace
pub const SOAP11: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.2 envelope namespace
pub const SOAP12: &str = "http://www.w3.org/2003/05/soap-envelope";

/// WS-Security secext 1.0 namespace
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security secext 1.1 namespace
pub const WSSE11: &str = "http://docs.oasis-open.org/wss/oasis-wss-wssecurity-secext-1.1.xsd";

/// WS-Security utility namespace
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML Encryption namespace
pub const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";

/// WS-SecureConversation 1.3 namespace
pub const WSC: &str = "http://docs.oasis-open.org/ws-sx/ws-secureconversation/200512";

/// WS-SecurityPolicy 1.1 namespace
pub const SP11: &str = "http://schemas.xmlsoap.org/ws/2005/07/securitypolicy";

/// WS-SecurityPolicy 1.2 namespace
pub const SP12: &str = "http://docs.oasis-open.org/ws-sx/ws-securitypolicy/200702";

/// WS-SecurityPolicy 1.3 namespace
pub const SP13: &str = "http://docs.oasis-open.org/ws-sx/ws-securitypolicy/200802";

/// UsernameToken profile 1.0 namespace
pub const USERNAMETOKEN_PROFILE10: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0";

/// UsernameToken profile 1.1 namespace
pub const USERNAMETOKEN_PROFILE11: &str =
    "http://docs.oasis-open.org/wss/oasis-wss-username-token-profile-1.1";

/// Returns true for either SOAP envelope namespace.
pub fn is_soap_ns(namespace: &str) -> bool {
    namespace == SOAP11 || namespace == SOAP12
}

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // SOAP
    pub const ENVELOPE: &str = "Envelope";
    pub const HEADER: &str = "Header";
    pub const BODY: &str = "Body";

    // WS-Security header
    pub const SECURITY: &str = "Security";
    pub const BINARY_SECURITY_TOKEN: &str = "BinarySecurityToken";
    pub const USERNAME_TOKEN: &str = "UsernameToken";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";
    pub const TIMESTAMP: &str = "Timestamp";

    // DSig / XML-Enc
    pub const SIGNATURE: &str = "Signature";
    pub const ENCRYPTED_KEY: &str = "EncryptedKey";
    pub const ENCRYPTED_DATA: &str = "EncryptedData";
}
