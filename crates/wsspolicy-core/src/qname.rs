#![forbid(unsafe_code)]

//! Qualified names and element paths.
//!
//! An element path is the list of qualified names from the document root
//! down to an element, e.g. `Envelope/Header/Security/BinarySecurityToken`.
//! Security events and tokens identify elements by path rather than by
//! node handle, since the engine never sees the document itself.

use crate::ns;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A namespace-qualified XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    #[serde(default)]
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// A name without a namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// Compare names, treating the two SOAP envelope namespaces as one.
    pub fn matches_any_soap_ns(&self, other: &QName) -> bool {
        if ns::is_soap_ns(&self.namespace) && ns::is_soap_ns(&other.namespace) {
            self.local == other.local
        } else {
            self == other
        }
    }
}

/// Formats as `{namespace}local`, or just `local` without a namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// Path of qualified names from the document root to an element.
pub type ElementPath = Vec<QName>;

/// Render a path as `/{ns}a/{ns}b`.
pub fn path_as_string(path: &[QName]) -> String {
    let mut out = String::new();
    for name in path {
        out.push('/');
        out.push_str(&name.to_string());
    }
    out
}

/// Compare two element paths element by element.
///
/// With `match_any_soap_ns`, SOAP 1.1 and SOAP 1.2 envelope names compare
/// equal. With `last_element_wildcard`, `pattern` may be a prefix of `path`,
/// so an element matches together with all of its descendants.
pub fn path_matches(
    pattern: &[QName],
    path: &[QName],
    match_any_soap_ns: bool,
    last_element_wildcard: bool,
) -> bool {
    if last_element_wildcard {
        if pattern.len() > path.len() {
            return false;
        }
    } else if pattern.len() != path.len() {
        return false;
    }
    pattern.iter().zip(path.iter()).all(|(a, b)| {
        if match_any_soap_ns {
            a.matches_any_soap_ns(b)
        } else {
            a == b
        }
    })
}

/// `/soap:Envelope/soap:Header` for SOAP 1.1.
pub fn soap11_header_path() -> ElementPath {
    vec![
        QName::new(ns::SOAP11, ns::node::ENVELOPE),
        QName::new(ns::SOAP11, ns::node::HEADER),
    ]
}

/// `/soap:Envelope/soap:Body` for SOAP 1.1.
pub fn soap11_body_path() -> ElementPath {
    vec![
        QName::new(ns::SOAP11, ns::node::ENVELOPE),
        QName::new(ns::SOAP11, ns::node::BODY),
    ]
}

/// `/soap:Envelope/soap:Header/wsse:Security` for SOAP 1.1.
pub fn wsse_security_header_path() -> ElementPath {
    let mut path = soap11_header_path();
    path.push(QName::new(ns::WSSE, ns::node::SECURITY));
    path
}

/// Path of a `ds:Signature` directly below the security header.
pub fn header_signature_path() -> ElementPath {
    let mut path = wsse_security_header_path();
    path.push(QName::new(ns::DSIG, ns::node::SIGNATURE));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_as_string() {
        let path = vec![
            QName::new(ns::SOAP11, "Envelope"),
            QName::new(ns::SOAP11, "Body"),
        ];
        assert_eq!(
            path_as_string(&path),
            "/{http://schemas.xmlsoap.org/soap/envelope/}Envelope/{http://schemas.xmlsoap.org/soap/envelope/}Body"
        );
        assert_eq!(path_as_string(&[QName::local("a")]), "/a");
    }

    #[test]
    fn test_path_matches_soap_versions() {
        let soap12_body = vec![
            QName::new(ns::SOAP12, "Envelope"),
            QName::new(ns::SOAP12, "Body"),
        ];
        assert!(path_matches(&soap11_body_path(), &soap12_body, true, false));
        assert!(!path_matches(&soap11_body_path(), &soap12_body, false, false));
    }

    #[test]
    fn test_path_matches_last_element_wildcard() {
        let header = soap11_header_path();
        let security = wsse_security_header_path();
        assert!(path_matches(&header, &security, false, true));
        assert!(!path_matches(&header, &security, false, false));
        assert!(!path_matches(&security, &header, false, true));
    }

    #[test]
    fn test_qname_serde() {
        let name: QName = serde_json::from_str(r#"{"local":"Body"}"#).unwrap();
        assert_eq!(name, QName::local("Body"));
        assert_eq!(name.to_string(), "Body");
    }
}
