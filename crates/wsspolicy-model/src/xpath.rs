#![forbid(unsafe_code)]

//! XPath subset for element protection assertions.
//!
//! Policy XPath expressions are compiled once into element patterns and
//! matched against the element paths reported by security events. Only the
//! forms that appear in `SignedElements`, `EncryptedElements` and
//! `RequiredElements` are supported:
//! - absolute location paths: `/soap:Envelope/soap:Body`
//! - `//` as an any-depth gap; a leading `//` (or a relative expression)
//!   matches any suffix of the element path
//! - `*` and `prefix:*` name tests
//! - predicates are ignored: `wsse:Security[1]` matches like `wsse:Security`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use wsspolicy_core::{Error, QName};

/// An XPath expression with its in-scope namespace prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPath {
    pub expression: String,
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
}

impl XPath {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            namespaces: BTreeMap::new(),
        }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }
}

/// One step of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Element name test; `None` namespace or local part is a wildcard.
    Name {
        namespace: Option<String>,
        local: Option<String>,
    },
    /// `//`: zero or more arbitrary elements.
    AnyDepth,
}

impl PathStep {
    fn matches(&self, name: &QName) -> bool {
        match self {
            PathStep::AnyDepth => true,
            PathStep::Name { namespace, local } => {
                if let Some(local) = local {
                    if *local != name.local {
                        return false;
                    }
                }
                match namespace {
                    None => true,
                    Some(ns) => {
                        *ns == name.namespace
                            || (wsspolicy_core::ns::is_soap_ns(ns)
                                && wsspolicy_core::ns::is_soap_ns(&name.namespace))
                    }
                }
            }
        }
    }
}

/// A compiled element pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPattern {
    steps: Vec<PathStep>,
}

impl ElementPattern {
    /// Compile an XPath expression.
    pub fn compile(xpath: &XPath) -> Result<Self, Error> {
        let expr = xpath.expression.trim();
        if expr.is_empty() {
            return Err(Error::InvalidPolicy("empty XPath expression".into()));
        }
        let segments = split_steps(expr);
        let mut steps = Vec::new();

        let mut iter = segments.iter().enumerate().peekable();
        if segments.first().map(|s| !s.is_empty()).unwrap_or(false) {
            // relative expression
            steps.push(PathStep::AnyDepth);
        } else {
            iter.next();
        }
        while let Some((i, segment)) = iter.next() {
            if segment.is_empty() {
                if i == segments.len() - 1 {
                    return Err(Error::InvalidPolicy(format!(
                        "XPath expression ends with '/': {expr}"
                    )));
                }
                if steps.last() != Some(&PathStep::AnyDepth) {
                    steps.push(PathStep::AnyDepth);
                }
                continue;
            }
            steps.push(compile_step(segment, xpath)?);
        }
        if steps.iter().all(|s| *s == PathStep::AnyDepth) {
            return Err(Error::InvalidPolicy(format!(
                "XPath expression selects no element: {expr}"
            )));
        }
        Ok(Self { steps })
    }

    /// Build an exact pattern from a concrete element path.
    pub fn from_path(path: &[QName]) -> Self {
        Self {
            steps: path
                .iter()
                .map(|q| PathStep::Name {
                    namespace: Some(q.namespace.clone()),
                    local: Some(q.local.clone()),
                })
                .collect(),
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Match an element path against this pattern.
    pub fn matches(&self, path: &[QName]) -> bool {
        match_steps(&self.steps, path)
    }
}

fn match_steps(steps: &[PathStep], path: &[QName]) -> bool {
    match steps.split_first() {
        None => path.is_empty(),
        Some((PathStep::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_steps(rest, &path[skip..]))
        }
        Some((step, rest)) => match path.split_first() {
            Some((name, tail)) => step.matches(name) && match_steps(rest, tail),
            None => false,
        },
    }
}

/// Split on `/` outside of predicates, keeping empty segments.
fn split_steps(expr: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => {
                segments.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&expr[start..]);
    segments
}

fn compile_step(segment: &str, xpath: &XPath) -> Result<PathStep, Error> {
    let name = match segment.find('[') {
        Some(pos) => &segment[..pos],
        None => segment,
    };
    let name = name.strip_prefix("child::").unwrap_or(name).trim();
    if name.is_empty()
        || name.starts_with('@')
        || name.contains('(')
        || name == "."
        || name == ".."
    {
        return Err(Error::InvalidPolicy(format!(
            "unsupported XPath step '{segment}' in {}",
            xpath.expression
        )));
    }
    match name.split_once(':') {
        Some((prefix, local)) => {
            let uri = xpath.namespaces.get(prefix).ok_or_else(|| {
                Error::InvalidPolicy(format!("Unknown namespace prefix {prefix}"))
            })?;
            Ok(PathStep::Name {
                namespace: Some(uri.clone()),
                local: (local != "*").then(|| local.to_owned()),
            })
        }
        None if name == "*" => Ok(PathStep::Name {
            namespace: None,
            local: None,
        }),
        None => Ok(PathStep::Name {
            namespace: Some(String::new()),
            local: Some(name.to_owned()),
        }),
    }
}

impl fmt::Display for ElementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending_gap = false;
        for step in &self.steps {
            match step {
                PathStep::AnyDepth => pending_gap = true,
                PathStep::Name { namespace, local } => {
                    f.write_str(if pending_gap { "//" } else { "/" })?;
                    pending_gap = false;
                    if let Some(ns) = namespace.as_deref().filter(|ns| !ns.is_empty()) {
                        write!(f, "{{{ns}}}")?;
                    }
                    f.write_str(local.as_deref().unwrap_or("*"))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsspolicy_core::{ns, qname};

    fn soap_xpath(expr: &str) -> XPath {
        XPath::new(expr)
            .with_namespace("soap", ns::SOAP11)
            .with_namespace("wsse", ns::WSSE)
            .with_namespace("ds", ns::DSIG)
    }

    #[test]
    fn test_absolute_path() {
        let p = ElementPattern::compile(&soap_xpath("/soap:Envelope/soap:Body")).unwrap();
        assert!(p.matches(&qname::soap11_body_path()));
        assert!(!p.matches(&qname::soap11_header_path()));
        assert!(!p.matches(&qname::wsse_security_header_path()));
    }

    #[test]
    fn test_soap12_matches_soap11_pattern() {
        let p = ElementPattern::compile(&soap_xpath("/soap:Envelope/soap:Body")).unwrap();
        let body12 = vec![
            QName::new(ns::SOAP12, "Envelope"),
            QName::new(ns::SOAP12, "Body"),
        ];
        assert!(p.matches(&body12));
    }

    #[test]
    fn test_leading_any_depth_matches_suffix() {
        let p = ElementPattern::compile(&soap_xpath("//ds:Signature")).unwrap();
        assert!(p.matches(&qname::header_signature_path()));
        assert!(!p.matches(&qname::wsse_security_header_path()));
    }

    #[test]
    fn test_relative_expression_matches_suffix() {
        let p = ElementPattern::compile(&soap_xpath("wsse:Security/ds:Signature")).unwrap();
        assert!(p.matches(&qname::header_signature_path()));
    }

    #[test]
    fn test_inner_gap_and_wildcards() {
        let p = ElementPattern::compile(&soap_xpath("/soap:Envelope//ds:*")).unwrap();
        assert!(p.matches(&qname::header_signature_path()));
        let any = ElementPattern::compile(&soap_xpath("/soap:Envelope/*/*")).unwrap();
        assert!(any.matches(&qname::wsse_security_header_path()));
        assert!(!any.matches(&qname::soap11_body_path()));
    }

    #[test]
    fn test_predicates_ignored() {
        let p = ElementPattern::compile(&soap_xpath(
            "/soap:Envelope/soap:Header/wsse:Security[@soap:actor='a/b']",
        ))
        .unwrap();
        assert!(p.matches(&qname::wsse_security_header_path()));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = ElementPattern::compile(&XPath::new("/x:Envelope")).unwrap_err();
        assert!(matches!(err, Error::InvalidPolicy(m) if m.contains("Unknown namespace prefix x")));
    }

    #[test]
    fn test_unsupported_steps() {
        assert!(ElementPattern::compile(&soap_xpath("/soap:Envelope/@id")).is_err());
        assert!(ElementPattern::compile(&soap_xpath("/soap:Envelope/text()")).is_err());
        assert!(ElementPattern::compile(&soap_xpath("/soap:Envelope/")).is_err());
        assert!(ElementPattern::compile(&soap_xpath("")).is_err());
    }

    #[test]
    fn test_display() {
        let p = ElementPattern::compile(&soap_xpath("//wsse:Security/*")).unwrap();
        assert_eq!(
            p.to_string(),
            format!("//{{{}}}Security/*", ns::WSSE)
        );
        let exact = ElementPattern::from_path(&qname::soap11_body_path());
        assert_eq!(
            exact.to_string(),
            wsspolicy_core::path_as_string(&qname::soap11_body_path())
        );
    }
}
