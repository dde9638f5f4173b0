use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Namespace used when neither the id text nor the caller supplies one.
pub const DEFAULT_NAMESPACE: &str = "global";

/// Identity of a tracked component.
///
/// The text form is `namespace/name[@version]`. Two equality notions are in
/// use: full equality (derived `PartialEq`, version included) and
/// [`ComponentId::same_box_and_name`], which ignores the version and is used
/// for fuzzy lookups when user input is reconciled against the index.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId {
    namespace: String,
    name: String,
    version: Option<String>,
}

impl ComponentId {
    /// Build an id from already-separated parts, validating each segment.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: Option<String>,
    ) -> Result<Self, TypeError> {
        let namespace = namespace.into();
        let name = name.into();
        let display = match &version {
            Some(v) => format!("{namespace}/{name}@{v}"),
            None => format!("{namespace}/{name}"),
        };
        validate_segment(&display, "namespace", &namespace)?;
        validate_segment(&display, "name", &name)?;
        if let Some(v) = &version {
            validate_segment(&display, "version", v)?;
        }
        Ok(Self {
            namespace,
            name,
            version,
        })
    }

    /// Parse `namespace/name[@version]`, falling back to `default_namespace`
    /// when the text carries only a name.
    pub fn parse_with_namespace(input: &str, default_namespace: &str) -> Result<Self, TypeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TypeError::invalid_id(input, "empty id"));
        }

        let (body, version) = match input.split_once('@') {
            Some((body, version)) => (body, Some(version.to_string())),
            None => (input, None),
        };

        let (namespace, name) = match body.split_once('/') {
            Some((ns, name)) => (ns, name),
            None => (default_namespace, body),
        };

        if name.contains('/') {
            return Err(TypeError::invalid_id(
                input,
                "expected at most one '/' separating namespace and name",
            ));
        }

        Self::new(namespace, name, version)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    /// Same namespace and name, version ignored.
    pub fn same_box_and_name(&self, other: &ComponentId) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

fn validate_segment(input: &str, what: &str, segment: &str) -> Result<(), TypeError> {
    if segment.is_empty() {
        return Err(TypeError::invalid_id(input, format!("{what} is empty")));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| c.is_whitespace() || *c == '/' || *c == '@')
    {
        return Err(TypeError::invalid_id(
            input,
            format!("{what} contains forbidden character {c:?}"),
        ));
    }
    Ok(())
}

impl FromStr for ComponentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_namespace(s, DEFAULT_NAMESPACE)
    }
}

impl TryFrom<String> for ComponentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.to_string()
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({self})")
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}/{}@{}", self.namespace, self.name, v),
            None => write!(f, "{}/{}", self.namespace, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_form() {
        let id: ComponentId = "utils/is-string@0.0.1".parse().unwrap();
        assert_eq!(id.namespace(), "utils");
        assert_eq!(id.name(), "is-string");
        assert_eq!(id.version(), Some("0.0.1"));
    }

    #[test]
    fn parse_name_only_uses_default_namespace() {
        let id: ComponentId = "button".parse().unwrap();
        assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(id.name(), "button");
        assert!(!id.has_version());

        let id = ComponentId::parse_with_namespace("button", "ui").unwrap();
        assert_eq!(id.to_string(), "ui/button");
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!("".parse::<ComponentId>().is_err());
        assert!("a/b/c".parse::<ComponentId>().is_err());
        assert!("ns/".parse::<ComponentId>().is_err());
        assert!("ns/na me".parse::<ComponentId>().is_err());
        assert!("ns/name@".parse::<ComponentId>().is_err());
        assert!("ns/name@1@2".parse::<ComponentId>().is_err());
    }

    #[test]
    fn display_roundtrip() {
        for text in ["ns/foo", "ns/foo@1.2.3"] {
            let id: ComponentId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn box_and_name_equality_ignores_version() {
        let a: ComponentId = "ns/foo@1.0.0".parse().unwrap();
        let b: ComponentId = "ns/foo".parse().unwrap();
        let c: ComponentId = "other/foo".parse().unwrap();
        assert_ne!(a, b);
        assert!(a.same_box_and_name(&b));
        assert!(!a.same_box_and_name(&c));
    }

    #[test]
    fn serde_uses_string_form() {
        let id: ComponentId = "ns/foo@1.0.0".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ns/foo@1.0.0\"");
        let parsed: ComponentId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        let bad: Result<ComponentId, _> = serde_json::from_str("\"a/b/c\"");
        assert!(bad.is_err());
    }
}
