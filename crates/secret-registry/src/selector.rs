//! Label and field selectors.
//!
//! Selectors are plain conjunctions of requirements, built programmatically.
//! An empty selector matches everything.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::DynamicObject;

/// A single requirement on an object's labels.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LabelRequirement {
    Equals(String, String),
    NotEquals(String, String),
    Exists(String),
    DoesNotExist(String),
}

impl LabelRequirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            LabelRequirement::Equals(key, value) => labels.get(key) == Some(value),
            // A missing label is "not equal" to any value.
            LabelRequirement::NotEquals(key, value) => labels.get(key) != Some(value),
            LabelRequirement::Exists(key) => labels.contains_key(key),
            LabelRequirement::DoesNotExist(key) => !labels.contains_key(key),
        }
    }
}

impl fmt::Display for LabelRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelRequirement::Equals(key, value) => write!(f, "{}={}", key, value),
            LabelRequirement::NotEquals(key, value) => write!(f, "{}!={}", key, value),
            LabelRequirement::Exists(key) => write!(f, "{}", key),
            LabelRequirement::DoesNotExist(key) => write!(f, "!{}", key),
        }
    }
}

/// Predicate over an object's labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<LabelRequirement>,
}

impl LabelSelector {
    /// Selector that matches every object.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn equals(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push(LabelRequirement::Equals(key.into(), value.into()));
        self
    }

    pub fn not_equals(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push(LabelRequirement::NotEquals(key.into(), value.into()));
        self
    }

    pub fn exists(mut self, key: impl Into<String>) -> Self {
        self.requirements.push(LabelRequirement::Exists(key.into()));
        self
    }

    pub fn does_not_exist(mut self, key: impl Into<String>) -> Self {
        self.requirements
            .push(LabelRequirement::DoesNotExist(key.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|req| req.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.requirements)
    }
}

/// A single requirement on a structured field.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldRequirement {
    Equals(String, String),
    NotEquals(String, String),
}

impl FieldRequirement {
    fn matches(&self, object: &DynamicObject) -> bool {
        match self {
            FieldRequirement::Equals(path, value) => object.field(path) == Some(value.as_str()),
            FieldRequirement::NotEquals(path, value) => {
                object.field(path) != Some(value.as_str())
            }
        }
    }
}

impl fmt::Display for FieldRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRequirement::Equals(path, value) => write!(f, "{}={}", path, value),
            FieldRequirement::NotEquals(path, value) => write!(f, "{}!={}", path, value),
        }
    }
}

/// Predicate over an object's structured fields.
///
/// Paths are resolved with [`DynamicObject::field`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    /// Selector that matches every object.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn equals(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push(FieldRequirement::Equals(path.into(), value.into()));
        self
    }

    pub fn not_equals(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push(FieldRequirement::NotEquals(path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, object: &DynamicObject) -> bool {
        self.requirements.iter().all(|req| req.matches(object))
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.requirements)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Secret;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_everything_matches_all() {
        let selector = LabelSelector::everything();
        assert!(selector.is_empty());
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("app", "db")])));
    }

    #[test]
    fn test_label_requirements() {
        let set = labels(&[("app", "db"), ("tier", "backend")]);

        assert!(LabelSelector::everything().equals("app", "db").matches(&set));
        assert!(!LabelSelector::everything().equals("app", "web").matches(&set));
        assert!(LabelSelector::everything().not_equals("app", "web").matches(&set));
        assert!(LabelSelector::everything().not_equals("missing", "x").matches(&set));
        assert!(LabelSelector::everything().exists("tier").matches(&set));
        assert!(!LabelSelector::everything().does_not_exist("tier").matches(&set));
    }

    #[test]
    fn test_requirements_are_conjunctive() {
        let set = labels(&[("app", "db")]);
        let selector = LabelSelector::everything().equals("app", "db").exists("tier");
        assert!(!selector.matches(&set));
    }

    #[test]
    fn test_field_selector() {
        let secret = Secret::new("db-pass");
        let obj = DynamicObject::from_resource(&secret).unwrap();

        assert!(FieldSelector::everything().matches(&obj));
        assert!(FieldSelector::everything()
            .equals("metadata.name", "db-pass")
            .matches(&obj));
        assert!(FieldSelector::everything().equals("type", "Opaque").matches(&obj));
        assert!(!FieldSelector::everything()
            .not_equals("metadata.name", "db-pass")
            .matches(&obj));
    }

    #[test]
    fn test_display() {
        let selector = LabelSelector::everything()
            .equals("app", "db")
            .not_equals("env", "dev")
            .exists("tier")
            .does_not_exist("legacy");
        assert_eq!(selector.to_string(), "app=db,env!=dev,tier,!legacy");
        assert_eq!(FieldSelector::everything().to_string(), "");
    }
}
