//! Typed resources and their untyped storage form.
//!
//! Storage engines are resource-agnostic: they accept and return
//! [`DynamicObject`]s, which keep the kind and metadata in typed fields and
//! everything else as a JSON body. A [`Resource`] type knows its own kind and
//! converts to and from that form.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::meta::{ListMeta, ObjectMeta, TypeMeta};
use crate::error::NarrowError;

/// A concrete resource kind with a fixed wire identity.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Kind name of a single object (e.g., "Secret")
    const KIND: &'static str;

    /// Kind name of a list of objects (e.g., "SecretList")
    const LIST_KIND: &'static str;

    /// API version the kind is served under
    const API_VERSION: &'static str;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn type_meta() -> TypeMeta {
        TypeMeta::new(Self::KIND, Self::API_VERSION)
    }
}

/// A typed list of resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "K: Resource")]
pub struct ResourceList<K> {
    #[serde(default)]
    pub metadata: ListMeta,
    pub items: Vec<K>,
}

impl<K> ResourceList<K> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An object of any kind, as stored by a generic engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicObject {
    pub types: TypeMeta,
    pub metadata: ObjectMeta,
    /// Every field other than kind, apiVersion and metadata
    pub body: Map<String, Value>,
}

impl DynamicObject {
    pub fn new(types: TypeMeta, metadata: ObjectMeta) -> Self {
        Self {
            types,
            metadata,
            body: Map::new(),
        }
    }

    /// Encode a typed resource, stamping its kind and API version.
    pub fn from_resource<K: Resource>(resource: &K) -> Result<Self, serde_json::Error> {
        let mut body = match serde_json::to_value(resource)? {
            Value::Object(map) => map,
            _ => {
                return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                    "{} did not encode as a JSON object",
                    K::KIND
                )))
            }
        };
        body.remove("kind");
        body.remove("apiVersion");
        let metadata = match body.remove("metadata") {
            Some(value) => serde_json::from_value(value)?,
            None => ObjectMeta::default(),
        };

        Ok(Self {
            types: K::type_meta(),
            metadata,
            body,
        })
    }

    /// Decode into `K`, refusing objects of any other kind.
    pub fn try_into_resource<K: Resource>(self) -> Result<K, NarrowError> {
        if self.types.kind != K::KIND {
            return Err(NarrowError::KindMismatch {
                expected: K::KIND.to_string(),
                actual: self.types.kind,
            });
        }

        let malformed = |source| NarrowError::Malformed {
            kind: K::KIND.to_string(),
            source,
        };
        let mut map = self.body;
        map.insert(
            "metadata".to_string(),
            serde_json::to_value(&self.metadata).map_err(malformed)?,
        );
        serde_json::from_value(Value::Object(map)).map_err(malformed)
    }

    /// Look up a selectable field by dotted path.
    ///
    /// `metadata.name` and `metadata.namespace` come from the metadata; any
    /// other path is resolved against the body and must end at a string.
    pub fn field(&self, path: &str) -> Option<&str> {
        match path {
            "metadata.name" => Some(&self.metadata.name),
            "metadata.namespace" => Some(&self.metadata.namespace),
            _ => {
                let mut parts = path.split('.');
                let mut current = self.body.get(parts.next()?)?;
                for part in parts {
                    current = current.get(part)?;
                }
                current.as_str()
            }
        }
    }
}

/// A list of untyped objects, as returned by a generic engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicList {
    pub types: TypeMeta,
    pub metadata: ListMeta,
    pub items: Vec<DynamicObject>,
}

impl DynamicList {
    /// Decode into a typed list; the list kind and every item must match `K`.
    pub fn try_into_list<K: Resource>(self) -> Result<ResourceList<K>, NarrowError> {
        if self.types.kind != K::LIST_KIND {
            return Err(NarrowError::KindMismatch {
                expected: K::LIST_KIND.to_string(),
                actual: self.types.kind,
            });
        }

        let items = self
            .items
            .into_iter()
            .map(DynamicObject::try_into_resource::<K>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResourceList {
            metadata: self.metadata,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Secret;

    #[test]
    fn test_from_resource_splits_metadata() {
        let secret = Secret::new("db-pass")
            .with_label("app", "db")
            .with_data("password", "x");
        let obj = DynamicObject::from_resource(&secret).unwrap();

        assert_eq!(obj.types.kind, "Secret");
        assert_eq!(obj.types.api_version, "v1");
        assert_eq!(obj.metadata.name, "db-pass");
        assert!(obj.body.get("metadata").is_none());
        assert_eq!(obj.body["data"]["password"], "eA==");
    }

    #[test]
    fn test_try_into_resource_restores_object() {
        let secret = Secret::new("db-pass").with_data("password", "x");
        let obj = DynamicObject::from_resource(&secret).unwrap();

        let back: Secret = obj.try_into_resource().unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_try_into_resource_rejects_other_kind() {
        let mut obj = DynamicObject::from_resource(&Secret::new("a")).unwrap();
        obj.types.kind = "ConfigMap".to_string();

        let err = obj.try_into_resource::<Secret>().unwrap_err();
        assert!(matches!(
            err,
            NarrowError::KindMismatch { ref actual, .. } if actual == "ConfigMap"
        ));
    }

    #[test]
    fn test_try_into_resource_rejects_malformed_body() {
        let mut obj = DynamicObject::from_resource(&Secret::new("a")).unwrap();
        obj.body
            .insert("data".to_string(), serde_json::json!({"k": 42}));

        let err = obj.try_into_resource::<Secret>().unwrap_err();
        assert!(matches!(err, NarrowError::Malformed { .. }));
    }

    #[test]
    fn test_field_lookup() {
        let mut secret = Secret::new("a").with_type(crate::api::SecretType::DOCKERCFG);
        secret.metadata.namespace = "prod".to_string();
        let obj = DynamicObject::from_resource(&secret).unwrap();

        assert_eq!(obj.field("metadata.name"), Some("a"));
        assert_eq!(obj.field("metadata.namespace"), Some("prod"));
        assert_eq!(obj.field("type"), Some("kubernetes.io/dockercfg"));
        assert_eq!(obj.field("data.missing"), None);
    }

    #[test]
    fn test_list_kind_checked() {
        let list = DynamicList {
            types: TypeMeta::new("ConfigMapList", "v1"),
            metadata: ListMeta::default(),
            items: Vec::new(),
        };
        assert!(list.try_into_list::<Secret>().is_err());
    }
}
