//! API types: object metadata, the Secret resource, and the untyped object
//! form that storage engines work with.

pub mod meta;
pub mod object;
pub mod secret;

pub use meta::{ListMeta, ObjectMeta, TypeMeta};
pub use object::{DynamicList, DynamicObject, Resource, ResourceList};
pub use secret::{ByteString, Secret, SecretList, SecretType};
