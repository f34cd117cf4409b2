//! Typed registries over a generic storage engine.
//!
//! [`TypedStorage`] binds a [`StandardStorage`] engine to one [`Resource`]
//! type. The engine's kind is checked once, at construction. After that every
//! call is delegated 1:1, and anything the engine returns is narrowed to the
//! bound type.
//!
//! Engine errors come back exactly as produced. An engine that returns an
//! object of another kind after passing the construction check is a wiring
//! defect, not a request failure, so narrowing panics instead of returning
//! an error.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, error};

use crate::api::{DynamicList, DynamicObject, Resource, ResourceList, Secret, SecretList};
use crate::context::Context;
use crate::error::{KindMismatch, NarrowError, Result};
use crate::selector::{FieldSelector, LabelSelector};
use crate::storage::StandardStorage;
use crate::watch::Watch;

/// Typed access to stored secrets.
pub trait SecretRegistry: Send + Sync {
    /// List secrets whose labels match `label`. Fields are not filtered.
    fn list_secrets(&self, ctx: &Context, label: &LabelSelector) -> Result<SecretList>;

    /// Watch for added, modified and deleted secrets after `resource_version`.
    fn watch_secrets(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch>;

    /// Get a secret by name.
    fn get_secret(&self, ctx: &Context, name: &str) -> Result<Secret>;

    /// Create a secret; the result carries its assigned resource version.
    fn create_secret(&self, ctx: &Context, secret: &Secret) -> Result<Secret>;

    /// Update a secret. `secret` must carry the resource version it was read at.
    fn update_secret(&self, ctx: &Context, secret: &Secret) -> Result<Secret>;

    /// Delete a secret by name.
    fn delete_secret(&self, ctx: &Context, name: &str) -> Result<()>;
}

/// A storage engine bound to resource type `K`.
#[derive(Clone)]
pub struct TypedStorage<K, S> {
    storage: S,
    _kind: PhantomData<fn() -> K>,
}

/// Registry for secrets over engine `S`.
pub type SecretStorage<S> = TypedStorage<Secret, S>;

/// Build a [`SecretRegistry`] over an engine scoped to secrets.
///
/// # Errors
///
/// Returns `KindMismatch` if the engine stores some other kind.
pub fn new_registry<S: StandardStorage>(
    storage: S,
) -> std::result::Result<SecretStorage<S>, KindMismatch> {
    TypedStorage::new(storage)
}

impl<K: Resource, S: StandardStorage> TypedStorage<K, S> {
    /// Bind `storage` to `K`.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` if `storage.kind()` is not `K::KIND`.
    pub fn new(storage: S) -> std::result::Result<Self, KindMismatch> {
        if storage.kind() != K::KIND {
            return Err(KindMismatch {
                expected: K::KIND.to_string(),
                actual: storage.kind().to_string(),
            });
        }
        Ok(Self {
            storage,
            _kind: PhantomData,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn list(&self, ctx: &Context, label: &LabelSelector) -> Result<ResourceList<K>> {
        debug!(kind = K::KIND, label = %label, "list");
        let list = self.storage.list(ctx, label, &FieldSelector::everything())?;
        Ok(narrow_list(list))
    }

    pub fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        debug!(kind = K::KIND, label = %label, field = %field, resource_version, "watch");
        self.storage.watch(ctx, label, field, resource_version)
    }

    pub fn get(&self, ctx: &Context, name: &str) -> Result<K> {
        debug!(kind = K::KIND, name, "get");
        let obj = self.storage.get(ctx, name)?;
        Ok(narrow(obj))
    }

    pub fn create(&self, ctx: &Context, resource: &K) -> Result<K> {
        debug!(kind = K::KIND, name = %resource.metadata().name, "create");
        let obj = DynamicObject::from_resource(resource)?;
        let created = self.storage.create(ctx, obj)?;
        Ok(narrow(created))
    }

    pub fn update(&self, ctx: &Context, resource: &K) -> Result<K> {
        debug!(
            kind = K::KIND,
            name = %resource.metadata().name,
            resource_version = %resource.metadata().resource_version,
            "update"
        );
        let obj = DynamicObject::from_resource(resource)?;
        let (updated, _created) = self.storage.update(ctx, obj)?;
        Ok(narrow(updated))
    }

    pub fn delete(&self, ctx: &Context, name: &str) -> Result<()> {
        debug!(kind = K::KIND, name, "delete");
        self.storage.delete(ctx, name, None)?;
        Ok(())
    }
}

impl<S: StandardStorage> SecretRegistry for TypedStorage<Secret, S> {
    fn list_secrets(&self, ctx: &Context, label: &LabelSelector) -> Result<SecretList> {
        self.list(ctx, label)
    }

    fn watch_secrets(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        self.watch(ctx, label, field, resource_version)
    }

    fn get_secret(&self, ctx: &Context, name: &str) -> Result<Secret> {
        self.get(ctx, name)
    }

    fn create_secret(&self, ctx: &Context, secret: &Secret) -> Result<Secret> {
        self.create(ctx, secret)
    }

    fn update_secret(&self, ctx: &Context, secret: &Secret) -> Result<Secret> {
        self.update(ctx, secret)
    }

    fn delete_secret(&self, ctx: &Context, name: &str) -> Result<()> {
        self.delete(ctx, name)
    }
}

impl<K: Resource, S: fmt::Debug> fmt::Debug for TypedStorage<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedStorage")
            .field("kind", &K::KIND)
            .field("storage", &self.storage)
            .finish()
    }
}

fn narrow<K: Resource>(obj: DynamicObject) -> K {
    match obj.try_into_resource::<K>() {
        Ok(resource) => resource,
        Err(err) => wiring_defect(K::KIND, err),
    }
}

fn narrow_list<K: Resource>(list: DynamicList) -> ResourceList<K> {
    match list.try_into_list::<K>() {
        Ok(list) => list,
        Err(err) => wiring_defect(K::KIND, err),
    }
}

#[cold]
fn wiring_defect(kind: &str, err: NarrowError) -> ! {
    error!(kind, error = %err, "storage returned an object this registry is not bound to");
    panic!("{} registry received a foreign object: {}", kind, err);
}
