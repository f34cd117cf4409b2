//! Generic storage engine trait definition.
//!
//! `StandardStorage` is the untyped CRUD + watch interface that registries
//! delegate to. An engine instance is scoped to one resource kind, but it
//! accepts and returns [`DynamicObject`]s; narrowing to a concrete type is the
//! registry's job.

use std::sync::Arc;

use uuid::Uuid;

use crate::api::{DynamicList, DynamicObject};
use crate::context::Context;
use crate::error::Result;
use crate::selector::{FieldSelector, LabelSelector};
use crate::watch::Watch;

/// Conditions that must hold for a delete to proceed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preconditions {
    /// Stored object must carry this uid
    pub uid: Option<Uuid>,
}

/// Options accepted by [`StandardStorage::delete`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub preconditions: Option<Preconditions>,
}

/// Resource-agnostic storage engine.
///
/// Implementations own persistence, optimistic concurrency and watch fan-out.
/// Every method honors the namespace, deadline and cancellation carried by
/// the [`Context`].
pub trait StandardStorage: Send + Sync {
    /// Kind of object this instance stores (e.g., "Secret").
    fn kind(&self) -> &str;

    /// List objects matching both selectors.
    ///
    /// The returned list carries the resource version it was read at.
    fn list(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
    ) -> Result<DynamicList>;

    /// Get an object by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such object exists.
    fn get(&self, ctx: &Context, name: &str) -> Result<DynamicObject>;

    /// Create a new object.
    ///
    /// # Returns
    ///
    /// Returns the stored object with its assigned resource version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the name is taken, or
    /// `StorageError::Invalid` if the object fails validation.
    fn create(&self, ctx: &Context, obj: DynamicObject) -> Result<DynamicObject>;

    /// Update an existing object.
    ///
    /// # Returns
    ///
    /// Returns the stored object and whether the update created it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the object's resource version is
    /// not the stored one.
    fn update(&self, ctx: &Context, obj: DynamicObject) -> Result<(DynamicObject, bool)>;

    /// Delete an object by name, returning its final state.
    fn delete(
        &self,
        ctx: &Context,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<DynamicObject>;

    /// Subscribe to changes after `resource_version`.
    ///
    /// The caller owns the returned handle and must stop or drop it.
    fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch>;
}

impl<S: StandardStorage + ?Sized> StandardStorage for Arc<S> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn list(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
    ) -> Result<DynamicList> {
        (**self).list(ctx, label, field)
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<DynamicObject> {
        (**self).get(ctx, name)
    }

    fn create(&self, ctx: &Context, obj: DynamicObject) -> Result<DynamicObject> {
        (**self).create(ctx, obj)
    }

    fn update(&self, ctx: &Context, obj: DynamicObject) -> Result<(DynamicObject, bool)> {
        (**self).update(ctx, obj)
    }

    fn delete(
        &self,
        ctx: &Context,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<DynamicObject> {
        (**self).delete(ctx, name, options)
    }

    fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        (**self).watch(ctx, label, field, resource_version)
    }
}

impl<S: StandardStorage + ?Sized> StandardStorage for &S {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn list(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
    ) -> Result<DynamicList> {
        (**self).list(ctx, label, field)
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<DynamicObject> {
        (**self).get(ctx, name)
    }

    fn create(&self, ctx: &Context, obj: DynamicObject) -> Result<DynamicObject> {
        (**self).create(ctx, obj)
    }

    fn update(&self, ctx: &Context, obj: DynamicObject) -> Result<(DynamicObject, bool)> {
        (**self).update(ctx, obj)
    }

    fn delete(
        &self,
        ctx: &Context,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<DynamicObject> {
        (**self).delete(ctx, name, options)
    }

    fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        (**self).watch(ctx, label, field, resource_version)
    }
}
