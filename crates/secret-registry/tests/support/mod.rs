#![allow(dead_code)]

use std::sync::Mutex;

use secret_registry::api::DynamicList;
use secret_registry::storage::DeleteOptions;
use secret_registry::{
    Context, DynamicObject, FieldSelector, LabelSelector, Result, StandardStorage, Watch,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ns(namespace: &str) -> Context {
    Context::background().with_namespace(namespace)
}

/// A request as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List {
        label: LabelSelector,
        field: FieldSelector,
    },
    Get(String),
    Create(String),
    Update(String, String),
    Delete {
        name: String,
        options: Option<DeleteOptions>,
    },
    Watch {
        label: LabelSelector,
        field: FieldSelector,
        resource_version: String,
    },
}

/// Engine wrapper that records every request before delegating.
pub struct Recording<S> {
    inner: S,
    calls: Mutex<Vec<Call>>,
}

impl<S> Recording<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl<S: StandardStorage> StandardStorage for Recording<S> {
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    fn list(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
    ) -> Result<DynamicList> {
        self.push(Call::List {
            label: label.clone(),
            field: field.clone(),
        });
        self.inner.list(ctx, label, field)
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<DynamicObject> {
        self.push(Call::Get(name.to_string()));
        self.inner.get(ctx, name)
    }

    fn create(&self, ctx: &Context, obj: DynamicObject) -> Result<DynamicObject> {
        self.push(Call::Create(obj.metadata.name.clone()));
        self.inner.create(ctx, obj)
    }

    fn update(&self, ctx: &Context, obj: DynamicObject) -> Result<(DynamicObject, bool)> {
        self.push(Call::Update(
            obj.metadata.name.clone(),
            obj.metadata.resource_version.clone(),
        ));
        self.inner.update(ctx, obj)
    }

    fn delete(
        &self,
        ctx: &Context,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<DynamicObject> {
        self.push(Call::Delete {
            name: name.to_string(),
            options: options.cloned(),
        });
        self.inner.delete(ctx, name, options)
    }

    fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        self.push(Call::Watch {
            label: label.clone(),
            field: field.clone(),
            resource_version: resource_version.to_string(),
        });
        self.inner.watch(ctx, label, field, resource_version)
    }
}

/// Engine wrapper that reports the inner engine's kind but relabels every
/// object it returns as `foreign_kind`.
pub struct Misbound<S> {
    inner: S,
    foreign_kind: String,
    // Keep the inner list kind and relabel only the items.
    items_only: bool,
}

impl<S> Misbound<S> {
    pub fn new(inner: S, foreign_kind: impl Into<String>) -> Self {
        Self {
            inner,
            foreign_kind: foreign_kind.into(),
            items_only: false,
        }
    }

    /// Lists keep their proper list kind while every item is relabeled.
    pub fn items_only(inner: S, foreign_kind: impl Into<String>) -> Self {
        Self {
            items_only: true,
            ..Self::new(inner, foreign_kind)
        }
    }

    fn relabel(&self, mut obj: DynamicObject) -> DynamicObject {
        obj.types.kind = self.foreign_kind.clone();
        obj
    }
}

impl<S: StandardStorage> StandardStorage for Misbound<S> {
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    fn list(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
    ) -> Result<DynamicList> {
        let mut list = self.inner.list(ctx, label, field)?;
        if !self.items_only {
            list.types.kind = format!("{}List", self.foreign_kind);
        }
        list.items = list.items.into_iter().map(|o| self.relabel(o)).collect();
        Ok(list)
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<DynamicObject> {
        self.inner.get(ctx, name).map(|o| self.relabel(o))
    }

    fn create(&self, ctx: &Context, obj: DynamicObject) -> Result<DynamicObject> {
        self.inner.create(ctx, obj).map(|o| self.relabel(o))
    }

    fn update(&self, ctx: &Context, obj: DynamicObject) -> Result<(DynamicObject, bool)> {
        self.inner
            .update(ctx, obj)
            .map(|(o, created)| (self.relabel(o), created))
    }

    fn delete(
        &self,
        ctx: &Context,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<DynamicObject> {
        self.inner.delete(ctx, name, options).map(|o| self.relabel(o))
    }

    fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        self.inner.watch(ctx, label, field, resource_version)
    }
}
