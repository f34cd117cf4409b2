//! In-process storage engine.
//!
//! `MemoryStorage` keeps objects of one kind in a map keyed by
//! (namespace, name) and stamps every mutation with the next value of a
//! single revision counter. That revision, in decimal, is the object's
//! resource version and the position watchers resume from.
//!
//! A bounded history of recent events lets a watch start at a past
//! revision. Asking for a revision older than the history window fails with
//! `StorageError::Gone`, and the caller is expected to re-list.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{DynamicList, DynamicObject, ListMeta, Resource};
use crate::config::{ResourceBinding, StorageConfig};
use crate::context::Context;
use crate::error::{Result, StorageError};
use crate::selector::{FieldSelector, LabelSelector};
use crate::storage::traits::{DeleteOptions, StandardStorage};
use crate::watch::{EventType, Watch, WatchEvent, WatchSender};

type ObjectKey = (String, String);

#[derive(Debug)]
struct Watcher {
    // Only events with a higher revision are delivered.
    since: u64,
    namespace: Option<String>,
    label: LabelSelector,
    field: FieldSelector,
    sender: WatchSender,
}

impl Watcher {
    fn wants(&self, revision: u64, event: &WatchEvent) -> bool {
        let obj = &event.object;
        revision > self.since
            && self
                .namespace
                .as_deref()
                .map_or(true, |ns| obj.metadata.namespace == ns)
            && self.label.matches(&obj.metadata.labels)
            && self.field.matches(obj)
    }
}

#[derive(Debug)]
struct Record {
    revision: u64,
    event: WatchEvent,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<ObjectKey, DynamicObject>,
    revision: u64,
    history: VecDeque<Record>,
    // Highest revision evicted from `history`.
    compacted: u64,
    watchers: Vec<Watcher>,
}

impl State {
    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Fan an event out to live watchers and append it to the history.
    fn record(&mut self, revision: u64, event: WatchEvent, capacity: usize) {
        self.watchers.retain(|watcher| {
            if watcher.wants(revision, &event) {
                watcher.sender.send(event.clone())
            } else {
                !watcher.sender.is_closed()
            }
        });

        self.history.push_back(Record { revision, event });
        while self.history.len() > capacity {
            match self.history.pop_front() {
                Some(evicted) => self.compacted = evicted.revision,
                None => break,
            }
        }
    }
}

/// In-memory [`StandardStorage`] bound to a single resource kind.
#[derive(Debug)]
pub struct MemoryStorage {
    binding: ResourceBinding,
    watch_history: usize,
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            binding: config.resource,
            watch_history: config.watch_history,
            state: Mutex::new(State::default()),
        }
    }

    /// Engine for `K` with default settings.
    pub fn for_resource<K: Resource>() -> Self {
        Self::new(StorageConfig::for_resource::<K>())
    }

    /// Current revision; `0` before the first mutation.
    pub fn revision(&self) -> Result<u64> {
        Ok(self.lock_state()?.revision)
    }

    /// Number of watches that have not been stopped or dropped.
    pub fn watcher_count(&self) -> Result<usize> {
        let mut state = self.lock_state()?;
        state.watchers.retain(|watcher| !watcher.sender.is_closed());
        Ok(state.watchers.len())
    }

    /// Lock engine state, returning an error if the mutex is poisoned.
    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Internal("storage state poisoned".to_string()))
    }

    fn check_context(ctx: &Context) -> Result<()> {
        match ctx.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(&self, name: &str) -> StorageError {
        StorageError::not_found(&self.binding.kind, name)
    }

    /// Key for a name in the context's namespace.
    fn key_for(&self, ctx: &Context, name: &str) -> Result<ObjectKey> {
        let namespace = ctx
            .namespace()
            .ok_or_else(|| StorageError::Invalid("namespace parameter required".to_string()))?;
        if name.is_empty() {
            return Err(StorageError::Invalid("name parameter required".to_string()));
        }
        Ok((namespace.to_string(), name.to_string()))
    }

    /// Validate an incoming object and fill in kind and namespace.
    fn prepare(&self, ctx: &Context, obj: &mut DynamicObject) -> Result<ObjectKey> {
        if obj.types.kind.is_empty() {
            obj.types = self.binding.type_meta();
        } else if obj.types.kind != self.binding.kind {
            return Err(StorageError::Invalid(format!(
                "object kind {} does not match storage kind {}",
                obj.types.kind, self.binding.kind
            )));
        }
        if obj.types.api_version.is_empty() {
            obj.types.api_version = self.binding.api_version.clone();
        }

        match ctx.namespace() {
            Some(ns) if obj.metadata.namespace.is_empty() => {
                obj.metadata.namespace = ns.to_string();
            }
            Some(ns) if obj.metadata.namespace != ns => {
                return Err(StorageError::Invalid(
                    "the namespace of the provided object does not match the namespace sent on the request"
                        .to_string(),
                ));
            }
            None if obj.metadata.namespace.is_empty() => {
                return Err(StorageError::Invalid(
                    "namespace parameter required".to_string(),
                ));
            }
            _ => {}
        }

        if obj.metadata.name.is_empty() {
            return Err(StorageError::Invalid("metadata.name is required".to_string()));
        }

        Ok((obj.metadata.namespace.clone(), obj.metadata.name.clone()))
    }

    /// Parse a watch starting point. `None` means "from now".
    fn parse_resource_version(resource_version: &str) -> Result<Option<u64>> {
        match resource_version {
            "" | "0" => Ok(None),
            value => value.parse::<u64>().map(Some).map_err(|_| {
                StorageError::Invalid(format!("invalid resource version: {}", value))
            }),
        }
    }
}

impl StandardStorage for MemoryStorage {
    fn kind(&self) -> &str {
        &self.binding.kind
    }

    fn list(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
    ) -> Result<DynamicList> {
        Self::check_context(ctx)?;
        let state = self.lock_state()?;

        let items = state
            .objects
            .values()
            .filter(|obj| ctx.namespace().map_or(true, |ns| obj.metadata.namespace == ns))
            .filter(|obj| label.matches(&obj.metadata.labels) && field.matches(obj))
            .cloned()
            .collect();

        Ok(DynamicList {
            types: self.binding.list_type_meta(),
            metadata: ListMeta {
                resource_version: state.revision.to_string(),
            },
            items,
        })
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<DynamicObject> {
        Self::check_context(ctx)?;
        let key = self.key_for(ctx, name)?;
        let state = self.lock_state()?;

        state
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| self.not_found(name))
    }

    fn create(&self, ctx: &Context, mut obj: DynamicObject) -> Result<DynamicObject> {
        Self::check_context(ctx)?;
        let key = self.prepare(ctx, &mut obj)?;
        let mut state = self.lock_state()?;

        if state.objects.contains_key(&key) {
            return Err(StorageError::already_exists(&self.binding.kind, &key.1));
        }

        let revision = state.next_revision();
        obj.metadata.uid = Some(Uuid::new_v4());
        obj.metadata.creation_timestamp = Some(Utc::now());
        obj.metadata.resource_version = revision.to_string();

        state.objects.insert(key, obj.clone());
        state.record(
            revision,
            WatchEvent::new(EventType::Added, obj.clone()),
            self.watch_history,
        );
        debug!(
            kind = %self.binding.kind,
            namespace = %obj.metadata.namespace,
            name = %obj.metadata.name,
            revision,
            "created object"
        );

        Ok(obj)
    }

    fn update(&self, ctx: &Context, mut obj: DynamicObject) -> Result<(DynamicObject, bool)> {
        Self::check_context(ctx)?;
        let key = self.prepare(ctx, &mut obj)?;
        if obj.metadata.resource_version.is_empty() {
            return Err(StorageError::Invalid(
                "metadata.resourceVersion must be specified for an update".to_string(),
            ));
        }
        let mut state = self.lock_state()?;

        let (uid, creation_timestamp) = match state.objects.get(&key) {
            None => return Err(self.not_found(&key.1)),
            Some(existing)
                if existing.metadata.resource_version != obj.metadata.resource_version =>
            {
                return Err(StorageError::conflict(
                    &self.binding.kind,
                    &key.1,
                    "the object has been modified; please apply your changes to the latest version and try again",
                ));
            }
            Some(existing) => (existing.metadata.uid, existing.metadata.creation_timestamp),
        };

        let revision = state.next_revision();
        obj.metadata.uid = uid;
        obj.metadata.creation_timestamp = creation_timestamp;
        obj.metadata.resource_version = revision.to_string();

        state.objects.insert(key, obj.clone());
        state.record(
            revision,
            WatchEvent::new(EventType::Modified, obj.clone()),
            self.watch_history,
        );
        debug!(
            kind = %self.binding.kind,
            namespace = %obj.metadata.namespace,
            name = %obj.metadata.name,
            revision,
            "updated object"
        );

        Ok((obj, false))
    }

    fn delete(
        &self,
        ctx: &Context,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<DynamicObject> {
        Self::check_context(ctx)?;
        let key = self.key_for(ctx, name)?;
        let mut state = self.lock_state()?;

        let expected_uid = options
            .and_then(|opts| opts.preconditions.as_ref())
            .and_then(|pre| pre.uid);
        match state.objects.get(&key) {
            None => return Err(self.not_found(name)),
            Some(existing) => {
                if let Some(uid) = expected_uid {
                    if existing.metadata.uid != Some(uid) {
                        return Err(StorageError::conflict(
                            &self.binding.kind,
                            name,
                            format!("precondition failed: uid in precondition: {}", uid),
                        ));
                    }
                }
            }
        }

        let mut obj = match state.objects.remove(&key) {
            Some(obj) => obj,
            None => return Err(self.not_found(name)),
        };
        let revision = state.next_revision();
        obj.metadata.resource_version = revision.to_string();

        state.record(
            revision,
            WatchEvent::new(EventType::Deleted, obj.clone()),
            self.watch_history,
        );
        debug!(
            kind = %self.binding.kind,
            namespace = %obj.metadata.namespace,
            name = %obj.metadata.name,
            revision,
            "deleted object"
        );

        Ok(obj)
    }

    fn watch(
        &self,
        ctx: &Context,
        label: &LabelSelector,
        field: &FieldSelector,
        resource_version: &str,
    ) -> Result<Watch> {
        Self::check_context(ctx)?;
        let requested = Self::parse_resource_version(resource_version)?;
        let mut state = self.lock_state()?;

        let (sender, watch) = Watch::channel();
        let watcher = Watcher {
            since: requested.unwrap_or(state.revision),
            namespace: ctx.namespace().map(str::to_string),
            label: label.clone(),
            field: field.clone(),
            sender,
        };

        if let Some(since) = requested {
            if since < state.compacted {
                warn!(
                    kind = %self.binding.kind,
                    requested = since,
                    oldest = state.compacted + 1,
                    "watch resource version outside history window"
                );
                return Err(StorageError::Gone(format!(
                    "too old resource version: {} ({})",
                    since, state.compacted
                )));
            }
            for record in &state.history {
                if watcher.wants(record.revision, &record.event) {
                    watcher.sender.send(record.event.clone());
                }
            }
        }

        state.watchers.push(watcher);
        debug!(
            kind = %self.binding.kind,
            label = %label,
            field = %field,
            resource_version,
            "started watch"
        );

        Ok(watch)
    }
}
