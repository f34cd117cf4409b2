//! # Secret Registry
//!
//! A strongly-typed registry for Secret objects on top of a generic,
//! resource-agnostic storage engine.
//!
//! The engine (anything implementing [`StandardStorage`]) owns persistence,
//! resource versions, conflict detection and watch fan-out. The registry is
//! a stateless shim: it forwards context, selectors and resource versions
//! untouched, returns engine errors unchanged, and narrows untyped results to
//! [`Secret`].
//!
//! ## Architecture
//!
//! - **api**: object metadata, the `Secret` resource, untyped objects
//! - **context**: request namespace, identity, deadline, cancellation
//! - **selector**: label and field selectors
//! - **watch**: caller-owned watch handles and events
//! - **storage**: the engine trait and an in-memory engine
//! - **registry**: the typed registry
//!
//! ## Example
//!
//! ```
//! use secret_registry::{new_registry, Context, MemoryStorage, Secret, SecretRegistry};
//!
//! let registry = new_registry(MemoryStorage::for_resource::<Secret>()).unwrap();
//! let ctx = Context::background().with_namespace("default");
//!
//! let created = registry
//!     .create_secret(&ctx, &Secret::new("db-pass").with_data("password", "x"))
//!     .unwrap();
//! assert_eq!(created.metadata.resource_version, "1");
//! assert_eq!(registry.get_secret(&ctx, "db-pass").unwrap(), created);
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod selector;
pub mod storage;
pub mod watch;

pub use api::{DynamicObject, ObjectMeta, Resource, Secret, SecretList};
pub use config::StorageConfig;
pub use context::Context;
pub use error::{KindMismatch, Result, StorageError};
pub use registry::{new_registry, SecretRegistry, SecretStorage, TypedStorage};
pub use selector::{FieldSelector, LabelSelector};
pub use storage::{MemoryStorage, StandardStorage};
pub use watch::{EventType, Watch, WatchEvent};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
