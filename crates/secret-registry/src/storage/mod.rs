//! Storage abstraction for registries.
//!
//! This module defines the `StandardStorage` trait, the resource-agnostic
//! engine interface every registry delegates to, and `MemoryStorage`, an
//! in-process engine.
//!
//! ## Architecture
//!
//! ```text
//! SecretRegistry          ← typed, kind-bound API (registry.rs)
//!     ↓
//! StandardStorage         ← untyped CRUD + watch (traits.rs)
//!     ↓
//! MemoryStorage / others  ← persistence, concurrency, watch fan-out
//! ```
//!
//! Engines own resource versions, conflict detection and event delivery.
//! Registries add no state of their own.

pub mod memory;
pub mod traits;

pub use memory::MemoryStorage;
pub use traits::{DeleteOptions, Preconditions, StandardStorage};
