//! Request-scoped context passed through to storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::StorageError;

/// Identity of the caller making a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub uid: String,
    pub groups: Vec<String>,
}

impl UserInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Namespace, identity, deadline and cancellation for a single request.
///
/// Registries never look inside; engines decide how to honor each part.
/// Clones share the same cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    namespace: Option<String>,
    user: Option<UserInfo>,
    deadline: Option<DateTime<Utc>>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context with no namespace, user or deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Namespace the request is scoped to, if any. Empty counts as none.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The error a request under this context should fail with, if any.
    pub fn err(&self) -> Option<StorageError> {
        if self.is_cancelled() {
            return Some(StorageError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Utc::now() >= deadline => Some(StorageError::DeadlineExceeded),
            _ => None,
        }
    }
}
