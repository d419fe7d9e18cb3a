//! Responder instance lookup.
//!
//! The compiler never constructs responders itself: it asks a
//! [`ServiceResolver`] for the instance registered under each
//! [`ResponderId`], once per compiled step. Hosts with their own container
//! implement the trait; [`Services`] is the bundled type map.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::responder::ResponderId;

/// Hands out shared responder instances by type identity.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceResolver: Send + Sync {
    /// The instance registered for `id`, or `None` when there is none.
    fn resolve(&self, id: ResponderId) -> Option<Arc<dyn Any + Send + Sync>>;
}

/// A type map of shared instances.
#[derive(Default, Clone)]
pub struct Services {
    entries: HashMap<ResponderId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under its own type, replacing any previous instance.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.insert_shared(Arc::new(value))
    }

    /// Registers an instance that is shared with the caller.
    pub fn insert_shared<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.entries.insert(ResponderId::of::<T>(), value);
        self
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&ResponderId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ServiceResolver for Services {
    fn resolve(&self, id: ResponderId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(&id).cloned()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
