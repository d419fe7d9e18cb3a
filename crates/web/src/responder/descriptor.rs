use std::fmt;
use std::sync::Arc;

use crate::filter::Filter;
use crate::responder::{AsyncResponder, Dependency, Responder, ResponderId, SuspendableResponder, SyncResponder};
use crate::service::ServiceResolver;

/// The capability a responder was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionKind {
    Sync,
    Async,
    Suspendable,
}

/// A resolved responder instance, tagged with its execution shape.
#[derive(Clone)]
pub(crate) enum Handler {
    Sync(Arc<dyn SyncResponder>),
    Async(Arc<dyn AsyncResponder>),
    Suspendable(Arc<dyn SuspendableResponder>),
}

impl Handler {
    pub(crate) fn kind(&self) -> ExecutionKind {
        match self {
            Self::Sync(_) => ExecutionKind::Sync,
            Self::Async(_) => ExecutionKind::Async,
            Self::Suspendable(_) => ExecutionKind::Suspendable,
        }
    }
}

type Instantiate = fn(&dyn ServiceResolver) -> Option<Handler>;

/// Static registration record of one responder type.
///
/// Built with [`sync`](Self::sync), [`asynchronous`](Self::asynchronous) or
/// [`suspendable`](Self::suspendable), which capture the type identity, its
/// declared dependencies and how to fetch the instance from a
/// [`ServiceResolver`] at compile time.
#[derive(Clone)]
pub struct ResponderDescriptor {
    id: ResponderId,
    kind: ExecutionKind,
    dependencies: Vec<Dependency>,
    filter: Option<Arc<dyn Filter>>,
    instantiate: Instantiate,
}

impl ResponderDescriptor {
    pub fn sync<R: SyncResponder>() -> Self {
        Self::new::<R>(ExecutionKind::Sync, |resolver| {
            let instance = resolve::<R>(resolver)?;
            Some(Handler::Sync(instance))
        })
    }

    pub fn asynchronous<R: AsyncResponder>() -> Self {
        Self::new::<R>(ExecutionKind::Async, |resolver| {
            let instance = resolve::<R>(resolver)?;
            Some(Handler::Async(instance))
        })
    }

    pub fn suspendable<R: SuspendableResponder>() -> Self {
        Self::new::<R>(ExecutionKind::Suspendable, |resolver| {
            let instance = resolve::<R>(resolver)?;
            Some(Handler::Suspendable(instance))
        })
    }

    fn new<R: Responder>(kind: ExecutionKind, instantiate: Instantiate) -> Self {
        Self { id: ResponderId::of::<R>(), kind, dependencies: R::dependencies(), filter: None, instantiate }
    }

    /// Appends a dependency on another responder.
    pub fn depends_on<R: Responder>(self) -> Self {
        self.with_dependency(Dependency::on::<R>())
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Only run this responder for requests `filter` accepts.
    pub fn with_filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn id(&self) -> ResponderId {
        self.id
    }

    pub fn kind(&self) -> ExecutionKind {
        self.kind
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn filter(&self) -> Option<&Arc<dyn Filter>> {
        self.filter.as_ref()
    }

    pub(crate) fn instantiate(&self, resolver: &dyn ServiceResolver) -> Option<Handler> {
        (self.instantiate)(resolver)
    }
}

fn resolve<R: Responder>(resolver: &dyn ServiceResolver) -> Option<Arc<R>> {
    resolver.resolve(ResponderId::of::<R>())?.downcast::<R>().ok()
}

impl fmt::Debug for ResponderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponderDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
