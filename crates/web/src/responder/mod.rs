//! Responders: the units of request processing a pipeline is compiled from.
//!
//! A responder is any `Send + Sync` type that can look at a [`RequestContext`]
//! and either answer with a [`ResponseStatus`], decline without a value, or
//! fail. Each responder declares the responders it depends on; dependencies
//! always run before their dependent.
//!
//! Three execution shapes are supported, chosen per type by implementing one
//! of the capability traits:
//!
//! - [`SyncResponder`]: returns its outcome directly
//! - [`AsyncResponder`]: always returns a future
//! - [`SuspendableResponder`]: returns [`Suspend::Ready`] on the fast path and
//!   only allocates a future when it really has to wait
//!
//! # Example
//!
//! ```
//! use strata_web::responder::{Dependency, Responder, SyncResponder};
//! use strata_web::{Outcome, RequestContext, ResponseStatus};
//!
//! struct Authenticate;
//! impl Responder for Authenticate {}
//! impl SyncResponder for Authenticate {
//!     fn respond(&self, ctx: &RequestContext) -> Outcome<ResponseStatus> {
//!         match ctx.header("Authorization") {
//!             Some(_) => Outcome::success_empty(),
//!             None => Outcome::success(ResponseStatus::new(http::StatusCode::UNAUTHORIZED)),
//!         }
//!     }
//! }
//!
//! struct Profile;
//! impl Responder for Profile {
//!     fn dependencies() -> Vec<Dependency> {
//!         vec![Dependency::on::<Authenticate>()]
//!     }
//! }
//! ```

mod descriptor;

pub use descriptor::ExecutionKind;
pub use descriptor::ResponderDescriptor;
pub(crate) use descriptor::Handler;

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::{Outcome, RequestContext, ResponseStatus};

/// Type identity of a responder, used as its registration key.
#[derive(Clone, Copy)]
pub struct ResponderId {
    type_id: TypeId,
    name: &'static str,
}

impl ResponderId {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { type_id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let path = self.name.split('<').next().unwrap_or(self.name);
        match path.rfind("::") {
            Some(index) => &self.name[index + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for ResponderId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ResponderId {}

impl Hash for ResponderId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ResponderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ResponderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A declared dependency of a responder.
///
/// [`Dependency::on`] is the only way to declare a dependency that can be
/// satisfied; [`Dependency::of_type`] records a plain type and is reported as
/// an invalid dependency type at validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    id: ResponderId,
    is_responder: bool,
}

impl Dependency {
    pub fn on<R: Responder>() -> Self {
        Self { id: ResponderId::of::<R>(), is_responder: true }
    }

    pub fn of_type<T: ?Sized + 'static>() -> Self {
        Self { id: ResponderId::of::<T>(), is_responder: false }
    }

    pub fn id(&self) -> ResponderId {
        self.id
    }

    pub fn is_responder(&self) -> bool {
        self.is_responder
    }
}

/// Common supertrait of every responder shape.
pub trait Responder: Send + Sync + 'static {
    /// Responders that must run before this one, in execution order.
    fn dependencies() -> Vec<Dependency>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

pub trait SyncResponder: Responder {
    fn respond(&self, ctx: &RequestContext) -> Outcome<ResponseStatus>;
}

#[async_trait]
pub trait AsyncResponder: Responder {
    async fn respond(&self, ctx: &RequestContext) -> Outcome<ResponseStatus>;
}

pub trait SuspendableResponder: Responder {
    fn respond<'a>(&'a self, ctx: &'a RequestContext) -> Suspend<'a, Outcome<ResponseStatus>>;
}

/// A value that is either available now or still being computed.
pub enum Suspend<'a, T> {
    Ready(T),
    Pending(BoxFuture<'a, T>),
}

impl<'a, T> Suspend<'a, T> {
    pub fn ready(value: T) -> Self {
        Self::Ready(value)
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'a,
    {
        Self::Pending(future.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Waits for the value, without suspending when it is ready already.
    pub async fn resolve(self) -> T {
        match self {
            Self::Ready(value) => value,
            Self::Pending(future) => future.await,
        }
    }

    /// The value, when it was available without suspending.
    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Suspend<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}
