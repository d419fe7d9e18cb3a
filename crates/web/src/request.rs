//! Per-request state shared by every responder of one pipeline run.
//!
//! [`RequestContext`] wraps the parsed head, the not yet consumed body, and a
//! typed metadata table responders use to hand data to the responders that
//! run after them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use http::{Extensions, Uri};
use serde::de::DeserializeOwned;
use strata_http::protocol::{HeaderCollection, HttpVersion, Method, Request, RequestBody, RequestHead};

/// The request as seen by responders.
///
/// The head is immutable. The body can be taken once, by whichever responder
/// needs it first. Metadata entries are keyed by type and cloned out on read.
#[derive(Debug)]
pub struct RequestContext {
    head: RequestHead,
    body: Mutex<Option<RequestBody>>,
    metadata: Mutex<Extensions>,
}

impl RequestContext {
    pub fn new(head: RequestHead, body: RequestBody) -> Self {
        Self { head, body: Mutex::new(Some(body)), metadata: Mutex::new(Extensions::new()) }
    }

    /// A context without body, e.g. for requests built in tests.
    pub fn from_head(head: RequestHead) -> Self {
        Self::new(head, RequestBody::empty())
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> Method {
        self.head.method()
    }

    pub fn route(&self) -> &Uri {
        self.head.route()
    }

    pub fn path(&self) -> &str {
        self.head.path()
    }

    pub fn version(&self) -> HttpVersion {
        self.head.version()
    }

    pub fn headers(&self) -> &HeaderCollection {
        self.head.headers()
    }

    /// First value of the header `name`, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers().get(name)
    }

    /// Deserializes the query string, treating a missing one as empty.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(self.head.query().unwrap_or_default())
    }

    /// Hands out the body; `None` once it has been taken.
    pub fn take_body(&self) -> Option<RequestBody> {
        lock(&self.body).take()
    }

    pub fn has_body(&self) -> bool {
        lock(&self.body).is_some()
    }

    /// Stores `value`, returning the previous entry of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&self, value: T) -> Option<T> {
        lock(&self.metadata).insert(value)
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        lock(&self.metadata).get::<T>().cloned()
    }

    pub fn remove<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        lock(&self.metadata).remove::<T>()
    }

    pub fn contains<T: Clone + Send + Sync + 'static>(&self) -> bool {
        lock(&self.metadata).get::<T>().is_some()
    }
}

impl From<Request> for RequestContext {
    fn from(request: Request) -> Self {
        let (head, body) = request.into_parts();
        Self::new(head, body)
    }
}

// a panicking responder must not lock the others out
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
