//! Composable request filters that gate responders.
//!
//! A descriptor carrying a filter only runs for requests the filter accepts:
//! - Filter requests based on HTTP methods
//! - Filter requests based on headers or path prefixes
//! - Combine multiple filters using AND/OR logic
//! - Create custom filters using closures
//!
//! All filters are `Send + Sync`, so a compiled pipeline holding them can be
//! shared across connections.
//!
//! # Examples
//!
//! ```
//! use strata_web::filter::{all_filter, get_method, header, path_prefix};
//!
//! let mut api = all_filter();
//! api.and(get_method()).and(path_prefix("/api")).and(header("Accept", "application/json"));
//! ```

use strata_http::protocol::header::normalize_name;
use strata_http::protocol::Method;

use crate::RequestContext;

/// Core trait for request filtering.
pub trait Filter: Send + Sync {
    /// Returns `true` if the request should be handled, `false` otherwise.
    fn matches(&self, req: &RequestContext) -> bool;
}

/// A filter that wraps a closure.
struct FnFilter<F: Fn(&RequestContext) -> bool>(F);

impl<F: Fn(&RequestContext) -> bool + Send + Sync> Filter for FnFilter<F> {
    fn matches(&self, req: &RequestContext) -> bool {
        (self.0)(req)
    }
}

/// Creates a new filter from a closure.
///
/// ```
/// use strata_web::filter::fn_filter;
///
/// let has_query = fn_filter(|req| req.route().query().is_some());
/// ```
pub fn fn_filter<F>(f: F) -> impl Filter
where
    F: Fn(&RequestContext) -> bool + Send + Sync,
{
    FnFilter(f)
}

/// Creates a filter that always returns true.
pub fn true_filter() -> TrueFilter {
    TrueFilter
}

/// Creates a filter that always returns false.
pub fn false_filter() -> FalseFilter {
    FalseFilter
}

#[derive(Debug)]
pub struct TrueFilter;
impl Filter for TrueFilter {
    #[inline]
    fn matches(&self, _req: &RequestContext) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct FalseFilter;
impl Filter for FalseFilter {
    #[inline]
    fn matches(&self, _req: &RequestContext) -> bool {
        false
    }
}

/// Creates a new OR-composed filter chain.
pub fn any_filter() -> AnyFilter {
    AnyFilter::new()
}

/// Compose filters with OR logic.
///
/// An empty chain accepts every request.
pub struct AnyFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AnyFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    pub fn or<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AnyFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(req))
    }
}

/// Creates a new AND-composed filter chain.
pub fn all_filter() -> AllFilter {
    AllFilter::new()
}

/// Compose filters with AND logic.
///
/// An empty chain accepts every request.
pub struct AllFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AllFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AllFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.iter().all(|filter| filter.matches(req))
    }
}

/// A filter that matches one HTTP method.
#[derive(Debug)]
pub struct MethodFilter(Method);

impl Filter for MethodFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.0 == req.method()
    }
}

/// Creates a filter for any method.
pub fn method(method: Method) -> MethodFilter {
    MethodFilter(method)
}

macro_rules! method_filter {
    ($method:ident, $variant:ident) => {
        #[doc = concat!("Creates a filter that matches HTTP ", stringify!($variant), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter(Method::$variant)
        }
    };
}

method_filter!(get_method, Get);
method_filter!(post_method, Post);
method_filter!(put_method, Put);
method_filter!(delete_method, Delete);
method_filter!(head_method, Head);
method_filter!(options_method, Options);
method_filter!(connect_method, Connect);
method_filter!(patch_method, Patch);
method_filter!(trace_method, Trace);

/// Creates a filter that matches a header name and exact value.
///
/// The name is matched case-insensitively; any value of a repeated header may match.
pub fn header(name: impl AsRef<str>, value: impl Into<String>) -> HeaderFilter {
    HeaderFilter { name: normalize_name(name.as_ref()).into_owned(), value: value.into() }
}

#[derive(Debug)]
pub struct HeaderFilter {
    name: String,
    value: String,
}

impl Filter for HeaderFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        req.headers().get_all(&self.name).any(|value| value == self.value)
    }
}

/// Creates a filter that matches request paths starting with `prefix`.
pub fn path_prefix(prefix: impl Into<String>) -> PathPrefixFilter {
    PathPrefixFilter(prefix.into())
}

#[derive(Debug)]
pub struct PathPrefixFilter(String);

impl Filter for PathPrefixFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        req.path().starts_with(&self.0)
    }
}
