//! Responder dependency graphs, compiled into short-circuiting request pipelines.
//!
//! A responder is a unit of request handling that may depend on other
//! responders. Hosts register each responder with a static
//! [`ResponderDescriptor`](responder::ResponderDescriptor); the
//! [`DependencyGraphBuilder`](graph::DependencyGraphBuilder) validates the set
//! and [`compile`](pipeline::compile) turns it into one callable pipeline
//! that runs dependencies first, stops at the first responder producing a
//! value, and collects the errors of those that failed.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use strata_web::filter::get_method;
//! use strata_web::pipeline::PipelineBuilder;
//! use strata_web::responder::{Responder, ResponderDescriptor, SyncResponder};
//! use strata_web::service::Services;
//! use strata_web::{Outcome, RequestContext, ResponseStatus, Server};
//!
//! struct Hello;
//!
//! impl Responder for Hello {}
//!
//! impl SyncResponder for Hello {
//!     fn respond(&self, _ctx: &RequestContext) -> Outcome<ResponseStatus> {
//!         Outcome::success(ResponseStatus::text(StatusCode::OK, "hello world"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let services = Services::new().with(Hello);
//!     let pipeline = PipelineBuilder::new()
//!         .responder(ResponderDescriptor::sync::<Hello>().with_filter(get_method()))
//!         .build(&services)
//!         .unwrap()
//!         .asynchronous();
//!
//!     let server = Server::builder().address("127.0.0.1:8080").pipeline(pipeline).build().unwrap();
//!     server.start().await;
//! }
//! ```

mod outcome;
mod request;
mod response;
mod server;

pub mod filter;
pub mod graph;
pub mod pipeline;
pub mod responder;
pub mod service;

pub use outcome::BoxError;
pub use outcome::ErrorKind;
pub use outcome::Outcome;
pub use outcome::PipelineError;
pub use outcome::ResponderError;
pub use request::RequestContext;
pub use response::ResponseStatus;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
