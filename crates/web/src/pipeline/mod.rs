//! Compiling a validated responder graph into a callable pipeline.
//!
//! [`compile`] instantiates every responder once through the host's
//! [`ServiceResolver`] and links the instances into a shared tree of steps.
//! One compiled tree backs three flavors:
//!
//! - [`SyncPipeline`]: plain function calls, only for graphs made of
//!   [`SyncResponder`](crate::responder::SyncResponder)s
//! - [`AsyncPipeline`]: returns a boxed future
//! - [`SuspendablePipeline`]: returns [`Suspend`](crate::responder::Suspend),
//!   ready unless some responder actually had to wait
//!
//! # Execution
//!
//! Every flavor runs the same control flow. Roots run in registration order.
//! Within a branch, dependencies run in declaration order before the
//! responder itself:
//!
//! - a failure records its errors and the branch carries on
//! - a success with a value ends the whole run with that value
//! - a branch nobody answered is a failure carrying all recorded errors
//! - a dependency shared by several branches runs once per run
//! - a panic is caught and recorded as an error of the panicking responder
//! - cancellation is checked before every step and ends the run
//!
//! A run with no root to execute, because the graph is empty or every root's
//! filter rejected the request, is a success without value.

mod async_pipeline;
mod step;
mod suspendable_pipeline;
mod sync_pipeline;

#[cfg(test)]
mod fixtures;

pub use async_pipeline::AsyncPipeline;
pub use suspendable_pipeline::SuspendablePipeline;
pub use sync_pipeline::SyncPipeline;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::graph::{DependencyGraph, DependencyGraphBuilder, ValidationErrors};
use crate::pipeline::step::CompiledStep;
use crate::responder::{ExecutionKind, ResponderDescriptor, ResponderId};
use crate::service::ServiceResolver;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("no instance of responder {responder} could be resolved")]
    Unresolved { responder: ResponderId },

    #[error("responder {responder} is {kind:?} and cannot run in a synchronous pipeline")]
    AsyncInSyncPipeline { responder: ResponderId, kind: ExecutionKind },
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[derive(Debug)]
pub(crate) struct CompiledTree {
    roots: Vec<Arc<CompiledStep>>,
    steps: Vec<Arc<CompiledStep>>,
}

impl CompiledTree {
    pub(crate) fn roots(&self) -> &[Arc<CompiledStep>] {
        &self.roots
    }

    pub(crate) fn len(&self) -> usize {
        self.steps.len()
    }
}

/// The compiled responder tree, from which the pipeline flavors are taken.
#[derive(Debug, Clone)]
pub struct CompiledPipeline {
    tree: Arc<CompiledTree>,
}

impl CompiledPipeline {
    /// A synchronous pipeline, if every responder is synchronous.
    pub fn sync(&self) -> Result<SyncPipeline, CompileError> {
        if let Some(step) = self.tree.steps.iter().find(|step| step.kind() != ExecutionKind::Sync) {
            return Err(CompileError::AsyncInSyncPipeline { responder: step.id(), kind: step.kind() });
        }
        Ok(SyncPipeline::new(self.tree.clone()))
    }

    pub fn asynchronous(&self) -> AsyncPipeline {
        AsyncPipeline::new(self.tree.clone())
    }

    pub fn suspendable(&self) -> SuspendablePipeline {
        SuspendablePipeline::new(self.tree.clone())
    }

    /// Identities of the roots, in execution order.
    pub fn roots(&self) -> Vec<ResponderId> {
        self.tree.roots.iter().map(|step| step.id()).collect()
    }

    /// Number of compiled responders.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.steps.is_empty()
    }
}

/// Instantiates and links every responder of `graph`.
pub fn compile(graph: &DependencyGraph, resolver: &dyn ServiceResolver) -> Result<CompiledPipeline, CompileError> {
    let mut compiled = vec![None; graph.len()];

    let mut roots = Vec::with_capacity(graph.roots().len());
    for &root in graph.roots() {
        roots.push(compile_step(graph, root, resolver, &mut compiled)?);
    }

    let steps = compiled.into_iter().flatten().collect::<Vec<_>>();
    debug!(steps = steps.len(), roots = roots.len(), "compiled responder pipeline");
    Ok(CompiledPipeline { tree: Arc::new(CompiledTree { roots, steps }) })
}

fn compile_step(
    graph: &DependencyGraph,
    index: usize,
    resolver: &dyn ServiceResolver,
    compiled: &mut [Option<Arc<CompiledStep>>],
) -> Result<Arc<CompiledStep>, CompileError> {
    if let Some(step) = &compiled[index] {
        return Ok(step.clone());
    }

    let node = &graph.nodes()[index];
    let mut dependencies = Vec::with_capacity(node.dependencies().len());
    for &dependency in node.dependencies() {
        dependencies.push(compile_step(graph, dependency, resolver, compiled)?);
    }

    let descriptor = node.descriptor();
    let handler = descriptor.instantiate(resolver).ok_or(CompileError::Unresolved { responder: node.id() })?;
    let step = Arc::new(CompiledStep::new(index, node.id(), handler, dependencies, descriptor.filter().cloned()));
    compiled[index] = Some(step.clone());
    Ok(step)
}

/// Registers, validates and compiles in one go.
///
/// ```
/// use strata_web::pipeline::PipelineBuilder;
/// use strata_web::responder::{ResponderDescriptor, Responder, SyncResponder};
/// use strata_web::service::Services;
/// use strata_web::{Outcome, RequestContext, ResponseStatus};
///
/// struct Hello;
/// impl Responder for Hello {}
/// impl SyncResponder for Hello {
///     fn respond(&self, _ctx: &RequestContext) -> Outcome<ResponseStatus> {
///         Outcome::success(ResponseStatus::ok())
///     }
/// }
///
/// let services = Services::new().with(Hello);
/// let pipeline = PipelineBuilder::new()
///     .responder(ResponderDescriptor::sync::<Hello>())
///     .build(&services)
///     .unwrap()
///     .sync()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    graph: DependencyGraphBuilder,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responder(mut self, descriptor: ResponderDescriptor) -> Self {
        self.graph.register(descriptor);
        self
    }

    pub fn build(self, resolver: &dyn ServiceResolver) -> Result<CompiledPipeline, BuildError> {
        let graph = self.graph.validate()?;
        Ok(compile(&graph, resolver)?)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{descriptor, ctx, Behavior, Harness, A, B, C, D, E};
    use super::*;
    use crate::filter::{get_method, post_method};
    use crate::graph::GraphError;
    use crate::service::MockServiceResolver;
    use crate::{ErrorKind, PipelineError};
    use std::any::Any;
    use strata_http::protocol::Method;
    use tokio_util::sync::CancellationToken;

    const KINDS: [ExecutionKind; 3] = [ExecutionKind::Sync, ExecutionKind::Async, ExecutionKind::Suspendable];

    #[tokio::test]
    async fn failing_dependency_then_answer_skips_later_roots() {
        for kind in KINDS {
            let harness = Harness::new()
                .with(A, Behavior::Fail)
                .with(B, Behavior::Answer("ok"))
                .with(C, Behavior::Answer("unreachable"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind).depends_on::<A>())
                .responder(descriptor::<C>(kind))
                .build(harness.services())
                .unwrap();

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;

            assert!(outcome.is_success(), "{kind:?}");
            assert_eq!(outcome.value().and_then(|v| v.body()).map(|b| &b[..]), Some(&b"ok"[..]));
            assert_eq!(harness.calls("A"), 1);
            assert_eq!(harness.calls("B"), 1);
            assert_eq!(harness.calls("C"), 0);
        }
    }

    #[tokio::test]
    async fn first_answering_root_wins() {
        for kind in KINDS {
            let harness = Harness::new()
                .with(A, Behavior::Decline)
                .with(B, Behavior::Answer("second"))
                .with(C, Behavior::Answer("third"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind))
                .responder(descriptor::<C>(kind))
                .build(harness.services())
                .unwrap();
            assert_eq!(pipeline.roots().len(), 3);

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;

            assert_eq!(outcome.value().and_then(|v| v.body()).map(|b| &b[..]), Some(&b"second"[..]));
            assert_eq!((harness.calls("A"), harness.calls("B"), harness.calls("C")), (1, 1, 0));
        }
    }

    #[tokio::test]
    async fn shared_dependency_runs_once() {
        for kind in KINDS {
            let harness = Harness::new()
                .with(A, Behavior::Fail)
                .with(B, Behavior::Decline)
                .with(C, Behavior::Decline)
                .with(D, Behavior::Answer("d"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind).depends_on::<A>())
                .responder(descriptor::<C>(kind).depends_on::<A>())
                .responder(descriptor::<D>(kind))
                .build(harness.services())
                .unwrap();

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;

            assert!(outcome.has_value());
            assert_eq!(harness.calls("A"), 1, "{kind:?}");
            assert_eq!(harness.calls("B") + harness.calls("C") + harness.calls("D"), 3);
        }
    }

    #[tokio::test]
    async fn unanswered_run_aggregates_tagged_errors() {
        for kind in KINDS {
            let harness = Harness::new().with(A, Behavior::Fail).with(B, Behavior::Decline).with(C, Behavior::Fail);
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind).depends_on::<A>())
                .responder(descriptor::<C>(kind))
                .build(harness.services())
                .unwrap();

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;

            assert!(!outcome.is_success() && !outcome.has_value());
            let responders = outcome.errors().iter().map(|e| e.responder()).collect::<Vec<_>>();
            assert_eq!(responders, [Some(ResponderId::of::<A>()), Some(ResponderId::of::<C>())]);

            match outcome.into_result() {
                Err(PipelineError::AllBranchesFailed { errors }) => assert_eq!(errors.len(), 2),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn panics_become_tagged_errors() {
        for kind in KINDS {
            let harness = Harness::new().with(A, Behavior::Panic).with(B, Behavior::Answer("after panic"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind))
                .build(harness.services())
                .unwrap();

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;
            assert!(outcome.has_value(), "{kind:?}");

            let harness = Harness::new().with(A, Behavior::Panic);
            let pipeline = PipelineBuilder::new().responder(descriptor::<A>(kind)).build(harness.services()).unwrap();

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;
            let error = &outcome.errors()[0];
            assert_eq!(error.responder(), Some(ResponderId::of::<A>()));
            assert!(matches!(error.kind(), ErrorKind::Panicked(message) if message == "A panicked"));
            assert!(error.is_execution_failure());
        }
    }

    #[tokio::test]
    async fn cancellation_stops_between_steps() {
        for kind in KINDS {
            let cancel = CancellationToken::new();
            let harness = Harness::new()
                .with(A, Behavior::Cancel(cancel.clone()))
                .with(B, Behavior::Answer("b"))
                .with(C, Behavior::Answer("c"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind).depends_on::<A>())
                .responder(descriptor::<C>(kind))
                .build(harness.services())
                .unwrap();

            let outcome = harness.run_with(&pipeline, kind, &ctx(Method::Get), &cancel).await;

            assert!(outcome.is_cancelled(), "{kind:?}");
            assert!(matches!(outcome.into_result(), Err(PipelineError::Cancelled)));
            assert_eq!((harness.calls("A"), harness.calls("B"), harness.calls("C")), (1, 0, 0));
        }
    }

    #[test]
    fn cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let harness = Harness::new().with(A, Behavior::Answer("a"));
        let pipeline = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Sync))
            .build(harness.services())
            .unwrap();

        let outcome = pipeline.sync().unwrap().run(&ctx(Method::Get), &cancel);
        assert!(outcome.is_cancelled());
        assert_eq!(harness.calls("A"), 0);
    }

    #[tokio::test]
    async fn empty_and_filtered_runs_succeed_without_value() {
        for kind in KINDS {
            let empty = PipelineBuilder::new().build(Harness::new().services()).unwrap();
            assert!(empty.is_empty());
            let outcome = Harness::new().run(&empty, kind, &ctx(Method::Get)).await;
            assert!(outcome.is_success() && !outcome.has_value());

            let harness = Harness::new().with(A, Behavior::Answer("posted")).with(B, Behavior::Answer("fetched"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind).with_filter(post_method()))
                .responder(descriptor::<B>(kind).with_filter(get_method()))
                .build(harness.services())
                .unwrap();

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;
            assert_eq!(outcome.value().and_then(|v| v.body()).map(|b| &b[..]), Some(&b"fetched"[..]));
            assert_eq!(harness.calls("A"), 0);

            let outcome = harness.run(&pipeline, kind, &ctx(Method::Delete)).await;
            assert!(outcome.is_success() && !outcome.has_value());
        }
    }

    #[tokio::test]
    async fn filtered_dependency_is_skipped() {
        let harness = Harness::new().with(A, Behavior::Fail).with(B, Behavior::Answer("b"));
        let pipeline = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Async).with_filter(post_method()))
            .responder(descriptor::<B>(ExecutionKind::Async).depends_on::<A>())
            .build(harness.services())
            .unwrap();

        let outcome = harness.run(&pipeline, ExecutionKind::Async, &ctx(Method::Get)).await;
        assert!(outcome.has_value());
        assert_eq!(harness.calls("A"), 0);
    }

    #[tokio::test]
    async fn flavors_agree() {
        let run = |kind: ExecutionKind, suspend: bool| async move {
            let harness = Harness::new()
                .suspending(suspend)
                .with(A, Behavior::Fail)
                .with(B, Behavior::Decline)
                .with(C, Behavior::Decline)
                .with(D, Behavior::Fail)
                .with(E, Behavior::Answer("e"));
            let pipeline = PipelineBuilder::new()
                .responder(descriptor::<A>(kind))
                .responder(descriptor::<B>(kind).depends_on::<A>())
                .responder(descriptor::<C>(kind).depends_on::<B>().depends_on::<D>())
                .responder(descriptor::<D>(kind))
                .responder(descriptor::<E>(kind))
                .build(harness.services())
                .unwrap();
            let outcome = harness.run(&pipeline, kind, &ctx(Method::Get)).await;
            let value = outcome.value().cloned();
            (value, harness.all_calls())
        };

        let expected = run(ExecutionKind::Sync, false).await;
        assert_eq!(expected.0.as_ref().and_then(|v| v.body()).map(|b| &b[..]), Some(&b"e"[..]));
        assert_eq!(expected.1, [1, 1, 1, 1, 1]);

        for (kind, suspend) in [
            (ExecutionKind::Async, false),
            (ExecutionKind::Async, true),
            (ExecutionKind::Suspendable, false),
            (ExecutionKind::Suspendable, true),
        ] {
            assert_eq!(run(kind, suspend).await, expected, "{kind:?} suspending: {suspend}");
        }
    }

    #[tokio::test]
    async fn suspendable_pipeline_is_ready_unless_a_responder_waits() {
        let ready = Harness::new().with(A, Behavior::Answer("a"));
        let pipeline = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Suspendable))
            .build(ready.services())
            .unwrap()
            .suspendable();
        let request = ctx(Method::Get);
        assert!(pipeline.run(&request, &CancellationToken::new()).is_ready());

        let waiting = Harness::new().suspending(true).with(A, Behavior::Answer("a"));
        let pipeline = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Suspendable))
            .build(waiting.services())
            .unwrap()
            .suspendable();
        let suspended = pipeline.run(&request, &CancellationToken::new());
        assert!(!suspended.is_ready());
        assert!(suspended.resolve().await.has_value());
    }

    #[test]
    fn sync_pipeline_rejects_async_responders() {
        let harness = Harness::new().with(A, Behavior::Decline).with(B, Behavior::Decline);
        let pipeline = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Sync))
            .responder(descriptor::<B>(ExecutionKind::Async).depends_on::<A>())
            .build(harness.services())
            .unwrap();

        assert_eq!(
            pipeline.sync().unwrap_err(),
            CompileError::AsyncInSyncPipeline { responder: ResponderId::of::<B>(), kind: ExecutionKind::Async }
        );
    }

    #[test]
    fn missing_instance_is_unresolved() {
        let harness = Harness::new().with(A, Behavior::Decline);
        let error = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Sync))
            .responder(descriptor::<B>(ExecutionKind::Sync))
            .build(harness.services())
            .unwrap_err();

        assert!(matches!(
            error,
            BuildError::Compile(CompileError::Unresolved { responder }) if responder == ResponderId::of::<B>()
        ));
    }

    #[test]
    fn invalid_graph_is_a_build_error() {
        let harness = Harness::new().with(A, Behavior::Decline);
        let error = PipelineBuilder::new()
            .responder(descriptor::<A>(ExecutionKind::Sync).depends_on::<B>())
            .build(harness.services())
            .unwrap_err();

        match error {
            BuildError::Validation(errors) => assert_eq!(
                errors.errors(),
                &[GraphError::MissingDependency { responder: ResponderId::of::<A>(), dependency: ResponderId::of::<B>() }]
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn shared_dependency_is_instantiated_once() {
        let harness = Harness::new().with(A, Behavior::Decline).with(B, Behavior::Decline).with(C, Behavior::Decline);
        let graph = DependencyGraphBuilder::new()
            .with(descriptor::<A>(ExecutionKind::Sync))
            .with(descriptor::<B>(ExecutionKind::Sync).depends_on::<A>())
            .with(descriptor::<C>(ExecutionKind::Sync).depends_on::<A>())
            .validate()
            .unwrap();

        let mut resolver = MockServiceResolver::new();
        for id in [ResponderId::of::<A>(), ResponderId::of::<B>(), ResponderId::of::<C>()] {
            let instance: Option<Arc<dyn Any + Send + Sync>> = harness.services().resolve(id);
            resolver.expect_resolve().withf(move |requested| *requested == id).times(1).return_const(instance);
        }

        let pipeline = compile(&graph, &resolver).unwrap();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.roots(), [ResponderId::of::<B>(), ResponderId::of::<C>()]);
    }
}
