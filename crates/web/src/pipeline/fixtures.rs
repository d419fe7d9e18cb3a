//! Scriptable responders shared by the pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use strata_http::protocol::Method;
use tokio_util::sync::CancellationToken;

use crate::pipeline::CompiledPipeline;
use crate::request::tests::context;
use crate::responder::{
    AsyncResponder, ExecutionKind, Responder, ResponderDescriptor, Suspend, SuspendableResponder, SyncResponder,
};
use crate::service::Services;
use crate::{Outcome, RequestContext, ResponderError, ResponseStatus};

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    /// Succeeds without a value.
    Decline,
    Fail,
    Answer(&'static str),
    Panic,
    /// Cancels the token, then declines.
    Cancel(CancellationToken),
}

pub(crate) struct Probe {
    name: &'static str,
    behavior: Behavior,
    suspend: bool,
    calls: Arc<AtomicUsize>,
}

impl Probe {
    fn answer(&self) -> Outcome<ResponseStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Decline => Outcome::success_empty(),
            Behavior::Fail => Outcome::failure(ResponderError::execution_failed(format!("{} failed", self.name))),
            Behavior::Answer(text) => Outcome::success(ResponseStatus::text(StatusCode::OK, *text)),
            Behavior::Panic => panic!("{} panicked", self.name),
            Behavior::Cancel(token) => {
                token.cancel();
                Outcome::success_empty()
            }
        }
    }
}

pub(crate) trait Probed: SyncResponder + AsyncResponder + SuspendableResponder {
    const NAME: &'static str;
}

macro_rules! probes {
    ($($name:ident),*) => {
        $(
            pub(crate) struct $name(pub(crate) Probe);

            impl Responder for $name {}

            impl Probed for $name {
                const NAME: &'static str = stringify!($name);
            }

            impl SyncResponder for $name {
                fn respond(&self, _ctx: &RequestContext) -> Outcome<ResponseStatus> {
                    self.0.answer()
                }
            }

            #[async_trait]
            impl AsyncResponder for $name {
                async fn respond(&self, _ctx: &RequestContext) -> Outcome<ResponseStatus> {
                    if self.0.suspend {
                        tokio::task::yield_now().await;
                    }
                    self.0.answer()
                }
            }

            impl SuspendableResponder for $name {
                fn respond<'a>(&'a self, _ctx: &'a RequestContext) -> Suspend<'a, Outcome<ResponseStatus>> {
                    if !self.0.suspend {
                        return Suspend::ready(self.0.answer());
                    }
                    Suspend::pending(async move {
                        tokio::task::yield_now().await;
                        self.0.answer()
                    })
                }
            }
        )*
    };
}

probes!(A, B, C, D, E);

pub(crate) fn descriptor<R: Probed>(kind: ExecutionKind) -> ResponderDescriptor {
    match kind {
        ExecutionKind::Sync => ResponderDescriptor::sync::<R>(),
        ExecutionKind::Async => ResponderDescriptor::asynchronous::<R>(),
        ExecutionKind::Suspendable => ResponderDescriptor::suspendable::<R>(),
    }
}

pub(crate) fn ctx(method: Method) -> RequestContext {
    context(method, "/", &[])
}

/// Probe instances plus their call counters.
#[derive(Default)]
pub(crate) struct Harness {
    services: Services,
    calls: HashMap<&'static str, Arc<AtomicUsize>>,
    suspend: bool,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Probes registered afterwards wait once before answering.
    pub(crate) fn suspending(mut self, suspend: bool) -> Self {
        self.suspend = suspend;
        self
    }

    pub(crate) fn with<R: Probed>(mut self, make: impl FnOnce(Probe) -> R, behavior: Behavior) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        self.calls.insert(R::NAME, calls.clone());
        let probe = Probe { name: R::NAME, behavior, suspend: self.suspend, calls };
        self.services.insert(make(probe));
        self
    }

    pub(crate) fn services(&self) -> &Services {
        &self.services
    }

    pub(crate) fn calls(&self, name: &str) -> usize {
        self.calls.get(name).map_or(0, |calls| calls.load(Ordering::SeqCst))
    }

    /// Call counts of A to E.
    pub(crate) fn all_calls(&self) -> Vec<usize> {
        ["A", "B", "C", "D", "E"].into_iter().map(|name| self.calls(name)).collect()
    }

    pub(crate) async fn run(
        &self,
        pipeline: &CompiledPipeline,
        kind: ExecutionKind,
        ctx: &RequestContext,
    ) -> Outcome<ResponseStatus> {
        self.run_with(pipeline, kind, ctx, &CancellationToken::new()).await
    }

    pub(crate) async fn run_with(
        &self,
        pipeline: &CompiledPipeline,
        kind: ExecutionKind,
        ctx: &RequestContext,
        cancel: &CancellationToken,
    ) -> Outcome<ResponseStatus> {
        match kind {
            ExecutionKind::Sync => match pipeline.sync() {
                Ok(pipeline) => pipeline.run(ctx, cancel),
                Err(error) => panic!("{error}"),
            },
            ExecutionKind::Async => pipeline.asynchronous().run(ctx, cancel).await,
            ExecutionKind::Suspendable => pipeline.suspendable().run(ctx, cancel).resolve().await,
        }
    }
}
