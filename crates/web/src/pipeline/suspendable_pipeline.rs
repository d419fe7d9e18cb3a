use std::sync::Arc;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::pipeline::async_pipeline::AsyncPipeline;
use crate::pipeline::CompiledTree;
use crate::responder::Suspend;
use crate::{Outcome, RequestContext, ResponseStatus};

/// A pipeline that answers without suspending whenever it can.
///
/// The run is polled once up front. If every responder it reached completed
/// without waiting, the outcome is returned as [`Suspend::Ready`]; otherwise
/// the partly advanced run is handed out as [`Suspend::Pending`], to be
/// awaited by the caller.
#[derive(Debug, Clone)]
pub struct SuspendablePipeline {
    inner: AsyncPipeline,
}

impl SuspendablePipeline {
    pub(crate) fn new(tree: Arc<CompiledTree>) -> Self {
        Self { inner: AsyncPipeline::new(tree) }
    }

    pub fn run<'a>(&'a self, ctx: &'a RequestContext, cancel: &CancellationToken) -> Suspend<'a, Outcome<ResponseStatus>> {
        let mut run = self.inner.run(ctx, cancel);

        // pending futures register the real waker again once the caller polls them
        let mut cx = Context::from_waker(noop_waker_ref());
        match run.poll_unpin(&mut cx) {
            Poll::Ready(outcome) => Suspend::Ready(outcome),
            Poll::Pending => Suspend::Pending(run),
        }
    }
}
