use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::pipeline::step::{BranchAccumulator, CompiledStep, Flow, RunState};
use crate::pipeline::CompiledTree;
use crate::{Outcome, RequestContext, ResponseStatus};

/// A pipeline that awaits asynchronous and suspended responders.
///
/// Synchronous responders are called inline; a run made of them only
/// completes on the first poll.
#[derive(Debug, Clone)]
pub struct AsyncPipeline {
    tree: Arc<CompiledTree>,
}

impl AsyncPipeline {
    pub(crate) fn new(tree: Arc<CompiledTree>) -> Self {
        Self { tree }
    }

    pub fn run<'a>(&'a self, ctx: &'a RequestContext, cancel: &CancellationToken) -> BoxFuture<'a, Outcome<ResponseStatus>> {
        let mut state = RunState::new(self.tree.len(), cancel);

        async move {
            let mut branches = BranchAccumulator::default();
            let mut ran = false;

            for root in self.tree.roots() {
                if !root.accepts(ctx) {
                    continue;
                }
                ran = true;
                if let Flow::Return(outcome) = branches.absorb(execute(root, ctx, &mut state).await) {
                    return outcome;
                }
            }

            if !ran {
                return Outcome::success_empty();
            }
            branches.finish()
        }
        .boxed()
    }
}

fn execute<'a>(
    step: &'a CompiledStep,
    ctx: &'a RequestContext,
    state: &'a mut RunState,
) -> BoxFuture<'a, Outcome<ResponseStatus>> {
    async move {
        if let Some(outcome) = state.enter(step) {
            return outcome;
        }

        let mut branch = BranchAccumulator::default();
        for dependency in step.dependencies() {
            if !dependency.accepts(ctx) {
                continue;
            }
            if let Flow::Return(outcome) = branch.absorb(execute(dependency, ctx, state).await) {
                return outcome;
            }
        }

        if state.is_cancelled() {
            return Outcome::cancelled();
        }
        if let Flow::Return(outcome) = branch.absorb(step.invoke(ctx).await) {
            return outcome;
        }
        branch.finish()
    }
    .boxed()
}
