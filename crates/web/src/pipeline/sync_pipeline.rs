use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::pipeline::step::{BranchAccumulator, CompiledStep, Flow, RunState};
use crate::pipeline::CompiledTree;
use crate::{Outcome, RequestContext, ResponseStatus};

/// A pipeline of synchronous responders, run on the calling thread.
#[derive(Debug, Clone)]
pub struct SyncPipeline {
    tree: Arc<CompiledTree>,
}

impl SyncPipeline {
    pub(crate) fn new(tree: Arc<CompiledTree>) -> Self {
        Self { tree }
    }

    pub fn run(&self, ctx: &RequestContext, cancel: &CancellationToken) -> Outcome<ResponseStatus> {
        let mut state = RunState::new(self.tree.len(), cancel);
        let mut branches = BranchAccumulator::default();
        let mut ran = false;

        for root in self.tree.roots() {
            if !root.accepts(ctx) {
                continue;
            }
            ran = true;
            if let Flow::Return(outcome) = branches.absorb(execute(root, ctx, &mut state)) {
                return outcome;
            }
        }

        if !ran {
            return Outcome::success_empty();
        }
        branches.finish()
    }
}

fn execute(step: &CompiledStep, ctx: &RequestContext, state: &mut RunState) -> Outcome<ResponseStatus> {
    if let Some(outcome) = state.enter(step) {
        return outcome;
    }

    let mut branch = BranchAccumulator::default();
    for dependency in step.dependencies() {
        if !dependency.accepts(ctx) {
            continue;
        }
        if let Flow::Return(outcome) = branch.absorb(execute(dependency, ctx, state)) {
            return outcome;
        }
    }

    if state.is_cancelled() {
        return Outcome::cancelled();
    }
    if let Flow::Return(outcome) = branch.absorb(step.invoke_sync(ctx)) {
        return outcome;
    }
    branch.finish()
}
