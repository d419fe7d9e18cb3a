use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::filter::Filter;
use crate::responder::{
    AsyncResponder, ExecutionKind, Handler, ResponderId, Suspend, SuspendableResponder, SyncResponder,
};
use crate::{Outcome, RequestContext, ResponderError, ResponseStatus};

/// One compiled responder with its compiled dependencies.
///
/// Steps are shared: a dependency of several responders is compiled once and
/// referenced from each dependent.
pub(crate) struct CompiledStep {
    index: usize,
    id: ResponderId,
    handler: Handler,
    dependencies: Vec<Arc<CompiledStep>>,
    filter: Option<Arc<dyn Filter>>,
}

impl CompiledStep {
    pub(crate) fn new(
        index: usize,
        id: ResponderId,
        handler: Handler,
        dependencies: Vec<Arc<CompiledStep>>,
        filter: Option<Arc<dyn Filter>>,
    ) -> Self {
        Self { index, id, handler, dependencies, filter }
    }

    pub(crate) fn id(&self) -> ResponderId {
        self.id
    }

    pub(crate) fn kind(&self) -> ExecutionKind {
        self.handler.kind()
    }

    pub(crate) fn dependencies(&self) -> &[Arc<CompiledStep>] {
        &self.dependencies
    }

    pub(crate) fn accepts(&self, ctx: &RequestContext) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.matches(ctx))
    }

    /// Runs a synchronous handler; other shapes are rejected when the sync pipeline is built.
    pub(crate) fn invoke_sync(&self, ctx: &RequestContext) -> Outcome<ResponseStatus> {
        let outcome = match &self.handler {
            Handler::Sync(handler) => {
                catch_unwind(AssertUnwindSafe(|| handler.respond(ctx))).unwrap_or_else(|payload| self.caught(payload))
            }
            other => Outcome::failure(ResponderError::execution_failed(format!(
                "{:?} responder invoked synchronously",
                other.kind()
            ))),
        };
        self.finish(outcome)
    }

    /// Runs the handler, awaiting only when it does not answer right away.
    pub(crate) async fn invoke(&self, ctx: &RequestContext) -> Outcome<ResponseStatus> {
        let outcome = match &self.handler {
            Handler::Sync(handler) => {
                catch_unwind(AssertUnwindSafe(|| handler.respond(ctx))).unwrap_or_else(|payload| self.caught(payload))
            }
            Handler::Async(handler) => {
                AssertUnwindSafe(handler.respond(ctx)).catch_unwind().await.unwrap_or_else(|payload| self.caught(payload))
            }
            Handler::Suspendable(handler) => match catch_unwind(AssertUnwindSafe(|| handler.respond(ctx))) {
                Ok(Suspend::Ready(outcome)) => outcome,
                Ok(Suspend::Pending(future)) => {
                    AssertUnwindSafe(future).catch_unwind().await.unwrap_or_else(|payload| self.caught(payload))
                }
                Err(payload) => self.caught(payload),
            },
        };
        self.finish(outcome)
    }

    fn caught(&self, payload: Box<dyn Any + Send>) -> Outcome<ResponseStatus> {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast_ref::<&str>() {
                Some(message) => (*message).to_string(),
                None => String::from("non-string panic payload"),
            },
        };
        warn!(responder = %self.id, cause = %message, "responder panicked");
        Outcome::failure(ResponderError::panicked(message))
    }

    fn finish(&self, outcome: Outcome<ResponseStatus>) -> Outcome<ResponseStatus> {
        trace!(
            responder = %self.id,
            success = outcome.is_success(),
            has_value = outcome.has_value(),
            errors = outcome.errors().len(),
            "responder finished"
        );
        outcome.tagged(self.id)
    }
}

impl fmt::Debug for CompiledStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledStep")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("dependencies", &self.dependencies.iter().map(|step| step.id).collect::<Vec<_>>())
            .finish()
    }
}

/// What to do after absorbing an outcome into a branch.
pub(crate) enum Flow {
    Continue,
    Return(Outcome<ResponseStatus>),
}

/// Error union of one branch, shared by every pipeline flavor.
#[derive(Default)]
pub(crate) struct BranchAccumulator {
    errors: Vec<ResponderError>,
}

impl BranchAccumulator {
    /// A value or a cancellation ends the branch; failures are recorded and the branch goes on.
    pub(crate) fn absorb(&mut self, outcome: Outcome<ResponseStatus>) -> Flow {
        if outcome.is_cancelled() || (outcome.is_success() && outcome.has_value()) {
            return Flow::Return(outcome);
        }
        if !outcome.is_success() {
            self.errors.extend(outcome.into_errors());
        }
        Flow::Continue
    }

    /// Nobody answered: a failure carrying everything recorded so far.
    pub(crate) fn finish(self) -> Outcome<ResponseStatus> {
        Outcome::failures(self.errors)
    }
}

/// Per-invocation bookkeeping, so a shared dependency runs at most once.
pub(crate) struct RunState {
    executed: Vec<bool>,
    cancel: CancellationToken,
}

impl RunState {
    pub(crate) fn new(len: usize, cancel: &CancellationToken) -> Self {
        Self { executed: vec![false; len], cancel: cancel.clone() }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Claims `step` for this run, or returns the outcome to use instead of running it.
    pub(crate) fn enter(&mut self, step: &CompiledStep) -> Option<Outcome<ResponseStatus>> {
        if self.is_cancelled() {
            return Some(Outcome::cancelled());
        }
        if self.executed[step.index] {
            // its errors were recorded by the first visit
            return Some(Outcome::failures(Vec::new()));
        }
        self.executed[step.index] = true;
        None
    }
}
