//! Handler results and the errors they carry.
//!
//! An [`Outcome`] keeps "did it work" and "did it answer" apart: a responder
//! can succeed without producing a value, which lets the pipeline move on to
//! the next one, or fail, which records its errors and also moves on. Only a
//! success with a value stops the pipeline.

use std::error::Error;
use std::fmt;

use thiserror::Error;

use crate::responder::ResponderId;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
pub struct Outcome<T> {
    success: bool,
    value: Option<T>,
    errors: Vec<ResponderError>,
}

impl<T> Outcome<T> {
    pub fn new(success: bool, value: Option<T>, errors: Vec<ResponderError>) -> Self {
        Self { success, value, errors }
    }

    /// Success that answers the request.
    pub fn success(value: T) -> Self {
        Self::new(true, Some(value), Vec::new())
    }

    /// Success that leaves the answer to later responders.
    pub fn success_empty() -> Self {
        Self::new(true, None, Vec::new())
    }

    pub fn failure(error: impl Into<ResponderError>) -> Self {
        Self::failures(vec![error.into()])
    }

    pub fn failures(errors: Vec<ResponderError>) -> Self {
        Self::new(false, None, errors)
    }

    pub fn cancelled() -> Self {
        Self::failure(ResponderError::cancelled())
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Whether a cancellation stopped the run that produced this outcome.
    pub fn is_cancelled(&self) -> bool {
        self.errors.iter().any(ResponderError::is_cancelled)
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn errors(&self) -> &[ResponderError] {
        &self.errors
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn into_errors(self) -> Vec<ResponderError> {
        self.errors
    }

    pub fn into_parts(self) -> (bool, Option<T>, Vec<ResponderError>) {
        (self.success, self.value, self.errors)
    }

    /// Attributes untagged errors to `responder`.
    pub(crate) fn tagged(mut self, responder: ResponderId) -> Self {
        for error in &mut self.errors {
            error.responder.get_or_insert(responder);
        }
        self
    }

    /// Converts into a `Result`, keeping cancellation apart from failure.
    pub fn into_result(self) -> Result<Option<T>, PipelineError> {
        if self.success {
            return Ok(self.value);
        }
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Err(PipelineError::AllBranchesFailed { errors: self.errors })
    }
}

/// Failure of a single responder.
#[derive(Debug)]
pub struct ResponderError {
    responder: Option<ResponderId>,
    kind: ErrorKind,
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("execution failed: {0}")]
    ExecutionFailed(BoxError),

    #[error("panicked: {0}")]
    Panicked(String),

    #[error("cancelled")]
    Cancelled,
}

impl ResponderError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { responder: None, kind }
    }

    pub fn execution_failed<E: Into<BoxError>>(error: E) -> Self {
        Self::new(ErrorKind::ExecutionFailed(error.into()))
    }

    pub fn panicked<S: ToString>(message: S) -> Self {
        Self::new(ErrorKind::Panicked(message.to_string()))
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    pub fn with_responder(mut self, responder: ResponderId) -> Self {
        self.responder = Some(responder);
        self
    }

    /// The responder that failed, once the pipeline has attributed the error.
    pub fn responder(&self) -> Option<ResponderId> {
        self.responder
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// A declared failure or a caught panic; both mean the handler did not complete.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::ExecutionFailed(_) | ErrorKind::Panicked(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.responder {
            Some(responder) => write!(f, "{responder}: {}", self.kind),
            None => fmt::Display::fmt(&self.kind, f),
        }
    }
}

impl Error for ResponderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ErrorKind::ExecutionFailed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<ErrorKind> for ResponderError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<BoxError> for ResponderError {
    fn from(error: BoxError) -> Self {
        Self::execution_failed(error)
    }
}

/// Why a pipeline run produced no answer.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("all branches failed with {} error(s)", .errors.len())]
    AllBranchesFailed { errors: Vec<ResponderError> },

    #[error("pipeline run was cancelled")]
    Cancelled,
}
