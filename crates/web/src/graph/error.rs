use std::fmt;

use thiserror::Error;

use crate::responder::ResponderId;

/// One problem found while validating a responder graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("responder {responder} is registered more than once")]
    DuplicateRegistration { responder: ResponderId },

    #[error("responder {responder} depends on {dependency}, which is not a responder")]
    InvalidDependencyType { responder: ResponderId, dependency: ResponderId },

    #[error("responder {responder} depends on {dependency}, which is not registered")]
    MissingDependency { responder: ResponderId, dependency: ResponderId },

    #[error("responder {responder} depends on {dependency}, which leads back to {responder}")]
    RecursiveDependency { responder: ResponderId, dependency: ResponderId },
}

impl GraphError {
    /// The responder whose registration is at fault.
    pub fn responder(&self) -> ResponderId {
        match self {
            Self::DuplicateRegistration { responder }
            | Self::InvalidDependencyType { responder, .. }
            | Self::MissingDependency { responder, .. }
            | Self::RecursiveDependency { responder, .. } => *responder,
        }
    }
}

/// Every problem found by one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<GraphError>,
}

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<GraphError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[GraphError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphError> {
        self.errors.iter()
    }

    pub fn into_inner(self) -> Vec<GraphError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} responder graph error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = GraphError;
    type IntoIter = std::vec::IntoIter<GraphError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
