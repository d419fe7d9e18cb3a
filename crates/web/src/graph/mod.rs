//! Responder dependency graph construction and validation.
//!
//! Descriptors are registered into a [`DependencyGraphBuilder`], which
//! [`validate`](DependencyGraphBuilder::validate)s them into an immutable,
//! index-addressed [`DependencyGraph`]:
//!
//! 1. descriptors are indexed by identity; a repeated identity is a
//!    [`GraphError::DuplicateRegistration`] and the first registration wins
//! 2. every declared dependency is resolved to an index, or reported as
//!    [`GraphError::InvalidDependencyType`] / [`GraphError::MissingDependency`]
//! 3. a depth-first walk from every node looks for cycles, reporting at most
//!    one [`GraphError::RecursiveDependency`] per start node, and counts how
//!    many dependents each node has
//!
//! All problems are collected and returned together. Nodes nobody depends on
//! are the roots the pipeline starts from, in registration order.

mod error;

pub use error::GraphError;
pub use error::ValidationErrors;

use std::collections::HashMap;

use tracing::debug;

use crate::responder::{ResponderDescriptor, ResponderId};

#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    descriptors: Vec<ResponderDescriptor>,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ResponderDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn with(mut self, descriptor: ResponderDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn validate(self) -> Result<DependencyGraph, ValidationErrors> {
        let mut errors = Vec::new();

        let mut index = HashMap::with_capacity(self.descriptors.len());
        let mut nodes = Vec::with_capacity(self.descriptors.len());
        for descriptor in self.descriptors {
            let id = descriptor.id();
            if index.contains_key(&id) {
                errors.push(GraphError::DuplicateRegistration { responder: id });
                continue;
            }
            index.insert(id, nodes.len());
            nodes.push(GraphNode { descriptor, dependencies: Vec::new(), required_by: 0 });
        }

        for node in &mut nodes {
            let responder = node.descriptor.id();
            for dependency in node.descriptor.dependencies() {
                if !dependency.is_responder() {
                    errors.push(GraphError::InvalidDependencyType { responder, dependency: dependency.id() });
                    continue;
                }
                match index.get(&dependency.id()) {
                    Some(&target) => node.dependencies.push(target),
                    None => errors.push(GraphError::MissingDependency { responder, dependency: dependency.id() }),
                }
            }
        }

        let mut traversal = Traversal::new(nodes.len());
        for start in 0..nodes.len() {
            if let Err(error) = traversal.visit(&nodes, start) {
                errors.push(error);
            }
        }
        for (node, required_by) in nodes.iter_mut().zip(traversal.required_by) {
            node.required_by = required_by;
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "responder graph rejected");
            return Err(ValidationErrors::new(errors));
        }

        let roots = nodes.iter().enumerate().filter(|(_, node)| node.required_by == 0).map(|(i, _)| i).collect::<Vec<_>>();
        debug!(nodes = nodes.len(), roots = roots.len(), "responder graph validated");
        Ok(DependencyGraph { nodes, index, roots })
    }
}

/// Depth-first walk state, owned by one validation pass.
struct Traversal {
    visited: Vec<bool>,
    on_path: Vec<bool>,
    required_by: Vec<usize>,
}

impl Traversal {
    fn new(len: usize) -> Self {
        Self { visited: vec![false; len], on_path: vec![false; len], required_by: vec![0; len] }
    }

    fn visit(&mut self, nodes: &[GraphNode], current: usize) -> Result<(), GraphError> {
        if self.visited[current] {
            return Ok(());
        }

        self.on_path[current] = true;
        let result = self.visit_dependencies(nodes, current);
        // a failed walk marks the whole path finished so the cycle is reported once
        self.on_path[current] = false;
        self.visited[current] = true;
        result
    }

    fn visit_dependencies(&mut self, nodes: &[GraphNode], current: usize) -> Result<(), GraphError> {
        for &dependency in &nodes[current].dependencies {
            if self.on_path[dependency] {
                return Err(GraphError::RecursiveDependency {
                    responder: nodes[current].id(),
                    dependency: nodes[dependency].id(),
                });
            }
            self.visit(nodes, dependency)?;
            self.required_by[dependency] += 1;
        }
        Ok(())
    }
}

/// A validated registration: descriptor plus resolved dependency indices.
#[derive(Debug)]
pub struct GraphNode {
    descriptor: ResponderDescriptor,
    dependencies: Vec<usize>,
    required_by: usize,
}

impl GraphNode {
    pub fn id(&self) -> ResponderId {
        self.descriptor.id()
    }

    pub fn descriptor(&self) -> &ResponderDescriptor {
        &self.descriptor
    }

    /// Indices of the dependencies, in declaration order.
    pub fn dependencies(&self) -> &[usize] {
        &self.dependencies
    }

    /// Number of registered responders depending on this one.
    pub fn required_by(&self) -> usize {
        self.required_by
    }
}

/// An acyclic, fully resolved responder graph.
#[derive(Debug)]
pub struct DependencyGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<ResponderId, usize>,
    roots: Vec<usize>,
}

impl DependencyGraph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn index_of(&self, id: ResponderId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Nodes no other node depends on, in registration order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
