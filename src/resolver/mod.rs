use crate::error::ResolveError;
use crate::graph::{GraphDefinition, NodeDefinition, NodeId, NodeKind, Scope, SubgraphDefinition};
use ahash::AHashSet;
use itertools::Itertools;
use uuid::Uuid;

mod context;
mod inner;
mod node;
mod plan;

pub use context::{Hop, HopRole, ResolutionContext};
pub use node::{ExecutableNode, InputSummary, ResolvedInput};
pub use plan::{ExecutionPlan, PlannedInput, PlannedNode, PlannedSource};

/// What `Resolver::flatten` does with an input whose link is stale or out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DanglingLinks {
    /// Abort the whole flatten with the underlying error.
    #[default]
    Fail,
    /// Log a warning and treat the input as unconnected.
    Drop,
}

/// One step down the subgraph hierarchy: the instance node that was entered and the
/// definition it expands to.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub instance: &'a NodeDefinition,
    pub subgraph: &'a SubgraphDefinition,
}

/// Flattens a graph of nested subgraph instances into real nodes and real connections.
///
/// A `Resolver` borrows the graph read-only for its whole lifetime; every query builds
/// fresh `ExecutableNode` DTOs and reflects the graph exactly as it is.
#[derive(Debug)]
pub struct Resolver<'g> {
    graph: &'g GraphDefinition,
    virtual_types: AHashSet<String>,
    dangling_links: DanglingLinks,
}

pub struct ResolverBuilder<'g> {
    graph: &'g GraphDefinition,
    virtual_types: AHashSet<String>,
    dangling_links: DanglingLinks,
}

impl<'g> ResolverBuilder<'g> {
    pub fn new(graph: &'g GraphDefinition) -> Self {
        Self {
            graph,
            virtual_types: AHashSet::new(),
            dangling_links: DanglingLinks::default(),
        }
    }

    /// Treats every node of `node_type` as virtual, regardless of its declared kind.
    pub fn with_virtual_type(mut self, node_type: &str) -> Self {
        self.virtual_types.insert(node_type.to_string());
        self
    }

    pub fn with_dangling_links(mut self, policy: DanglingLinks) -> Self {
        self.dangling_links = policy;
        self
    }

    pub fn build(self) -> Resolver<'g> {
        Resolver {
            graph: self.graph,
            virtual_types: self.virtual_types,
            dangling_links: self.dangling_links,
        }
    }
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g GraphDefinition) -> Self {
        ResolverBuilder::new(graph).build()
    }

    pub fn builder(graph: &'g GraphDefinition) -> ResolverBuilder<'g> {
        ResolverBuilder::new(graph)
    }

    pub fn graph(&self) -> &'g GraphDefinition {
        self.graph
    }

    pub fn subgraph(&self, id: Uuid) -> Option<&'g SubgraphDefinition> {
        self.graph.subgraph(id)
    }

    pub fn dangling_links(&self) -> DanglingLinks {
        self.dangling_links
    }

    /// The execution-time classification of a node, after applying virtual type overrides.
    pub fn kind_of(&self, node: &NodeDefinition) -> NodeKind {
        match node.kind {
            NodeKind::SubgraphInstance { subgraph_id } => NodeKind::SubgraphInstance { subgraph_id },
            _ if self.virtual_types.contains(&node.node_type) => NodeKind::Virtual,
            kind => kind,
        }
    }

    /// The DTO of a node placed directly in the root graph.
    pub fn node(&self, id: NodeId) -> Result<ExecutableNode<'_>, ResolveError> {
        let node = self
            .graph
            .network
            .node(id)
            .ok_or_else(|| ResolveError::NodeNotFound(id.to_string()))?;
        Ok(ExecutableNode::new(self, node, Vec::new()))
    }

    /// The DTO of the node addressed by a flattened id such as `"1:2:3"`.
    pub fn node_at(&self, execution_id: &str) -> Result<ExecutableNode<'_>, ResolveError> {
        let not_found = || ResolveError::NodeNotFound(execution_id.to_string());
        let segments: Vec<NodeId> = execution_id
            .split(':')
            .map(|s| s.trim().parse::<NodeId>().map_err(|_| not_found()))
            .collect::<Result<_, _>>()?;
        let (&last, path) = segments.split_last().ok_or_else(not_found)?;

        let mut frames: Vec<Frame<'_>> = Vec::new();
        let mut scope = Scope::Root(self.graph);
        for (depth, &segment) in path.iter().enumerate() {
            let instance = scope.network().node(segment).ok_or_else(not_found)?;
            let NodeKind::SubgraphInstance { subgraph_id } = self.kind_of(instance) else {
                return Err(ResolveError::NotAnInstance(
                    path[..=depth].iter().join(":"),
                ));
            };
            let subgraph = self.subgraph(subgraph_id).ok_or_else(|| ResolveError::NullGraph {
                node_id: path[..=depth].iter().join(":"),
                subgraph_id,
            })?;
            frames = inner::enter_subgraph(&frames, instance, subgraph)?;
            scope = Scope::Subgraph(subgraph);
        }

        let node = scope.network().node(last).ok_or_else(not_found)?;
        Ok(ExecutableNode::new(self, node, frames))
    }
}
