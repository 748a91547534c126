use crate::graph::{ExecutionId, LinkId, NodeId, RerouteId, SlotDirection};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while resolving DTO inputs/outputs or expanding subgraph instances.
///
/// Every variant is a distinct failure mode. "Unconnected" is never an error: it is
/// reported as `Ok(None)` by the resolution methods.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "Node '{node_id}' has no graph context: subgraph definition '{subgraph_id}' is not registered"
    )]
    NullGraph {
        node_id: ExecutionId,
        subgraph_id: Uuid,
    },

    #[error("No link '{link_id}' found in scope for flattened id [{node_id}] slot [{slot}]: {message}")]
    InvalidLink {
        node_id: ExecutionId,
        slot: usize,
        link_id: LinkId,
        message: String,
    },

    #[error("No {direction} found for flattened id [{node_id}] slot [{slot}]")]
    SlotIndex {
        node_id: ExecutionId,
        direction: SlotDirection,
        slot: usize,
    },

    #[error("No node found for flattened id [{0}]")]
    NodeNotFound(String),

    #[error("Node [{0}] is not a subgraph instance and cannot contain other nodes")]
    NotAnInstance(ExecutionId),

    #[error(transparent)]
    Recursion(#[from] RecursionError),
}

impl ResolveError {
    /// `true` for failures caused by a single stale or dangling connection, which a
    /// caller may choose to treat as "unconnected" instead of aborting.
    pub fn is_dangling(&self) -> bool {
        matches!(
            self,
            ResolveError::InvalidLink { .. } | ResolveError::SlotIndex { .. }
        )
    }
}

/// A cycle detected during resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecursionError {
    #[error(
        "Circular reference detected while resolving {direction} {slot} of node {node}. This creates an infinite loop in link resolution. UniqueID: [{key}]"
    )]
    Slot {
        direction: SlotDirection,
        slot: usize,
        node: String,
        key: String,
    },

    #[error(
        "Circular reference detected at depth {depth} in node {node} of subgraph '{subgraph}'. This creates an infinite loop in the subgraph hierarchy."
    )]
    Containment {
        node: String,
        subgraph: String,
        depth: usize,
    },

    #[error("Reroute chain of link {link_id} loops back on reroute {reroute_id}")]
    Reroute { link_id: LinkId, reroute_id: RerouteId },
}

/// Errors raised by the editing operations on a graph definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' not found in this scope")]
    NodeNotFound(NodeId),

    #[error("Node id '{0}' is already used in this scope")]
    DuplicateNode(NodeId),

    #[error("Node id '{0}' is reserved for subgraph boundary nodes")]
    ReservedNodeId(NodeId),

    #[error("Link '{0}' not found in this scope")]
    LinkNotFound(LinkId),

    #[error("Link id '{0}' is already used in this scope")]
    DuplicateLink(LinkId),

    #[error("Node '{node_id}' has no {direction} at index {slot}")]
    SlotIndex {
        node_id: NodeId,
        direction: SlotDirection,
        slot: usize,
    },

    #[error("Subgraph definition '{0}' not found")]
    SubgraphNotFound(Uuid),

    #[error("Link '{0}' references a subgraph boundary outside of a subgraph definition")]
    BoundaryOutsideSubgraph(LinkId),
}

/// Errors that can occur when converting a custom user format into a `GraphDefinition`.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Failed to parse workflow JSON: {0}")]
    JsonParseError(String),

    #[error("Could not read workflow file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
