use super::definition::{GraphDefinition, LinkId, Network, NodeDefinition, NodeId};
use super::link::{Link, ResolvedConnection};
use super::subgraph::{BoundaryKind, BoundaryNode, SubgraphDefinition};
use uuid::Uuid;

/// Read-only lookups that link resolution is written against.
///
/// Implemented by the root graph, by subgraph definitions, and by `Scope`.
pub trait LinkNetwork {
    fn node_by_id(&self, id: NodeId) -> Option<&NodeDefinition>;
    fn link_by_id(&self, id: LinkId) -> Option<&Link>;
    /// The boundary node of the given kind. Always `None` for the root graph.
    fn boundary(&self, kind: BoundaryKind) -> Option<BoundaryNode<'_>>;
}

impl LinkNetwork for GraphDefinition {
    fn node_by_id(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.network.node(id)
    }

    fn link_by_id(&self, id: LinkId) -> Option<&Link> {
        self.network.link(id)
    }

    fn boundary(&self, _kind: BoundaryKind) -> Option<BoundaryNode<'_>> {
        None
    }
}

impl LinkNetwork for SubgraphDefinition {
    fn node_by_id(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.network.node(id)
    }

    fn link_by_id(&self, id: LinkId) -> Option<&Link> {
        self.network.link(id)
    }

    fn boundary(&self, kind: BoundaryKind) -> Option<BoundaryNode<'_>> {
        Some(BoundaryNode::new(kind, self))
    }
}

/// The graph a node lives in: either the root graph or one subgraph definition.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Root(&'a GraphDefinition),
    Subgraph(&'a SubgraphDefinition),
}

impl<'a> Scope<'a> {
    pub fn network(self) -> &'a Network {
        match self {
            Scope::Root(graph) => &graph.network,
            Scope::Subgraph(subgraph) => &subgraph.network,
        }
    }

    /// `None` for the root graph.
    pub fn subgraph_id(self) -> Option<Uuid> {
        match self {
            Scope::Root(_) => None,
            Scope::Subgraph(subgraph) => Some(subgraph.id),
        }
    }

    /// Resolves a link owned by this scope, keeping the scope's lifetime on the endpoints.
    pub fn resolve(self, link: &'a Link) -> ResolvedConnection<'a> {
        match self {
            Scope::Root(graph) => link.resolve(graph),
            Scope::Subgraph(subgraph) => link.resolve(subgraph),
        }
    }
}

impl LinkNetwork for Scope<'_> {
    fn node_by_id(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.network().node(id)
    }

    fn link_by_id(&self, id: LinkId) -> Option<&Link> {
        self.network().link(id)
    }

    fn boundary(&self, kind: BoundaryKind) -> Option<BoundaryNode<'_>> {
        match self {
            Scope::Root(_) => None,
            Scope::Subgraph(subgraph) => Some(BoundaryNode::new(kind, subgraph)),
        }
    }
}
