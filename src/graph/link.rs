use super::definition::{
    LinkId, Network, NodeDefinition, NodeId, RerouteId, SUBGRAPH_INPUT_ID, SUBGRAPH_OUTPUT_ID,
    SlotType,
};
use super::scope::LinkNetwork;
use super::subgraph::{BoundaryKind, BoundaryNode, SubgraphDefinition};

/// A directed, typed edge from one output slot to one input slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub slot_type: SlotType,
    pub origin_id: NodeId,
    pub origin_slot: usize,
    pub target_id: NodeId,
    pub target_slot: usize,
    /// The reroute nearest the target end, if the link is routed through waypoints.
    pub parent_id: Option<RerouteId>,
}

impl Link {
    pub fn new(
        id: LinkId,
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
        slot_type: impl Into<SlotType>,
    ) -> Self {
        Self {
            id,
            slot_type: slot_type.into(),
            origin_id,
            origin_slot,
            target_id,
            target_slot,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, reroute: RerouteId) -> Self {
        self.parent_id = Some(reroute);
        self
    }

    /// `true` if the link enters its subgraph through the input boundary node.
    pub fn origin_is_boundary(&self) -> bool {
        self.origin_id == SUBGRAPH_INPUT_ID
    }

    /// `true` if the link leaves its subgraph through the output boundary node.
    pub fn target_is_boundary(&self) -> bool {
        self.target_id == SUBGRAPH_OUTPUT_ID
    }

    /// Resolves the primitive ids stored in the link to the endpoints they currently
    /// point at. Either side is `None` if it no longer exists.
    pub fn resolve<'a, N: LinkNetwork + ?Sized>(&'a self, network: &'a N) -> ResolvedConnection<'a> {
        let origin = if self.origin_is_boundary() {
            network
                .boundary(BoundaryKind::Input)
                .filter(|b| self.origin_slot < b.slots().len())
                .map(|boundary| Endpoint::Boundary {
                    boundary,
                    slot: self.origin_slot,
                })
        } else {
            network.node_by_id(self.origin_id).map(|node| Endpoint::Node {
                node,
                slot: self.origin_slot,
            })
        };

        let target = if self.target_is_boundary() {
            network
                .boundary(BoundaryKind::Output)
                .filter(|b| self.target_slot < b.slots().len())
                .map(|boundary| Endpoint::Boundary {
                    boundary,
                    slot: self.target_slot,
                })
        } else {
            network.node_by_id(self.target_id).map(|node| Endpoint::Node {
                node,
                slot: self.target_slot,
            })
        };

        ResolvedConnection {
            link: self,
            origin,
            target,
        }
    }

    /// Whether both endpoints, including their slots, exist in the given scope.
    pub(crate) fn endpoints_exist(
        &self,
        network: &Network,
        subgraph: Option<&SubgraphDefinition>,
    ) -> bool {
        let origin_ok = if self.origin_is_boundary() {
            subgraph.is_some_and(|sg| self.origin_slot < sg.inputs.len())
        } else {
            network
                .node(self.origin_id)
                .is_some_and(|n| self.origin_slot < n.outputs.len())
        };
        let target_ok = if self.target_is_boundary() {
            subgraph.is_some_and(|sg| self.target_slot < sg.outputs.len())
        } else {
            network
                .node(self.target_id)
                .is_some_and(|n| self.target_slot < n.inputs.len())
        };
        origin_ok && target_ok
    }
}

/// A waypoint that links may be routed through. Rendering aid only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reroute {
    pub id: RerouteId,
    /// The reroute prior to this one, nearer the origin.
    pub parent_id: Option<RerouteId>,
    pub link_ids: Vec<LinkId>,
}

impl Reroute {
    pub fn new(id: RerouteId, parent_id: Option<RerouteId>) -> Self {
        Self {
            id,
            parent_id,
            link_ids: Vec::new(),
        }
    }
}

/// One end of a resolved link.
#[derive(Debug, Clone, Copy)]
pub enum Endpoint<'a> {
    Node { node: &'a NodeDefinition, slot: usize },
    Boundary { boundary: BoundaryNode<'a>, slot: usize },
}

impl<'a> Endpoint<'a> {
    pub fn node_id(&self) -> NodeId {
        match self {
            Endpoint::Node { node, .. } => node.id,
            Endpoint::Boundary { boundary, .. } => boundary.id(),
        }
    }

    pub fn slot(&self) -> usize {
        match self {
            Endpoint::Node { slot, .. } | Endpoint::Boundary { slot, .. } => *slot,
        }
    }
}

/// A link together with the endpoints it currently points at.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedConnection<'a> {
    pub link: &'a Link,
    pub origin: Option<Endpoint<'a>>,
    pub target: Option<Endpoint<'a>>,
}
