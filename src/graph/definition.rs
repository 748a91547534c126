use super::link::{Link, Reroute};
use super::subgraph::SubgraphDefinition;
use crate::error::{GraphError, RecursionError};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Identifier of a node, unique within its owning graph or subgraph.
pub type NodeId = i64;
/// Identifier of a link, unique within its owning graph or subgraph.
pub type LinkId = u32;
/// Identifier of a reroute waypoint.
pub type RerouteId = u32;
/// Flattened, colon-joined id of a node reached through a path of subgraph instances.
pub type ExecutionId = String;

/// Reserved id of the input boundary node inside every subgraph definition.
pub const SUBGRAPH_INPUT_ID: NodeId = -10;
/// Reserved id of the output boundary node inside every subgraph definition.
pub const SUBGRAPH_OUTPUT_ID: NodeId = -20;

/// Returns `true` if `id` belongs to one of the two boundary pseudo-nodes.
pub fn is_boundary_id(id: NodeId) -> bool {
    id == SUBGRAPH_INPUT_ID || id == SUBGRAPH_OUTPUT_ID
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotDirection {
    Input,
    Output,
}

impl SlotDirection {
    /// Single-letter tag used in visit keys and traces, e.g. `3[I]0`.
    pub fn tag(self) -> char {
        match self {
            SlotDirection::Input => 'I',
            SlotDirection::Output => 'O',
        }
    }
}

impl fmt::Display for SlotDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotDirection::Input => write!(f, "input"),
            SlotDirection::Output => write!(f, "output"),
        }
    }
}

/// The data type carried by a slot or link, e.g. `"IMAGE"`.
///
/// `""` and `"*"` are wildcards. A comma-separated list such as `"INT,FLOAT"` accepts
/// any of its members. Comparison ignores case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotType(String);

impl SlotType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wildcard type that connects to everything.
    pub fn any() -> Self {
        Self("*".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        is_wildcard(&self.0)
    }

    /// Whether a connection between a slot of this type and a slot of `other` is valid.
    pub fn accepts(&self, other: &SlotType) -> bool {
        if self.is_wildcard() || other.is_wildcard() {
            return true;
        }
        let a = self.0.to_lowercase();
        let b = other.0.to_lowercase();
        if !a.contains(',') && !b.contains(',') {
            return a == b;
        }
        a.split(',')
            .cartesian_product(b.split(',').collect::<Vec<_>>())
            .any(|(x, y)| is_wildcard(x) || is_wildcard(y) || x.trim() == y.trim())
    }
}

fn is_wildcard(name: &str) -> bool {
    name.is_empty() || name == "*"
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SlotType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SlotType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// When a node runs. Codes match the editor's serialized values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeMode {
    #[default]
    Always,
    OnEvent,
    Never,
    OnTrigger,
    Bypass,
}

impl NodeMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeMode::Always),
            1 => Some(NodeMode::OnEvent),
            2 => Some(NodeMode::Never),
            3 => Some(NodeMode::OnTrigger),
            4 => Some(NodeMode::Bypass),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            NodeMode::Always => 0,
            NodeMode::OnEvent => 1,
            NodeMode::Never => 2,
            NodeMode::OnTrigger => 3,
            NodeMode::Bypass => 4,
        }
    }

    /// Muted and bypassed nodes are never dispatched for execution.
    pub fn is_skipped(self) -> bool {
        matches!(self, NodeMode::Never | NodeMode::Bypass)
    }
}

/// How a node behaves at execution time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A real node that executes.
    #[default]
    Concrete,
    /// An editor-only helper with no execution semantics; resolved through by slot index.
    Virtual,
    /// A placement of a subgraph definition; expanded, never executed itself.
    SubgraphInstance { subgraph_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSlot {
    pub name: String,
    pub slot_type: SlotType,
    pub link: Option<LinkId>,
}

impl InputSlot {
    pub fn new(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSlot {
    pub name: String,
    pub slot_type: SlotType,
    pub links: Vec<LinkId>,
}

impl OutputSlot {
    pub fn new(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            links: Vec::new(),
        }
    }
}

/// A single node placed in a graph or subgraph definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDefinition {
    pub id: NodeId,
    pub node_type: String,
    pub title: Option<String>,
    pub mode: NodeMode,
    pub kind: NodeKind,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
}

impl NodeDefinition {
    pub fn new(id: NodeId, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            title: None,
            mode: NodeMode::Always,
            kind: NodeKind::Concrete,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_mode(mut self, mode: NodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.inputs.push(InputSlot::new(name, slot_type));
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.outputs.push(OutputSlot::new(name, slot_type));
        self
    }

    pub fn subgraph_id(&self) -> Option<Uuid> {
        match self.kind {
            NodeKind::SubgraphInstance { subgraph_id } => Some(subgraph_id),
            _ => None,
        }
    }

    /// `5` or `5 (Title)`, as used in diagnostics.
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => format!("{} ({})", self.id, title),
            _ => self.id.to_string(),
        }
    }
}

/// The nodes, links and reroutes of one scope (the root graph or a subgraph definition).
///
/// Nodes keep their insertion order and are indexed by id. Links are owned by the
/// scope they connect within and never span two scopes.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<NodeDefinition>,
    index: AHashMap<NodeId, usize>,
    links: AHashMap<LinkId, Link>,
    reroutes: AHashMap<RerouteId, Reroute>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[NodeDefinition] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Mutable access to a node. Its `id` must not be changed through this reference.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeDefinition> {
        self.index.get(&id).map(|&i| &mut self.nodes[i])
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NodeDefinition> {
        self.nodes.iter_mut()
    }

    pub fn add_node(&mut self, node: NodeDefinition) -> Result<(), GraphError> {
        if is_boundary_id(node.id) {
            return Err(GraphError::ReservedNodeId(node.id));
        }
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node together with every link attached to it.
    ///
    /// Returns the node and the removed links so that callers owning boundary slots
    /// can update them.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(NodeDefinition, Vec<Link>), GraphError> {
        if !self.index.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let attached: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.origin_id == id || l.target_id == id)
            .map(|l| l.id)
            .sorted()
            .collect();
        let mut removed = Vec::with_capacity(attached.len());
        for link_id in attached {
            removed.push(self.disconnect(link_id)?);
        }

        let position = self.index[&id];
        let node = self.nodes.remove(position);
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();
        Ok((node, removed))
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub(crate) fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.values_mut()
    }

    /// The smallest link id greater than every id in use.
    pub fn next_link_id(&self) -> LinkId {
        self.links.keys().max().map_or(1, |max| max + 1)
    }

    /// Inserts a link without touching any slot references.
    ///
    /// Intended for loaders whose serialized slots already carry their link ids.
    pub fn insert_link(&mut self, link: Link) -> Result<(), GraphError> {
        if self.links.contains_key(&link.id) {
            return Err(GraphError::DuplicateLink(link.id));
        }
        self.links.insert(link.id, link);
        Ok(())
    }

    /// Connects two ordinary nodes. Boundary endpoints are only valid inside a
    /// subgraph definition; use `SubgraphDefinition::connect` for those.
    ///
    /// Any link already plugged into the target input is removed and returned.
    pub fn connect(&mut self, link: Link) -> Result<Option<Link>, GraphError> {
        if link.origin_is_boundary() || link.target_is_boundary() {
            return Err(GraphError::BoundaryOutsideSubgraph(link.id));
        }
        self.attach(link)
    }

    /// Records a link and its slot references. Boundary endpoints are skipped; the
    /// owning subgraph is responsible for them.
    pub(crate) fn attach(&mut self, link: Link) -> Result<Option<Link>, GraphError> {
        if self.links.contains_key(&link.id) {
            return Err(GraphError::DuplicateLink(link.id));
        }
        if !link.origin_is_boundary() {
            self.check_slot(link.origin_id, SlotDirection::Output, link.origin_slot)?;
        }
        let mut replaced = None;
        if !link.target_is_boundary() {
            self.check_slot(link.target_id, SlotDirection::Input, link.target_slot)?;
            let existing = self
                .node(link.target_id)
                .and_then(|n| n.inputs[link.target_slot].link);
            match existing {
                Some(existing) if self.links.contains_key(&existing) => {
                    replaced = Some(self.disconnect(existing)?);
                }
                Some(stale) => {
                    debug!(node = link.target_id, link = stale, "Replacing stale link reference");
                }
                None => {}
            }
        }

        if let Some(origin) = self.node_mut(link.origin_id) {
            origin.outputs[link.origin_slot].links.push(link.id);
        }
        if let Some(target) = self.node_mut(link.target_id) {
            target.inputs[link.target_slot].link = Some(link.id);
        }
        self.links.insert(link.id, link);
        Ok(replaced)
    }

    /// Removes a link and clears the slot references held by ordinary nodes.
    pub fn disconnect(&mut self, id: LinkId) -> Result<Link, GraphError> {
        let link = self.links.remove(&id).ok_or(GraphError::LinkNotFound(id))?;
        if let Some(origin) = self.node_mut(link.origin_id) {
            if let Some(output) = origin.outputs.get_mut(link.origin_slot) {
                output.links.retain(|&l| l != id);
            }
        }
        if let Some(target) = self.node_mut(link.target_id) {
            if let Some(input) = target.inputs.get_mut(link.target_slot) {
                if input.link == Some(id) {
                    input.link = None;
                }
            }
        }
        Ok(link)
    }

    fn check_slot(
        &self,
        node_id: NodeId,
        direction: SlotDirection,
        slot: usize,
    ) -> Result<(), GraphError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let len = match direction {
            SlotDirection::Input => node.inputs.len(),
            SlotDirection::Output => node.outputs.len(),
        };
        if slot >= len {
            return Err(GraphError::SlotIndex {
                node_id,
                direction,
                slot,
            });
        }
        Ok(())
    }

    pub fn reroutes(&self) -> impl Iterator<Item = &Reroute> {
        self.reroutes.values()
    }

    pub fn reroute(&self, id: RerouteId) -> Option<&Reroute> {
        self.reroutes.get(&id)
    }

    pub fn add_reroute(&mut self, reroute: Reroute) {
        self.reroutes.insert(reroute.id, reroute);
    }

    /// The reroute waypoints a link passes through, ordered from origin to target.
    ///
    /// Waypoints are purely visual and never influence resolution. A chain that refers
    /// to a missing reroute ends there; a chain that loops is an error.
    pub fn reroute_chain(&self, link: &Link) -> Result<Vec<RerouteId>, RecursionError> {
        let mut chain = Vec::new();
        let mut seen = AHashSet::new();
        let mut next = link.parent_id;
        while let Some(id) = next {
            let Some(reroute) = self.reroutes.get(&id) else {
                break;
            };
            if !seen.insert(id) {
                return Err(RecursionError::Reroute {
                    link_id: link.id,
                    reroute_id: id,
                });
            }
            chain.push(id);
            next = reroute.parent_id;
        }
        chain.reverse();
        Ok(chain)
    }
}

/// The root graph: its own network plus every subgraph definition it can instantiate.
#[derive(Debug, Clone, Default)]
pub struct GraphDefinition {
    pub network: Network,
    pub subgraphs: AHashMap<Uuid, SubgraphDefinition>,
}

impl GraphDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subgraph definition, replacing any previous definition with the same id.
    pub fn add_subgraph(&mut self, subgraph: SubgraphDefinition) -> Uuid {
        let id = subgraph.id;
        self.subgraphs.insert(id, subgraph);
        id
    }

    pub fn subgraph(&self, id: Uuid) -> Option<&SubgraphDefinition> {
        self.subgraphs.get(&id)
    }

    pub fn subgraph_mut(&mut self, id: Uuid) -> Option<&mut SubgraphDefinition> {
        self.subgraphs.get_mut(&id)
    }

    pub fn add_node(&mut self, node: NodeDefinition) -> Result<(), GraphError> {
        self.network.add_node(node)
    }

    pub fn connect(&mut self, link: Link) -> Result<Option<Link>, GraphError> {
        self.network.connect(link)
    }

    pub fn disconnect(&mut self, id: LinkId) -> Result<Link, GraphError> {
        self.network.disconnect(id)
    }

    /// Every link, in any scope, whose origin or target no longer exists.
    ///
    /// Scopes are reported as `None` for the root graph and `Some(subgraph id)` otherwise.
    pub fn dangling_links(&self) -> Vec<(Option<Uuid>, LinkId)> {
        let root = self
            .network
            .links()
            .filter(|l| !l.endpoints_exist(&self.network, None))
            .map(|l| (None, l.id));
        let nested = self.subgraphs.values().flat_map(|sg| {
            sg.network
                .links()
                .filter(|l| !l.endpoints_exist(&sg.network, Some(sg)))
                .map(|l| (Some(sg.id), l.id))
        });
        root.chain(nested).sorted().collect()
    }
}
