use super::definition::{
    GraphDefinition, InputSlot, LinkId, Network, NodeDefinition, NodeId, NodeKind, OutputSlot,
    SUBGRAPH_INPUT_ID, SUBGRAPH_OUTPUT_ID, SlotDirection, SlotType,
};
use super::link::Link;
use crate::error::GraphError;
use uuid::Uuid;

/// Which edge of a subgraph a boundary node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    Input,
    Output,
}

impl BoundaryKind {
    /// The reserved node id of this boundary node.
    pub fn id(self) -> NodeId {
        match self {
            BoundaryKind::Input => SUBGRAPH_INPUT_ID,
            BoundaryKind::Output => SUBGRAPH_OUTPUT_ID,
        }
    }

    /// The direction of the boundary slots as seen from inside the subgraph.
    /// Boundary inputs act as outputs inside, boundary outputs act as inputs.
    pub fn inner_direction(self) -> SlotDirection {
        match self {
            BoundaryKind::Input => SlotDirection::Output,
            BoundaryKind::Output => SlotDirection::Input,
        }
    }
}

/// One entry of a subgraph's public interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySlot {
    pub name: String,
    pub slot_type: SlotType,
    /// Inner links attached to this slot.
    pub link_ids: Vec<LinkId>,
}

impl BoundarySlot {
    pub fn new(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            link_ids: Vec::new(),
        }
    }
}

/// A read-only view of the input or output boundary node of a subgraph.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryNode<'a> {
    kind: BoundaryKind,
    subgraph: &'a SubgraphDefinition,
}

impl<'a> BoundaryNode<'a> {
    pub fn new(kind: BoundaryKind, subgraph: &'a SubgraphDefinition) -> Self {
        Self { kind, subgraph }
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    pub fn id(&self) -> NodeId {
        self.kind.id()
    }

    pub fn subgraph(&self) -> &'a SubgraphDefinition {
        self.subgraph
    }

    pub fn slots(&self) -> &'a [BoundarySlot] {
        self.subgraph.slots(self.kind)
    }

    pub fn slot(&self, index: usize) -> Option<&'a BoundarySlot> {
        self.slots().get(index)
    }
}

/// A reusable graph with a public boundary of named, typed inputs and outputs.
#[derive(Debug, Clone)]
pub struct SubgraphDefinition {
    pub id: Uuid,
    pub name: String,
    pub inputs: Vec<BoundarySlot>,
    pub outputs: Vec<BoundarySlot>,
    pub network: Network,
}

impl SubgraphDefinition {
    /// Creates an empty definition with a fresh random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            network: Network::new(),
        }
    }

    /// Appends a boundary input. Use `GraphDefinition::add_subgraph_input` once
    /// instances of this definition exist.
    pub fn with_input(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.inputs.push(BoundarySlot::new(name, slot_type));
        self
    }

    /// Appends a boundary output. Use `GraphDefinition::add_subgraph_output` once
    /// instances of this definition exist.
    pub fn with_output(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.outputs.push(BoundarySlot::new(name, slot_type));
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unnamed Subgraph"
        } else {
            &self.name
        }
    }

    pub fn slots(&self, kind: BoundaryKind) -> &[BoundarySlot] {
        match kind {
            BoundaryKind::Input => &self.inputs,
            BoundaryKind::Output => &self.outputs,
        }
    }

    fn slots_mut(&mut self, kind: BoundaryKind) -> &mut Vec<BoundarySlot> {
        match kind {
            BoundaryKind::Input => &mut self.inputs,
            BoundaryKind::Output => &mut self.outputs,
        }
    }

    pub fn input_node(&self) -> BoundaryNode<'_> {
        BoundaryNode::new(BoundaryKind::Input, self)
    }

    pub fn output_node(&self) -> BoundaryNode<'_> {
        BoundaryNode::new(BoundaryKind::Output, self)
    }

    /// Builds a node that places this definition into another graph. Its slots mirror
    /// the boundary slots one to one.
    pub fn instance_node(&self, id: NodeId) -> NodeDefinition {
        NodeDefinition {
            id,
            node_type: self.id.to_string(),
            title: Some(self.name.clone()),
            mode: Default::default(),
            kind: NodeKind::SubgraphInstance {
                subgraph_id: self.id,
            },
            inputs: self
                .inputs
                .iter()
                .map(|s| InputSlot::new(s.name.clone(), s.slot_type.clone()))
                .collect(),
            outputs: self
                .outputs
                .iter()
                .map(|s| OutputSlot::new(s.name.clone(), s.slot_type.clone()))
                .collect(),
        }
    }

    /// Brings an instance node's slots back in line with the boundary slots.
    ///
    /// Existing slots keep their links and are renamed/retyped in place; missing slots
    /// are appended; surplus slots are truncated and the ids of any links they carried
    /// are returned so the caller can drop them.
    pub fn sync_instance(&self, node: &mut NodeDefinition) -> Vec<LinkId> {
        let mut orphaned = Vec::new();

        for (i, boundary) in self.inputs.iter().enumerate() {
            match node.inputs.get_mut(i) {
                Some(slot) => {
                    slot.name.clone_from(&boundary.name);
                    slot.slot_type = boundary.slot_type.clone();
                }
                None => node
                    .inputs
                    .push(InputSlot::new(boundary.name.clone(), boundary.slot_type.clone())),
            }
        }
        orphaned.extend(
            node.inputs
                .drain(self.inputs.len()..)
                .filter_map(|slot| slot.link),
        );

        for (i, boundary) in self.outputs.iter().enumerate() {
            match node.outputs.get_mut(i) {
                Some(slot) => {
                    slot.name.clone_from(&boundary.name);
                    slot.slot_type = boundary.slot_type.clone();
                }
                None => node
                    .outputs
                    .push(OutputSlot::new(boundary.name.clone(), boundary.slot_type.clone())),
            }
        }
        orphaned.extend(
            node.outputs
                .drain(self.outputs.len()..)
                .flat_map(|slot| slot.links),
        );

        orphaned
    }

    pub fn add_node(&mut self, node: NodeDefinition) -> Result<(), GraphError> {
        self.network.add_node(node)
    }

    /// Removes a node and every link attached to it, including links to the boundary.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeDefinition, GraphError> {
        let (node, removed) = self.network.remove_node(id)?;
        for link in &removed {
            self.forget_boundary_link(link);
        }
        Ok(node)
    }

    /// Connects two endpoints inside this subgraph; either may be a boundary node.
    ///
    /// Inputs accept a single link, and so does each boundary output. Whatever link was
    /// previously plugged into the target is removed and returned.
    pub fn connect(&mut self, link: Link) -> Result<Option<Link>, GraphError> {
        if link.origin_is_boundary() && link.origin_slot >= self.inputs.len() {
            return Err(GraphError::SlotIndex {
                node_id: SUBGRAPH_INPUT_ID,
                direction: SlotDirection::Output,
                slot: link.origin_slot,
            });
        }
        if link.target_is_boundary() && link.target_slot >= self.outputs.len() {
            return Err(GraphError::SlotIndex {
                node_id: SUBGRAPH_OUTPUT_ID,
                direction: SlotDirection::Input,
                slot: link.target_slot,
            });
        }

        let (id, origin_slot, target_slot) = (link.id, link.origin_slot, link.target_slot);
        let (from_boundary, to_boundary) = (link.origin_is_boundary(), link.target_is_boundary());

        let mut replaced = self.network.attach(link)?;
        if let Some(old) = &replaced {
            self.forget_boundary_link(old);
        }
        if from_boundary {
            self.inputs[origin_slot].link_ids.push(id);
        }
        if to_boundary {
            // Ids missing from the link table are stale and simply forgotten.
            let existing: Vec<LinkId> = self.outputs[target_slot]
                .link_ids
                .drain(..)
                .filter(|&old| self.network.link(old).is_some())
                .collect();
            for old in existing {
                replaced = Some(self.disconnect(old)?);
            }
            self.outputs[target_slot].link_ids.push(id);
        }
        Ok(replaced)
    }

    /// Removes a link, clearing references held by nodes and boundary slots.
    pub fn disconnect(&mut self, id: LinkId) -> Result<Link, GraphError> {
        let link = self.network.disconnect(id)?;
        self.forget_boundary_link(&link);
        Ok(link)
    }

    fn forget_boundary_link(&mut self, link: &Link) {
        if link.origin_is_boundary() {
            if let Some(slot) = self.inputs.get_mut(link.origin_slot) {
                slot.link_ids.retain(|&l| l != link.id);
            }
        }
        if link.target_is_boundary() {
            if let Some(slot) = self.outputs.get_mut(link.target_slot) {
                slot.link_ids.retain(|&l| l != link.id);
            }
        }
    }
}

/// A scope whose links can be dropped with full bookkeeping.
trait EditableScope {
    fn network(&self) -> &Network;
    fn network_mut(&mut self) -> &mut Network;
    fn drop_link(&mut self, id: LinkId) -> Result<Link, GraphError>;
}

impl EditableScope for Network {
    fn network(&self) -> &Network {
        self
    }

    fn network_mut(&mut self) -> &mut Network {
        self
    }

    fn drop_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        self.disconnect(id)
    }
}

impl EditableScope for SubgraphDefinition {
    fn network(&self) -> &Network {
        &self.network
    }

    fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    fn drop_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        self.disconnect(id)
    }
}

/// Removes slot `index` from every instance of `subgraph_id` placed in `scope`,
/// dropping the links it carried and re-indexing links on later slots.
fn remove_instance_slot<S: EditableScope>(
    scope: &mut S,
    subgraph_id: Uuid,
    kind: BoundaryKind,
    index: usize,
) -> Result<(), GraphError> {
    let instances: Vec<NodeId> = scope
        .network()
        .nodes()
        .iter()
        .filter(|n| n.subgraph_id() == Some(subgraph_id))
        .map(|n| n.id)
        .collect();

    for node_id in instances {
        let attached: Vec<LinkId> = match scope.network().node(node_id) {
            Some(node) => match kind {
                BoundaryKind::Input => node
                    .inputs
                    .get(index)
                    .and_then(|s| s.link)
                    .into_iter()
                    .collect(),
                BoundaryKind::Output => node
                    .outputs
                    .get(index)
                    .map(|s| s.links.clone())
                    .unwrap_or_default(),
            },
            None => continue,
        };
        for link_id in attached {
            scope.drop_link(link_id)?;
        }

        let network = scope.network_mut();
        if let Some(node) = network.node_mut(node_id) {
            match kind {
                BoundaryKind::Input if index < node.inputs.len() => {
                    node.inputs.remove(index);
                }
                BoundaryKind::Output if index < node.outputs.len() => {
                    node.outputs.remove(index);
                }
                _ => {}
            }
        }
        for link in network.links_mut() {
            match kind {
                BoundaryKind::Input if link.target_id == node_id && link.target_slot > index => {
                    link.target_slot -= 1;
                }
                BoundaryKind::Output if link.origin_id == node_id && link.origin_slot > index => {
                    link.origin_slot -= 1;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Editing a subgraph's public interface. Every change is propagated to all instance
/// nodes of that definition, in the root graph and in every subgraph definition.
impl GraphDefinition {
    pub fn add_subgraph_input(
        &mut self,
        id: Uuid,
        name: impl Into<String>,
        slot_type: impl Into<SlotType>,
    ) -> Result<usize, GraphError> {
        self.add_boundary_slot(id, BoundaryKind::Input, BoundarySlot::new(name, slot_type))
    }

    pub fn add_subgraph_output(
        &mut self,
        id: Uuid,
        name: impl Into<String>,
        slot_type: impl Into<SlotType>,
    ) -> Result<usize, GraphError> {
        self.add_boundary_slot(id, BoundaryKind::Output, BoundarySlot::new(name, slot_type))
    }

    pub fn remove_subgraph_input(
        &mut self,
        id: Uuid,
        index: usize,
    ) -> Result<BoundarySlot, GraphError> {
        self.remove_boundary_slot(id, BoundaryKind::Input, index)
    }

    pub fn remove_subgraph_output(
        &mut self,
        id: Uuid,
        index: usize,
    ) -> Result<BoundarySlot, GraphError> {
        self.remove_boundary_slot(id, BoundaryKind::Output, index)
    }

    pub fn rename_subgraph_input(
        &mut self,
        id: Uuid,
        index: usize,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.rename_boundary_slot(id, BoundaryKind::Input, index, name.into())
    }

    pub fn rename_subgraph_output(
        &mut self,
        id: Uuid,
        index: usize,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.rename_boundary_slot(id, BoundaryKind::Output, index, name.into())
    }

    fn add_boundary_slot(
        &mut self,
        id: Uuid,
        kind: BoundaryKind,
        slot: BoundarySlot,
    ) -> Result<usize, GraphError> {
        let subgraph = self
            .subgraphs
            .get_mut(&id)
            .ok_or(GraphError::SubgraphNotFound(id))?;
        let slots = subgraph.slots_mut(kind);
        slots.push(slot.clone());
        let index = slots.len() - 1;

        self.for_each_instance(id, |node| match kind {
            BoundaryKind::Input => node
                .inputs
                .push(InputSlot::new(slot.name.clone(), slot.slot_type.clone())),
            BoundaryKind::Output => node
                .outputs
                .push(OutputSlot::new(slot.name.clone(), slot.slot_type.clone())),
        });
        Ok(index)
    }

    fn remove_boundary_slot(
        &mut self,
        id: Uuid,
        kind: BoundaryKind,
        index: usize,
    ) -> Result<BoundarySlot, GraphError> {
        let subgraph = self
            .subgraphs
            .get_mut(&id)
            .ok_or(GraphError::SubgraphNotFound(id))?;
        if index >= subgraph.slots(kind).len() {
            return Err(GraphError::SlotIndex {
                node_id: kind.id(),
                direction: kind.inner_direction(),
                slot: index,
            });
        }

        let inner_links = subgraph.slots(kind)[index].link_ids.clone();
        for link_id in inner_links {
            subgraph.disconnect(link_id)?;
        }
        let removed = subgraph.slots_mut(kind).remove(index);
        for link in subgraph.network.links_mut() {
            match kind {
                BoundaryKind::Input if link.origin_is_boundary() && link.origin_slot > index => {
                    link.origin_slot -= 1;
                }
                BoundaryKind::Output if link.target_is_boundary() && link.target_slot > index => {
                    link.target_slot -= 1;
                }
                _ => {}
            }
        }

        remove_instance_slot(&mut self.network, id, kind, index)?;
        for scope in self.subgraphs.values_mut() {
            remove_instance_slot(scope, id, kind, index)?;
        }
        Ok(removed)
    }

    fn rename_boundary_slot(
        &mut self,
        id: Uuid,
        kind: BoundaryKind,
        index: usize,
        name: String,
    ) -> Result<(), GraphError> {
        let subgraph = self
            .subgraphs
            .get_mut(&id)
            .ok_or(GraphError::SubgraphNotFound(id))?;
        let slot = subgraph
            .slots_mut(kind)
            .get_mut(index)
            .ok_or(GraphError::SlotIndex {
                node_id: kind.id(),
                direction: kind.inner_direction(),
                slot: index,
            })?;
        slot.name.clone_from(&name);

        self.for_each_instance(id, |node| match kind {
            BoundaryKind::Input => {
                if let Some(input) = node.inputs.get_mut(index) {
                    input.name.clone_from(&name);
                }
            }
            BoundaryKind::Output => {
                if let Some(output) = node.outputs.get_mut(index) {
                    output.name.clone_from(&name);
                }
            }
        });
        Ok(())
    }

    fn for_each_instance(&mut self, id: Uuid, mut f: impl FnMut(&mut NodeDefinition)) {
        let scopes = std::iter::once(&mut self.network)
            .chain(self.subgraphs.values_mut().map(|sg| &mut sg.network));
        for network in scopes {
            for node in network.nodes_mut() {
                if node.subgraph_id() == Some(id) {
                    f(node);
                }
            }
        }
    }
}
