use super::context::{HopRole, ResolutionContext};
use super::inner::enter_subgraph;
use super::{Frame, Resolver};
use crate::error::ResolveError;
use crate::graph::{
    BoundaryKind, Endpoint, ExecutionId, LinkId, NodeDefinition, NodeId, NodeKind, NodeMode,
    Scope, SlotDirection, SlotType,
};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// One real node reached via one particular nesting path.
///
/// Built on demand and cheap to clone: it only borrows the graph. Its flattened id
/// is the chain of enclosing instance ids followed by the node's own id, e.g. `"1:2:3"`.
#[derive(Clone)]
pub struct ExecutableNode<'a> {
    pub(super) resolver: &'a Resolver<'a>,
    pub(super) node: &'a NodeDefinition,
    pub(super) frames: Vec<Frame<'a>>,
    id: ExecutionId,
}

/// The real producer that feeds an input.
#[derive(Debug, Clone)]
pub struct ResolvedInput<'a> {
    pub node: ExecutableNode<'a>,
    pub origin_id: ExecutionId,
    pub origin_slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    pub link_id: Option<LinkId>,
    pub name: String,
    pub slot_type: SlotType,
}

impl<'a> ExecutableNode<'a> {
    pub(crate) fn new(
        resolver: &'a Resolver<'a>,
        node: &'a NodeDefinition,
        frames: Vec<Frame<'a>>,
    ) -> Self {
        let id = frames
            .iter()
            .map(|frame| frame.instance.id)
            .chain(std::iter::once(node.id))
            .join(":");
        Self {
            resolver,
            node,
            frames,
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self) -> &'a NodeDefinition {
        self.node
    }

    pub fn node_type(&self) -> &'a str {
        &self.node.node_type
    }

    pub fn title(&self) -> Option<&'a str> {
        self.node.title.as_deref()
    }

    pub fn mode(&self) -> NodeMode {
        self.node.mode
    }

    pub fn kind(&self) -> NodeKind {
        self.resolver.kind_of(self.node)
    }

    pub fn frames(&self) -> &[Frame<'a>] {
        &self.frames
    }

    /// Ids of the enclosing instance nodes, outermost first.
    pub fn subgraph_node_path(&self) -> Vec<NodeId> {
        self.frames.iter().map(|frame| frame.instance.id).collect()
    }

    /// The instance node this node was reached through, if any.
    pub fn subgraph_node(&self) -> Option<&'a NodeDefinition> {
        self.frames.last().map(|frame| frame.instance)
    }

    /// The definition this node lives in, if any.
    pub fn subgraph_id(&self) -> Option<Uuid> {
        self.scope().subgraph_id()
    }

    pub fn scope(&self) -> Scope<'a> {
        match self.frames.last() {
            Some(frame) => Scope::Subgraph(frame.subgraph),
            None => Scope::Root(self.resolver.graph()),
        }
    }

    /// Muted or bypassed, either itself or through any enclosing instance.
    pub fn is_skipped(&self) -> bool {
        self.node.mode.is_skipped() || self.frames.iter().any(|f| f.instance.mode.is_skipped())
    }

    pub fn inputs(&self) -> Vec<InputSummary> {
        self.node
            .inputs
            .iter()
            .map(|input| InputSummary {
                link_id: input.link,
                name: input.name.clone(),
                slot_type: input.slot_type.clone(),
            })
            .collect()
    }

    fn role(&self) -> HopRole {
        if self.node.mode == NodeMode::Bypass {
            return HopRole::Bypass;
        }
        match self.kind() {
            NodeKind::Concrete => HopRole::Concrete,
            NodeKind::Virtual => HopRole::Virtual,
            NodeKind::SubgraphInstance { .. } => HopRole::SubgraphInstance,
        }
    }

    fn slot_error(&self, direction: SlotDirection, slot: usize) -> ResolveError {
        ResolveError::SlotIndex {
            node_id: self.id.clone(),
            direction,
            slot,
        }
    }

    fn invalid_link(&self, slot: usize, link_id: LinkId, message: &str) -> ResolveError {
        ResolveError::InvalidLink {
            node_id: self.id.clone(),
            slot,
            link_id,
            message: message.to_string(),
        }
    }

    /// Finds the real output feeding input `slot`. `Ok(None)` means unconnected.
    pub fn resolve_input(&self, slot: usize) -> Result<Option<ResolvedInput<'a>>, ResolveError> {
        self.resolve_input_with(slot, &mut ResolutionContext::new())
    }

    pub fn resolve_input_with(
        &self,
        slot: usize,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<ResolvedInput<'a>>, ResolveError> {
        ctx.enter(
            &self.id,
            &self.node.display_name(),
            SlotDirection::Input,
            slot,
            self.role(),
        )?;

        let input = self
            .node
            .inputs
            .get(slot)
            .ok_or_else(|| self.slot_error(SlotDirection::Input, slot))?;
        let Some(link_id) = input.link else {
            return Ok(None);
        };

        let scope = self.scope();
        let link = scope
            .network()
            .link(link_id)
            .ok_or_else(|| self.invalid_link(slot, link_id, "link is not in the scope's link table"))?;

        match scope.resolve(link).origin {
            Some(Endpoint::Boundary { boundary, slot: boundary_slot })
                if boundary.kind() == BoundaryKind::Input =>
            {
                // Entered from outside: continue on the enclosing instance's own input.
                let Some((frame, parents)) = self.frames.split_last() else {
                    return Err(self.invalid_link(slot, link_id, "boundary link outside a subgraph"));
                };
                ExecutableNode::new(self.resolver, frame.instance, parents.to_vec())
                    .resolve_input_with(boundary_slot, ctx)
            }
            Some(Endpoint::Node { node, slot: origin_slot }) => {
                ExecutableNode::new(self.resolver, node, self.frames.clone())
                    .resolve_output_with(origin_slot, &link.slot_type, ctx)
            }
            _ => Err(self.invalid_link(slot, link_id, "origin of the link no longer exists")),
        }
    }

    /// Finds the real node behind output `slot` when it is read as a producer of
    /// `slot_type`. `Ok(None)` means there is no real producer.
    pub fn resolve_output_with(
        &self,
        slot: usize,
        slot_type: &SlotType,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<ResolvedInput<'a>>, ResolveError> {
        ctx.enter(
            &self.id,
            &self.node.display_name(),
            SlotDirection::Output,
            slot,
            self.role(),
        )?;

        let output = self
            .node
            .outputs
            .get(slot)
            .ok_or_else(|| self.slot_error(SlotDirection::Output, slot))?;

        if self.node.mode == NodeMode::Bypass {
            return match self.bypass_slot_index(slot, &output.slot_type, slot_type) {
                Some(index) => self.resolve_input_with(index, ctx),
                None => {
                    debug!(node = %self.id, slot, slot_type = %slot_type, "Bypassed node has no matching input");
                    Ok(None)
                }
            };
        }

        match self.kind() {
            NodeKind::SubgraphInstance { subgraph_id } => {
                self.resolve_subgraph_output(subgraph_id, slot, slot_type, ctx)
            }
            NodeKind::Virtual => {
                if slot < self.node.inputs.len() {
                    self.resolve_input_with(slot, ctx)
                } else {
                    debug!(node = %self.id, slot, "Virtual node has no input at output index");
                    Ok(None)
                }
            }
            NodeKind::Concrete => Ok(Some(ResolvedInput {
                node: self.clone(),
                origin_id: self.id.clone(),
                origin_slot: slot,
            })),
        }
    }

    fn resolve_subgraph_output(
        &self,
        subgraph_id: Uuid,
        slot: usize,
        slot_type: &SlotType,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<ResolvedInput<'a>>, ResolveError> {
        let subgraph = self
            .resolver
            .subgraph(subgraph_id)
            .ok_or_else(|| ResolveError::NullGraph {
                node_id: self.id.clone(),
                subgraph_id,
            })?;
        let frames = enter_subgraph(&self.frames, self.node, subgraph)?;

        let boundary = subgraph
            .slots(BoundaryKind::Output)
            .get(slot)
            .ok_or_else(|| self.slot_error(SlotDirection::Output, slot))?;
        let Some(&link_id) = boundary.link_ids.first() else {
            debug!(node = %self.id, slot, "Subgraph output is not connected inside the definition");
            return Ok(None);
        };

        let scope = Scope::Subgraph(subgraph);
        let link = scope
            .network()
            .link(link_id)
            .ok_or_else(|| self.invalid_link(slot, link_id, "inner link is not in the subgraph's link table"))?;

        match scope.resolve(link).origin {
            Some(Endpoint::Node { node, slot: origin_slot }) => {
                ExecutableNode::new(self.resolver, node, frames)
                    .resolve_output_with(origin_slot, slot_type, ctx)
            }
            Some(Endpoint::Boundary { boundary, slot: input_slot })
                if boundary.kind() == BoundaryKind::Input =>
            {
                self.resolve_input_with(input_slot, ctx)
            }
            _ => Err(self.invalid_link(slot, link_id, "origin of the inner link no longer exists")),
        }
    }

    /// The input a bypassed node forwards for output `slot`, matched by type.
    fn bypass_slot_index(
        &self,
        slot: usize,
        output_type: &SlotType,
        slot_type: &SlotType,
    ) -> Option<usize> {
        let inputs = &self.node.inputs;
        if inputs.is_empty() {
            return None;
        }
        if slot_type.is_wildcard() {
            return Some(if slot < inputs.len() { slot } else { 0 });
        }

        let compatible = |ty: &SlotType| ty.accepts(output_type) && ty.accepts(slot_type);
        if inputs.get(slot).is_some_and(|input| compatible(&input.slot_type)) {
            return Some(slot);
        }

        inputs
            .iter()
            .position(|input| input.slot_type == *slot_type)
            .or_else(|| inputs.iter().position(|input| compatible(&input.slot_type)))
    }
}

impl fmt::Debug for ExecutableNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableNode")
            .field("id", &self.id)
            .field("node_type", &self.node.node_type)
            .field("mode", &self.node.mode)
            .field("kind", &self.kind())
            .finish()
    }
}
