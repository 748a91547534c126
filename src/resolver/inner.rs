use super::{ExecutableNode, Frame};
use crate::error::{RecursionError, ResolveError};
use crate::graph::{NodeDefinition, NodeKind, SubgraphDefinition};
use uuid::Uuid;

/// Extends `frames` by one level, refusing to enter a definition that is already
/// being expanded further up the chain.
///
/// The returned chain is a fresh copy, so sibling branches never see each other's frames.
pub(crate) fn enter_subgraph<'a>(
    frames: &[Frame<'a>],
    instance: &'a NodeDefinition,
    subgraph: &'a SubgraphDefinition,
) -> Result<Vec<Frame<'a>>, RecursionError> {
    if frames.iter().any(|frame| frame.subgraph.id == subgraph.id) {
        return Err(RecursionError::Containment {
            node: instance.display_name(),
            subgraph: subgraph.display_name().to_string(),
            depth: frames.len(),
        });
    }
    let mut next = frames.to_vec();
    next.push(Frame { instance, subgraph });
    Ok(next)
}

impl<'a> ExecutableNode<'a> {
    /// Every concrete node transitively contained in this subgraph instance, depth
    /// first in definition order. A node that is not an instance yields itself.
    pub fn inner_nodes(&self) -> Result<Vec<ExecutableNode<'a>>, ResolveError> {
        let NodeKind::SubgraphInstance { subgraph_id } = self.kind() else {
            return Ok(vec![self.clone()]);
        };
        let mut nodes = Vec::new();
        self.expand_into(subgraph_id, &mut nodes)?;
        Ok(nodes)
    }

    fn expand_into(
        &self,
        subgraph_id: Uuid,
        out: &mut Vec<ExecutableNode<'a>>,
    ) -> Result<(), ResolveError> {
        let subgraph = self
            .resolver
            .subgraph(subgraph_id)
            .ok_or_else(|| ResolveError::NullGraph {
                node_id: self.id().to_string(),
                subgraph_id,
            })?;
        let frames = enter_subgraph(&self.frames, self.node, subgraph)?;

        for node in subgraph.network.nodes() {
            let child = ExecutableNode::new(self.resolver, node, frames.clone());
            match child.kind() {
                NodeKind::SubgraphInstance { subgraph_id } => child.expand_into(subgraph_id, out)?,
                NodeKind::Concrete => out.push(child),
                NodeKind::Virtual => {}
            }
        }
        Ok(())
    }
}
