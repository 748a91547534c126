use super::{DanglingLinks, ExecutableNode, Resolver};
use crate::error::ResolveError;
use crate::graph::{ExecutionId, NodeKind, SlotType};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info, warn};

/// The flattened, executable view of a whole graph.
///
/// Nodes are in execution order: every producer precedes its consumers, and nodes
/// that do not depend on each other keep the order of the graph. Every `source`
/// names a node of the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub nodes: Vec<PlannedNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedNode {
    pub id: ExecutionId,
    pub node_type: String,
    pub title: Option<String>,
    pub inputs: Vec<PlannedInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInput {
    pub name: String,
    pub slot_type: SlotType,
    /// `None` when nothing real is plugged in.
    pub source: Option<PlannedSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSource {
    pub origin_id: ExecutionId,
    pub origin_slot: usize,
}

impl ExecutionPlan {
    pub fn nodes(&self) -> &[PlannedNode] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&PlannedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of inputs across all nodes that resolved to a real producer.
    pub fn connection_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| &node.inputs)
            .filter(|input| input.source.is_some())
            .count()
    }
}

impl ExecutionPlan {
    fn drop_unplanned_sources(&mut self) {
        let planned: AHashSet<ExecutionId> = self.nodes.iter().map(|n| n.id.clone()).collect();
        for node in &mut self.nodes {
            for input in &mut node.inputs {
                let unplanned = input
                    .source
                    .as_ref()
                    .is_some_and(|s| !planned.contains(&s.origin_id));
                if unplanned {
                    debug!(
                        node = %node.id,
                        input = %input.name,
                        "Producer is muted or bypassed, input left unconnected"
                    );
                    input.source = None;
                }
            }
        }
    }

    /// Stable topological order; ties keep graph order. Nodes on a cycle go last, in
    /// graph order.
    fn sort_by_dependencies(&mut self) {
        let order = {
            let index: AHashMap<&str, usize> = self
                .nodes
                .iter()
                .enumerate()
                .map(|(i, n)| (n.id.as_str(), i))
                .collect();
            let mut dependents = vec![Vec::new(); self.nodes.len()];
            let mut pending = vec![0usize; self.nodes.len()];
            for (i, node) in self.nodes.iter().enumerate() {
                for source in node.inputs.iter().filter_map(|input| input.source.as_ref()) {
                    if let Some(&producer) = index.get(source.origin_id.as_str()) {
                        dependents[producer].push(i);
                        pending[i] += 1;
                    }
                }
            }

            let mut ready: BinaryHeap<Reverse<usize>> = pending
                .iter()
                .enumerate()
                .filter(|&(_, &count)| count == 0)
                .map(|(i, _)| Reverse(i))
                .collect();
            let mut order = Vec::with_capacity(self.nodes.len());
            while let Some(Reverse(i)) = ready.pop() {
                order.push(i);
                for &dependent in &dependents[i] {
                    pending[dependent] -= 1;
                    if pending[dependent] == 0 {
                        ready.push(Reverse(dependent));
                    }
                }
            }
            if order.len() < self.nodes.len() {
                warn!(
                    nodes = self.nodes.len() - order.len(),
                    "Plan contains a dependency cycle"
                );
                order.extend((0..self.nodes.len()).filter(|&i| pending[i] > 0));
            }
            order
        };

        let mut slots: Vec<Option<PlannedNode>> = self.nodes.drain(..).map(Some).collect();
        self.nodes = order.into_iter().filter_map(|i| slots[i].take()).collect();
    }
}

impl PlannedNode {
    pub fn input(&self, name: &str) -> Option<&PlannedInput> {
        self.inputs.iter().find(|input| input.name == name)
    }
}

impl Resolver<'_> {
    /// Expands every subgraph instance and resolves every input of every node that
    /// will actually execute. Muted and bypassed nodes are left out, together with
    /// everything inside a muted or bypassed instance. Inputs fed by a node that was
    /// left out are reported as unconnected.
    pub fn flatten(&self) -> Result<ExecutionPlan, ResolveError> {
        let mut plan = ExecutionPlan::default();

        for node in self.graph().network.nodes() {
            let dto = ExecutableNode::new(self, node, Vec::new());
            if dto.is_skipped() {
                continue;
            }
            for inner in dto.inner_nodes()? {
                if inner.kind() == NodeKind::Concrete && !inner.is_skipped() {
                    plan.nodes.push(self.plan_node(&inner)?);
                }
            }
        }

        plan.drop_unplanned_sources();
        plan.sort_by_dependencies();
        info!(
            nodes = plan.len(),
            connections = plan.connection_count(),
            "Flattened graph"
        );
        Ok(plan)
    }

    fn plan_node(&self, node: &ExecutableNode<'_>) -> Result<PlannedNode, ResolveError> {
        let mut inputs = Vec::with_capacity(node.node().inputs.len());
        for (slot, input) in node.node().inputs.iter().enumerate() {
            let source = match node.resolve_input(slot) {
                Ok(resolved) => resolved.map(|r| PlannedSource {
                    origin_id: r.origin_id,
                    origin_slot: r.origin_slot,
                }),
                Err(e) if e.is_dangling() && self.dangling_links() == DanglingLinks::Drop => {
                    warn!(node = %node.id(), slot, error = %e, "Dropping dangling link");
                    None
                }
                Err(e) => return Err(e),
            };
            inputs.push(PlannedInput {
                name: input.name.clone(),
                slot_type: input.slot_type.clone(),
                source,
            });
        }

        Ok(PlannedNode {
            id: node.id().to_string(),
            node_type: node.node_type().to_string(),
            title: node.title().map(str::to_string),
            inputs,
        })
    }
}
