use crate::error::RecursionError;
use crate::graph::{ExecutionId, SlotDirection};
use ahash::AHashSet;
use serde::Serialize;

/// How a node took part in one resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HopRole {
    Concrete,
    Virtual,
    Bypass,
    SubgraphInstance,
}

/// One (node, direction, slot) visited while following a connection to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub node_id: ExecutionId,
    pub direction: SlotDirection,
    pub slot: usize,
    pub role: HopRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VisitKey {
    node_id: ExecutionId,
    direction: SlotDirection,
    slot: usize,
}

impl VisitKey {
    fn render(&self) -> String {
        format!("{}[{}]{}", self.node_id, self.direction.tag(), self.slot)
    }
}

/// The state threaded through a single resolution call chain.
///
/// Keeps the set of slots already visited on the current chain, plus the ordered list
/// of hops so a caller can explain how a source was found.
#[derive(Debug, Default, Clone)]
pub struct ResolutionContext {
    visited: AHashSet<VisitKey>,
    hops: Vec<Hop>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a visit, failing if the exact same slot of the same flattened node has
    /// already been entered on this chain.
    pub(crate) fn enter(
        &mut self,
        node_id: &str,
        display: &str,
        direction: SlotDirection,
        slot: usize,
        role: HopRole,
    ) -> Result<(), RecursionError> {
        let key = VisitKey {
            node_id: node_id.to_string(),
            direction,
            slot,
        };
        if self.visited.contains(&key) {
            return Err(RecursionError::Slot {
                direction,
                slot,
                node: display.to_string(),
                key: key.render(),
            });
        }
        self.visited.insert(key);
        self.hops.push(Hop {
            node_id: node_id.to_string(),
            direction,
            slot,
            role,
        });
        Ok(())
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn into_hops(self) -> Vec<Hop> {
        self.hops
    }

    /// Number of distinct slots visited so far.
    pub fn depth(&self) -> usize {
        self.visited.len()
    }
}
