use crate::resolver::{ExecutionPlan, Hop, HopRole, PlannedSource, ResolvedInput};

/// Formats resolution chains and execution plans into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Renders a hop chain as `3[I]0 -> 2[O]0 (bypass) -> ...`.
    pub fn format_hops(hops: &[Hop]) -> String {
        hops.iter()
            .map(Self::format_hop)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn format_hop(hop: &Hop) -> String {
        let key = format!("{}[{}]{}", hop.node_id, hop.direction.tag(), hop.slot);
        match hop.role {
            HopRole::Concrete => key,
            HopRole::Virtual => format!("{} (virtual)", key),
            HopRole::Bypass => format!("{} (bypass)", key),
            HopRole::SubgraphInstance => format!("{} (subgraph)", key),
        }
    }

    /// Explains where one input gets its value from.
    pub fn format_resolution(
        node_id: &str,
        slot: usize,
        resolved: Option<&ResolvedInput<'_>>,
        hops: &[Hop],
    ) -> String {
        let source = match resolved {
            Some(r) => Self::format_source(&r.origin_id, r.origin_slot),
            None => "unconnected".to_string(),
        };
        let mut result = format!("Input {} of [{}] <- {}", slot, node_id, source);
        // A single hop means the input had nothing plugged in.
        if hops.len() > 1 {
            result.push_str(&format!("\n  via {}", Self::format_hops(hops)));
        }
        result
    }

    /// One block per planned node, inputs indented beneath it.
    pub fn format_plan(plan: &ExecutionPlan) -> String {
        let mut result = String::new();
        for node in plan.nodes() {
            match &node.title {
                Some(title) if title != &node.node_type => {
                    result.push_str(&format!("[{}] {} ({})\n", node.id, node.node_type, title))
                }
                _ => result.push_str(&format!("[{}] {}\n", node.id, node.node_type)),
            }
            for input in &node.inputs {
                let source = match &input.source {
                    Some(PlannedSource {
                        origin_id,
                        origin_slot,
                    }) => Self::format_source(origin_id, *origin_slot),
                    None => "unconnected".to_string(),
                };
                result.push_str(&format!(
                    "    {} ({}) <- {}\n",
                    input.name, input.slot_type, source
                ));
            }
        }
        result
    }

    fn format_source(origin_id: &str, origin_slot: usize) -> String {
        format!("[{}] output {}", origin_id, origin_slot)
    }
}
