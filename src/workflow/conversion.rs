use super::types::*;
use crate::error::ConversionError;
use crate::graph::{
    GraphDefinition, InputSlot, IntoGraph, Link, Network, NodeDefinition, NodeKind, NodeMode,
    OutputSlot, Reroute, SUBGRAPH_INPUT_ID, SUBGRAPH_OUTPUT_ID, SubgraphDefinition,
};
use ahash::{AHashMap, AHashSet};
use uuid::Uuid;

/// Node types the editor ships as pure UI helpers.
pub const DEFAULT_VIRTUAL_TYPES: &[&str] = &["Reroute", "PrimitiveNode", "Note", "MarkdownNote"];

impl IntoGraph for Workflow {
    fn into_graph(self) -> Result<GraphDefinition, ConversionError> {
        let mut definitions = Vec::new();
        collect_definitions(self.definitions, &mut definitions);

        let mut parsed = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let id = Uuid::parse_str(&definition.id).map_err(|_| {
                ConversionError::ValidationError(format!(
                    "Subgraph '{}' has an invalid id '{}'",
                    definition.name, definition.id
                ))
            })?;
            parsed.push((id, definition));
        }
        let known: AHashSet<Uuid> = parsed.iter().map(|(id, _)| *id).collect();
        if known.len() != parsed.len() {
            return Err(ConversionError::ValidationError(
                "Duplicate subgraph definition ids".to_string(),
            ));
        }

        let mut graph = GraphDefinition::new();
        for (id, definition) in parsed {
            let subgraph = convert_subgraph(id, definition)?;
            graph.add_subgraph(subgraph);
        }

        for node in self.nodes {
            graph.add_node(convert_node(node)?)?;
        }

        let extra = self.extra.unwrap_or_default();
        let parents: AHashMap<u32, u32> = extra
            .link_extensions
            .iter()
            .map(|ext| (ext.id, ext.parent_id))
            .collect();
        for link in self.links {
            let mut link = convert_link(link);
            if link.parent_id.is_none() {
                link.parent_id = parents.get(&link.id).copied();
            }
            graph.network.insert_link(link)?;
        }

        let reroutes = if self.reroutes.is_empty() {
            extra.reroutes
        } else {
            self.reroutes
        };
        add_reroutes(&mut graph.network, reroutes);

        Ok(graph)
    }
}

/// Flattens nested `definitions` blocks, parents before children.
fn collect_definitions(definitions: Option<WorkflowDefinitions>, out: &mut Vec<WorkflowSubgraph>) {
    let Some(definitions) = definitions else {
        return;
    };
    for mut subgraph in definitions.subgraphs {
        let nested = subgraph.definitions.take();
        out.push(subgraph);
        collect_definitions(nested, out);
    }
}

fn convert_subgraph(
    id: Uuid,
    definition: WorkflowSubgraph,
) -> Result<SubgraphDefinition, ConversionError> {
    let mut subgraph = SubgraphDefinition::with_id(id, definition.name);
    for input in definition.inputs {
        subgraph = subgraph.with_input(input.name, input.slot_type);
    }
    for output in definition.outputs {
        subgraph = subgraph.with_output(output.name, output.slot_type);
    }

    for node in definition.nodes {
        subgraph.add_node(convert_node(node)?)?;
    }

    let mut links: Vec<Link> = definition.links.into_iter().map(convert_link).collect();
    links.sort_by_key(|link| link.id);
    for link in links {
        // Boundary slots list their links in id order; out of range references are
        // left for `GraphDefinition::dangling_links` to report.
        if link.origin_id == SUBGRAPH_INPUT_ID {
            if let Some(slot) = subgraph.inputs.get_mut(link.origin_slot) {
                slot.link_ids.push(link.id);
            }
        }
        if link.target_id == SUBGRAPH_OUTPUT_ID {
            if let Some(slot) = subgraph.outputs.get_mut(link.target_slot) {
                slot.link_ids.push(link.id);
            }
        }
        subgraph.network.insert_link(link)?;
    }

    add_reroutes(&mut subgraph.network, definition.reroutes);
    Ok(subgraph)
}

fn convert_node(node: WorkflowNode) -> Result<NodeDefinition, ConversionError> {
    let mode = NodeMode::from_code(node.mode).ok_or_else(|| {
        ConversionError::ValidationError(format!(
            "Node '{}' has unknown mode {}",
            node.id, node.mode
        ))
    })?;

    // Instances name their definition by uuid in place of a node type.
    let kind = match Uuid::parse_str(&node.node_type) {
        Ok(subgraph_id) => NodeKind::SubgraphInstance { subgraph_id },
        Err(_) if DEFAULT_VIRTUAL_TYPES.contains(&node.node_type.as_str()) => NodeKind::Virtual,
        Err(_) => NodeKind::Concrete,
    };

    Ok(NodeDefinition {
        id: node.id,
        node_type: node.node_type,
        title: node.title,
        mode,
        kind,
        inputs: node
            .inputs
            .into_iter()
            .map(|input| InputSlot {
                link: input.link,
                ..InputSlot::new(input.name, input.slot_type)
            })
            .collect(),
        outputs: node
            .outputs
            .into_iter()
            .map(|output| OutputSlot {
                links: output.links.or(output.link_ids).unwrap_or_default(),
                ..OutputSlot::new(output.name, output.slot_type)
            })
            .collect(),
    })
}

fn convert_link(link: WorkflowLink) -> Link {
    let link = link.into_object();
    Link {
        parent_id: link.parent_id,
        ..Link::new(
            link.id,
            link.origin_id,
            link.origin_slot,
            link.target_id,
            link.target_slot,
            link.slot_type,
        )
    }
}

fn add_reroutes(network: &mut Network, reroutes: Vec<WorkflowReroute>) {
    for reroute in reroutes {
        network.add_reroute(Reroute {
            link_ids: reroute.link_ids.unwrap_or_default(),
            ..Reroute::new(reroute.id, reroute.parent_id)
        });
    }
}
