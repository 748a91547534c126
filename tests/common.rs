//! Common test utilities for building graphs and subgraph definitions.
use tenkai::prelude::*;
use uuid::Uuid;

pub const IMAGE: &str = "IMAGE";

/// A source with a single `IMAGE` output.
#[allow(dead_code)]
pub fn source(id: i64) -> NodeDefinition {
    NodeDefinition::new(id, "LoadImage").with_output("IMAGE", IMAGE)
}

/// A sink with a single `IMAGE` input.
#[allow(dead_code)]
pub fn sink(id: i64) -> NodeDefinition {
    NodeDefinition::new(id, "SaveImage").with_input("images", IMAGE)
}

/// An `IMAGE -> IMAGE` filter.
#[allow(dead_code)]
pub fn filter(id: i64) -> NodeDefinition {
    NodeDefinition::new(id, "Blur")
        .with_input("image", IMAGE)
        .with_output("IMAGE", IMAGE)
}

#[allow(dead_code)]
pub fn image_link(id: u32, origin: i64, origin_slot: usize, target: i64, target_slot: usize) -> Link {
    Link::new(id, origin, origin_slot, target, target_slot, IMAGE)
}

/// Definition `D`: boundary input 0 -> inner filter `7` -> boundary output 0.
#[allow(dead_code)]
pub fn filter_subgraph(name: &str) -> SubgraphDefinition {
    let mut subgraph = SubgraphDefinition::new(name)
        .with_input("image", IMAGE)
        .with_output("IMAGE", IMAGE);
    subgraph.add_node(filter(7)).unwrap();
    subgraph.connect(image_link(1, -10, 0, 7, 0)).unwrap();
    subgraph.connect(image_link(2, 7, 0, -20, 0)).unwrap();
    subgraph
}

/// A definition whose only content wires `inner` (an instance of another
/// definition) between its boundary slots.
#[allow(dead_code)]
pub fn wrapping_subgraph(name: &str, inner: &SubgraphDefinition, instance_id: i64) -> SubgraphDefinition {
    let mut subgraph = SubgraphDefinition::new(name)
        .with_input("image", IMAGE)
        .with_output("IMAGE", IMAGE);
    subgraph.add_node(inner.instance_node(instance_id)).unwrap();
    subgraph.connect(image_link(1, -10, 0, instance_id, 0)).unwrap();
    subgraph.connect(image_link(2, instance_id, 0, -20, 0)).unwrap();
    subgraph
}

/// Root: source `1` -> instance `2` of `D` -> sink `3`.
#[allow(dead_code)]
pub fn boundary_round_trip_graph() -> (GraphDefinition, Uuid) {
    let subgraph = filter_subgraph("D");
    let mut graph = GraphDefinition::new();
    graph.add_node(source(1)).unwrap();
    graph.add_node(subgraph.instance_node(2)).unwrap();
    graph.add_node(sink(3)).unwrap();
    graph.connect(image_link(1, 1, 0, 2, 0)).unwrap();
    graph.connect(image_link(2, 2, 0, 3, 0)).unwrap();
    let id = graph.add_subgraph(subgraph);
    (graph, id)
}

/// Two instances of the same definition side by side:
/// `1 -> 10 -> 11` and `2 -> 20 -> 21`.
#[allow(dead_code)]
pub fn twin_instances_graph() -> GraphDefinition {
    let subgraph = filter_subgraph("D");
    let mut graph = GraphDefinition::new();
    graph.add_node(source(1)).unwrap();
    graph.add_node(source(2)).unwrap();
    graph.add_node(subgraph.instance_node(10)).unwrap();
    graph.add_node(subgraph.instance_node(20)).unwrap();
    graph.add_node(sink(11)).unwrap();
    graph.add_node(sink(21)).unwrap();
    graph.connect(image_link(1, 1, 0, 10, 0)).unwrap();
    graph.connect(image_link(2, 10, 0, 11, 0)).unwrap();
    graph.connect(image_link(3, 2, 0, 20, 0)).unwrap();
    graph.connect(image_link(4, 20, 0, 21, 0)).unwrap();
    graph.add_subgraph(subgraph);
    graph
}

/// Root: source `1` -> bypassed filter `2` -> sink `3`.
#[allow(dead_code)]
pub fn bypass_graph() -> GraphDefinition {
    let mut graph = GraphDefinition::new();
    graph.add_node(source(1)).unwrap();
    graph.add_node(filter(2).with_mode(NodeMode::Bypass)).unwrap();
    graph.add_node(sink(3)).unwrap();
    graph.connect(image_link(1, 1, 0, 2, 0)).unwrap();
    graph.connect(image_link(2, 2, 0, 3, 0)).unwrap();
    graph
}

/// Definition `A` whose body contains an instance of `A`, placed once in the root
/// as node `2` feeding sink `3`.
#[allow(dead_code)]
pub fn self_containing_graph() -> GraphDefinition {
    let mut subgraph = SubgraphDefinition::new("A")
        .with_input("image", IMAGE)
        .with_output("IMAGE", IMAGE);
    let nested = subgraph.instance_node(5);
    subgraph.add_node(nested).unwrap();
    subgraph.connect(image_link(1, -10, 0, 5, 0)).unwrap();
    subgraph.connect(image_link(2, 5, 0, -20, 0)).unwrap();

    let mut graph = GraphDefinition::new();
    graph.add_node(subgraph.instance_node(2)).unwrap();
    graph.add_node(sink(3)).unwrap();
    graph.connect(image_link(1, 2, 0, 3, 0)).unwrap();
    graph.add_subgraph(subgraph);
    graph
}

/// `A` contains an instance of `B`, and `B` contains an instance of `A`.
#[allow(dead_code)]
pub fn indirect_cycle_graph() -> GraphDefinition {
    let a_id = Uuid::new_v4();
    let b_id = Uuid::new_v4();

    let mut a = SubgraphDefinition::with_id(a_id, "A").with_output("IMAGE", IMAGE);
    let mut b = SubgraphDefinition::with_id(b_id, "B").with_output("IMAGE", IMAGE);
    a.add_node(b.instance_node(4)).unwrap();
    a.connect(image_link(1, 4, 0, -20, 0)).unwrap();
    b.add_node(a.instance_node(6)).unwrap();
    b.connect(image_link(1, 6, 0, -20, 0)).unwrap();

    let mut graph = GraphDefinition::new();
    graph.add_node(a.instance_node(1)).unwrap();
    graph.add_subgraph(a);
    graph.add_subgraph(b);
    graph
}
