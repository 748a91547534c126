//! Tests for the graph model: connecting, interface editing and reroutes.
mod common;
use common::*;
use tenkai::error::GraphError;
use tenkai::graph::{BoundaryKind, Endpoint, Reroute, SlotDirection};
use tenkai::prelude::*;

#[test]
fn test_connect_records_slot_references() {
    let mut graph = GraphDefinition::new();
    graph.add_node(source(1)).unwrap();
    graph.add_node(sink(2)).unwrap();
    graph.connect(image_link(1, 1, 0, 2, 0)).unwrap();

    assert_eq!(graph.network.node(1).unwrap().outputs[0].links, vec![1]);
    assert_eq!(graph.network.node(2).unwrap().inputs[0].link, Some(1));
}

#[test]
fn test_connect_replaces_existing_input_link() {
    let mut graph = GraphDefinition::new();
    graph.add_node(source(1)).unwrap();
    graph.add_node(source(2)).unwrap();
    graph.add_node(sink(3)).unwrap();
    graph.connect(image_link(1, 1, 0, 3, 0)).unwrap();

    let replaced = graph.connect(image_link(2, 2, 0, 3, 0)).unwrap();
    assert_eq!(replaced.map(|l| l.id), Some(1));
    assert!(graph.network.link(1).is_none());
    assert!(graph.network.node(1).unwrap().outputs[0].links.is_empty());
    assert_eq!(graph.network.node(3).unwrap().inputs[0].link, Some(2));
}

#[test]
fn test_connect_rejects_bad_endpoints() {
    let mut graph = GraphDefinition::new();
    graph.add_node(source(1)).unwrap();
    graph.add_node(sink(2)).unwrap();

    assert_eq!(
        graph.connect(image_link(1, 1, 3, 2, 0)).unwrap_err(),
        GraphError::SlotIndex {
            node_id: 1,
            direction: SlotDirection::Output,
            slot: 3,
        }
    );
    assert_eq!(
        graph.connect(image_link(1, 9, 0, 2, 0)).unwrap_err(),
        GraphError::NodeNotFound(9)
    );
    assert_eq!(
        graph.connect(image_link(1, -10, 0, 2, 0)).unwrap_err(),
        GraphError::BoundaryOutsideSubgraph(1)
    );
    assert_eq!(
        graph.add_node(sink(-20)).unwrap_err(),
        GraphError::ReservedNodeId(-20)
    );
    assert_eq!(graph.add_node(sink(2)).unwrap_err(), GraphError::DuplicateNode(2));
}

#[test]
fn test_disconnect_clears_references() {
    let (mut graph, _) = boundary_round_trip_graph();
    let removed = graph.disconnect(2).unwrap();

    assert_eq!(removed.target_id, 3);
    assert!(graph.network.node(2).unwrap().outputs[0].links.is_empty());
    assert_eq!(graph.network.node(3).unwrap().inputs[0].link, None);
    assert_eq!(graph.disconnect(2).unwrap_err(), GraphError::LinkNotFound(2));
}

#[test]
fn test_remove_node_drops_attached_links() {
    let (mut graph, _) = boundary_round_trip_graph();
    let (node, links) = graph.network.remove_node(2).unwrap();

    assert_eq!(node.id, 2);
    assert_eq!(links.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(graph.network.links().count(), 0);
    assert_eq!(graph.network.node(3).unwrap().inputs[0].link, None);
    assert_eq!(graph.network.nodes().len(), 2);
    assert!(graph.network.node(3).is_some());
}

#[test]
fn test_subgraph_connect_tracks_boundary_links() {
    let subgraph = filter_subgraph("D");
    assert_eq!(subgraph.inputs[0].link_ids, vec![1]);
    assert_eq!(subgraph.outputs[0].link_ids, vec![2]);
    assert_eq!(subgraph.input_node().id(), -10);
    assert_eq!(subgraph.output_node().slot(0).unwrap().name, "IMAGE");
    assert_eq!(subgraph.slots(BoundaryKind::Input).len(), 1);
}

#[test]
fn test_subgraph_output_accepts_a_single_link() {
    let mut subgraph = filter_subgraph("D");
    subgraph.add_node(filter(8)).unwrap();

    let replaced = subgraph.connect(image_link(3, 8, 0, -20, 0)).unwrap();
    assert_eq!(replaced.map(|l| l.id), Some(2));
    assert_eq!(subgraph.outputs[0].link_ids, vec![3]);
    assert!(subgraph.network.node(7).unwrap().outputs[0].links.is_empty());
}

#[test]
fn test_subgraph_remove_node_forgets_boundary_links() {
    let mut subgraph = filter_subgraph("D");
    subgraph.remove_node(7).unwrap();

    assert!(subgraph.inputs[0].link_ids.is_empty());
    assert!(subgraph.outputs[0].link_ids.is_empty());
}

#[test]
fn test_instance_node_mirrors_interface() {
    let subgraph = filter_subgraph("D");
    let node = subgraph.instance_node(4);

    assert_eq!(node.subgraph_id(), Some(subgraph.id));
    assert_eq!(node.node_type, subgraph.id.to_string());
    assert_eq!(node.title.as_deref(), Some("D"));
    assert_eq!(node.inputs.len(), 1);
    assert_eq!(node.outputs.len(), 1);
    assert_eq!(node.inputs[0].slot_type, SlotType::new(IMAGE));
}

#[test]
fn test_add_and_rename_interface_slots_sync_instances() {
    let (mut graph, id) = boundary_round_trip_graph();

    let index = graph.add_subgraph_input(id, "mask", "MASK").unwrap();
    assert_eq!(index, 1);
    let output = graph.add_subgraph_output(id, "MASK", "MASK").unwrap();
    assert_eq!(output, 1);

    let instance = graph.network.node(2).unwrap();
    assert_eq!(instance.inputs.len(), 2);
    assert_eq!(instance.inputs[1].name, "mask");
    assert_eq!(instance.outputs[1].slot_type, SlotType::new("MASK"));

    graph.rename_subgraph_input(id, 0, "pixels").unwrap();
    graph.rename_subgraph_output(id, 1, "alpha").unwrap();
    assert_eq!(graph.subgraph(id).unwrap().inputs[0].name, "pixels");
    let instance = graph.network.node(2).unwrap();
    assert_eq!(instance.inputs[0].name, "pixels");
    assert_eq!(instance.outputs[1].name, "alpha");

    assert!(matches!(
        graph.rename_subgraph_input(id, 5, "x").unwrap_err(),
        GraphError::SlotIndex { slot: 5, .. }
    ));
}

#[test]
fn test_remove_interface_slot_reindexes_links() {
    let (mut graph, id) = boundary_round_trip_graph();
    graph.add_subgraph_input(id, "mask", "MASK").unwrap();

    // Feed the new second input from outside and use it inside.
    graph
        .add_node(NodeDefinition::new(4, "LoadMask").with_output("MASK", "MASK"))
        .unwrap();
    graph.connect(Link::new(3, 4, 0, 2, 1, "MASK")).unwrap();
    let subgraph = graph.subgraph_mut(id).unwrap();
    subgraph
        .add_node(NodeDefinition::new(8, "ApplyMask").with_input("mask", "MASK"))
        .unwrap();
    subgraph.connect(Link::new(3, -10, 1, 8, 0, "MASK")).unwrap();

    let removed = graph.remove_subgraph_input(id, 0).unwrap();
    assert_eq!(removed.name, "image");

    // Inner and outer links of the removed slot are gone.
    let subgraph = graph.subgraph(id).unwrap();
    assert!(subgraph.network.link(1).is_none());
    assert!(graph.network.link(1).is_none());
    assert!(graph.network.node(1).unwrap().outputs[0].links.is_empty());

    // The surviving slot moved from index 1 to 0 on both sides.
    assert_eq!(subgraph.inputs.len(), 1);
    assert_eq!(subgraph.inputs[0].link_ids, vec![3]);
    assert_eq!(subgraph.network.link(3).unwrap().origin_slot, 0);
    assert_eq!(graph.network.link(3).unwrap().target_slot, 0);
    let instance = graph.network.node(2).unwrap();
    assert_eq!(instance.inputs.len(), 1);
    assert_eq!(instance.inputs[0].link, Some(3));

    let resolver = Resolver::new(&graph);
    let resolved = resolver.node_at("2:8").unwrap().resolve_input(0).unwrap().unwrap();
    assert_eq!(resolved.origin_id, "4");
}

#[test]
fn test_remove_interface_output_drops_outer_links() {
    let (mut graph, id) = boundary_round_trip_graph();
    graph.remove_subgraph_output(id, 0).unwrap();

    assert!(graph.network.node(2).unwrap().outputs.is_empty());
    assert!(graph.network.link(2).is_none());
    assert_eq!(graph.network.node(3).unwrap().inputs[0].link, None);
    assert!(graph.subgraph(id).unwrap().network.link(2).is_none());
}

#[test]
fn test_interface_edit_on_unknown_subgraph() {
    let mut graph = GraphDefinition::new();
    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        graph.add_subgraph_input(missing, "x", "INT").unwrap_err(),
        GraphError::SubgraphNotFound(missing)
    );
}

#[test]
fn test_sync_instance_truncates_and_reports_orphans() {
    let (mut graph, id) = boundary_round_trip_graph();
    let mut instance = graph.network.node(2).unwrap().clone();
    graph.subgraph_mut(id).unwrap().outputs.clear();

    let orphaned = graph.subgraph(id).unwrap().sync_instance(&mut instance);
    assert_eq!(orphaned, vec![2]);
    assert!(instance.outputs.is_empty());
    assert_eq!(instance.inputs.len(), 1);
}

#[test]
fn test_dangling_links_are_reported() {
    let (mut graph, id) = boundary_round_trip_graph();
    assert!(graph.dangling_links().is_empty());

    graph.network.insert_link(image_link(9, 1, 0, 77, 0)).unwrap();
    graph
        .subgraph_mut(id)
        .unwrap()
        .network
        .insert_link(image_link(9, -10, 4, 7, 0))
        .unwrap();

    assert_eq!(graph.dangling_links(), vec![(None, 9), (Some(id), 9)]);
}

#[test]
fn test_reroute_chain_runs_origin_to_target() {
    let mut graph = bypass_graph();
    graph.network.add_reroute(Reroute::new(1, None));
    graph.network.add_reroute(Reroute::new(2, Some(1)));
    graph.network.add_reroute(Reroute::new(3, Some(2)));

    assert_eq!(graph.network.reroutes().count(), 3);

    let link = image_link(9, 1, 0, 3, 0).with_parent(3);
    assert_eq!(graph.network.reroute_chain(&link).unwrap(), vec![1, 2, 3]);

    let plain = image_link(10, 1, 0, 3, 0);
    assert!(graph.network.reroute_chain(&plain).unwrap().is_empty());
}

#[test]
fn test_reroute_loop_is_an_error() {
    let mut graph = GraphDefinition::new();
    graph.network.add_reroute(Reroute::new(1, Some(2)));
    graph.network.add_reroute(Reroute::new(2, Some(1)));

    let link = image_link(5, 1, 0, 2, 0).with_parent(1);
    assert_eq!(
        graph.network.reroute_chain(&link).unwrap_err(),
        RecursionError::Reroute {
            link_id: 5,
            reroute_id: 1,
        }
    );
}

#[test]
fn test_reroutes_do_not_affect_resolution() {
    let mut graph = bypass_graph();
    graph.network.add_reroute(Reroute::new(1, None));
    let mut link = graph.disconnect(2).unwrap();
    link.parent_id = Some(1);
    graph.connect(link).unwrap();

    let resolver = Resolver::new(&graph);
    assert_eq!(
        resolver.node(3).unwrap().resolve_input(0).unwrap().unwrap().origin_id,
        "1"
    );
}

#[test]
fn test_connect_replaces_stale_input_reference() {
    let mut graph = GraphDefinition::new();
    assert_eq!(graph.network.next_link_id(), 1);
    graph.add_node(source(1)).unwrap();
    let mut stale = sink(2);
    stale.inputs[0].link = Some(99);
    graph.add_node(stale).unwrap();

    let replaced = graph.connect(image_link(1, 1, 0, 2, 0)).unwrap();
    assert!(replaced.is_none());
    assert_eq!(graph.network.node(2).unwrap().inputs[0].link, Some(1));
    assert_eq!(graph.network.node(1).unwrap().outputs[0].links, vec![1]);
    assert_eq!(graph.network.next_link_id(), 2);
}

#[test]
fn test_subgraph_output_forgets_stale_link_ids() {
    let mut subgraph = filter_subgraph("D");
    subgraph.outputs[0].link_ids.push(99);
    subgraph.add_node(filter(8)).unwrap();

    let replaced = subgraph.connect(image_link(3, 8, 0, -20, 0)).unwrap();
    assert_eq!(replaced.map(|l| l.id), Some(2));
    assert_eq!(subgraph.outputs[0].link_ids, vec![3]);
}

#[test]
fn test_link_resolves_to_current_endpoints() {
    let mut subgraph = filter_subgraph("D");
    let link = subgraph.network.link(1).unwrap();
    let connection = link.resolve(&subgraph);

    let origin = connection.origin.unwrap();
    assert!(matches!(origin, Endpoint::Boundary { .. }));
    assert_eq!(origin.node_id(), -10);
    assert_eq!(connection.target.unwrap().node_id(), 7);
    assert_eq!(connection.target.unwrap().slot(), 0);

    let link = link.clone();
    subgraph.remove_node(7).unwrap();
    assert!(link.resolve(&subgraph).target.is_none());
}
