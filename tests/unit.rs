//! Unit tests for core Tenkai functionality.
mod common;
use common::*;
use tenkai::graph::{SlotDirection, is_boundary_id};
use tenkai::prelude::*;
use tenkai::resolver::{Hop, HopRole, PlannedInput, PlannedNode, PlannedSource};

#[test]
fn test_slot_type_matching() {
    let image = SlotType::new("IMAGE");
    assert!(image.accepts(&SlotType::new("image")));
    assert!(!image.accepts(&SlotType::new("LATENT")));

    assert!(image.accepts(&SlotType::any()));
    assert!(SlotType::new("").accepts(&SlotType::new("MASK")));
    assert!(SlotType::new("").is_wildcard());

    let number = SlotType::new("INT,FLOAT");
    assert!(number.accepts(&SlotType::new("FLOAT")));
    assert!(SlotType::new("int").accepts(&number));
    assert!(!number.accepts(&SlotType::new("STRING")));
    assert!(SlotType::new("STRING, *").accepts(&SlotType::new("LATENT")));
}

#[test]
fn test_node_mode_codes() {
    for code in 0..=4 {
        assert_eq!(NodeMode::from_code(code).map(NodeMode::code), Some(code));
    }
    assert_eq!(NodeMode::from_code(5), None);
    assert_eq!(NodeMode::default(), NodeMode::Always);

    assert!(NodeMode::Never.is_skipped());
    assert!(NodeMode::Bypass.is_skipped());
    assert!(!NodeMode::OnEvent.is_skipped());
}

#[test]
fn test_node_display_name() {
    assert_eq!(filter(5).display_name(), "5");
    assert_eq!(filter(5).with_title("Sharpen").display_name(), "5 (Sharpen)");
    assert!(is_boundary_id(-10));
    assert!(is_boundary_id(-20));
    assert!(!is_boundary_id(-1));
}

#[test]
fn test_error_messages() {
    let err = ResolveError::SlotIndex {
        node_id: "4:7".to_string(),
        direction: SlotDirection::Input,
        slot: 2,
    };
    assert_eq!(err.to_string(), "No input found for flattened id [4:7] slot [2]");
    assert!(err.is_dangling());

    let err = ResolveError::from(RecursionError::Slot {
        direction: SlotDirection::Output,
        slot: 0,
        node: "2 (Blur)".to_string(),
        key: "2[O]0".to_string(),
    });
    assert!(err.to_string().contains("UniqueID: [2[O]0]"));
    assert!(!err.is_dangling());

    let err = GraphError::SlotIndex {
        node_id: 3,
        direction: SlotDirection::Output,
        slot: 1,
    };
    assert_eq!(err.to_string(), "Node '3' has no output at index 1");
}

#[test]
fn test_resolver_builder_virtual_types() {
    let graph = GraphDefinition::new();
    let resolver = Resolver::builder(&graph)
        .with_virtual_type("Reroute")
        .with_dangling_links(DanglingLinks::Drop)
        .build();

    assert_eq!(resolver.dangling_links(), DanglingLinks::Drop);
    assert_eq!(
        resolver.kind_of(&NodeDefinition::new(1, "Reroute")),
        NodeKind::Virtual
    );
    assert_eq!(
        resolver.kind_of(&NodeDefinition::new(2, "Blur")),
        NodeKind::Concrete
    );
    assert_eq!(Resolver::new(&graph).dangling_links(), DanglingLinks::Fail);
}

#[test]
fn test_format_hops() {
    let graph = bypass_graph();
    let resolver = Resolver::new(&graph);
    let mut ctx = ResolutionContext::new();
    resolver
        .node(3)
        .unwrap()
        .resolve_input_with(0, &mut ctx)
        .unwrap();

    assert_eq!(
        TraceFormatter::format_hops(ctx.hops()),
        "3[I]0 -> 2[O]0 (bypass) -> 2[I]0 (bypass) -> 1[O]0"
    );
    assert_eq!(ctx.depth(), 4);

    let hops = ctx.into_hops();
    assert_eq!(hops[1].role, HopRole::Bypass);
    assert_eq!(hops[3].role, HopRole::Concrete);
}

#[test]
fn test_format_hop_roles() {
    let hops = vec![
        Hop {
            node_id: "9".to_string(),
            direction: SlotDirection::Input,
            slot: 1,
            role: HopRole::Virtual,
        },
        Hop {
            node_id: "4".to_string(),
            direction: SlotDirection::Output,
            slot: 0,
            role: HopRole::SubgraphInstance,
        },
    ];
    assert_eq!(
        TraceFormatter::format_hops(&hops),
        "9[I]1 (virtual) -> 4[O]0 (subgraph)"
    );
}

#[test]
fn test_format_resolution() {
    let (graph, _) = boundary_round_trip_graph();
    let resolver = Resolver::new(&graph);
    let node = resolver.node(3).unwrap();

    let mut ctx = ResolutionContext::new();
    let resolved = node.resolve_input_with(0, &mut ctx).unwrap();
    let text = TraceFormatter::format_resolution(node.id(), 0, resolved.as_ref(), ctx.hops());
    assert_eq!(
        text,
        "Input 0 of [3] <- [2:7] output 0\n  via 3[I]0 -> 2[O]0 (subgraph) -> 2:7[O]0"
    );

    let unconnected = TraceFormatter::format_resolution("5", 1, None, &[]);
    assert_eq!(unconnected, "Input 1 of [5] <- unconnected");
}

#[test]
fn test_format_plan() {
    let plan = ExecutionPlan {
        nodes: vec![
            PlannedNode {
                id: "1".to_string(),
                node_type: "LoadImage".to_string(),
                title: Some("LoadImage".to_string()),
                inputs: Vec::new(),
            },
            PlannedNode {
                id: "2:7".to_string(),
                node_type: "Blur".to_string(),
                title: Some("Soften".to_string()),
                inputs: vec![
                    PlannedInput {
                        name: "image".to_string(),
                        slot_type: SlotType::new(IMAGE),
                        source: Some(PlannedSource {
                            origin_id: "1".to_string(),
                            origin_slot: 0,
                        }),
                    },
                    PlannedInput {
                        name: "mask".to_string(),
                        slot_type: SlotType::new("MASK"),
                        source: None,
                    },
                ],
            },
        ],
    };

    assert_eq!(
        TraceFormatter::format_plan(&plan),
        "[1] LoadImage\n\
         [2:7] Blur (Soften)\n    \
         image (IMAGE) <- [1] output 0\n    \
         mask (MASK) <- unconnected\n"
    );
    assert_eq!(plan.connection_count(), 1);
    assert!(!plan.is_empty());
}
