use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use tenkai::graph::{SUBGRAPH_INPUT_ID, SUBGRAPH_OUTPUT_ID};
use uuid::Uuid;

/// A CLI tool to generate nested workflow files for exercising the resolver
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// How many levels of subgraph definitions to nest
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Nodes per subgraph definition
    #[arg(long, default_value_t = 4)]
    width: usize,

    /// Subgraph instances chained in the root graph
    #[arg(long, default_value_t = 2)]
    instances: usize,

    /// Chance for an ordinary node to be generated in bypass mode
    #[arg(long, default_value_t = 0.1)]
    bypass_ratio: f64,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

const DATA_TYPE: &str = "FLOAT";
const MODE_ALWAYS: u8 = 0;
const MODE_BYPASS: u8 = 4;

#[derive(Serialize)]
struct GenInput {
    name: String,
    #[serde(rename = "type")]
    slot_type: String,
    link: Option<u32>,
}

#[derive(Serialize)]
struct GenOutput {
    name: String,
    #[serde(rename = "type")]
    slot_type: String,
    links: Vec<u32>,
}

#[derive(Serialize)]
struct GenNode {
    id: i64,
    #[serde(rename = "type")]
    node_type: String,
    mode: u8,
    inputs: Vec<GenInput>,
    outputs: Vec<GenOutput>,
}

#[derive(Serialize)]
struct GenLink {
    id: u32,
    origin_id: i64,
    origin_slot: usize,
    target_id: i64,
    target_slot: usize,
    #[serde(rename = "type")]
    slot_type: String,
}

#[derive(Serialize)]
struct GenBoundarySlot {
    id: String,
    name: String,
    #[serde(rename = "type")]
    slot_type: String,
    #[serde(rename = "linkIds")]
    link_ids: Vec<u32>,
}

#[derive(Serialize)]
struct GenSubgraph {
    id: String,
    name: String,
    inputs: Vec<GenBoundarySlot>,
    outputs: Vec<GenBoundarySlot>,
    nodes: Vec<GenNode>,
    links: Vec<GenLink>,
}

/// Nodes and links of one scope, with link bookkeeping on ordinary node slots.
#[derive(Default)]
struct GenScope {
    nodes: Vec<GenNode>,
    links: Vec<GenLink>,
    next_node: i64,
}

impl GenScope {
    fn add_node(&mut self, node_type: &str, mode: u8, inputs: usize, outputs: usize) -> i64 {
        self.next_node += 1;
        let id = self.next_node;
        self.nodes.push(GenNode {
            id,
            node_type: node_type.to_string(),
            mode,
            inputs: (0..inputs)
                .map(|i| GenInput {
                    name: format!("in_{}", i),
                    slot_type: DATA_TYPE.to_string(),
                    link: None,
                })
                .collect(),
            outputs: (0..outputs)
                .map(|i| GenOutput {
                    name: format!("out_{}", i),
                    slot_type: DATA_TYPE.to_string(),
                    links: Vec::new(),
                })
                .collect(),
        });
        id
    }

    fn connect(&mut self, origin: (i64, usize), target: (i64, usize)) -> u32 {
        let id = self.links.len() as u32 + 1;
        self.links.push(GenLink {
            id,
            origin_id: origin.0,
            origin_slot: origin.1,
            target_id: target.0,
            target_slot: target.1,
            slot_type: DATA_TYPE.to_string(),
        });
        for node in &mut self.nodes {
            if node.id == origin.0 {
                node.outputs[origin.1].links.push(id);
            }
            if node.id == target.0 {
                node.inputs[target.1].link = Some(id);
            }
        }
        id
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if cli.width == 0 || cli.depth == 0 {
        eprintln!("Error: --width and --depth must be at least 1");
        std::process::exit(1);
    }
    if !(0.0..=1.0).contains(&cli.bypass_ratio) {
        eprintln!(
            "Error: --bypass-ratio ({}) must be between 0 and 1",
            cli.bypass_ratio
        );
        std::process::exit(1);
    }

    println!(
        "Generating workflow ({} level(s), {} node(s) per definition, {} root instance(s))...",
        cli.depth, cli.width, cli.instances
    );

    let subgraphs = generate_definitions(&mut rng, &cli);
    let root = generate_root(&mut rng, &cli, &subgraphs);
    let root_links: Vec<serde_json::Value> = root
        .links
        .iter()
        .map(|l| {
            serde_json::json!([
                l.id,
                l.origin_id,
                l.origin_slot,
                l.target_id,
                l.target_slot,
                l.slot_type
            ])
        })
        .collect();

    let workflow = serde_json::json!({
        "version": 0.4,
        "last_node_id": root.next_node,
        "last_link_id": root.links.len(),
        "nodes": root.nodes,
        "links": root_links,
        "definitions": { "subgraphs": subgraphs },
    });

    let json_output = serde_json::to_string_pretty(&workflow)?;
    fs::write(&cli.output, json_output)?;

    println!("Successfully generated and saved workflow to '{}'", cli.output);

    Ok(())
}

/// Builds definitions from the innermost level outwards; every level above the
/// first places one instance of a randomly chosen lower-level definition.
fn generate_definitions(rng: &mut StdRng, cli: &Cli) -> Vec<GenSubgraph> {
    let mut subgraphs: Vec<GenSubgraph> = Vec::with_capacity(cli.depth);

    for level in 0..cli.depth {
        let mut scope = GenScope::default();
        let nested_at = (level > 0).then(|| rng.random_range(0..cli.width));

        let mut previous = (SUBGRAPH_INPUT_ID, 0);
        for i in 0..cli.width {
            let node = match nested_at {
                Some(index) if index == i => {
                    let inner = &subgraphs[rng.random_range(0..subgraphs.len())];
                    scope.add_node(&inner.id, MODE_ALWAYS, 1, 1)
                }
                _ => scope.add_node("Op", random_mode(rng, cli.bypass_ratio), 1, 1),
            };
            scope.connect(previous, (node, 0));
            previous = (node, 0);
        }
        let output_link = scope.connect(previous, (SUBGRAPH_OUTPUT_ID, 0));

        subgraphs.push(GenSubgraph {
            id: Uuid::new_v4().to_string(),
            name: format!("Level {}", level),
            inputs: vec![boundary_slot("value", vec![1])],
            outputs: vec![boundary_slot("value", vec![output_link])],
            nodes: scope.nodes,
            links: scope.links,
        });
        println!("-> Generated definition 'Level {}'.", level);
    }

    subgraphs
}

fn generate_root(rng: &mut StdRng, cli: &Cli, subgraphs: &[GenSubgraph]) -> GenScope {
    let mut scope = GenScope::default();
    let source = scope.add_node("Source", MODE_ALWAYS, 0, 1);

    let mut previous = (source, 0);
    for _ in 0..cli.instances {
        // Outermost definitions only, so every instance reaches the innermost level.
        let lowest = subgraphs.len().saturating_sub(2);
        let definition = &subgraphs[rng.random_range(lowest..subgraphs.len())];
        let node = scope.add_node(&definition.id, MODE_ALWAYS, 1, 1);
        scope.connect(previous, (node, 0));
        previous = (node, 0);
    }

    let sink = scope.add_node("Sink", MODE_ALWAYS, 1, 0);
    scope.connect(previous, (sink, 0));
    scope
}

fn random_mode(rng: &mut StdRng, bypass_ratio: f64) -> u8 {
    if rng.random_bool(bypass_ratio) {
        MODE_BYPASS
    } else {
        MODE_ALWAYS
    }
}

fn boundary_slot(name: &str, link_ids: Vec<u32>) -> GenBoundarySlot {
    GenBoundarySlot {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        slot_type: DATA_TYPE.to_string(),
        link_ids,
    }
}
