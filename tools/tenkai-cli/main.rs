use clap::{Parser, ValueEnum};
use std::time::Instant;
use tenkai::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Flattens a node-graph workflow with nested subgraphs into its executable nodes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow JSON file
    workflow_path: String,

    /// How to print the result
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Resolve a single input instead of flattening, e.g. `4:7:0` for input 0 of node 4:7
    #[arg(short, long, value_name = "NODE:SLOT")]
    resolve: Option<String>,

    /// Treat nodes of this type as virtual (repeatable)
    #[arg(long = "virtual-type", value_name = "TYPE")]
    virtual_types: Vec<String>,

    /// Treat dangling links as unconnected instead of failing
    #[arg(long)]
    drop_dangling: bool,

    /// Only list links whose endpoints no longer exist
    #[arg(long)]
    check: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenkai=info,warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let load_start = Instant::now();
    let graph = Workflow::from_file(&cli.workflow_path)
        .and_then(IntoGraph::into_graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow: {}", e)));
    let load_duration = load_start.elapsed();

    if cli.check {
        run_check(&graph);
        return;
    }

    let mut builder = Resolver::builder(&graph);
    for node_type in &cli.virtual_types {
        builder = builder.with_virtual_type(node_type);
    }
    if cli.drop_dangling {
        builder = builder.with_dangling_links(DanglingLinks::Drop);
    }
    let resolver = builder.build();

    let resolve_start = Instant::now();
    match &cli.resolve {
        Some(target) => run_resolve(&resolver, target, cli.format),
        None => run_flatten(&resolver, cli.format),
    }
    let resolve_duration = resolve_start.elapsed();

    if cli.format == OutputFormat::Text {
        println!("\n--- Performance Summary ---");
        println!("Workflow Loading:     {:?}", load_duration);
        println!("Resolution:           {:?}", resolve_duration);
    }
}

fn run_flatten(resolver: &Resolver<'_>, format: OutputFormat) {
    let plan = resolver
        .flatten()
        .unwrap_or_else(|e| exit_with_error(&format!("Flattening failed: {}", e)));

    match format {
        OutputFormat::Json => print_json(&plan),
        OutputFormat::Text => {
            print!("{}", TraceFormatter::format_plan(&plan));
            println!(
                "\n{} executable node(s), {} connection(s)",
                plan.len(),
                plan.connection_count()
            );
        }
    }
}

fn run_resolve(resolver: &Resolver<'_>, target: &str, format: OutputFormat) {
    let (node_id, slot) = target
        .rsplit_once(':')
        .and_then(|(node, slot)| slot.parse::<usize>().ok().map(|slot| (node, slot)))
        .unwrap_or_else(|| exit_with_error(&format!("Expected NODE:SLOT, got '{}'", target)));

    let node = resolver
        .node_at(node_id)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let mut ctx = ResolutionContext::new();
    let resolved = node
        .resolve_input_with(slot, &mut ctx)
        .unwrap_or_else(|e| exit_with_error(&format!("Resolution failed: {}", e)));

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "node": node.id(),
            "slot": slot,
            "source": resolved.as_ref().map(|r| serde_json::json!({
                "origin_id": r.origin_id,
                "origin_slot": r.origin_slot,
            })),
            "hops": ctx.hops(),
        })),
        OutputFormat::Text => println!(
            "{}",
            TraceFormatter::format_resolution(node.id(), slot, resolved.as_ref(), ctx.hops())
        ),
    }
}

fn run_check(graph: &GraphDefinition) {
    let dangling = graph.dangling_links();
    if dangling.is_empty() {
        println!("No dangling links.");
        return;
    }
    for (scope, link_id) in &dangling {
        match scope {
            Some(subgraph_id) => println!("  link {} in subgraph {}", link_id, subgraph_id),
            None => println!("  link {} in root graph", link_id),
        }
    }
    exit_with_error(&format!("{} dangling link(s)", dangling.len()));
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize output: {}", e)));
    println!("{}", json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
