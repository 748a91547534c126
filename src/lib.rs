//! # Tenkai - Subgraph Execution Resolution
//!
//! **Tenkai** flattens node graphs that contain nested, reusable subgraph instances into
//! the plain list of real nodes and real connections an execution backend can run.
//!
//! ## Core Workflow
//!
//! The resolver is format-agnostic. It operates on a canonical in-memory model of a
//! graph and its subgraph definitions. The primary workflow is:
//!
//! 1.  **Load Your Graph**: Parse a workflow JSON file with `Workflow::from_file`, or your own format into your own structs.
//! 2.  **Convert to Tenkai's Model**: `Workflow` implements `IntoGraph`; implement it for your own structs to produce a `GraphDefinition`.
//! 3.  **Resolve**: Use `Resolver::builder` to configure a resolver over the graph. Ask it for single slots (`node_at(..)?.resolve_input(..)`) or flatten everything at once with `flatten`.
//!
//! Bypassed nodes, editor-only virtual nodes and subgraph boundaries are resolved
//! through transparently. Every node reached through subgraph instances gets a
//! flattened id such as `"4:12:7"` that is unique across the whole graph.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tenkai::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let graph = Workflow::from_file("workflow.json")?.into_graph()?;
//!
//!     let resolver = Resolver::builder(&graph)
//!         .with_virtual_type("Reroute")
//!         .with_dangling_links(DanglingLinks::Drop)
//!         .build();
//!
//!     // Where does input 0 of node 7, inside instance 4, get its value from?
//!     let node = resolver.node_at("4:7")?;
//!     let mut ctx = ResolutionContext::new();
//!     let resolved = node.resolve_input_with(0, &mut ctx)?;
//!     println!(
//!         "{}",
//!         TraceFormatter::format_resolution(node.id(), 0, resolved.as_ref(), ctx.hops())
//!     );
//!
//!     // Or flatten the whole graph.
//!     let plan = resolver.flatten()?;
//!     println!("{}", TraceFormatter::format_plan(&plan));
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod graph;
pub mod prelude;
pub mod resolver;
pub mod trace;
pub mod workflow;
