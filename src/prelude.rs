//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the tenkai crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use tenkai::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let graph = Workflow::from_json(&json)?.into_graph()?;
//!
//! let plan = Resolver::new(&graph).flatten()?;
//! for node in plan.nodes() {
//!     println!("{} {}", node.id, node.node_type);
//! }
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{
    GraphDefinition, IntoGraph, Link, NodeDefinition, NodeKind, NodeMode, SlotType,
    SubgraphDefinition,
};

// Resolution
pub use crate::resolver::{
    DanglingLinks, ExecutableNode, ExecutionPlan, ResolutionContext, ResolvedInput, Resolver,
};

// Workflow files
pub use crate::workflow::Workflow;

// Error types
pub use crate::error::{ConversionError, GraphError, RecursionError, ResolveError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
