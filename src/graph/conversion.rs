use super::definition::GraphDefinition;
use crate::error::ConversionError;

/// A trait for custom data models that can be converted into a Tenkai `GraphDefinition`.
///
/// This is the primary extension point for making Tenkai format-agnostic. By implementing
/// this trait on your own workflow structs, you provide a translation layer that lets
/// the resolver operate on graphs produced by any editor.
///
/// # Example
///
/// ```rust,no_run
/// use tenkai::prelude::*;
/// use tenkai::error::ConversionError;
///
/// // 1. Define your custom structs for parsing your format.
/// struct MyNode { id: i64, kind: String }
/// struct MyWorkflow { nodes: Vec<MyNode> }
///
/// // 2. Implement `IntoGraph` for your top-level struct.
/// impl IntoGraph for MyWorkflow {
///     fn into_graph(self) -> std::result::Result<GraphDefinition, ConversionError> {
///         let mut graph = GraphDefinition::new();
///         for node in self.nodes {
///             // Your logic to convert `MyNode` into `NodeDefinition`
///             graph.add_node(NodeDefinition::new(node.id, node.kind))?;
///         }
///         // Convert links and subgraph definitions here as well
///         Ok(graph)
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into a Tenkai-compatible graph definition.
    fn into_graph(self) -> Result<GraphDefinition, ConversionError>;
}
