pub mod conversion;
pub mod definition;
pub mod link;
pub mod scope;
pub mod subgraph;

pub use conversion::*;
pub use definition::*;
pub use link::*;
pub use scope::*;
pub use subgraph::*;
