pub mod error;
pub mod exec;
pub mod graph;
pub mod schema;
pub mod topo;
pub mod types;

pub use error::GraphError;
pub use exec::{ExecError, FlowRuntime};
pub use graph::{Graph, Node, Variable};
pub use schema::{NodeSignature, Registry};
pub use topo::topo_order;
pub use types::*;
