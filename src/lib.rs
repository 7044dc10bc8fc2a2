pub mod analysis;
pub mod canvas;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod edges;
pub mod error;
pub mod ir;
pub mod layout;
pub mod ledger;
pub mod naming;
pub mod notes;
pub mod style;

pub use canvas::{GraphDocument, GraphNode, compile, serialize};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use edges::{GraphEdge, Side};
pub use error::{CompileError, Inconsistency};
pub use ir::{Category, ContentNode};
pub use style::ColorCode;
