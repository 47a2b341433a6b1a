pub mod build;
pub mod connector;
pub mod error;
pub mod link;
pub mod model;
pub mod node;
pub mod normalization;
pub mod normalize;
pub mod store;
pub mod via;

pub use build::{BuildInput, GraphParts, build};
pub use connector::{Connector, ConnectorRule, ConnectorSet, ConnectorUpdate, MatchStrategy};
pub use error::{GraphError, GraphResult};
pub use link::{Link, LinkArena, LinkKey};
pub use model::{Field, FieldType, Record, Search};
pub use node::{Node, NodeArena, NodeKind};
pub use normalization::{Normalization, denormalize_nodes, normalize_nodes};
pub use normalize::{RewriteSpec, ValueNormalizer};
pub use store::{Action, GraphEvent, GraphState, GraphStore, GraphView, StoreConfig, reduce};
pub use via::{ViaRule, apply_via};
