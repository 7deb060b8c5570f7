// scene/mod.rs
//
// The retained scene: id registry, entity types, and the scene graph.
// All mutation flows through the command processor; everything here exposes
// immutable queries to the render boundary.

pub mod graph;
pub mod ids;
pub mod types;

pub use graph::SceneGraph;
pub use ids::{parse_id_str, Id, IdRegistry, ResourceKind, INVALID_ID};
pub use types::{
    Buffer, Candle6, DrawItem, Geometry, Layer, Pane, PaneRegion, Pos2, Transform,
    TransformParams, VertexFormat,
};
