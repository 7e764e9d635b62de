//! Positions tables in 2D or 3D space.
//!
//! Three algorithms share one contract: a schema goes in, the same schema
//! with fresh positions comes out, centered on the origin.

mod analysis;
mod engine;
mod force;
mod hierarchy;
mod placement;
mod types;

pub use engine::LayoutEngine;
pub use types::{CircularParams, ForceParams, HierarchyParams, LayoutAlgorithm, Vec3, ViewMode};

use crate::model::DatabaseSchema;

/// Lay out `schema` with the default engine.
pub fn layout_schema(schema: &DatabaseSchema, algorithm: LayoutAlgorithm, mode: ViewMode) -> DatabaseSchema {
    LayoutEngine::default().layout(schema, algorithm, mode)
}
