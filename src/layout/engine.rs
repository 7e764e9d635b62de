//! Layout engine core implementation.

use tracing::debug;

use crate::model::DatabaseSchema;

use super::analysis::Graph;
use super::placement::{circle, recenter, sphere_spiral};
use super::types::{CircularParams, ForceParams, HierarchyParams, LayoutAlgorithm, ViewMode};
use super::{force, hierarchy};

/// Layout engine configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    pub force: ForceParams,
    pub hierarchy: HierarchyParams,
    pub circular: CircularParams,
}

impl LayoutEngine {
    /// Position every table of `schema`. Only positions change; earlier
    /// positions are ignored and the result is centered on the origin.
    pub fn layout(
        &self,
        schema: &DatabaseSchema,
        algorithm: LayoutAlgorithm,
        mode: ViewMode,
    ) -> DatabaseSchema {
        let mut output = schema.clone();
        if output.tables.is_empty() {
            return output;
        }

        let graph = Graph::from_schema(schema);
        let mut positions = match algorithm {
            LayoutAlgorithm::ForceDirected => force::simulate(&graph, mode, &self.force, &self.circular),
            LayoutAlgorithm::Hierarchical => hierarchy::place(&graph, mode, &self.hierarchy),
            LayoutAlgorithm::Circular => {
                let radius = self.circular.radius(graph.len());
                match mode {
                    ViewMode::ThreeD => sphere_spiral(graph.len(), radius),
                    ViewMode::TwoD => circle(graph.len(), radius),
                }
            }
        };
        recenter(&mut positions);

        for (table, position) in output.tables.iter_mut().zip(positions) {
            table.position = position.to_array();
        }
        debug!(
            %algorithm,
            %mode,
            tables = graph.len(),
            edges = graph.edges.len(),
            "laid out schema"
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Format, Table};

    const ALGORITHMS: [LayoutAlgorithm; 3] = [
        LayoutAlgorithm::ForceDirected,
        LayoutAlgorithm::Hierarchical,
        LayoutAlgorithm::Circular,
    ];
    const MODES: [ViewMode; 2] = [ViewMode::TwoD, ViewMode::ThreeD];

    fn schema(names: &[&str]) -> DatabaseSchema {
        let mut tables: Vec<Table> = names
            .iter()
            .map(|n| {
                let mut t = Table::new(*n);
                t.upsert_column(Column::new("id", "INT").primary_key());
                t
            })
            .collect();
        for i in 1..tables.len() {
            let mut fk = Column::new("parent_id", "INT");
            fk.set_reference(names[i - 1], "id");
            tables[i].upsert_column(fk);
        }
        DatabaseSchema {
            tables,
            ..DatabaseSchema::new("s", Format::Sql)
        }
    }

    #[test]
    fn test_empty_schema_unchanged() {
        let empty = DatabaseSchema::new("s", Format::Sql);
        for algorithm in ALGORITHMS {
            assert_eq!(LayoutEngine::default().layout(&empty, algorithm, ViewMode::ThreeD), empty);
        }
    }

    #[test]
    fn test_centered() {
        let input = schema(&["a", "b", "c", "d", "e"]);
        for algorithm in ALGORITHMS {
            for mode in MODES {
                let out = LayoutEngine::default().layout(&input, algorithm, mode);
                for axis in 0..3 {
                    let mean: f64 = out.tables.iter().map(|t| t.position[axis]).sum::<f64>() / 5.0;
                    assert!(mean.abs() < 1e-6, "{algorithm} {mode} axis {axis}: {mean}");
                }
            }
        }
    }

    #[test]
    fn test_only_positions_change() {
        let input = schema(&["a", "b", "c"]);
        let mut out = LayoutEngine::default().layout(&input, LayoutAlgorithm::Hierarchical, ViewMode::TwoD);
        assert_ne!(out, input);
        for table in &mut out.tables {
            table.position = [0.0; 3];
        }
        assert_eq!(out, input);
    }

    #[test]
    fn test_prior_positions_ignored() {
        let input = schema(&["a", "b", "c"]);
        let engine = LayoutEngine::default();
        let once = engine.layout(&input, LayoutAlgorithm::ForceDirected, ViewMode::ThreeD);
        let twice = engine.layout(&once, LayoutAlgorithm::ForceDirected, ViewMode::ThreeD);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_circular_2d_is_flat() {
        let out = LayoutEngine::default().layout(&schema(&["a", "b", "c", "d"]), LayoutAlgorithm::Circular, ViewMode::TwoD);
        assert!(out.tables.iter().all(|t| t.position[1] == 0.0));
    }
}
