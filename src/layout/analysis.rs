//! Relationship analysis: the schema reduced to an index graph.

use tracing::trace;

use crate::model::DatabaseSchema;

/// One foreign-key column, from the referencing table to the referenced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub child: usize,
    pub parent: usize,
}

#[derive(Debug, Clone)]
pub struct Graph {
    pub edges: Vec<Edge>,
    /// Table index -> tables it references.
    pub parents: Vec<Vec<usize>>,
    /// Table index -> tables referencing it.
    pub children: Vec<Vec<usize>>,
    /// Column count per table.
    pub columns: Vec<usize>,
}

impl Graph {
    /// Self references and references to tables not in the schema are left out.
    pub fn from_schema(schema: &DatabaseSchema) -> Self {
        let n = schema.tables.len();
        let mut graph = Self {
            edges: Vec::new(),
            parents: vec![Vec::new(); n],
            children: vec![Vec::new(); n],
            columns: schema.tables.iter().map(|t| t.columns.len()).collect(),
        };

        for (child, table) in schema.tables.iter().enumerate() {
            for (column, reference) in table.foreign_keys() {
                let Some(parent) = schema.table_index(&reference.table) else {
                    trace!(table = %table.name, column = %column.name, target = %reference.table, "dangling reference left out of layout");
                    continue;
                };
                if parent == child {
                    continue;
                }
                graph.edges.push(Edge { child, parent });
                graph.parents[child].push(parent);
                graph.children[parent].push(child);
            }
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}
