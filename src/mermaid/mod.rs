//! Mermaid `erDiagram` to schema graph.

mod parser;
mod validate;
mod writer;

use tracing::debug;

use crate::category::{CategoryConfig, assign_categories};
use crate::model::{DatabaseSchema, Format};

pub use parser::token_multiplicity;
pub use validate::identify_valid_blocks;
pub use writer::schema_to_mermaid;

pub const DEFAULT_SCHEMA_NAME: &str = "Mermaid Schema";

pub fn parse_mermaid_schema(input: &str) -> Option<DatabaseSchema> {
    parse_mermaid_schema_with(input, &CategoryConfig::default())
}

/// Parse an `erDiagram`. `None` when the header is missing; a header with
/// nothing after it gives an empty schema.
pub fn parse_mermaid_schema_with(input: &str, config: &CategoryConfig) -> Option<DatabaseSchema> {
    let diagram = parser::scan(input)?;
    let relationships = diagram.relationships.len();
    let tables = assign_categories(parser::resolve_relationships(diagram), config);

    let schema = DatabaseSchema {
        tables,
        ..DatabaseSchema::new(DEFAULT_SCHEMA_NAME, Format::Mermaid)
    };
    debug!(
        tables = schema.tables.len(),
        relationships,
        foreign_keys = schema.relationship_count(),
        "built mermaid schema"
    );
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cardinality::Multiplicity;

    #[test]
    fn test_empty_input() {
        assert!(parse_mermaid_schema("").is_none());
        assert!(parse_mermaid_schema("CREATE TABLE t (id INT);").is_none());
    }

    #[test]
    fn test_header_only() {
        let schema = parse_mermaid_schema("erDiagram\n").unwrap();
        assert!(schema.tables.is_empty());
        assert_eq!(schema.format, Format::Mermaid);
    }

    #[test]
    fn test_user_post() {
        let schema = parse_mermaid_schema(
            "erDiagram\nUSER ||--o{ POST : creates\nUSER { int id PK }\nPOST { int id PK }",
        )
        .unwrap();

        assert_eq!(schema.name, "Mermaid Schema");
        assert_eq!(schema.tables.len(), 2);

        let fk = schema.table("POST").unwrap().column("user_id").unwrap();
        assert!(fk.is_foreign_key);
        let c = fk.references.as_ref().unwrap().cardinality.unwrap();
        assert!(matches!(c.right, Multiplicity::ZeroOrMany | Multiplicity::OneOrMany | Multiplicity::Many));
        assert!(matches!(c.left, Multiplicity::One | Multiplicity::ZeroOrOne));
        assert_eq!(schema.table("USER").unwrap().category, "Users & Auth");
    }

    #[test]
    fn test_write_then_parse_keeps_relationships() {
        let source = "erDiagram\nCUSTOMER ||--o{ ORDER : places\nORDER ||--|{ LINE_ITEM : contains\nORDER }o--|| ADDRESS : ships_to\nCUSTOMER { int id PK }\nADDRESS { int id PK }\n";
        let schema = parse_mermaid_schema(source).unwrap();
        let again = parse_mermaid_schema(&schema_to_mermaid(&schema)).unwrap();

        let names = |s: &DatabaseSchema| {
            let mut n: Vec<String> = s.tables.iter().map(|t| t.name.clone()).collect();
            n.sort();
            n
        };
        assert_eq!(names(&again), names(&schema));
        assert_eq!(again.relationship_count(), schema.relationship_count());
        assert_eq!(again.relationship_count(), 3);
    }

    #[test]
    fn test_many_to_one_key_stays_on_child() {
        let source = "erDiagram\nUSERS {\n int id PK\n string code\n}\nBADGES {\n int id PK\n string owner_code FK\n}\nBADGES ||--|| USERS : owner_code\n";
        let mut schema = parse_mermaid_schema(source).unwrap();
        let badges = schema.tables.iter_mut().find(|t| t.name == "BADGES").unwrap();
        let reference = badges.columns[1].references.as_mut().unwrap();
        reference.cardinality = Some("N:1".parse().unwrap());

        let again = parse_mermaid_schema(&schema_to_mermaid(&schema)).unwrap();
        assert_eq!(again.relationship_count(), 1);
        assert!(again.table("USERS").unwrap().columns.iter().all(|c| !c.is_foreign_key));
        let owner = again.table("BADGES").unwrap().column("owner_code").unwrap();
        assert_eq!(owner.references.as_ref().unwrap().table, "USERS");
    }
}
