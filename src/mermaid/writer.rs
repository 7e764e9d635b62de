//! Schema to Mermaid `erDiagram`.

use crate::cardinality::{Cardinality, Multiplicity};
use crate::measure::{max_width, pad_to};
use crate::model::{Column, DatabaseSchema, Table};

/// Attribute types cannot contain whitespace.
fn sanitize_type(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        String::from("TEXT")
    } else {
        joined
    }
}

/// Entity and attribute names are restricted to word characters and `-`.
fn sanitize(s: &str) -> String {
    let name: String = s
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    match name.chars().next() {
        None => String::from("_"),
        Some('-') => format!("_{name}"),
        Some(_) => name,
    }
}

fn left_token(m: Multiplicity) -> &'static str {
    match m {
        Multiplicity::One => "||",
        Multiplicity::ZeroOrOne => "|o",
        Multiplicity::OneOrMany => "}|",
        Multiplicity::Many | Multiplicity::ZeroOrMany => "}o",
    }
}

fn right_token(m: Multiplicity) -> &'static str {
    match m {
        Multiplicity::One => "||",
        Multiplicity::ZeroOrOne => "o|",
        Multiplicity::OneOrMany => "|{",
        Multiplicity::Many | Multiplicity::ZeroOrMany => "o{",
    }
}

fn keys(column: &Column) -> String {
    let mut keys = Vec::new();
    if column.is_primary_key {
        keys.push("PK");
    }
    if column.is_foreign_key {
        keys.push("FK");
    }
    if column.is_unique && !column.is_primary_key {
        keys.push("UK");
    }
    keys.join(", ")
}

fn write_block(output: &mut String, table: &Table) {
    let columns: Vec<&Column> = table.columns.iter().filter(|c| !c.is_virtual()).collect();
    let types: Vec<String> = columns.iter().map(|c| sanitize_type(&c.typ)).collect();
    let names: Vec<String> = columns.iter().map(|c| sanitize(&c.name)).collect();
    let type_width = max_width(types.iter().map(String::as_str));
    let name_width = max_width(names.iter().map(String::as_str));

    output.push_str(&format!("    {} {{\n", sanitize(&table.name)));
    for ((column, typ), name) in columns.iter().zip(&types).zip(&names) {
        let keys = keys(column);
        let line = if keys.is_empty() {
            format!("{} {}", pad_to(typ, type_width), name)
        } else {
            format!("{} {} {}", pad_to(typ, type_width), pad_to(name, name_width), keys)
        };
        output.push_str("        ");
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output.push_str("    }\n");
}

/// `parent L--R child` when the key side is many, else written from the
/// child so the parser puts the key back on the same table.
///
/// The parser keeps the key on the right-hand table only when the right
/// token is many, so a many parent on a single key side (`N:1`) is written
/// as `o|`. The key stays put and the parent multiplicity reads back as
/// `0..1`.
fn relationship_line(child: &Table, column: &Column, parent: &str, cardinality: Option<Cardinality>) -> String {
    let child_name = sanitize(&child.name);
    let parent_name = sanitize(parent);
    let label = sanitize(&column.name);

    match cardinality {
        Some(c) if !c.right_is_many() => {
            let parent_side = if c.left_is_many() {
                Multiplicity::ZeroOrOne
            } else {
                c.left
            };
            format!(
                "    {} {}--{} {} : \"{}\"\n",
                child_name,
                left_token(c.right),
                right_token(parent_side),
                parent_name,
                label
            )
        }
        Some(c) => format!(
            "    {} {}--{} {} : \"{}\"\n",
            parent_name,
            left_token(c.left),
            right_token(c.right),
            child_name,
            label
        ),
        None => format!("    {parent_name} ||--o{{ {child_name} : \"{label}\"\n"),
    }
}

/// One block per table (virtual `_ref_` columns omitted), then one
/// relationship line per foreign-key column.
pub fn schema_to_mermaid(schema: &DatabaseSchema) -> String {
    let mut output = String::from("erDiagram\n");

    for table in &schema.tables {
        write_block(&mut output, table);
    }

    let relationships: Vec<String> = schema
        .tables
        .iter()
        .flat_map(|t| {
            t.foreign_keys()
                .map(move |(column, r)| relationship_line(t, column, &r.table, r.cardinality))
        })
        .collect();
    if !relationships.is_empty() {
        output.push('\n');
        for line in relationships {
            output.push_str(&line);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Format;

    #[test]
    fn test_schema_to_mermaid() {
        let mut users = Table::new("users");
        users.upsert_column(Column::new("id", "INT").primary_key());
        users.upsert_column(Column::new("display name", "DOUBLE PRECISION"));

        let mut posts = Table::new("posts");
        posts.upsert_column(Column::new("id", "INT").primary_key());
        let mut user_id = Column::new("user_id", "INT");
        user_id.set_reference("users", "id");
        if let Some(r) = user_id.references.as_mut() {
            r.cardinality = Some("1:1..N".parse().unwrap());
        }
        posts.upsert_column(user_id);

        let schema = DatabaseSchema {
            tables: vec![users, posts],
            ..DatabaseSchema::new("s", Format::Sql)
        };

        let expected = r#"erDiagram
    users {
        INT              id           PK
        DOUBLE_PRECISION display_name
    }
    posts {
        INT id      PK
        INT user_id FK
    }

    users ||--|{ posts : "user_id"
"#;
        assert_eq!(schema_to_mermaid(&schema), expected);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("order items"), "order_items");
        assert_eq!(sanitize("dbo.Users"), "dbo_Users");
        assert_eq!(sanitize_type("character varying(20)"), "character_varying(20)");
    }

    #[test]
    fn test_one_to_one_written_from_child() {
        let child = Table::new("profiles");
        let mut col = Column::new("user_id", "INT");
        col.set_reference("users", "id");
        let c: Cardinality = "1:1".parse().unwrap();

        let line = relationship_line(&child, &col, "users", Some(c));
        assert_eq!(line, "    profiles ||--|| users : \"user_id\"\n");

        let line = relationship_line(&child, &col, "users", None);
        assert_eq!(line, "    users ||--o{ profiles : \"user_id\"\n");
    }

    #[test]
    fn test_many_parent_with_single_key_written_from_child() {
        let child = Table::new("badges");
        let mut col = Column::new("owner_code", "TEXT");
        col.set_reference("users", "code");

        let line = relationship_line(&child, &col, "users", Some("N:1".parse().unwrap()));
        assert_eq!(line, "    badges ||--o| users : \"owner_code\"\n");

        let line = relationship_line(&child, &col, "users", Some("N:0..N".parse().unwrap()));
        assert_eq!(line, "    users }o--o{ badges : \"owner_code\"\n");
    }
}
