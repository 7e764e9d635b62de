//! SQL DDL to schema graph.
//!
//! Supports CREATE TABLE, CREATE VIEW and ALTER TABLE ADD in the common
//! PostgreSQL, MySQL, SQLite and SQL Server spellings. Anything else in the
//! script is ignored, and malformed statements are skipped one by one.

mod build;
mod lexer;
mod parser;
mod types;
mod validate;
mod view;
mod writer;

use tracing::debug;

use crate::category::{CategoryConfig, assign_categories};
use crate::model::{DatabaseSchema, Format};

pub use parser::SqlParseError;
pub use validate::identify_valid_blocks;
pub use writer::{quote_ident, schema_to_sql};

pub const DEFAULT_SCHEMA_NAME: &str = "SQL Schema";

/// Parse a SQL script with the default category configuration.
pub fn parse_sql_schema(input: &str) -> Option<DatabaseSchema> {
    parse_sql_schema_with(input, &CategoryConfig::default())
}

/// Parse a SQL script. `None` when it holds neither a table nor a view.
pub fn parse_sql_schema_with(input: &str, config: &CategoryConfig) -> Option<DatabaseSchema> {
    let script = parser::Script::new(input);
    let statements = script.parse();
    debug!(
        statements = script.statements.len(),
        recognised = statements.len(),
        "parsed sql script"
    );

    let (tables, pending) = build::extract_tables(&statements);
    let (tables, pending) = build::apply_added_columns(tables, pending, &statements);
    let tables = build::resolve_references(tables, &pending);
    let tables = build::apply_key_constraints(tables, &statements);
    let tables = build::apply_alter_foreign_keys(tables, &statements);

    let views = view::extract_views(&statements, &tables);
    if tables.is_empty() && views.is_empty() {
        return None;
    }
    let views = view::synthesize_relationships(views, &tables);

    let (table_count, view_count) = (tables.len(), views.len());
    let all = tables.into_iter().chain(views).collect();
    let all = build::apply_cardinalities(all);
    let all = assign_categories(all, config);

    let name = statements
        .iter()
        .rev()
        .find_map(|s| match s {
            parser::Statement::SchemaName(name) => Some(name.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string());

    let schema = DatabaseSchema {
        tables: all,
        ..DatabaseSchema::new(name, Format::Sql)
    };
    debug!(
        tables = table_count,
        views = view_count,
        relationships = schema.relationship_count(),
        "built sql schema"
    );
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cardinality::Multiplicity;

    #[test]
    fn test_empty_input() {
        assert!(parse_sql_schema("").is_none());
        assert!(parse_sql_schema("-- nothing here\nSELECT 1;").is_none());
    }

    #[test]
    fn test_users_and_posts() {
        let schema = parse_sql_schema(
            "CREATE TABLE users (id SERIAL PRIMARY KEY, username VARCHAR(50) UNIQUE); CREATE TABLE posts (id SERIAL PRIMARY KEY, user_id INTEGER REFERENCES users(id));",
        )
        .unwrap();

        assert_eq!(schema.name, "SQL Schema");
        assert_eq!(schema.format, Format::Sql);
        assert_eq!(schema.tables.len(), 2);

        let user_id = schema.table("posts").unwrap().column("user_id").unwrap();
        assert!(user_id.is_foreign_key);
        let r = user_id.references.as_ref().unwrap();
        assert_eq!((r.table.as_str(), r.column.as_str()), ("users", "id"));
        assert_eq!(r.cardinality.unwrap().right, Multiplicity::Many);
    }

    #[test]
    fn test_alter_add_column() {
        let schema = parse_sql_schema(
            "CREATE TABLE users(id INT PRIMARY KEY);\nALTER TABLE users ADD email VARCHAR(255);",
        )
        .unwrap();
        let users = &schema.tables[0];
        assert_eq!(users.columns.len(), 2);
        let email = users.column("email").unwrap();
        assert!(!email.is_primary_key);
        assert!(!email.is_foreign_key);
    }

    #[test]
    fn test_dangling_alter_fk() {
        let schema = parse_sql_schema(
            "CREATE TABLE child (id INT PRIMARY KEY, x INT);\nALTER TABLE child ADD CONSTRAINT fk FOREIGN KEY(x) REFERENCES missing_table(y);",
        )
        .unwrap();
        assert!(schema.tables[0].columns.iter().all(|c| !c.is_foreign_key));
    }

    #[test]
    fn test_views_follow_tables() {
        let schema = parse_sql_schema(
            "CREATE VIEW v AS SELECT * FROM t;\nCREATE TABLE t (id INT PRIMARY KEY);",
        )
        .unwrap();
        assert_eq!(schema.tables[0].name, "t");
        assert!(schema.tables[1].is_view);
        assert_eq!(schema.tables[1].category, "Views");
        assert!(!schema.tables[0].color.is_empty());
    }

    #[test]
    fn test_view_only_script() {
        let schema = parse_sql_schema("CREATE VIEW v AS SELECT 1 AS one FROM dual;").unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert!(schema.tables[0].is_view);
    }

    #[test]
    fn test_schema_name() {
        let schema = parse_sql_schema("USE shop;\nCREATE TABLE t (id INT);").unwrap();
        assert_eq!(schema.name, "shop");
    }

    #[test]
    fn test_tsql_batches() {
        let schema = parse_sql_schema(
            "CREATE TABLE [dbo].[Users] ([Id] INT IDENTITY(1,1) NOT NULL, [Name] NVARCHAR(100) NULL)\nGO\nCREATE TABLE [dbo].[Orders] ([Id] INT PRIMARY KEY, [UserId] INT NOT NULL)\nGO\nALTER TABLE [dbo].[Orders] ADD CONSTRAINT [FK_Orders_Users] FOREIGN KEY ([UserId]) REFERENCES [dbo].[Users] ([Id])\nGO\n",
        )
        .unwrap();

        assert_eq!(schema.tables.len(), 2);
        let users = schema.table("Users").unwrap();
        assert!(users.columns[0].is_primary_key);
        assert_eq!(users.columns[1].typ, "NVARCHAR(100)");

        let fk = schema.table("Orders").unwrap().column("UserId").unwrap();
        assert_eq!(fk.references.as_ref().unwrap().table, "Users");
        assert_eq!(fk.references.as_ref().unwrap().cardinality.unwrap().to_string(), "1:1..N");
    }

    #[test]
    fn test_clustered_keys_drive_cardinality() {
        let schema = parse_sql_schema(
            "CREATE TABLE [dbo].[Users] ([Id] INT NOT NULL, CONSTRAINT [PK_Users] PRIMARY KEY CLUSTERED ([Id] ASC))\nGO\nCREATE TABLE [dbo].[Orders] ([Id] INT NOT NULL, [UserId] INT NOT NULL)\nGO\nALTER TABLE [dbo].[Orders] ADD CONSTRAINT [PK_Orders] PRIMARY KEY CLUSTERED ([Id])\nGO\nALTER TABLE [dbo].[Orders] ADD CONSTRAINT [FK_Orders_Users] FOREIGN KEY ([UserId]) REFERENCES [dbo].[Users] ([Id])\nGO\n",
        )
        .unwrap();

        assert!(schema.table("Users").unwrap().column("Id").unwrap().is_primary_key);
        let orders = schema.table("Orders").unwrap();
        assert!(orders.column("Id").unwrap().is_primary_key);
        let fk = orders.column("UserId").unwrap();
        assert_eq!(fk.references.as_ref().unwrap().cardinality.unwrap().to_string(), "1:1..N");
    }

    #[test]
    fn test_on_update_set_null_keeps_not_null() {
        let schema = parse_sql_schema(
            "CREATE TABLE users (id INT PRIMARY KEY);\nCREATE TABLE posts (id INT PRIMARY KEY, user_id INT NOT NULL REFERENCES users(id) ON UPDATE SET NULL);",
        )
        .unwrap();
        let user_id = schema.table("posts").unwrap().column("user_id").unwrap();
        assert_eq!(user_id.nullability, crate::model::Nullability::NotNull);
        assert_eq!(user_id.references.as_ref().unwrap().cardinality.unwrap().to_string(), "1:1..N");
    }
}
