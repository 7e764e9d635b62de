//! Phases that turn parsed statements into tables.
//!
//! Order matters: CREATE TABLE, then ALTER ADD COLUMN, then reference
//! resolution, then ALTER UNIQUE/PRIMARY KEY, then ALTER FOREIGN KEY. Each
//! phase takes the tables by value and returns the next state.

use tracing::debug;

use super::parser::{AlterAction, ForeignKeyDef, Statement};
use crate::cardinality::calculate_cardinality;
use crate::model::{Column, Nullability, Table};

/// A reference declared on `table`, resolved once every table is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReference {
    pub table: String,
    pub foreign_key: ForeignKeyDef,
}

fn find_table<'a>(tables: &'a [Table], name: &str) -> Option<&'a Table> {
    tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

fn find_table_mut<'a>(tables: &'a mut [Table], name: &str) -> Option<&'a mut Table> {
    tables.iter_mut().find(|t| t.name.eq_ignore_ascii_case(name))
}

fn alter_actions(statements: &[Statement]) -> impl Iterator<Item = (&str, &AlterAction)> {
    statements.iter().flat_map(|s| match s {
        Statement::AlterTable(alter) => alter
            .actions
            .iter()
            .map(|a| (alter.table.as_str(), a))
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    })
}

/// CREATE TABLE statements. Tables without columns are dropped and a
/// redefinition replaces the earlier table.
pub fn extract_tables(statements: &[Statement]) -> (Vec<Table>, Vec<PendingReference>) {
    let mut tables: Vec<Table> = Vec::new();
    let mut pending: Vec<PendingReference> = Vec::new();

    for statement in statements {
        let Statement::CreateTable(def) = statement else {
            continue;
        };
        if def.columns.is_empty() {
            debug!(table = %def.name, "dropping table without columns");
            continue;
        }

        let table = Table {
            columns: def.columns.clone(),
            ..Table::new(def.name.clone())
        };
        match find_table_mut(&mut tables, &def.name) {
            Some(existing) => {
                pending.retain(|p| !p.table.eq_ignore_ascii_case(&def.name));
                *existing = table;
            }
            None => tables.push(table),
        }
        pending.extend(def.foreign_keys.iter().map(|fk| PendingReference {
            table: def.name.clone(),
            foreign_key: fk.clone(),
        }));
    }

    (tables, pending)
}

/// `ALTER TABLE t ADD [COLUMN] ...` onto tables that exist.
pub fn apply_added_columns(
    mut tables: Vec<Table>,
    mut pending: Vec<PendingReference>,
    statements: &[Statement],
) -> (Vec<Table>, Vec<PendingReference>) {
    for (table_name, action) in alter_actions(statements) {
        let AlterAction::AddColumn {
            column,
            foreign_key,
        } = action
        else {
            continue;
        };
        let Some(table) = find_table_mut(&mut tables, table_name) else {
            debug!(table = %table_name, column = %column.name, "ADD COLUMN on unknown table");
            continue;
        };
        table.upsert_column(column.clone());
        if let Some(fk) = foreign_key {
            pending.push(PendingReference {
                table: table.name.clone(),
                foreign_key: fk.clone(),
            });
        }
    }
    (tables, pending)
}

/// Resolve `target(column)` to canonical names. With `fallback_to_pk` a
/// missing column falls back to the target's primary key; an omitted
/// column always means the primary key.
fn resolve_target(
    tables: &[Table],
    target: &str,
    column: Option<&str>,
    fallback_to_pk: bool,
) -> Option<(String, String)> {
    let table = find_table(tables, target)?;
    let column = match column {
        Some(name) => match table.column(name) {
            Some(c) => Some(c),
            None if fallback_to_pk => table.primary_key(),
            None => None,
        },
        None => table.primary_key(),
    }?;
    Some((table.name.clone(), column.name.clone()))
}

/// Inline and table-level references from CREATE TABLE and ADD COLUMN.
pub fn resolve_references(mut tables: Vec<Table>, pending: &[PendingReference]) -> Vec<Table> {
    for reference in pending {
        let fk = &reference.foreign_key;
        let Some((target, target_column)) =
            resolve_target(&tables, &fk.target, fk.target_column.as_deref(), true)
        else {
            debug!(
                table = %reference.table,
                column = %fk.column,
                target = %fk.target,
                "dropping unresolved reference"
            );
            continue;
        };
        if let Some(column) =
            find_table_mut(&mut tables, &reference.table).and_then(|t| t.column_mut(&fk.column))
        {
            column.set_reference(target, target_column);
        }
    }
    tables
}

/// `ALTER TABLE ... ADD [CONSTRAINT c] UNIQUE (col)` and `PRIMARY KEY (cols)`.
pub fn apply_key_constraints(mut tables: Vec<Table>, statements: &[Statement]) -> Vec<Table> {
    for (table_name, action) in alter_actions(statements) {
        let Some(table) = find_table_mut(&mut tables, table_name) else {
            continue;
        };
        match action {
            AlterAction::AddUnique(columns) if columns.len() == 1 => {
                if let Some(column) = table.column_mut(&columns[0]) {
                    column.is_unique = true;
                }
            }
            AlterAction::AddPrimaryKey(columns) => {
                for name in columns {
                    if let Some(column) = table.column_mut(name) {
                        column.is_primary_key = true;
                        column.nullability = Nullability::NotNull;
                    }
                }
            }
            _ => {}
        }
    }
    tables
}

/// `ALTER TABLE ... ADD [CONSTRAINT c] FOREIGN KEY (col) REFERENCES p(col)`,
/// applied only when the parent table, parent column and child column all
/// exist.
pub fn apply_alter_foreign_keys(mut tables: Vec<Table>, statements: &[Statement]) -> Vec<Table> {
    for (table_name, action) in alter_actions(statements) {
        let AlterAction::AddForeignKey(fks) = action else {
            continue;
        };
        for fk in fks {
            let Some((target, target_column)) =
                resolve_target(&tables, &fk.target, fk.target_column.as_deref(), false)
            else {
                debug!(table = %table_name, target = %fk.target, "dropping dangling foreign key");
                continue;
            };
            match find_table_mut(&mut tables, table_name).and_then(|t| t.column_mut(&fk.column)) {
                Some(column) => column.set_reference(target, target_column),
                None => debug!(table = %table_name, column = %fk.column, "foreign key on unknown column"),
            }
        }
    }
    tables
}

fn with_cardinality(column: &Column, tables: &[Table]) -> Column {
    let cardinality = column.references.as_ref().and_then(|r| {
        let target = find_table(tables, &r.table)?.column(&r.column)?;
        Some(calculate_cardinality(target, column))
    });
    let mut column = column.clone();
    if let Some(r) = column.references.as_mut() {
        r.cardinality = cardinality;
    }
    column
}

/// Attach a computed cardinality to every resolved reference.
pub fn apply_cardinalities(tables: Vec<Table>) -> Vec<Table> {
    tables
        .iter()
        .map(|t| Table {
            columns: t.columns.iter().map(|c| with_cardinality(c, &tables)).collect(),
            ..t.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::Script;

    fn build(sql: &str) -> Vec<Table> {
        let statements = Script::new(sql).parse();
        let (tables, pending) = extract_tables(&statements);
        let (tables, pending) = apply_added_columns(tables, pending, &statements);
        let tables = resolve_references(tables, &pending);
        let tables = apply_key_constraints(tables, &statements);
        let tables = apply_alter_foreign_keys(tables, &statements);
        apply_cardinalities(tables)
    }

    #[test]
    fn test_forward_reference_resolves() {
        let tables = build(
            r#"
            CREATE TABLE posts (id INT PRIMARY KEY, user_id INT NOT NULL REFERENCES Users);
            CREATE TABLE users (id INT PRIMARY KEY);
        "#,
        );
        let fk = tables[0].column("user_id").unwrap();
        let r = fk.references.as_ref().unwrap();
        assert_eq!(r.table, "users");
        assert_eq!(r.column, "id");
        assert_eq!(r.cardinality.unwrap().to_string(), "1:1..N");
    }

    #[test]
    fn test_missing_target_column_falls_back_to_pk() {
        let tables = build(
            r#"
            CREATE TABLE users (uid INT PRIMARY KEY);
            CREATE TABLE posts (author INT REFERENCES users(id));
        "#,
        );
        let r = tables[1].columns[0].references.as_ref().unwrap();
        assert_eq!(r.column, "uid");
    }

    #[test]
    fn test_unknown_target_is_dropped() {
        let tables = build("CREATE TABLE posts (user_id INT REFERENCES nobody(id));");
        assert!(!tables[0].columns[0].is_foreign_key);
    }

    #[test]
    fn test_table_without_columns_is_dropped() {
        let tables = build("CREATE TABLE empty (CHECK (1 = 1)); CREATE TABLE t (id INT);");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "t");
    }

    #[test]
    fn test_alter_phases() {
        let tables = build(
            r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE profiles (id INT PRIMARY KEY);
            ALTER TABLE profiles ADD CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users(id);
            ALTER TABLE profiles ADD COLUMN user_id INT NOT NULL;
            ALTER TABLE profiles ADD CONSTRAINT uq_user UNIQUE (user_id);
        "#,
        );
        let profiles = &tables[1];
        let user_id = profiles.column("user_id").unwrap();

        // ADD COLUMN runs before the FK pass regardless of statement order
        assert!(user_id.is_foreign_key);
        assert!(user_id.is_unique);
        assert_eq!(
            user_id.references.as_ref().unwrap().cardinality.unwrap().to_string(),
            "1:1"
        );
    }

    #[test]
    fn test_alter_fk_to_missing_column_is_dropped() {
        let tables = build(
            r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE posts (author INT);
            ALTER TABLE posts ADD FOREIGN KEY (author) REFERENCES users(uid);
        "#,
        );
        assert!(!tables[1].columns[0].is_foreign_key);
    }

    #[test]
    fn test_redefinition_replaces_table() {
        let tables = build("CREATE TABLE t (a INT); CREATE TABLE T (b INT, c INT);");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns.len(), 2);
    }
}
