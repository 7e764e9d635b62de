//! Line-oriented `erDiagram` parser.

use tracing::{debug, trace};

use crate::cardinality::{Cardinality, Multiplicity};
use crate::model::{Column, Table};

/// `A <left>--<right> B [: label]`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipLine {
    pub left: String,
    pub right: String,
    pub cardinality: Cardinality,
    pub label: Option<String>,
}

/// `type name [PK, FK, UK] ["comment"]`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLine {
    pub typ: String,
    pub name: String,
    pub primary_key: bool,
    pub unique: bool,
    pub foreign_key: bool,
}

impl ColumnLine {
    fn into_column(self) -> Column {
        let mut column = Column::new(self.name, self.typ.to_uppercase());
        if self.primary_key {
            column = column.primary_key();
        }
        column.is_unique = self.unique;
        // Marker only; cleared again unless a relationship claims it
        column.is_foreign_key = self.foreign_key;
        column
    }
}

pub fn is_header(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("erdiagram")
}

/// Blank lines and `%%` comments.
pub fn is_ignorable(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with("%%")
}

fn is_entity_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        && !s.starts_with('-')
}

fn is_attribute_word(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(['{', '}', '"'])
        && s.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Map one crow's-foot half (`||`, `o{`, `}|`, ...) to a multiplicity.
pub fn token_multiplicity(token: &str) -> Multiplicity {
    let has_zero = token.contains('o');
    let has_one = token.contains('|');

    if token.contains('}') {
        Multiplicity::OneOrMany
    } else if token.contains('{') {
        if has_one {
            Multiplicity::OneOrMany
        } else {
            Multiplicity::ZeroOrMany
        }
    } else if has_zero {
        Multiplicity::ZeroOrOne
    } else if has_one {
        Multiplicity::One
    } else {
        Multiplicity::ZeroOrMany
    }
}

pub fn parse_relationship(line: &str) -> Option<RelationshipLine> {
    let (head, label) = match line.split_once(':') {
        Some((head, label)) => (head, Some(label.trim().trim_matches('"').to_string())),
        None => (line, None),
    };

    let parts: Vec<&str> = head.split_whitespace().collect();
    let [left, token, right] = parts.as_slice() else {
        return None;
    };
    if !is_entity_name(left) || !is_entity_name(right) {
        return None;
    }
    if !token.chars().all(|c| matches!(c, '|' | 'o' | '{' | '}' | '-' | '.')) {
        return None;
    }
    let (l, r) = token.split_once("--").or_else(|| token.split_once(".."))?;
    if l.is_empty() || r.is_empty() {
        return None;
    }

    Some(RelationshipLine {
        left: left.to_string(),
        right: right.to_string(),
        cardinality: Cardinality::new(token_multiplicity(l), token_multiplicity(r)),
        label: label.filter(|l| !l.is_empty()),
    })
}

/// `NAME {` with whatever follows the brace.
pub fn parse_block_open(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.trim().split_once('{')?;
    let name = name.trim();
    is_entity_name(name).then_some((name, rest))
}

pub fn parse_column(line: &str) -> Option<ColumnLine> {
    // Drop the trailing "comment"
    let body = match line.find('"') {
        Some(i) => &line[..i],
        None => line,
    };
    let mut words = body.split_whitespace();
    let typ = words.next().filter(|w| is_attribute_word(w))?;
    let name = words.next().filter(|w| is_attribute_word(w))?;

    let keys: Vec<String> = words
        .flat_map(|w| w.split(','))
        .filter(|k| !k.is_empty())
        .map(str::to_uppercase)
        .collect();
    let has = |key: &str| keys.iter().any(|k| k == key);

    Some(ColumnLine {
        typ: typ.to_string(),
        name: name.to_string(),
        primary_key: has("PK"),
        unique: has("UK"),
        foreign_key: has("FK"),
    })
}

/// A column line that may end with the block's closing brace.
pub fn split_closing_brace(line: &str) -> (&str, bool) {
    let t = line.trim();
    match t.strip_suffix('}') {
        Some(body) => (body.trim(), true),
        None => (t, false),
    }
}

/// Tables in first-appearance order plus relationship lines.
#[derive(Debug, Default)]
pub struct Diagram {
    pub tables: Vec<Table>,
    pub relationships: Vec<RelationshipLine>,
}

impl Diagram {
    fn ensure_table(&mut self, name: &str) -> usize {
        match self.tables.iter().position(|t| t.name == name) {
            Some(i) => i,
            None => {
                self.tables.push(Table::new(name));
                self.tables.len() - 1
            }
        }
    }

    fn add_column(&mut self, table: usize, line: &str) {
        if line.is_empty() {
            return;
        }
        match parse_column(line) {
            Some(col) => self.tables[table].upsert_column(col.into_column()),
            None => trace!(line, "skipping attribute line"),
        }
    }
}

/// Scan an `erDiagram`. `None` when the first meaningful line is not the
/// header.
pub fn scan(input: &str) -> Option<Diagram> {
    let mut lines = input.lines().filter(|l| !is_ignorable(l));
    if !is_header(lines.next()?) {
        return None;
    }

    let mut diagram = Diagram::default();
    let mut current: Option<usize> = None;

    for line in lines {
        let t = line.trim();

        if let Some(table) = current {
            if t == "}" {
                current = None;
                continue;
            }
            let (body, closes) = split_closing_brace(t);
            diagram.add_column(table, body);
            if closes {
                current = None;
            }
            continue;
        }

        if let Some(rel) = parse_relationship(t) {
            diagram.ensure_table(&rel.left);
            diagram.ensure_table(&rel.right);
            diagram.relationships.push(rel);
            continue;
        }

        if let Some((name, rest)) = parse_block_open(t) {
            let table = diagram.ensure_table(name);
            let (body, closes) = split_closing_brace(rest);
            diagram.add_column(table, body);
            if !closes {
                current = Some(table);
            }
            continue;
        }

        trace!(line = t, "skipping unrecognised line");
    }

    Some(diagram)
}

/// Pick the child column that carries the reference to `parent`.
///
/// Tiers, first match wins:
/// 1. an FK-marked, still unreferenced column named like the relationship
///    label (how `schema_to_mermaid` names its lines)
/// 2. FK-marked `{ref}_id`
/// 3. FK-marked `{ref}id`
/// 4. FK-marked, containing the parent name
/// 5. `{ref}_id`
/// 6. `{ref}id`
/// 7. a non-key column named like the parent's primary key
///
/// The label tier runs ahead of the name patterns. Without it several keys to the
/// same parent would all collapse onto the first `{ref}_id` match.
fn find_fk_column(child: &Table, parent: &str, pk_name: &str, label: Option<&str>) -> Option<usize> {
    let r = parent.to_lowercase();
    let with_underscore = format!("{r}_id");
    let without = format!("{r}id");
    let pk_lower = pk_name.to_lowercase();

    // Columns already tied to a different table are never reused
    let free = |c: &Column| {
        c.references
            .as_ref()
            .is_none_or(|existing| existing.table == parent)
    };

    let tiers: [&dyn Fn(&Column, &str) -> bool; 7] = [
        &|c: &Column, _: &str| {
            c.is_foreign_key && c.references.is_none() && label.is_some_and(|l| c.name == l)
        },
        &|c: &Column, n: &str| c.is_foreign_key && n == with_underscore,
        &|c: &Column, n: &str| c.is_foreign_key && n == without,
        &|c: &Column, n: &str| c.is_foreign_key && n.contains(r.as_str()),
        &|_: &Column, n: &str| n == with_underscore,
        &|_: &Column, n: &str| n == without,
        // The child's own key is never the reference
        &|c: &Column, n: &str| !c.is_primary_key && n == pk_lower,
    ];

    tiers.iter().find_map(|tier| {
        child.columns.iter().position(|c| {
            let name = c.name.to_lowercase();
            free(c) && tier(c, &name)
        })
    })
}

/// Place a foreign key for every relationship on its "many" side.
pub fn resolve_relationships(mut diagram: Diagram) -> Vec<Table> {
    for rel in &diagram.relationships {
        let (child, parent, cardinality) = if rel.cardinality.right_is_many() {
            (&rel.right, &rel.left, rel.cardinality)
        } else {
            (&rel.left, &rel.right, rel.cardinality.reversed())
        };

        let Some(parent_table) = diagram.tables.iter().find(|t| &t.name == parent) else {
            continue;
        };
        let (pk_name, pk_type) = parent_table
            .primary_key()
            .map(|c| (c.name.clone(), c.typ.clone()))
            .unwrap_or_else(|| ("id".to_string(), "INT".to_string()));

        let Some(child_index) = diagram.tables.iter().position(|t| &t.name == child) else {
            continue;
        };
        let child_table = &mut diagram.tables[child_index];

        let index = match find_fk_column(child_table, parent, &pk_name, rel.label.as_deref()) {
            Some(i) => i,
            None => {
                let name = format!("{}_id", parent.to_lowercase());
                if child_table.column(&name).is_some() {
                    debug!(table = %child, column = %name, "foreign key column already taken");
                    continue;
                }
                child_table.columns.push(Column::new(name, pk_type));
                child_table.columns.len() - 1
            }
        };

        let column = &mut child_table.columns[index];
        column.set_reference(parent.clone(), pk_name);
        if let Some(r) = column.references.as_mut() {
            r.cardinality = Some(cardinality);
        }
    }

    for column in diagram.tables.iter_mut().flat_map(|t| t.columns.iter_mut()) {
        if column.references.is_none() {
            column.is_foreign_key = false;
        }
    }
    diagram.tables
}
