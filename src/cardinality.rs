//! Relationship multiplicity and its inference from column constraints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{Column, Nullability};

/// One side of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    One,        // 1
    ZeroOrOne,  // 0..1
    Many,       // N
    ZeroOrMany, // 0..N
    OneOrMany,  // 1..N
}

impl Multiplicity {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::ZeroOrOne => "0..1",
            Self::Many => "N",
            Self::ZeroOrMany => "0..N",
            Self::OneOrMany => "1..N",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "1" => Some(Self::One),
            "0..1" => Some(Self::ZeroOrOne),
            "N" | "M" | "*" => Some(Self::Many),
            "0..N" | "0..*" => Some(Self::ZeroOrMany),
            "1..N" | "1..*" => Some(Self::OneOrMany),
            _ => None,
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self, Self::Many | Self::ZeroOrMany | Self::OneOrMany)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `"{left}:{right}"`: left is the referenced side, right the foreign-key side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cardinality {
    pub left: Multiplicity,
    pub right: Multiplicity,
}

impl Cardinality {
    pub fn new(left: Multiplicity, right: Multiplicity) -> Self {
        Self { left, right }
    }

    pub fn left_is_many(&self) -> bool {
        self.left.is_many()
    }

    pub fn right_is_many(&self) -> bool {
        self.right.is_many()
    }

    pub fn reversed(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.left, self.right)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid cardinality: {0}")]
pub struct InvalidCardinality(String);

impl FromStr for Cardinality {
    type Err = InvalidCardinality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cardinality(s).ok_or_else(|| InvalidCardinality(s.to_string()))
    }
}

impl From<Cardinality> for String {
    fn from(c: Cardinality) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Cardinality {
    type Error = InvalidCardinality;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Split a `"{left}:{right}"` string back into its two symbols.
pub fn parse_cardinality(s: &str) -> Option<Cardinality> {
    let (left, right) = s.split_once(':')?;
    Some(Cardinality {
        left: Multiplicity::from_symbol(left)?,
        right: Multiplicity::from_symbol(right)?,
    })
}

/// Derive the multiplicity of `fk -> pk` from the two columns' constraints.
///
/// The referenced side is singular when `pk` is a primary or unique key; how
/// optional it is follows the FK column's nullability, with an undeclared
/// nullability treated as optional. The FK side is `1` for a unique FK
/// (one-to-one), otherwise a "many" refined by the same nullability.
pub fn calculate_cardinality(pk: &Column, fk: &Column) -> Cardinality {
    let left = if pk.is_primary_key || pk.is_unique {
        match fk.nullability {
            Nullability::NotNull => Multiplicity::One,
            Nullability::Nullable | Nullability::Unknown => Multiplicity::ZeroOrOne,
        }
    } else {
        Multiplicity::Many
    };

    let right = if fk.is_unique {
        Multiplicity::One
    } else {
        match fk.nullability {
            Nullability::NotNull => Multiplicity::OneOrMany,
            Nullability::Nullable => Multiplicity::ZeroOrMany,
            Nullability::Unknown => Multiplicity::Many,
        }
    };

    Cardinality { left, right }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk(nullability: Nullability, unique: bool) -> Column {
        let mut col = Column::new("user_id", "INT");
        col.nullability = nullability;
        col.is_unique = unique;
        col
    }

    #[test]
    fn test_not_null_fk_to_pk() {
        let pk = Column::new("id", "INT").primary_key();
        let c = calculate_cardinality(&pk, &fk(Nullability::NotNull, false));
        assert_eq!(c.to_string(), "1:1..N");
    }

    #[test]
    fn test_nullable_and_unknown_fk() {
        let pk = Column::new("id", "INT").primary_key();
        assert_eq!(
            calculate_cardinality(&pk, &fk(Nullability::Nullable, false)).to_string(),
            "0..1:0..N"
        );
        assert_eq!(
            calculate_cardinality(&pk, &fk(Nullability::Unknown, false)).to_string(),
            "0..1:N"
        );
    }

    #[test]
    fn test_unique_fk_is_one_to_one() {
        let pk = Column::new("id", "INT").primary_key();
        let c = calculate_cardinality(&pk, &fk(Nullability::NotNull, true));
        assert_eq!(c.to_string(), "1:1");
        assert!(!c.right_is_many());
    }

    #[test]
    fn test_non_unique_target() {
        let target = Column::new("code", "TEXT");
        let c = calculate_cardinality(&target, &fk(Nullability::NotNull, false));
        assert_eq!(c.left, Multiplicity::Many);
    }

    #[test]
    fn test_parse_round_trips_every_combination() {
        let pks = [
            Column::new("id", "INT").primary_key(),
            Column::new("id", "INT"),
        ];
        for pk in &pks {
            for nullability in [Nullability::NotNull, Nullability::Nullable, Nullability::Unknown] {
                for unique in [false, true] {
                    let c = calculate_cardinality(pk, &fk(nullability, unique));
                    assert_eq!(parse_cardinality(&c.to_string()), Some(c));
                }
            }
        }
    }

    #[test]
    fn test_parse_tolerates_star_notation() {
        let c = parse_cardinality("1:1..*").unwrap();
        assert_eq!(c.right, Multiplicity::OneOrMany);
        assert!(parse_cardinality("1-N").is_none());
        assert!(parse_cardinality("1:X").is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let c = Cardinality::new(Multiplicity::One, Multiplicity::ZeroOrMany);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"1:0..N\"");
        let back: Cardinality = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
