//! Line-level validity for Mermaid editor highlighting.

use super::parser::{
    is_header, is_ignorable, parse_block_open, parse_column, parse_relationship,
    split_closing_brace,
};
use crate::validity::{ValidityRange, partition};

#[derive(Clone, Copy, PartialEq)]
enum State {
    BeforeHeader,
    Top,
    InBlock,
}

/// Partition `text` into valid and invalid byte ranges, one decision per
/// non-blank line.
pub fn identify_valid_blocks(text: &str) -> Vec<ValidityRange> {
    let mut state = State::BeforeHeader;
    let mut blocks = Vec::new();
    let mut offset = 0;

    for raw in text.split_inclusive('\n') {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        if is_ignorable(line) {
            continue;
        }
        let t = line.trim();
        let lead = line.len() - line.trim_start().len();

        let is_valid = match state {
            State::BeforeHeader => {
                let ok = is_header(t);
                if ok {
                    state = State::Top;
                }
                ok
            }
            State::InBlock => {
                let (body, closes) = split_closing_brace(t);
                if closes {
                    state = State::Top;
                }
                body.is_empty() || parse_column(body).is_some()
            }
            State::Top => {
                if parse_relationship(t).is_some() {
                    true
                } else if let Some((_, rest)) = parse_block_open(t) {
                    let (body, closes) = split_closing_brace(rest);
                    if !closes {
                        state = State::InBlock;
                    }
                    body.is_empty() || parse_column(body).is_some()
                } else {
                    false
                }
            }
        };

        blocks.push(ValidityRange::new(start + lead, start + lead + t.len(), is_valid));
    }

    partition(text.len(), blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_diagram_is_one_range() {
        let text = "erDiagram\n  USER ||--o{ POST : writes\n  USER {\n    int id PK\n  }\n";
        assert_eq!(
            identify_valid_blocks(text),
            vec![ValidityRange::new(0, text.len(), true)]
        );
    }

    #[test]
    fn test_bad_lines_are_isolated() {
        let text = "erDiagram\nUSER -> POST\nPOST {\n  id\n}\n";
        let ranges = identify_valid_blocks(text);

        let invalid: Vec<&str> = ranges
            .iter()
            .filter(|r| !r.is_valid)
            .map(|r| &text[r.start..r.end])
            .collect();
        assert_eq!(invalid, ["USER -> POST", "id"]);
        assert_eq!(ranges.last().unwrap().end, text.len());
    }

    #[test]
    fn test_missing_header() {
        let text = "USER { int id PK }";
        assert_eq!(
            identify_valid_blocks(text),
            vec![ValidityRange::new(0, text.len(), false)]
        );
    }
}
