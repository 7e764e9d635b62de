//! Valid/invalid byte ranges for live syntax highlighting.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityRange {
    pub start: usize,
    pub end: usize,
    pub is_valid: bool,
}

impl ValidityRange {
    pub fn new(start: usize, end: usize, is_valid: bool) -> Self {
        Self {
            start,
            end,
            is_valid,
        }
    }
}

/// Turn sorted, possibly sparse block ranges into a partition of `[0, len)`.
///
/// Gaps between blocks count as valid, overlaps are clipped, and
/// neighbouring ranges with the same validity are merged.
pub fn partition(len: usize, blocks: impl IntoIterator<Item = ValidityRange>) -> Vec<ValidityRange> {
    fn push(out: &mut Vec<ValidityRange>, start: usize, end: usize, is_valid: bool) {
        if end <= start {
            return;
        }
        match out.last_mut() {
            Some(last) if last.is_valid == is_valid && last.end == start => last.end = end,
            _ => out.push(ValidityRange::new(start, end, is_valid)),
        }
    }

    let mut out: Vec<ValidityRange> = Vec::new();
    let mut cursor = 0;

    for block in blocks {
        let start = block.start.max(cursor).min(len);
        let end = block.end.min(len);
        push(&mut out, cursor, start, true);
        push(&mut out, start, end, block.is_valid);
        cursor = cursor.max(end);
    }
    push(&mut out, cursor, len, true);
    out
}

/// Re-express byte offsets into `text` as UTF-16 code-unit offsets, the
/// unit JavaScript string indices use.
pub fn to_utf16(text: &str, ranges: &[ValidityRange]) -> Vec<ValidityRange> {
    let offset = |byte: usize| match text.get(..byte) {
        Some(prefix) => prefix.encode_utf16().count(),
        None => text.encode_utf16().count(),
    };
    ranges
        .iter()
        .map(|r| ValidityRange::new(offset(r.start), offset(r.end), r.is_valid))
        .collect()
}
