//! Compressed `s:l:f:j` source map decoding (spec §4.1 "Source map
//! decoding").

pub mod ast;
pub mod visitor;

use crate::error::EngineError;

/// The `j` field of a source map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    In,
    Out,
    Regular,
}

impl JumpKind {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::In),
            'o' => Some(Self::Out),
            '-' => Some(Self::Regular),
            _ => None,
        }
    }
}

/// One decoded instruction's source location. `file == -1` means
/// compiler-generated code with no source mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrcLoc {
    pub start: usize,
    pub length: usize,
    pub file: i64,
    pub jump: JumpKind,
}

/// Decodes a full `;`-separated compressed source map into one entry per
/// instruction index, inheriting any field left blank from the previous
/// entry (spec §4.1 "Decode a single entry").
pub fn decode_source_map(compressed: &str) -> eyre::Result<Vec<SrcLoc>> {
    let mut out = Vec::new();
    let mut last = SrcLoc { start: 0, length: 0, file: -1, jump: JumpKind::Regular };
    for entry in compressed.split(';') {
        if !entry.is_empty() {
            let mut fields = entry.split(':');
            if let Some(s) = fields.next().filter(|s| !s.is_empty()) {
                last.start = s
                    .parse()
                    .map_err(|_| EngineError::ModelGap(format!("bad source map `s` field: {s}")))?;
            }
            if let Some(l) = fields.next().filter(|s| !s.is_empty()) {
                last.length = l
                    .parse()
                    .map_err(|_| EngineError::ModelGap(format!("bad source map `l` field: {l}")))?;
            }
            if let Some(f) = fields.next().filter(|s| !s.is_empty()) {
                last.file = f
                    .parse()
                    .map_err(|_| EngineError::ModelGap(format!("bad source map `f` field: {f}")))?;
            }
            if let Some(j) = fields.next().filter(|s| !s.is_empty()) {
                last.jump = JumpKind::from_char(j.chars().next().unwrap())
                    .ok_or_else(|| EngineError::ModelGap(format!("bad source map `j` field: {j}")))?;
            }
        }
        out.push(last);
    }
    Ok(out)
}

/// The entry at instruction index `index`, if any (spec's `atIndex`).
pub fn at_index(map: &[SrcLoc], index: usize) -> Option<&SrcLoc> {
    map.get(index)
}

/// The first instruction index whose `(start, length)` matches, optionally
/// constrained to a specific `jump` kind (spec's `toIndex`). The `file`
/// field is ignored, per the single-file assumption noted in
/// `SPEC_FULL.md`'s Open Questions.
pub fn to_index(map: &[SrcLoc], start: usize, length: usize, jump: Option<JumpKind>) -> Option<usize> {
    map.iter()
        .position(|loc| loc.start == start && loc.length == length && jump.map(|j| j == loc.jump).unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherits_blank_fields_from_previous_entry() {
        let map = decode_source_map("10:4:0:-;:8;20:2::i").unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map[0], SrcLoc { start: 10, length: 4, file: 0, jump: JumpKind::Regular });
        assert_eq!(map[1], SrcLoc { start: 10, length: 8, file: 0, jump: JumpKind::Regular });
        assert_eq!(map[2], SrcLoc { start: 20, length: 2, file: 0, jump: JumpKind::In });
    }

    #[test]
    fn to_index_inverts_at_index() {
        let map = decode_source_map("0:1:0:-;5:2:0:-;5:2:0:i").unwrap();
        for k in 0..map.len() {
            let loc = at_index(&map, k).unwrap();
            assert_eq!(to_index(&map, loc.start, loc.length, Some(loc.jump)), Some(k));
        }
    }

    #[test]
    fn empty_entry_at_start_uses_defaults() {
        let map = decode_source_map(";1:2:0:-").unwrap();
        assert_eq!(map[0], SrcLoc { start: 0, length: 0, file: -1, jump: JumpKind::Regular });
        assert_eq!(map[1], SrcLoc { start: 1, length: 2, file: 0, jump: JumpKind::Regular });
    }
}
