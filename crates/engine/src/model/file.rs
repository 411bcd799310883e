use std::{path::PathBuf, sync::Arc};

use rustc_hash::FxHashMap;

use super::breakpoint::Breakpoint;

/// Source file, plus everything derived from its text (spec §3 "File").
///
/// Invariant: `line_breaks` is always consistent with `source` — the two
/// are only ever updated together, via [`File::set_source`].
#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub source: Arc<String>,
    /// Byte offset of every `\n` in `source`, strictly increasing.
    pub line_breaks: Vec<usize>,
    /// Names of contracts whose source lives in this file.
    pub contracts: Vec<String>,
    pub breakpoints: Vec<Breakpoint>,
    /// original line -> signed number of lines inserted before it by the
    /// evaluator, used to translate between original and mutated sources.
    pub line_offsets: FxHashMap<usize, i64>,
}

impl File {
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_breaks = compute_line_breaks(&source);
        Self {
            path,
            source: Arc::new(source),
            line_breaks,
            contracts: Vec::new(),
            breakpoints: Vec::new(),
            line_offsets: FxHashMap::default(),
        }
    }

    /// Replaces the source text and recomputes the line-break table,
    /// keeping the invariant above intact.
    pub fn set_source(&mut self, source: String) {
        self.line_breaks = compute_line_breaks(&source);
        self.source = Arc::new(source);
    }

    /// Lower-bound search: the line containing byte `offset`.
    ///
    /// If `offset` lands exactly on a stored line-break, that offset *is*
    /// the newline and belongs to the next line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_breaks.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Byte range `[start, end)` of `line` (0-indexed) within `source`.
    pub fn byte_range_of_line(&self, line: usize) -> Option<(usize, usize)> {
        if line > self.line_breaks.len() {
            return None;
        }
        let start = if line == 0 { 0 } else { self.line_breaks[line - 1] + 1 };
        let end = self.line_breaks.get(line).copied().unwrap_or(self.source.len());
        Some((start, end))
    }

    /// `(line, column)` for a byte offset, both 0-indexed.
    pub fn line_col_of_offset(&self, offset: usize) -> (usize, usize) {
        let line = self.line_of_offset(offset);
        let line_start = if line == 0 { 0 } else { self.line_breaks[line - 1] + 1 };
        (line, offset.saturating_sub(line_start))
    }

    /// Forward-translates a line number expressed in the *original* source
    /// into the line space of the *currently mutated* source, by summing
    /// every recorded delta whose key is `<= line`.
    pub fn translate_original_to_current(&self, line: usize) -> usize {
        let delta: i64 =
            self.line_offsets.iter().filter(|(&k, _)| k <= line).map(|(_, &v)| v).sum();
        (line as i64 + delta).max(0) as usize
    }

    /// Shifts every recorded offset (and breakpoint lines past the
    /// insertion point) after the evaluator splices `count` new lines in
    /// before `at_line`.
    pub fn record_insertion(&mut self, at_line: usize, count: i64) {
        self.line_offsets.insert(at_line, self.line_offsets.get(&at_line).copied().unwrap_or(0) + count);
        for bp in self.breakpoints.iter_mut() {
            if bp.line >= at_line {
                bp.line = (bp.line as i64 + count).max(0) as usize;
            }
        }
    }
}

/// Byte positions of every `\n` in `source`, strictly increasing.
pub fn compute_line_breaks(source: &str) -> Vec<usize> {
    source.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_breaks_strictly_increasing() {
        let src = "a\nbb\n\nccc";
        let f = File::new(PathBuf::from("t.sol"), src.to_string());
        assert_eq!(f.line_breaks, vec![1, 4, 5]);
        assert!(f.line_breaks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn line_of_offset_matches_newline_counts_as_next_line() {
        let src = "a\nbb\n\nccc"; // offsets: a=0 \n=1 b=2 b=3 \n=4 \n=5 c=6 c=7 c=8
        let f = File::new(PathBuf::from("t.sol"), src.to_string());
        assert_eq!(f.line_of_offset(0), 0);
        assert_eq!(f.line_of_offset(1), 1); // the newline itself belongs to the next line
        assert_eq!(f.line_of_offset(2), 1);
        assert_eq!(f.line_of_offset(6), 3);
    }

    #[test]
    fn translate_original_to_current_sums_prior_deltas() {
        let mut f = File::new(PathBuf::from("t.sol"), "a\nb\nc\n".to_string());
        f.line_offsets.insert(1, 2);
        f.line_offsets.insert(3, 1);
        assert_eq!(f.translate_original_to_current(0), 0);
        assert_eq!(f.translate_original_to_current(1), 3);
        assert_eq!(f.translate_original_to_current(2), 4);
        assert_eq!(f.translate_original_to_current(3), 6);
    }
}
