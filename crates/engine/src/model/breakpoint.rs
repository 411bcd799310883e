/// A line-keyed breakpoint (spec §3 "Breakpoint").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Breakpoint {
    pub id: u32,
    /// Line in the *currently mutated* source (see `File::line_offsets`).
    pub line: usize,
    /// True once an `(address, pc)` pair has been bound for this breakpoint.
    pub verified: bool,
    /// User-visible breakpoints are reported via `breakpointValidated`;
    /// internal ones (placed by the evaluator) are not.
    pub visible: bool,
    /// Whether `line` was expressed in the user's original source (and thus
    /// needed forward-translation through `lineOffsets`) when it was set.
    pub original_source: bool,
    /// `(address, pc)` once resolved. `None` while unbound (spec §7, kind 3).
    pub binding: Option<(alloy_primitives::Address, usize)>,
}

impl Breakpoint {
    pub fn new(id: u32, line: usize, visible: bool, original_source: bool) -> Self {
        Self { id, line, verified: false, visible, original_source, binding: None }
    }
}
