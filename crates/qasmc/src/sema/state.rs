//! Ambient parser state consulted by type discovery
//!
//! The grammar driver records what it has seen since the last reset:
//! inferred kinds, delimiter counts, whether a qubit or angle parameter
//! list is being read, the next significant character, and the stack of
//! open blocks with their own brace counters. Discovery reads this
//! snapshot and only writes it back when it consumes a resolution.

use crate::types::SymbolKind;

use super::context::ContextKind;

/// Loop header whose induction or condition names are being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingHeader {
    For,
    While,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Delimiters {
    lparen: u32,
    rparen: u32,
    lbracket: u32,
    rbracket: u32,
    lbrace: u32,
    rbrace: u32,
}

/// A block the parser is inside, with its own brace counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBlock {
    pub kind: ContextKind,
    pub braces_opened: u32,
    pub braces_closed: u32,
}

impl OpenBlock {
    fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            braces_opened: 0,
            braces_closed: 0,
        }
    }

    /// An opening brace is still unmatched
    pub fn braces_open(&self) -> bool {
        self.braces_opened > self.braces_closed
    }

    /// No brace was seen: a single-statement body
    pub fn braces_unseen(&self) -> bool {
        self.braces_opened == 0
    }
}

#[derive(Debug, Clone)]
pub struct ParserState {
    current: SymbolKind,
    previous: SymbolKind,
    delimiters: Delimiters,
    qubit_list: bool,
    angle_list: bool,
    lookahead: Option<char>,
    blocks: Vec<OpenBlock>,
    header: Option<PendingHeader>,
    pragma: bool,
}

impl ParserState {
    pub fn new() -> Self {
        Self {
            current: SymbolKind::Undefined,
            previous: SymbolKind::Undefined,
            delimiters: Delimiters::default(),
            qubit_list: false,
            angle_list: false,
            lookahead: None,
            blocks: Vec::new(),
            header: None,
            pragma: false,
        }
    }

    // ==================== Inferred kinds ====================

    pub fn current_kind(&self) -> SymbolKind {
        self.current
    }

    pub fn previous_kind(&self) -> SymbolKind {
        self.previous
    }

    /// Record a new inferred kind; the old one becomes the previous kind
    pub fn set_current_kind(&mut self, kind: SymbolKind) {
        self.previous = self.current;
        self.current = kind;
    }

    pub fn set_kinds(&mut self, current: SymbolKind, previous: SymbolKind) {
        self.current = current;
        self.previous = previous;
    }

    /// Consume a resolution: the resolved kind becomes the previous kind
    /// and nothing is inferred for the next identifier yet
    pub fn settle(&mut self, resolved: SymbolKind) {
        self.previous = resolved;
        self.current = SymbolKind::Undefined;
    }

    // ==================== Delimiters ====================

    pub fn lparen(&mut self) {
        self.delimiters.lparen += 1;
    }

    pub fn rparen(&mut self) {
        self.delimiters.rparen += 1;
    }

    pub fn lbracket(&mut self) {
        self.delimiters.lbracket += 1;
    }

    pub fn rbracket(&mut self) {
        self.delimiters.rbracket += 1;
    }

    pub fn lbrace(&mut self) {
        self.delimiters.lbrace += 1;
        if let Some(block) = self.blocks.last_mut() {
            block.braces_opened += 1;
        }
    }

    pub fn rbrace(&mut self) {
        self.delimiters.rbrace += 1;
        if let Some(block) = self.blocks.last_mut() {
            block.braces_closed += 1;
        }
    }

    pub fn seen_lparen(&self) -> bool {
        self.delimiters.lparen > 0
    }

    pub fn seen_rparen(&self) -> bool {
        self.delimiters.rparen > 0
    }

    pub fn seen_lbracket(&self) -> bool {
        self.delimiters.lbracket > 0
    }

    pub fn seen_rbracket(&self) -> bool {
        self.delimiters.rbracket > 0
    }

    pub fn seen_lbrace(&self) -> bool {
        self.delimiters.lbrace > 0
    }

    pub fn seen_rbrace(&self) -> bool {
        self.delimiters.rbrace > 0
    }

    pub fn parens_matched(&self) -> bool {
        self.delimiters.lparen == self.delimiters.rparen
    }

    pub fn brackets_matched(&self) -> bool {
        self.delimiters.lbracket == self.delimiters.rbracket
    }

    pub fn braces_matched(&self) -> bool {
        self.delimiters.lbrace == self.delimiters.rbrace
    }

    // ==================== Parameter lists ====================

    pub fn start_qubit_list(&mut self) {
        self.qubit_list = true;
    }

    pub fn stop_qubit_list(&mut self) {
        self.qubit_list = false;
    }

    pub fn in_qubit_list(&self) -> bool {
        self.qubit_list
    }

    pub fn start_angle_list(&mut self) {
        self.angle_list = true;
    }

    pub fn stop_angle_list(&mut self) {
        self.angle_list = false;
    }

    pub fn in_angle_list(&self) -> bool {
        self.angle_list
    }

    /// Next significant character after the identifier being resolved
    pub fn lookahead(&self) -> Option<char> {
        self.lookahead
    }

    pub fn set_lookahead(&mut self, c: Option<char>) {
        self.lookahead = c;
    }

    // ==================== Blocks ====================

    pub fn open_block(&mut self, kind: ContextKind) {
        self.blocks.push(OpenBlock::new(kind));
    }

    /// Pop the innermost block of `kind`. Returns false if none was open.
    pub fn close_block(&mut self, kind: ContextKind) -> bool {
        match self.blocks.iter().rposition(|b| b.kind == kind) {
            Some(pos) => {
                self.blocks.truncate(pos);
                true
            }
            None => false,
        }
    }

    pub fn innermost_block(&self) -> Option<&OpenBlock> {
        self.blocks.last()
    }

    pub fn in_block(&self, kind: ContextKind) -> bool {
        self.blocks.iter().any(|b| b.kind == kind)
    }

    /// A `cal` or `defcal` body is open
    pub fn in_calibration_or_defcal(&self) -> bool {
        self.in_block(ContextKind::Calibration) || self.in_block(ContextKind::Defcal)
    }

    /// Inside a function or kernel definition
    pub fn in_callable(&self) -> bool {
        self.in_block(ContextKind::Function) || self.in_block(ContextKind::Kernel)
    }

    pub fn set_header(&mut self, header: Option<PendingHeader>) {
        self.header = header;
    }

    pub fn header(&self) -> Option<PendingHeader> {
        self.header
    }

    pub fn open_pragma(&mut self) {
        self.pragma = true;
    }

    pub fn close_pragma(&mut self) {
        self.pragma = false;
    }

    pub fn in_pragma(&self) -> bool {
        self.pragma
    }

    // ==================== Resets ====================

    /// Forget everything seen since the last production, kinds included
    pub fn reset(&mut self) {
        self.reset_keep_kinds();
        self.current = SymbolKind::Undefined;
        self.previous = SymbolKind::Undefined;
    }

    /// Forget delimiters, lists and lookahead but keep inferred kinds
    pub fn reset_keep_kinds(&mut self) {
        self.delimiters = Delimiters::default();
        self.qubit_list = false;
        self.angle_list = false;
        self.lookahead = None;
        self.header = None;
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_shift() {
        let mut state = ParserState::new();
        state.set_current_kind(SymbolKind::Array);
        state.set_current_kind(SymbolKind::Int);

        assert_eq!(state.current_kind(), SymbolKind::Int);
        assert_eq!(state.previous_kind(), SymbolKind::Array);

        state.settle(SymbolKind::IntArray);
        assert_eq!(state.current_kind(), SymbolKind::Undefined);
        assert_eq!(state.previous_kind(), SymbolKind::IntArray);
    }

    #[test]
    fn test_delimiter_flags() {
        let mut state = ParserState::new();
        assert!(!state.seen_lparen());
        state.lparen();
        assert!(state.seen_lparen());
        assert!(!state.parens_matched());
        state.rparen();
        assert!(state.parens_matched());

        state.lbracket();
        state.reset_keep_kinds();
        assert!(!state.seen_lbracket());
    }

    #[test]
    fn test_block_brace_counters() {
        let mut state = ParserState::new();
        state.open_block(ContextKind::If);
        assert!(state.innermost_block().is_some_and(OpenBlock::braces_unseen));

        state.lbrace();
        let block = *state.innermost_block().unwrap();
        assert!(block.braces_open());
        assert!(!block.braces_unseen());

        state.rbrace();
        assert!(!state.innermost_block().unwrap().braces_open());
        assert!(state.close_block(ContextKind::If));
        assert!(!state.close_block(ContextKind::If));
    }

    #[test]
    fn test_calibration_or_defcal() {
        let mut state = ParserState::new();
        assert!(!state.in_calibration_or_defcal());
        state.open_block(ContextKind::Defcal);
        state.open_block(ContextKind::If);
        assert!(state.in_calibration_or_defcal());
        state.close_block(ContextKind::Defcal);
        assert!(!state.in_block(ContextKind::If));
    }

    #[test]
    fn test_reset_clears_kinds_but_not_blocks() {
        let mut state = ParserState::new();
        state.open_block(ContextKind::Gate);
        state.set_current_kind(SymbolKind::Angle);
        state.start_angle_list();
        state.set_lookahead(Some(')'));
        state.reset();

        assert_eq!(state.current_kind(), SymbolKind::Undefined);
        assert!(!state.in_angle_list());
        assert_eq!(state.lookahead(), None);
        assert!(state.in_block(ContextKind::Gate));
    }
}
