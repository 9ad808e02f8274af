//! Declaration context tree
//!
//! Every lexical block (global, gate body, `if` branch, calibration block,
//! and so on) gets a [`DeclarationContext`]. Contexts are numbered in
//! creation order, keep a back-reference to their parent, and are marked
//! dead when the block closes. They are never freed during a compilation
//! unit, so a stale symbol can always report where it came from.
//!
//! The tree also tracks the stack of currently open contexts. The global
//! context is always at the bottom of that stack.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::symbol::SymbolScope;

/// Creation index of a declaration context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

impl ContextId {
    pub const GLOBAL: ContextId = ContextId(0);
    /// The single shared context for `cal` blocks
    pub const CALIBRATION: ContextId = ContextId(u32::MAX);

    pub fn index(self) -> u32 {
        self.0
    }

    /// Id for the context at arena slot `index`. The slot that would alias
    /// the calibration context and anything past it have no id.
    pub fn from_index(index: usize) -> Option<ContextId> {
        u32::try_from(index)
            .ok()
            .filter(|ix| *ix < ContextId::CALIBRATION.0)
            .map(ContextId)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ContextId::GLOBAL => f.write_str("global"),
            ContextId::CALIBRATION => f.write_str("calibration"),
            ContextId(ix) => write!(f, "#{}", ix),
        }
    }
}

/// Kind of block a context was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Global,
    Function,
    Kernel,
    Gate,
    Defcal,
    Calibration,
    If,
    ElseIf,
    Else,
    While,
    DoWhile,
    For,
    Switch,
    Box,
    Other,
}

impl ContextKind {
    /// Control-flow blocks whose header may contain a condition
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            ContextKind::If
                | ContextKind::ElseIf
                | ContextKind::Else
                | ContextKind::While
                | ContextKind::Switch
        )
    }

    /// Blocks in which a nested declaration may shadow an outer one
    pub fn admits_redeclaration(self) -> bool {
        matches!(
            self,
            ContextKind::If
                | ContextKind::ElseIf
                | ContextKind::Else
                | ContextKind::While
                | ContextKind::For
                | ContextKind::Gate
                | ContextKind::Defcal
                | ContextKind::Function
        )
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContextKind::Global => "global",
            ContextKind::Function => "function",
            ContextKind::Kernel => "kernel",
            ContextKind::Gate => "gate",
            ContextKind::Defcal => "defcal",
            ContextKind::Calibration => "calibration",
            ContextKind::If => "if",
            ContextKind::ElseIf => "else if",
            ContextKind::Else => "else",
            ContextKind::While => "while",
            ContextKind::DoWhile => "do while",
            ContextKind::For => "for",
            ContextKind::Switch => "switch",
            ContextKind::Box => "box",
            ContextKind::Other => "block",
        };
        f.write_str(s)
    }
}

/// One lexical scope marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationContext {
    pub id: ContextId,
    pub kind: ContextKind,
    pub parent: Option<ContextId>,
    alive: bool,
}

impl DeclarationContext {
    fn new(id: ContextId, kind: ContextKind, parent: Option<ContextId>) -> Self {
        Self {
            id,
            kind,
            parent,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Precondition violations on the context tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("declaration context {0} is already dead")]
    AlreadyDead(ContextId),

    #[error("unknown declaration context {0}")]
    Unknown(ContextId),

    #[error("declaration context {0} cannot be closed")]
    Permanent(ContextId),

    #[error("no declaration context id left after {0} contexts")]
    Exhausted(usize),
}

/// Arena of declaration contexts plus the open-context stack
#[derive(Debug, Clone)]
pub struct ContextTree {
    contexts: Vec<DeclarationContext>,
    calibration: DeclarationContext,
    open: Vec<ContextId>,
}

impl ContextTree {
    pub fn new() -> Self {
        Self {
            contexts: vec![DeclarationContext::new(
                ContextId::GLOBAL,
                ContextKind::Global,
                None,
            )],
            calibration: DeclarationContext::new(
                ContextId::CALIBRATION,
                ContextKind::Calibration,
                Some(ContextId::GLOBAL),
            ),
            open: vec![ContextId::GLOBAL],
        }
    }

    pub fn get(&self, id: ContextId) -> Option<&DeclarationContext> {
        if id == ContextId::CALIBRATION {
            Some(&self.calibration)
        } else {
            self.contexts.get(id.0 as usize)
        }
    }

    /// Innermost open context
    pub fn current(&self) -> ContextId {
        self.open.last().copied().unwrap_or(ContextId::GLOBAL)
    }

    pub fn global(&self) -> ContextId {
        ContextId::GLOBAL
    }

    pub fn calibration(&self) -> ContextId {
        ContextId::CALIBRATION
    }

    /// Number of contexts created so far, excluding the calibration context
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Open a new context as a child of the current one
    pub fn open_scope(&mut self, kind: ContextKind) -> Result<ContextId, ContextError> {
        let parent = self.current();
        let id = ContextId::from_index(self.contexts.len())
            .ok_or(ContextError::Exhausted(self.contexts.len()))?;
        self.contexts
            .push(DeclarationContext::new(id, kind, Some(parent)));
        self.open.push(id);
        debug!(context = %id, %kind, parent = %parent, "open scope");
        Ok(id)
    }

    /// Make the shared calibration context current
    pub fn enter_calibration(&mut self) -> ContextId {
        self.open.push(ContextId::CALIBRATION);
        debug!("enter calibration context");
        ContextId::CALIBRATION
    }

    /// Mark a context dead and remove it from the open stack.
    ///
    /// Contexts opened inside it that are still on the stack are closed
    /// with it. Returns the contexts that died, innermost first. The
    /// calibration context is popped but never dies.
    pub fn close_scope(&mut self, id: ContextId) -> Result<Vec<ContextId>, ContextError> {
        if id == ContextId::GLOBAL {
            return Err(ContextError::Permanent(id));
        }
        if id == ContextId::CALIBRATION {
            if let Some(pos) = self.open.iter().rposition(|c| *c == id) {
                self.open.truncate(pos);
            }
            debug!("leave calibration context");
            return Ok(Vec::new());
        }

        let ctx = self.contexts.get(id.0 as usize).ok_or(ContextError::Unknown(id))?;
        if !ctx.alive {
            return Err(ContextError::AlreadyDead(id));
        }

        let closed: Vec<ContextId> = match self.open.iter().rposition(|c| *c == id) {
            Some(pos) => self.open.drain(pos..).rev().collect(),
            None => vec![id],
        };
        let closed: Vec<ContextId> = closed.into_iter().filter(|c| self.kill(*c)).collect();
        debug!(context = %id, count = closed.len(), "close scope");
        Ok(closed)
    }

    fn kill(&mut self, id: ContextId) -> bool {
        if id == ContextId::CALIBRATION || id == ContextId::GLOBAL {
            return false;
        }
        match self.contexts.get_mut(id.0 as usize) {
            Some(ctx) if ctx.alive => {
                ctx.alive = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_alive(&self, id: ContextId) -> bool {
        self.get(id).is_some_and(DeclarationContext::is_alive)
    }

    pub fn is_global(&self, id: ContextId) -> bool {
        id == ContextId::GLOBAL
    }

    pub fn in_calibration(&self) -> bool {
        self.current() == ContextId::CALIBRATION
    }

    pub fn parent(&self, id: ContextId) -> Option<ContextId> {
        self.get(id).and_then(|c| c.parent)
    }

    pub fn kind(&self, id: ContextId) -> Option<ContextKind> {
        self.get(id).map(|c| c.kind)
    }

    /// Walk from `id` up to the global context, `id` first
    pub fn ancestors(&self, id: ContextId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).map(|c| c.id),
        }
    }

    /// True if `ancestor` is `id` itself or one of its parents
    pub fn is_ancestor_or_self(&self, ancestor: ContextId, id: ContextId) -> bool {
        self.ancestors(id).any(|c| c == ancestor)
    }

    /// Number of parent links between `id` and `ancestor`
    pub fn distance(&self, ancestor: ContextId, id: ContextId) -> Option<usize> {
        self.ancestors(id).position(|c| c == ancestor)
    }

    /// Scope class a symbol declared in `id` gets
    pub fn scope_of(&self, id: ContextId) -> SymbolScope {
        if self.is_global(id) {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        }
    }

    /// Innermost open context of the given kind
    pub fn innermost(&self, kind: ContextKind) -> Option<ContextId> {
        self.open
            .iter()
            .rev()
            .copied()
            .find(|id| self.kind(*id) == Some(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclarationContext> {
        self.contexts.iter().chain(std::iter::once(&self.calibration))
    }
}

impl Default for ContextTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a context and its parents
pub struct Ancestors<'a> {
    tree: &'a ContextTree,
    next: Option<ContextId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ContextId;

    fn next(&mut self) -> Option<ContextId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_global_is_root() {
        let tree = ContextTree::new();
        assert_eq!(tree.current(), ContextId::GLOBAL);
        assert!(tree.is_global(tree.current()));
        assert_eq!(tree.parent(ContextId::GLOBAL), None);
        assert_eq!(tree.parent(ContextId::CALIBRATION), Some(ContextId::GLOBAL));
    }

    #[test]
    fn test_open_assigns_increasing_indices() {
        let mut tree = ContextTree::new();
        let gate = tree.open_scope(ContextKind::Gate).unwrap();
        let inner = tree.open_scope(ContextKind::If).unwrap();

        assert_eq!(gate.index(), 1);
        assert_eq!(inner.index(), 2);
        assert_eq!(tree.current(), inner);
        assert_eq!(tree.parent(inner), Some(gate));
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_close_marks_dead_but_keeps_context() {
        let mut tree = ContextTree::new();
        let block = tree.open_scope(ContextKind::While).unwrap();
        tree.close_scope(block).unwrap();

        assert!(!tree.is_alive(block));
        assert_eq!(tree.kind(block), Some(ContextKind::While));
        assert_eq!(tree.current(), ContextId::GLOBAL);
    }

    #[test]
    fn test_double_close_is_error() {
        let mut tree = ContextTree::new();
        let block = tree.open_scope(ContextKind::If).unwrap();
        tree.close_scope(block).unwrap();

        assert_eq!(tree.close_scope(block), Err(ContextError::AlreadyDead(block)));
        assert_eq!(
            tree.close_scope(ContextId::GLOBAL),
            Err(ContextError::Permanent(ContextId::GLOBAL))
        );
    }

    #[test]
    fn test_closing_outer_closes_nested() {
        let mut tree = ContextTree::new();
        let func = tree.open_scope(ContextKind::Function).unwrap();
        let inner = tree.open_scope(ContextKind::For).unwrap();
        tree.close_scope(func).unwrap();

        assert!(!tree.is_alive(func));
        assert!(!tree.is_alive(inner));
        assert_eq!(tree.current(), ContextId::GLOBAL);
    }

    #[test]
    fn test_ancestry() {
        let mut tree = ContextTree::new();
        let a = tree.open_scope(ContextKind::Function).unwrap();
        let b = tree.open_scope(ContextKind::If).unwrap();
        tree.close_scope(b).unwrap();
        let c = tree.open_scope(ContextKind::Else).unwrap();

        assert!(tree.is_ancestor_or_self(a, c));
        assert!(tree.is_ancestor_or_self(c, c));
        assert!(tree.is_ancestor_or_self(ContextId::GLOBAL, c));
        assert!(!tree.is_ancestor_or_self(b, c));
        assert_eq!(tree.distance(ContextId::GLOBAL, c), Some(2));
        assert_eq!(tree.ancestors(c).collect::<Vec<_>>(), vec![c, a, ContextId::GLOBAL]);
    }

    #[test]
    fn test_calibration_never_dies() {
        let mut tree = ContextTree::new();
        tree.enter_calibration();
        assert!(tree.in_calibration());
        tree.close_scope(ContextId::CALIBRATION).unwrap();

        assert!(!tree.in_calibration());
        assert!(tree.is_alive(ContextId::CALIBRATION));
        assert_eq!(tree.scope_of(ContextId::CALIBRATION), SymbolScope::Local);
    }

    #[test]
    fn test_innermost_of_kind() {
        let mut tree = ContextTree::new();
        let gate = tree.open_scope(ContextKind::Gate).unwrap();
        tree.open_scope(ContextKind::If).unwrap();

        assert_eq!(tree.innermost(ContextKind::Gate), Some(gate));
        assert_eq!(tree.innermost(ContextKind::Defcal), None);
    }

    #[test]
    fn test_context_ids_stop_before_calibration() {
        assert_eq!(ContextId::from_index(0), Some(ContextId::GLOBAL));
        assert_eq!(ContextId::from_index(7).map(ContextId::index), Some(7));
        assert_eq!(
            ContextId::from_index(u32::MAX as usize - 1).map(ContextId::index),
            Some(u32::MAX - 1)
        );
        assert_eq!(ContextId::from_index(u32::MAX as usize), None);
        assert_eq!(ContextId::from_index(usize::MAX), None);
    }

    #[test]
    fn test_close_reports_contexts_that_died() {
        let mut tree = ContextTree::new();
        let func = tree.open_scope(ContextKind::Function).unwrap();
        let first = tree.open_scope(ContextKind::If).unwrap();
        tree.close_scope(first).unwrap();
        let second = tree.open_scope(ContextKind::For).unwrap();
        let inner = tree.open_scope(ContextKind::While).unwrap();

        // `first` was already closed and is not reported again
        assert_eq!(tree.close_scope(func).unwrap(), vec![inner, second, func]);
        tree.enter_calibration();
        assert!(tree.close_scope(ContextId::CALIBRATION).unwrap().is_empty());
    }
}
