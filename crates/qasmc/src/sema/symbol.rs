//! Symbols: named, kinded, scoped bindings
//!
//! A [`Symbol`] is created once and never replaced. Fields that change
//! after creation (kind normalization, width, attached value, the subtable
//! it is filed in) live behind `Cell`s so the table can update them in
//! place while other code holds the symbol's id.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use string_interner::DefaultSymbol;

use super::context::ContextId;
use super::table::Subtable;
use super::value::ValueId;
use crate::common::Span;
use crate::types::SymbolKind;

/// Interned identifier text
pub type Name = DefaultSymbol;

/// Index of a symbol in the table's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    Global,
    Local,
}

impl fmt::Display for SymbolScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolScope::Global => f.write_str("global"),
            SymbolScope::Local => f.write_str("local"),
        }
    }
}

/// Subscript of a reference symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Literal(u32),
    /// An integer-kinded identifier, e.g. a loop variable
    Identifier(String),
    /// Source text of a non-constant index expression
    Expression(String),
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Literal(n) => write!(f, "{}", n),
            IndexKey::Identifier(s) | IndexKey::Expression(s) => f.write_str(s),
        }
    }
}

/// Link from a reference symbol (`x[3]`) to the symbol it views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub base: SymbolId,
    pub index: IndexKey,
}

#[derive(Debug)]
pub struct Symbol {
    name: Name,
    kind: Cell<SymbolKind>,
    bits: Cell<u32>,
    context: Cell<ContextId>,
    scope: Cell<SymbolScope>,
    value: Cell<Option<ValueId>>,
    /// Element count for registers and arrays
    extent: Cell<Option<u32>>,
    builtin: Cell<bool>,
    induction: Cell<bool>,
    home: Cell<Option<Subtable>>,
    predecessor: Option<SymbolId>,
    reference: Option<Reference>,
    references: RefCell<BTreeMap<IndexKey, SymbolId>>,
    span: Span,
}

impl Symbol {
    pub fn new(
        name: Name,
        kind: SymbolKind,
        bits: u32,
        context: ContextId,
        scope: SymbolScope,
    ) -> Self {
        Self {
            name,
            kind: Cell::new(kind),
            bits: Cell::new(bits),
            context: Cell::new(context),
            scope: Cell::new(scope),
            value: Cell::new(None),
            extent: Cell::new(None),
            builtin: Cell::new(false),
            induction: Cell::new(false),
            home: Cell::new(None),
            predecessor: None,
            reference: None,
            references: RefCell::new(BTreeMap::new()),
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Mark this symbol as a redeclaration shadowing `previous`
    pub fn with_predecessor(mut self, previous: SymbolId) -> Self {
        self.predecessor = Some(previous);
        self
    }

    pub fn with_reference(mut self, base: SymbolId, index: IndexKey) -> Self {
        self.reference = Some(Reference { base, index });
        self
    }

    // ==================== Accessors ====================

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind.get()
    }

    pub fn bits(&self) -> u32 {
        self.bits.get()
    }

    pub fn context(&self) -> ContextId {
        self.context.get()
    }

    pub fn scope(&self) -> SymbolScope {
        self.scope.get()
    }

    /// Value stored on this symbol itself. Reference symbols alias their
    /// base's value, see `SymbolTable::value_of`.
    pub fn own_value(&self) -> Option<ValueId> {
        self.value.get()
    }

    pub fn extent(&self) -> Option<u32> {
        self.extent.get()
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.get()
    }

    pub fn is_induction_variable(&self) -> bool {
        self.induction.get()
    }

    /// Subtable the symbol is currently filed in, `None` once erased
    pub fn home(&self) -> Option<Subtable> {
        self.home.get()
    }

    pub fn predecessor(&self) -> Option<SymbolId> {
        self.predecessor
    }

    pub fn is_redeclaration(&self) -> bool {
        self.predecessor.is_some()
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Cached reference symbol for a subscript, if one was created
    pub fn reference_for(&self, index: &IndexKey) -> Option<SymbolId> {
        self.references.borrow().get(index).copied()
    }

    pub fn reference_count(&self) -> usize {
        self.references.borrow().len()
    }

    pub fn references(&self) -> Vec<(IndexKey, SymbolId)> {
        self.references
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    // ==================== In-place updates ====================

    pub(crate) fn set_kind(&self, kind: SymbolKind) {
        self.kind.set(kind);
    }

    pub(crate) fn set_bits(&self, bits: u32) {
        self.bits.set(bits);
    }

    pub(crate) fn set_scope(&self, scope: SymbolScope) {
        self.scope.set(scope);
    }

    pub(crate) fn set_value(&self, value: Option<ValueId>) {
        self.value.set(value);
    }

    pub(crate) fn set_extent(&self, extent: Option<u32>) {
        self.extent.set(extent);
    }

    pub(crate) fn mark_builtin(&self) {
        self.builtin.set(true);
    }

    pub(crate) fn mark_induction_variable(&self) {
        self.induction.set(true);
    }

    pub(crate) fn set_home(&self, home: Option<Subtable>) {
        self.home.set(home);
    }

    pub(crate) fn add_reference(&self, index: IndexKey, id: SymbolId) {
        self.references.borrow_mut().insert(index, id);
    }

    pub(crate) fn remove_reference(&self, index: &IndexKey) {
        self.references.borrow_mut().remove(index);
    }
}
