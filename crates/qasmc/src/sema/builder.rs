//! Identifier builder
//!
//! Allocates symbols, files them in the subtable their kind belongs to and
//! asks the node factory for the value each new binding carries. Reference
//! symbols (`q[1]`, `theta[2]`) are created on first use and cached on
//! their base, so later accesses get the same id back.

use tracing::debug;

use super::context::{ContextId, ContextTree};
use super::symbol::{IndexKey, Symbol, SymbolId, SymbolScope};
use super::table::{Subtable, SymbolTable, TableError};
use super::value::{Literal, NodeFactory, NodeRequest};
use crate::common::Span;
use crate::types::width::ANGLE_COMPONENTS;
use crate::types::SymbolKind;

pub struct IdentifierBuilder<'a> {
    table: &'a mut SymbolTable,
    tree: &'a ContextTree,
    nodes: &'a mut dyn NodeFactory,
}

impl<'a> IdentifierBuilder<'a> {
    pub fn new(
        table: &'a mut SymbolTable,
        tree: &'a ContextTree,
        nodes: &'a mut dyn NodeFactory,
    ) -> Self {
        Self { table, tree, nodes }
    }

    /// Create a binding owned by `context` and file it where its kind goes
    pub fn create(
        &mut self,
        name: &str,
        kind: SymbolKind,
        bits: u32,
        context: ContextId,
        span: Span,
    ) -> Result<SymbolId, TableError> {
        let scope = self.tree.scope_of(context);
        let subtable = Subtable::for_kind(kind, context, scope);
        self.create_in(name, kind, bits, context, subtable, span)
    }

    /// Create a binding in an explicit subtable
    pub fn create_in(
        &mut self,
        name: &str,
        kind: SymbolKind,
        bits: u32,
        context: ContextId,
        subtable: Subtable,
        span: Span,
    ) -> Result<SymbolId, TableError> {
        let scope = self.tree.scope_of(context);
        let name = self.table.intern(name);
        let symbol = Symbol::new(name, kind, bits, context, scope).with_span(span);
        self.file(symbol, subtable, None)
    }

    /// Create a global, non-reclaimable binding: builtins, gates, defcals,
    /// callables and constants
    pub fn create_global(
        &mut self,
        name: &str,
        kind: SymbolKind,
        bits: u32,
        literal: Option<Literal>,
        span: Span,
    ) -> Result<SymbolId, TableError> {
        let name = self.table.intern(name);
        let symbol = Symbol::new(name, kind, bits, ContextId::GLOBAL, SymbolScope::Global)
            .with_span(span);
        symbol.mark_builtin();
        let subtable = Subtable::for_kind(kind, ContextId::GLOBAL, SymbolScope::Global);
        self.file(symbol, subtable, literal)
    }

    /// Create a new binding that shadows `previous`. The old symbol is left
    /// untouched.
    pub fn create_redeclaration(
        &mut self,
        previous: SymbolId,
        kind: SymbolKind,
        bits: u32,
        context: ContextId,
        span: Span,
    ) -> Result<SymbolId, TableError> {
        let name = self.table[previous].name();
        let scope = self.tree.scope_of(context);
        let symbol = Symbol::new(name, kind, bits, context, scope)
            .with_predecessor(previous)
            .with_span(span);
        let subtable = Subtable::for_kind(kind, context, scope);
        let id = self.file(symbol, subtable, None)?;
        debug!(symbol = %id, shadows = %previous, context = %context, "redeclare");
        Ok(id)
    }

    fn file(
        &mut self,
        symbol: Symbol,
        subtable: Subtable,
        literal: Option<Literal>,
    ) -> Result<SymbolId, TableError> {
        let kind = symbol.kind();
        let span = symbol.span();
        let id = self.table.add(symbol, subtable)?;
        self.attach(id, literal);
        if kind == SymbolKind::Angle {
            self.create_angle_components(id, span)?;
        }
        Ok(id)
    }

    fn attach(&mut self, id: SymbolId, literal: Option<Literal>) {
        let sym = &self.table[id];
        let request = NodeRequest {
            name: self.table.name_of(id),
            kind: sym.kind(),
            bits: sym.bits(),
            literal,
        };
        if let Some(value) = self.nodes.create(&request) {
            self.table.set_value(id, value);
        }
    }

    /// Reference symbol for `base[index]`, created on first access.
    ///
    /// The reference is owned by the base's context and shares the base's
    /// value. Angle components go to the angle subtable, everything else to
    /// the catch-all one.
    pub fn create_reference(
        &mut self,
        base: SymbolId,
        index: IndexKey,
        kind: SymbolKind,
        bits: u32,
        span: Span,
    ) -> Result<SymbolId, TableError> {
        if let Some(cached) = self.table[base].reference_for(&index) {
            return Ok(cached);
        }
        let indexed = self.table.indexed_name(base, &index);
        let name = self.table.intern(&indexed);
        let owner = &self.table[base];
        let subtable = if owner.kind() == SymbolKind::Angle {
            Subtable::Angle
        } else {
            Subtable::Generic
        };
        let symbol = Symbol::new(name, kind, bits, owner.context(), owner.scope())
            .with_reference(base, index)
            .with_span(span);
        self.table.add(symbol, subtable)
    }

    /// The four addressable components `name[0]`..`name[3]` of an angle
    pub fn create_angle_components(
        &mut self,
        angle: SymbolId,
        span: Span,
    ) -> Result<Vec<SymbolId>, TableError> {
        let bits = self.table[angle].bits() / ANGLE_COMPONENTS;
        (0..ANGLE_COMPONENTS)
            .map(|ix| {
                self.create_reference(angle, IndexKey::Literal(ix), SymbolKind::Angle, bits, span)
            })
            .collect()
    }

    /// Owning group of every defcal spelled `name`
    pub fn ensure_defcal_group(&mut self, name: &str, span: Span) -> Result<SymbolId, TableError> {
        if let Some(group) = self.table.lookup_in(name, Subtable::DefcalGroup) {
            return Ok(group);
        }
        let group = self.create_global(
            name,
            SymbolKind::DefcalGroup,
            SymbolKind::DefcalGroup.default_bits(),
            None,
            span,
        )?;
        debug!(symbol = %group, name, "defcal group");
        Ok(group)
    }

    /// A defcal overload, recorded as a member of its group
    pub fn create_defcal(
        &mut self,
        name: &str,
        kind: SymbolKind,
        bits: u32,
        span: Span,
    ) -> Result<SymbolId, TableError> {
        let group = self.ensure_defcal_group(name, span)?;
        let id = self.create_global(name, kind, bits, None, span)?;
        self.table.add_group_member(group, id);
        Ok(id)
    }

    /// Create every element reference of an array of known length
    pub fn materialize_array(
        &mut self,
        base: SymbolId,
        len: u32,
        span: Span,
    ) -> Result<Vec<SymbolId>, TableError> {
        let Some(element) = self.table[base].kind().element_kind() else {
            return Ok(Vec::new());
        };
        self.table[base].set_extent(Some(len));
        let elements = (0..len)
            .map(|ix| {
                self.create_reference(
                    base,
                    IndexKey::Literal(ix),
                    element,
                    element.default_bits(),
                    span,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(symbol = %base, len, element = %element, "materialize array");
        Ok(elements)
    }
}
