//! Compilation session
//!
//! [`Session`] owns every piece of engine state for one compilation unit:
//! the context tree, the symbol table, the parser-state snapshot, the
//! diagnostic sink and the node factory. The grammar driver holds one
//! session and calls into it for every name it scans.

use std::fmt::Write as _;

use tracing::{debug, warn};

use super::builder::IdentifierBuilder;
use super::context::{ContextId, ContextKind, ContextTree};
use super::reserved;
use super::scope::ScopeController;
use super::state::ParserState;
use super::symbol::SymbolId;
use super::table::{Subtable, SymbolTable, TableError};
use super::value::{Literal, NodeFactory, OpaqueNodes, ValueId};
use crate::common::{
    CompileError, CompileResult, Diagnostic, DiagnosticCode, Diagnostics, Span, DEFAULT_MAX_ERRORS,
};
use crate::types::width;
use crate::types::SymbolKind;

/// Engine-wide policy knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Nested blocks may shadow outer bindings
    pub allow_redeclaration: bool,
    pub max_errors: u32,
    /// Resolve `h`, `cx`, `ccx`, `cnot` and `u` as builtin gates
    pub openqasm2_gates: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allow_redeclaration: true,
            max_errors: DEFAULT_MAX_ERRORS,
            openqasm2_gates: false,
        }
    }
}

pub struct Session {
    pub(super) config: SessionConfig,
    pub(super) contexts: ContextTree,
    pub(super) table: SymbolTable,
    pub(super) state: ParserState,
    pub(super) diagnostics: Diagnostics,
    pub(super) nodes: Box<dyn NodeFactory>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_factory(config, Box::new(OpaqueNodes::new()))
    }

    /// Session whose bindings get their values from `nodes`
    pub fn with_factory(config: SessionConfig, nodes: Box<dyn NodeFactory>) -> Self {
        let diagnostics = Diagnostics::new(config.max_errors);
        let mut session = Self {
            config,
            contexts: ContextTree::new(),
            table: SymbolTable::new(),
            state: ParserState::new(),
            diagnostics,
            nodes,
        };
        if let Err(err) = session.install_builtins() {
            warn!(error = %err, "builtin installation incomplete");
        }
        session
    }

    fn install_builtins(&mut self) -> CompileResult<()> {
        for name in reserved::RESERVED_CONSTANTS {
            let literal = reserved::constant_value(name).map(Literal::Float);
            self.build(Span::default(), |b| {
                b.create_global(name, SymbolKind::Angle, width::ANGLE_BITS, literal, Span::default())
            })?;
        }
        for name in reserved::BUILTIN_GATES {
            self.build(Span::default(), |b| {
                b.create_global(name, SymbolKind::UGate, width::GATE_BITS, None, Span::default())
            })?;
        }
        debug!(symbols = self.table.len(), "builtins installed");
        Ok(())
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn contexts(&self) -> &ContextTree {
        &self.contexts
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ParserState {
        &mut self.state
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    pub fn scope(&self) -> ScopeController<'_> {
        ScopeController::new(
            &self.contexts,
            &self.table,
            &self.state,
            self.config.allow_redeclaration,
        )
    }

    // ==================== Internals shared with discovery ====================

    /// Run a builder operation. Duplicates become a user diagnostic and
    /// yield the existing binding; any other table failure is an ICE.
    pub(super) fn build(
        &mut self,
        span: Span,
        f: impl FnOnce(&mut IdentifierBuilder<'_>) -> Result<SymbolId, TableError>,
    ) -> CompileResult<SymbolId> {
        let result = {
            let mut builder =
                IdentifierBuilder::new(&mut self.table, &self.contexts, &mut *self.nodes);
            f(&mut builder)
        };
        match result {
            Ok(id) => Ok(id),
            Err(TableError::Duplicate { name, existing }) => {
                self.report(Diagnostic::error(
                    DiagnosticCode::DuplicateDeclaration,
                    format!("'{}' is already declared in this scope", name),
                    span,
                ));
                Ok(existing)
            }
            Err(err) => Err(self.ice(err.to_string(), span)),
        }
    }

    /// Record an internal invariant violation and hand back the error the
    /// caller must propagate
    pub(super) fn ice(&mut self, message: impl Into<String>, span: Span) -> CompileError {
        let message = message.into();
        warn!(%span, %message, "internal invariant violated");
        self.diagnostics.emit(Diagnostic::internal(message.clone(), span));
        CompileError::internal(message, span)
    }

    pub(super) fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.emit(diagnostic);
    }

    fn report_check(&mut self, result: Result<(), Diagnostic>) -> bool {
        match result {
            Ok(()) => true,
            Err(diagnostic) => {
                self.report(diagnostic);
                false
            }
        }
    }

    pub(super) fn calibration_open(&self) -> bool {
        self.scope().calibration_open()
    }

    /// Subtable search order for the current parser state
    pub(super) fn lookup_order(&self) -> Vec<Subtable> {
        let state = &self.state;
        let preferred: &[Subtable] = if state.in_qubit_list()
            && (state.in_block(ContextKind::Gate) || state.in_block(ContextKind::Defcal))
        {
            &[Subtable::GateParam, Subtable::Qubit]
        } else if state.in_angle_list() {
            &[Subtable::Angle, Subtable::Local]
        } else if self.calibration_open() {
            &[Subtable::Calibration, Subtable::Local, Subtable::GateParam]
        } else if state.current_kind().is_gate() {
            &[Subtable::Gate]
        } else {
            &[]
        };
        let mut order = preferred.to_vec();
        order.extend(
            Subtable::DEFAULT_ORDER
                .iter()
                .copied()
                .filter(|t| !preferred.contains(t)),
        );
        order
    }

    /// Best visible binding of `name`, without creating anything
    pub(super) fn visible_binding(&self, name: &str) -> Option<SymbolId> {
        let candidates = self.table.lookup_range_ordered(name, &self.lookup_order());
        let selection = self
            .table
            .select(&candidates, &self.contexts, self.calibration_open())?;
        self.scope()
            .is_visible(selection.symbol)
            .then_some(selection.symbol)
    }

    /// Undefined placeholder for `name` in the current context, reusing one
    /// made earlier
    pub(super) fn placeholder(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        let context = self.contexts.current();
        let existing = self
            .table
            .lookup_range_ordered(name, &[Subtable::Undefined])
            .into_iter()
            .find(|id| self.table[*id].context() == context);
        if let Some(id) = existing {
            return Ok(id);
        }
        self.build(span, |b| {
            b.create(name, SymbolKind::Undefined, width::UNKNOWN_BITS, context, span)
        })
    }

    fn warn_if_pointless(&mut self, id: SymbolId, span: Span) {
        if self.scope().is_pointless_redeclaration() {
            let message = format!(
                "re-declaration of '{}' in a block without braces has no effect",
                self.table.name_of(id)
            );
            self.report(Diagnostic::warning(
                DiagnosticCode::PointlessRedeclaration,
                message,
                span,
            ));
        }
    }

    /// Shadow `previous` with a fresh binding in the current context
    pub(super) fn redeclare(
        &mut self,
        previous: SymbolId,
        kind: SymbolKind,
        bits: u32,
        span: Span,
    ) -> CompileResult<SymbolId> {
        let context = self.contexts.current();
        let id = self.build(span, |b| b.create_redeclaration(previous, kind, bits, context, span))?;
        self.warn_if_pointless(id, span);
        Ok(id)
    }

    // ==================== Scopes ====================

    pub fn open_scope(&mut self, kind: ContextKind) -> CompileResult<ContextId> {
        let id = match self.contexts.open_scope(kind) {
            Ok(id) => id,
            Err(err) => return Err(self.ice(err.to_string(), Span::default())),
        };
        self.state.open_block(kind);
        Ok(id)
    }

    /// Close a context and release every binding it owned that nothing
    /// live still refers to
    pub fn close_scope(&mut self, id: ContextId) -> CompileResult<()> {
        let kind = self.contexts.kind(id);
        let closed = match self.contexts.close_scope(id) {
            Ok(closed) => closed,
            Err(err) => return Err(self.ice(err.to_string(), Span::default())),
        };
        for context in closed {
            self.table.release_context(context, &self.contexts);
        }
        if let Some(kind) = kind {
            self.state.close_block(kind);
        }
        Ok(())
    }

    pub fn enter_calibration(&mut self) -> ContextId {
        self.state.open_block(ContextKind::Calibration);
        self.contexts.enter_calibration()
    }

    pub fn leave_calibration(&mut self) -> CompileResult<()> {
        self.close_scope(ContextId::CALIBRATION)
    }

    // ==================== Explicit declarations ====================

    /// Declare `name` with a known kind, bypassing inference.
    ///
    /// A second declaration of the name in `context` is a duplicate; an
    /// undefined placeholder there is upgraded in place instead. A binding
    /// in an enclosing context is shadowed when the redeclaration policy
    /// allows it, or when the name is a gate header parameter.
    pub fn declare_local(
        &mut self,
        name: &str,
        bits: u32,
        kind: SymbolKind,
        context: ContextId,
        span: Span,
    ) -> CompileResult<SymbolId> {
        if kind.is_defcal() {
            return self.build(span, |b| b.create_defcal(name, kind, bits, span));
        }

        let same_context = self
            .table
            .lookup_range(name)
            .into_iter()
            .find(|id| !self.table[*id].is_reference() && self.table[*id].context() == context);
        if let Some(existing) = same_context {
            if self.table[existing].kind() == SymbolKind::Undefined {
                self.normalize(existing, kind, bits, span)?;
                return Ok(existing);
            }
            let kind_name = self.table[existing].kind();
            self.report(Diagnostic::error(
                DiagnosticCode::DuplicateDeclaration,
                format!("'{}' is already declared in this scope as {}", name, kind_name),
                span,
            ));
            return Ok(existing);
        }

        let id = if kind.is_gate() || kind.is_callable() {
            if let Some(previous) = self.table.lookup_in(name, Subtable::Gate) {
                self.report(Diagnostic::error(
                    DiagnosticCode::ShadowedDeclaration,
                    format!("re-declaration of gate '{}' shadows a previous declaration", name),
                    span,
                ));
                return Ok(previous);
            }
            let kind = if kind == SymbolKind::Extern { SymbolKind::Kernel } else { kind };
            self.build(span, |b| b.create_global(name, kind, bits, None, span))?
        } else if let Some(outer) = self.shadow_target(name, kind, context) {
            self.redeclare(outer, kind, bits, span)?
        } else if let Some(outer) = self.blocked_shadow(name, context) {
            let outer_kind = self.table[outer].kind();
            self.report(Diagnostic::error(
                DiagnosticCode::ShadowedDeclaration,
                format!(
                    "declaration of '{}' shadows a previous declaration of type {}",
                    name, outer_kind
                ),
                span,
            ));
            return Ok(outer);
        } else {
            self.build(span, |b| b.create(name, kind, bits, context, span))?
        };

        if (kind.is_qubit() || kind == SymbolKind::Bitset) && !width::is_unknown(bits) {
            self.table[id].set_extent(Some(bits));
        }
        if kind.is_array() && !width::is_unknown(bits) {
            self.build(span, |b| b.materialize_array(id, bits, span).map(|_| id))?;
        }
        Ok(id)
    }

    /// Outer binding a declaration in `context` shadows. Parameters in a
    /// gate, defcal or callable header always shadow; anything else goes
    /// through the redeclaration policy.
    fn shadow_target(&self, name: &str, kind: SymbolKind, context: ContextId) -> Option<SymbolId> {
        if context == ContextId::GLOBAL {
            return None;
        }
        let scope = self.scope();
        if self.in_definition_header() || scope.can_redeclare(name, kind, context) {
            return scope.outer_binding(name);
        }
        None
    }

    /// Outer binding a declaration in `context` would illegally shadow
    fn blocked_shadow(&self, name: &str, context: ContextId) -> Option<SymbolId> {
        if context == ContextId::GLOBAL {
            return None;
        }
        self.scope()
            .outer_binding(name)
            .filter(|outer| !self.table[*outer].is_builtin())
    }

    /// Reading the parameter lists of a gate, defcal or callable: the
    /// definition block is open but its body brace is not
    pub(super) fn in_definition_header(&self) -> bool {
        self.state.innermost_block().is_some_and(|block| {
            block.braces_unseen()
                && matches!(
                    block.kind,
                    ContextKind::Gate
                        | ContextKind::Defcal
                        | ContextKind::Function
                        | ContextKind::Kernel
                )
        })
    }

    /// Re-type an existing binding in place and move it to the subtable its
    /// new kind belongs to
    pub(super) fn normalize(
        &mut self,
        id: SymbolId,
        kind: SymbolKind,
        bits: u32,
        span: Span,
    ) -> CompileResult<()> {
        let sym = &self.table[id];
        let from = sym.kind();
        if from != kind {
            sym.set_kind(kind);
        }
        if width::is_unknown(sym.bits()) || from != kind {
            let bits = if width::is_unknown(bits) { kind.default_bits() } else { bits };
            sym.set_bits(bits);
        }
        let target = Subtable::for_kind(kind, sym.context(), sym.scope());
        debug!(symbol = %id, from = %from, to = %kind, "normalize kind");
        if let Err(err) = self.table.transfer(id, target) {
            return Err(self.ice(err.to_string(), span));
        }
        if from == SymbolKind::Undefined && kind == SymbolKind::Angle {
            self.build(span, |b| b.create_angle_components(id, span).map(|_| id))?;
        }
        Ok(())
    }

    // ==================== Checks ====================

    /// Error if `id` never resolved to a concrete kind
    pub fn check_undefined(&mut self, id: SymbolId, span: Span) -> bool {
        let result = self.scope().check_undefined(id, span);
        self.report_check(result)
    }

    pub fn check_out_of_scope(&mut self, id: SymbolId, span: Span) -> bool {
        let result = self.scope().check_out_of_scope(id, span);
        self.report_check(result)
    }

    pub fn check_declaration(&mut self, id: SymbolId, span: Span) -> bool {
        let result = self.scope().check_declaration(id, span);
        self.report_check(result)
    }

    pub fn check_reserved_suffix(&mut self, id: SymbolId, suffix: &str, span: Span) -> bool {
        let result = self.scope().check_reserved_suffix(id, suffix, span);
        self.report_check(result)
    }

    // ==================== Table passthroughs ====================

    /// Attach a value; through a reference this updates the base
    pub fn attach_value(&mut self, id: SymbolId, value: ValueId) {
        self.table.set_value(id, value);
    }

    pub fn value_of(&self, id: SymbolId) -> Option<ValueId> {
        self.table.value_of(id)
    }

    /// Exact match on name, width and kind among the bindings visible
    /// from the current context
    pub fn lookup(&self, name: &str, bits: u32, kind: SymbolKind) -> Option<SymbolId> {
        let scope = self.scope();
        let visible: Vec<SymbolId> = self
            .table
            .lookup_exact(name, bits, kind)
            .into_iter()
            .filter(|id| scope.is_visible(*id))
            .collect();
        self.table
            .select(&visible, &self.contexts, self.calibration_open())
            .map(|selection| selection.symbol)
    }

    pub fn lookup_any(&self, name: &str) -> Option<SymbolId> {
        self.table.lookup_any(name)
    }

    pub fn lookup_range(&self, name: &str) -> Vec<SymbolId> {
        self.table.lookup_range(name)
    }

    pub fn transfer(&mut self, id: SymbolId, to: Subtable) -> CompileResult<()> {
        let span = self.table[id].span();
        match self.table.transfer(id, to) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.ice(err.to_string(), span)),
        }
    }

    pub fn erase_local(
        &mut self,
        name: &str,
        bits: u32,
        kind: SymbolKind,
    ) -> Result<Option<SymbolId>, TableError> {
        self.table.erase_local(name, bits, kind, &self.contexts)
    }

    // ==================== Dumps ====================

    pub fn dump_symbols(&self) -> String {
        self.table.dump()
    }

    pub fn dump_contexts(&self) -> String {
        let mut out = String::new();
        for ctx in self.contexts.iter() {
            let parent = ctx.parent.map_or_else(|| "-".to_string(), |p| p.to_string());
            let state = if ctx.is_alive() { "alive" } else { "dead" };
            let _ = writeln!(
                out,
                "{:>12} {:<10} parent={:<12} {}",
                ctx.id.to_string(),
                ctx.kind.to_string(),
                parent,
                state
            );
        }
        out
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::index::IndexExpr;
    use crate::sema::symbol::SymbolScope;
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::new(0, 1)
    }

    #[test]
    fn test_register_element_is_typed_reference() {
        let mut s = Session::default();
        let q = s
            .declare_local("q", 3, SymbolKind::QubitContainer, ContextId::GLOBAL, span())
            .unwrap();
        let q1 = s
            .resolve_indexed_identifier(span(), "q", &IndexExpr::Literal(1))
            .unwrap();

        assert_eq!(s.table()[q].extent(), Some(3));
        assert_eq!(s.table()[q1].kind(), SymbolKind::Qubit);
        assert_eq!(s.table()[q1].bits(), 1);
        assert_eq!(s.table().base_of(q1), q);
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_gate_angle_parameter_stays_local() {
        let mut s = Session::default();
        let gate = s.open_scope(ContextKind::Gate).unwrap();
        s.state_mut().lparen();
        s.state_mut().start_angle_list();
        s.state_mut().set_lookahead(Some(')'));
        let theta = s.resolve_identifier(span(), "theta").unwrap();

        let sym = &s.table()[theta];
        assert_eq!(sym.kind(), SymbolKind::Angle);
        assert_eq!(sym.context(), gate);
        assert!(s.table().is_filed_in(theta, Subtable::Local));
        assert!(!s.table().is_filed_in(theta, Subtable::Global));
        assert!(!s.state().in_angle_list());

        s.close_scope(gate).unwrap();
        assert_eq!(s.lookup_any("theta"), None);
    }

    #[test]
    fn test_nested_redeclaration_lifecycle() {
        let mut s = Session::default();
        let outer = s
            .declare_local("x", 32, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();

        let block = s.open_scope(ContextKind::If).unwrap();
        s.state_mut().lbrace();
        let inner = s
            .declare_local("x", 32, SymbolKind::Int, block, span())
            .unwrap();
        assert_ne!(inner, outer);
        assert_eq!(s.table()[inner].predecessor(), Some(outer));
        assert!(s.check_declaration(inner, span()));
        assert_eq!(s.resolve_identifier(span(), "x").unwrap(), inner);

        s.state_mut().rbrace();
        s.close_scope(block).unwrap();
        assert_eq!(s.table()[inner].home(), None);
        assert_eq!(s.lookup("x", 32, SymbolKind::Int), Some(outer));
        assert_eq!(s.resolve_identifier(span(), "x").unwrap(), outer);
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_global_binding_survives_nested_scopes() {
        let mut s = Session::default();
        let x = s
            .declare_local("x", 64, SymbolKind::Float, ContextId::GLOBAL, span())
            .unwrap();
        for kind in [ContextKind::If, ContextKind::While, ContextKind::Box] {
            let ctx = s.open_scope(kind).unwrap();
            assert_eq!(s.lookup("x", 64, SymbolKind::Float), Some(x));
            s.close_scope(ctx).unwrap();
            assert_eq!(s.lookup("x", 64, SymbolKind::Float), Some(x));
        }
    }

    #[test]
    fn test_undefined_is_reported_by_check() {
        let mut s = Session::default();
        let id = s.resolve_identifier(span(), "mystery").unwrap();
        assert!(s.diagnostics().is_empty());

        assert!(!s.check_undefined(id, span()));
        let diagnostics = s.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "unknown identifier 'mystery' at current scope");

        assert_eq!(s.resolve_identifier(span(), "mystery").unwrap(), id);
    }

    #[test]
    fn test_declaration_upgrades_placeholder() {
        let mut s = Session::default();
        let id = s.resolve_identifier(span(), "n").unwrap();
        let declared = s
            .declare_local("n", 32, SymbolKind::UInt, ContextId::GLOBAL, span())
            .unwrap();

        assert_eq!(declared, id);
        assert_eq!(s.table()[id].kind(), SymbolKind::UInt);
        assert!(s.table().is_filed_in(id, Subtable::Global));
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut s = Session::default();
        let first = s
            .declare_local("c", 4, SymbolKind::Bitset, ContextId::GLOBAL, span())
            .unwrap();
        let second = s
            .declare_local("c", 8, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::DuplicateDeclaration), 1);
    }

    #[test]
    fn test_shadowing_rejected_when_disabled() {
        let config = SessionConfig {
            allow_redeclaration: false,
            ..SessionConfig::default()
        };
        let mut s = Session::new(config);
        let outer = s
            .declare_local("y", 32, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();
        let block = s.open_scope(ContextKind::While).unwrap();
        s.state_mut().lbrace();
        let got = s
            .declare_local("y", 32, SymbolKind::Int, block, span())
            .unwrap();

        assert_eq!(got, outer);
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::ShadowedDeclaration), 1);
    }

    #[test]
    fn test_redeclaration_without_braces_warns() {
        let mut s = Session::default();
        s.declare_local("x", 32, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();
        let block = s.open_scope(ContextKind::If).unwrap();
        s.declare_local("x", 32, SymbolKind::Int, block, span())
            .unwrap();

        assert_eq!(s.diagnostics().count_code(DiagnosticCode::PointlessRedeclaration), 1);
        assert!(!s.diagnostics().has_errors());
    }

    #[test]
    fn test_gates_are_global_whatever_the_context() {
        let mut s = Session::default();
        let block = s.open_scope(ContextKind::If).unwrap();
        let g = s
            .declare_local("g", width::GATE_BITS, SymbolKind::Gate, block, span())
            .unwrap();
        assert_eq!(s.table()[g].context(), ContextId::GLOBAL);

        let again = s
            .declare_local("g", width::GATE_BITS, SymbolKind::Gate, block, span())
            .unwrap();
        assert_eq!(again, g);
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::ShadowedDeclaration), 1);
    }

    #[test]
    fn test_double_close_is_internal_error() {
        let mut s = Session::default();
        let block = s.open_scope(ContextKind::For).unwrap();
        s.close_scope(block).unwrap();

        assert!(s.close_scope(block).is_err());
        assert_eq!(s.diagnostics().internal_count(), 1);
    }

    #[test]
    fn test_erase_after_close_finds_nothing_left() {
        let mut s = Session::default();
        let block = s.open_scope(ContextKind::If).unwrap();
        s.state_mut().lbrace();
        let t = s
            .declare_local("t", 32, SymbolKind::Int, block, span())
            .unwrap();

        assert_eq!(
            s.erase_local("t", 32, SymbolKind::Int),
            Err(TableError::ContextAlive(t))
        );
        s.close_scope(block).unwrap();
        assert_eq!(s.erase_local("t", 32, SymbolKind::Int), Ok(None));
    }

    #[test]
    fn test_builtins_installed_cleanly() {
        let s = Session::default();
        assert!(s.diagnostics().is_empty());
        let pi = s.lookup_any("pi").unwrap();
        assert!(s.table()[pi].is_builtin());
        assert!(s.value_of(pi).is_some());
        let u = s.lookup_any("U").unwrap();
        assert_eq!(s.table()[u].kind(), SymbolKind::UGate);
    }

    #[test]
    fn test_sequential_blocks_release_their_locals() {
        let mut s = Session::default();
        let g = s
            .declare_local("g", 32, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();
        let mut locals = Vec::new();
        for _ in 0..64 {
            let block = s.open_scope(ContextKind::If).unwrap();
            s.state_mut().lbrace();
            let t = s
                .declare_local("t", 32, SymbolKind::Int, block, span())
                .unwrap();
            s.state_mut().rbrace();
            s.close_scope(block).unwrap();
            assert_eq!(s.table()[t].home(), None);
            locals.push(t);
        }

        assert_eq!(s.table().history("t"), locals.as_slice());
        assert_eq!(s.lookup_any("t"), None);
        assert!(s.table()[g].home().is_some());
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_lookup_respects_calibration_context() {
        let mut s = Session::default();
        s.enter_calibration();
        s.state_mut().set_current_kind(SymbolKind::Frame);
        let drive = s.resolve_identifier(span(), "drive").unwrap();
        let bits = s.table()[drive].bits();
        assert_eq!(s.lookup("drive", bits, SymbolKind::Frame), Some(drive));

        s.leave_calibration().unwrap();
        assert_eq!(s.lookup("drive", bits, SymbolKind::Frame), None);
        assert!(s.table()[drive].home().is_some());
    }

    #[test]
    fn test_unrelated_live_bindings_warn_and_pick_stably() {
        let mut s = Session::default();
        let gate = s.open_scope(ContextKind::Gate).unwrap();
        s.state_mut().lbrace();
        s.table
            .insert("y", width::QUBIT_BITS, SymbolKind::GateQubitParam, gate, SymbolScope::Local)
            .unwrap();
        let block = s.open_scope(ContextKind::If).unwrap();
        s.state_mut().lbrace();
        let newer = s
            .table
            .insert("y", width::QUBIT_BITS, SymbolKind::GateQubitParam, block, SymbolScope::Local)
            .unwrap();

        // From calibration neither the gate nor its block is an ancestor
        s.enter_calibration();
        let first = s.resolve_identifier(span(), "y").unwrap();
        assert_eq!(first, newer);
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::AmbiguousIdentifier), 1);
        assert!(!s.diagnostics().has_errors());

        let second = s.resolve_identifier(span(), "y").unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_declaration_only_in_dead_context_is_unreachable() {
        let mut s = Session::default();
        let gate = s.open_scope(ContextKind::Gate).unwrap();
        let a = s
            .table
            .insert("a", width::QUBIT_BITS, SymbolKind::GateQubitParam, gate, SymbolScope::Local)
            .unwrap();
        s.close_scope(gate).unwrap();
        s.open_scope(ContextKind::If).unwrap();

        assert!(s.scope().is_visible(a));
        assert!(!s.check_declaration(a, span()));
        let diagnostics = s.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::UndefinedIdentifier);
        assert!(diagnostics[0].message.starts_with("no reachable declaration of 'a'"));
    }

    #[test]
    fn test_dumps() {
        let mut s = Session::default();
        s.declare_local("q", 2, SymbolKind::QubitContainer, ContextId::GLOBAL, span())
            .unwrap();
        let block = s.open_scope(ContextKind::If).unwrap();
        s.close_scope(block).unwrap();

        let symbols = s.dump_symbols();
        assert!(symbols.contains("q"));
        assert!(symbols.contains("qubit register"));
        let contexts = s.dump_contexts();
        assert_eq!(contexts.lines().count(), 3);
        assert!(contexts.contains("dead"));
    }
}
