//! Visibility and redeclaration rules
//!
//! [`ScopeController`] is a read-only view over the context tree, the
//! symbol table and the parser state. Its checks return the diagnostic a
//! failure would produce; the session decides where to record it.

use tracing::trace;

use super::context::{ContextId, ContextKind, ContextTree};
use super::reserved;
use super::state::ParserState;
use super::symbol::{SymbolId, SymbolScope};
use super::table::SymbolTable;
use crate::common::{Diagnostic, DiagnosticCode, Span};
use crate::types::SymbolKind;

pub struct ScopeController<'a> {
    tree: &'a ContextTree,
    table: &'a SymbolTable,
    state: &'a ParserState,
    allow_redeclaration: bool,
}

impl<'a> ScopeController<'a> {
    pub fn new(
        tree: &'a ContextTree,
        table: &'a SymbolTable,
        state: &'a ParserState,
        allow_redeclaration: bool,
    ) -> Self {
        Self {
            tree,
            table,
            state,
            allow_redeclaration,
        }
    }

    /// A `cal` or `defcal` body is open, so the shared calibration
    /// context is in reach
    pub fn calibration_open(&self) -> bool {
        self.state.in_calibration_or_defcal() || self.tree.in_calibration()
    }

    pub fn is_visible(&self, id: SymbolId) -> bool {
        let base = self.table.base_of(id);
        let sym = &self.table[base];
        if sym.is_builtin()
            || sym.kind().is_always_visible()
            || reserved::is_reserved_constant(self.table.name_of(base))
        {
            return true;
        }

        let context = sym.context();
        if !self.tree.is_alive(context) {
            return false;
        }
        let current = self.tree.current();
        if context == ContextId::GLOBAL || context == current {
            return true;
        }
        if self.tree.is_ancestor_or_self(context, current) {
            return true;
        }
        context == ContextId::CALIBRATION && self.calibration_open()
    }

    pub fn check_undefined(&self, id: SymbolId, span: Span) -> Result<(), Diagnostic> {
        if self.table[id].kind() != SymbolKind::Undefined {
            return Ok(());
        }
        Err(Diagnostic::error(
            DiagnosticCode::UndefinedIdentifier,
            format!("unknown identifier '{}' at current scope", self.table.name_of(id)),
            span,
        ))
    }

    pub fn check_out_of_scope(&self, id: SymbolId, span: Span) -> Result<(), Diagnostic> {
        if self.is_visible(id) {
            return Ok(());
        }
        Err(Diagnostic::error(
            DiagnosticCode::OutOfScope,
            format!(
                "identifier '{}' is out of scope (declared in context {})",
                self.table.name_of(id),
                self.table[id].context()
            ),
            span,
        ))
    }

    /// Strict check used at declaration and definition sites.
    ///
    /// Besides visibility, the declaration history of the name must hold an
    /// entry of the same kind whose context was created no later than the
    /// current one and is still alive.
    pub fn check_declaration(&self, id: SymbolId, span: Span) -> Result<(), Diagnostic> {
        let base = self.table.base_of(id);
        let sym = &self.table[base];
        let name = self.table.name_of(base);
        if sym.is_builtin() || reserved::is_reserved_constant(name) {
            return Ok(());
        }

        if sym.context() == ContextId::CALIBRATION && !self.calibration_open() {
            return Err(Diagnostic::error(
                DiagnosticCode::CalibrationContext,
                format!("'{}' is not declared in a calibration or defcal context", name),
                span,
            ));
        }
        self.check_out_of_scope(base, span)?;

        let kind = sym.kind();
        if self.tree.scope_of(sym.context()) == SymbolScope::Local
            && !kind.can_have_local_scope()
        {
            return Err(Diagnostic::error(
                DiagnosticCode::LocalScope,
                format!("{} '{}' cannot have local scope", kind, name),
                span,
            ));
        }

        let current = self.tree.current();
        if self.tree.is_global(current) {
            return Ok(());
        }

        let reachable = self.table.history_of(base).iter().any(|entry| {
            let past = &self.table[*entry];
            if past.kind() != kind {
                return false;
            }
            let context = past.context();
            if context == ContextId::CALIBRATION {
                return self.calibration_open();
            }
            self.tree.is_alive(context) && context.index() <= current.index()
        });
        trace!(name, %kind, reachable, "check declaration");
        if reachable {
            Ok(())
        } else {
            Err(Diagnostic::error(
                DiagnosticCode::UndefinedIdentifier,
                format!("no reachable declaration of '{}' with type {}", name, kind),
                span,
            ))
        }
    }

    /// `c.creal`, `f.phase`: only the kinds listed in the reserved tables
    /// accept member suffixes
    pub fn check_reserved_suffix(
        &self,
        id: SymbolId,
        suffix: &str,
        span: Span,
    ) -> Result<(), Diagnostic> {
        let kind = self.table[id].kind();
        if reserved::reserved_suffixes(kind).contains(&suffix) {
            return Ok(());
        }
        Err(Diagnostic::error(
            DiagnosticCode::InvalidSuffix,
            format!("invalid reserved suffix '{}' for type {}", suffix, kind),
            span,
        ))
    }

    /// Whether a fresh binding of `name` with `kind` may shadow an outer one
    /// in `context`
    pub fn can_redeclare(&self, name: &str, kind: SymbolKind, context: ContextId) -> bool {
        if self.tree.is_global(context) || kind == SymbolKind::Undefined {
            return false;
        }
        if !self.allow_redeclaration || !kind.allows_redeclaration() {
            return false;
        }
        !self.bound_in(name, context)
    }

    /// A non-reference binding of `name` is filed for exactly `context`
    pub fn bound_in(&self, name: &str, context: ContextId) -> bool {
        self.table.lookup_range(name).into_iter().any(|id| {
            let sym = &self.table[id];
            !sym.is_reference() && sym.context() == context
        })
    }

    /// Visible binding of `name` owned by a strict ancestor of the current
    /// context
    pub fn outer_binding(&self, name: &str) -> Option<SymbolId> {
        let current = self.tree.current();
        self.table
            .lookup_range(name)
            .into_iter()
            .filter(|id| !self.table[*id].is_reference())
            .filter(|id| self.table[*id].context() != current)
            .filter(|id| self.is_visible(*id))
            .min_by_key(|id| {
                self.tree
                    .distance(self.table[*id].context(), current)
                    .unwrap_or(usize::MAX)
            })
    }

    /// Decide whether resolving `name` as `kind` right now opens a shadowing
    /// redeclaration. Returns the binding that would be shadowed.
    pub fn in_redeclaration_context(&self, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        let state = self.state;
        let innermost = state.innermost_block()?;

        if state.seen_lbracket() && state.seen_rbracket() && kind.is_simple_integer() {
            return None;
        }
        if state.seen_lparen()
            && !state.seen_lbracket()
            && kind.is_integer()
            && innermost.kind.is_conditional()
        {
            return None;
        }

        if !self.can_redeclare(name, kind, self.tree.current()) {
            return None;
        }
        if !innermost.kind.admits_redeclaration() {
            return None;
        }
        if !(innermost.braces_open() || innermost.braces_unseen()) {
            return None;
        }
        self.outer_binding(name)
    }

    /// A shadowing declaration in the innermost block would be discarded
    /// right away because the block has no braces. Definition blocks always
    /// have a body, so there unseen braces mean a header is being read.
    pub fn is_pointless_redeclaration(&self) -> bool {
        self.state.innermost_block().is_some_and(|block| {
            block.braces_unseen()
                && !matches!(
                    block.kind,
                    ContextKind::Gate
                        | ContextKind::Defcal
                        | ContextKind::Function
                        | ContextKind::Kernel
                )
        })
    }
}
