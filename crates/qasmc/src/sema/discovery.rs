//! Type discovery
//!
//! Decides what a bare identifier denotes from the bindings already in the
//! table and the ambient parser state. Discovery runs a fixed sequence of
//! steps; each either settles on a symbol or passes, and the first one that
//! settles wins:
//!
//! 1. pragma names
//! 2. reserved names: constants, negated constants, time units and the
//!    OpenQASM 2 gates
//! 3. implicit angle names
//! 4. known bindings, possibly shadowed, normalized or reported
//! 5. unknown names, created from the inferred kind, or an undefined
//!    placeholder when nothing can be inferred

use tracing::{debug, trace};

use super::context::ContextKind;
use super::reserved;
use super::session::Session;
use super::state::PendingHeader;
use super::symbol::SymbolId;
use super::table::Subtable;
use super::value::Literal;
use crate::common::{CompileResult, Diagnostic, DiagnosticCode, Span};
use crate::types::width;
use crate::types::SymbolKind;

type Step = CompileResult<Option<SymbolId>>;

impl Session {
    /// Resolve a bare identifier.
    ///
    /// Never fails for user errors: those are recorded as diagnostics and
    /// an existing binding or an undefined placeholder comes back. `Err` is
    /// reserved for internal invariant violations.
    pub fn resolve_identifier(&mut self, span: Span, name: &str) -> CompileResult<SymbolId> {
        trace!(
            name,
            current = %self.state.current_kind(),
            previous = %self.state.previous_kind(),
            context = %self.contexts.current(),
            "resolve identifier"
        );
        let id = if let Some(id) = self.discover_pragma(name, span)? {
            id
        } else if let Some(id) = self.discover_reserved(name, span)? {
            id
        } else if let Some(id) = self.discover_implicit_angle(name, span)? {
            id
        } else if let Some(id) = self.discover_known(name, span)? {
            id
        } else {
            self.discover_unknown(name, span)?
        };
        let kind = self.table[id].kind();
        trace!(name, symbol = %id, %kind, "resolved");
        self.state.settle(kind);
        Ok(id)
    }

    fn discover_pragma(&mut self, name: &str, span: Span) -> Step {
        if !self.state.in_pragma() {
            return Ok(None);
        }
        let context = self.contexts.current();
        let cached = self
            .table
            .lookup_range_ordered(name, &[Subtable::Generic])
            .into_iter()
            .find(|id| {
                let sym = &self.table[*id];
                sym.kind() == SymbolKind::Pragma && sym.context() == context
            });
        if cached.is_some() {
            return Ok(cached);
        }
        self.build(span, |b| {
            b.create(name, SymbolKind::Pragma, width::PRAGMA_BITS, context, span)
        })
        .map(Some)
    }

    fn discover_reserved(&mut self, name: &str, span: Span) -> Step {
        let current = self.state.current_kind();

        if let Some(constant) = reserved::negated_constant(name) {
            if let Some(id) = self.builtin(name, SymbolKind::Double) {
                return Ok(Some(id));
            }
            let literal = reserved::constant_value(constant).map(|v| Literal::Float(-v));
            return self
                .build(span, |b| {
                    b.create_global(name, SymbolKind::Double, width::DOUBLE_BITS, literal, span)
                })
                .map(Some);
        }

        if reserved::is_reserved_constant(name) {
            if current == SymbolKind::MpDecimal {
                if let Some(id) = self.builtin(name, SymbolKind::MpDecimal) {
                    return Ok(Some(id));
                }
                let literal = reserved::constant_value(name).map(Literal::Float);
                return self
                    .build(span, |b| {
                        b.create_global(
                            name,
                            SymbolKind::MpDecimal,
                            width::MP_DEFAULT_BITS,
                            literal,
                            span,
                        )
                    })
                    .map(Some);
            }
            return match self.builtin(name, SymbolKind::Angle) {
                Some(id) => Ok(Some(id)),
                None => Err(self.ice(
                    format!("reserved constant '{}' has no builtin binding", name),
                    span,
                )),
            };
        }

        if (name == "dt" || name == "DT")
            && (current == SymbolKind::Delay || self.state.previous_kind() == SymbolKind::Delay)
        {
            if let Some(id) = self.builtin(name, SymbolKind::TimeUnit) {
                return Ok(Some(id));
            }
            return self
                .build(span, |b| {
                    b.create_global(name, SymbolKind::TimeUnit, width::DURATION_BITS, None, span)
                })
                .map(Some);
        }

        if self.config.openqasm2_gates {
            if let Some(kind) = reserved::openqasm2_gate(name) {
                if let Some(id) = self.builtin(name, kind) {
                    return Ok(Some(id));
                }
                return self
                    .build(span, |b| b.create_global(name, kind, width::GATE_BITS, None, span))
                    .map(Some);
            }
        }
        Ok(None)
    }

    /// Non-reclaimable global binding of `name` with exactly `kind`
    fn builtin(&self, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        self.table.lookup_range(name).into_iter().find(|id| {
            let sym = &self.table[*id];
            sym.is_builtin() && sym.kind() == kind
        })
    }

    /// Greek letter names denote angles unless something else is declared
    /// under that name or a qubit list is being read
    fn discover_implicit_angle(&mut self, name: &str, span: Span) -> Step {
        if !reserved::is_implicit_angle(name) || self.state.in_qubit_list() {
            return Ok(None);
        }
        let current = self.state.current_kind();
        if current != SymbolKind::Undefined && current != SymbolKind::Angle {
            return Ok(None);
        }
        let parameter = self.state.in_angle_list() && self.in_definition_header();
        if parameter {
            return self.discover_angle_param(name, span).map(Some);
        }
        if let Some(id) = self.visible_binding(name) {
            return Ok((self.table[id].kind() == SymbolKind::Angle).then_some(id));
        }
        let context = self.contexts.current();
        debug!(name, context = %context, "implicit angle");
        self.build(span, |b| {
            b.create(name, SymbolKind::Angle, width::ANGLE_BITS, context, span)
        })
        .map(Some)
    }

    /// An angle parameter in a gate or defcal header. It is filed in the
    /// angle table first and moved to the local table of the definition
    /// once created; a closing paren ends the list.
    fn discover_angle_param(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        if self.state.lookahead() == Some(')') {
            self.state.stop_angle_list();
        }
        let context = self.contexts.current();
        if self.scope().bound_in(name, context) {
            return self.duplicate_param(name, span);
        }
        if let Some(outer) = self.scope().outer_binding(name) {
            return self.header_param(outer, SymbolKind::Angle, width::ANGLE_BITS, span);
        }
        let id = self.build(span, |b| {
            b.create_in(
                name,
                SymbolKind::Angle,
                width::ANGLE_BITS,
                context,
                Subtable::Angle,
                span,
            )
        })?;
        self.transfer(id, Subtable::Local)?;
        Ok(id)
    }

    /// Shadow `outer` with a header parameter of the definition being read
    fn header_param(
        &mut self,
        outer: SymbolId,
        kind: SymbolKind,
        bits: u32,
        span: Span,
    ) -> CompileResult<SymbolId> {
        let context = self.contexts.current();
        if self.table[outer].context() == context {
            let name = self.table.name_of(outer).to_string();
            return self.duplicate_param(&name, span);
        }
        self.build(span, |b| b.create_redeclaration(outer, kind, bits, context, span))
    }

    fn duplicate_param(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        let context = self.contexts.current();
        let existing = self
            .table
            .lookup_range(name)
            .into_iter()
            .find(|id| !self.table[*id].is_reference() && self.table[*id].context() == context);
        self.report(Diagnostic::error(
            DiagnosticCode::DuplicateDeclaration,
            format!("parameter '{}' is declared twice", name),
            span,
        ));
        match existing {
            Some(id) => Ok(id),
            None => self.placeholder(name, span),
        }
    }

    fn discover_known(&mut self, name: &str, span: Span) -> Step {
        let candidates = self.table.lookup_range_ordered(name, &self.lookup_order());
        let calibration = self.calibration_open();
        let Some(selection) = self.table.select(&candidates, &self.contexts, calibration) else {
            return Ok(None);
        };
        let id = selection.symbol;
        let current = self.state.current_kind();

        if !self.scope().is_visible(id) {
            trace!(name, symbol = %id, "binding not visible");
            // With an inferred kind the name is declared afresh; a bare use
            // returns the stale binding for the out-of-scope check.
            return Ok((current == SymbolKind::Undefined).then_some(id));
        }
        let found = self.table[id].kind();
        if found == SymbolKind::Undefined && current == SymbolKind::Undefined {
            // Placeholder: give inference another chance
            return Ok(None);
        }
        if selection.ambiguous {
            self.report(Diagnostic::warning(
                DiagnosticCode::AmbiguousIdentifier,
                format!(
                    "ambiguous identifier '{}': declarations in unrelated scopes are visible, using the most recent",
                    name
                ),
                span,
            ));
        }

        if found.is_gate() && current.is_gate() {
            self.report(Diagnostic::error(
                DiagnosticCode::ShadowedDeclaration,
                format!("re-declaration of gate '{}' shadows a previous declaration", name),
                span,
            ));
            return Ok(Some(id));
        }
        if self.table[id].is_induction_variable() && current.is_integer() {
            self.report(Diagnostic::error(
                DiagnosticCode::InductionVariable,
                format!("induction variable '{}' cannot be re-declared", name),
                span,
            ));
            return Ok(Some(id));
        }
        if self.state.header() == Some(PendingHeader::For) {
            return self.induction_variable(name, current, Some(id), span).map(Some);
        }

        let header = self.in_definition_header();
        if header && self.state.in_qubit_list() && !found.is_gate() {
            if self.state.lookahead() == Some('{') {
                self.state.stop_qubit_list();
            }
            return self
                .header_param(id, SymbolKind::GateQubitParam, width::QUBIT_BITS, span)
                .map(Some);
        }
        if header && self.state.in_angle_list() {
            return self.discover_angle_param(name, span).map(Some);
        }

        if found.is_always_visible() {
            return Ok(Some(id));
        }
        if let Some(previous) = self.scope().in_redeclaration_context(name, current) {
            return self
                .redeclare(previous, current, current.default_bits(), span)
                .map(Some);
        }
        if current.is_defcal() && (found.is_defcal() || found == SymbolKind::DefcalGroup) {
            return self
                .build(span, |b| b.create_defcal(name, current, current.default_bits(), span))
                .map(Some);
        }

        if current != SymbolKind::Undefined {
            let bits = self.table[id].bits();
            if found.normalizes_to(current) {
                if found != current || width::is_unknown(bits) {
                    self.normalize(id, current, current.default_bits(), span)?;
                }
            } else if self.table[id].context() == self.contexts.current() {
                self.report(Diagnostic::error(
                    DiagnosticCode::TypeConflict,
                    format!("'{}' was declared as {} but is used as {}", name, found, current),
                    span,
                ));
            }
        }
        Ok(Some(id))
    }

    fn discover_unknown(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        let context = self.contexts.current();
        let current = self.state.current_kind();
        let previous = self.state.previous_kind();

        if self.in_definition_header() {
            if self.state.in_qubit_list() {
                if self.state.lookahead() == Some('{') {
                    self.state.stop_qubit_list();
                }
                return self.build(span, |b| {
                    b.create(name, SymbolKind::GateQubitParam, width::QUBIT_BITS, context, span)
                });
            }
            if self.state.in_angle_list() {
                return self.discover_angle_param(name, span);
            }
        }
        if self.state.header() == Some(PendingHeader::For)
            && (current == SymbolKind::Undefined || current.is_integer())
        {
            return self.induction_variable(name, current, None, span);
        }

        match current {
            kind if kind.is_defcal() => {
                return self.build(span, |b| b.create_defcal(name, kind, kind.default_bits(), span));
            }
            SymbolKind::Function | SymbolKind::Kernel | SymbolKind::Extern => {
                let kind = if current == SymbolKind::Extern {
                    SymbolKind::Kernel
                } else {
                    current
                };
                return self.build(span, |b| {
                    b.create_global(name, kind, kind.default_bits(), None, span)
                });
            }
            kind if kind.is_gate() => {
                return self.build(span, |b| {
                    b.create_global(name, kind, width::GATE_BITS, None, span)
                });
            }
            kind if kind.is_pulse() => {
                if !self.calibration_open() {
                    return self.pulse_outside_calibration(name, kind, span);
                }
                return self.build(span, |b| {
                    b.create(name, kind, kind.default_bits(), context, span)
                });
            }
            SymbolKind::Undefined => {}
            kind => {
                let kind = if previous == SymbolKind::Array {
                    kind.array_of().unwrap_or(kind)
                } else {
                    kind
                };
                return self.build(span, |b| {
                    b.create(name, kind, kind.default_bits(), context, span)
                });
            }
        }

        if reserved::is_builtin_function(name) {
            return self.build(span, |b| {
                b.create_global(name, SymbolKind::Function, width::FUNCTION_BITS, None, span)
            });
        }
        if reserved::is_pulse_function(name) {
            if !self.calibration_open() {
                return self.pulse_outside_calibration(name, SymbolKind::Function, span);
            }
            return self.build(span, |b| {
                b.create_global(name, SymbolKind::Function, width::FUNCTION_BITS, None, span)
            });
        }
        if self.state.header() == Some(PendingHeader::While) {
            self.report(Diagnostic::error(
                DiagnosticCode::UndefinedIdentifier,
                format!("unknown identifier '{}' in while condition", name),
                span,
            ));
            return self.placeholder(name, span);
        }

        trace!(name, "no kind inferred");
        self.placeholder(name, span)
    }

    fn pulse_outside_calibration(
        &mut self,
        name: &str,
        kind: SymbolKind,
        span: Span,
    ) -> CompileResult<SymbolId> {
        self.report(Diagnostic::error(
            DiagnosticCode::PulseContext,
            format!("{} '{}' is only allowed in a calibration or defcal block", kind, name),
            span,
        ));
        self.placeholder(name, span)
    }

    /// Loop variable of the pending `for` header, owned by the loop context
    fn induction_variable(
        &mut self,
        name: &str,
        kind: SymbolKind,
        previous: Option<SymbolId>,
        span: Span,
    ) -> CompileResult<SymbolId> {
        let owner = self
            .contexts
            .innermost(ContextKind::For)
            .unwrap_or_else(|| self.contexts.current());
        let kind = if kind.is_integer() { kind } else { SymbolKind::Int };
        let bits = kind.default_bits();
        let id = match previous {
            Some(outer) if self.table[outer].context() != owner => {
                self.build(span, |b| b.create_redeclaration(outer, kind, bits, owner, span))?
            }
            Some(existing) => existing,
            None => self.build(span, |b| b.create(name, kind, bits, owner, span))?,
        };
        self.table[id].mark_induction_variable();
        self.state.set_header(None);
        debug!(name, symbol = %id, context = %owner, "induction variable");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::context::ContextId;
    use crate::sema::session::SessionConfig;
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::new(0, 1)
    }

    fn session() -> Session {
        Session::new(SessionConfig::default())
    }

    fn errors(session: &Session, code: DiagnosticCode) -> usize {
        session.diagnostics().count_code(code)
    }

    #[test]
    fn test_reserved_constant_is_installed_angle() {
        let mut s = session();
        let pi = s.resolve_identifier(span(), "pi").unwrap();

        assert_eq!(s.table()[pi].kind(), SymbolKind::Angle);
        assert!(s.table()[pi].is_builtin());
        assert!(s.value_of(pi).is_some());
        assert_eq!(s.resolve_identifier(span(), "pi").unwrap(), pi);
    }

    #[test]
    fn test_negated_constant_is_double() {
        let mut s = session();
        let neg = s.resolve_identifier(span(), "-tau").unwrap();

        assert_eq!(s.table()[neg].kind(), SymbolKind::Double);
        assert_eq!(s.table()[neg].context(), ContextId::GLOBAL);
        assert_eq!(s.resolve_identifier(span(), "-tau").unwrap(), neg);
    }

    #[test]
    fn test_constant_under_mp_decimal() {
        let mut s = session();
        s.state_mut().set_current_kind(SymbolKind::MpDecimal);
        let pi = s.resolve_identifier(span(), "pi").unwrap();
        assert_eq!(s.table()[pi].kind(), SymbolKind::MpDecimal);
        assert_eq!(s.state().current_kind(), SymbolKind::Undefined);
        assert_eq!(s.state().previous_kind(), SymbolKind::MpDecimal);
    }

    #[test]
    fn test_unknown_name_is_placeholder_without_diagnostic() {
        let mut s = session();
        let x = s.resolve_identifier(span(), "mystery").unwrap();

        assert_eq!(s.table()[x].kind(), SymbolKind::Undefined);
        assert!(s.diagnostics().is_empty());
        assert!(!s.check_undefined(x, span()));
        assert_eq!(s.diagnostics().error_count(), 1);
    }

    #[test]
    fn test_pragma_names_are_cached() {
        let mut s = session();
        s.state_mut().open_pragma();
        let first = s.resolve_identifier(span(), "verbatim").unwrap();
        let second = s.resolve_identifier(span(), "verbatim").unwrap();

        assert_eq!(first, second);
        assert_eq!(s.table()[first].kind(), SymbolKind::Pragma);
    }

    #[test]
    fn test_gate_redeclaration_is_error() {
        let mut s = session();
        s.state_mut().set_current_kind(SymbolKind::Gate);
        let g = s.resolve_identifier(span(), "bell").unwrap();
        assert!(s.table()[g].kind().is_gate());

        s.state_mut().set_current_kind(SymbolKind::Gate);
        let again = s.resolve_identifier(span(), "bell").unwrap();
        assert_eq!(again, g);
        assert_eq!(errors(&s, DiagnosticCode::ShadowedDeclaration), 1);
    }

    #[test]
    fn test_defcal_overloads_join_group() {
        let mut s = session();
        s.state_mut().set_current_kind(SymbolKind::Defcal);
        let first = s.resolve_identifier(span(), "rz").unwrap();
        s.state_mut().set_current_kind(SymbolKind::Defcal);
        let second = s.resolve_identifier(span(), "rz").unwrap();

        let group = s.table().lookup_in("rz", Subtable::DefcalGroup).unwrap();
        assert_ne!(first, second);
        assert_eq!(s.table().group_members(group), &[first, second]);
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_frame_outside_calibration() {
        let mut s = session();
        s.state_mut().set_current_kind(SymbolKind::Frame);
        let f = s.resolve_identifier(span(), "drive").unwrap();

        assert_eq!(s.table()[f].kind(), SymbolKind::Undefined);
        assert_eq!(errors(&s, DiagnosticCode::PulseContext), 1);
    }

    #[test]
    fn test_frame_inside_calibration() {
        let mut s = session();
        s.enter_calibration();
        s.state_mut().set_current_kind(SymbolKind::Frame);
        let f = s.resolve_identifier(span(), "drive").unwrap();

        assert_eq!(s.table()[f].kind(), SymbolKind::Frame);
        assert_eq!(s.table()[f].context(), ContextId::CALIBRATION);
        assert!(s.table().is_filed_in(f, Subtable::Calibration));

        s.leave_calibration().unwrap();
        assert!(!s.scope().is_visible(f));
    }

    #[test]
    fn test_array_kind_inference() {
        let mut s = session();
        s.state_mut().set_current_kind(SymbolKind::Array);
        s.state_mut().set_current_kind(SymbolKind::Float);
        let a = s.resolve_identifier(span(), "samples").unwrap();
        assert_eq!(s.table()[a].kind(), SymbolKind::FloatArray);
    }

    #[test]
    fn test_placeholder_normalized_later() {
        let mut s = session();
        let x = s.resolve_identifier(span(), "x").unwrap();
        assert!(s.table().is_filed_in(x, Subtable::Undefined));

        s.state_mut().set_current_kind(SymbolKind::Int);
        let again = s.resolve_identifier(span(), "x").unwrap();
        assert_eq!(again, x);
        assert_eq!(s.table()[x].kind(), SymbolKind::Int);
        assert_eq!(s.table()[x].bits(), 32);
        assert!(s.table().is_filed_in(x, Subtable::Global));
    }

    #[test]
    fn test_precision_normalization_and_conflict() {
        let mut s = session();
        let x = s
            .declare_local("x", 32, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();

        s.state_mut().set_current_kind(SymbolKind::MpInteger);
        s.resolve_identifier(span(), "x").unwrap();
        assert_eq!(s.table()[x].kind(), SymbolKind::MpInteger);

        s.state_mut().set_current_kind(SymbolKind::Bool);
        let same = s.resolve_identifier(span(), "x").unwrap();
        assert_eq!(same, x);
        assert_eq!(s.table()[x].kind(), SymbolKind::MpInteger);
        assert_eq!(errors(&s, DiagnosticCode::TypeConflict), 1);
    }

    #[test]
    fn test_for_header_declares_induction_variable() {
        let mut s = session();
        let ctx = s.open_scope(ContextKind::For).unwrap();
        s.state_mut().set_header(Some(PendingHeader::For));
        let i = s.resolve_identifier(span(), "i").unwrap();

        assert_eq!(s.table()[i].kind(), SymbolKind::Int);
        assert_eq!(s.table()[i].context(), ctx);
        assert!(s.table()[i].is_induction_variable());
        assert_eq!(s.state().header(), None);

        s.state_mut().set_current_kind(SymbolKind::Int);
        s.resolve_identifier(span(), "i").unwrap();
        assert_eq!(errors(&s, DiagnosticCode::InductionVariable), 1);
    }

    #[test]
    fn test_while_header_unknown_name() {
        let mut s = session();
        s.open_scope(ContextKind::While).unwrap();
        s.state_mut().set_header(Some(PendingHeader::While));
        let c = s.resolve_identifier(span(), "cond").unwrap();

        assert_eq!(s.table()[c].kind(), SymbolKind::Undefined);
        assert_eq!(errors(&s, DiagnosticCode::UndefinedIdentifier), 1);
    }

    #[test]
    fn test_time_unit_under_delay() {
        let mut s = session();
        s.state_mut().set_current_kind(SymbolKind::Delay);
        let dt = s.resolve_identifier(span(), "dt").unwrap();
        assert_eq!(s.table()[dt].kind(), SymbolKind::TimeUnit);

        let plain = s.resolve_identifier(span(), "DT").unwrap();
        assert_eq!(s.table()[plain].kind(), SymbolKind::Undefined);
    }

    #[test]
    fn test_openqasm2_gates() {
        let mut s = Session::new(SessionConfig {
            openqasm2_gates: true,
            ..SessionConfig::default()
        });
        let cx = s.resolve_identifier(span(), "CX").unwrap();
        assert_eq!(s.table()[cx].kind(), SymbolKind::CxGate);

        let u = s.resolve_identifier(span(), "U").unwrap();
        assert_eq!(s.table()[u].kind(), SymbolKind::UGate);
        assert!(s.table()[u].is_builtin());
    }

    #[test]
    fn test_builtin_and_pulse_functions() {
        let mut s = session();
        let mix = s.resolve_identifier(span(), "mix").unwrap();
        assert_eq!(s.table()[mix].kind(), SymbolKind::Function);

        let outside = s.resolve_identifier(span(), "shift_phase").unwrap();
        assert_eq!(s.table()[outside].kind(), SymbolKind::Undefined);
        assert_eq!(errors(&s, DiagnosticCode::PulseContext), 1);

        s.enter_calibration();
        let inside = s.resolve_identifier(span(), "shift_phase").unwrap();
        assert_eq!(s.table()[inside].kind(), SymbolKind::Function);
    }

    #[test]
    fn test_gate_header_qubit_params() {
        let mut s = session();
        s.declare_local("a", 1, SymbolKind::Qubit, ContextId::GLOBAL, span())
            .unwrap();
        s.state_mut().set_current_kind(SymbolKind::Gate);
        s.resolve_identifier(span(), "g").unwrap();
        let gate = s.open_scope(ContextKind::Gate).unwrap();

        s.state_mut().start_qubit_list();
        s.state_mut().set_lookahead(Some(','));
        let a = s.resolve_identifier(span(), "a").unwrap();
        s.state_mut().set_lookahead(Some('{'));
        let b = s.resolve_identifier(span(), "b").unwrap();

        assert_eq!(s.table()[a].kind(), SymbolKind::GateQubitParam);
        assert_eq!(s.table()[a].context(), gate);
        assert!(s.table()[a].is_redeclaration());
        assert_eq!(s.table()[b].kind(), SymbolKind::GateQubitParam);
        assert!(!s.state().in_qubit_list());
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_implicit_angle_outside_parameter_list() {
        let mut s = session();
        let theta = s.resolve_identifier(span(), "theta").unwrap();
        assert_eq!(s.table()[theta].kind(), SymbolKind::Angle);
        assert_eq!(s.table()[theta].reference_count(), 4);

        let x = s
            .declare_local("phi", 32, SymbolKind::Float, ContextId::GLOBAL, span())
            .unwrap();
        assert_eq!(s.resolve_identifier(span(), "phi").unwrap(), x);
    }
}
