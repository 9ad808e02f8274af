//! Indexed identifiers: `q[1]`, `theta[2]`, `bits[i]`
//!
//! The base name is resolved like any other identifier. The subscript is
//! checked, then the element is handed out as a reference symbol cached on
//! the base, so every access to the same element yields the same id.

use std::fmt;

use tracing::trace;

use super::session::Session;
use super::symbol::{IndexKey, Symbol, SymbolId};
use crate::common::{CompileResult, Diagnostic, DiagnosticCode, Span};
use crate::types::width::{self, ANGLE_COMPONENTS};
use crate::types::SymbolKind;

/// Subscript as the grammar hands it over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexExpr {
    Literal(u32),
    Identifier(String),
    /// Source text of anything that is not a literal or a bare name
    Expression(String),
    /// `x[i][j]` or `x[i, j]`
    Multi(Vec<IndexExpr>),
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexExpr::Literal(n) => write!(f, "{}", n),
            IndexExpr::Identifier(s) | IndexExpr::Expression(s) => f.write_str(s),
            IndexExpr::Multi(parts) => {
                for (ix, part) in parts.iter().enumerate() {
                    if ix > 0 {
                        f.write_str("][")?;
                    }
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
        }
    }
}

/// Number of addressable elements, if known
fn extent_of(sym: &Symbol) -> Option<u32> {
    if let Some(extent) = sym.extent() {
        return Some(extent);
    }
    let kind = sym.kind();
    if kind == SymbolKind::Angle {
        return Some(ANGLE_COMPONENTS);
    }
    let sized = kind.is_qubit() || kind == SymbolKind::Bitset || kind.is_integer();
    (sized && !width::is_unknown(sym.bits())).then_some(sym.bits())
}

impl Session {
    /// Resolve `name[index]` to the reference symbol for that element.
    ///
    /// User errors (non-integer index, out of range, multi-dimensional
    /// subscript, unindexable base) are reported and yield an undefined
    /// placeholder.
    pub fn resolve_indexed_identifier(
        &mut self,
        span: Span,
        name: &str,
        index: &IndexExpr,
    ) -> CompileResult<SymbolId> {
        let index = match index {
            IndexExpr::Multi(parts) => match parts.as_slice() {
                [only] => only,
                _ => {
                    self.report(Diagnostic::error(
                        DiagnosticCode::UnsupportedSubscript,
                        format!("multi-dimensional subscript '{}[{}]' is not supported", name, index),
                        span,
                    ));
                    return self.placeholder(&format!("{}[{}]", name, index), span);
                }
            },
            single => single,
        };

        let base = match self.visible_binding(name) {
            Some(id) => id,
            None => self.resolve_identifier(span, name)?,
        };

        let key = match index {
            IndexExpr::Literal(n) => IndexKey::Literal(*n),
            IndexExpr::Identifier(ident) => {
                let found = match self.visible_binding(ident) {
                    Some(id) => id,
                    None => self.placeholder(ident, span)?,
                };
                if !self.table[found].kind().is_index_kind() {
                    self.report(Diagnostic::error(
                        DiagnosticCode::IndexNotInteger,
                        format!(
                            "no integer constant expression entry was found in the symbol table for identifier '{}'",
                            ident
                        ),
                        span,
                    ));
                    return self.placeholder(&format!("{}[{}]", name, ident), span);
                }
                IndexKey::Identifier(ident.clone())
            }
            IndexExpr::Expression(_) | IndexExpr::Multi(_) => IndexKey::Expression(index.to_string()),
        };

        let base_sym = &self.table[base];
        let base_kind = base_sym.kind();
        if let (IndexKey::Literal(n), Some(extent)) = (&key, extent_of(base_sym)) {
            if *n >= extent {
                self.report(Diagnostic::error(
                    DiagnosticCode::IndexOutOfRange,
                    format!("index {} is out of range for '{}' of size {}", n, name, extent),
                    span,
                ));
                return self.placeholder(&format!("{}[{}]", name, n), span);
            }
        }

        let (kind, bits) = if let Some(element) = base_kind.element_kind() {
            (element, element.default_bits())
        } else if base_kind == SymbolKind::Angle {
            (SymbolKind::Angle, base_sym.bits() / ANGLE_COMPONENTS)
        } else if base_kind.is_qubit_param() {
            (SymbolKind::Qubit, width::QUBIT_BITS)
        } else if base_kind == SymbolKind::Bitset || base_kind.is_integer() {
            (SymbolKind::Bitset, 1)
        } else if base_kind == SymbolKind::Undefined {
            (SymbolKind::Undefined, width::UNKNOWN_BITS)
        } else {
            self.report(Diagnostic::error(
                DiagnosticCode::TypeConflict,
                format!("'{}' of type {} cannot be indexed", name, base_kind),
                span,
            ));
            return self.placeholder(&format!("{}[{}]", name, index), span);
        };

        trace!(name, %key, %kind, "indexed identifier");
        let id = self.build(span, |b| b.create_reference(base, key, kind, bits, span))?;
        self.state.settle(kind);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::context::{ContextId, ContextKind};
    use crate::sema::session::SessionConfig;
    use crate::sema::table::Subtable;
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::new(4, 8)
    }

    fn session() -> Session {
        Session::new(SessionConfig::default())
    }

    #[test]
    fn test_qubit_register_element() {
        let mut s = session();
        let q = s
            .declare_local("q", 3, SymbolKind::QubitContainer, ContextId::GLOBAL, span())
            .unwrap();
        let q1 = s
            .resolve_indexed_identifier(span(), "q", &IndexExpr::Literal(1))
            .unwrap();

        let element = &s.table()[q1];
        assert_eq!(element.kind(), SymbolKind::Qubit);
        assert_eq!(element.bits(), 1);
        assert_eq!(element.reference().map(|r| r.base), Some(q));
        assert_eq!(s.table().name_of(q1), "q[1]");
    }

    #[test]
    fn test_element_handle_is_cached() {
        let mut s = session();
        s.declare_local("r", 4, SymbolKind::QubitContainer, ContextId::GLOBAL, span())
            .unwrap();
        let first = s
            .resolve_indexed_identifier(span(), "r", &IndexExpr::Literal(2))
            .unwrap();
        let second = s
            .resolve_indexed_identifier(span(), "r", &IndexExpr::Literal(2))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_literal() {
        let mut s = session();
        s.declare_local("c", 2, SymbolKind::Bitset, ContextId::GLOBAL, span())
            .unwrap();
        let bad = s
            .resolve_indexed_identifier(span(), "c", &IndexExpr::Literal(2))
            .unwrap();

        assert_eq!(s.table()[bad].kind(), SymbolKind::Undefined);
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::IndexOutOfRange), 1);
    }

    #[test]
    fn test_identifier_index_must_be_integer() {
        let mut s = session();
        s.declare_local("q", 4, SymbolKind::QubitContainer, ContextId::GLOBAL, span())
            .unwrap();
        s.declare_local("f", 32, SymbolKind::Float, ContextId::GLOBAL, span())
            .unwrap();
        s.declare_local("i", 32, SymbolKind::Int, ContextId::GLOBAL, span())
            .unwrap();

        let ok = s
            .resolve_indexed_identifier(span(), "q", &IndexExpr::Identifier("i".into()))
            .unwrap();
        assert_eq!(s.table()[ok].kind(), SymbolKind::Qubit);

        s.resolve_indexed_identifier(span(), "q", &IndexExpr::Identifier("f".into()))
            .unwrap();
        let diagnostics = s.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "no integer constant expression entry was found in the symbol table for identifier 'f'"
        );
    }

    #[test]
    fn test_multi_dimensional_unsupported() {
        let mut s = session();
        s.declare_local("a", 4, SymbolKind::IntArray, ContextId::GLOBAL, span())
            .unwrap();
        let index = IndexExpr::Multi(vec![IndexExpr::Literal(1), IndexExpr::Literal(2)]);
        let id = s.resolve_indexed_identifier(span(), "a", &index).unwrap();

        assert_eq!(s.table().name_of(id), "a[1][2]");
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::UnsupportedSubscript), 1);
    }

    #[test]
    fn test_array_elements_are_materialized() {
        let mut s = session();
        let a = s
            .declare_local("a", 4, SymbolKind::IntArray, ContextId::GLOBAL, span())
            .unwrap();
        assert_eq!(s.table()[a].reference_count(), 4);

        let single = IndexExpr::Multi(vec![IndexExpr::Literal(3)]);
        let third = s.resolve_indexed_identifier(span(), "a", &single).unwrap();
        assert_eq!(s.table()[a].reference_for(&IndexKey::Literal(3)), Some(third));
        assert_eq!(s.table()[third].kind(), SymbolKind::Int);
    }

    #[test]
    fn test_angle_component_access() {
        let mut s = session();
        let theta = s
            .declare_local("theta", 64, SymbolKind::Angle, ContextId::GLOBAL, span())
            .unwrap();
        let part = s
            .resolve_indexed_identifier(span(), "theta", &IndexExpr::Literal(2))
            .unwrap();

        assert_eq!(s.table()[theta].reference_for(&IndexKey::Literal(2)), Some(part));
        assert!(s.table().is_filed_in(part, Subtable::Angle));

        s.resolve_indexed_identifier(span(), "theta", &IndexExpr::Literal(4))
            .unwrap();
        assert_eq!(s.diagnostics().count_code(DiagnosticCode::IndexOutOfRange), 1);
    }

    #[test]
    fn test_reference_shares_base_value() {
        let mut s = session();
        let q = s
            .declare_local("q", 2, SymbolKind::QubitContainer, ContextId::GLOBAL, span())
            .unwrap();
        let q0 = s
            .resolve_indexed_identifier(span(), "q", &IndexExpr::Literal(0))
            .unwrap();
        let value = crate::sema::value::ValueId::new(99);
        s.attach_value(q0, value);

        assert_eq!(s.value_of(q), Some(value));
        assert_eq!(s.value_of(q0), Some(value));
    }

    #[test]
    fn test_local_register_elements_released_on_close() {
        let mut s = session();
        let ctx = s.open_scope(ContextKind::If).unwrap();
        s.state_mut().lbrace();
        s.declare_local("tmp", 2, SymbolKind::Bitset, ctx, span())
            .unwrap();
        let elem = s
            .resolve_indexed_identifier(span(), "tmp", &IndexExpr::Literal(1))
            .unwrap();
        s.close_scope(ctx).unwrap();

        assert_eq!(s.table()[elem].home(), None);
        assert!(s.lookup_any("tmp").is_none());
    }
}
