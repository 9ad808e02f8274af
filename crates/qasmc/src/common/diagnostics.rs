//! Diagnostics recorded by the semantic engine
//!
//! The engine never prints anything. Every warning and error it finds is
//! pushed into a [`Diagnostics`] sink, and the driver renders the collected
//! entries once the pass is over.

use std::fmt;

use super::Span;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Status,
    Info,
    Warning,
    Error,
    /// A broken engine invariant. Callers must stop processing.
    InternalError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Status => "status",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::InternalError => "internal error",
        };
        write!(f, "{}", s)
    }
}

/// Stable identifier for each condition the engine can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    UndefinedIdentifier,
    OutOfScope,
    TypeConflict,
    AmbiguousIdentifier,
    PointlessRedeclaration,
    InternalInvariant,
    DuplicateDeclaration,
    ShadowedDeclaration,
    InvalidSuffix,
    CalibrationContext,
    LocalScope,
    IndexNotInteger,
    IndexOutOfRange,
    UnsupportedSubscript,
    InductionVariable,
    PulseContext,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UndefinedIdentifier => "undefined-identifier",
            DiagnosticCode::OutOfScope => "out-of-scope",
            DiagnosticCode::TypeConflict => "type-conflict",
            DiagnosticCode::AmbiguousIdentifier => "ambiguous-identifier",
            DiagnosticCode::PointlessRedeclaration => "pointless-redeclaration",
            DiagnosticCode::InternalInvariant => "internal-invariant",
            DiagnosticCode::DuplicateDeclaration => "duplicate-declaration",
            DiagnosticCode::ShadowedDeclaration => "shadowed-declaration",
            DiagnosticCode::InvalidSuffix => "invalid-suffix",
            DiagnosticCode::CalibrationContext => "calibration-context",
            DiagnosticCode::LocalScope => "local-scope",
            DiagnosticCode::IndexNotInteger => "index-not-integer",
            DiagnosticCode::IndexOutOfRange => "index-out-of-range",
            DiagnosticCode::UnsupportedSubscript => "unsupported-subscript",
            DiagnosticCode::InductionVariable => "induction-variable",
            DiagnosticCode::PulseContext => "pulse-context",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single engine diagnostic with its source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, code, message, span)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, code, message, span)
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            Severity::InternalError,
            DiagnosticCode::InternalInvariant,
            message,
            span,
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] at {}: {}", self.severity, self.code, self.span, self.message)
    }
}

pub const DEFAULT_MAX_ERRORS: u32 = 64;

/// Accumulating diagnostic sink
///
/// Errors past `max_errors` are counted but not stored. Warnings and
/// notes are always stored.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    max_errors: u32,
    errors: u32,
    warnings: u32,
    internal: u32,
    suppressed: u32,
}

impl Diagnostics {
    pub fn new(max_errors: u32) -> Self {
        Self {
            entries: Vec::new(),
            max_errors: max_errors.max(1),
            errors: 0,
            warnings: 0,
            internal: 0,
            suppressed: 0,
        }
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::InternalError => self.internal += 1,
            Severity::Error => {
                if self.errors >= self.max_errors {
                    self.suppressed += 1;
                    return;
                }
                self.errors += 1;
            }
            Severity::Warning => self.warnings += 1,
            Severity::Status | Severity::Info => {}
        }
        self.entries.push(diagnostic);
    }

    /// True while no ICE was seen and the error limit is not reached
    pub fn can_emit(&self) -> bool {
        self.internal < 1 && self.errors < self.max_errors
    }

    pub fn error_count(&self) -> u32 {
        self.errors + self.suppressed
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings
    }

    pub fn internal_count(&self) -> u32 {
        self.internal
    }

    pub fn suppressed_count(&self) -> u32 {
        self.suppressed
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0 || self.internal > 0
    }

    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain stored entries. Counters are kept.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn undefined(name: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::UndefinedIdentifier,
            format!("unknown identifier '{}' at current scope", name),
            Span::new(0, name.len()),
        )
    }

    #[test]
    fn test_counts_by_severity() {
        let mut diags = Diagnostics::default();
        diags.emit(undefined("x"));
        diags.emit(Diagnostic::warning(
            DiagnosticCode::AmbiguousIdentifier,
            "ambiguous identifier 'y'",
            Span::default(),
        ));
        diags.emit(Diagnostic::new(
            Severity::Info,
            DiagnosticCode::ShadowedDeclaration,
            "note",
            Span::default(),
        ));

        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.len(), 3);
        assert!(diags.has_errors());
        assert!(diags.can_emit());
    }

    #[test]
    fn test_error_limit_suppresses() {
        let mut diags = Diagnostics::new(2);
        for name in ["a", "b", "c", "d"] {
            diags.emit(undefined(name));
        }

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.suppressed_count(), 2);
        assert_eq!(diags.error_count(), 4);
        assert!(!diags.can_emit());
    }

    #[test]
    fn test_internal_error_blocks_emission() {
        let mut diags = Diagnostics::default();
        diags.emit(Diagnostic::internal("symbol has no value", Span::default()));

        assert!(!diags.can_emit());
        assert_eq!(diags.internal_count(), 1);
        assert_eq!(diags.count_code(DiagnosticCode::InternalInvariant), 1);
    }

    #[test]
    fn test_take_keeps_counters() {
        let mut diags = Diagnostics::default();
        diags.emit(undefined("q"));
        let taken = diags.take();

        assert_eq!(taken.len(), 1);
        assert!(diags.is_empty());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_display_includes_code() {
        let text = undefined("q").to_string();
        assert_eq!(
            text,
            "error[undefined-identifier] at 0..1: unknown identifier 'q' at current scope"
        );
    }
}
