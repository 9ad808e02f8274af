//! Common infrastructure shared by the engine, the frontend and the driver

mod diagnostics;
mod error;
mod span;

pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity, DEFAULT_MAX_ERRORS};
pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use span::Span;
