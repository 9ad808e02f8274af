//! qasmc - identifier resolution and symbol tables for OpenQASM 3
//!
//! Every name an OpenQASM program mentions is resolved to a typed symbol:
//! declarations are bound in the context that owns them, uses are matched
//! against the visible bindings, and anything the grammar leaves implicit
//! (gate parameters, angle names, loop variables, register elements) is
//! inferred from the parser state.
//!
//! ## Architecture
//!
//! - **Sema** (`sema/`): context tree, symbol table, type discovery and
//!   scope checks, owned by a [`Session`]
//! - **Frontends** (`frontend/`): lexing and a statement walker that drives
//!   the session
//! - **Driver** (`driver/`): frontend selection and diagnostic reporting
//! - **Common** (`common/`): errors, diagnostics, spans
//! - **Types** (`types/`): symbol kinds and widths

pub mod common;
pub mod driver;
pub mod frontend;
pub mod logging;
pub mod sema;
pub mod types;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, Diagnostic, DiagnosticCode, DiagnosticReporter, Span};
pub use frontend::{Analysis, CompileContext, Frontend, FrontendConfig, FrontendRegistry};
pub use sema::{Session, SessionConfig};
pub use types::SymbolKind;
