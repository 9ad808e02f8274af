//! Symbol kinds and their bit widths
//!
//! The engine never inspects AST node types directly. Everything it needs
//! to know about a binding's type is captured by [`SymbolKind`] plus a
//! bit width.

mod kind;
pub mod width;

pub use kind::SymbolKind;
