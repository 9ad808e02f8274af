//! Identifier resolution and symbol tables
//!
//! A [`Session`] owns the context tree, the symbol table, the parser state
//! flags and the diagnostics sink. The parser drives it through
//! [`Session::resolve_identifier`], [`Session::resolve_indexed_identifier`],
//! [`Session::declare_local`] and the scope open/close calls.

mod builder;
mod context;
mod discovery;
mod index;
pub mod reserved;
mod scope;
mod session;
mod state;
mod symbol;
mod table;
mod value;

pub use builder::IdentifierBuilder;
pub use context::{ContextError, ContextId, ContextKind, ContextTree, DeclarationContext};
pub use index::IndexExpr;
pub use scope::ScopeController;
pub use session::{Session, SessionConfig};
pub use state::{OpenBlock, ParserState, PendingHeader};
pub use symbol::{IndexKey, Name, Reference, Symbol, SymbolId, SymbolScope};
pub use table::{Selection, Subtable, SymbolTable, TableError};
pub use value::{Literal, NodeFactory, NodeRequest, OpaqueNode, OpaqueNodes, ValueId};
