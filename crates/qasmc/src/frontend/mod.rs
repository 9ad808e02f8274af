//! Frontend trait and implementations
//!
//! A frontend lexes a source file and walks its statements, driving a
//! [`Session`] that resolves every identifier it meets. The result is the
//! populated session: symbol table, context tree and diagnostics.

pub mod qasm;

use crate::common::{CompileResult, DiagnosticReporter};
use crate::sema::{Session, SessionConfig};

pub use qasm::QasmFrontend;

/// Configuration options passed to frontends
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_symbols: bool,
    pub dump_contexts: bool,
    pub verbose: bool,
    pub session: SessionConfig,
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

/// Outcome of analyzing one file
pub struct Analysis {
    pub session: Session,
    /// Token dump, when requested
    pub tokens: Option<String>,
}

/// Trait for language frontends
pub trait Frontend: Send + Sync {
    /// The name of this frontend (e.g. "qasm")
    fn name(&self) -> &'static str;

    /// File extensions this frontend handles (e.g. &[".qasm"])
    fn extensions(&self) -> &'static [&'static str];

    /// Resolve every identifier of `source`.
    ///
    /// Syntax errors abort the walk and come back as `Err`; semantic
    /// problems are left as diagnostics in the returned session.
    fn analyze(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<Analysis>;

    /// Optional: dump tokens for debugging
    fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let _ = source;
        Ok(String::new())
    }
}

/// Registry of available frontends
pub struct FrontendRegistry {
    frontends: Vec<Box<dyn Frontend>>,
}

impl FrontendRegistry {
    pub fn new() -> Self {
        Self { frontends: Vec::new() }
    }

    pub fn register(&mut self, frontend: Box<dyn Frontend>) {
        self.frontends.push(frontend);
    }

    pub fn find_by_extension(&self, ext: &str) -> Option<&dyn Frontend> {
        self.frontends.iter()
            .find(|f| f.extensions().iter().any(|e| *e == ext))
            .map(|f| f.as_ref())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&dyn Frontend> {
        self.frontends.iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }

    pub fn list(&self) -> impl Iterator<Item = &dyn Frontend> {
        self.frontends.iter().map(|f| f.as_ref())
    }
}

impl Default for FrontendRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(QasmFrontend::new()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_lookup() {
        let registry = FrontendRegistry::default();
        assert_eq!(registry.find_by_extension(".qasm").map(|f| f.name()), Some("qasm"));
        assert_eq!(registry.find_by_extension(".inc").map(|f| f.name()), Some("qasm"));
        assert!(registry.find_by_extension(".c").is_none());
        assert!(registry.find_by_name("qasm").is_some());
        assert_eq!(registry.list().count(), 1);
    }
}
