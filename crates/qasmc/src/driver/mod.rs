//! Analysis driver and pipeline orchestration

use std::path::Path;

use tracing::debug;

use crate::common::{CompileError, CompileResult, DiagnosticReporter, Severity, Span};
use crate::frontend::{Analysis, CompileContext, Frontend, FrontendConfig, FrontendRegistry};

/// Counts left after a file has been analyzed and reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub errors: u32,
    pub warnings: u32,
    pub internal: u32,
}

impl Summary {
    /// Whether the run should exit non-zero
    pub fn failed(&self) -> bool {
        self.errors > 0 || self.internal > 0
    }
}

/// Pipeline that picks a frontend for a file and reports what it found
pub struct Pipeline {
    frontends: FrontendRegistry,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            frontends: FrontendRegistry::default(),
        }
    }

    pub fn register_frontend(&mut self, frontend: Box<dyn Frontend>) {
        self.frontends.register(frontend);
    }

    pub fn frontends(&self) -> &FrontendRegistry {
        &self.frontends
    }

    /// Analyze source code using the appropriate frontend
    pub fn analyze_source(
        &self,
        source: &str,
        filename: &str,
        frontend_name: Option<&str>,
        config: &FrontendConfig,
        reporter: &DiagnosticReporter,
        file_id: usize,
    ) -> CompileResult<Analysis> {
        let frontend = if let Some(name) = frontend_name {
            self.frontends.find_by_name(name)
        } else {
            // Auto-detect from file extension
            let ext = Path::new(filename)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e))
                .unwrap_or_default();
            self.frontends.find_by_extension(&ext)
        };

        let frontend = frontend.ok_or_else(|| {
            CompileError::semantic(
                format!("no frontend found for file: {}", filename),
                Span::default(),
            )
        })?;
        debug!(frontend = frontend.name(), filename, "frontend selected");

        let ctx = CompileContext::new(filename.to_string(), file_id, reporter);
        frontend.analyze(source, &ctx, config)
    }

    /// Print the diagnostics collected during analysis and count them
    pub fn report(
        &self,
        analysis: &mut Analysis,
        reporter: &DiagnosticReporter,
        file_id: usize,
    ) -> Summary {
        let mut summary = Summary::default();
        for diagnostic in analysis.session.take_diagnostics() {
            match diagnostic.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::InternalError => summary.internal += 1,
                Severity::Status | Severity::Info => {}
            }
            reporter.report(file_id, &diagnostic);
        }
        summary
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(filename: &str, source: &str) -> CompileResult<Summary> {
        let pipeline = Pipeline::new();
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file(filename, source);
        let config = FrontendConfig::default();
        let mut analysis =
            pipeline.analyze_source(source, filename, None, &config, &reporter, file_id)?;
        Ok(pipeline.report(&mut analysis, &reporter, file_id))
    }

    #[test]
    fn test_clean_file() {
        let summary = run("ok.qasm", "qubit q;\nU(0, 0, 0) q;\n").unwrap();
        assert_eq!(summary, Summary::default());
        assert!(!summary.failed());
    }

    #[test]
    fn test_errors_are_counted() {
        let summary = run("bad.qasm", "bit c;\nc = missing;\nint a;\nint a;\n").unwrap();
        assert_eq!(summary.errors, 2);
        assert!(summary.failed());
    }

    #[test]
    fn test_unknown_extension() {
        let err = run("prog.c", "int main;").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
