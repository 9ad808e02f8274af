//! OpenQASM 3 frontend
//!
//! - Lexing OpenQASM source into tokens
//! - Walking statements and declarations
//! - Resolving identifiers through a [`Session`]

pub mod scanner;
pub mod token;
pub mod walker;

use tracing::{debug, info};

use crate::frontend::{Analysis, CompileContext, Frontend, FrontendConfig};
use crate::common::CompileResult;
use crate::sema::Session;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
pub use walker::Walker;

/// OpenQASM frontend
pub struct QasmFrontend;

impl QasmFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for QasmFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for QasmFrontend {
    fn name(&self) -> &'static str {
        "qasm"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".qasm", ".inc"]
    }

    fn analyze(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<Analysis> {
        // Phase 1: Lexing (optional token dump)
        let tokens = if config.dump_tokens {
            match self.dump_tokens(source) {
                Ok(dump) => Some(dump),
                Err(e) => {
                    ctx.reporter.report_error(ctx.file_id, &e);
                    return Err(e);
                }
            }
        } else {
            None
        };

        // Phase 2: Walking and resolution
        info!(file = %ctx.filename, "resolving identifiers");
        let mut session = Session::new(config.session.clone());
        let walked = Walker::new(source, &mut session).and_then(|mut walker| walker.walk());
        if let Err(e) = walked {
            ctx.reporter.report_error(ctx.file_id, &e);
            return Err(e);
        }

        debug!(
            symbols = session.table().len(),
            contexts = session.contexts().len(),
            errors = session.diagnostics().error_count(),
            "analysis finished"
        );
        Ok(Analysis { session, tokens })
    }

    fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let tokens = Scanner::new(source).tokenize_all()?;
        let mut output = String::new();
        for token in &tokens {
            output.push_str(&format!("{:?}\n", token));
        }
        Ok(output)
    }
}
