//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic as Report, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use super::{Diagnostic, Severity, Span};

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Semantic error at {span:?}: {message}")]
    Semantic { message: String, span: Span },

    /// A broken engine invariant (ICE). Not recoverable.
    #[error("Internal compiler error at {span:?}: {message}")]
    Internal { message: String, span: Span },

    #[error("Too many errors emitted ({count}), stopping now")]
    TooManyErrors { count: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal { .. })
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = match error {
            CompileError::Lexer { message, span } => Report::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Parser { message, span } => Report::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Semantic { message, span } => Report::error()
                .with_message("Semantic error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Internal { message, span } => Report::bug()
                .with_message("Internal compiler error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::TooManyErrors { count } => {
                Report::error().with_message(format!("too many errors emitted ({})", count))
            }

            CompileError::Io(err) => {
                Report::error().with_message(format!("IO error: {}", err))
            }
        };

        self.emit(&diagnostic);
    }

    /// Render an engine diagnostic against a registered file
    pub fn report(&self, file_id: usize, diagnostic: &Diagnostic) {
        let report = match diagnostic.severity {
            Severity::Status | Severity::Info => Report::note(),
            Severity::Warning => Report::warning(),
            Severity::Error => Report::error(),
            Severity::InternalError => Report::bug(),
        };
        let report = report
            .with_code(diagnostic.code.as_str())
            .with_message(diagnostic.message.clone())
            .with_labels(vec![Label::primary(file_id, diagnostic.span.range())]);

        self.emit(&report);
    }

    fn emit(&self, report: &Report<usize>) {
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, report);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
