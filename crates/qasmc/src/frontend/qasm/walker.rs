//! Statement walker
//!
//! Recursive descent over the declaration-relevant subset of OpenQASM 3.
//! The walker builds no AST: it feeds what it scans to a [`Session`] the
//! way grammar actions would, keeping the parser-state flags current,
//! routing typed declarations to `declare_local`, names to the resolvers
//! and opening and closing a context for every block.

use tracing::debug;

use super::scanner::Scanner;
use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};
use crate::sema::reserved;
use crate::sema::{ContextId, ContextKind, IndexExpr, PendingHeader, Session, SymbolId};
use crate::types::width;
use crate::types::SymbolKind;

/// Gates declared by `include "stdgates.inc"`
const STANDARD_GATES: [&str; 30] = [
    "p", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "rx", "ry", "rz", "cx", "cy", "cz",
    "cp", "crx", "cry", "crz", "ch", "swap", "ccx", "cswap", "cu", "CX", "phase", "cphase", "id",
    "u3",
];

/// Gate modifiers that may precede a gate call (`ctrl @ x q0, q1;`)
const MODIFIERS: [&str; 4] = ["ctrl", "negctrl", "inv", "pow"];

pub struct Walker<'s, 'a> {
    scanner: Scanner<'a>,
    source: &'a str,
    current: Token,
    last_end: usize,
    session: &'s mut Session,
    /// Declarations of the current statement, checked at its end
    pending: Vec<(SymbolId, Span)>,
    /// Declared kind while an initializer is being read
    initializer: Option<SymbolKind>,
}

impl<'s, 'a> Walker<'s, 'a> {
    pub fn new(source: &'a str, session: &'s mut Session) -> CompileResult<Self> {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token()?;
        Ok(Self {
            scanner,
            source,
            current,
            last_end: 0,
            session,
            pending: Vec::new(),
            initializer: None,
        })
    }

    /// Walk the whole program
    pub fn walk(&mut self) -> CompileResult<()> {
        while !self.at_end() {
            self.parse_statement()?;
            if !self.session.diagnostics().can_emit() {
                return Err(CompileError::TooManyErrors {
                    count: self.session.diagnostics().error_count(),
                });
            }
        }
        self.flush_pending();
        Ok(())
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    /// Consume the current token, recording parens and brackets
    fn advance(&mut self) -> CompileResult<Token> {
        let next = self.scanner.next_token()?;
        let prev = std::mem::replace(&mut self.current, next);
        self.last_end = prev.span.end;
        let state = self.session.state_mut();
        match prev.kind {
            TokenKind::LParen => state.lparen(),
            TokenKind::RParen => state.rparen(),
            TokenKind::LBracket => state.lbracket(),
            TokenKind::RBracket => state.rbracket(),
            _ => {}
        }
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                let token = self.advance()?;
                Ok((name, token.span))
            }
            other => Err(CompileError::parser(
                format!("expected identifier, found {}", other),
                self.current.span,
            )),
        }
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Identifier(_) | TokenKind::HardwareQubit(_)
        )
    }

    fn end_statement(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Semi)?;
        self.flush_pending();
        Ok(())
    }

    fn flush_pending(&mut self) {
        for (id, span) in std::mem::take(&mut self.pending) {
            self.session.check_declaration(id, span);
        }
    }

    // =========================================================================
    // Engine calls
    // =========================================================================

    /// Resolve a name with the next token as lookahead
    fn resolve(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        let next = lookahead_char(&self.current.kind);
        self.session.state_mut().set_lookahead(next);
        self.session.resolve_identifier(span, name)
    }

    /// Resolve a use of `name` and check it is defined and in scope.
    /// Skipped when resolution already reported an error for it.
    fn use_name(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        let before = self.session.diagnostics().error_count();
        let id = self.resolve(name, span)?;
        if self.session.diagnostics().error_count() == before
            && self.session.check_undefined(id, span)
        {
            self.session.check_out_of_scope(id, span);
        }
        Ok(id)
    }

    /// Declare `name` in the current context
    fn declare(
        &mut self,
        name: &str,
        bits: u32,
        kind: SymbolKind,
        span: Span,
    ) -> CompileResult<SymbolId> {
        if kind.is_pulse() && !self.session.scope().calibration_open() {
            // discovery reports the misplaced pulse declaration
            self.session.state_mut().set_current_kind(kind);
            return self.session.resolve_identifier(span, name);
        }
        let context = self.session.contexts().current();
        let id = self.session.declare_local(name, bits, kind, context, span)?;
        self.pending.push((id, span));
        Ok(id)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> CompileResult<()> {
        self.session.state_mut().reset();
        match self.current.kind.clone() {
            TokenKind::OpenQasm => self.parse_version(),
            TokenKind::Include => self.parse_include(),
            TokenKind::Pragma => self.parse_pragma(),
            TokenKind::Gate => self.parse_gate(),
            TokenKind::Defcal => self.parse_defcal(),
            TokenKind::Cal => self.parse_cal(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Extern => self.parse_extern(),
            TokenKind::If => self.parse_if(ContextKind::If),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Box => self.parse_box(),
            TokenKind::LBrace => self.parse_body(ContextKind::Other),
            TokenKind::Measure => {
                self.parse_expression()?;
                if self.match_token(&TokenKind::Arrow)? {
                    self.parse_operand()?;
                }
                self.end_statement()
            }
            TokenKind::Reset | TokenKind::Barrier => {
                self.advance()?;
                self.parse_operands()?;
                self.end_statement()
            }
            TokenKind::Delay => self.parse_delay(),
            TokenKind::Return => {
                self.advance()?;
                if !self.check(&TokenKind::Semi) {
                    self.parse_expression()?;
                }
                self.end_statement()
            }
            TokenKind::Break | TokenKind::Continue => {
                self.advance()?;
                self.end_statement()
            }
            TokenKind::Semi => {
                self.advance()?;
                Ok(())
            }
            TokenKind::Identifier(name) => self.parse_identifier_statement(name),
            kind if kind.is_type_keyword() => self.parse_declaration(),
            _ => {
                self.parse_expression()?;
                self.end_statement()
            }
        }
    }

    fn parse_version(&mut self) -> CompileResult<()> {
        self.advance()?;
        match self.current.kind {
            TokenKind::IntLiteral(_) | TokenKind::FloatLiteral(_) => {
                self.advance()?;
            }
            _ => {
                return Err(CompileError::parser(
                    format!("expected version number, found {}", self.current.kind),
                    self.current.span,
                ));
            }
        }
        self.end_statement()
    }

    fn parse_include(&mut self) -> CompileResult<()> {
        self.advance()?;
        let TokenKind::StringLiteral(path) = self.current.kind.clone() else {
            return Err(CompileError::parser(
                format!("expected include path, found {}", self.current.kind),
                self.current.span,
            ));
        };
        let token = self.advance()?;
        self.end_statement()?;

        if path.trim_matches('"') != "stdgates.inc" {
            debug!(path = %path, "include not read");
            return Ok(());
        }
        for gate in STANDARD_GATES {
            if self.session.lookup_any(gate).is_none() {
                self.session.declare_local(
                    gate,
                    width::GATE_BITS,
                    SymbolKind::Gate,
                    ContextId::GLOBAL,
                    token.span,
                )?;
            }
        }
        Ok(())
    }

    /// `pragma ...` runs to the end of its line
    fn parse_pragma(&mut self) -> CompileResult<()> {
        let start = self.advance()?.span.start;
        let line_end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |offset| start + offset);

        self.session.state_mut().open_pragma();
        while !self.at_end() && self.current.span.start < line_end && !self.check(&TokenKind::Semi) {
            if let TokenKind::Identifier(name) = self.current.kind.clone() {
                let token = self.advance()?;
                self.resolve(&name, token.span)?;
            } else {
                self.advance()?;
            }
        }
        self.session.state_mut().close_pragma();
        self.match_token(&TokenKind::Semi)?;
        Ok(())
    }

    fn parse_declaration(&mut self) -> CompileResult<()> {
        self.match_token(&TokenKind::Const)?;
        let legacy = match self.current.kind {
            TokenKind::Qreg => Some(SymbolKind::QubitContainer),
            TokenKind::Creg => Some(SymbolKind::Bitset),
            _ => None,
        };

        let (kind, bits, name, span) = if let Some(kind) = legacy {
            self.advance()?;
            let (name, span) = self.expect_identifier()?;
            let bits = self.parse_designator()?.unwrap_or(1);
            (kind, bits, name, span)
        } else {
            let (kind, bits) = self.parse_type()?;
            let (name, span) = self.expect_identifier()?;
            (kind, bits, name, span)
        };
        self.declare(&name, bits, kind, span)?;

        if self.match_token(&TokenKind::Eq)? {
            self.initializer = Some(kind);
            let result = self.parse_expression();
            self.initializer = None;
            result?;
        }
        self.end_statement()
    }

    /// A statement that starts with a name: gate call, assignment or
    /// expression
    fn parse_identifier_statement(&mut self, name: String) -> CompileResult<()> {
        if MODIFIERS.contains(&name.as_str()) {
            let next = self.scanner.peek()?.kind.clone();
            if matches!(next, TokenKind::At | TokenKind::LParen) {
                self.advance()?;
                if self.check(&TokenKind::LParen) {
                    self.parse_call_args()?;
                }
                self.expect(TokenKind::At)?;
                let gate = match self.current.kind.clone() {
                    TokenKind::Identifier(gate) => gate,
                    other => {
                        return Err(CompileError::parser(
                            format!("expected gate after modifier, found {}", other),
                            self.current.span,
                        ));
                    }
                };
                return self.parse_identifier_statement(gate);
            }
        }

        let token = self.advance()?;
        if self.starts_operand() {
            self.use_name(&name, token.span)?;
            self.parse_operands()?;
            return self.end_statement();
        }

        self.parse_name_use(&name, token.span)?;
        if self.starts_operand() {
            self.parse_operands()?;
        } else if self.current.kind.is_assignment_op() {
            self.advance()?;
            self.parse_expression()?;
        } else {
            self.parse_binary_tail()?;
        }
        self.end_statement()
    }

    fn parse_delay(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.expect(TokenKind::LBracket)?;
        self.session
            .state_mut()
            .set_kinds(SymbolKind::Undefined, SymbolKind::Delay);
        self.parse_expression()?;
        self.expect(TokenKind::RBracket)?;
        self.parse_operands()?;
        self.end_statement()
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// `gate name(angles) qubits { body }`
    fn parse_gate(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, span) = self.expect_identifier()?;
        let gate = self.session.declare_local(
            &name,
            width::GATE_BITS,
            SymbolKind::Gate,
            ContextId::GLOBAL,
            span,
        )?;
        self.session.check_declaration(gate, span);

        let context = self.session.open_scope(ContextKind::Gate)?;
        if self.match_token(&TokenKind::LParen)? {
            self.session.state_mut().start_angle_list();
            while !self.check(&TokenKind::RParen) {
                let (param, span) = self.expect_identifier()?;
                let id = self.resolve(&param, span)?;
                self.pending.push((id, span));
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            self.session.state_mut().stop_angle_list();
        }

        self.session.state_mut().start_qubit_list();
        loop {
            let (qubit, span) = self.expect_identifier()?;
            let id = self.resolve(&qubit, span)?;
            self.pending.push((id, span));
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.session.state_mut().stop_qubit_list();

        if !self.check(&TokenKind::LBrace) {
            return Err(CompileError::parser(
                format!("expected gate body, found {}", self.current.kind),
                self.current.span,
            ));
        }
        self.parse_scoped_body(context)
    }

    /// `defcal name(params) operands -> type { body }`
    fn parse_defcal(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, kind) = match self.current.kind.clone() {
            TokenKind::Measure => ("measure".to_string(), SymbolKind::DefcalMeasure),
            TokenKind::Reset => ("reset".to_string(), SymbolKind::DefcalReset),
            TokenKind::Identifier(name) => (name, SymbolKind::Defcal),
            other => {
                return Err(CompileError::parser(
                    format!("expected defcal name, found {}", other),
                    self.current.span,
                ));
            }
        };
        let span = self.advance()?.span;
        self.session.declare_local(
            &name,
            width::DEFCAL_BITS,
            kind,
            ContextId::GLOBAL,
            span,
        )?;

        let context = self.session.open_scope(ContextKind::Defcal)?;
        if self.match_token(&TokenKind::LParen)? {
            while !self.check(&TokenKind::RParen) {
                if self.current.kind.is_type_keyword() {
                    self.parse_parameter()?;
                } else {
                    self.parse_expression()?;
                }
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        self.session.state_mut().start_qubit_list();
        while self.starts_operand() {
            if let TokenKind::Identifier(qubit) = self.current.kind.clone() {
                let span = self.advance()?.span;
                let id = self.resolve(&qubit, span)?;
                self.pending.push((id, span));
            } else {
                self.advance()?;
            }
            self.match_token(&TokenKind::Comma)?;
        }
        self.session.state_mut().stop_qubit_list();

        if self.match_token(&TokenKind::Arrow)? {
            self.parse_type()?;
        }
        self.parse_scoped_body(context)
    }

    /// `cal { body }` runs in the shared calibration context
    fn parse_cal(&mut self) -> CompileResult<()> {
        self.advance()?;
        if !self.check(&TokenKind::LBrace) {
            return Err(CompileError::parser(
                format!("expected '{{' after cal, found {}", self.current.kind),
                self.current.span,
            ));
        }
        let context = self.session.enter_calibration();
        self.parse_scoped_body(context)
    }

    /// `def name(typed params) -> type { body }`
    fn parse_def(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, span) = self.expect_identifier()?;
        let function = self.session.declare_local(
            &name,
            width::FUNCTION_BITS,
            SymbolKind::Function,
            ContextId::GLOBAL,
            span,
        )?;
        self.session.check_declaration(function, span);

        let context = self.session.open_scope(ContextKind::Function)?;
        self.expect(TokenKind::LParen)?;
        while !self.check(&TokenKind::RParen) {
            self.parse_parameter()?;
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        if self.match_token(&TokenKind::Arrow)? {
            self.parse_type()?;
        }
        self.parse_scoped_body(context)
    }

    /// `extern name(types) -> type;`
    fn parse_extern(&mut self) -> CompileResult<()> {
        self.advance()?;
        let (name, span) = self.expect_identifier()?;
        self.session.declare_local(
            &name,
            width::FUNCTION_BITS,
            SymbolKind::Extern,
            ContextId::GLOBAL,
            span,
        )?;

        self.expect(TokenKind::LParen)?;
        while !self.check(&TokenKind::RParen) {
            self.parse_type()?;
            if self.check(&TokenKind::Identifier(String::new())) {
                self.advance()?;
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        if self.match_token(&TokenKind::Arrow)? {
            self.parse_type()?;
        }
        self.end_statement()
    }

    /// Typed parameter of a `def` or `defcal`, declared in the context
    /// being opened
    fn parse_parameter(&mut self) -> CompileResult<()> {
        let (kind, bits) = self.parse_type()?;
        let (name, span) = self.expect_identifier()?;
        self.declare(&name, bits, kind, span)?;
        Ok(())
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn parse_if(&mut self, kind: ContextKind) -> CompileResult<()> {
        self.advance()?;
        self.expect(TokenKind::LParen)?;
        self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.parse_body(kind)?;

        if self.match_token(&TokenKind::Else)? {
            if self.check(&TokenKind::If) {
                return self.parse_if(ContextKind::ElseIf);
            }
            self.session.state_mut().reset();
            self.parse_body(ContextKind::Else)?;
        }
        Ok(())
    }

    fn parse_while(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.session
            .state_mut()
            .set_header(Some(PendingHeader::While));
        self.expect(TokenKind::LParen)?;
        self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.session.state_mut().set_header(None);
        self.parse_body(ContextKind::While)
    }

    /// `for T? name in iterable body`. The loop variable belongs to the
    /// loop's own context.
    fn parse_for(&mut self) -> CompileResult<()> {
        self.advance()?;
        let context = self.session.open_scope(ContextKind::For)?;
        self.session.state_mut().set_header(Some(PendingHeader::For));
        if self.current.kind.is_type_keyword() {
            let (kind, _) = self.parse_type()?;
            self.session.state_mut().set_current_kind(kind);
        }
        let (var, span) = self.expect_identifier()?;
        let id = self.resolve(&var, span)?;
        self.pending.push((id, span));
        self.session.state_mut().set_header(None);

        self.expect(TokenKind::In)?;
        self.parse_expression()?;
        self.parse_scoped_body(context)
    }

    fn parse_box(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.match_token(&TokenKind::LBracket)? {
            self.parse_expression()?;
            self.expect(TokenKind::RBracket)?;
        }
        self.parse_body(ContextKind::Box)
    }

    fn parse_body(&mut self, kind: ContextKind) -> CompileResult<()> {
        let context = self.session.open_scope(kind)?;
        self.parse_scoped_body(context)
    }

    /// Braced block or single statement, then close `context`
    fn parse_scoped_body(&mut self, context: ContextId) -> CompileResult<()> {
        if self.match_token(&TokenKind::LBrace)? {
            self.session.state_mut().lbrace();
            while !self.check(&TokenKind::RBrace) {
                if self.at_end() {
                    return Err(CompileError::parser(
                        "expected '}', found end of file",
                        self.current.span,
                    ));
                }
                self.parse_statement()?;
            }
            self.advance()?;
            self.session.state_mut().rbrace();
        } else {
            self.parse_statement()?;
        }
        self.flush_pending();
        self.session.close_scope(context)
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Scalar, register or array type, as (kind, width). Arrays carry their
    /// length as width.
    fn parse_type(&mut self) -> CompileResult<(SymbolKind, u32)> {
        self.match_token(&TokenKind::Const)?;
        let token = self.advance()?;
        let ty = match token.kind {
            TokenKind::Qubit | TokenKind::Qreg => match self.parse_designator()? {
                Some(n) => (SymbolKind::QubitContainer, n),
                None => (SymbolKind::Qubit, width::QUBIT_BITS),
            },
            TokenKind::Bit | TokenKind::Creg => {
                (SymbolKind::Bitset, self.parse_designator()?.unwrap_or(1))
            }
            TokenKind::Bool => (SymbolKind::Bool, SymbolKind::Bool.default_bits()),
            TokenKind::Int => sized_integer(
                SymbolKind::Int,
                SymbolKind::MpInteger,
                self.parse_designator()?,
            ),
            TokenKind::UInt => sized_integer(
                SymbolKind::UInt,
                SymbolKind::MpUInteger,
                self.parse_designator()?,
            ),
            TokenKind::Float => match self.parse_designator()? {
                Some(n) if n <= width::FLOAT_BITS => (SymbolKind::Float, n),
                Some(n) if n <= width::DOUBLE_BITS => (SymbolKind::Double, n),
                Some(n) => (SymbolKind::MpDecimal, n),
                None => (SymbolKind::Double, width::DOUBLE_BITS),
            },
            TokenKind::Angle => (
                SymbolKind::Angle,
                self.parse_designator()?.unwrap_or(width::ANGLE_BITS),
            ),
            TokenKind::Complex => {
                let bits = if self.match_token(&TokenKind::LBracket)? {
                    let (_, bits) = self.parse_type()?;
                    self.expect(TokenKind::RBracket)?;
                    bits
                } else {
                    width::MP_DEFAULT_BITS
                };
                (SymbolKind::MpComplex, bits)
            }
            TokenKind::Duration => (SymbolKind::Duration, width::DURATION_BITS),
            TokenKind::Stretch => (SymbolKind::Stretch, width::DURATION_BITS),
            TokenKind::Frame => (SymbolKind::Frame, width::FRAME_BITS),
            TokenKind::Port => (SymbolKind::Port, width::PORT_BITS),
            TokenKind::Waveform => (SymbolKind::Waveform, width::WAVEFORM_BITS),
            TokenKind::Array => {
                self.expect(TokenKind::LBracket)?;
                let (element, _) = self.parse_type()?;
                self.expect(TokenKind::Comma)?;
                let len = self.parse_size()?;
                while self.match_token(&TokenKind::Comma)? {
                    self.parse_size()?;
                }
                self.expect(TokenKind::RBracket)?;
                let kind = element.array_of().unwrap_or(SymbolKind::Array);
                (kind, len.unwrap_or(width::UNKNOWN_BITS))
            }
            other => {
                return Err(CompileError::parser(
                    format!("expected type, found {}", other),
                    token.span,
                ));
            }
        };
        Ok(ty)
    }

    /// Optional `[N]`. A non-literal size is read as an expression and
    /// yields `None`.
    fn parse_designator(&mut self) -> CompileResult<Option<u32>> {
        if !self.match_token(&TokenKind::LBracket)? {
            return Ok(None);
        }
        let size = self.parse_size()?;
        self.expect(TokenKind::RBracket)?;
        Ok(size)
    }

    fn parse_size(&mut self) -> CompileResult<Option<u32>> {
        if let TokenKind::IntLiteral(text) = self.current.kind.clone() {
            let next = self.scanner.peek()?.kind.clone();
            if matches!(next, TokenKind::RBracket | TokenKind::Comma) {
                let token = self.advance()?;
                let size = text.parse::<u32>().map_err(|_| {
                    CompileError::parser(format!("size '{}' is out of range", text), token.span)
                })?;
                return Ok(Some(size));
            }
        }
        self.parse_expression()?;
        Ok(None)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> CompileResult<()> {
        self.parse_unary()?;
        self.parse_binary_tail()
    }

    /// Operators and operands following an already read operand. Colons
    /// join range bounds.
    fn parse_binary_tail(&mut self) -> CompileResult<()> {
        while self.current.kind.is_binary_op() || self.check(&TokenKind::Colon) {
            self.advance()?;
            self.parse_unary()?;
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> CompileResult<()> {
        match self.current.kind {
            TokenKind::Minus => {
                let minus = self.advance()?;
                if let TokenKind::Identifier(name) = self.current.kind.clone() {
                    if reserved::is_reserved_constant(&name) {
                        let token = self.advance()?;
                        self.use_name(&format!("-{}", name), minus.span.merge(token.span))?;
                        return Ok(());
                    }
                }
                self.parse_unary()
            }
            TokenKind::Bang | TokenKind::Tilde => {
                self.advance()?;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> CompileResult<()> {
        match self.current.kind.clone() {
            TokenKind::LParen => {
                self.advance()?;
                self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
            }
            TokenKind::IntLiteral(_)
            | TokenKind::FloatLiteral(_)
            | TokenKind::TimingLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::HardwareQubit(_)
            | TokenKind::True
            | TokenKind::False => {
                self.advance()?;
            }
            TokenKind::Identifier(name) => {
                let token = self.advance()?;
                self.parse_name_use(&name, token.span)?;
            }
            TokenKind::Measure => {
                self.advance()?;
                self.parse_operand()?;
            }
            // range `[a:b:c]`
            TokenKind::LBracket => {
                self.advance()?;
                if !self.check(&TokenKind::RBracket) {
                    self.parse_expression()?;
                }
                self.expect(TokenKind::RBracket)?;
            }
            // set `{a, b}`
            TokenKind::LBrace => {
                self.advance()?;
                while !self.check(&TokenKind::RBrace) {
                    self.parse_expression()?;
                    if !self.match_token(&TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace)?;
            }
            // cast `int[8](x)`
            kind if kind.is_type_keyword() => {
                self.parse_type()?;
                self.parse_call_args()?;
            }
            other => {
                return Err(CompileError::parser(
                    format!("expected expression, found {}", other),
                    self.current.span,
                ));
            }
        }
        Ok(())
    }

    /// A name already consumed, with its postfix: subscripts, a member
    /// suffix or a call
    fn parse_name_use(&mut self, name: &str, span: Span) -> CompileResult<SymbolId> {
        if self.initializer == Some(SymbolKind::MpDecimal) && reserved::is_reserved_constant(name)
        {
            self.session
                .state_mut()
                .set_current_kind(SymbolKind::MpDecimal);
        }
        let id = self.use_name(name, span)?;

        if self.check(&TokenKind::LBracket) {
            let index = self.parse_subscripts()?;
            let span = span.merge(Span::new(span.start, self.last_end));
            return self.session.resolve_indexed_identifier(span, name, &index);
        }
        if self.match_token(&TokenKind::Dot)? {
            let (suffix, suffix_span) = self.expect_identifier()?;
            self.session.check_reserved_suffix(id, &suffix, suffix_span);
        }
        if self.check(&TokenKind::LParen) {
            self.parse_call_args()?;
        }
        Ok(id)
    }

    /// One or more `[...]` groups
    fn parse_subscripts(&mut self) -> CompileResult<IndexExpr> {
        let mut parts = Vec::new();
        while self.match_token(&TokenKind::LBracket)? {
            loop {
                parts.push(self.parse_subscript()?);
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect(TokenKind::RBracket)?;
        }
        Ok(match <[IndexExpr; 1]>::try_from(parts) {
            Ok([only]) => only,
            Err(parts) => IndexExpr::Multi(parts),
        })
    }

    fn parse_subscript(&mut self) -> CompileResult<IndexExpr> {
        let start = self.current.span.start;
        let next = self.scanner.peek()?.kind.clone();
        let single = matches!(next, TokenKind::RBracket | TokenKind::Comma);

        match self.current.kind.clone() {
            TokenKind::IntLiteral(text) if single => {
                let token = self.advance()?;
                let value = text.parse::<u32>().map_err(|_| {
                    CompileError::parser(format!("index '{}' is out of range", text), token.span)
                })?;
                Ok(IndexExpr::Literal(value))
            }
            TokenKind::Identifier(name) if single => {
                let token = self.advance()?;
                self.use_name(&name, token.span)?;
                Ok(IndexExpr::Identifier(name))
            }
            _ => {
                self.parse_expression()?;
                let text = self.source[start..self.last_end].trim().to_string();
                Ok(IndexExpr::Expression(text))
            }
        }
    }

    fn parse_call_args(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::LParen)?;
        while !self.check(&TokenKind::RParen) {
            self.parse_expression()?;
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(())
    }

    /// Qubit operand: `q`, `q[1]` or `$0`
    fn parse_operand(&mut self) -> CompileResult<()> {
        match self.current.kind.clone() {
            TokenKind::HardwareQubit(_) => {
                self.advance()?;
            }
            TokenKind::Identifier(name) => {
                let token = self.advance()?;
                self.parse_name_use(&name, token.span)?;
            }
            other => {
                return Err(CompileError::parser(
                    format!("expected qubit operand, found {}", other),
                    self.current.span,
                ));
            }
        }
        Ok(())
    }

    fn parse_operands(&mut self) -> CompileResult<()> {
        while self.starts_operand() {
            self.parse_operand()?;
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(())
    }
}

fn sized_integer(plain: SymbolKind, wide: SymbolKind, bits: Option<u32>) -> (SymbolKind, u32) {
    match bits {
        Some(n) if n > width::LONG_BITS => (wide, n),
        Some(n) => (plain, n),
        None => (plain, plain.default_bits()),
    }
}

/// Character the parser would see after an identifier
fn lookahead_char(kind: &TokenKind) -> Option<char> {
    let c = match kind {
        TokenKind::LParen => '(',
        TokenKind::RParen => ')',
        TokenKind::LBracket => '[',
        TokenKind::RBracket => ']',
        TokenKind::LBrace => '{',
        TokenKind::RBrace => '}',
        TokenKind::Semi => ';',
        TokenKind::Comma => ',',
        TokenKind::Eq => '=',
        TokenKind::Colon => ':',
        TokenKind::Dot => '.',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DiagnosticCode;
    use crate::sema::{IndexKey, SessionConfig, Subtable};
    use pretty_assertions::assert_eq;

    fn walk(source: &str) -> Session {
        let mut session = Session::new(SessionConfig::default());
        Walker::new(source, &mut session)
            .and_then(|mut walker| walker.walk())
            .unwrap();
        session
    }

    fn count(session: &Session, code: DiagnosticCode) -> usize {
        session.diagnostics().count_code(code)
    }

    #[test]
    fn test_register_element_operand() {
        let s = walk("OPENQASM 3.0;\nqubit[3] q;\nU(0, 0, 0) q[1];\n");
        assert!(s.diagnostics().is_empty());

        let q = s.lookup_any("q").unwrap();
        let element = s.table()[q].reference_for(&IndexKey::Literal(1)).unwrap();
        assert_eq!(s.table()[element].kind(), SymbolKind::Qubit);
        assert_eq!(s.table().name_of(element), "q[1]");
    }

    #[test]
    fn test_gate_parameters_released_after_body() {
        let s = walk("gate rz(θ) q { U(0, 0, θ) q; }\n");
        assert!(s.diagnostics().is_empty());

        let rz = s.lookup_any("rz").unwrap();
        assert_eq!(s.table()[rz].kind(), SymbolKind::Gate);
        assert_eq!(s.table()[rz].context(), ContextId::GLOBAL);
        assert!(s.lookup_any("θ").is_none());
    }

    #[test]
    fn test_nested_redeclaration() {
        let s = walk("int x;\nif (true) { int x; x = 2; }\nx = 1;\n");
        assert!(s.diagnostics().is_empty());

        let x = s.lookup_any("x").unwrap();
        assert_eq!(s.table()[x].context(), ContextId::GLOBAL);
        assert_eq!(s.table()[x].kind(), SymbolKind::Int);
    }

    #[test]
    fn test_undefined_name_reported_once() {
        let s = walk("bit c;\nc = y;\n");
        assert_eq!(count(&s, DiagnosticCode::UndefinedIdentifier), 1);
    }

    #[test]
    fn test_gate_needs_declaration() {
        let s = walk("qubit q;\nh q;\n");
        assert_eq!(count(&s, DiagnosticCode::UndefinedIdentifier), 1);

        let s = walk("include \"stdgates.inc\";\nqubit q;\nh q;\ncx q, q;\n");
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_unknown_name_in_while_condition() {
        let s = walk("while (ready) { }\n");
        let diagnostics: Vec<_> = s.diagnostics().iter().collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "unknown identifier 'ready' in while condition"
        );
    }

    #[test]
    fn test_for_loop_variable() {
        let s = walk("qubit[4] q;\nfor int i in [0:3] { U(0, 0, 0) q[i]; }\n");
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_pulse_declarations_need_calibration() {
        let s = walk("cal { frame f; f.phase = 0; }\n");
        assert!(s.diagnostics().is_empty());

        let s = walk("frame g;\n");
        assert_eq!(count(&s, DiagnosticCode::PulseContext), 1);
    }

    #[test]
    fn test_calibration_frame_not_visible_from_global() {
        let s = walk("cal { frame drive; }\n");
        assert!(s.diagnostics().is_empty());

        let drive = s.lookup_any("drive").unwrap();
        let bits = s.table()[drive].bits();
        assert_eq!(s.table()[drive].kind(), SymbolKind::Frame);
        assert_eq!(s.table().lookup("drive", bits, SymbolKind::Frame), Some(drive));
        assert_eq!(s.lookup("drive", bits, SymbolKind::Frame), None);
    }

    #[test]
    fn test_invalid_member_suffix() {
        let s = walk("cal { frame f; f.amp = 1; }\n");
        assert_eq!(count(&s, DiagnosticCode::InvalidSuffix), 1);
    }

    #[test]
    fn test_index_out_of_range() {
        let s = walk("qubit[2] q;\nreset q[5];\n");
        assert_eq!(count(&s, DiagnosticCode::IndexOutOfRange), 1);
    }

    #[test]
    fn test_duplicate_declaration() {
        let s = walk("int a;\nint a;\n");
        assert_eq!(count(&s, DiagnosticCode::DuplicateDeclaration), 1);
    }

    #[test]
    fn test_defcal_overloads() {
        let s = walk(
            "defcal rz(angle[20] θ) $0 { }\n\
             defcal rz(angle[20] θ) $1 { }\n",
        );
        assert!(s.diagnostics().is_empty());

        let group = s.table().lookup_in("rz", Subtable::DefcalGroup).unwrap();
        assert_eq!(s.table().group_members(group).len(), 2);
    }

    #[test]
    fn test_constant_initializer_precision() {
        let s = walk("float[128] x = pi;\n");
        assert!(s.diagnostics().is_empty());

        let x = s.lookup_any("x").unwrap();
        assert_eq!(s.table()[x].kind(), SymbolKind::MpDecimal);
        let wide = s
            .lookup_range("pi")
            .into_iter()
            .any(|id| s.table()[id].kind() == SymbolKind::MpDecimal);
        assert!(wide);
    }

    #[test]
    fn test_pragma_names() {
        let s = walk("pragma qasmc verbatim\nqubit q;\n");
        assert!(s.diagnostics().is_empty());

        let verbatim = s.lookup_any("verbatim").unwrap();
        assert_eq!(s.table()[verbatim].kind(), SymbolKind::Pragma);
    }

    #[test]
    fn test_missing_semicolon() {
        let mut session = Session::new(SessionConfig::default());
        let err = Walker::new("qubit q", &mut session)
            .and_then(|mut walker| walker.walk())
            .unwrap_err();
        assert!(matches!(err, CompileError::Parser { .. }));
    }
}
