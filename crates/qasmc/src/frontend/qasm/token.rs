//! Token definitions for OpenQASM 3

use crate::common::Span;
use logos::Logos;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All token kinds the declaration walker understands
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum TokenKind {
    // === Headers ===
    #[token("OPENQASM")]
    OpenQasm,
    #[token("include")]
    Include,
    #[token("pragma")]
    #[token("#pragma")]
    Pragma,

    // === Definitions ===
    #[token("gate")]
    Gate,
    #[token("defcal")]
    Defcal,
    #[token("cal")]
    Cal,
    #[token("def")]
    Def,
    #[token("extern")]
    Extern,
    #[token("return")]
    Return,

    // === Control flow ===
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("box")]
    Box,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,

    // === Quantum statements ===
    #[token("measure")]
    Measure,
    #[token("reset")]
    Reset,
    #[token("barrier")]
    Barrier,
    #[token("delay")]
    Delay,

    // === Types ===
    #[token("const")]
    Const,
    #[token("qubit")]
    Qubit,
    #[token("qreg")]
    Qreg,
    #[token("creg")]
    Creg,
    #[token("bit")]
    Bit,
    #[token("bool")]
    Bool,
    #[token("int")]
    Int,
    #[token("uint")]
    UInt,
    #[token("float")]
    Float,
    #[token("angle")]
    Angle,
    #[token("complex")]
    Complex,
    #[token("duration")]
    Duration,
    #[token("stretch")]
    Stretch,
    #[token("frame")]
    Frame,
    #[token("port")]
    Port,
    #[token("waveform")]
    Waveform,
    #[token("array")]
    Array,

    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Literals ===
    #[regex(r"[0-9]+(\.[0-9]*)?(ns|us|µs|ms|s|dt)", |lex| lex.slice().to_string(), priority = 3)]
    TimingLiteral(String),
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    FloatLiteral(String),
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntLiteral(String),
    #[regex(r#""[^"]*""#, |lex| lex.slice().to_string())]
    StringLiteral(String),

    // === Names ===
    #[regex(r"[a-zA-Z_Α-ω][a-zA-Z0-9_Α-ω]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// Physical qubit operand, `$0`
    #[regex(r"\$[0-9]+", |lex| lex.slice().to_string())]
    HardwareQubit(String),

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,

    // Assignment
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token(":")]
    Colon,
    #[token("@")]
    At,

    // Special
    Eof,
}

impl TokenKind {
    /// Tokens that open a typed declaration
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Const
                | TokenKind::Qubit
                | TokenKind::Qreg
                | TokenKind::Creg
                | TokenKind::Bit
                | TokenKind::Bool
                | TokenKind::Int
                | TokenKind::UInt
                | TokenKind::Float
                | TokenKind::Angle
                | TokenKind::Complex
                | TokenKind::Duration
                | TokenKind::Stretch
                | TokenKind::Frame
                | TokenKind::Port
                | TokenKind::Waveform
                | TokenKind::Array
        )
    }

    pub fn is_assignment_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::AmpEq
                | TokenKind::PipeEq
                | TokenKind::CaretEq
        )
    }

    /// Binary operators accepted inside expressions
    pub fn is_binary_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::StarStar
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::AmpAmp
                | TokenKind::PipePipe
                | TokenKind::Amp
                | TokenKind::Pipe
                | TokenKind::Caret
                | TokenKind::LtLt
                | TokenKind::GtGt
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::HardwareQubit(s) => write!(f, "hardware qubit '{}'", s),
            TokenKind::IntLiteral(s) => write!(f, "integer '{}'", s),
            TokenKind::FloatLiteral(s) => write!(f, "float '{}'", s),
            TokenKind::TimingLiteral(s) => write!(f, "duration '{}'", s),
            TokenKind::StringLiteral(s) => write!(f, "string {}", s),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "{:?}", self),
        }
    }
}
