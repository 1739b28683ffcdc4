use crate::error::{Diagnostic, ErrorKind, Span};
use log::{debug, trace};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Dot,
    Colon,
    Semicolon,
    Comma,
    Question,
    Percent,
    Tilde,

    // One or two character tokens
    Plus,
    Increment,
    PlusEqual,
    Minus,
    Decrement,
    MinusEqual,
    Arrow,
    Star,
    Power,
    StarEqual,
    Slash,
    SlashEqual,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Ampersand,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    CaretCaret,
    Greater,
    GreaterEqual,
    RightShift,
    Less,
    LessEqual,
    LeftShift,

    // Literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,

    // Type keywords
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Char,
    String,
    Void,

    // Keywords
    Alloc,
    Break,
    Case,
    Cast,
    Const,
    Dealloc,
    Default,
    Else,
    Enum,
    Export,
    False,
    Fn,
    For,
    If,
    Import,
    Length,
    New,
    Null,
    Private,
    Println,
    Return,
    Sizeof,
    Struct,
    Switch,
    True,
    Typeof,
    Unsafe,
    While,

    // Special
    Error,
    Eof,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;

    HashMap::from([
        ("alloc", Alloc),
        ("bool", Bool),
        ("break", Break),
        ("case", Case),
        ("cast", Cast),
        ("char", Char),
        ("const", Const),
        ("dealloc", Dealloc),
        ("default", Default),
        ("else", Else),
        ("enum", Enum),
        ("export", Export),
        ("f32", F32),
        ("f64", F64),
        ("false", False),
        ("fn", Fn),
        ("for", For),
        ("i16", I16),
        ("i32", I32),
        ("i64", I64),
        ("i8", I8),
        ("if", If),
        ("import", Import),
        ("length", Length),
        ("new", New),
        ("null", Null),
        ("private", Private),
        ("println", Println),
        ("return", Return),
        ("sizeof", Sizeof),
        ("string", String),
        ("struct", Struct),
        ("switch", Switch),
        ("true", True),
        ("typeof", Typeof),
        ("u16", U16),
        ("u32", U32),
        ("u64", U64),
        ("u8", U8),
        ("unsafe", Unsafe),
        ("void", Void),
        ("while", While),
    ])
});

/// Look up a reserved word. Only an exact, whole-lexeme match counts.
pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS.get(text).copied()
}

/// Every reserved spelling, in no particular order.
pub fn keywords() -> impl Iterator<Item = (&'static str, TokenKind)> {
    KEYWORDS.iter().map(|(text, kind)| (*text, *kind))
}

impl TokenKind {
    /// Primitive type names usable in declarations, parameters and casts.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::I8
                | TokenKind::I16
                | TokenKind::I32
                | TokenKind::I64
                | TokenKind::U8
                | TokenKind::U16
                | TokenKind::U32
                | TokenKind::U64
                | TokenKind::F32
                | TokenKind::F64
                | TokenKind::Bool
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::Void
        )
    }

    pub fn is_keyword(&self) -> bool {
        self.is_type_keyword()
            || matches!(
                self,
                TokenKind::Alloc
                    | TokenKind::Break
                    | TokenKind::Case
                    | TokenKind::Cast
                    | TokenKind::Const
                    | TokenKind::Dealloc
                    | TokenKind::Default
                    | TokenKind::Else
                    | TokenKind::Enum
                    | TokenKind::Export
                    | TokenKind::False
                    | TokenKind::Fn
                    | TokenKind::For
                    | TokenKind::If
                    | TokenKind::Import
                    | TokenKind::Length
                    | TokenKind::New
                    | TokenKind::Null
                    | TokenKind::Private
                    | TokenKind::Println
                    | TokenKind::Return
                    | TokenKind::Sizeof
                    | TokenKind::Struct
                    | TokenKind::Switch
                    | TokenKind::True
                    | TokenKind::Typeof
                    | TokenKind::Unsafe
                    | TokenKind::While
            )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A token borrowing its text from the caller's source buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

impl<'src> Token<'src> {
    pub fn new(
        kind: TokenKind,
        lexeme: &'src str,
        span: Span,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            kind,
            lexeme,
            span,
            line,
            column,
        }
    }

    /// Human readable form for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Identifier => format!("identifier '{}'", self.lexeme),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => format!("number {}", self.lexeme),
            TokenKind::StringLiteral => format!("string {}", self.lexeme),
            TokenKind::CharLiteral => format!("character {}", self.lexeme),
            TokenKind::Error => format!("invalid token '{}'", self.lexeme),
            kind if kind.is_keyword() => format!("keyword '{}'", self.lexeme),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

pub struct Lexer<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    line: usize,
    column: usize,
    start_line: usize,
    start_column: usize,
    finished: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            finished: false,
            diagnostics: Vec::new(),
        }
    }

    /// Lexical errors seen so far. Each one matches an `Error` token.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Scan the next token. Once the input is exhausted this keeps
    /// returning `Eof`.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_trivia();

        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column;

        let c = match self.advance() {
            Some(c) => c,
            None => return self.make_token(TokenKind::Eof),
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            '%' => TokenKind::Percent,
            '~' => TokenKind::Tilde,
            '+' => {
                if self.match_char('+') {
                    TokenKind::Increment
                } else if self.match_char('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::Decrement
                } else if self.match_char('=') {
                    TokenKind::MinusEqual
                } else if self.match_char('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('*') {
                    TokenKind::Power
                } else if self.match_char('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.match_char('=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                }
            }
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.match_char('^') {
                    TokenKind::CaretCaret
                } else {
                    TokenKind::Caret
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else if self.match_char('>') {
                    TokenKind::RightShift
                } else {
                    TokenKind::Greater
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::LessEqual
                } else if self.match_char('<') {
                    TokenKind::LeftShift
                } else {
                    TokenKind::Less
                }
            }
            '"' => return self.string(),
            '\'' => return self.char_literal(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            other => {
                let span = Span::new(self.start, self.current);
                return self.error_token(span, format!("Unexpected character '{}'", other));
            }
        };

        self.make_token(kind)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == '#' {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.source[self.current..].chars().nth(1)
    }

    fn string(&mut self) -> Token<'src> {
        loop {
            match self.peek() {
                None | Some('\n') => return self.unterminated("Unterminated string literal"),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        self.make_token(TokenKind::StringLiteral)
    }

    fn char_literal(&mut self) -> Token<'src> {
        match self.peek() {
            None | Some('\n') => return self.unterminated("Unterminated character literal"),
            Some('\'') => {
                self.advance();
                let span = Span::new(self.start, self.current);
                return self.error_token(span, "Empty character literal".to_string());
            }
            Some('\\') => {
                self.advance();
                if matches!(self.peek(), None | Some('\n')) {
                    return self.unterminated("Unterminated character literal");
                }
                self.advance();
            }
            Some(_) => {
                self.advance();
            }
        }

        if self.match_char('\'') {
            self.make_token(TokenKind::CharLiteral)
        } else {
            self.unterminated("Unterminated character literal")
        }
    }

    fn number(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // A '.' belongs to the literal only when a digit follows it.
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            return TokenKind::FloatLiteral;
        }

        TokenKind::IntLiteral
    }

    fn identifier(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        lookup_keyword(text).unwrap_or(TokenKind::Identifier)
    }

    /// Unterminated literals are reported at the opening quote.
    fn unterminated(&mut self, message: &str) -> Token<'src> {
        self.error_token(Span::single(self.start), message.to_string())
    }

    fn error_token(&mut self, span: Span, message: String) -> Token<'src> {
        trace!("lexical error at {}:{}: {}", self.start_line, self.start_column, message);
        self.diagnostics.push(Diagnostic::new(
            ErrorKind::Lexical,
            span,
            self.start_line,
            self.start_column,
            message,
        ));
        self.make_token(TokenKind::Error)
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        let token = Token::new(
            kind,
            &self.source[self.start..self.current],
            Span::new(self.start, self.current),
            self.start_line,
            self.start_column,
        );
        trace!("{}:{} {:?} {:?}", token.line, token.column, token.kind, token.lexeme);
        token
    }
}

/// Yields every token up to and including the first `Eof`.
impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

/// The ordered tokens of one source file, always terminated by a single `Eof`.
#[derive(Debug, Clone, Default)]
pub struct TokenBuffer<'src> {
    tokens: Vec<Token<'src>>,
}

impl<'src> TokenBuffer<'src> {
    /// Scan the whole source, stopping at the first lexical error.
    pub fn tokenize(source: &'src str) -> Result<Self, Diagnostic> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Error {
                if let Some(diagnostic) = lexer.take_diagnostics().into_iter().next() {
                    return Err(diagnostic);
                }
            }
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                break;
            }
        }

        debug!("scanned {} tokens", tokens.len());
        Ok(Self { tokens })
    }

    /// Scan the whole source, keeping `Error` tokens and every diagnostic.
    pub fn scan(source: &'src str) -> (Self, Vec<Diagnostic>) {
        let mut lexer = Lexer::new(source);
        let tokens: Vec<Token<'src>> = lexer.by_ref().collect();
        let diagnostics = lexer.take_diagnostics();

        debug!("scanned {} tokens, {} lexical errors", tokens.len(), diagnostics.len());
        (Self { tokens }, diagnostics)
    }

    pub fn as_slice(&self) -> &[Token<'src>] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token<'src>> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a, 'src> IntoIterator for &'a TokenBuffer<'src> {
    type Item = &'a Token<'src>;
    type IntoIter = std::slice::Iter<'a, Token<'src>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Resolve backslash escapes in the body of a string or character literal.
pub fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some(c) => {
                // Unknown escape: keep it verbatim
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }
    result
}
