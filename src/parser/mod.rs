//! Parser for Obsidian.
//!
//! Expressions use Pratt parsing (`expr.rs`), statements use recursive
//! descent (`stmt.rs`). Both walk a fully scanned token buffer with an index
//! cursor and never backtrack.

mod expr;
mod stmt;

use crate::ast::Node;
use crate::error::{Diagnostic, Span};
use crate::lexer::{Token, TokenKind};
use log::debug;

pub type ParseResult<T> = Result<T, Diagnostic>;

/// Deepest nesting of expressions and statements the parser will follow.
/// Deeper input is a syntax error instead of a stack overflow.
pub const MAX_DEPTH: usize = 128;

/// Operator binding power, loosest first. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BindingPower {
    Default,
    Comma,          // ,
    Assignment,     // = += -= *= /=
    Ternary,        // ? :
    LogicalOr,      // || ^^
    LogicalAnd,     // &&
    BitwiseOr,      // |
    BitwiseXor,     // ^
    BitwiseAnd,     // &
    Relational,     // == !=
    Comparison,     // < > <= >=
    Shift,          // << >>
    Additive,       // + -
    Multiplicative, // * / %
    Exponent,       // **
    Prefix,         // - + ! ~ ++ -- & *
    Postfix,        // ++ -- ()
}

impl BindingPower {
    /// Binding power of `kind` in infix/postfix position. Tokens that cannot
    /// continue an expression get `Default`, which ends the Pratt loop.
    pub fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Comma => BindingPower::Comma,
            TokenKind::Equal
            | TokenKind::PlusEqual
            | TokenKind::MinusEqual
            | TokenKind::StarEqual
            | TokenKind::SlashEqual => BindingPower::Assignment,
            TokenKind::Question => BindingPower::Ternary,
            TokenKind::PipePipe | TokenKind::CaretCaret => BindingPower::LogicalOr,
            TokenKind::AmpAmp => BindingPower::LogicalAnd,
            TokenKind::Pipe => BindingPower::BitwiseOr,
            TokenKind::Caret => BindingPower::BitwiseXor,
            TokenKind::Ampersand => BindingPower::BitwiseAnd,
            TokenKind::EqualEqual | TokenKind::BangEqual => BindingPower::Relational,
            TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual => BindingPower::Comparison,
            TokenKind::LeftShift | TokenKind::RightShift => BindingPower::Shift,
            TokenKind::Plus | TokenKind::Minus => BindingPower::Additive,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => BindingPower::Multiplicative,
            TokenKind::Power => BindingPower::Exponent,
            TokenKind::Increment | TokenKind::Decrement | TokenKind::LeftParen => {
                BindingPower::Postfix
            }
            _ => BindingPower::Default,
        }
    }

    /// One step looser. Right-associative operators parse their right-hand
    /// side at this level so an equal operator can nest to the right.
    pub fn lower(self) -> Self {
        use BindingPower::*;

        match self {
            Default | Comma => Default,
            Assignment => Comma,
            Ternary => Assignment,
            LogicalOr => Ternary,
            LogicalAnd => LogicalOr,
            BitwiseOr => LogicalAnd,
            BitwiseXor => BitwiseOr,
            BitwiseAnd => BitwiseXor,
            Relational => BitwiseAnd,
            Comparison => Relational,
            Shift => Comparison,
            Additive => Shift,
            Multiplicative => Additive,
            Exponent => Multiplicative,
            Prefix => Exponent,
            Postfix => Prefix,
        }
    }
}

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a whole program into its top-level `Block`.
    pub fn parse(tokens: &'a [Token<'a>]) -> ParseResult<Node> {
        Parser::new(tokens).parse_program()
    }

    /// A program is a block without braces. Empty input gives an empty block.
    pub fn parse_program(&mut self) -> ParseResult<Node> {
        let mut statements = Vec::new();

        while self.had_tokens() {
            statements.push(self.parse_stmt()?);
        }

        debug!("parsed {} top-level statements", statements.len());
        Ok(Node::block(statements))
    }

    // === Token navigation ===

    /// True until the cursor reaches the end-of-file marker.
    pub fn had_tokens(&self) -> bool {
        self.current().kind != TokenKind::Eof
    }

    pub fn current(&self) -> Token<'a> {
        self.peek(0)
    }

    /// Look `offset` tokens ahead. Past the end this is the `Eof` token.
    pub fn peek(&self, offset: usize) -> Token<'a> {
        match self.pos.checked_add(offset).and_then(|i| self.tokens.get(i)) {
            Some(token) => *token,
            None => self.end_of_input(),
        }
    }

    /// Return the current token and move past it. The cursor never moves
    /// beyond `Eof`.
    pub fn advance(&mut self) -> Token<'a> {
        let token = self.current();
        if token.kind != TokenKind::Eof && self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn match_types(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|kind| self.check(*kind)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token<'a>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.current();
            Err(Diagnostic::syntax_error(
                &found,
                format!("{}, found {}", message, found.describe()),
            ))
        }
    }

    fn consume_with_help(
        &mut self,
        kind: TokenKind,
        message: &str,
        help: &str,
    ) -> ParseResult<Token<'a>> {
        self.consume(kind, message).map_err(|error| error.with_help(help))
    }

    /// Run `parse` one nesting level deeper, failing at the current token
    /// once `MAX_DEPTH` is reached.
    fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(Diagnostic::syntax_error_with_help(
                &self.current(),
                format!("{} nested too deeply", what),
                format!("At most {} levels of nesting are supported", MAX_DEPTH),
            ));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// The `Eof` of a buffer, or a synthetic one just past the last token
    /// when the slice was cut short.
    fn end_of_input(&self) -> Token<'a> {
        match self.tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => *last,
            Some(last) => Token::new(
                TokenKind::Eof,
                "",
                Span::new(last.span.end, last.span.end),
                last.line,
                last.column + last.lexeme.chars().count(),
            ),
            None => Token::new(TokenKind::Eof, "", Span::default(), 1, 1),
        }
    }
}
