//! Expression parsing: Pratt / precedence climbing.

use crate::ast::{AssignOp, BinaryOp, Node, UnaryOp};
use crate::error::Diagnostic;
use crate::lexer::{unescape, Token, TokenKind};

use super::{BindingPower, ParseResult, Parser};

impl Parser<'_> {
    /// Parse an expression whose operators all bind tighter than `min_bp`.
    pub fn parse_expr(&mut self, min_bp: BindingPower) -> ParseResult<Node> {
        self.nested("Expression", |parser| parser.climb(min_bp))
    }

    fn climb(&mut self, min_bp: BindingPower) -> ParseResult<Node> {
        let mut left = self.nud()?;

        while BindingPower::of(self.current().kind) > min_bp {
            left = self.led(left)?;
        }

        Ok(left)
    }

    /// An expression that may be legitimately missing, e.g. `return;` or an
    /// empty `for` clause. Absence is decided by the terminator alone.
    pub(super) fn parse_optional_expr(
        &mut self,
        terminator: TokenKind,
    ) -> ParseResult<Option<Node>> {
        if self.check(terminator) {
            Ok(None)
        } else {
            self.parse_expr(BindingPower::Default).map(Some)
        }
    }

    /// Null denotation: an expression that starts at the current token.
    fn nud(&mut self) -> ParseResult<Node> {
        let token = self.current();

        match token.kind {
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Identifier => self.primary(),
            TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Increment
            | TokenKind::Decrement
            | TokenKind::Ampersand
            | TokenKind::Star => self.unary(),
            TokenKind::LeftParen => self.grouping(),
            TokenKind::Println => self.builtin(Node::println),
            TokenKind::Length => self.builtin(Node::length),
            TokenKind::Typeof => self.builtin(Node::type_of),
            TokenKind::Alloc => self.builtin(Node::alloc),
            TokenKind::Dealloc => self.builtin(Node::dealloc),
            TokenKind::Sizeof => self.size_of(),
            TokenKind::Unsafe => self.unsafe_block(),
            TokenKind::Cast => self.cast(),
            _ => Err(Diagnostic::syntax_error(
                &token,
                format!("Expected expression, found {}", token.describe()),
            )),
        }
    }

    /// Left denotation: fold the operator at the cursor onto `left`.
    fn led(&mut self, left: Node) -> ParseResult<Node> {
        let token = self.current();
        let bp = BindingPower::of(token.kind);

        match token.kind {
            TokenKind::Equal
            | TokenKind::PlusEqual
            | TokenKind::MinusEqual
            | TokenKind::StarEqual
            | TokenKind::SlashEqual => self.assignment(left),
            TokenKind::Question => self.ternary(left),
            TokenKind::LeftParen => self.call(left),
            TokenKind::Increment => {
                self.advance();
                Ok(Node::unary(UnaryOp::PostIncrement, left))
            }
            TokenKind::Decrement => {
                self.advance();
                Ok(Node::unary(UnaryOp::PostDecrement, left))
            }
            kind => {
                let op = binary_op(kind).ok_or_else(|| {
                    Diagnostic::syntax_error(
                        &token,
                        format!("Unexpected {} in expression", token.describe()),
                    )
                })?;
                self.advance();

                // Same power on the right keeps equal operators left-associative;
                // `**` drops one level so it nests to the right instead.
                let rhs_bp = if op == BinaryOp::Power { bp.lower() } else { bp };
                let right = self.parse_expr(rhs_bp).map_err(|error| match error.help {
                    Some(_) => error,
                    None => error.with_help(format!(
                        "'{}' needs an expression on both sides",
                        op.as_str()
                    )),
                })?;

                Ok(Node::binary(op, left, right))
            }
        }
    }

    fn primary(&mut self) -> ParseResult<Node> {
        let token = self.advance();

        match token.kind {
            TokenKind::IntLiteral => token.lexeme.parse::<i64>().map(Node::int).map_err(|_| {
                Diagnostic::syntax_error(
                    &token,
                    format!("Invalid integer literal '{}'", token.lexeme),
                )
                .with_help("Integer literals must fit in a signed 64-bit value")
            }),
            TokenKind::FloatLiteral => token.lexeme.parse::<f64>().map(Node::float).map_err(|_| {
                Diagnostic::syntax_error(
                    &token,
                    format!("Invalid float literal '{}'", token.lexeme),
                )
            }),
            TokenKind::StringLiteral => Ok(Node::string(unescape(literal_body(&token, '"')))),
            TokenKind::CharLiteral => {
                let value = unescape(literal_body(&token, '\''));
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Node::character(c)),
                    _ => Err(Diagnostic::syntax_error(
                        &token,
                        format!("Invalid character literal {}", token.lexeme),
                    )),
                }
            }
            TokenKind::True => Ok(Node::boolean(true)),
            TokenKind::False => Ok(Node::boolean(false)),
            TokenKind::Identifier => Ok(Node::identifier(token.lexeme)),
            _ => Err(Diagnostic::syntax_error(
                &token,
                format!("Expected expression, found {}", token.describe()),
            )),
        }
    }

    fn unary(&mut self) -> ParseResult<Node> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Increment => UnaryOp::PreIncrement,
            TokenKind::Decrement => UnaryOp::PreDecrement,
            TokenKind::Ampersand => UnaryOp::AddressOf,
            _ => UnaryOp::Deref,
        };

        let operand = self.parse_expr(BindingPower::Prefix)?;
        Ok(Node::unary(op, operand))
    }

    fn grouping(&mut self) -> ParseResult<Node> {
        self.advance(); // consume the (

        if self.check(TokenKind::RightParen) {
            return Err(Diagnostic::syntax_error_with_help(
                &self.current(),
                "Empty parentheses are not allowed",
                "Parentheses must contain an expression, e.g. '(1 + 2)'",
            ));
        }

        let expr = self.parse_expr(BindingPower::Default)?;
        self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
        Ok(expr)
    }

    fn assignment(&mut self, target: Node) -> ParseResult<Node> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::PlusEqual => AssignOp::AddAssign,
            TokenKind::MinusEqual => AssignOp::SubtractAssign,
            TokenKind::StarEqual => AssignOp::MultiplyAssign,
            TokenKind::SlashEqual => AssignOp::DivideAssign,
            _ => AssignOp::Assign,
        };

        let name = match target {
            Node::Identifier(name) => name,
            _ => {
                return Err(Diagnostic::syntax_error_with_help(
                    &token,
                    "Invalid assignment target",
                    "Only variables can be assigned to, e.g. 'x = 10'",
                ))
            }
        };

        let value = self.parse_expr(BindingPower::Assignment.lower())?;
        Ok(Node::assign(op, name, value))
    }

    fn ternary(&mut self, condition: Node) -> ParseResult<Node> {
        self.advance(); // consume the ?
        let then = self.parse_expr(BindingPower::Default)?;
        self.consume_with_help(
            TokenKind::Colon,
            "Expected ':' in conditional expression",
            "Conditional expressions have the form 'condition ? a : b'",
        )?;
        let otherwise = self.parse_expr(BindingPower::Ternary.lower())?;
        Ok(Node::ternary(condition, then, otherwise))
    }

    fn call(&mut self, callee: Node) -> ParseResult<Node> {
        let paren = self.advance();
        let name = match callee {
            Node::Identifier(name) => name,
            _ => {
                return Err(Diagnostic::syntax_error(
                    &paren,
                    "Only named functions can be called",
                ))
            }
        };

        let args = self.arguments()?;
        Ok(Node::call(name, args))
    }

    /// Comma separated arguments up to and including the closing `)`.
    fn arguments(&mut self) -> ParseResult<Vec<Node>> {
        let mut args = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                // Parsed above the comma operator so ',' separates arguments.
                args.push(self.parse_expr(BindingPower::Comma)?);
                if !self.match_types(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        self.consume_with_help(
            TokenKind::RightParen,
            "Expected ')' after arguments",
            "Function arguments must be closed with ')'",
        )?;
        Ok(args)
    }

    /// `println(e)`, `length(e)`, `typeof(e)`, `alloc(e)`, `dealloc(e)`.
    pub(super) fn builtin(&mut self, build: fn(Node) -> Node) -> ParseResult<Node> {
        let keyword = self.advance();
        self.consume(
            TokenKind::LeftParen,
            &format!("Expected '(' after '{}'", keyword.lexeme),
        )?;
        let arg = self.parse_expr(BindingPower::Default)?;
        self.consume(
            TokenKind::RightParen,
            &format!("Expected ')' after '{}' argument", keyword.lexeme),
        )?;
        Ok(build(arg))
    }

    fn size_of(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'sizeof'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'sizeof'")?;
        let ty = self.parse_type()?;
        self.consume(TokenKind::RightParen, "Expected ')' after type")?;
        Ok(Node::size_of(ty))
    }

    fn unsafe_block(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'unsafe'
        let statements = self.block_body()?;
        Ok(Node::unsafe_block(statements))
    }

    /// `cast<type>(expr)`
    fn cast(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'cast'
        self.consume_with_help(
            TokenKind::Less,
            "Expected '<' after 'cast'",
            "Casts are written 'cast<f64>(value)'",
        )?;
        let ty = self.parse_type()?;
        self.consume(TokenKind::Greater, "Expected '>' after cast type")?;
        self.consume(TokenKind::LeftParen, "Expected '(' before cast operand")?;
        let expr = self.parse_expr(BindingPower::Default)?;
        self.consume(TokenKind::RightParen, "Expected ')' after cast operand")?;
        Ok(Node::cast(expr, ty))
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::Power => BinaryOp::Power,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::LeftShift => BinaryOp::ShiftLeft,
        TokenKind::RightShift => BinaryOp::ShiftRight,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::AmpAmp => BinaryOp::LogicalAnd,
        TokenKind::PipePipe => BinaryOp::LogicalOr,
        TokenKind::CaretCaret => BinaryOp::LogicalXor,
        TokenKind::Comma => BinaryOp::Comma,
        _ => return None,
    };
    Some(op)
}

/// The text between a literal's quotes.
fn literal_body<'a>(token: &Token<'a>, quote: char) -> &'a str {
    token
        .lexeme
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .unwrap_or(token.lexeme)
}
