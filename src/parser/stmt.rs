//! Statement parsing: recursive descent over the Pratt expression parser.

use crate::ast::{Node, Param, TypeName};
use crate::error::Diagnostic;
use crate::lexer::TokenKind;

use super::{BindingPower, ParseResult, Parser};

impl Parser<'_> {
    pub fn parse_stmt(&mut self) -> ParseResult<Node> {
        self.nested("Statement", Self::statement)
    }

    fn statement(&mut self) -> ParseResult<Node> {
        let token = self.current();

        match token.kind {
            TokenKind::LeftBrace => self.block_body().map(Node::block),
            TokenKind::Fn => self.function_def(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Println => self.println_stmt(),
            kind if kind.is_type_keyword() => self.var_decl(),
            // `Point p = ...;` is the only place two tokens of lookahead are needed.
            TokenKind::Identifier if self.peek(1).kind == TokenKind::Identifier => self.var_decl(),
            _ => self.expression_stmt(),
        }
    }

    /// `{ stmt* }`, returning the statements between the braces.
    pub(super) fn block_body(&mut self) -> ParseResult<Vec<Node>> {
        self.consume(TokenKind::LeftBrace, "Expected '{' before block")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && self.had_tokens() {
            statements.push(self.parse_stmt()?);
        }

        self.consume_with_help(
            TokenKind::RightBrace,
            "Expected '}' after block",
            "Every '{' needs a matching '}'",
        )?;
        Ok(statements)
    }

    /// A primitive type keyword or a user type name.
    pub(super) fn parse_type(&mut self) -> ParseResult<TypeName> {
        let token = self.current();
        if token.kind.is_type_keyword() || token.kind == TokenKind::Identifier {
            self.advance();
            if let Some(ty) = TypeName::new(token.lexeme) {
                return Ok(ty);
            }
        }

        Err(Diagnostic::syntax_error(
            &token,
            format!("Expected type name, found {}", token.describe()),
        ))
    }

    fn function_def(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'fn'
        let name = self.consume(TokenKind::Identifier, "Expected function name")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let ty = self.parse_type()?;
                let param = self.consume(TokenKind::Identifier, "Expected parameter name")?;
                params.push(Param {
                    ty,
                    name: param.lexeme.to_string(),
                });
                if !self.match_types(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let return_type = if self.match_types(&[TokenKind::Arrow]) {
            self.parse_type()?
        } else {
            TypeName::void()
        };

        let body = self.block_body()?;
        Ok(Node::function_def(name.lexeme, return_type, params, body))
    }

    fn var_decl(&mut self) -> ParseResult<Node> {
        let ty = self.parse_type()?;
        let name = self.consume_with_help(
            TokenKind::Identifier,
            "Expected variable name",
            "Declarations have the form 'i64 x = 10;'",
        )?;

        let value = if self.match_types(&[TokenKind::Equal]) {
            // Above the comma operator: `i64 x = 1, 2;` is rejected, not folded.
            Some(self.parse_expr(BindingPower::Comma)?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration")?;
        Ok(Node::var_decl(ty, name.lexeme, value))
    }

    fn if_stmt(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'if'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expr(BindingPower::Default)?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_branch = self.parse_stmt()?;
        let else_branch = if self.match_types(&[TokenKind::Else]) {
            Some(self.parse_stmt()?)
        } else {
            None
        };

        Ok(Node::if_stmt(condition, then_branch, else_branch))
    }

    fn while_stmt(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'while'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expr(BindingPower::Default)?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;

        let body = self.parse_stmt()?;
        Ok(Node::while_loop(condition, body))
    }

    fn for_stmt(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'for'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = self.parse_optional_expr(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;
        let condition = self.parse_optional_expr(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;
        let increment = self.parse_optional_expr(TokenKind::RightParen)?;
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;

        let body = self.parse_stmt()?;
        Ok(Node::for_loop(init, condition, increment, body))
    }

    fn return_stmt(&mut self) -> ParseResult<Node> {
        self.advance(); // consume 'return'
        let value = self.parse_optional_expr(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon, "Expected ';' after return")?;
        Ok(Node::return_stmt(value))
    }

    fn println_stmt(&mut self) -> ParseResult<Node> {
        let node = self.builtin(Node::println)?;
        self.consume(TokenKind::Semicolon, "Expected ';' after println")?;
        Ok(node)
    }

    fn expression_stmt(&mut self) -> ParseResult<Node> {
        let expr = self.parse_expr(BindingPower::Default)?;
        self.consume_with_help(
            TokenKind::Semicolon,
            "Expected ';' after expression",
            "Statements must end with ';'",
        )?;
        Ok(expr)
    }
}
