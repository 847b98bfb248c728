//! Expression parsing
//!
//! ```text
//! expr    := unary (('+' | '-') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! ```

use super::ast::*;
use super::state::ParserState;
use super::super::lexer::tokens::TokenKind;
use super::ParseError;

impl<'a> ParserState<'a> {
    /// Parse an additive expression
    ///
    /// Every unary, parenthesised or binary level counts toward
    /// `MAX_EXPR_DEPTH`, which keeps later tree walks shallow.
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let depth = self.expr_depth();
        let mut lhs = self.parse_unary()?;

        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            // 左结合链每多一层就加深一层
            self.enter_expr()?;
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span: self.span_from(start),
            };
        }

        self.reset_expr_depth(depth);
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        if self.at(&TokenKind::Minus) {
            self.enter_expr()?;
            self.bump();
            let operand = self.parse_unary()?;
            self.leave_expr();
            return Ok(Expr::Unary {
                op: UnOp::Neg,
                operand: Box::new(operand),
                span: self.span_from(start),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        match self.kind() {
            TokenKind::IntLiteral(value) => {
                let value = *value;
                self.bump();
                Ok(Expr::Number(value, span))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.bump();
                Ok(Expr::Const(name, span))
            }
            TokenKind::LParen => {
                self.enter_expr()?;
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                self.leave_expr();
                Ok(inner)
            }
            _ => Err(self.expected("expression")),
        }
    }

    /// Parse `NUMBER | '-' NUMBER | IDENT`
    pub fn parse_reference(&mut self) -> Result<Reference, ParseError> {
        let negative = self.eat(&TokenKind::Minus);
        match self.kind() {
            TokenKind::IntLiteral(value) => {
                let value = if negative { -*value } else { *value };
                self.bump();
                Ok(Reference::Literal(value))
            }
            TokenKind::Identifier(name) if !negative => {
                let name = name.clone();
                self.bump();
                Ok(Reference::Symbol(name))
            }
            _ => Err(self.expected(if negative { "number" } else { "number or identifier" })),
        }
    }

    /// Parse `IDENT '=' expr`
    pub fn parse_assign(&mut self) -> Result<Assign, ParseError> {
        let (name, start) = self.expect_ident("field name")?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok(Assign {
            name,
            value,
            span: self.span_from(start),
        })
    }

    /// Parse a parenthesised, comma separated expression list
    pub fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut items = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                items.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(items)
    }
}
