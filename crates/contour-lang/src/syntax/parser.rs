use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

/// Parses one expression; a whole program is a single expression.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Expr, Vec<Error>> {
        let expr = self.parse_expr().map_err(|e| vec![e])?;
        if !self.is_at_end() {
            return Err(vec![self.unexpected("end of input")]);
        }
        Ok(expr)
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, Error> {
        match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::If  => self.parse_if(),
            TokenKind::Ident(_) if self.peek_next_is(TokenKind::Arrow) => self.parse_lambda(),
            TokenKind::LParen if self.is_lambda_start() => self.parse_lambda(),
            _ => self.parse_ternary(),
        }
    }

    fn parse_let(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::Let)?;
        let mut bindings = Vec::new();
        loop {
            let bspan = self.span();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Eq)?;
            let value = self.parse_expr()?;
            bindings.push(Binding { name, value, span: bspan });
            if !self.matches(TokenKind::Semicolon) || self.check(TokenKind::In) { break; }
        }
        self.expect(TokenKind::In)?;
        let body = self.parse_expr()?;
        Ok(Expr::Let { bindings, body: Box::new(body), span })
    }

    fn parse_if(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_expr = self.parse_expr()?;
        self.expect(TokenKind::Else)?;
        let else_expr = self.parse_expr()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span,
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let params = if self.matches(TokenKind::LParen) {
            let params = self.parse_param_list()?;
            self.expect(TokenKind::RParen)?;
            params
        } else {
            let pspan = self.span();
            vec![Param { name: self.expect_ident()?, span: pspan }]
        };
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_expr()?;
        Ok(Expr::Lambda { params, body: Box::new(body), span })
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let span = self.span();
            let name = self.expect_ident()?;
            params.push(Param { name, span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(params)
    }

    fn parse_ternary(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_or()?;
        if self.matches(TokenKind::Question) {
            let span = *expr.span();
            let then_expr = self.parse_or()?;
            self.expect(TokenKind::Colon)?;
            let else_expr = self.parse_expr()?;
            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span,
            });
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            let span = self.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BinOp { left: Box::new(left), op: BinOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::And) {
            let span = self.span();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::BinOp { left: Box::new(left), op: BinOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq   => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_addition()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt   => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt   => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_addition()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_addition(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_multiplication()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_multiplication()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star    => BinOp::Mul,
                TokenKind::Slash   => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        if self.matches(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::UnOp { op: UnOp::Neg, operand: Box::new(operand), span });
        }
        if self.matches(TokenKind::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::UnOp { op: UnOp::Not, operand: Box::new(operand), span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let span = self.span();
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }

                TokenKind::Dot => {
                    let span = self.span();
                    self.advance();
                    let field = self.expect_ident()?;
                    expr = Expr::Field { expr: Box::new(expr), field, span };
                }

                TokenKind::LBracket => {
                    let span = self.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { expr: Box::new(expr), index: Box::new(index), span };
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Num(v)       => { self.advance(); Ok(Expr::Num(v, span)) }
            TokenKind::Bool(v)      => { self.advance(); Ok(Expr::Bool(v, span)) }
            TokenKind::Null         => { self.advance(); Ok(Expr::Null(span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::StringLit(s, span)) }
            TokenKind::Ident(name)  => { self.advance(); Ok(Expr::Ident(name, span)) }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                    items.push(self.parse_expr()?);
                    if !self.matches(TokenKind::Comma) { break; }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::List(items, span))
            }

            TokenKind::LBrace => self.parse_record(),

            // `let`, `if` and lambdas may appear as operands when parenthesised
            // or as the right-hand side of a binding; here they start a new expression.
            TokenKind::Let | TokenKind::If => self.parse_expr(),

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_record(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let fspan = self.span();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            fields.push(FieldInit { name, value, span: fspan });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Record(fields, span))
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        if self.pos + 1 < self.tokens.len() {
            self.tokens[self.pos + 1].kind == kind
        } else {
            false
        }
    }

    /// Returns true if the current `(` starts a lambda: `() ->` or
    /// `(ident, ident, ...) ->`.
    fn is_lambda_start(&self) -> bool {
        let mut i = self.pos + 1;
        let mut expect_ident = true;
        while i < self.tokens.len() {
            match (&self.tokens[i].kind, expect_ident) {
                (TokenKind::Ident(_), true)  => expect_ident = false,
                (TokenKind::Comma, false)    => expect_ident = true,
                (TokenKind::RParen, _)       => {
                    return i + 1 < self.tokens.len()
                        && self.tokens[i + 1].kind == TokenKind::Arrow;
                }
                _ => return false,
            }
            i += 1;
        }
        false
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, msg)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_err(src: &str) -> Vec<Error> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    // ── simple ───────────────────────────────────────────────────────────────

    #[test]
    fn number_literal() {
        assert!(matches!(parse("1.5"), Expr::Num(v, _) if v == 1.5));
    }

    #[test]
    fn precedence_mul_over_add() {
        match parse("1 + 2 * 3") {
            Expr::BinOp { op: BinOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::BinOp { op: BinOp::Mul, .. }));
            }
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn single_param_lambda() {
        match parse("p -> length(p) - 1") {
            Expr::Lambda { params, body, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].name, "p");
                assert!(matches!(*body, Expr::BinOp { op: BinOp::Sub, .. }));
            }
            other => panic!("expected Lambda, got {other:?}"),
        }
    }

    #[test]
    fn multi_param_lambda() {
        match parse("(p, q) -> p + q") {
            Expr::Lambda { params, .. } => {
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["p", "q"]);
            }
            other => panic!("expected Lambda, got {other:?}"),
        }
    }

    #[test]
    fn nullary_lambda() {
        assert!(matches!(parse("() -> 1"), Expr::Lambda { ref params, .. } if params.is_empty()));
    }

    #[test]
    fn parenthesised_expr_is_not_lambda() {
        assert!(matches!(parse("(a) + 1"), Expr::BinOp { op: BinOp::Add, .. }));
    }

    #[test]
    fn record_literal() {
        match parse("{dist: p -> 0, name: \"dot\",}") {
            Expr::Record(fields, _) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "dist");
                assert!(matches!(fields[0].value, Expr::Lambda { .. }));
                assert!(matches!(fields[1].value, Expr::StringLit(ref s, _) if s == "dot"));
            }
            other => panic!("expected Record, got {other:?}"),
        }
    }

    #[test]
    fn empty_record() {
        assert!(matches!(parse("{}"), Expr::Record(ref f, _) if f.is_empty()));
    }

    #[test]
    fn let_bindings() {
        match parse("let r = 2; c = [0, 0]; in p -> length(p - c) - r") {
            Expr::Let { bindings, body, .. } => {
                assert_eq!(bindings.len(), 2);
                assert_eq!(bindings[1].name, "c");
                assert!(matches!(*body, Expr::Lambda { .. }));
            }
            other => panic!("expected Let, got {other:?}"),
        }
    }

    #[test]
    fn let_without_trailing_semicolon() {
        assert!(matches!(parse("let a = 1 in a"), Expr::Let { .. }));
    }

    #[test]
    fn if_else() {
        assert!(matches!(parse("if (x < 0) -x else x"), Expr::Ternary { .. }));
    }

    #[test]
    fn ternary_right_associative() {
        match parse("a ? b : c ? d : e") {
            Expr::Ternary { else_expr, .. } => assert!(matches!(*else_expr, Expr::Ternary { .. })),
            other => panic!("expected Ternary, got {other:?}"),
        }
    }

    #[test]
    fn postfix_chain() {
        // r.dist([1, 2])[0]
        match parse("r.dist([1, 2])[0]") {
            Expr::Index { expr, .. } => match *expr {
                Expr::Call { callee, args, .. } => {
                    assert_eq!(args.len(), 1);
                    assert!(matches!(*callee, Expr::Field { ref field, .. } if field == "dist"));
                }
                other => panic!("expected Call, got {other:?}"),
            },
            other => panic!("expected Index, got {other:?}"),
        }
    }

    #[test]
    fn unary_not_and_neg() {
        assert!(matches!(parse("not a"), Expr::UnOp { op: UnOp::Not, .. }));
        assert!(matches!(parse("-a"), Expr::UnOp { op: UnOp::Neg, .. }));
    }

    // ── errors ───────────────────────────────────────────────────────────────

    #[test]
    fn error_trailing_tokens() {
        let errs = parse_err("1 2");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    #[test]
    fn error_missing_in() {
        let errs = parse_err("let a = 1; a");
        assert!(!errs.is_empty());
    }

    #[test]
    fn error_missing_closing_paren() {
        let errs = parse_err("f(a, b");
        assert_eq!(errs[0].code, ErrorCode::P002);
    }

    #[test]
    fn error_record_field_without_colon() {
        let errs = parse_err("{dist p}");
        assert!(!errs.is_empty());
    }
}
