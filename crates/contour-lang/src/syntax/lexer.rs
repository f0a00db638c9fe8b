use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword, symbol};

/// Splits source text into tokens. Works on `char`s, so string literals
/// and columns are exact for non-ASCII text.
pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, chars: src.char_indices().peekable(), line: 1, column: 1 }
    }

    /// Every lexical error is collected; the token list is returned only
    /// when there are none.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        while self.skip_trivia() {
            let (line, column) = (self.line, self.column);
            match self.token() {
                Ok(kind) => tokens.push(Token::new(kind, line, column)),
                Err(e)   => errors.push(e),
            }
        }
        tokens.push(Token::new(TokenKind::Eof, self.line, self.column));

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn token(&mut self) -> Result<TokenKind, Error> {
        let (line, column) = (self.line, self.column);
        let rest = self.rest();

        if let Some((kind, len)) = symbol(rest) {
            self.skip_bytes(len);
            return Ok(kind);
        }
        match rest.chars().next() {
            Some('"') => {
                self.bump();
                self.string(line, column).map(TokenKind::StringLit)
            }
            Some(c) if c.is_ascii_digit() => Ok(TokenKind::Num(self.number())),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                Ok(keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string())))
            }
            Some('!') => {
                self.bump();
                Err(Error::new(ErrorCode::L001, line, column, "expected `!=`, use `not` for negation"))
            }
            other => {
                self.bump();
                let shown = other.map(String::from).unwrap_or_default();
                Err(Error::new(ErrorCode::L001, line, column, format!("unexpected character `{shown}`")))
            }
        }
    }

    // ─── Cursor ──────────────────────────────────────────────────────────────

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(i, _)| i)
    }

    fn rest(&mut self) -> &'a str {
        let src = self.src;
        &src[self.offset()..]
    }

    fn skip_bytes(&mut self, len: usize) {
        let end = self.offset() + len;
        while self.offset() < end && self.bump().is_some() {}
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        let start = self.offset();
        while self.chars.peek().is_some_and(|&(_, c)| keep(c)) {
            self.bump();
        }
        &src[start..self.offset()]
    }

    /// Skip whitespace and comments. False once the input is exhausted.
    /// An unclosed block comment runs to the end of input.
    fn skip_trivia(&mut self) -> bool {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                self.take_while(|c| c != '\n');
            } else if let Some(body) = rest.strip_prefix("/*") {
                let len = body.find("*/").map_or(body.len(), |end| end + 2);
                self.skip_bytes(2 + len);
            } else if rest.starts_with(char::is_whitespace) {
                self.bump();
            } else {
                return !rest.is_empty();
            }
        }
    }

    // ─── Literals ────────────────────────────────────────────────────────────

    /// Called after the opening quote. A bad escape is reported once the
    /// string is closed, so the rest of the literal does not cascade.
    fn string(&mut self, line: usize, column: usize) -> Result<String, Error> {
        let unterminated = || Error::new(ErrorCode::L002, line, column, "unterminated string literal");
        let mut text = String::new();
        let mut bad_escape = None;

        loop {
            match self.bump() {
                None | Some('\n') => return Err(unterminated()),
                Some('"') => break,
                Some('\\') => {
                    let (esc_line, esc_col) = (self.line, self.column);
                    match self.bump() {
                        None | Some('\n') => return Err(unterminated()),
                        Some('n')  => text.push('\n'),
                        Some('t')  => text.push('\t'),
                        Some('"')  => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some(other) => {
                            bad_escape.get_or_insert_with(|| Error::new(ErrorCode::L003, esc_line, esc_col,
                                format!("unknown escape sequence `\\{other}`")));
                        }
                    }
                }
                Some(c) => text.push(c),
            }
        }
        match bad_escape {
            Some(e) => Err(e),
            None    => Ok(text),
        }
    }

    /// Digits, an optional fraction, an optional exponent. The `.` is part of
    /// the number only when a digit follows it, and `e` only when digits do.
    fn number(&mut self) -> f64 {
        let src = self.src;
        let start = self.offset();
        let digit = |s: &str| s.starts_with(|c: char| c.is_ascii_digit());

        self.take_while(|c| c.is_ascii_digit());
        if self.rest().strip_prefix('.').is_some_and(digit) {
            self.bump();
            self.take_while(|c| c.is_ascii_digit());
        }
        let rest = self.rest();
        if let Some(exp) = rest.strip_prefix(|c: char| c == 'e' || c == 'E') {
            let digits = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
            if digit(digits) {
                self.skip_bytes(rest.len() - digits.len());
                self.take_while(|c| c.is_ascii_digit());
            }
        }
        src[start..self.offset()].parse().unwrap_or(0.0)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Vec<Error> {
        Lexer::new(src).tokenize().unwrap_err()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.into())
    }

    #[test]
    fn empty_and_blank() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex(" \n\t // only a comment"), vec![TokenKind::Eof]);
    }

    #[test]
    fn numbers() {
        assert_eq!(lex("42 3.25"), vec![TokenKind::Num(42.0), TokenKind::Num(3.25), TokenKind::Eof]);
        assert_eq!(lex("1e3 2.5e-1 4E+2"), vec![
            TokenKind::Num(1000.0), TokenKind::Num(0.25), TokenKind::Num(400.0), TokenKind::Eof,
        ]);
    }

    #[test]
    fn exponent_needs_digits() {
        assert_eq!(lex("2else"), vec![TokenKind::Num(2.0), TokenKind::Else, TokenKind::Eof]);
        assert_eq!(lex("1.x"), vec![TokenKind::Num(1.0), TokenKind::Dot, ident("x"), TokenKind::Eof]);
    }

    #[test]
    fn field_access_after_name() {
        assert_eq!(lex("p.x"), vec![ident("p"), TokenKind::Dot, ident("x"), TokenKind::Eof]);
    }

    #[test]
    fn keywords_and_literals() {
        assert_eq!(lex("let in if else and or not null true false"), vec![
            TokenKind::Let, TokenKind::In, TokenKind::If, TokenKind::Else,
            TokenKind::And, TokenKind::Or, TokenKind::Not, TokenKind::Null,
            TokenKind::Bool(true), TokenKind::Bool(false), TokenKind::Eof,
        ]);
        assert_eq!(lex("inner _x2"), vec![ident("inner"), ident("_x2"), TokenKind::Eof]);
    }

    #[test]
    fn longest_symbol_wins() {
        assert_eq!(lex("p -> p - 1"), vec![
            ident("p"), TokenKind::Arrow, ident("p"), TokenKind::Minus, TokenKind::Num(1.0), TokenKind::Eof,
        ]);
        assert_eq!(lex("== != <= >= < > ="), vec![
            TokenKind::EqEq, TokenKind::BangEq, TokenKind::LtEq, TokenKind::GtEq,
            TokenKind::Lt, TokenKind::Gt, TokenKind::Eq, TokenKind::Eof,
        ]);
    }

    #[test]
    fn comments_skipped() {
        assert_eq!(lex("// comment\n42"), vec![TokenKind::Num(42.0), TokenKind::Eof]);
        assert_eq!(lex("/* a\nb */42"), vec![TokenKind::Num(42.0), TokenKind::Eof]);
        assert_eq!(lex("1 /* never closed"), vec![TokenKind::Num(1.0), TokenKind::Eof]);
        assert_eq!(lex("6 / 2"), vec![TokenKind::Num(6.0), TokenKind::Slash, TokenKind::Num(2.0), TokenKind::Eof]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(lex(r#""a\nb\t\"\\""#), vec![TokenKind::StringLit("a\nb\t\"\\".into()), TokenKind::Eof]);
    }

    #[test]
    fn non_ascii_string_is_kept_whole() {
        assert_eq!(lex("\"é→∂\""), vec![TokenKind::StringLit("é→∂".into()), TokenKind::Eof]);
    }

    #[test]
    fn columns_count_characters() {
        let tokens = Lexer::new("\"éé\" x").tokenize().unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (1, 6));
    }

    #[test]
    fn unterminated_string() {
        let errs = lex_err(r#""oops"#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L002);
        assert_eq!((errs[0].line, errs[0].column), (1, 1));
    }

    #[test]
    fn backslash_at_end_of_input_is_unterminated() {
        let errs = lex_err("\"a\\");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L002);
    }

    #[test]
    fn invalid_escape_reported_once() {
        let errs = lex_err(r#""\q\w" 1"#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L003);
        assert_eq!((errs[0].line, errs[0].column), (1, 3));
    }

    #[test]
    fn bare_bang_and_stray_characters() {
        assert_eq!(lex_err("!")[0].code, ErrorCode::L001);
        let errs = lex_err("1 # 2 é");
        assert_eq!(errs.len(), 2);
        assert!(errs[1].message.contains('é'));
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }
}
