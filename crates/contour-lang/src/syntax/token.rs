#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Num(f64),
    Bool(bool),
    Ident(String),
    StringLit(String),

    Let,
    In,
    If,
    Else,
    And,
    Or,
    Not,
    Null,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Arrow,
    Question,

    Colon,
    Comma,
    Semicolon,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

/// The reserved word `word` stands for, if any. `true`/`false` lex as literals.
pub fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "let"   => TokenKind::Let,
        "in"    => TokenKind::In,
        "if"    => TokenKind::If,
        "else"  => TokenKind::Else,
        "and"   => TokenKind::And,
        "or"    => TokenKind::Or,
        "not"   => TokenKind::Not,
        "null"  => TokenKind::Null,
        "true"  => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => return None,
    })
}

/// The operator or punctuation token at the start of `rest`, with its length
/// in bytes. Two-character symbols win over their one-character prefixes.
pub fn symbol(rest: &str) -> Option<(TokenKind, usize)> {
    let pair = match rest.get(..2) {
        Some("->") => Some(TokenKind::Arrow),
        Some("==") => Some(TokenKind::EqEq),
        Some("!=") => Some(TokenKind::BangEq),
        Some("<=") => Some(TokenKind::LtEq),
        Some(">=") => Some(TokenKind::GtEq),
        _ => None,
    };
    if let Some(kind) = pair {
        return Some((kind, 2));
    }
    let kind = match rest.chars().next()? {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '=' => TokenKind::Eq,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semicolon,
        '.' => TokenKind::Dot,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        _ => return None,
    };
    Some((kind, 1))
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    /// Counted in characters, not bytes.
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
