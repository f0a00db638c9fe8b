/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Bindings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

/// `name = value` inside a `let`.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// `name: value` inside a record literal.
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Num(f64, Span),
    Bool(bool, Span),
    Null(Span),
    StringLit(String, Span),
    Ident(String, Span),

    /// `a + b`, `a == b`, `a and b`, etc.
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `not x`, `-x`
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `cond ? a : b` and `if (cond) a else b`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },

    /// `f(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `expr[index]`
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `expr.field`
    Field {
        expr: Box<Expr>,
        field: String,
        span: Span,
    },

    /// `[a, b, c]`
    List(Vec<Expr>, Span),

    /// `{dist: p -> length(p) - 1, name: "circle"}`
    Record(Vec<FieldInit>, Span),

    /// `p -> body`, `(a, b) -> body`
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
        span: Span,
    },

    /// `let a = 1; b = a + 1 in body`
    Let {
        bindings: Vec<Binding>,
        body: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Num(_, s)        => s,
            Expr::Bool(_, s)       => s,
            Expr::Null(s)          => s,
            Expr::StringLit(_, s)  => s,
            Expr::Ident(_, s)      => s,
            Expr::BinOp { span, .. }   => span,
            Expr::UnOp { span, .. }    => span,
            Expr::Ternary { span, .. } => span,
            Expr::Call { span, .. }    => span,
            Expr::Index { span, .. }   => span,
            Expr::Field { span, .. }   => span,
            Expr::List(_, s)       => s,
            Expr::Record(_, s)     => s,
            Expr::Lambda { span, .. }  => span,
            Expr::Let { span, .. }     => span,
        }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod,
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
    And, Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add   => "+",  BinOp::Sub  => "-",
            BinOp::Mul   => "*",  BinOp::Div  => "/",  BinOp::Mod => "%",
            BinOp::Eq    => "==", BinOp::NotEq => "!=",
            BinOp::Lt    => "<",  BinOp::LtEq => "<=",
            BinOp::Gt    => ">",  BinOp::GtEq => ">=",
            BinOp::And   => "and", BinOp::Or  => "or",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}
