//! The typed value algebra used during symbolic evaluation.

use std::fmt;
use std::rc::Rc;

use crate::builtins::Builtin;
use crate::error::{ErrorKind, Fault};
use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, UnOp};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlType {
    Bool,
    Num,
    Vec2,
    Vec3,
    Vec4,
}

impl GlType {
    /// Vector type with `n` components; `n == 1` is `Num`.
    pub fn with_count(n: usize) -> Option<GlType> {
        match n {
            1 => Some(GlType::Num),
            2 => Some(GlType::Vec2),
            3 => Some(GlType::Vec3),
            4 => Some(GlType::Vec4),
            _ => None,
        }
    }

    /// Number of float components. `Bool` has none.
    pub fn count(self) -> usize {
        match self {
            GlType::Bool => 0,
            GlType::Num  => 1,
            GlType::Vec2 => 2,
            GlType::Vec3 => 3,
            GlType::Vec4 => 4,
        }
    }

    pub fn is_numeric(self) -> bool { self != GlType::Bool }
    pub fn is_vector(self) -> bool { self.count() > 1 }

    pub fn glsl_name(self) -> &'static str {
        match self {
            GlType::Bool => "bool",
            GlType::Num  => "float",
            GlType::Vec2 => "vec2",
            GlType::Vec3 => "vec3",
            GlType::Vec4 => "vec4",
        }
    }
}

impl fmt::Display for GlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

// ─── Type rules ──────────────────────────────────────────────────────────────

/// The common type of numeric operands that combine elementwise: all scalars,
/// or vectors of one size mixed with scalars.
pub fn widest(what: &str, types: &[GlType]) -> Result<GlType, Fault> {
    let mut result = GlType::Num;
    for ty in types {
        if !ty.is_numeric() {
            return Err(Fault::new(ErrorKind::TypeMismatch,
                format!("`{what}` expects float or vector operands, got {ty}")));
        }
        if ty.is_vector() {
            if result.is_vector() && result != *ty {
                return Err(Fault::new(ErrorKind::TypeMismatch,
                    format!("`{what}` operands have incompatible types {result} and {ty}")));
            }
            result = *ty;
        }
    }
    Ok(result)
}

/// Result type of `l op r` in shader code.
pub fn binary_type(op: BinOp, l: GlType, r: GlType) -> Result<GlType, Fault> {
    let sym = op.symbol();
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => widest(sym, &[l, r]),
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
            if l == GlType::Num && r == GlType::Num {
                Ok(GlType::Bool)
            } else {
                Err(Fault::new(ErrorKind::TypeMismatch,
                    format!("`{sym}` compares floats, got {l} and {r}")))
            }
        }
        BinOp::Eq | BinOp::NotEq => {
            if l == r {
                Ok(GlType::Bool)
            } else {
                Err(Fault::new(ErrorKind::TypeMismatch,
                    format!("`{sym}` operands have different types {l} and {r}")))
            }
        }
        BinOp::And | BinOp::Or => {
            if l == GlType::Bool && r == GlType::Bool {
                Ok(GlType::Bool)
            } else {
                Err(Fault::new(ErrorKind::TypeMismatch,
                    format!("`{sym}` expects bool operands, got {l} and {r}")))
            }
        }
    }
}

pub fn unary_type(op: UnOp, ty: GlType) -> Result<GlType, Fault> {
    match (op, ty) {
        (UnOp::Neg, t) if t.is_numeric() => Ok(t),
        (UnOp::Not, GlType::Bool)        => Ok(GlType::Bool),
        (UnOp::Neg, t) => Err(Fault::new(ErrorKind::TypeMismatch, format!("unary `-` on {t}"))),
        (UnOp::Not, t) => Err(Fault::new(ErrorKind::TypeMismatch, format!("`not` expects bool, got {t}"))),
    }
}

// ─── Generated code ──────────────────────────────────────────────────────────

/// Target-language expression tree. Operands of emitted statements are
/// always atomic (variables, literals, or constructors of literals).
#[derive(Debug, Clone, PartialEq)]
pub enum GlExpr {
    Var(Rc<str>),
    Num(f64),
    Bool(bool),
    /// `vec2(a, b)` or the splat `vec3(s)`
    Construct(GlType, Vec<GlExpr>),
    Unary(UnOp, Box<GlExpr>),
    Binary(BinOp, Box<GlExpr>, Box<GlExpr>),
    Call(Builtin, Vec<GlExpr>),
    /// `v[2]` with a constant component index
    Component(Box<GlExpr>, usize),
    /// `v[int(i)]`
    Index(Box<GlExpr>, Box<GlExpr>),
    /// `c ? a : b`
    Select(Box<GlExpr>, Box<GlExpr>, Box<GlExpr>),
}

impl GlExpr {
    pub fn var(name: &str) -> Self { GlExpr::Var(Rc::from(name)) }

    pub fn is_literal(&self) -> bool {
        match self {
            GlExpr::Num(_) | GlExpr::Bool(_) => true,
            GlExpr::Construct(_, parts) => parts.iter().all(GlExpr::is_literal),
            _ => false,
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() { return f.write_str("(0.0/0.0)"); }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "(1.0/0.0)" } else { "(-1.0/0.0)" });
    }
    let magnitude = x.abs();
    let mut text = if magnitude != 0.0 && !(1e-5..1e7).contains(&magnitude) {
        format!("{magnitude:e}")
    } else {
        format!("{magnitude}")
    };
    if !text.contains('.') && !text.contains('e') { text.push_str(".0"); }
    if x.is_sign_negative() && x != 0.0 { write!(f, "(-{text})") } else { f.write_str(&text) }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[GlExpr]) -> fmt::Result {
    for (i, a) in args.iter().enumerate() {
        if i > 0 { f.write_str(", ")?; }
        write!(f, "{a}")?;
    }
    Ok(())
}

impl fmt::Display for GlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlExpr::Var(name)  => f.write_str(name),
            GlExpr::Num(x)     => write_float(f, *x),
            GlExpr::Bool(b)    => write!(f, "{b}"),
            GlExpr::Construct(ty, parts) => {
                write!(f, "{ty}(")?;
                write_args(f, parts)?;
                f.write_str(")")
            }
            GlExpr::Unary(UnOp::Neg, e) => write!(f, "-{e}"),
            GlExpr::Unary(UnOp::Not, e) => write!(f, "!{e}"),
            GlExpr::Binary(op, l, r) => {
                let sym = match op {
                    BinOp::And => "&&",
                    BinOp::Or  => "||",
                    other      => other.symbol(),
                };
                write!(f, "{l} {sym} {r}")
            }
            GlExpr::Call(builtin, args) => {
                write!(f, "{}(", builtin.glsl_name().unwrap_or(builtin.name()))?;
                write_args(f, args)?;
                f.write_str(")")
            }
            GlExpr::Component(e, i) => write!(f, "{e}[{i}]"),
            GlExpr::Index(e, i)     => write!(f, "{e}[int({i})]"),
            GlExpr::Select(c, a, b) => write!(f, "{c} ? {a} : {b}"),
        }
    }
}

// ─── Typed values ────────────────────────────────────────────────────────────

/// A type plus a handle to code already available in the enclosing context.
#[derive(Debug, Clone, PartialEq)]
pub struct GlValue {
    pub ty: GlType,
    pub code: GlExpr,
}

impl GlValue {
    pub fn new(ty: GlType, code: GlExpr) -> Self {
        Self { ty, code }
    }

    /// An externally supplied variable, such as the shader's point input.
    pub fn input(ty: GlType, name: &str) -> Self {
        Self { ty, code: GlExpr::var(name) }
    }

    pub fn num(x: f64) -> Self {
        Self { ty: GlType::Num, code: GlExpr::Num(x) }
    }

    /// Literal form of a dynamic value, if it has one: numbers, booleans and
    /// lists of two to four numbers.
    pub fn from_constant(value: &Value) -> Option<GlValue> {
        match value {
            Value::Num(x)  => Some(GlValue::num(*x)),
            Value::Bool(b) => Some(GlValue::new(GlType::Bool, GlExpr::Bool(*b))),
            Value::List(items) => {
                let ty = GlType::with_count(items.len()).filter(|t| t.is_vector())?;
                let parts = items.iter()
                    .map(|v| v.narrow::<f64>().map(|x| GlExpr::Num(*x)))
                    .collect::<Option<Vec<_>>>()?;
                Some(GlValue::new(ty, GlExpr::Construct(ty, parts)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for GlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.code)
    }
}
