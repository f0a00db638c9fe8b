//! Builtin functions and operator kernels.
//!
//! Every operation is defined once here, with GLSL semantics, and used by the
//! dynamic interpreter, by the symbolic compiler (for typing), and by the
//! reference evaluator for emitted code. That is what keeps the two
//! evaluation modes in agreement: `%` is GLSL `mod`, `sign(0)` is `0`, and
//! scalars broadcast over vectors.

use crate::error::{ErrorKind, Fault};
use crate::gl::types::{GlType, widest};
use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, UnOp};

// ─── Builtin table ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sqrt, Abs, Floor, Ceil, Fract, Sign,
    Sin, Cos, Tan, Exp, Log,
    Atan2, Pow, Mod, Min, Max, Clamp, Mix,
    Length, Dot, Normalize,
    Count,
}

const TABLE: &[(&str, Builtin, usize)] = &[
    ("sqrt",      Builtin::Sqrt,      1),
    ("abs",       Builtin::Abs,       1),
    ("floor",     Builtin::Floor,     1),
    ("ceil",      Builtin::Ceil,      1),
    ("fract",     Builtin::Fract,     1),
    ("sign",      Builtin::Sign,      1),
    ("sin",       Builtin::Sin,       1),
    ("cos",       Builtin::Cos,       1),
    ("tan",       Builtin::Tan,       1),
    ("exp",       Builtin::Exp,       1),
    ("log",       Builtin::Log,       1),
    ("atan2",     Builtin::Atan2,     2),
    ("pow",       Builtin::Pow,       2),
    ("mod",       Builtin::Mod,       2),
    ("min",       Builtin::Min,       2),
    ("max",       Builtin::Max,       2),
    ("clamp",     Builtin::Clamp,     3),
    ("mix",       Builtin::Mix,       3),
    ("length",    Builtin::Length,    1),
    ("dot",       Builtin::Dot,       2),
    ("normalize", Builtin::Normalize, 1),
    ("count",     Builtin::Count,     1),
];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        TABLE.iter().find(|(n, _, _)| *n == name).map(|(_, b, _)| *b)
    }

    fn entry(self) -> &'static (&'static str, Builtin, usize) {
        TABLE.iter().find(|(_, b, _)| *b == self).unwrap_or(&TABLE[0])
    }

    pub fn name(self) -> &'static str { self.entry().0 }
    pub fn arity(self) -> usize { self.entry().2 }

    /// Name of the equivalent GLSL function. `None` for dynamic-only builtins.
    pub fn glsl_name(self) -> Option<&'static str> {
        match self {
            Builtin::Atan2 => Some("atan"),
            Builtin::Count => None,
            other          => Some(other.name()),
        }
    }

    pub fn check_arity(self, given: usize) -> Result<(), Fault> {
        if given == self.arity() {
            Ok(())
        } else {
            Err(Fault::new(ErrorKind::WrongArity, format!(
                "`{}` expects {} argument{}, got {given}",
                self.name(), self.arity(), if self.arity() == 1 { "" } else { "s" }
            )))
        }
    }

    // ─── Dynamic evaluation ──────────────────────────────────────────────────

    pub fn call(self, args: &[Value]) -> Result<Value, Fault> {
        self.check_arity(args.len())?;
        let name = self.name();
        let arg = |i: usize| Gen::from_value(&args[i], name);

        let result = match self {
            Builtin::Sqrt  => arg(0)?.map(f64::sqrt),
            Builtin::Abs   => arg(0)?.map(f64::abs),
            Builtin::Floor => arg(0)?.map(f64::floor),
            Builtin::Ceil  => arg(0)?.map(f64::ceil),
            Builtin::Fract => arg(0)?.map(|x| x - x.floor()),
            Builtin::Sign  => arg(0)?.map(glsl_sign),
            Builtin::Sin   => arg(0)?.map(f64::sin),
            Builtin::Cos   => arg(0)?.map(f64::cos),
            Builtin::Tan   => arg(0)?.map(f64::tan),
            Builtin::Exp   => arg(0)?.map(f64::exp),
            Builtin::Log   => arg(0)?.map(f64::ln),
            Builtin::Atan2 => arg(0)?.zip(arg(1)?, f64::atan2, name)?,
            Builtin::Pow   => arg(0)?.zip(arg(1)?, f64::powf, name)?,
            Builtin::Mod   => arg(0)?.zip(arg(1)?, glsl_mod, name)?,
            Builtin::Min   => arg(0)?.zip(arg(1)?, f64::min, name)?,
            Builtin::Max   => arg(0)?.zip(arg(1)?, f64::max, name)?,
            Builtin::Clamp => arg(0)?
                .zip(arg(1)?, f64::max, name)?
                .zip(arg(2)?, f64::min, name)?,
            Builtin::Mix => {
                let t = arg(2)?;
                let a = arg(0)?.zip(t.clone(), |x, t| x * (1.0 - t), name)?;
                let b = arg(1)?.zip(t, |y, t| y * t, name)?;
                a.zip(b, |a, b| a + b, name)?
            }
            Builtin::Length => Gen::Scalar(arg(0)?.length()),
            Builtin::Dot => {
                let products = arg(0)?.zip(arg(1)?, |a, b| a * b, name)?;
                Gen::Scalar(products.components().iter().sum())
            }
            Builtin::Normalize => {
                let v = arg(0)?;
                let len = v.length();
                v.map(|x| x / len)
            }
            Builtin::Count => {
                return match &args[0] {
                    Value::List(items) => Ok(Value::Num(items.len() as f64)),
                    Value::Str(s)      => Ok(Value::Num(s.chars().count() as f64)),
                    other => Err(Fault::new(ErrorKind::WrongType, format!(
                        "`count` expects a list or string, got {}", other.type_name()
                    ))),
                };
            }
        };
        Ok(result.into_value())
    }

    // ─── Typing ──────────────────────────────────────────────────────────────

    /// Result type of a call in shader code, and the vector type that scalar
    /// arguments must be widened to (GLSL does not broadcast every builtin).
    pub fn signature(self, args: &[GlType]) -> Result<(GlType, Option<GlType>), Fault> {
        self.check_arity(args.len())?;
        if self.glsl_name().is_none() {
            return Err(Fault::new(ErrorKind::UnsupportedOperation,
                format!("builtin `{}` is not supported in shader code", self.name())));
        }
        let common = widest(self.name(), args)?;
        let promote = (common.is_vector() && args.iter().any(|t| !t.is_vector())).then_some(common);
        let result = match self {
            Builtin::Length | Builtin::Dot => GlType::Num,
            _ => common,
        };
        Ok((result, promote))
    }
}

fn glsl_sign(x: f64) -> f64 {
    if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { x }
}

/// GLSL `mod`: the result has the sign of `y`.
pub fn glsl_mod(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

// ─── Generic numeric operands ────────────────────────────────────────────────

/// A number or a list of numbers, the dynamic counterpart of GLSL genType.
#[derive(Debug, Clone, PartialEq)]
enum Gen {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Gen {
    fn from_value(value: &Value, what: &str) -> Result<Gen, Fault> {
        let wrong = || Fault::new(ErrorKind::WrongType, format!(
            "`{what}` expects a number or a list of numbers, got {}", value.type_name()
        ));
        match value {
            Value::Num(x) => Ok(Gen::Scalar(*x)),
            Value::List(items) => items.iter()
                .map(|v| v.narrow::<f64>().copied())
                .collect::<Option<Vec<f64>>>()
                .map(Gen::Vector)
                .ok_or_else(wrong),
            _ => Err(wrong()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Gen::Scalar(x)  => Value::Num(x),
            Gen::Vector(xs) => Value::vector(&xs),
        }
    }

    fn components(&self) -> &[f64] {
        match self {
            Gen::Scalar(x)  => std::slice::from_ref(x),
            Gen::Vector(xs) => xs,
        }
    }

    fn length(&self) -> f64 {
        self.components().iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Gen {
        match self {
            Gen::Scalar(x)  => Gen::Scalar(f(x)),
            Gen::Vector(xs) => Gen::Vector(xs.into_iter().map(f).collect()),
        }
    }

    fn zip(self, other: Gen, f: impl Fn(f64, f64) -> f64, what: &str) -> Result<Gen, Fault> {
        match (self, other) {
            (Gen::Scalar(a), Gen::Scalar(b)) => Ok(Gen::Scalar(f(a, b))),
            (Gen::Scalar(a), Gen::Vector(bs)) => Ok(Gen::Vector(bs.into_iter().map(|b| f(a, b)).collect())),
            (Gen::Vector(as_), Gen::Scalar(b)) => Ok(Gen::Vector(as_.into_iter().map(|a| f(a, b)).collect())),
            (Gen::Vector(as_), Gen::Vector(bs)) => {
                if as_.len() != bs.len() {
                    return Err(Fault::new(ErrorKind::WrongType, format!(
                        "`{what}` operands have mismatched lengths {} and {}", as_.len(), bs.len()
                    )));
                }
                Ok(Gen::Vector(as_.into_iter().zip(bs).map(|(a, b)| f(a, b)).collect()))
            }
        }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

/// `l op r` over dynamic values. `and`/`or` are evaluated strictly here;
/// short-circuiting is the caller's job.
pub fn binary_op(op: BinOp, l: &Value, r: &Value) -> Result<Value, Fault> {
    let sym = op.symbol();
    match op {
        BinOp::Add => Ok(Gen::from_value(l, sym)?.zip(Gen::from_value(r, sym)?, |a, b| a + b, sym)?.into_value()),
        BinOp::Sub => Ok(Gen::from_value(l, sym)?.zip(Gen::from_value(r, sym)?, |a, b| a - b, sym)?.into_value()),
        BinOp::Mul => Ok(Gen::from_value(l, sym)?.zip(Gen::from_value(r, sym)?, |a, b| a * b, sym)?.into_value()),
        BinOp::Div => Ok(Gen::from_value(l, sym)?.zip(Gen::from_value(r, sym)?, |a, b| a / b, sym)?.into_value()),
        BinOp::Mod => Ok(Gen::from_value(l, sym)?.zip(Gen::from_value(r, sym)?, glsl_mod, sym)?.into_value()),

        BinOp::Eq    => Ok(Value::Bool(l.equals(r))),
        BinOp::NotEq => Ok(Value::Bool(!l.equals(r))),

        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => match (l, r) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Bool(match op {
                BinOp::Lt   => a < b,
                BinOp::LtEq => a <= b,
                BinOp::Gt   => a > b,
                _           => a >= b,
            })),
            _ => Err(Fault::new(ErrorKind::WrongType, format!(
                "`{sym}` compares numbers, got {} and {}", l.type_name(), r.type_name()
            ))),
        },

        BinOp::And | BinOp::Or => match (l, r) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinOp::And { *a && *b } else { *a || *b })),
            _ => Err(Fault::new(ErrorKind::WrongType, format!(
                "`{sym}` expects bools, got {} and {}", l.type_name(), r.type_name()
            ))),
        },
    }
}

pub fn unary_op(op: UnOp, v: &Value) -> Result<Value, Fault> {
    match op {
        UnOp::Neg => Ok(Gen::from_value(v, "-")?.map(|x| -x).into_value()),
        UnOp::Not => match v {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(Fault::new(ErrorKind::WrongType, format!(
                "`not` expects bool, got {}", other.type_name()
            ))),
        },
    }
}

/// Truthiness for conditionals: only booleans are accepted.
pub fn as_condition(v: &Value) -> Result<bool, Fault> {
    v.narrow::<bool>().copied().ok_or_else(|| Fault::new(ErrorKind::WrongType, format!(
        "condition must be bool, got {}", v.type_name()
    )))
}
