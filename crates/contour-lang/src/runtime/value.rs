use std::fmt;
use std::rc::Rc;

use crate::runtime::function::Function;
use crate::runtime::record::Record;

/// A dynamic runtime value.
///
/// There is no "missing" variant: lookups that can fail return `Option<Value>`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    List(Rc<[Value]>),
    Record(Rc<Record>),
    Function(Rc<Function>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::from(items))
    }

    /// `[x, y, ...]` from plain numbers.
    pub fn vector(components: &[f64]) -> Self {
        Value::list(components.iter().map(|c| Value::Num(*c)).collect())
    }

    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Runtime-checked narrowing to one variant's payload. Yields `None` on
    /// any mismatch.
    pub fn narrow<T: Narrow + ?Sized>(&self) -> Option<&T> {
        T::narrow(self)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null        => "null",
            Value::Bool(_)     => "bool",
            Value::Num(_)      => "number",
            Value::Str(_)      => "string",
            Value::List(_)     => "list",
            Value::Record(_)   => "record",
            Value::Function(_) => "function",
        }
    }

    /// Structural equality. Functions compare by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null)               => true,
            (Value::Bool(a), Value::Bool(b))         => a == b,
            (Value::Num(a), Value::Num(b))           => a == b,
            (Value::Str(a), Value::Str(b))           => a == b,
            (Value::List(a), Value::List(b))         => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Record(a), Value::Record(b))     => a.equals(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ─── Narrowing ───────────────────────────────────────────────────────────────

/// A payload type that a `Value` can be narrowed to.
pub trait Narrow {
    fn narrow(value: &Value) -> Option<&Self>;
}

impl Narrow for f64 {
    fn narrow(value: &Value) -> Option<&Self> {
        match value { Value::Num(x) => Some(x), _ => None }
    }
}

impl Narrow for bool {
    fn narrow(value: &Value) -> Option<&Self> {
        match value { Value::Bool(b) => Some(b), _ => None }
    }
}

impl Narrow for str {
    fn narrow(value: &Value) -> Option<&Self> {
        match value { Value::Str(s) => Some(&**s), _ => None }
    }
}

impl Narrow for [Value] {
    fn narrow(value: &Value) -> Option<&Self> {
        match value { Value::List(items) => Some(&**items), _ => None }
    }
}

impl Narrow for Record {
    fn narrow(value: &Value) -> Option<&Self> {
        match value { Value::Record(r) => Some(&**r), _ => None }
    }
}

impl Narrow for Function {
    fn narrow(value: &Value) -> Option<&Self> {
        match value { Value::Function(f) => Some(&**f), _ => None }
    }
}

// ─── Printing ────────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null      => f.write_str("null"),
            Value::Bool(b)   => write!(f, "{b}"),
            Value::Num(x)    => write!(f, "{x}"),
            Value::Str(s)    => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(r)   => write!(f, "{r}"),
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "<function {name}>"),
                None       => f.write_str("<function>"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_matches_only_its_variant() {
        let n = Value::Num(2.5);
        assert_eq!(n.narrow::<f64>(), Some(&2.5));
        assert!(n.narrow::<bool>().is_none());
        assert!(n.narrow::<Function>().is_none());
        assert!(n.narrow::<Record>().is_none());

        let s = Value::string("hi");
        assert_eq!(s.narrow::<str>(), Some("hi"));
        assert!(s.narrow::<[Value]>().is_none());
    }

    #[test]
    fn narrow_list() {
        let v = Value::vector(&[1.0, 2.0]);
        let items = v.narrow::<[Value]>().unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn structural_equality() {
        assert!(Value::vector(&[1.0, 2.0]).equals(&Value::vector(&[1.0, 2.0])));
        assert!(!Value::vector(&[1.0, 2.0]).equals(&Value::vector(&[1.0])));
        assert!(!Value::Num(1.0).equals(&Value::Bool(true)));
        assert!(Value::Null.equals(&Value::Null));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Num(1.0).to_string(), "1");
        assert_eq!(Value::Num(-0.5).to_string(), "-0.5");
        assert_eq!(Value::vector(&[1.0, 2.5]).to_string(), "[1, 2.5]");
        assert_eq!(Value::string("a\"b").to_string(), "\"a\\\"b\"");
    }
}
