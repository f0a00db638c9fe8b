//! CPU evaluation of emitted shader statements, with GLSL semantics.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::builtins::{as_condition, binary_op, unary_op};
use crate::error::{ErrorKind, Fault};
use crate::gl::context::GlStatement;
use crate::gl::types::GlExpr;
use crate::runtime::value::Value;

#[derive(Default)]
pub struct GlInterp {
    vars: FxHashMap<Rc<str>, Value>,
}

impl GlInterp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str, value: Value) {
        self.vars.insert(Rc::from(name), value);
    }

    pub fn run(&mut self, statements: &[GlStatement]) -> Result<(), Fault> {
        for stmt in statements {
            let v = self.eval(&stmt.expr)?;
            self.vars.insert(stmt.name.clone(), v);
        }
        Ok(())
    }

    pub fn eval(&self, expr: &GlExpr) -> Result<Value, Fault> {
        match expr {
            GlExpr::Var(name) => self.vars.get(name).cloned().ok_or_else(|| {
                Fault::new(ErrorKind::Undefined, format!("unbound shader variable `{name}`"))
            }),
            GlExpr::Num(x)  => Ok(Value::Num(*x)),
            GlExpr::Bool(b) => Ok(Value::Bool(*b)),

            GlExpr::Construct(ty, parts) => {
                let mut components = Vec::with_capacity(ty.count());
                for part in parts {
                    match self.eval(part)? {
                        Value::Num(x) => components.push(x),
                        Value::List(items) => {
                            components.extend(items.iter().filter_map(|v| v.narrow::<f64>().copied()));
                        }
                        other => return Err(Fault::new(ErrorKind::WrongType,
                            format!("cannot build {ty} from {}", other.type_name()))),
                    }
                }
                if components.len() == 1 {
                    components.resize(ty.count(), components[0]);
                }
                Ok(Value::vector(&components))
            }

            GlExpr::Unary(op, e) => unary_op(*op, &self.eval(e)?),
            GlExpr::Binary(op, l, r) => binary_op(*op, &self.eval(l)?, &self.eval(r)?),

            GlExpr::Call(builtin, args) => {
                let args = args.iter().map(|a| self.eval(a)).collect::<Result<Vec<_>, _>>()?;
                builtin.call(&args)
            }

            GlExpr::Component(e, i) => self.component(&self.eval(e)?, *i as f64),
            GlExpr::Index(e, i) => {
                let i = self.eval(i)?;
                let i = i.narrow::<f64>().copied().ok_or_else(|| {
                    Fault::new(ErrorKind::WrongType, "vector index must be float")
                })?;
                // int() truncates toward zero
                self.component(&self.eval(e)?, i.trunc())
            }

            GlExpr::Select(c, a, b) => {
                if as_condition(&self.eval(c)?)? { self.eval(a) } else { self.eval(b) }
            }
        }
    }

    fn component(&self, v: &Value, i: f64) -> Result<Value, Fault> {
        let items = v.narrow::<[Value]>().ok_or_else(|| {
            Fault::new(ErrorKind::WrongType, format!("cannot index a {}", v.type_name()))
        })?;
        if i < 0.0 || i >= items.len() as f64 {
            return Err(Fault::new(ErrorKind::OutOfRange, format!("component {i} of a {}-vector", items.len())));
        }
        Ok(items[i as usize].clone())
    }
}
