//! Tree-walking interpreter over the resolved `Operation` tree.
//! This is the reference semantics; the shader compiler must agree with it.

use std::rc::Rc;

use crate::analysis::{Capture, Lambda, Operation};
use crate::builtins::{as_condition, binary_op, unary_op};
use crate::context::Context;
use crate::error::{ErrorKind, EvalResult, Fault, RuntimeError};
use crate::runtime::atom::Atom;
use crate::runtime::frame::Frame;
use crate::runtime::function::Function;
use crate::runtime::record::Record;
use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, Span};

/// Component names accepted on lists of numbers: `v.x`, `v.y`, `v.z`, `v.w`.
pub fn swizzle_index(name: &str) -> Option<usize> {
    match name {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        "w" => Some(3),
        _   => None,
    }
}

pub struct Interpreter<'f, 'a> {
    frame: &'f mut Frame<'a>,
}

impl<'f, 'a> Interpreter<'f, 'a> {
    pub fn new(frame: &'f mut Frame<'a>) -> Self {
        Self { frame }
    }

    fn context(&self, span: Span) -> Context {
        Context::in_frame(Some(span), &*self.frame)
    }

    fn err(&self, kind: ErrorKind, span: Span, msg: impl Into<String>) -> RuntimeError {
        RuntimeError::new(kind, self.context(span), msg)
    }

    fn fault(&self, span: Span) -> impl FnOnce(Fault) -> RuntimeError + '_ {
        move |f| f.at(self.context(span))
    }

    // ─── Operations ──────────────────────────────────────────────────────────

    pub fn eval(&mut self, op: &Operation) -> EvalResult<Value> {
        match op {
            Operation::Constant(v, _) => Ok(v.clone()),

            Operation::Local(slot, span) => self.frame.get(*slot).cloned()
                .ok_or_else(|| self.err(ErrorKind::Undefined, *span, "binding used before it has a value")),

            Operation::NonLocal(i, span) => self.frame.nonlocal(*i).cloned()
                .ok_or_else(|| self.err(ErrorKind::Undefined, *span, "missing captured value")),

            Operation::Lambda(lambda) => self.closure(lambda),

            Operation::Call { callee, args, span } => {
                let callee = self.eval(callee)?;
                let Value::Function(f) = &callee else {
                    return Err(self.err(ErrorKind::WrongType, *span,
                        format!("cannot call a {}", callee.type_name())));
                };
                let args = self.eval_all(args)?;
                f.call_from(&args, &*self.frame, *span)
            }

            Operation::Builtin { builtin, args, span } => {
                let args = self.eval_all(args)?;
                builtin.call(&args).map_err(self.fault(*span))
            }

            Operation::Unary { op, operand, span } => {
                let v = self.eval(operand)?;
                unary_op(*op, &v).map_err(self.fault(*span))
            }

            Operation::Binary { op: op @ (BinOp::And | BinOp::Or), left, right, span } => {
                let l = self.eval(left)?;
                let l = as_condition(&l).map_err(self.fault(*span))?;
                if (*op == BinOp::And) != l {
                    return Ok(Value::Bool(l));
                }
                let r = self.eval(right)?;
                as_condition(&r).map(Value::Bool).map_err(self.fault(*span))
            }

            Operation::Binary { op, left, right, span } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                binary_op(*op, &l, &r).map_err(self.fault(*span))
            }

            Operation::If { condition, then_op, else_op, span } => {
                let c = self.eval(condition)?;
                if as_condition(&c).map_err(self.fault(*span))? {
                    self.eval(then_op)
                } else {
                    self.eval(else_op)
                }
            }

            Operation::Let { bindings, body, .. } => {
                for (slot, value) in bindings {
                    let v = self.eval(value)?;
                    self.frame.set(*slot, v);
                }
                self.eval(body)
            }

            Operation::List(items, _) => Ok(Value::list(self.eval_all(items)?)),

            Operation::Record(fields, _) => {
                let mut values = Vec::with_capacity(fields.len());
                for (name, op) in fields {
                    values.push((name.clone(), self.eval(op)?));
                }
                Ok(Value::Record(Rc::new(Record::from_fields(values))))
            }

            Operation::Field { expr, name, span } => {
                let v = self.eval(expr)?;
                self.field(&v, name, *span)
            }

            Operation::Index { expr, index, span } => {
                let v = self.eval(expr)?;
                let i = self.eval(index)?;
                self.index(&v, &i, *span)
            }
        }
    }

    fn eval_all(&mut self, ops: &[Operation]) -> EvalResult<Vec<Value>> {
        ops.iter().map(|op| self.eval(op)).collect()
    }

    fn closure(&self, lambda: &Lambda) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(lambda.captures.len());
        for capture in &lambda.captures {
            let v = match capture {
                Capture::Local(slot)  => self.frame.get(*slot),
                Capture::NonLocal(i)  => self.frame.nonlocal(*i),
            };
            let v = v.cloned().ok_or_else(|| self.err(ErrorKind::Undefined, lambda.span,
                "captured binding has no value yet"))?;
            values.push(v);
        }
        Ok(Value::Function(Rc::new(Function::new(lambda, values))))
    }

    fn field(&self, v: &Value, name: &Atom, span: Span) -> EvalResult<Value> {
        match v {
            Value::Record(r) => r.getfield(name).ok_or_else(|| self.err(ErrorKind::MissingField, span,
                format!("record has no field `{name}`"))),
            Value::List(items) => {
                let Some(i) = swizzle_index(name.as_str()) else {
                    return Err(self.err(ErrorKind::WrongType, span,
                        format!("lists have no field `{name}`")));
                };
                items.get(i).cloned().ok_or_else(|| self.err(ErrorKind::OutOfRange, span,
                    format!("`.{name}` on a list of {} elements", items.len())))
            }
            other => Err(self.err(ErrorKind::WrongType, span,
                format!("cannot access field `{name}` of a {}", other.type_name()))),
        }
    }

    fn index(&self, v: &Value, i: &Value, span: Span) -> EvalResult<Value> {
        let Value::List(items) = v else {
            return Err(self.err(ErrorKind::WrongType, span, format!("cannot index a {}", v.type_name())));
        };
        let Value::Num(n) = i else {
            return Err(self.err(ErrorKind::WrongType, span,
                format!("index must be a number, got {}", i.type_name())));
        };
        if n.fract() != 0.0 || *n < 0.0 || *n >= items.len() as f64 {
            return Err(self.err(ErrorKind::OutOfRange, span,
                format!("index {n} out of range for a list of {} elements", items.len())));
        }
        Ok(items[*n as usize].clone())
    }
}
