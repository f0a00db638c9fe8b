//! Symbolic evaluation: runs an `Operation` body over typed values and
//! emits equivalent shader statements into the frame's context.
//!
//! Values that are known while compiling (captured numbers, vectors and
//! functions, literal conditions) are folded; everything else becomes a
//! statement. Constructs with no shader equivalent fail with
//! `UnsupportedOperation`.

use std::rc::Rc;

use crate::analysis::Operation;
use crate::builtins::Builtin;
use crate::context::{CallSite, Context};
use crate::error::{ErrorKind, EvalResult, Fault, RuntimeError};
use crate::gl::frame::GlFrame;
use crate::gl::types::{GlExpr, GlType, GlValue, binary_type, unary_type};
use crate::runtime::atom::Atom;
use crate::runtime::function::Function;
use crate::runtime::interpreter::swizzle_index;
use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, Span};

pub struct Compiler<'f, 'a> {
    frame: &'f mut GlFrame<'a>,
    nonlocals: &'f [Value],
}

/// What a constant looks like when it reaches shader code.
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null        => "null",
        Value::Str(_)      => "string value",
        Value::List(_)     => "list value",
        Value::Record(_)   => "record value",
        Value::Function(_) => "function value",
        Value::Bool(_) | Value::Num(_) => "value",
    }
}

impl<'f, 'a> Compiler<'f, 'a> {
    pub fn new(frame: &'f mut GlFrame<'a>, nonlocals: &'f [Value]) -> Self {
        Self { frame, nonlocals }
    }

    fn context(&self, span: Span) -> Context {
        Context::in_frame(Some(span), &*self.frame)
    }

    fn err(&self, kind: ErrorKind, span: Span, msg: impl Into<String>) -> RuntimeError {
        RuntimeError::new(kind, self.context(span), msg)
    }

    fn unsupported(&self, span: Span, construct: &str) -> RuntimeError {
        RuntimeError::unsupported(self.context(span), construct)
    }

    fn fault(&self, span: Span) -> impl FnOnce(Fault) -> RuntimeError + '_ {
        move |f| f.at(self.context(span))
    }

    fn emit(&self, ty: GlType, expr: GlExpr) -> GlValue {
        self.frame.context().emit(ty, expr)
    }

    fn constant(&self, value: &Value, span: Span) -> EvalResult<GlValue> {
        GlValue::from_constant(value).ok_or_else(|| self.unsupported(span, describe(value)))
    }

    /// The value of `op` if it is fixed at compile time: literals, captured
    /// values, and fields of captured records.
    fn static_value(&self, op: &Operation) -> Option<Value> {
        match op {
            Operation::Constant(v, _) => Some(v.clone()),
            Operation::NonLocal(i, _) => self.nonlocals.get(*i).cloned(),
            Operation::Field { expr, name, .. } => match self.static_value(expr)? {
                Value::Record(r) => r.getfield(name),
                _ => None,
            },
            _ => None,
        }
    }

    // ─── Operations ──────────────────────────────────────────────────────────

    pub fn eval(&mut self, op: &Operation) -> EvalResult<GlValue> {
        match op {
            Operation::Constant(v, span) => self.constant(v, *span),

            Operation::Local(slot, span) => self.frame.get(*slot).cloned()
                .ok_or_else(|| self.err(ErrorKind::Undefined, *span, "binding used before it has a value")),

            Operation::NonLocal(i, span) => match self.nonlocals.get(*i) {
                Some(v) => self.constant(v, *span),
                None    => Err(self.err(ErrorKind::Undefined, *span, "missing captured value")),
            },

            Operation::Lambda(l) => Err(self.unsupported(l.span, "function construction")),

            Operation::Call { callee, args, span } => {
                let Some(Value::Function(f)) = self.static_value(callee) else {
                    return Err(self.unsupported(*span, "call of a computed function"));
                };
                let args = self.eval_all(args)?;
                self.call(&f, args, *span)
            }

            Operation::Builtin { builtin, args, span } => {
                let args = self.eval_all(args)?;
                self.builtin(*builtin, args, *span)
            }

            Operation::Unary { op, operand, span } => {
                let v = self.eval(operand)?;
                let ty = unary_type(*op, v.ty).map_err(self.fault(*span))?;
                Ok(self.emit(ty, GlExpr::Unary(*op, Box::new(v.code))))
            }

            Operation::Binary { op, left, right, span } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                let ty = binary_type(*op, l.ty, r.ty).map_err(self.fault(*span))?;
                let expr = if *op == BinOp::Mod {
                    GlExpr::Call(Builtin::Mod, vec![splat(l, ty), splat(r, ty)])
                } else {
                    GlExpr::Binary(*op, Box::new(l.code), Box::new(r.code))
                };
                Ok(self.emit(ty, expr))
            }

            Operation::If { condition, then_op, else_op, span } => {
                let c = self.eval(condition)?;
                if c.ty != GlType::Bool {
                    return Err(self.err(ErrorKind::TypeMismatch, *span,
                        format!("condition must be bool, got {}", c.ty)));
                }
                if let GlExpr::Bool(b) = &c.code {
                    return self.eval(if *b { then_op } else { else_op });
                }
                let a = self.eval(then_op)?;
                let b = self.eval(else_op)?;
                if a.ty != b.ty {
                    return Err(self.err(ErrorKind::TypeMismatch, *span,
                        format!("branches have different types {} and {}", a.ty, b.ty)));
                }
                Ok(self.emit(a.ty, GlExpr::Select(Box::new(c.code), Box::new(a.code), Box::new(b.code))))
            }

            Operation::Let { bindings, body, .. } => {
                for (slot, value) in bindings {
                    let v = self.eval(value)?;
                    self.frame.set(*slot, v);
                }
                self.eval(body)
            }

            Operation::List(items, span) => {
                let Some(ty) = GlType::with_count(items.len()).filter(|t| t.is_vector()) else {
                    return Err(self.unsupported(*span, &format!("list of {} elements", items.len())));
                };
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    let v = self.eval(item)?;
                    if v.ty != GlType::Num {
                        return Err(self.err(ErrorKind::TypeMismatch, item.span(),
                            format!("vector components must be float, got {}", v.ty)));
                    }
                    parts.push(v.code);
                }
                let expr = GlExpr::Construct(ty, parts);
                if expr.is_literal() { Ok(GlValue::new(ty, expr)) } else { Ok(self.emit(ty, expr)) }
            }

            Operation::Record(_, span) => Err(self.unsupported(*span, "record construction")),

            Operation::Field { expr, name, span } => {
                if let Some(v) = self.static_value(op) {
                    return self.constant(&v, *span);
                }
                if let Some(Value::Record(_)) = self.static_value(expr) {
                    return Err(self.err(ErrorKind::MissingField, *span,
                        format!("record has no field `{name}`")));
                }
                let v = self.eval(expr)?;
                self.component(v, name, *span)
            }

            Operation::Index { expr, index, span } => {
                let v = self.eval(expr)?;
                let i = self.eval(index)?;
                self.index(v, i, *span)
            }
        }
    }

    fn eval_all(&mut self, ops: &[Operation]) -> EvalResult<Vec<GlValue>> {
        ops.iter().map(|op| self.eval(op)).collect()
    }

    /// Compile a call to a function known at compile time in a child frame.
    fn call(&mut self, f: &Rc<Function>, args: Vec<GlValue>, span: Span) -> EvalResult<GlValue> {
        if args.len() != f.nargs {
            let name = f.name.as_ref().map(Atom::as_str).unwrap_or("<lambda>");
            return Err(self.err(ErrorKind::WrongArity, span,
                format!("`{name}` expects {} argument{}, got {}", f.nargs,
                    if f.nargs == 1 { "" } else { "s" }, args.len())));
        }
        let context = self.frame.context();
        let site = CallSite::new(f.name.clone(), Some(span));
        let mut child = GlFrame::make(f.nslots, context, Some(&*self.frame), site);
        for (slot, arg) in args.into_iter().enumerate() {
            child.set(slot, arg);
        }
        f.gl_call(&mut child)
    }

    fn builtin(&self, builtin: Builtin, args: Vec<GlValue>, span: Span) -> EvalResult<GlValue> {
        let types: Vec<GlType> = args.iter().map(|a| a.ty).collect();
        let (ty, promote) = builtin.signature(&types).map_err(self.fault(span))?;
        let args = args.into_iter()
            .map(|a| match promote { Some(vec) => splat(a, vec), None => a.code })
            .collect();
        Ok(self.emit(ty, GlExpr::Call(builtin, args)))
    }

    fn component(&self, v: GlValue, name: &Atom, span: Span) -> EvalResult<GlValue> {
        if !v.ty.is_vector() {
            return Err(self.err(ErrorKind::TypeMismatch, span,
                format!("cannot access field `{name}` of {}", v.ty)));
        }
        let Some(i) = swizzle_index(name.as_str()) else {
            return Err(self.err(ErrorKind::TypeMismatch, span,
                format!("{} has no field `{name}`", v.ty)));
        };
        if i >= v.ty.count() {
            return Err(self.err(ErrorKind::OutOfRange, span,
                format!("`.{name}` on {}", v.ty)));
        }
        Ok(self.emit(GlType::Num, GlExpr::Component(Box::new(v.code), i)))
    }

    fn index(&self, v: GlValue, i: GlValue, span: Span) -> EvalResult<GlValue> {
        if !v.ty.is_vector() {
            return Err(self.err(ErrorKind::TypeMismatch, span, format!("cannot index {}", v.ty)));
        }
        if i.ty != GlType::Num {
            return Err(self.err(ErrorKind::TypeMismatch, span, format!("index must be float, got {}", i.ty)));
        }
        let expr = match i.code {
            GlExpr::Num(n) => {
                if n.fract() != 0.0 || n < 0.0 || n >= v.ty.count() as f64 {
                    return Err(self.err(ErrorKind::OutOfRange, span,
                        format!("index {n} out of range for {}", v.ty)));
                }
                GlExpr::Component(Box::new(v.code), n as usize)
            }
            code => GlExpr::Index(Box::new(v.code), Box::new(code)),
        };
        Ok(self.emit(GlType::Num, expr))
    }
}

/// Widen a float operand to `ty` when `ty` is a vector, so builtins that
/// need matching argument types accept it.
fn splat(v: GlValue, ty: GlType) -> GlExpr {
    if ty.is_vector() && v.ty == GlType::Num {
        GlExpr::Construct(ty, vec![v.code])
    } else {
        v.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::context::GlContext;
    use crate::options::Options;
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;
    use crate::analysis::Analyser;

    /// Evaluate `src` to a function and compile it for one `vec2` argument.
    fn compile(src: &str) -> (EvalResult<GlValue>, Vec<String>) {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let top = Function::new(&Analyser::new().analyse(&ast).unwrap(), vec![]);
        let Ok(Value::Function(f)) = top.call(&[]) else { panic!("expected a function") };

        let cx = GlContext::new(Options::default());
        let result = {
            let root = GlFrame::root(0, &cx);
            let mut frame = GlFrame::make(f.nslots, &cx, Some(&root), CallSite::new(f.name.clone(), None));
            frame.set(0, GlValue::input(GlType::Vec2, "P"));
            f.gl_call(&mut frame)
        };
        let lines = cx.statements().iter().map(|s| s.to_string()).collect();
        (result, lines)
    }

    fn kind(src: &str) -> ErrorKind {
        compile(src).0.expect_err("expected compilation to fail").kind
    }

    #[test]
    fn circle_emits_length_minus_radius() {
        let (result, lines) = compile("p -> length(p) - 1");
        let v = result.unwrap();
        assert_eq!(v.ty, GlType::Num);
        assert_eq!(lines, vec!["float r0 = length(P);", "float r1 = r0 - 1.0;"]);
        assert_eq!(v.code, GlExpr::var("r1"));
    }

    #[test]
    fn captured_values_fold_to_literals() {
        let (_, lines) = compile("let r = 2; c = [1, 0] in p -> length(p - c) - r");
        assert_eq!(lines, vec![
            "vec2 r0 = P - vec2(1.0, 0.0);",
            "float r1 = length(r0);",
            "float r2 = r1 - 2.0;",
        ]);
    }

    #[test]
    fn calls_of_captured_functions_are_inlined() {
        let (result, lines) = compile("let sq = x -> x * x in p -> sq(p.x)");
        assert_eq!(result.unwrap().ty, GlType::Num);
        assert_eq!(lines, vec!["float r0 = P[0];", "float r1 = r0 * r0;"]);
    }

    #[test]
    fn fields_of_captured_records_fold() {
        let (_, lines) = compile("let s = {r: 3} in p -> length(p) - s.r");
        assert_eq!(lines[1], "float r1 = r0 - 3.0;");
        assert_eq!(kind("let s = {r: 3} in p -> length(p) - s.q"), ErrorKind::MissingField);
    }

    #[test]
    fn swizzle_of_captured_vector() {
        let (_, lines) = compile("let c = [1, 2] in p -> p.x - c.y");
        assert_eq!(lines, vec!["float r0 = P[0];", "float r1 = vec2(1.0, 2.0)[1];", "float r2 = r0 - r1;"]);
    }

    #[test]
    fn modulo_becomes_glsl_mod_with_splat() {
        let (_, lines) = compile("p -> length(p % 2)");
        assert_eq!(lines[0], "vec2 r0 = mod(P, vec2(2.0));");
    }

    #[test]
    fn literal_condition_folds() {
        let (_, lines) = compile("p -> if (true) p.x else p.y");
        assert_eq!(lines, vec!["float r0 = P[0];"]);
    }

    #[test]
    fn dynamic_condition_selects() {
        let (_, lines) = compile("p -> p.x < 0 ? -p.x : p.x");
        assert_eq!(lines.last().map(String::as_str), Some("float r5 = r1 ? r3 : r4;"));
    }

    #[test]
    fn builtin_scalars_are_widened() {
        let (_, lines) = compile("p -> length(max(p, 0))");
        assert_eq!(lines[0], "vec2 r0 = max(P, vec2(0.0));");
    }

    #[test]
    fn dynamic_only_constructs_are_unsupported() {
        assert_eq!(kind("p -> \"text\""), ErrorKind::UnsupportedOperation);
        assert_eq!(kind("p -> {a: p}"), ErrorKind::UnsupportedOperation);
        assert_eq!(kind("p -> q -> q"), ErrorKind::UnsupportedOperation);
        assert_eq!(kind("p -> count([1, 2])"), ErrorKind::UnsupportedOperation);
        assert_eq!(kind("p -> [1, 2, 3, 4, 5]"), ErrorKind::UnsupportedOperation);
        assert_eq!(kind("let fs = [x -> x] in p -> fs[0](p)"), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn type_errors_are_mismatches() {
        assert_eq!(kind("p -> p + [1, 2, 3]"), ErrorKind::TypeMismatch);
        assert_eq!(kind("p -> if (p) 1 else 2"), ErrorKind::TypeMismatch);
        assert_eq!(kind("p -> p.x < 0 ? p : 1"), ErrorKind::TypeMismatch);
        assert_eq!(kind("p -> p.z"), ErrorKind::OutOfRange);
    }

    #[test]
    fn nested_errors_carry_the_call_chain() {
        let err = compile("let bad = q -> \"x\" in p -> bad(p)").0.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperation);
        let names: Vec<_> = err.at.backtrace.iter()
            .filter_map(|s| s.function.as_ref().map(|a| a.as_str().to_string()))
            .collect();
        assert_eq!(names, vec!["bad".to_string()]);
        assert!(err.at.span.is_some());
    }
}
