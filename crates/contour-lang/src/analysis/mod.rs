pub mod operation;

#[cfg(test)]
mod tests;

use std::f64::consts::{PI, TAU};
use std::rc::Rc;

use crate::builtins::Builtin;
use crate::error::{Error, ErrorCode};
use crate::runtime::atom::Atom;
use crate::runtime::value::Value;
use crate::syntax::ast::{Expr, Param, Span};
pub use operation::{Capture, Lambda, Operation};

// ─── Scopes ──────────────────────────────────────────────────────────────────

/// Bindings of the function literal currently being analysed.
#[derive(Default)]
struct FunctionScope {
    /// Visible names, innermost last. Shadowed entries stay below.
    locals: Vec<(String, usize)>,
    nslots: usize,
    captures: Vec<Capture>,
    capture_names: Vec<String>,
}

impl FunctionScope {
    fn bind(&mut self, name: &str) -> usize {
        let slot = self.nslots;
        self.nslots += 1;
        self.locals.push((name.to_string(), slot));
        slot
    }

    fn local(&self, name: &str) -> Option<usize> {
        self.locals.iter().rev().find(|(n, _)| n == name).map(|(_, slot)| *slot)
    }
}

enum Resolved {
    Local(usize),
    NonLocal(usize),
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi"  => Some(PI),
        "tau" => Some(TAU),
        _     => None,
    }
}

// ─── Analyser ────────────────────────────────────────────────────────────────

/// Resolves names to frame slots and captured values, turning the AST into
/// the `Operation` tree both evaluators run.
///
/// Errors are collected rather than returned early so one pass reports
/// every undefined name.
pub struct Analyser {
    functions: Vec<FunctionScope>,
    errors: Vec<Error>,
}

impl Default for Analyser {
    fn default() -> Self { Self::new() }
}

impl Analyser {
    pub fn new() -> Self {
        Self { functions: Vec::new(), errors: Vec::new() }
    }

    /// Analyse a whole program as the body of a function with no parameters.
    pub fn analyse(mut self, program: &Expr) -> Result<Rc<Lambda>, Vec<Error>> {
        let lambda = self.lambda(None, &[], program, *program.span());
        if self.errors.is_empty() { Ok(lambda) } else { Err(self.errors) }
    }

    fn error(&mut self, code: ErrorCode, span: Span, msg: impl Into<String>) {
        self.errors.push(Error::new(code, span.line, span.column, msg));
    }

    fn top(&mut self) -> &mut FunctionScope {
        let i = self.functions.len() - 1;
        &mut self.functions[i]
    }

    fn lambda(&mut self, name: Option<Atom>, params: &[Param], body: &Expr, span: Span) -> Rc<Lambda> {
        self.functions.push(FunctionScope::default());
        for p in params {
            if self.top().local(&p.name).is_some() {
                self.error(ErrorCode::S002, p.span, format!("duplicate parameter `{}`", p.name));
            }
            self.top().bind(&p.name);
        }
        let body = self.expr(body);
        let scope = self.functions.pop().unwrap_or_default();
        Rc::new(Lambda {
            name,
            nargs: params.len(),
            nslots: scope.nslots,
            body: Rc::new(body),
            captures: scope.captures,
            span,
        })
    }

    /// Look `name` up in function `level`, capturing it from enclosing
    /// functions on the way down if needed.
    fn resolve(&mut self, level: usize, name: &str) -> Option<Resolved> {
        let scope = &self.functions[level];
        if let Some(slot) = scope.local(name) {
            return Some(Resolved::Local(slot));
        }
        if let Some(i) = scope.capture_names.iter().position(|n| n == name) {
            return Some(Resolved::NonLocal(i));
        }
        if level == 0 {
            return None;
        }
        let capture = match self.resolve(level - 1, name)? {
            Resolved::Local(slot) => Capture::Local(slot),
            Resolved::NonLocal(i) => Capture::NonLocal(i),
        };
        let scope = &mut self.functions[level];
        scope.captures.push(capture);
        scope.capture_names.push(name.to_string());
        Some(Resolved::NonLocal(scope.captures.len() - 1))
    }

    fn lookup(&mut self, name: &str) -> Option<Resolved> {
        self.resolve(self.functions.len() - 1, name)
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn expr(&mut self, expr: &Expr) -> Operation {
        match expr {
            Expr::Num(n, span)       => Operation::Constant(Value::Num(*n), *span),
            Expr::Bool(b, span)      => Operation::Constant(Value::Bool(*b), *span),
            Expr::Null(span)         => Operation::Constant(Value::Null, *span),
            Expr::StringLit(s, span) => Operation::Constant(Value::string(s), *span),
            Expr::Ident(name, span)  => self.ident(name, *span),

            Expr::BinOp { left, op, right, span } => Operation::Binary {
                op: *op,
                left: Box::new(self.expr(left)),
                right: Box::new(self.expr(right)),
                span: *span,
            },

            Expr::UnOp { op, operand, span } => Operation::Unary {
                op: *op,
                operand: Box::new(self.expr(operand)),
                span: *span,
            },

            Expr::Ternary { condition, then_expr, else_expr, span } => Operation::If {
                condition: Box::new(self.expr(condition)),
                then_op: Box::new(self.expr(then_expr)),
                else_op: Box::new(self.expr(else_expr)),
                span: *span,
            },

            Expr::Call { callee, args, span } => self.call(callee, args, *span),

            Expr::Index { expr, index, span } => Operation::Index {
                expr: Box::new(self.expr(expr)),
                index: Box::new(self.expr(index)),
                span: *span,
            },

            Expr::Field { expr, field, span } => Operation::Field {
                expr: Box::new(self.expr(expr)),
                name: Atom::new(field),
                span: *span,
            },

            Expr::List(items, span) => {
                Operation::List(items.iter().map(|e| self.expr(e)).collect(), *span)
            }

            Expr::Record(fields, span) => {
                let mut seen: Vec<&str> = Vec::new();
                let mut ops = Vec::with_capacity(fields.len());
                for f in fields {
                    if seen.contains(&f.name.as_str()) {
                        self.error(ErrorCode::S003, f.span, format!("duplicate field `{}`", f.name));
                    }
                    seen.push(&f.name);
                    let name = Atom::new(&f.name);
                    ops.push((name.clone(), self.named(name, &f.value)));
                }
                Operation::Record(ops, *span)
            }

            Expr::Lambda { params, body, span } => {
                Operation::Lambda(self.lambda(None, params, body, *span))
            }

            Expr::Let { bindings, body, span } => {
                let mark = self.top().locals.len();
                let mut ops = Vec::with_capacity(bindings.len());
                for b in bindings {
                    let value = self.named(Atom::new(&b.name), &b.value);
                    let slot = self.top().bind(&b.name);
                    ops.push((slot, value));
                }
                let body = self.expr(body);
                self.top().locals.truncate(mark);
                Operation::Let { bindings: ops, body: Box::new(body), span: *span }
            }
        }
    }

    /// Like `expr`, but a lambda literal takes `name` for diagnostics.
    fn named(&mut self, name: Atom, expr: &Expr) -> Operation {
        match expr {
            Expr::Lambda { params, body, span } => {
                Operation::Lambda(self.lambda(Some(name), params, body, *span))
            }
            other => self.expr(other),
        }
    }

    fn ident(&mut self, name: &str, span: Span) -> Operation {
        match self.lookup(name) {
            Some(Resolved::Local(slot)) => return Operation::Local(slot, span),
            Some(Resolved::NonLocal(i)) => return Operation::NonLocal(i, span),
            None => {}
        }
        if let Some(x) = constant(name) {
            return Operation::Constant(Value::Num(x), span);
        }
        if Builtin::from_name(name).is_some() {
            self.error(ErrorCode::S004, span, format!("builtin `{name}` can only be called"));
        } else {
            self.error(ErrorCode::S001, span, format!("undefined: `{name}`"));
        }
        Operation::Constant(Value::Null, span)
    }

    fn call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Operation {
        let args: Vec<Operation> = args.iter().map(|a| self.expr(a)).collect();
        if let Expr::Ident(name, _) = callee {
            let shadowed = self.lookup(name).is_some();
            if let (false, Some(builtin)) = (shadowed, Builtin::from_name(name)) {
                return Operation::Builtin { builtin, args, span };
            }
        }
        Operation::Call { callee: Box::new(self.expr(callee)), args, span }
    }
}
