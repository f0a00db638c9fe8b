//! The resolved body representation shared by both evaluators.
//!
//! Names are gone: every variable is a frame slot (`Local`) or an entry in
//! the running closure's captured values (`NonLocal`). The dynamic
//! interpreter and the symbolic compiler both walk this tree.

use std::rc::Rc;

use crate::builtins::Builtin;
use crate::runtime::atom::Atom;
use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, Span, UnOp};

#[derive(Debug, Clone)]
pub enum Operation {
    Constant(Value, Span),
    Local(usize, Span),
    NonLocal(usize, Span),

    /// Closure construction.
    Lambda(Rc<Lambda>),

    /// Call of a computed function value.
    Call {
        callee: Box<Operation>,
        args: Vec<Operation>,
        span: Span,
    },

    Builtin {
        builtin: Builtin,
        args: Vec<Operation>,
        span: Span,
    },

    Unary {
        op: UnOp,
        operand: Box<Operation>,
        span: Span,
    },

    Binary {
        op: BinOp,
        left: Box<Operation>,
        right: Box<Operation>,
        span: Span,
    },

    If {
        condition: Box<Operation>,
        then_op: Box<Operation>,
        else_op: Box<Operation>,
        span: Span,
    },

    /// Each binding stores into its slot before the next is evaluated.
    Let {
        bindings: Vec<(usize, Operation)>,
        body: Box<Operation>,
        span: Span,
    },

    List(Vec<Operation>, Span),
    Record(Vec<(Atom, Operation)>, Span),

    Field {
        expr: Box<Operation>,
        name: Atom,
        span: Span,
    },

    Index {
        expr: Box<Operation>,
        index: Box<Operation>,
        span: Span,
    },
}

impl Operation {
    pub fn span(&self) -> Span {
        match self {
            Operation::Constant(_, s)       => *s,
            Operation::Local(_, s)          => *s,
            Operation::NonLocal(_, s)       => *s,
            Operation::Lambda(l)            => l.span,
            Operation::Call { span, .. }    => *span,
            Operation::Builtin { span, .. } => *span,
            Operation::Unary { span, .. }   => *span,
            Operation::Binary { span, .. }  => *span,
            Operation::If { span, .. }      => *span,
            Operation::Let { span, .. }     => *span,
            Operation::List(_, s)           => *s,
            Operation::Record(_, s)         => *s,
            Operation::Field { span, .. }   => *span,
            Operation::Index { span, .. }   => *span,
        }
    }
}

/// Where a closure's captured value comes from, relative to the frame that
/// constructs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Local(usize),
    NonLocal(usize),
}

/// A function literal after analysis. Evaluating it captures values and
/// yields a `Function`.
#[derive(Debug)]
pub struct Lambda {
    /// Binding or field name the literal was assigned to, for diagnostics.
    pub name: Option<Atom>,
    pub nargs: usize,
    pub nslots: usize,
    pub body: Rc<Operation>,
    pub captures: Vec<Capture>,
    pub span: Span,
}
