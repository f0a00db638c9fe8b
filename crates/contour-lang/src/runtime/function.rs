use std::rc::Rc;

use crate::analysis::{Lambda, Operation};
use crate::context::{CallSite, Context};
use crate::error::{ErrorKind, EvalResult, RuntimeError};
use crate::gl::eval::Compiler;
use crate::gl::frame::GlFrame;
use crate::gl::types::GlValue;
use crate::options::Options;
use crate::runtime::atom::Atom;
use crate::runtime::frame::Frame;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;
use crate::syntax::ast::Span;

/// An immutable closure with two entry points over one body: `call`
/// evaluates it over dynamic values, `gl_call` compiles it over typed ones.
#[derive(Debug)]
pub struct Function {
    pub name: Option<Atom>,
    pub nargs: usize,
    /// Frame size: parameters first, then `let` bindings.
    pub nslots: usize,
    pub body: Rc<Operation>,
    pub nonlocals: Rc<[Value]>,
    pub span: Span,
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

impl Function {
    pub fn new(lambda: &Lambda, nonlocals: Vec<Value>) -> Self {
        Self {
            name: lambda.name.clone(),
            nargs: lambda.nargs,
            nslots: lambda.nslots,
            body: lambda.body.clone(),
            nonlocals: Rc::from(nonlocals),
            span: lambda.span,
        }
    }

    fn display_name(&self) -> &str {
        self.name.as_ref().map(|a| a.as_str()).unwrap_or("<lambda>")
    }

    fn arity_message(&self, given: usize) -> String {
        format!("`{}` expects {} argument{}, got {given}", self.display_name(), self.nargs, plural(self.nargs))
    }

    // ─── Dynamic ─────────────────────────────────────────────────────────────

    /// Evaluate with default options, as the root of a call chain.
    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        self.call_with(args, &Options::default())
    }

    pub fn call_with(&self, args: &[Value], options: &Options) -> EvalResult<Value> {
        if args.len() != self.nargs {
            return Err(RuntimeError::new(ErrorKind::WrongArity, Context::at(self.span), self.arity_message(args.len())));
        }
        let site = CallSite::new(self.name.clone(), None);
        self.invoke(args, Frame::make(self.nslots, self.nonlocals.clone(), None, options, site))
    }

    /// Evaluate from inside another activation; `span` is the call expression.
    pub fn call_from(&self, args: &[Value], caller: &Frame<'_>, span: Span) -> EvalResult<Value> {
        if args.len() != self.nargs {
            let at = Context::in_frame(Some(span), caller);
            return Err(RuntimeError::new(ErrorKind::WrongArity, at, self.arity_message(args.len())));
        }
        let options = caller.options();
        if caller.depth() + 1 > options.max_depth {
            let at = Context::in_frame(Some(span), caller);
            return Err(RuntimeError::new(ErrorKind::RecursionLimit, at,
                format!("call depth exceeds {}", options.max_depth)));
        }
        let site = CallSite::new(self.name.clone(), Some(span));
        self.invoke(args, Frame::make(self.nslots, self.nonlocals.clone(), Some(caller), options, site))
    }

    fn invoke(&self, args: &[Value], mut frame: Frame<'_>) -> EvalResult<Value> {
        for (slot, arg) in args.iter().enumerate() {
            frame.set(slot, arg.clone());
        }
        Interpreter::new(&mut frame).eval(&self.body)
    }

    // ─── Symbolic ────────────────────────────────────────────────────────────

    /// Compile the body into `frame`'s context. Slots `0..nargs` must already
    /// hold the typed arguments.
    pub fn gl_call(&self, frame: &mut GlFrame<'_>) -> EvalResult<GlValue> {
        if frame.len() != self.nslots {
            let at = Context::in_frame(Some(self.span), frame);
            return Err(RuntimeError::new(ErrorKind::WrongArity, at,
                format!("`{}` needs a frame of {} slot{}, got {}",
                    self.display_name(), self.nslots, plural(self.nslots), frame.len())));
        }
        let given = (0..self.nargs).take_while(|&i| frame.get(i).is_some()).count();
        if given != self.nargs {
            let at = Context::in_frame(Some(self.span), frame);
            return Err(RuntimeError::new(ErrorKind::WrongArity, at, self.arity_message(given)));
        }
        let max_depth = frame.context().options().max_depth;
        if frame.depth() > max_depth {
            let at = Context::in_frame(Some(self.span), frame);
            return Err(RuntimeError::new(ErrorKind::RecursionLimit, at,
                format!("call depth exceeds {max_depth}")));
        }
        Compiler::new(frame, &self.nonlocals).eval(&self.body)
    }
}
