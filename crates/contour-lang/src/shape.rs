//! 2D distance-field shapes: a record whose `dist` field maps a point to
//! its signed distance from the shape's boundary.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::context::{CallSite, Context};
use crate::error::{ErrorKind, EvalResult, RuntimeError};
use crate::gl::context::GlContext;
use crate::gl::fragment::Fragment;
use crate::gl::frame::GlFrame;
use crate::gl::types::{GlType, GlValue};
use crate::options::Options;
use crate::runtime::atom::Atom;
use crate::runtime::function::Function;
use crate::runtime::record::Record;
use crate::runtime::value::Value;

/// Progress of one `Shape2D::compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    Unvalidated,
    Validated,
    Compiling,
    Compiled,
    Failed,
}

impl fmt::Display for CompileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompileState::Unvalidated => "unvalidated",
            CompileState::Validated   => "validated",
            CompileState::Compiling   => "compiling",
            CompileState::Compiled    => "compiled",
            CompileState::Failed      => "failed",
        })
    }
}

/// Wraps a record by reference; the record is never copied.
#[derive(Debug, Clone)]
pub struct Shape2D {
    record: Rc<Record>,
}

impl Shape2D {
    pub fn new(record: Rc<Record>) -> Self {
        Self { record }
    }

    /// `None` unless `value` is a record.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Record(r) => Some(Self::new(r.clone())),
            _ => None,
        }
    }

    pub fn record(&self) -> &Rc<Record> { &self.record }

    pub fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("shape2d")?;
        self.record.print(out)
    }

    pub fn getfield(&self, name: &Atom) -> Option<Value> {
        self.record.getfield(name)
    }

    /// The distance function, checked for presence, kind and arity in that order.
    pub fn dist(&self) -> EvalResult<&Function> {
        let Some(value) = self.record.field(&Atom::new("dist")) else {
            return Err(RuntimeError::new(ErrorKind::MissingField, Context::none(), "dist function is missing"));
        };
        let Some(f) = value.narrow::<Function>() else {
            return Err(RuntimeError::new(ErrorKind::WrongType, Context::none(),
                format!("dist is not a function, got {}", value.type_name())));
        };
        if f.nargs != 1 {
            return Err(RuntimeError::new(ErrorKind::WrongArity, Context::at(f.span),
                format!("dist function does not have 1 parameter, it has {}", f.nargs)));
        }
        Ok(f)
    }

    pub fn validate(&self) -> EvalResult<()> {
        self.dist().map(|_| ())
    }

    /// Signed distance at `point`, evaluated dynamically.
    pub fn distance(&self, point: Value, options: &Options) -> EvalResult<f64> {
        let dist = self.dist()?;
        match dist.call_with(&[point], options)? {
            Value::Num(d) => Ok(d),
            other => Err(RuntimeError::new(ErrorKind::WrongType, Context::at(dist.span),
                format!("dist function returns {}", other.type_name()))),
        }
    }

    /// Compile `dist(arg)` into `enclosing`'s context. Statements are added
    /// only if the whole call compiles and yields a float.
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %arg.ty))]
    pub fn symbolic_dist(&self, arg: GlValue, enclosing: &GlFrame<'_>) -> EvalResult<GlValue> {
        let dist = self.dist().map_err(|e| e.within(enclosing))?;
        let site = CallSite::new(dist.name.clone(), Some(dist.span));
        enclosing.context().attempt(|scoped| {
            let mut frame = GlFrame::make(dist.nslots, scoped, Some(enclosing), site);
            frame.set(0, arg);
            let result = dist.gl_call(&mut frame)?;
            if result.ty != GlType::Num {
                let at = Context::in_frame(Some(dist.body.span()), &frame);
                return Err(RuntimeError::new(ErrorKind::TypeMismatch, at,
                    format!("dist function returns {}", result.ty)));
            }
            debug!(result = %result, "dist compiled");
            Ok(result)
        })
    }

    /// Compile the distance function into a standalone fragment over a
    /// `vec2` input named by `options.input_name`.
    pub fn compile(&self, options: &Options) -> EvalResult<Fragment> {
        let mut state = CompileState::Unvalidated;
        let mut advance = |next: CompileState| {
            debug!(from = %state, to = %next, "shape compile");
            state = next;
        };

        if let Err(e) = self.validate() {
            advance(CompileState::Failed);
            return Err(e);
        }
        advance(CompileState::Validated);

        let context = GlContext::new(options.clone());
        let input = GlValue::input(GlType::Vec2, &options.input_name);
        advance(CompileState::Compiling);
        let result = {
            let root = GlFrame::root(0, &context);
            self.symbolic_dist(input.clone(), &root)
        };
        match result {
            Ok(result) => {
                advance(CompileState::Compiled);
                Ok(Fragment { input, statements: context.into_statements(), result })
            }
            Err(e) => {
                advance(CompileState::Failed);
                Err(e)
            }
        }
    }
}

impl fmt::Display for Shape2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}
