use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::EvalResult;
use crate::gl::types::{GlExpr, GlType, GlValue};
use crate::options::Options;

/// `float r0 = length(P);`
#[derive(Debug, Clone, PartialEq)]
pub struct GlStatement {
    pub name: Rc<str>,
    pub ty: GlType,
    pub expr: GlExpr,
}

impl fmt::Display for GlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {};", self.ty, self.name, self.expr)
    }
}

/// Code emission accumulator for one top-level compilation: fresh names and
/// the ordered list of emitted statements.
///
/// Shared by reference through every frame of the compilation, so emission
/// goes through interior mutability.
pub struct GlContext {
    next_name: Rc<Cell<usize>>,
    statements: RefCell<Vec<GlStatement>>,
    options: Options,
}

impl GlContext {
    pub fn new(options: Options) -> Self {
        Self {
            next_name: Rc::new(Cell::new(0)),
            statements: RefCell::new(Vec::new()),
            options,
        }
    }

    pub fn options(&self) -> &Options { &self.options }

    pub fn fresh_name(&self) -> Rc<str> {
        let n = self.next_name.get();
        self.next_name.set(n + 1);
        Rc::from(format!("r{n}"))
    }

    /// Append `ty name = expr;` and return a handle to the new variable.
    pub fn emit(&self, ty: GlType, expr: GlExpr) -> GlValue {
        let name = self.fresh_name();
        let stmt = GlStatement { name: name.clone(), ty, expr };
        trace!(%stmt, "emit");
        self.statements.borrow_mut().push(stmt);
        GlValue::new(ty, GlExpr::Var(name))
    }

    pub fn statements(&self) -> Ref<'_, [GlStatement]> {
        Ref::map(self.statements.borrow(), Vec::as_slice)
    }

    pub fn into_statements(self) -> Vec<GlStatement> {
        self.statements.into_inner()
    }

    /// Run `f` against a scoped child context. Its statements are appended
    /// here only if `f` succeeds; on failure they are dropped. Names stay
    /// unique across both because the counter is shared.
    pub fn attempt<T>(&self, f: impl FnOnce(&GlContext) -> EvalResult<T>) -> EvalResult<T> {
        let scoped = GlContext {
            next_name: self.next_name.clone(),
            statements: RefCell::new(Vec::new()),
            options: self.options.clone(),
        };
        let value = f(&scoped)?;
        self.statements.borrow_mut().extend(scoped.into_statements());
        Ok(value)
    }
}
