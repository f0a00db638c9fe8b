pub mod analysis;
pub mod builtins;
pub mod context;
pub mod error;
pub mod gl;
pub mod options;
pub mod runtime;
pub mod shape;
pub mod syntax;

pub use context::{CallSite, Context};
pub use error::{Error, ErrorCode, ErrorKind, EvalResult, RuntimeError};
pub use gl::context::{GlContext, GlStatement};
pub use gl::fragment::Fragment;
pub use gl::frame::GlFrame;
pub use gl::types::{GlExpr, GlType, GlValue};
pub use options::Options;
pub use runtime::atom::Atom;
pub use runtime::function::Function;
pub use runtime::record::Record;
pub use runtime::value::Value;
pub use shape::{CompileState, Shape2D};
pub use syntax::token::{Token, TokenKind};

use std::rc::Rc;

use analysis::{Analyser, Lambda};

// ─── Public API types ────────────────────────────────────────────────────────

/// A parsed and resolved program. Produced by `compile`.
pub struct Program {
    pub(crate) lambda: Rc<Lambda>,
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse and resolve source text. Returns a program ready for execution.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    let ast = syntax::parser::Parser::new(tokens).parse()?;
    let lambda = Analyser::new().analyse(&ast)?;
    Ok(Program { lambda })
}

impl Program {
    /// The whole program as a function of no arguments.
    pub fn function(&self) -> Function {
        Function::new(&self.lambda, Vec::new())
    }

    pub fn run(&self, options: &Options) -> EvalResult<Value> {
        self.function().call_with(&[], options)
    }
}
