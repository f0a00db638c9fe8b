use std::fmt;

use crate::error::{ErrorKind, Fault};
use crate::gl::context::GlStatement;
use crate::gl::interp::GlInterp;
use crate::gl::types::{GlExpr, GlValue};
use crate::runtime::value::Value;

/// The product of one successful compilation: the input it reads, the
/// statements it emitted, and the value holding the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub input: GlValue,
    pub statements: Vec<GlStatement>,
    pub result: GlValue,
}

impl Fragment {
    /// The fragment as a complete GLSL function taking the input as its
    /// only parameter.
    pub fn glsl_function(&self, name: &str) -> String {
        let mut out = format!("{} {name}({} {}) {{\n", self.result.ty, self.input.ty, self.input.code);
        for stmt in &self.statements {
            out.push_str(&format!("    {stmt}\n"));
        }
        out.push_str(&format!("    return {};\n}}\n", self.result.code));
        out
    }

    /// Run the emitted code on the CPU for one input value.
    pub fn evaluate(&self, input: Value) -> Result<Value, Fault> {
        let GlExpr::Var(name) = &self.input.code else {
            return Err(Fault::new(ErrorKind::WrongType, "fragment input is not a variable"));
        };
        let mut interp = GlInterp::new();
        interp.bind(name, input);
        interp.run(&self.statements)?;
        interp.eval(&self.result.code)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{stmt}")?;
        }
        write!(f, "result: {}", self.result)
    }
}
