//! Diagnostic context attached to every evaluation error: the span of the
//! failing expression and the chain of call sites that led to it.
//!
//! Both frame kinds (dynamic `Frame` and typed `GlFrame`) implement
//! [`Activation`], so a context can be captured uniformly at any depth,
//! including inside nested symbolic calls.

use std::fmt;

use crate::runtime::atom::Atom;
use crate::syntax::ast::Span;

/// The function an activation is running and the call expression that started it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSite {
    pub function: Option<Atom>,
    pub span: Option<Span>,
}

impl CallSite {
    pub fn new(function: Option<Atom>, span: Option<Span>) -> Self {
        Self { function, span }
    }

    /// The root of a call chain has neither a callee name nor a call expression.
    pub fn is_root(&self) -> bool {
        self.function.is_none() && self.span.is_none()
    }
}

/// A link in a call chain.
pub trait Activation {
    fn call_site(&self) -> &CallSite;
    fn caller(&self) -> Option<&Self>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub span: Option<Span>,
    /// Innermost call first.
    pub backtrace: Vec<CallSite>,
}

impl Context {
    /// No location known. Only used where no frame or span exists yet.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at(span: Span) -> Self {
        Self { span: Some(span), backtrace: Vec::new() }
    }

    /// Context for an error at `span` inside the activation `frame`.
    pub fn in_frame<A: Activation>(span: Option<Span>, frame: &A) -> Self {
        let mut backtrace = Vec::new();
        let mut current = Some(frame);
        while let Some(f) = current {
            if !f.call_site().is_root() {
                backtrace.push(f.call_site().clone());
            }
            current = f.caller();
        }
        Self { span, backtrace }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(s) => write!(f, "{}:{}", s.line, s.column)?,
            None    => f.write_str("<unknown>")?,
        }
        for site in &self.backtrace {
            let name = site.function.as_ref().map(|a| a.as_str()).unwrap_or("<lambda>");
            match &site.span {
                Some(s) => write!(f, ", in `{name}` called at {}:{}", s.line, s.column)?,
                None    => write!(f, ", in `{name}`")?,
            }
        }
        Ok(())
    }
}
