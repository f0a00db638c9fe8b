use crate::context::{Activation, Context};

/// Error codes prefixed by phase: L = lexer, P = parser, S = scope analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence

    // Parser
    P001, // unexpected token
    P002, // missing expected token

    // Scope analysis
    S001, // undefined name
    S002, // duplicate parameter
    S003, // duplicate record field
    S004, // builtin used as a value
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::S001 => "S001",
            Self::S002 => "S002",
            Self::S003 => "S003",
            Self::S004 => "S004",
        }
    }
}

/// A front-end (lexer, parser, analyser) diagnostic.
#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}:{}: {}", self.code.as_str(), self.line, self.column, self.message)
    }
}

impl std::error::Error for Error {}

// ─── Evaluation errors ───────────────────────────────────────────────────────

/// What went wrong while evaluating or compiling a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required record field is not present.
    MissingField,
    /// A value has the wrong kind for the operation applied to it.
    WrongType,
    /// A function was called with, or declared with, the wrong number of arguments.
    WrongArity,
    /// A dynamic-only construct was reached during symbolic evaluation.
    UnsupportedOperation,
    /// A typed value differs from the type required where it is used.
    TypeMismatch,
    /// A name with no binding, reached at run time.
    Undefined,
    /// A list index outside the list, or a non-integral index.
    OutOfRange,
    /// Call depth exceeded `Options::max_depth`.
    RecursionLimit,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField         => "missing field",
            Self::WrongType            => "wrong type",
            Self::WrongArity           => "wrong arity",
            Self::UnsupportedOperation => "unsupported operation",
            Self::TypeMismatch         => "type mismatch",
            Self::Undefined            => "undefined",
            Self::OutOfRange           => "out of range",
            Self::RecursionLimit       => "recursion limit",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by dynamic evaluation or symbolic compilation.
/// Always carries the diagnostic context of the failing expression.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{kind}] {at}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub at: Context,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, at: Context, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), at }
    }

    pub fn unsupported(at: Context, construct: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedOperation,
            at,
            format!("{construct} is not supported in shader code"),
        )
    }

    /// Give an error raised outside any activation the call chain of `frame`.
    /// Errors that already carry a backtrace are left alone.
    pub fn within<A: Activation>(mut self, frame: &A) -> Self {
        if self.at.backtrace.is_empty() {
            self.at = Context::in_frame(self.at.span, frame);
        }
        self
    }
}

pub type EvalResult<T> = Result<T, RuntimeError>;

/// An error raised by a context-free kernel (operator, builtin, type rule).
/// The evaluator that called the kernel attaches the location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{kind}] {message}")]
pub struct Fault {
    pub kind: ErrorKind,
    pub message: String,
}

impl Fault {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn at(self, at: Context) -> RuntimeError {
        RuntimeError { kind: self.kind, message: self.message, at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::Span;

    #[test]
    fn front_end_error_display() {
        let e = Error::new(ErrorCode::S001, 3, 7, "undefined: `q`");
        assert_eq!(e.to_string(), "[S001] 3:7: undefined: `q`");
    }

    #[test]
    fn runtime_error_display_includes_kind_and_location() {
        let e = RuntimeError::new(ErrorKind::WrongArity, Context::at(Span::new(2, 4)), "expected 1 argument");
        assert_eq!(e.to_string(), "[wrong arity] 2:4: expected 1 argument");
    }

    #[test]
    fn fault_display_has_kind_and_message() {
        let f = Fault::new(ErrorKind::OutOfRange, "component 3 of a 2-vector");
        assert_eq!(f.to_string(), "[out of range] component 3 of a 2-vector");
        let boxed: Box<dyn std::error::Error> = Box::new(f);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn unsupported_names_construct() {
        let e = RuntimeError::unsupported(Context::none(), "record construction");
        assert_eq!(e.kind, ErrorKind::UnsupportedOperation);
        assert!(e.message.contains("record construction"));
    }
}
