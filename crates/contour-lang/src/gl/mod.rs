//! Symbolic compilation to GLSL.

pub mod context;
pub mod eval;
pub mod fragment;
pub mod frame;
pub mod interp;
pub mod types;
