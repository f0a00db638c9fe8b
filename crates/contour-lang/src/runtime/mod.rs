pub mod atom;
pub mod frame;
pub mod function;
pub mod interpreter;
pub mod record;
pub mod value;
