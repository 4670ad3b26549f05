//! Syntax tree model for BrighterScript files.
//!
//! Trees are built by a parser (or by `AstBuilder`) and bound on construction:
//! `BrsFile::new` runs the binder, which fills every symbol table and links it
//! to its lexical parent. The walker in `walk` hands visitors the ancestor chain
//! of each node, which is how later phases find the enclosing namespace, class,
//! function and symbol table of an expression.

pub mod ast;
pub mod binder;
pub mod builder;
pub mod error;
pub mod symbol_table;
pub mod walk;

pub use ast::{BrsFile, BscType};
pub use builder::AstBuilder;
pub use error::SyntaxError;
pub use symbol_table::{BscSymbol, ParentProvider, SymbolTable};
pub use walk::{NodeRef, Visitor, WalkContext};
