//! The program model the validator runs against.
//!
//! A `Program` owns the parsed files, the `source` scope and one scope per
//! registered component. Changes mark the scopes they reach as dirty, and
//! `Program::validate` re-runs the per-scope pipeline for exactly those scopes
//! before folding the findings of every scope into one diagnostic list.

mod components;
mod config;
mod database;
mod error;

pub use components::{ComponentDatabase, ComponentEntry};
pub use config::{DiagnosticFilter, ProgramConfig};
pub use database::Program;
pub use error::{DatabaseError, DatabaseResult};
