pub mod common;
pub mod expr;
pub mod file;
pub mod stmt;
pub mod types;

pub use common::{BinaryOp, Identifier, Literal, NamespacedName, UnaryOp};
pub use expr::{Expression, ExpressionKind, FunctionExpression, FunctionKind, Parameter};
pub use file::BrsFile;
pub use stmt::{
    AccessModifier, ClassMember, ClassStatement, ConstStatement, EnumMember, EnumStatement, FieldStatement,
    FunctionStatement, InterfaceField, InterfaceMethod, InterfaceStatement, MethodStatement, NamespaceStatement,
    Statement, StatementKind,
};
pub use types::{BscType, TypeExpression};
