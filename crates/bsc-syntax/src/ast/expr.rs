use super::common::{BinaryOp, Identifier, Literal, NamespacedName, UnaryOp};
use super::stmt::Statement;
use super::types::{BscType, TypeExpression};
use crate::symbol_table::SymbolTable;
use bsc_source::Range;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Literal(Literal),
    Variable(Identifier),
    /// `object.name`
    DottedGet {
        object: Box<Expression>,
        name: Identifier,
    },
    /// `object[index]`
    IndexedGet {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    /// `node@.method(args)`
    Callfunc {
        object: Box<Expression>,
        method: Identifier,
        args: Vec<Expression>,
    },
    /// `new Alpha.Widget(args)`
    New {
        class_name: NamespacedName,
        args: Vec<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Grouping(Box<Expression>),
    Function(FunctionExpression),
    ArrayLiteral(Vec<Expression>),
    AALiteral(Vec<(Identifier, Expression)>),
    TemplateString(Vec<Expression>),
}

impl Expression {
    pub fn new(kind: ExpressionKind, range: Range) -> Self {
        Self { kind, range }
    }

    /// The identifiers of a `Variable`/`DottedGet` chain, leftmost first.
    ///
    /// Returns `None` when the chain is rooted in anything other than a variable
    /// (a call result, an index, a literal).
    pub fn dotted_parts(&self) -> Option<Vec<&Identifier>> {
        match &self.kind {
            ExpressionKind::Variable(name) => Some(vec![name]),
            ExpressionKind::DottedGet { object, name } => {
                let mut parts = object.dotted_parts()?;
                parts.push(name);
                Some(parts)
            }
            _ => None,
        }
    }

    /// The type of a literal, looking through a leading minus sign.
    pub fn literal_type(&self) -> Option<BscType> {
        match &self.kind {
            ExpressionKind::Literal(literal) => Some(literal.bsc_type()),
            ExpressionKind::Unary {
                op: UnaryOp::Negate,
                operand,
            } => operand.literal_type().filter(BscType::is_numeric),
            ExpressionKind::Grouping(inner) => inner.literal_type(),
            _ => None,
        }
    }

    /// The type a variable assigned from this expression is bound with.
    pub fn inferred_type(&self) -> BscType {
        if let Some(ty) = self.literal_type() {
            return ty;
        }
        match &self.kind {
            ExpressionKind::New { class_name, .. } => BscType::Custom(class_name.text()),
            ExpressionKind::Function(_) => BscType::Function,
            ExpressionKind::TemplateString(_) => BscType::String,
            ExpressionKind::ArrayLiteral(_) | ExpressionKind::AALiteral(_) => BscType::Object,
            _ => BscType::Dynamic,
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Literal(literal) => literal.as_str(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Sub,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Identifier,
    pub type_expr: Option<TypeExpression>,
    pub default_value: Option<Expression>,
}

impl Parameter {
    pub fn is_optional(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn bsc_type(&self) -> BscType {
        match (&self.type_expr, &self.default_value) {
            (Some(annotation), _) => annotation.to_bsc_type(),
            (None, Some(default)) => default.inferred_type(),
            (None, None) => BscType::Dynamic,
        }
    }
}

/// A function body. Named functions, class methods and anonymous functions all
/// carry one, and each owns the symbol table of its locals.
#[derive(Debug, Clone)]
pub struct FunctionExpression {
    pub kind: FunctionKind,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeExpression>,
    pub body: Vec<Statement>,
    pub symbol_table: Arc<SymbolTable>,
    pub range: Range,
}

impl FunctionExpression {
    pub fn new(
        kind: FunctionKind,
        parameters: Vec<Parameter>,
        return_type: Option<TypeExpression>,
        body: Vec<Statement>,
        range: Range,
    ) -> Self {
        Self {
            kind,
            parameters,
            return_type,
            body,
            symbol_table: Arc::new(SymbolTable::new("function")),
            range,
        }
    }

    /// Accepted argument counts: required parameters up to all parameters.
    pub fn arity(&self) -> (usize, usize) {
        let min = self.parameters.iter().filter(|param| !param.is_optional()).count();
        (min, self.parameters.len())
    }
}
