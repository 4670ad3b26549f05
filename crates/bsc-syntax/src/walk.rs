//! Tree traversal with an ancestor chain.
//!
//! A `Visitor` gets every node together with a `WalkContext` describing where the
//! node sits: its parent, the enclosing namespace, class and function, and the
//! innermost symbol table. Overriding a `visit_*` method and not calling the
//! matching `walk_*` function skips that node's children.

use crate::ast::{
    BrsFile, ClassMember, ClassStatement, Expression, ExpressionKind, FunctionExpression, NamespaceStatement,
    Statement, StatementKind,
};
use crate::symbol_table::SymbolTable;
use std::sync::Arc;

/// A borrowed reference to any node kind the walker visits.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    File(&'a BrsFile),
    Statement(&'a Statement),
    Expression(&'a Expression),
    ClassMember(&'a ClassMember),
    Function(&'a FunctionExpression),
}

impl<'a> NodeRef<'a> {
    pub fn as_statement(&self) -> Option<&'a Statement> {
        match self {
            NodeRef::Statement(stmt) => Some(stmt),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&'a Expression> {
        match self {
            NodeRef::Expression(expr) => Some(expr),
            _ => None,
        }
    }

    /// The symbol table this node owns, if it is scope-like.
    pub fn symbol_table(&self) -> Option<&'a Arc<SymbolTable>> {
        match self {
            NodeRef::File(file) => Some(&file.symbol_table),
            NodeRef::Function(func) => Some(&func.symbol_table),
            NodeRef::Statement(Statement {
                kind: StatementKind::Namespace(ns),
                ..
            }) => Some(&ns.symbol_table),
            _ => None,
        }
    }
}

/// The ancestors of the node being visited, outermost first. The node itself
/// is not included.
#[derive(Debug)]
pub struct WalkContext<'a> {
    file: &'a BrsFile,
    ancestors: Vec<NodeRef<'a>>,
}

impl<'a> WalkContext<'a> {
    pub fn new(file: &'a BrsFile) -> Self {
        Self {
            file,
            ancestors: vec![NodeRef::File(file)],
        }
    }

    pub fn file(&self) -> &'a BrsFile {
        self.file
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.ancestors.last().copied()
    }

    pub fn ancestors(&self) -> &[NodeRef<'a>] {
        &self.ancestors
    }

    /// The innermost ancestor matching `pred`.
    pub fn find_ancestor(&self, pred: impl Fn(&NodeRef<'a>) -> bool) -> Option<NodeRef<'a>> {
        self.ancestors.iter().rev().find(|node| pred(node)).copied()
    }

    pub fn namespace(&self) -> Option<&'a NamespaceStatement> {
        self.ancestors.iter().rev().find_map(|node| match node {
            NodeRef::Statement(Statement {
                kind: StatementKind::Namespace(ns),
                ..
            }) => Some(ns),
            _ => None,
        })
    }

    /// Lower-cased full name of the enclosing namespace.
    pub fn namespace_name(&self) -> Option<String> {
        self.namespace().map(|ns| ns.name.lower())
    }

    pub fn class(&self) -> Option<&'a ClassStatement> {
        self.ancestors.iter().rev().find_map(|node| match node {
            NodeRef::Statement(Statement {
                kind: StatementKind::Class(class),
                ..
            }) => Some(class),
            _ => None,
        })
    }

    pub fn function(&self) -> Option<&'a FunctionExpression> {
        self.ancestors.iter().rev().find_map(|node| match node {
            NodeRef::Function(func) => Some(*func),
            _ => None,
        })
    }

    /// The innermost symbol table: enclosing function, namespace block or file.
    pub fn symbol_table(&self) -> &'a Arc<SymbolTable> {
        self.ancestors
            .iter()
            .rev()
            .find_map(NodeRef::symbol_table)
            .unwrap_or(&self.file.symbol_table)
    }

    fn push(&mut self, node: NodeRef<'a>) {
        self.ancestors.push(node);
    }

    fn pop(&mut self) {
        self.ancestors.pop();
    }
}

pub trait Visitor<'a>: Sized {
    fn visit_statement(&mut self, stmt: &'a Statement, ctx: &mut WalkContext<'a>) {
        walk_statement(self, stmt, ctx)
    }

    fn visit_expression(&mut self, expr: &'a Expression, ctx: &mut WalkContext<'a>) {
        walk_expression(self, expr, ctx)
    }

    fn visit_class_member(&mut self, member: &'a ClassMember, ctx: &mut WalkContext<'a>) {
        walk_class_member(self, member, ctx)
    }

    fn visit_function(&mut self, func: &'a FunctionExpression, ctx: &mut WalkContext<'a>) {
        walk_function(self, func, ctx)
    }
}

pub fn walk_file<'a, V: Visitor<'a>>(visitor: &mut V, file: &'a BrsFile) {
    let mut ctx = WalkContext::new(file);
    for stmt in &file.statements {
        visitor.visit_statement(stmt, &mut ctx);
    }
}

pub fn walk_statements<'a, V: Visitor<'a>>(visitor: &mut V, stmts: &'a [Statement], ctx: &mut WalkContext<'a>) {
    for stmt in stmts {
        visitor.visit_statement(stmt, ctx);
    }
}

pub fn walk_statement<'a, V: Visitor<'a>>(visitor: &mut V, stmt: &'a Statement, ctx: &mut WalkContext<'a>) {
    ctx.push(NodeRef::Statement(stmt));
    match &stmt.kind {
        StatementKind::Assignment { value, .. } => visitor.visit_expression(value, ctx),
        StatementKind::DottedSet { object, value, .. } => {
            visitor.visit_expression(object, ctx);
            visitor.visit_expression(value, ctx);
        }
        StatementKind::Expression(expr) => visitor.visit_expression(expr, ctx),
        StatementKind::Print(exprs) => {
            for expr in exprs {
                visitor.visit_expression(expr, ctx);
            }
        }
        StatementKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expression(value, ctx);
            }
        }
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expression(condition, ctx);
            walk_statements(visitor, then_branch, ctx);
            walk_statements(visitor, else_branch, ctx);
        }
        StatementKind::While { condition, body } => {
            visitor.visit_expression(condition, ctx);
            walk_statements(visitor, body, ctx);
        }
        StatementKind::ForEach { target, body, .. } => {
            visitor.visit_expression(target, ctx);
            walk_statements(visitor, body, ctx);
        }
        StatementKind::Function(func) => visitor.visit_function(&func.func, ctx),
        StatementKind::Namespace(ns) => walk_statements(visitor, &ns.body, ctx),
        StatementKind::Class(class) => {
            for member in &class.members {
                visitor.visit_class_member(member, ctx);
            }
        }
        StatementKind::Enum(enum_stmt) => {
            for member in &enum_stmt.members {
                if let Some(value) = &member.value {
                    visitor.visit_expression(value, ctx);
                }
            }
        }
        StatementKind::Const(constant) => visitor.visit_expression(&constant.value, ctx),
        StatementKind::Interface(_) | StatementKind::Import(_) => {}
    }
    ctx.pop();
}

pub fn walk_class_member<'a, V: Visitor<'a>>(visitor: &mut V, member: &'a ClassMember, ctx: &mut WalkContext<'a>) {
    ctx.push(NodeRef::ClassMember(member));
    match member {
        ClassMember::Method(method) => visitor.visit_function(&method.func, ctx),
        ClassMember::Field(field) => {
            if let Some(value) = &field.initial_value {
                visitor.visit_expression(value, ctx);
            }
        }
    }
    ctx.pop();
}

pub fn walk_function<'a, V: Visitor<'a>>(visitor: &mut V, func: &'a FunctionExpression, ctx: &mut WalkContext<'a>) {
    ctx.push(NodeRef::Function(func));
    for param in &func.parameters {
        if let Some(default) = &param.default_value {
            visitor.visit_expression(default, ctx);
        }
    }
    walk_statements(visitor, &func.body, ctx);
    ctx.pop();
}

pub fn walk_expression<'a, V: Visitor<'a>>(visitor: &mut V, expr: &'a Expression, ctx: &mut WalkContext<'a>) {
    ctx.push(NodeRef::Expression(expr));
    match &expr.kind {
        ExpressionKind::Literal(_) | ExpressionKind::Variable(_) => {}
        ExpressionKind::DottedGet { object, .. } => visitor.visit_expression(object, ctx),
        ExpressionKind::IndexedGet { object, index } => {
            visitor.visit_expression(object, ctx);
            visitor.visit_expression(index, ctx);
        }
        ExpressionKind::Call { callee, args } => {
            visitor.visit_expression(callee, ctx);
            for arg in args {
                visitor.visit_expression(arg, ctx);
            }
        }
        ExpressionKind::Callfunc { object, args, .. } => {
            visitor.visit_expression(object, ctx);
            for arg in args {
                visitor.visit_expression(arg, ctx);
            }
        }
        ExpressionKind::New { args, .. } => {
            for arg in args {
                visitor.visit_expression(arg, ctx);
            }
        }
        ExpressionKind::Binary { left, right, .. } => {
            visitor.visit_expression(left, ctx);
            visitor.visit_expression(right, ctx);
        }
        ExpressionKind::Unary { operand, .. } => visitor.visit_expression(operand, ctx),
        ExpressionKind::Grouping(inner) => visitor.visit_expression(inner, ctx),
        ExpressionKind::Function(func) => visitor.visit_function(func, ctx),
        ExpressionKind::ArrayLiteral(items) | ExpressionKind::TemplateString(items) => {
            for item in items {
                visitor.visit_expression(item, ctx);
            }
        }
        ExpressionKind::AALiteral(entries) => {
            for (_, value) in entries {
                visitor.visit_expression(value, ctx);
            }
        }
    }
    ctx.pop();
}
