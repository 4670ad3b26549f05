//! Programmatic construction of syntax trees.
//!
//! Parsers and tests build trees through `AstBuilder`. Every node gets a range on
//! a line of its own, so two nodes built by the same builder never share a range.
//! Dotted names are laid out left to right on a single line.

use crate::ast::{
    BinaryOp, BrsFile, ClassMember, ClassStatement, ConstStatement, EnumMember, EnumStatement, Expression,
    ExpressionKind, FieldStatement, FunctionExpression, FunctionKind, FunctionStatement, Identifier,
    InterfaceField, InterfaceStatement, Literal, MethodStatement, NamespaceStatement, NamespacedName, Parameter,
    Statement, StatementKind, TypeExpression, UnaryOp,
};
use bsc_source::Range;
use std::cell::Cell;

/// Indentation every builder node starts at.
const COLUMN: u32 = 4;

#[derive(Debug, Default)]
pub struct AstBuilder {
    line: Cell<u32>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering lines at `line`.
    pub fn starting_at(line: u32) -> Self {
        Self { line: Cell::new(line) }
    }

    fn next_line(&self) -> u32 {
        let line = self.line.get();
        self.line.set(line + 1);
        line
    }

    fn range(&self, length: usize) -> Range {
        Range::on_line(self.next_line(), COLUMN, length as u32)
    }

    pub fn ident(&self, text: &str) -> Identifier {
        Identifier::new(text, self.range(text.len()))
    }

    /// A dotted name on one line. Empty parts are dropped.
    pub fn name(&self, dotted: &str) -> NamespacedName {
        let line = self.next_line();
        let mut column = COLUMN;
        let mut parts = Vec::new();
        for part in dotted.split('.') {
            if !part.is_empty() {
                parts.push(Identifier::new(part, Range::on_line(line, column, part.len() as u32)));
            }
            column += part.len() as u32 + 1;
        }
        NamespacedName::from_parts(parts)
    }

    pub fn type_expr(&self, text: &str) -> TypeExpression {
        TypeExpression::new(text, self.range(text.len()))
    }

    // Expressions

    fn literal(&self, literal: Literal, length: usize) -> Expression {
        Expression::new(ExpressionKind::Literal(literal), self.range(length))
    }

    pub fn int(&self, value: i64) -> Expression {
        self.literal(Literal::Integer(value), value.to_string().len())
    }

    pub fn long(&self, value: i64) -> Expression {
        self.literal(Literal::LongInteger(value), value.to_string().len() + 1)
    }

    pub fn float(&self, text: &str) -> Expression {
        self.literal(Literal::Float(text.to_string()), text.len())
    }

    pub fn double(&self, text: &str) -> Expression {
        self.literal(Literal::Double(text.to_string()), text.len())
    }

    pub fn string(&self, value: &str) -> Expression {
        self.literal(Literal::String(value.to_string()), value.len() + 2)
    }

    pub fn boolean(&self, value: bool) -> Expression {
        self.literal(Literal::Boolean(value), if value { 4 } else { 5 })
    }

    pub fn invalid(&self) -> Expression {
        self.literal(Literal::Invalid, 7)
    }

    pub fn var(&self, name: &str) -> Expression {
        let ident = self.ident(name);
        let range = ident.range;
        Expression::new(ExpressionKind::Variable(ident), range)
    }

    /// `a.b.c` as nested dotted gets rooted in a variable.
    pub fn dotted(&self, path: &str) -> Expression {
        let name = self.name(path);
        let mut parts = name.parts.into_iter();
        let Some(first) = parts.next() else {
            return Expression::new(ExpressionKind::Variable(Identifier::new("", name.range)), name.range);
        };
        let mut expr = Expression::new(ExpressionKind::Variable(first.clone()), first.range);
        for part in parts {
            let range = expr.range.merge(&part.range);
            expr = Expression::new(
                ExpressionKind::DottedGet {
                    object: Box::new(expr),
                    name: part,
                },
                range,
            );
        }
        expr
    }

    pub fn get(&self, object: Expression, name: &str) -> Expression {
        let name = self.ident(name);
        let range = object.range.merge(&name.range);
        Expression::new(
            ExpressionKind::DottedGet {
                object: Box::new(object),
                name,
            },
            range,
        )
    }

    pub fn index(&self, object: Expression, index: Expression) -> Expression {
        let range = object.range.merge(&index.range);
        Expression::new(
            ExpressionKind::IndexedGet {
                object: Box::new(object),
                index: Box::new(index),
            },
            range,
        )
    }

    pub fn call(&self, callee: Expression, args: Vec<Expression>) -> Expression {
        let range = args.iter().fold(callee.range, |range, arg| range.merge(&arg.range));
        Expression::new(
            ExpressionKind::Call {
                callee: Box::new(callee),
                args,
            },
            range,
        )
    }

    /// `CreateObject(args...)` with string arguments.
    pub fn create_object(&self, args: &[&str]) -> Expression {
        let callee = self.var("CreateObject");
        let args = args.iter().map(|arg| self.string(arg)).collect();
        self.call(callee, args)
    }

    pub fn callfunc(&self, object: Expression, method: &str, args: Vec<Expression>) -> Expression {
        let method = self.ident(method);
        let range = object.range.merge(&method.range);
        Expression::new(
            ExpressionKind::Callfunc {
                object: Box::new(object),
                method,
                args,
            },
            range,
        )
    }

    pub fn new_object(&self, class_name: &str, args: Vec<Expression>) -> Expression {
        let class_name = self.name(class_name);
        let range = class_name.range;
        Expression::new(ExpressionKind::New { class_name, args }, range)
    }

    pub fn binary(&self, left: Expression, op: BinaryOp, right: Expression) -> Expression {
        let range = left.range.merge(&right.range);
        Expression::new(
            ExpressionKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            range,
        )
    }

    pub fn negate(&self, operand: Expression) -> Expression {
        let range = operand.range;
        Expression::new(
            ExpressionKind::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
            },
            range,
        )
    }

    pub fn not(&self, operand: Expression) -> Expression {
        let range = operand.range;
        Expression::new(
            ExpressionKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            range,
        )
    }

    pub fn group(&self, inner: Expression) -> Expression {
        let range = inner.range;
        Expression::new(ExpressionKind::Grouping(Box::new(inner)), range)
    }

    pub fn array(&self, items: Vec<Expression>) -> Expression {
        Expression::new(ExpressionKind::ArrayLiteral(items), self.range(2))
    }

    pub fn aa(&self, entries: Vec<(&str, Expression)>) -> Expression {
        let entries = entries.into_iter().map(|(key, value)| (self.ident(key), value)).collect();
        Expression::new(ExpressionKind::AALiteral(entries), self.range(2))
    }

    pub fn template(&self, parts: Vec<Expression>) -> Expression {
        Expression::new(ExpressionKind::TemplateString(parts), self.range(2))
    }

    pub fn function_expr(&self, params: Vec<Parameter>, body: Vec<Statement>) -> Expression {
        let func = self.func(FunctionKind::Function, params, None, body);
        let range = func.range;
        Expression::new(ExpressionKind::Function(func), range)
    }

    pub fn param(&self, name: &str, type_name: Option<&str>) -> Parameter {
        Parameter {
            name: self.ident(name),
            type_expr: type_name.map(|text| self.type_expr(text)),
            default_value: None,
        }
    }

    pub fn optional_param(&self, name: &str, default_value: Expression) -> Parameter {
        Parameter {
            name: self.ident(name),
            type_expr: None,
            default_value: Some(default_value),
        }
    }

    fn func(
        &self,
        kind: FunctionKind,
        params: Vec<Parameter>,
        return_type: Option<&str>,
        body: Vec<Statement>,
    ) -> FunctionExpression {
        let return_type = return_type.map(|text| self.type_expr(text));
        FunctionExpression::new(kind, params, return_type, body, self.range(8))
    }

    // Statements

    fn stmt(&self, kind: StatementKind, length: usize) -> Statement {
        Statement::new(kind, self.range(length))
    }

    pub fn assign(&self, name: &str, value: Expression) -> Statement {
        let name = self.ident(name);
        let range = name.range.merge(&value.range);
        Statement::new(StatementKind::Assignment { name, value }, range)
    }

    pub fn dotted_set(&self, object: Expression, name: &str, value: Expression) -> Statement {
        let name = self.ident(name);
        let range = object.range.merge(&value.range);
        Statement::new(StatementKind::DottedSet { object, name, value }, range)
    }

    pub fn expr_stmt(&self, expr: Expression) -> Statement {
        let range = expr.range;
        Statement::new(StatementKind::Expression(expr), range)
    }

    pub fn print(&self, exprs: Vec<Expression>) -> Statement {
        self.stmt(StatementKind::Print(exprs), 5)
    }

    pub fn ret(&self, value: Option<Expression>) -> Statement {
        self.stmt(StatementKind::Return(value), 6)
    }

    pub fn if_(&self, condition: Expression, then_branch: Vec<Statement>, else_branch: Vec<Statement>) -> Statement {
        self.stmt(
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            },
            2,
        )
    }

    pub fn while_(&self, condition: Expression, body: Vec<Statement>) -> Statement {
        self.stmt(StatementKind::While { condition, body }, 5)
    }

    pub fn for_each(&self, item: &str, target: Expression, body: Vec<Statement>) -> Statement {
        let item = self.ident(item);
        self.stmt(StatementKind::ForEach { item, target, body }, 8)
    }

    pub fn function(&self, name: &str, params: Vec<Parameter>, return_type: Option<&str>, body: Vec<Statement>) -> Statement {
        let name = self.ident(name);
        let func = self.func(FunctionKind::Function, params, return_type, body);
        let range = func.range;
        Statement::new(StatementKind::Function(FunctionStatement { name, func }), range)
    }

    pub fn sub(&self, name: &str, params: Vec<Parameter>, body: Vec<Statement>) -> Statement {
        let name = self.ident(name);
        let func = self.func(FunctionKind::Sub, params, None, body);
        let range = func.range;
        Statement::new(StatementKind::Function(FunctionStatement { name, func }), range)
    }

    pub fn namespace(&self, name: &str, body: Vec<Statement>) -> Statement {
        let name = self.name(name);
        let range = name.range;
        Statement::new(StatementKind::Namespace(NamespaceStatement::new(name, body)), range)
    }

    pub fn class(&self, name: &str, parent_class: Option<&str>, members: Vec<ClassMember>) -> Statement {
        let name = self.ident(name);
        let parent_class = parent_class.map(|parent| self.name(parent));
        let range = name.range;
        Statement::new(
            StatementKind::Class(ClassStatement {
                name,
                parent_class,
                members,
            }),
            range,
        )
    }

    pub fn method(&self, name: &str, params: Vec<Parameter>, return_type: Option<&str>, body: Vec<Statement>) -> ClassMember {
        let name = self.ident(name);
        let kind = if return_type.is_some() {
            FunctionKind::Function
        } else {
            FunctionKind::Sub
        };
        let func = self.func(kind, params, return_type, body);
        let range = name.range;
        ClassMember::Method(MethodStatement {
            name,
            access_modifier: None,
            is_override: false,
            func,
            range,
        })
    }

    pub fn field(&self, name: &str, type_name: Option<&str>, initial_value: Option<Expression>) -> ClassMember {
        let name = self.ident(name);
        let type_expr = type_name.map(|text| self.type_expr(text));
        let range = name.range;
        ClassMember::Field(FieldStatement {
            name,
            access_modifier: None,
            type_expr,
            initial_value,
            range,
        })
    }

    pub fn enumeration(&self, name: &str, members: Vec<(&str, Option<Expression>)>) -> Statement {
        let name = self.ident(name);
        let members = members
            .into_iter()
            .map(|(member, value)| {
                let member = self.ident(member);
                let range = member.range;
                EnumMember {
                    name: member,
                    value,
                    range,
                }
            })
            .collect();
        let range = name.range;
        Statement::new(StatementKind::Enum(EnumStatement { name, members }), range)
    }

    pub fn interface(&self, name: &str, fields: Vec<(&str, &str)>) -> Statement {
        let name = self.ident(name);
        let fields = fields
            .into_iter()
            .map(|(field, type_name)| InterfaceField {
                name: self.ident(field),
                type_expr: Some(self.type_expr(type_name)),
            })
            .collect();
        let range = name.range;
        Statement::new(
            StatementKind::Interface(InterfaceStatement {
                name,
                parent_interface: None,
                fields,
                methods: Vec::new(),
            }),
            range,
        )
    }

    pub fn constant(&self, name: &str, value: Expression) -> Statement {
        let name = self.ident(name);
        let range = name.range;
        Statement::new(StatementKind::Const(ConstStatement { name, value }), range)
    }

    pub fn import(&self, path: &str) -> Statement {
        self.stmt(StatementKind::Import(path.to_string()), path.len() + 7)
    }

    /// Bind `statements` into a file at `pkg_path`.
    pub fn file(&self, pkg_path: &str, statements: Vec<Statement>) -> BrsFile {
        BrsFile::new(format!("/project/{}", pkg_path), pkg_path, statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_get_distinct_lines() {
        let b = AstBuilder::new();
        let a = b.var("a");
        let c = b.var("a");
        assert_ne!(a.range, c.range);
    }

    #[test]
    fn dotted_lays_out_one_line() {
        let b = AstBuilder::starting_at(10);
        let expr = b.dotted("alpha.beta.charlie");
        let parts = expr.dotted_parts().unwrap();
        let texts: Vec<&str> = parts.iter().map(|part| part.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta", "charlie"]);
        assert_eq!(parts[1].range, Range::on_line(10, 10, 4));
        assert_eq!(expr.range, Range::new(10, 4, 10, 22));
    }

    #[test]
    fn negative_literals_keep_their_type() {
        let b = AstBuilder::new();
        assert_eq!(b.negate(b.float("1.5")).literal_type(), Some(crate::ast::BscType::Float));
        assert_eq!(b.negate(b.string("x")).literal_type(), None);
    }
}
