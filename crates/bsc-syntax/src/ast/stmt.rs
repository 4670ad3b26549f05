use super::common::{Identifier, NamespacedName};
use super::expr::{Expression, FunctionExpression, Parameter};
use super::types::{BscType, TypeExpression};
use crate::symbol_table::SymbolTable;
use bsc_source::Range;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Assignment {
        name: Identifier,
        value: Expression,
    },
    /// `object.name = value`
    DottedSet {
        object: Expression,
        name: Identifier,
        value: Expression,
    },
    Expression(Expression),
    Print(Vec<Expression>),
    Return(Option<Expression>),
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    ForEach {
        item: Identifier,
        target: Expression,
        body: Vec<Statement>,
    },
    Function(FunctionStatement),
    Namespace(NamespaceStatement),
    Class(ClassStatement),
    Enum(EnumStatement),
    Interface(InterfaceStatement),
    Const(ConstStatement),
    Import(String),
}

impl Statement {
    pub fn new(kind: StatementKind, range: Range) -> Self {
        Self { kind, range }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionStatement {
    pub name: Identifier,
    pub func: FunctionExpression,
}

/// One `namespace X.Y ... end namespace` block. The same name may be opened
/// by several blocks across files.
#[derive(Debug, Clone)]
pub struct NamespaceStatement {
    pub name: NamespacedName,
    pub body: Vec<Statement>,
    pub symbol_table: Arc<SymbolTable>,
}

impl NamespaceStatement {
    pub fn new(name: NamespacedName, body: Vec<Statement>) -> Self {
        let symbol_table = Arc::new(SymbolTable::new(format!("namespace {}", name.text())));
        Self {
            name,
            body,
            symbol_table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessModifier {
    Public,
    Protected,
    Private,
}

impl AccessModifier {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessModifier::Public => "public",
            AccessModifier::Protected => "protected",
            AccessModifier::Private => "private",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassStatement {
    pub name: Identifier,
    pub parent_class: Option<NamespacedName>,
    pub members: Vec<ClassMember>,
}

impl ClassStatement {
    pub fn methods(&self) -> impl Iterator<Item = &MethodStatement> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Method(method) => Some(method),
            ClassMember::Field(_) => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldStatement> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Field(field) => Some(field),
            ClassMember::Method(_) => None,
        })
    }

    /// The `new` method, if the class declares one.
    pub fn constructor(&self) -> Option<&MethodStatement> {
        self.methods().find(|method| method.name.text.eq_ignore_ascii_case("new"))
    }
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Method(MethodStatement),
    Field(FieldStatement),
}

impl ClassMember {
    pub fn name(&self) -> &Identifier {
        match self {
            ClassMember::Method(method) => &method.name,
            ClassMember::Field(field) => &field.name,
        }
    }

    pub fn access_modifier(&self) -> AccessModifier {
        let written = match self {
            ClassMember::Method(method) => method.access_modifier,
            ClassMember::Field(field) => field.access_modifier,
        };
        written.unwrap_or(AccessModifier::Public)
    }

    pub fn range(&self) -> Range {
        match self {
            ClassMember::Method(method) => method.range,
            ClassMember::Field(field) => field.range,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, ClassMember::Method(_))
    }

    /// Mark a method `override`. Fields are returned unchanged.
    pub fn overriding(mut self) -> Self {
        if let ClassMember::Method(method) = &mut self {
            method.is_override = true;
        }
        self
    }

    pub fn with_access(mut self, access: AccessModifier) -> Self {
        match &mut self {
            ClassMember::Method(method) => method.access_modifier = Some(access),
            ClassMember::Field(field) => field.access_modifier = Some(access),
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodStatement {
    pub name: Identifier,
    pub access_modifier: Option<AccessModifier>,
    pub is_override: bool,
    pub func: FunctionExpression,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct FieldStatement {
    pub name: Identifier,
    pub access_modifier: Option<AccessModifier>,
    pub type_expr: Option<TypeExpression>,
    pub initial_value: Option<Expression>,
    pub range: Range,
}

impl FieldStatement {
    /// Declared type, else the type of the initializer, else dynamic.
    pub fn field_type(&self) -> BscType {
        match (&self.type_expr, &self.initial_value) {
            (Some(annotation), _) => annotation.to_bsc_type(),
            (None, Some(value)) => value.inferred_type(),
            (None, None) => BscType::Dynamic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumStatement {
    pub name: Identifier,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: Identifier,
    pub value: Option<Expression>,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct InterfaceStatement {
    pub name: Identifier,
    pub parent_interface: Option<NamespacedName>,
    pub fields: Vec<InterfaceField>,
    pub methods: Vec<InterfaceMethod>,
}

#[derive(Debug, Clone)]
pub struct InterfaceField {
    pub name: Identifier,
    pub type_expr: Option<TypeExpression>,
}

#[derive(Debug, Clone)]
pub struct InterfaceMethod {
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeExpression>,
}

#[derive(Debug, Clone)]
pub struct ConstStatement {
    pub name: Identifier,
    pub value: Expression,
}
