use crate::error::SyntaxError;
use bsc_source::Range;

/// A single name as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub text: String,
    pub range: Range,
}

impl Identifier {
    pub fn new(text: impl Into<String>, range: Range) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    /// The case-insensitive key of this name.
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

/// A dotted name such as `Alpha.Beta.Charlie`, used for namespace names,
/// `extends` clauses and `new` targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    pub parts: Vec<Identifier>,
    pub range: Range,
}

impl NamespacedName {
    pub fn from_parts(parts: Vec<Identifier>) -> Self {
        let range = match (parts.first(), parts.last()) {
            (Some(first), Some(last)) => first.range.merge(&last.range),
            _ => Range::default(),
        };
        Self { parts, range }
    }

    /// Split dotted text written at `range` into its parts.
    ///
    /// Part ranges are laid out left to right on the start line of `range`.
    pub fn parse(text: &str, range: Range) -> Result<Self, SyntaxError> {
        let mut parts = Vec::new();
        let mut column = range.start.character;
        for part in text.split('.') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                return Err(SyntaxError::InvalidName {
                    name: text.to_string(),
                    range,
                });
            }
            parts.push(Identifier::new(trimmed, Range::on_line(range.start.line, column, trimmed.len() as u32)));
            column += part.len() as u32 + 1;
        }
        Ok(Self { parts, range })
    }

    /// Dotted text as written.
    pub fn text(&self) -> String {
        self.parts.iter().map(|part| part.text.as_str()).collect::<Vec<_>>().join(".")
    }

    /// Lower-cased dotted text, the registry key form.
    pub fn lower(&self) -> String {
        self.text().to_lowercase()
    }

    pub fn last(&self) -> Option<&Identifier> {
        self.parts.last()
    }
}

/// A literal value. Floating point literals keep their source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(i64),
    LongInteger(i64),
    Float(String),
    Double(String),
    String(String),
    Boolean(bool),
    Invalid,
}

impl Literal {
    pub fn bsc_type(&self) -> super::BscType {
        use super::BscType;
        match self {
            Literal::Integer(_) => BscType::Integer,
            Literal::LongInteger(_) => BscType::LongInteger,
            Literal::Float(_) => BscType::Float,
            Literal::Double(_) => BscType::Double,
            Literal::String(_) => BscType::String,
            Literal::Boolean(_) => BscType::Boolean,
            Literal::Invalid => BscType::Invalid,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IntegerDivide,
    Modulo,
    Exponent,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
}
