use bsc_source::Range;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The static type of a value as far as the validator tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BscType {
    Dynamic,
    Boolean,
    Integer,
    LongInteger,
    Float,
    Double,
    String,
    Object,
    Void,
    Invalid,
    Function,
    /// A class, interface or enum name, as written.
    Custom(String),
    Uninitialized,
}

impl BscType {
    /// Map a written type name to a type. Primitive names are case-insensitive;
    /// any other name is a custom type that still has to be resolved.
    pub fn from_type_name(name: &str) -> BscType {
        match name.trim().to_lowercase().as_str() {
            "dynamic" => BscType::Dynamic,
            "boolean" => BscType::Boolean,
            "integer" => BscType::Integer,
            "longinteger" => BscType::LongInteger,
            "float" => BscType::Float,
            "double" => BscType::Double,
            "string" => BscType::String,
            "object" => BscType::Object,
            "void" => BscType::Void,
            "invalid" => BscType::Invalid,
            "function" => BscType::Function,
            _ => BscType::Custom(name.trim().to_string()),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, BscType::Custom(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            BscType::Integer | BscType::LongInteger | BscType::Float | BscType::Double
        )
    }

    /// Whether a value of this type may be stored where `target` is expected.
    ///
    /// Class inheritance is not known here: two custom types are assignable only
    /// when their names match.
    pub fn is_assignable_to(&self, target: &BscType) -> bool {
        use BscType::*;
        match (self, target) {
            (Dynamic, _) | (_, Dynamic) => true,
            (Custom(a), Custom(b)) => a.eq_ignore_ascii_case(b),
            (Custom(_) | Function | Object, Object) => true,
            (Invalid, Object | Custom(_)) => true,
            (Integer, LongInteger | Float | Double) => true,
            (Float, Double) | (LongInteger, Double) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for BscType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BscType::Dynamic => "dynamic",
            BscType::Boolean => "boolean",
            BscType::Integer => "integer",
            BscType::LongInteger => "longinteger",
            BscType::Float => "float",
            BscType::Double => "double",
            BscType::String => "string",
            BscType::Object => "object",
            BscType::Void => "void",
            BscType::Invalid => "invalid",
            BscType::Function => "function",
            BscType::Custom(name) => name,
            BscType::Uninitialized => "uninitialized",
        };
        f.write_str(text)
    }
}

/// A type annotation as written (`as Integer`, `as Alpha.Widget`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeExpression {
    pub text: String,
    pub range: Range,
}

impl TypeExpression {
    pub fn new(text: impl Into<String>, range: Range) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    pub fn to_bsc_type(&self) -> BscType {
        BscType::from_type_name(&self.text)
    }
}
