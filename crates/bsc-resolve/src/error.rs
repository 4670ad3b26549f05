use bsc_source::{Diagnostic as SourceDiagnostic, Range, Severity};
use miette::Diagnostic;
use thiserror::Error;

/// Every problem the resolver can report.
///
/// Each variant has a stable numeric code (`number`) that users filter and
/// override severities by, and a default severity. `at` places a finding in a
/// file to produce the plain diagnostic the rest of the pipeline carries.
#[derive(Debug, Error, Diagnostic, Clone, Hash, PartialEq, Eq)]
pub enum ResolveDiagnostic {
    /// The leftmost name of an expression (or the first unresolvable part after a
    /// namespace) is not declared anywhere in the scope.
    #[error("Cannot find name '{name}'{}", .namespace.as_ref().map(|ns| format!(" in namespace '{}'", ns)).unwrap_or_default())]
    #[diagnostic(code(bsc_resolve::cannot_find_name))]
    CannotFindName {
        name: String,
        /// The namespace the lookup walked into, when the name followed one.
        namespace: Option<String>,
    },

    /// A member access on an enum names a member the enum does not declare.
    #[error("Property '{name}' does not exist on enum '{enum_name}'")]
    #[diagnostic(code(bsc_resolve::unknown_enum_value))]
    UnknownEnumValue { name: String, enum_name: String },

    /// A compile-time-only construct (a namespace) used as a runtime value.
    #[error("{kind} '{name}' cannot be used as a variable")]
    #[diagnostic(
        code(bsc_resolve::item_cannot_be_used_as_variable),
        help("Namespaces only exist at compile time; reference a member of the namespace instead")
    )]
    ItemCannotBeUsedAsVariable { kind: String, name: String },

    /// A call to a known function with an argument count outside its parameter range.
    #[error("Expected {expected} arguments, but got {actual}")]
    #[diagnostic(code(bsc_resolve::mismatch_argument_count))]
    MismatchArgumentCount { expected: String, actual: usize },

    /// `new X()` where `X` resolves to something other than a class.
    #[error("Cannot use the 'new' keyword here for '{name}'")]
    #[diagnostic(code(bsc_resolve::expression_is_not_constructable))]
    ExpressionIsNotConstructable { name: String },

    /// `new X()` where `X` resolves to nothing at all.
    #[error("Class '{name}' could not be found when this file is included in scope '{scope}'")]
    #[diagnostic(code(bsc_resolve::class_could_not_be_found))]
    ClassCouldNotBeFound { name: String, scope: String },

    #[error("Function return type '{type_name}' is invalid")]
    #[diagnostic(code(bsc_resolve::invalid_function_return_type))]
    InvalidFunctionReturnType { type_name: String },

    #[error("Parameter '{param}' is of invalid type '{type_name}'")]
    #[diagnostic(code(bsc_resolve::function_parameter_type_is_invalid))]
    FunctionParameterTypeIsInvalid { param: String, type_name: String },

    /// A class field annotated with a type no class, interface or enum declares.
    #[error("Cannot find type with name '{type_name}'")]
    #[diagnostic(code(bsc_resolve::cannot_find_type))]
    CannotFindType { type_name: String },

    /// A second class with the same fully-qualified name. The declaration from the
    /// first file by sorted path wins.
    #[error("Scope '{scope}' already contains a class with name '{name}'")]
    #[diagnostic(code(bsc_resolve::duplicate_class_declaration))]
    DuplicateClassDeclaration { scope: String, name: String },

    #[error("Namespaced class '{name}' cannot have the same name as a non-namespaced class")]
    #[diagnostic(code(bsc_resolve::namespaced_class_cannot_share_name_with_non_namespaced_class))]
    NamespacedClassCannotShareNameWithNonNamespacedClass { name: String },

    /// A class hierarchy that loops back on itself. `path` is the loop as written,
    /// for example `A -> B -> A`.
    #[error("Circular reference detected: {path}")]
    #[diagnostic(code(bsc_resolve::circular_reference_detected))]
    CircularReferenceDetected { path: String },

    #[error("Duplicate identifier '{name}'")]
    #[diagnostic(code(bsc_resolve::duplicate_identifier))]
    DuplicateIdentifier { name: String },

    /// A member that is a field in one class and a method in an ancestor (or the reverse).
    #[error("Class member is a {member_kind} here but a {ancestor_member_kind} in ancestor class '{ancestor_class}'")]
    #[diagnostic(code(bsc_resolve::class_child_member_different_member_type_than_ancestor))]
    ClassChildMemberDifferentMemberTypeThanAncestor {
        member_kind: String,
        ancestor_member_kind: String,
        ancestor_class: String,
    },

    #[error("Field '{field}' in class '{child_class}' is not assignable to the same field in base class '{base_class}': type '{child_type}' is not assignable to type '{base_type}'")]
    #[diagnostic(code(bsc_resolve::child_field_type_not_assignable_to_base_property))]
    ChildFieldTypeNotAssignableToBaseProperty {
        child_class: String,
        base_class: String,
        field: String,
        child_type: String,
        base_type: String,
    },

    #[error("Method has no override keyword but is declared in ancestor class '{ancestor_class}'")]
    #[diagnostic(code(bsc_resolve::missing_override_keyword), help("Add `override` to the method declaration"))]
    MissingOverrideKeyword { ancestor_class: String },

    #[error("Access modifier mismatch: '{member}' is {child_access} in type '{child_class}' but {ancestor_access} in type '{ancestor_class}'")]
    #[diagnostic(code(bsc_resolve::mismatched_overridden_member_visibility))]
    MismatchedOverriddenMemberVisibility {
        member: String,
        child_class: String,
        child_access: String,
        ancestor_class: String,
        ancestor_access: String,
    },

    #[error("Missing call to 'super()' in the constructor of a class that extends another class")]
    #[diagnostic(code(bsc_resolve::class_constructor_missing_super_call))]
    ClassConstructorMissingSuperCall,

    #[error("Illegal use of 'm' before calling 'super()'")]
    #[diagnostic(code(bsc_resolve::class_constructor_illegal_use_of_m_before_super_call))]
    ClassConstructorIllegalUseOfMBeforeSuperCall,

    #[error("Unknown roSGNode '{name}'")]
    #[diagnostic(code(bsc_resolve::unknown_ro_sg_node))]
    UnknownRoSGNode { name: String },

    #[error("Unknown BrightScript component '{name}'")]
    #[diagnostic(code(bsc_resolve::unknown_brightscript_component))]
    UnknownBrightScriptComponent { name: String },

    /// `expected` lists the accepted counts, `actual` is what the call passed;
    /// neither counts the component name itself.
    #[error("For {component}, expected {expected} arguments, but got {actual}")]
    #[diagnostic(code(bsc_resolve::mismatch_create_object_argument_count))]
    MismatchCreateObjectArgumentCount {
        component: String,
        expected: String,
        actual: usize,
    },

    #[error("{name} has been deprecated: {note}")]
    #[diagnostic(code(bsc_resolve::deprecated_brightscript_component), severity(Warning))]
    DeprecatedBrightScriptComponent { name: String, note: String },

    #[error("Scope '{scope}' already contains an enum with name '{name}'")]
    #[diagnostic(code(bsc_resolve::duplicate_enum_declaration))]
    DuplicateEnumDeclaration { scope: String, name: String },

    #[error("Enum value must be type '{expected}'")]
    #[diagnostic(code(bsc_resolve::enum_value_must_be_type))]
    EnumValueMustBeType { expected: String },

    #[error("Value is required for {expected} enum")]
    #[diagnostic(code(bsc_resolve::enum_value_is_required))]
    EnumValueIsRequired { expected: String },
}

impl ResolveDiagnostic {
    /// The stable numeric code, printed as `BS<number>`.
    pub fn number(&self) -> u32 {
        match self {
            ResolveDiagnostic::CannotFindName { .. } => 1001,
            ResolveDiagnostic::UnknownEnumValue { .. } => 1002,
            ResolveDiagnostic::ItemCannotBeUsedAsVariable { .. } => 1003,
            ResolveDiagnostic::MismatchArgumentCount { .. } => 1004,
            ResolveDiagnostic::ExpressionIsNotConstructable { .. } => 1005,
            ResolveDiagnostic::ClassCouldNotBeFound { .. } => 1006,
            ResolveDiagnostic::InvalidFunctionReturnType { .. } => 1007,
            ResolveDiagnostic::FunctionParameterTypeIsInvalid { .. } => 1008,
            ResolveDiagnostic::CannotFindType { .. } => 1009,
            ResolveDiagnostic::DuplicateClassDeclaration { .. } => 1010,
            ResolveDiagnostic::NamespacedClassCannotShareNameWithNonNamespacedClass { .. } => 1011,
            ResolveDiagnostic::CircularReferenceDetected { .. } => 1012,
            ResolveDiagnostic::DuplicateIdentifier { .. } => 1013,
            ResolveDiagnostic::ClassChildMemberDifferentMemberTypeThanAncestor { .. } => 1014,
            ResolveDiagnostic::ChildFieldTypeNotAssignableToBaseProperty { .. } => 1015,
            ResolveDiagnostic::MissingOverrideKeyword { .. } => 1016,
            ResolveDiagnostic::MismatchedOverriddenMemberVisibility { .. } => 1017,
            ResolveDiagnostic::ClassConstructorMissingSuperCall => 1018,
            ResolveDiagnostic::ClassConstructorIllegalUseOfMBeforeSuperCall => 1019,
            ResolveDiagnostic::UnknownRoSGNode { .. } => 1020,
            ResolveDiagnostic::UnknownBrightScriptComponent { .. } => 1021,
            ResolveDiagnostic::MismatchCreateObjectArgumentCount { .. } => 1022,
            ResolveDiagnostic::DeprecatedBrightScriptComponent { .. } => 1023,
            ResolveDiagnostic::DuplicateEnumDeclaration { .. } => 1024,
            ResolveDiagnostic::EnumValueMustBeType { .. } => 1025,
            ResolveDiagnostic::EnumValueIsRequired { .. } => 1026,
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            ResolveDiagnostic::DeprecatedBrightScriptComponent { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Place this finding at `range` in `file`.
    pub fn at(&self, file: &str, range: Range) -> SourceDiagnostic {
        SourceDiagnostic::new(self.number(), self.to_string(), self.default_severity(), file, range)
    }
}
