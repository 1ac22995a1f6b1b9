use std::fmt;

use serde::Serialize;

use crate::classes::node::{AccessLevel, MemberSignature, TypeKind};

/// A compatibility problem found in a plugin.
///
/// Problems are plain values: two problems with equal fields are the same
/// problem, however many instructions produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    ClassNotFound {
        name: String,
    },
    MethodNotFound {
        owner: String,
        signature: MemberSignature,
    },
    FieldNotFound {
        owner: String,
        signature: MemberSignature,
    },
    /// A concrete class does not implement an abstract method it inherits
    AbstractMethodNotImplemented {
        owner: String,
        signature: MemberSignature,
        declared_in: String,
    },
    /// `accessor_class` refers to a class (`member` absent) or a member of
    /// `owner` it is not allowed to see
    IllegalAccess {
        owner: String,
        member: Option<MemberSignature>,
        accessor_class: String,
        access: AccessLevel,
    },
    InvalidClassFile {
        name: String,
        reason: String,
    },
    FailedToReadClass {
        name: String,
        reason: String,
    },
    InheritFromFinalClass {
        child: String,
        parent: String,
    },
    /// `name` was used as a `expected` but is a `actual`
    IncompatibleClassChange {
        name: String,
        expected: TypeKind,
        actual: TypeKind,
    },
    /// `owner` declares a method that `final_in` declares final
    OverridingFinalMethod {
        owner: String,
        signature: MemberSignature,
        final_in: String,
    },
    InvokeStaticOnInstanceMethod {
        owner: String,
        signature: MemberSignature,
    },
    InvokeInstanceOnStaticMethod {
        owner: String,
        signature: MemberSignature,
    },
    StaticAccessOfInstanceField {
        owner: String,
        signature: MemberSignature,
    },
    InstanceAccessOfStaticField {
        owner: String,
        signature: MemberSignature,
    },
    AbstractClassInstantiation {
        name: String,
    },
    InterfaceInstantiation {
        name: String,
    },
}

impl Problem {
    /// Short identifier of the problem type
    pub fn kind(&self) -> &'static str {
        match self {
            Problem::ClassNotFound { .. } => "class_not_found",
            Problem::MethodNotFound { .. } => "method_not_found",
            Problem::FieldNotFound { .. } => "field_not_found",
            Problem::AbstractMethodNotImplemented { .. } => "abstract_method_not_implemented",
            Problem::IllegalAccess { .. } => "illegal_access",
            Problem::InvalidClassFile { .. } => "invalid_class_file",
            Problem::FailedToReadClass { .. } => "failed_to_read_class",
            Problem::InheritFromFinalClass { .. } => "inherit_from_final_class",
            Problem::IncompatibleClassChange { .. } => "incompatible_class_change",
            Problem::OverridingFinalMethod { .. } => "overriding_final_method",
            Problem::InvokeStaticOnInstanceMethod { .. } => "invoke_static_on_instance_method",
            Problem::InvokeInstanceOnStaticMethod { .. } => "invoke_instance_on_static_method",
            Problem::StaticAccessOfInstanceField { .. } => "static_access_of_instance_field",
            Problem::InstanceAccessOfStaticField { .. } => "instance_access_of_static_field",
            Problem::AbstractClassInstantiation { .. } => "abstract_class_instantiation",
            Problem::InterfaceInstantiation { .. } => "interface_instantiation",
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::ClassNotFound { name } => write!(f, "Class {} is not found", name),
            Problem::MethodNotFound { owner, signature } => {
                write!(f, "Method {}.{} is not found", owner, signature)
            }
            Problem::FieldNotFound { owner, signature } => {
                write!(f, "Field {}.{} is not found", owner, signature)
            }
            Problem::AbstractMethodNotImplemented {
                owner,
                signature,
                declared_in,
            } => write!(
                f,
                "Concrete class {} does not implement abstract method {}.{}",
                owner, declared_in, signature
            ),
            Problem::IllegalAccess {
                owner,
                member: Some(member),
                accessor_class,
                access,
            } => write!(
                f,
                "Illegal access to {} member {}.{} from {}",
                access, owner, member, accessor_class
            ),
            Problem::IllegalAccess {
                owner,
                member: None,
                accessor_class,
                access,
            } => write!(
                f,
                "Illegal access to {} class {} from {}",
                access, owner, accessor_class
            ),
            Problem::InvalidClassFile { name, reason } => {
                write!(f, "Class file of {} is invalid: {}", name, reason)
            }
            Problem::FailedToReadClass { name, reason } => {
                write!(f, "Failed to read class {}: {}", name, reason)
            }
            Problem::InheritFromFinalClass { child, parent } => {
                write!(f, "Class {} inherits from final class {}", child, parent)
            }
            Problem::IncompatibleClassChange {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Incompatible change of {}: expected {} but found {}",
                name, expected, actual
            ),
            Problem::OverridingFinalMethod {
                owner,
                signature,
                final_in,
            } => write!(
                f,
                "Method {}.{} overrides final method {}.{}",
                owner, signature, final_in, signature
            ),
            Problem::InvokeStaticOnInstanceMethod { owner, signature } => {
                write!(f, "Instance method {}.{} is invoked as static", owner, signature)
            }
            Problem::InvokeInstanceOnStaticMethod { owner, signature } => write!(
                f,
                "Static method {}.{} is invoked as an instance method",
                owner, signature
            ),
            Problem::StaticAccessOfInstanceField { owner, signature } => {
                write!(f, "Instance field {}.{} is accessed as static", owner, signature)
            }
            Problem::InstanceAccessOfStaticField { owner, signature } => write!(
                f,
                "Static field {}.{} is accessed as an instance field",
                owner, signature
            ),
            Problem::AbstractClassInstantiation { name } => {
                write!(f, "Abstract class {} is instantiated", name)
            }
            Problem::InterfaceInstantiation { name } => {
                write!(f, "Interface {} is instantiated", name)
            }
        }
    }
}
