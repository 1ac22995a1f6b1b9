use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

/// Binary name of the root of every class hierarchy.
pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// Public and protected methods every class inherits from `java.lang.Object`.
/// Used when `java.lang.Object` itself is not on any classpath.
pub const OBJECT_METHODS: &[(&str, &str)] = &[
    ("<init>", "()V"),
    ("equals", "(Ljava/lang/Object;)Z"),
    ("hashCode", "()I"),
    ("toString", "()Ljava/lang/String;"),
    ("getClass", "()Ljava/lang/Class;"),
    ("notify", "()V"),
    ("notifyAll", "()V"),
    ("wait", "()V"),
    ("wait", "(J)V"),
    ("wait", "(JI)V"),
    ("clone", "()Ljava/lang/Object;"),
    ("finalize", "()V"),
];

bitflags! {
    /// Access and property flags of classes, fields and methods as stored in
    /// the class file. Flags that share a bit between member kinds keep
    /// their class-level name.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const VOLATILE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

impl AccessFlags {
    /// Returns the visibility encoded in these flags.
    pub fn access_level(&self) -> AccessLevel {
        if self.contains(AccessFlags::PUBLIC) {
            AccessLevel::Public
        } else if self.contains(AccessFlags::PRIVATE) {
            AccessLevel::Private
        } else if self.contains(AccessFlags::PROTECTED) {
            AccessLevel::Protected
        } else {
            AccessLevel::PackagePrivate
        }
    }
}

/// Visibility of a class or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Public => write!(f, "public"),
            AccessLevel::Protected => write!(f, "protected"),
            AccessLevel::PackagePrivate => write!(f, "package-private"),
            AccessLevel::Private => write!(f, "private"),
        }
    }
}

/// Whether a type is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
        }
    }
}

/// Name plus JVM descriptor identifying a field or method within its class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberSignature {
    pub name: String,
    pub descriptor: String,
}

impl MemberSignature {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Method descriptors start with the parameter list.
    pub fn is_method(&self) -> bool {
        self.descriptor.starts_with('(')
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_method() {
            write!(f, "{}{}", self.name, self.descriptor)
        } else {
            write!(f, "{}:{}", self.name, self.descriptor)
        }
    }
}

/// How a method reference is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A symbol referenced by a bytecode instruction. Owners are binary names
/// in dotted form; array owners keep their descriptor form (`[Lfoo.Bar;`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    Class {
        name: String,
    },
    /// Instance creation with `new`
    New {
        name: String,
    },
    Field {
        owner: String,
        signature: MemberSignature,
        is_static: bool,
    },
    Method {
        owner: String,
        signature: MemberSignature,
        kind: InvokeKind,
    },
}

/// Symbol references made by one method: its instructions, then the
/// catch types of its exception handlers, then its `throws` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub signature: MemberSignature,
    pub references: Vec<Reference>,
}

/// The resolved shape of one class: hierarchy, members and access flags.
/// Method bodies are only present when the class was read in full mode,
/// and only for methods with code or a `throws` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access: AccessFlags,
    pub fields: BTreeMap<MemberSignature, AccessFlags>,
    pub methods: BTreeMap<MemberSignature, AccessFlags>,
    pub bodies: Vec<MethodBody>,
}

impl ClassNode {
    /// Creates an empty public class extending `java.lang.Object`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: Some(JAVA_LANG_OBJECT.to_string()),
            interfaces: Vec::new(),
            access: AccessFlags::PUBLIC | AccessFlags::SUPER,
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
            bodies: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access.contains(AccessFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access.contains(AccessFlags::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.access.contains(AccessFlags::FINAL)
    }

    pub fn kind(&self) -> TypeKind {
        if self.is_interface() {
            TypeKind::Interface
        } else {
            TypeKind::Class
        }
    }

    pub fn package_name(&self) -> &str {
        package_of(&self.name)
    }

    pub fn method(&self, signature: &MemberSignature) -> Option<AccessFlags> {
        self.methods.get(signature).copied()
    }

    pub fn field(&self, signature: &MemberSignature) -> Option<AccessFlags> {
        self.fields.get(signature).copied()
    }
}

/// Package part of a dotted binary name; empty for the default package.
pub fn package_of(class_name: &str) -> &str {
    class_name
        .rsplit_once('.')
        .map(|(package, _)| package)
        .unwrap_or("")
}

/// Outermost enclosing class of a (possibly nested) binary name.
pub fn top_level_of(class_name: &str) -> &str {
    let simple_start = class_name.rfind('.').map(|dot| dot + 1).unwrap_or(0);
    match class_name[simple_start..].find('$') {
        Some(dollar) => &class_name[..simple_start + dollar],
        None => class_name,
    }
}

/// Resolves a class constant to the class that must be loaded for it:
/// the element class of an object array, nothing for primitive arrays,
/// and the name itself otherwise.
pub fn element_class(name: &str) -> Option<&str> {
    let element = name.trim_start_matches('[');
    if element.len() == name.len() {
        return Some(name);
    }
    element
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
}

/// Dotted names of all classes mentioned in a field or method descriptor.
/// Descriptors are validated when the class file is parsed, so malformed
/// fragments are skipped rather than reported here.
pub fn descriptor_classes(descriptor: &str) -> Vec<String> {
    let mut classes = Vec::new();
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        let tail = &rest[start + 1..];
        match tail.find(';') {
            Some(end) => {
                classes.push(tail[..end].replace('/', "."));
                rest = &tail[end + 1..];
            }
            None => break,
        }
    }
    classes
}
