//! Class and member lookup along the class hierarchy, following the JVM
//! resolution order. Lookups that cross an unresolvable or external
//! ancestor are reported as assumed rather than missing.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::classes::node::{AccessFlags, ClassNode, MemberSignature, JAVA_LANG_OBJECT, OBJECT_METHODS};
use crate::classes::resolver::{ResolutionResult, Resolver};
use crate::config::VerifierConfig;
use crate::verification::problem::Problem;

const METHOD_HANDLE: &str = "java.lang.invoke.MethodHandle";
const VAR_HANDLE: &str = "java.lang.invoke.VarHandle";

pub(crate) enum ClassLookup {
    Found(Arc<ClassNode>),
    /// Assumed present at runtime
    External,
    Failed(Problem),
}

pub(crate) enum MemberLookup {
    Found {
        holder: Arc<ClassNode>,
        flags: AccessFlags,
    },
    NotFound,
    /// Could be inherited from a class that is not available
    Assumed,
}

pub(crate) struct ClassHierarchy<'a> {
    resolver: &'a dyn Resolver,
    config: &'a VerifierConfig,
}

impl<'a> ClassHierarchy<'a> {
    pub(crate) fn new(resolver: &'a dyn Resolver, config: &'a VerifierConfig) -> Self {
        Self { resolver, config }
    }

    pub(crate) fn lookup(&self, class_name: &str) -> ClassLookup {
        if self.config.is_external_class(class_name) {
            return ClassLookup::External;
        }
        match self.resolver.resolve_class(class_name) {
            ResolutionResult::Found(node) => ClassLookup::Found(node),
            // Every JVM provides it; its members come from OBJECT_METHODS
            ResolutionResult::NotFound if class_name == JAVA_LANG_OBJECT => ClassLookup::External,
            ResolutionResult::NotFound => ClassLookup::Failed(Problem::ClassNotFound {
                name: class_name.to_string(),
            }),
            ResolutionResult::Invalid(reason) => ClassLookup::Failed(Problem::InvalidClassFile {
                name: class_name.to_string(),
                reason,
            }),
            ResolutionResult::FailedToRead(reason) => {
                ClassLookup::Failed(Problem::FailedToReadClass {
                    name: class_name.to_string(),
                    reason,
                })
            }
        }
    }

    /// Superclasses of `node`, nearest first. `complete` is false when the
    /// chain stops at a class other than `java.lang.Object` that cannot be
    /// resolved.
    pub(crate) fn superclasses(&self, node: &ClassNode) -> Ancestors {
        let mut ancestors = Ancestors {
            classes: Vec::new(),
            complete: true,
        };
        let mut seen = HashSet::from([node.name.clone()]);
        let mut next = node.super_name.clone();
        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                break;
            }
            match self.lookup(&name) {
                ClassLookup::Found(parent) => {
                    next = parent.super_name.clone();
                    ancestors.classes.push(parent);
                }
                _ => {
                    ancestors.complete = name == JAVA_LANG_OBJECT;
                    break;
                }
            }
        }
        ancestors
    }

    /// Every interface `node` and its superclasses implement, directly or
    /// through other interfaces, in breadth-first order.
    pub(crate) fn all_interfaces(&self, node: &ClassNode, superclasses: &[Arc<ClassNode>]) -> Ancestors {
        let mut ancestors = Ancestors {
            classes: Vec::new(),
            complete: true,
        };
        let mut queue: VecDeque<String> = node.interfaces.iter().cloned().collect();
        for class in superclasses {
            queue.extend(class.interfaces.iter().cloned());
        }
        let mut seen = HashSet::new();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.lookup(&name) {
                ClassLookup::Found(interface) => {
                    queue.extend(interface.interfaces.iter().cloned());
                    ancestors.classes.push(interface);
                }
                _ => ancestors.complete = false,
            }
        }
        ancestors
    }

    /// Resolves a method of a class: the class itself, its superclasses,
    /// then its superinterfaces. Constructors are only looked up in the
    /// class itself.
    pub(crate) fn find_method(&self, owner: &Arc<ClassNode>, signature: &MemberSignature) -> MemberLookup {
        if let Some(flags) = owner.method(signature) {
            return found(owner, flags);
        }
        if signature.is_constructor() {
            return MemberLookup::NotFound;
        }
        if is_signature_polymorphic(owner, signature) {
            return MemberLookup::Assumed;
        }

        let superclasses = self.superclasses(owner);
        for class in &superclasses.classes {
            if let Some(flags) = class.method(signature) {
                return found(class, flags);
            }
            if is_signature_polymorphic(class, signature) {
                return MemberLookup::Assumed;
            }
        }
        if !self.has_object(&superclasses.classes) && is_object_method(signature) {
            return MemberLookup::Assumed;
        }

        let interfaces = self.all_interfaces(owner, &superclasses.classes);
        for interface in &interfaces.classes {
            if let Some(flags) = interface.method(signature) {
                if !flags.intersects(AccessFlags::PRIVATE | AccessFlags::STATIC) {
                    return found(interface, flags);
                }
            }
        }

        if superclasses.complete && interfaces.complete {
            MemberLookup::NotFound
        } else {
            MemberLookup::Assumed
        }
    }

    /// Resolves a field: the class itself, its superinterfaces, then its
    /// superclasses, each superclass followed by its own interfaces.
    pub(crate) fn find_field(&self, owner: &Arc<ClassNode>, signature: &MemberSignature) -> MemberLookup {
        let mut seen = HashSet::new();
        let mut complete = true;
        let mut current = Some(Arc::clone(owner));
        while let Some(class) = current.take() {
            if !seen.insert(class.name.clone()) {
                break;
            }
            if let Some(lookup) = self.find_field_in(&class, signature, &mut seen, &mut complete) {
                return lookup;
            }
            if let Some(super_name) = &class.super_name {
                match self.lookup(super_name) {
                    ClassLookup::Found(parent) => current = Some(parent),
                    _ if super_name == JAVA_LANG_OBJECT => {}
                    _ => complete = false,
                }
            }
        }
        if complete {
            MemberLookup::NotFound
        } else {
            MemberLookup::Assumed
        }
    }

    /// Looks in `class` and then depth-first through its superinterfaces.
    fn find_field_in(
        &self,
        class: &Arc<ClassNode>,
        signature: &MemberSignature,
        seen: &mut HashSet<String>,
        complete: &mut bool,
    ) -> Option<MemberLookup> {
        if let Some(flags) = class.field(signature) {
            return Some(found(class, flags));
        }
        for interface_name in &class.interfaces {
            if seen.contains(interface_name) {
                continue;
            }
            seen.insert(interface_name.clone());
            match self.lookup(interface_name) {
                ClassLookup::Found(interface) => {
                    if let Some(lookup) = self.find_field_in(&interface, signature, seen, complete) {
                        return Some(lookup);
                    }
                }
                _ => *complete = false,
            }
        }
        None
    }

    /// Whether `class` has `ancestor` among its superclasses. `None` when
    /// the chain cannot be followed far enough to tell.
    pub(crate) fn is_subclass_of(&self, class: &ClassNode, ancestor: &str) -> Option<bool> {
        if class.name == ancestor {
            return Some(true);
        }
        let superclasses = self.superclasses(class);
        if superclasses.classes.iter().any(|parent| parent.name == ancestor) {
            return Some(true);
        }
        if superclasses.complete {
            Some(ancestor == JAVA_LANG_OBJECT)
        } else {
            None
        }
    }

    fn has_object(&self, superclasses: &[Arc<ClassNode>]) -> bool {
        superclasses
            .last()
            .map(|root| root.name == JAVA_LANG_OBJECT)
            .unwrap_or(false)
    }
}

pub(crate) struct Ancestors {
    pub(crate) classes: Vec<Arc<ClassNode>>,
    pub(crate) complete: bool,
}

fn found(holder: &Arc<ClassNode>, flags: AccessFlags) -> MemberLookup {
    MemberLookup::Found {
        holder: Arc::clone(holder),
        flags,
    }
}

pub(crate) fn is_object_method(signature: &MemberSignature) -> bool {
    OBJECT_METHODS
        .iter()
        .any(|(name, descriptor)| signature.name == *name && signature.descriptor == *descriptor)
}

/// `MethodHandle.invoke*` and the `VarHandle` accessors accept any
/// descriptor at their call sites.
fn is_signature_polymorphic(class: &ClassNode, signature: &MemberSignature) -> bool {
    if class.name != METHOD_HANDLE && class.name != VAR_HANDLE {
        return false;
    }
    class.methods.iter().any(|(declared, flags)| {
        declared.name == signature.name
            && flags.contains(AccessFlags::NATIVE | AccessFlags::VARARGS)
            && declared.descriptor.starts_with("([Ljava/lang/Object;)")
    })
}
