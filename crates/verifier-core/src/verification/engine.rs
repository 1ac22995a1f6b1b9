use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::classes::node::{
    descriptor_classes, element_class, AccessFlags, AccessLevel, ClassNode, InvokeKind,
    MemberSignature, Reference, TypeKind, JAVA_LANG_OBJECT,
};
use crate::classes::resolver::{ResolutionResult, Resolver};
use crate::classes::union::union;
use crate::config::VerifierConfig;
use crate::ide::dependency::DependencyGraph;
use crate::ide::plugin::IdePlugin;
use crate::ide::registry::Ide;
use crate::verification::access::{can_access_class, can_access_member};
use crate::verification::hierarchy::{is_object_method, ClassHierarchy, ClassLookup, MemberLookup};
use crate::verification::problem::Problem;
use crate::verification::result::{IneligibleReason, VerificationResult};

/// Verifies plugins against IDE builds.
///
/// The engine itself holds only options and the optional JDK classes;
/// every run builds its own resolver, so one engine can serve many runs
/// at once.
pub struct VerificationEngine {
    config: VerifierConfig,
    jdk: Option<Arc<dyn Resolver>>,
}

impl VerificationEngine {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config, jdk: None }
    }

    /// Resolve JDK classes from `jdk` after everything else
    pub fn with_jdk(mut self, jdk: Arc<dyn Resolver>) -> Self {
        self.jdk = Some(jdk);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verifies `plugin` against `ide`. Always completes with a result.
    pub fn verify(&self, plugin: &Arc<IdePlugin>, ide: &Ide) -> VerificationResult {
        let target = ide.version().clone();
        info!("Verifying {} against IDE {}", plugin.id(), target);

        if !plugin.is_compatible_with(&target) {
            let reason = IneligibleReason::VersionRange {
                since: plugin.since_build().clone(),
                until: plugin.until_build().cloned(),
                target: target.clone(),
            };
            info!("Skipping {}: {}", plugin.id(), reason);
            return VerificationResult::not_applicable(plugin.id(), target, reason);
        }

        let graph = DependencyGraph::build(plugin, ide);
        let resolver = self.run_resolver(plugin, &graph, ide);
        let hierarchy = ClassHierarchy::new(resolver.as_ref(), &self.config);
        let mut walk = Walk {
            hierarchy,
            config: &self.config,
            problems: BTreeSet::new(),
        };

        let classes = plugin.classpath().all_classes();
        debug!("Walking {} classes of {}", classes.len(), plugin.id());
        for class_name in &classes {
            match plugin.classpath().resolve_class(class_name) {
                ResolutionResult::Found(node) => walk.verify_class(&node),
                ResolutionResult::Invalid(reason) => {
                    warn!("Invalid class file {} in {}: {}", class_name, plugin.id(), reason);
                    walk.problems.insert(Problem::InvalidClassFile {
                        name: class_name.clone(),
                        reason,
                    });
                }
                ResolutionResult::FailedToRead(reason) => {
                    warn!("Failed to read {} in {}: {}", class_name, plugin.id(), reason);
                    walk.problems.insert(Problem::FailedToReadClass {
                        name: class_name.clone(),
                        reason,
                    });
                }
                ResolutionResult::NotFound => {}
            }
        }

        let result = VerificationResult::completed(plugin.id(), target, walk.problems, graph.missing);
        info!(
            "Verified {} against IDE {}: {} ({} problems)",
            result.plugin_id,
            result.target_version,
            result.verdict,
            result.problems.len()
        );
        result
    }

    /// Classloading order of a run: the plugin, its dependencies in graph
    /// order, the IDE, then the JDK.
    fn run_resolver(&self, plugin: &Arc<IdePlugin>, graph: &DependencyGraph, ide: &Ide) -> Arc<dyn Resolver> {
        let mut layers: Vec<Arc<dyn Resolver>> = vec![Arc::clone(plugin.classpath())];
        layers.extend(
            graph
                .dependencies()
                .iter()
                .map(|dependency| Arc::clone(dependency.classpath())),
        );
        layers.push(ide.get_resolver());
        if let Some(jdk) = &self.jdk {
            layers.push(Arc::clone(jdk));
        }
        union(layers)
    }
}

struct Walk<'a> {
    hierarchy: ClassHierarchy<'a>,
    config: &'a VerifierConfig,
    problems: BTreeSet<Problem>,
}

impl Walk<'_> {
    fn verify_class(&mut self, node: &Arc<ClassNode>) {
        self.check_supertypes(node);
        if !node.is_abstract() && !node.is_interface() {
            self.check_abstract_methods(node);
        }
        self.check_final_overrides(node);
        if self.config.check_signature_types {
            self.check_signature_types(node);
        }
        for body in &node.bodies {
            for reference in &body.references {
                if let Some(problem) = self.check_reference(node, reference) {
                    self.problems.insert(problem);
                }
            }
        }
    }

    fn check_supertypes(&mut self, node: &ClassNode) {
        if let Some(super_name) = &node.super_name {
            match self.hierarchy.lookup(super_name) {
                ClassLookup::Found(parent) => {
                    if parent.is_interface() {
                        self.problems.insert(Problem::IncompatibleClassChange {
                            name: parent.name.clone(),
                            expected: TypeKind::Class,
                            actual: TypeKind::Interface,
                        });
                    } else if parent.is_final() {
                        self.problems.insert(Problem::InheritFromFinalClass {
                            child: node.name.clone(),
                            parent: parent.name.clone(),
                        });
                    }
                    self.check_class_access(node, &parent);
                }
                ClassLookup::External => {}
                ClassLookup::Failed(problem) => {
                    self.problems.insert(problem);
                }
            }
        }

        for interface_name in &node.interfaces {
            match self.hierarchy.lookup(interface_name) {
                ClassLookup::Found(interface) => {
                    if !interface.is_interface() {
                        self.problems.insert(Problem::IncompatibleClassChange {
                            name: interface.name.clone(),
                            expected: TypeKind::Interface,
                            actual: TypeKind::Class,
                        });
                    }
                    self.check_class_access(node, &interface);
                }
                ClassLookup::External => {}
                ClassLookup::Failed(problem) => {
                    self.problems.insert(problem);
                }
            }
        }
    }

    fn check_class_access(&mut self, accessor: &ClassNode, target: &ClassNode) {
        if let Some(problem) = self.class_access_problem(accessor, target) {
            self.problems.insert(problem);
        }
    }

    fn class_access_problem(&self, accessor: &ClassNode, target: &ClassNode) -> Option<Problem> {
        if !self.config.check_access || can_access_class(accessor, target) {
            return None;
        }
        Some(Problem::IllegalAccess {
            owner: target.name.clone(),
            member: None,
            accessor_class: accessor.name.clone(),
            access: target.access.access_level(),
        })
    }

    /// Reports abstract methods a concrete class inherits without an
    /// implementation. Skipped when any supertype cannot be resolved, since
    /// the missing type might provide the implementation.
    fn check_abstract_methods(&mut self, node: &Arc<ClassNode>) {
        let superclasses = self.hierarchy.superclasses(node);
        if !superclasses.complete {
            return;
        }
        let interfaces = self.hierarchy.all_interfaces(node, &superclasses.classes);
        if !interfaces.complete {
            return;
        }

        // The class itself first, then its superclasses nearest first
        let mut chain: Vec<&Arc<ClassNode>> = vec![node];
        chain.extend(superclasses.classes.iter());
        let object_resolved = chain
            .last()
            .map(|root| root.name == JAVA_LANG_OBJECT)
            .unwrap_or(false);

        let is_concrete = |flags: AccessFlags| !flags.contains(AccessFlags::ABSTRACT) && !flags.contains(AccessFlags::STATIC);

        let mut required: BTreeMap<MemberSignature, String> = BTreeMap::new();

        // Abstract methods of an abstract superclass need an implementation
        // below the class declaring them.
        for (depth, class) in chain.iter().enumerate().skip(1) {
            for (signature, flags) in &class.methods {
                if !flags.contains(AccessFlags::ABSTRACT) || required.contains_key(signature) {
                    continue;
                }
                let implemented = chain[..depth]
                    .iter()
                    .any(|below| below.method(signature).map(is_concrete).unwrap_or(false));
                if !implemented {
                    required.insert(signature.clone(), class.name.clone());
                }
            }
        }

        for interface in &interfaces.classes {
            for (signature, flags) in &interface.methods {
                if !flags.contains(AccessFlags::ABSTRACT) || required.contains_key(signature) {
                    continue;
                }
                let in_class = chain
                    .iter()
                    .any(|class| class.method(signature).map(is_concrete).unwrap_or(false));
                let by_default = interfaces.classes.iter().any(|other| {
                    other
                        .method(signature)
                        .map(|flags| is_concrete(flags) && !flags.contains(AccessFlags::PRIVATE))
                        .unwrap_or(false)
                });
                let by_object = !object_resolved && is_object_method(signature);
                if !in_class && !by_default && !by_object {
                    required.insert(signature.clone(), interface.name.clone());
                }
            }
        }

        for (signature, declared_in) in required {
            self.problems.insert(Problem::AbstractMethodNotImplemented {
                owner: node.name.clone(),
                signature,
                declared_in,
            });
        }
    }

    /// Reports methods redefining a final method of a superclass. A
    /// package-private final method is only overridden from its own
    /// package.
    fn check_final_overrides(&mut self, node: &ClassNode) {
        let overriding = node.methods.iter().filter(|(signature, flags)| {
            !signature.name.starts_with('<')
                && !flags.intersects(AccessFlags::PRIVATE | AccessFlags::STATIC)
        });
        let superclasses = self.hierarchy.superclasses(node);
        for (signature, _) in overriding {
            let final_in = superclasses.classes.iter().find(|class| {
                class.method(signature).is_some_and(|flags| {
                    flags.contains(AccessFlags::FINAL)
                        && !flags.intersects(AccessFlags::PRIVATE | AccessFlags::STATIC)
                        && (flags.access_level() != AccessLevel::PackagePrivate
                            || class.package_name() == node.package_name())
                })
            });
            if let Some(class) = final_in {
                self.problems.insert(Problem::OverridingFinalMethod {
                    owner: node.name.clone(),
                    signature: signature.clone(),
                    final_in: class.name.clone(),
                });
            }
        }
    }

    fn check_signature_types(&mut self, node: &ClassNode) {
        let descriptors = node
            .fields
            .keys()
            .chain(node.methods.keys())
            .map(|signature| signature.descriptor.as_str());
        let mut referenced = BTreeSet::new();
        for descriptor in descriptors {
            referenced.extend(descriptor_classes(descriptor));
        }
        for class_name in referenced {
            if let ClassLookup::Failed(problem) = self.hierarchy.lookup(&class_name) {
                self.problems.insert(problem);
            }
        }
    }

    /// At most one problem per instruction.
    fn check_reference(&self, accessor: &ClassNode, reference: &Reference) -> Option<Problem> {
        match reference {
            Reference::Class { name } => self.check_class_reference(accessor, name),
            Reference::New { name } => self.check_instantiation(accessor, name),
            Reference::Field {
                owner,
                signature,
                is_static,
            } => {
                let owner_node = match self.resolve_owner(accessor, owner) {
                    Ok(node) => node,
                    Err(problem) => return problem,
                };
                match self.hierarchy.find_field(&owner_node, signature) {
                    MemberLookup::Found { holder, flags } => self
                        .member_access_problem(accessor, &holder, signature, flags)
                        .or_else(|| {
                            let declared_static = flags.contains(AccessFlags::STATIC);
                            match (*is_static, declared_static) {
                                (true, false) => Some(Problem::StaticAccessOfInstanceField {
                                    owner: holder.name.clone(),
                                    signature: signature.clone(),
                                }),
                                (false, true) => Some(Problem::InstanceAccessOfStaticField {
                                    owner: holder.name.clone(),
                                    signature: signature.clone(),
                                }),
                                _ => None,
                            }
                        }),
                    MemberLookup::NotFound => Some(Problem::FieldNotFound {
                        owner: owner.clone(),
                        signature: signature.clone(),
                    }),
                    MemberLookup::Assumed => None,
                }
            }
            Reference::Method {
                owner,
                signature,
                kind,
            } => {
                let owner_node = match self.resolve_owner(accessor, owner) {
                    Ok(node) => node,
                    Err(problem) => return problem,
                };
                match kind {
                    InvokeKind::Interface if !owner_node.is_interface() => {
                        return Some(Problem::IncompatibleClassChange {
                            name: owner.clone(),
                            expected: TypeKind::Interface,
                            actual: TypeKind::Class,
                        })
                    }
                    InvokeKind::Virtual if owner_node.is_interface() => {
                        return Some(Problem::IncompatibleClassChange {
                            name: owner.clone(),
                            expected: TypeKind::Class,
                            actual: TypeKind::Interface,
                        })
                    }
                    _ => {}
                }
                match self.hierarchy.find_method(&owner_node, signature) {
                    MemberLookup::Found { holder, flags } => self
                        .member_access_problem(accessor, &holder, signature, flags)
                        .or_else(|| {
                            let declared_static = flags.contains(AccessFlags::STATIC);
                            match (*kind == InvokeKind::Static, declared_static) {
                                (true, false) => Some(Problem::InvokeStaticOnInstanceMethod {
                                    owner: holder.name.clone(),
                                    signature: signature.clone(),
                                }),
                                (false, true) => Some(Problem::InvokeInstanceOnStaticMethod {
                                    owner: holder.name.clone(),
                                    signature: signature.clone(),
                                }),
                                _ => None,
                            }
                        }),
                    MemberLookup::NotFound => Some(Problem::MethodNotFound {
                        owner: owner.clone(),
                        signature: signature.clone(),
                    }),
                    MemberLookup::Assumed => None,
                }
            }
        }
    }

    fn check_class_reference(&self, accessor: &ClassNode, name: &str) -> Option<Problem> {
        let class_name = element_class(name)?;
        match self.hierarchy.lookup(class_name) {
            ClassLookup::Found(target) => self.class_access_problem(accessor, &target),
            ClassLookup::External => None,
            ClassLookup::Failed(problem) => Some(problem),
        }
    }

    /// `new` needs an accessible, concrete class.
    fn check_instantiation(&self, accessor: &ClassNode, name: &str) -> Option<Problem> {
        let target = match self.hierarchy.lookup(name) {
            ClassLookup::Found(target) => target,
            ClassLookup::External => return None,
            ClassLookup::Failed(problem) => return Some(problem),
        };
        if let Some(problem) = self.class_access_problem(accessor, &target) {
            return Some(problem);
        }
        if target.is_interface() {
            Some(Problem::InterfaceInstantiation {
                name: target.name.clone(),
            })
        } else if target.is_abstract() {
            Some(Problem::AbstractClassInstantiation {
                name: target.name.clone(),
            })
        } else {
            None
        }
    }

    /// Resolves the owner of a member reference. `Err` carries the outcome
    /// of the instruction when the owner is not a resolvable, accessible
    /// class: array owners only need their element class.
    fn resolve_owner(&self, accessor: &ClassNode, owner: &str) -> Result<Arc<ClassNode>, Option<Problem>> {
        if owner.starts_with('[') {
            return Err(self.check_class_reference(accessor, owner));
        }
        match self.hierarchy.lookup(owner) {
            ClassLookup::Found(node) => match self.class_access_problem(accessor, &node) {
                Some(problem) => Err(Some(problem)),
                None => Ok(node),
            },
            ClassLookup::External => Err(None),
            ClassLookup::Failed(problem) => Err(Some(problem)),
        }
    }

    fn member_access_problem(
        &self,
        accessor: &ClassNode,
        holder: &ClassNode,
        signature: &MemberSignature,
        flags: AccessFlags,
    ) -> Option<Problem> {
        if !self.config.check_access || can_access_member(&self.hierarchy, accessor, holder, flags) {
            return None;
        }
        Some(Problem::IllegalAccess {
            owner: holder.name.clone(),
            member: Some(signature.clone()),
            accessor_class: accessor.name.clone(),
            access: flags.access_level(),
        })
    }
}
