use crate::classes::node::{package_of, top_level_of, AccessFlags, AccessLevel, ClassNode};
use crate::verification::hierarchy::{ClassHierarchy, ClassLookup};

/// A class is visible when it is public or in the accessor's package.
pub(crate) fn can_access_class(accessor: &ClassNode, target: &ClassNode) -> bool {
    target.access.contains(AccessFlags::PUBLIC) || package_of(&accessor.name) == target.package_name()
}

/// Checks whether `accessor` may use a member with `flags` declared in
/// `holder`.
pub(crate) fn can_access_member(
    hierarchy: &ClassHierarchy<'_>,
    accessor: &ClassNode,
    holder: &ClassNode,
    flags: AccessFlags,
) -> bool {
    match flags.access_level() {
        AccessLevel::Public => true,
        // Nested classes of one top-level class share private members
        AccessLevel::Private => top_level_of(&accessor.name) == top_level_of(&holder.name),
        AccessLevel::PackagePrivate => package_of(&accessor.name) == holder.package_name(),
        AccessLevel::Protected => {
            package_of(&accessor.name) == holder.package_name()
                || is_subclass_or_unknown(hierarchy, accessor, &holder.name)
        }
    }
}

/// An accessor whose hierarchy cannot be followed is given the benefit of
/// the doubt. Nested classes may reach protected members through their
/// enclosing class.
fn is_subclass_or_unknown(hierarchy: &ClassHierarchy<'_>, accessor: &ClassNode, holder: &str) -> bool {
    match hierarchy.is_subclass_of(accessor, holder) {
        Some(true) | None => return true,
        Some(false) => {}
    }

    let top_level = top_level_of(&accessor.name);
    if top_level == accessor.name {
        return false;
    }
    match hierarchy.lookup(top_level) {
        ClassLookup::Found(outer) => {
            hierarchy.is_subclass_of(&outer, holder).unwrap_or(true)
        }
        _ => true,
    }
}
