#![cfg(test)]

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::classes::memory::InMemoryResolver;
use crate::classes::node::{AccessFlags, MemberSignature};
use crate::classes::resolver::{ReadMode, Resolver};
use crate::ide::plugin::{IdePlugin, PluginDependency};
use crate::ide::registry::Ide;
use crate::tests::class_builder::ClassBuilder;
use crate::tests::integration::common::{
    classpath, ide_with, object_class, plugin_with, string_class, test_config, v,
};
use crate::verification::engine::VerificationEngine;
use crate::verification::problem::Problem;
use crate::verification::result::{IneligibleReason, Verdict};

fn engine() -> VerificationEngine {
    VerificationEngine::new(test_config())
}

fn platform_api() -> Vec<u8> {
    ClassBuilder::new("com.intellij.Api")
        .method(AccessFlags::PUBLIC | AccessFlags::STATIC, "stable", "()V")
        .build()
}

#[test]
fn test_removed_class_is_reported_once() {
    let plugin = plugin_with(
        "com.example.plugin",
        vec![ClassBuilder::new("com.example.Main")
            .default_constructor()
            .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
                code.new_object("com.example.Removed")
                    .invoke_special("com.example.Removed", "<init>", "()V")
                    .invoke_virtual("com.example.Removed", "work", "()V")
                    .checkcast("com.example.Removed")
                    .return_void();
            })
            .build()],
    );
    let result = engine().verify(&plugin, &ide_with("IU-143.1532", vec![platform_api()]));

    assert_eq!(result.verdict, Verdict::Incompatible);
    assert_eq!(
        result.problems,
        BTreeSet::from([Problem::ClassNotFound {
            name: "com.example.Removed".to_string()
        }])
    );
}

#[test]
fn test_self_contained_plugin_is_compatible() {
    let plugin = plugin_with(
        "com.example.plugin",
        vec![
            ClassBuilder::new("com.example.Main")
                .default_constructor()
                .field(AccessFlags::PRIVATE, "counter", "I")
                .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
                    code.iconst_0().pop().return_void();
                })
                .build(),
            ClassBuilder::interface("com.example.Callback").build(),
        ],
    );
    let result = engine().verify(&plugin, &ide_with("IU-143.1532", Vec::new()));
    assert_eq!(result.verdict, Verdict::Compatible);
    assert!(result.problems.is_empty());
    assert_eq!(result.plugin_id, "com.example.plugin");
    assert_eq!(result.target_version.to_string(), "IU-143.1532");
}

#[test]
fn test_repeated_missing_method_is_one_problem() {
    let plugin = plugin_with(
        "com.example.plugin",
        vec![
            ClassBuilder::new("com.example.First")
                .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
                    for _ in 0..5 {
                        code.invoke_static("com.intellij.Api", "removed", "()V");
                    }
                    code.invoke_static("com.intellij.Api", "stable", "()V")
                        .return_void();
                })
                .build(),
            ClassBuilder::new("com.example.Second")
                .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
                    code.invoke_static("com.intellij.Api", "removed", "()V")
                        .return_void();
                })
                .build(),
        ],
    );
    let ide = ide_with("IU-143.1532", vec![platform_api()]);

    let first = engine().verify(&plugin, &ide);
    assert_eq!(
        first.problems,
        BTreeSet::from([Problem::MethodNotFound {
            owner: "com.intellij.Api".to_string(),
            signature: MemberSignature::new("removed", "()V"),
        }])
    );
    // Identical inputs give identical results
    assert_eq!(engine().verify(&plugin, &ide), first);
}

#[test]
fn test_eligibility_by_build_range() {
    let plugin = Arc::new(
        IdePlugin::builder("com.example.ranged", v("100.0"))
            .until_build(v("100.99"))
            .build(),
    );

    for applicable in ["100.0", "100.50", "IC-100.99", "100.0.1", "100.98.SNAPSHOT"] {
        let result = engine().verify(&plugin, &ide_with(applicable, Vec::new()));
        assert!(result.is_applicable(), "{} should be applicable", applicable);
    }
    for outside in ["99.9999", "101.0", "100.100"] {
        let result = engine().verify(&plugin, &ide_with(outside, Vec::new()));
        assert!(!result.is_applicable(), "{} should not be applicable", outside);
        assert_eq!(
            result.verdict,
            Verdict::NotApplicable(IneligibleReason::VersionRange {
                since: v("100.0"),
                until: Some(v("100.99")),
                target: v(outside),
            })
        );
    }
}

#[test]
fn test_plugin_copy_shadows_platform_class() {
    // The plugin repackages an older Api with an extra method. Its own copy
    // is resolved first.
    let bundled_api = ClassBuilder::new("com.intellij.Api")
        .method(AccessFlags::PUBLIC | AccessFlags::STATIC, "legacy", "()V")
        .build();
    let main = ClassBuilder::new("com.example.Main")
        .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
            code.invoke_static("com.intellij.Api", "legacy", "()V")
                .return_void();
        })
        .build();
    let ide = ide_with("IU-143.1532", vec![platform_api()]);

    let shadowing = plugin_with("com.example.shadowing", vec![bundled_api, main.clone()]);
    assert!(engine().verify(&shadowing, &ide).is_compatible());

    let plain = plugin_with("com.example.plain", vec![main]);
    assert_eq!(
        engine().verify(&plain, &ide).problems,
        BTreeSet::from([Problem::MethodNotFound {
            owner: "com.intellij.Api".to_string(),
            signature: MemberSignature::new("legacy", "()V"),
        }])
    );
}

#[test]
fn test_invalid_class_does_not_stop_the_walk() {
    let main = ClassBuilder::new("com.example.Main")
        .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
            code.invoke_static("com.intellij.Gone", "run", "()V")
                .return_void();
        })
        .build();
    let resolver = InMemoryResolver::new(ReadMode::Full)
        .with_class_bytes("com.example.Broken", vec![0xca, 0xfe, 0xba, 0xbe, 0x00])
        .with_class_bytes("com.example.Main", main);
    let plugin = Arc::new(
        IdePlugin::builder("com.example.plugin", v("1.0"))
            .classpath(Arc::new(resolver))
            .build(),
    );

    let result = engine().verify(&plugin, &ide_with("IU-143.1532", Vec::new()));
    assert_eq!(result.verdict, Verdict::Incompatible);
    assert_eq!(result.problems.len(), 2);
    assert!(result
        .problems
        .iter()
        .any(|problem| matches!(problem, Problem::InvalidClassFile { name, .. } if name == "com.example.Broken")));
    assert!(result.problems.contains(&Problem::ClassNotFound {
        name: "com.intellij.Gone".to_string()
    }));
}

fn dependency_plugin() -> Arc<IdePlugin> {
    Arc::new(
        IdePlugin::builder("com.example.dep", v("1.0"))
            .module("com.example.modules.dep")
            .classpath(classpath(
                ReadMode::Signatures,
                vec![ClassBuilder::new("com.example.dep.Helper")
                    .method(AccessFlags::PUBLIC | AccessFlags::STATIC, "help", "()V")
                    .build()],
            ))
            .build(),
    )
}

fn dependent_plugin(dependencies: Vec<PluginDependency>) -> Arc<IdePlugin> {
    let mut builder = IdePlugin::builder("com.example.dependent", v("1.0")).classpath(classpath(
        ReadMode::Full,
        vec![ClassBuilder::new("com.example.Main")
            .method_with_code(AccessFlags::PUBLIC, "run", "()V", |code| {
                code.invoke_static("com.example.dep.Helper", "help", "()V")
                    .return_void();
            })
            .build()],
    ));
    for dependency in dependencies {
        builder = builder.dependency(dependency);
    }
    Arc::new(builder.build())
}

fn platform() -> Arc<dyn Resolver> {
    classpath(ReadMode::Signatures, vec![object_class(), string_class()])
}

#[test]
fn test_dependency_classes_are_visible() {
    let ide = Ide::new(v("IU-143.1532"), platform(), vec![dependency_plugin()]);

    // Through a plugin id
    let plugin = dependent_plugin(vec![PluginDependency::plugin("com.example.dep")]);
    let result = engine().verify(&plugin, &ide);
    assert!(result.is_compatible(), "unexpected problems: {:?}", result.problems);
    assert!(result.missing_dependencies.is_empty());

    // Through a module and a platform module nobody declares
    let plugin = dependent_plugin(vec![
        PluginDependency::module("com.example.modules.dep"),
        PluginDependency::module("com.intellij.modules.platform"),
    ]);
    let result = engine().verify(&plugin, &ide);
    assert!(result.is_compatible());
    assert!(result.missing_dependencies.is_empty());
}

#[test]
fn test_custom_plugin_dependency() {
    // The dependency is not bundled but installed next to the plugin
    let ide = Ide::new(v("IU-143.1532"), platform(), Vec::new()).get_expanded_ide(dependency_plugin());
    let plugin = dependent_plugin(vec![PluginDependency::plugin("com.example.dep")]);
    assert!(engine().verify(&plugin, &ide).is_compatible());
}

#[test]
fn test_missing_dependencies_are_listed() {
    let ide = Ide::new(v("IU-143.1532"), platform(), Vec::new());
    let plugin = dependent_plugin(vec![
        PluginDependency::plugin("com.example.dep"),
        PluginDependency::plugin("com.example.extras").optional(),
    ]);

    let result = engine().verify(&plugin, &ide);
    let missing: Vec<(&str, bool)> = result
        .missing_dependencies
        .iter()
        .map(|missing| (missing.dependency.id.as_str(), missing.dependency.is_optional))
        .collect();
    assert_eq!(missing, vec![("com.example.dep", false), ("com.example.extras", true)]);
    assert!(result
        .missing_dependencies
        .iter()
        .all(|missing| missing.plugin_id == "com.example.dependent"));
    // The classes the missing dependency would provide are reported too
    assert!(result.problems.contains(&Problem::ClassNotFound {
        name: "com.example.dep.Helper".to_string()
    }));
}

#[test]
fn test_bundled_plugin_classes_precede_platform() {
    let platform_copy = ClassBuilder::new("com.example.dep.Helper").build();
    let platform = classpath(
        ReadMode::Signatures,
        vec![object_class(), string_class(), platform_copy],
    );
    let ide = Ide::new(v("IU-143.1532"), platform, vec![dependency_plugin()]);

    // No declared dependency: the IDE resolver still sees bundled plugins
    // ahead of the platform, so `help` is found in the bundled copy.
    let plugin = dependent_plugin(Vec::new());
    assert!(engine().verify(&plugin, &ide).is_compatible());
}
