#![cfg(test)]

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use crate::classes::classpath::open_classpath;
use crate::classes::node::{AccessFlags, MemberSignature};
use crate::classes::resolver::ReadMode;
use crate::ide::plugin::IdePlugin;
use crate::ide::registry::Ide;
use crate::tests::class_builder::ClassBuilder;
use crate::tests::integration::common::{
    entry_name, object_class, string_class, test_config, v, write_classes, write_jar,
};
use crate::verification::engine::VerificationEngine;
use crate::verification::problem::Problem;

#[test]
fn test_verify_plugin_from_archives() {
    let dir = tempdir().unwrap();

    // IDE layout: lib/ with the platform jars
    let lib = dir.path().join("ide").join("lib");
    fs::create_dir_all(&lib).unwrap();
    write_jar(
        &lib.join("rt.jar"),
        &[
            (entry_name("java.lang.Object"), object_class()),
            (entry_name("java.lang.String"), string_class()),
        ],
    );
    write_jar(
        &lib.join("platform-api.jar"),
        &[(
            entry_name("com.intellij.openapi.Disposable"),
            ClassBuilder::interface("com.intellij.openapi.Disposable")
                .method(AccessFlags::PUBLIC | AccessFlags::ABSTRACT, "dispose", "()V")
                .build(),
        )],
    );

    // Plugin layout: lib/ with the plugin jar, plus loose classes
    let plugin_lib = dir.path().join("plugin").join("lib");
    fs::create_dir_all(&plugin_lib).unwrap();
    write_jar(
        &plugin_lib.join("plugin.jar"),
        &[
            ("META-INF/plugin.xml".to_string(), b"<idea-plugin/>".to_vec()),
            (
                entry_name("com.example.MyService"),
                ClassBuilder::new("com.example.MyService")
                    .implements("com.intellij.openapi.Disposable")
                    .default_constructor()
                    .method_with_code(AccessFlags::PUBLIC, "dispose", "()V", |code| {
                        code.invoke_static("com.intellij.openapi.Disposer", "dispose", "()V")
                            .return_void();
                    })
                    .build(),
            ),
        ],
    );
    let classes_dir = dir.path().join("plugin").join("classes");
    fs::create_dir_all(&classes_dir).unwrap();
    write_classes(
        &classes_dir,
        &[(
            "com.example.Leaky",
            ClassBuilder::new("com.example.Leaky")
                .implements("com.intellij.openapi.Disposable")
                .build(),
        )],
    );

    let platform = open_classpath(&[lib], ReadMode::Signatures).unwrap();
    let ide = Ide::new(v("IU-211.7142"), platform, Vec::new());
    let plugin = Arc::new(
        IdePlugin::builder("com.example.plugin", v("211.0"))
            .until_build(v("211.99999"))
            .classpath(open_classpath(&[plugin_lib, classes_dir], ReadMode::Full).unwrap())
            .build(),
    );

    let result = VerificationEngine::new(test_config()).verify(&plugin, &ide);
    assert_eq!(
        result.problems,
        BTreeSet::from([
            Problem::ClassNotFound {
                name: "com.intellij.openapi.Disposer".to_string()
            },
            Problem::AbstractMethodNotImplemented {
                owner: "com.example.Leaky".to_string(),
                signature: MemberSignature::new("dispose", "()V"),
                declared_in: "com.intellij.openapi.Disposable".to_string(),
            },
        ])
    );
}
