#![cfg(test)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::classes::memory::InMemoryResolver;
use crate::classes::node::AccessFlags;
use crate::classes::resolver::{ReadMode, Resolver};
use crate::config::VerifierConfig;
use crate::ide::plugin::IdePlugin;
use crate::ide::registry::Ide;
use crate::ide::version::IdeVersion;
use crate::tests::class_builder::ClassBuilder;

pub fn v(text: &str) -> IdeVersion {
    IdeVersion::parse(text).unwrap()
}

/// Path of a class file inside a directory or archive
pub fn entry_name(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}

/// Writes an archive holding the given entries
pub fn write_jar(path: &Path, entries: &[(String, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

/// Writes class files under `root`, laid out by package
pub fn write_classes(root: &Path, classes: &[(&str, Vec<u8>)]) {
    for (name, bytes) in classes {
        let path = root.join(entry_name(name));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }
}

/// In-memory classpath built from assembled class files
pub fn classpath(mode: ReadMode, classes: Vec<Vec<u8>>) -> Arc<dyn Resolver> {
    let mut resolver = InMemoryResolver::new(mode);
    for bytes in classes {
        let name = crate::classes::classfile::parse_class(&bytes, ReadMode::Signatures)
            .unwrap()
            .name;
        resolver = resolver.with_class_bytes(&name, bytes);
    }
    Arc::new(resolver)
}

/// `java.lang.Object` with its public API
pub fn object_class() -> Vec<u8> {
    let mut builder = ClassBuilder::new("java.lang.Object").no_super();
    for (name, descriptor) in [
        ("<init>", "()V"),
        ("equals", "(Ljava/lang/Object;)Z"),
        ("hashCode", "()I"),
        ("toString", "()Ljava/lang/String;"),
        ("getClass", "()Ljava/lang/Class;"),
    ] {
        builder = builder.method(AccessFlags::PUBLIC, name, descriptor);
    }
    builder
        .method(AccessFlags::PROTECTED, "clone", "()Ljava/lang/Object;")
        .build()
}

pub fn string_class() -> Vec<u8> {
    ClassBuilder::new("java.lang.String")
        .access(AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER)
        .method(AccessFlags::PUBLIC, "length", "()I")
        .build()
}

/// IDE whose platform holds `classes` plus `java.lang.Object` and `java.lang.String`
pub fn ide_with(version: &str, mut classes: Vec<Vec<u8>>) -> Ide {
    classes.push(object_class());
    classes.push(string_class());
    Ide::new(v(version), classpath(ReadMode::Signatures, classes), Vec::new())
}

/// Plugin with the given classes, eligible from build 1.0 on
pub fn plugin_with(id: &str, classes: Vec<Vec<u8>>) -> Arc<IdePlugin> {
    Arc::new(
        IdePlugin::builder(id, v("1.0"))
            .classpath(classpath(ReadMode::Full, classes))
            .build(),
    )
}

/// Configuration with deterministic parallelism for tests
pub fn test_config() -> VerifierConfig {
    VerifierConfig::default().with_parallelism(2)
}
