use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

/// Assembles a class file declaring only its name and superclass
fn class_file(name: &str, super_name: &str) -> Vec<u8> {
    fn utf8(bytes: &mut Vec<u8>, value: &str) {
        bytes.push(1);
        bytes.extend((value.len() as u16).to_be_bytes());
        bytes.extend(value.as_bytes());
    }
    fn class(bytes: &mut Vec<u8>, name_index: u16) {
        bytes.push(7);
        bytes.extend(name_index.to_be_bytes());
    }

    let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x34];
    bytes.extend(5u16.to_be_bytes());
    utf8(&mut bytes, name);
    class(&mut bytes, 1);
    utf8(&mut bytes, super_name);
    class(&mut bytes, 3);
    bytes.extend(0x0021u16.to_be_bytes());
    bytes.extend(2u16.to_be_bytes());
    bytes.extend(4u16.to_be_bytes());
    // interfaces, fields, methods, attributes
    bytes.extend([0u8; 8]);
    bytes
}

fn write_class(root: &Path, name: &str, super_name: &str) {
    let path = root.join(format!("{}.class", name));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, class_file(name, super_name)).unwrap();
}

fn check_command(ide: &Path, plugin: &Path) -> Command {
    let mut cmd = Command::cargo_bin("verifier").unwrap();
    cmd.arg("check")
        .arg("--ide-version")
        .arg("IU-143.1532")
        .arg("--ide-classpath")
        .arg(ide)
        .arg("--plugin")
        .arg(plugin)
        .arg("--plugin-id")
        .arg("com.example.plugin");
    cmd
}

#[test]
fn test_help_lists_check() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("verifier")?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"));
    Ok(())
}

#[test]
fn test_missing_arguments_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("verifier")?
        .arg("check")
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn test_compatible_plugin() -> Result<(), Box<dyn std::error::Error>> {
    let ide = tempdir()?;
    let plugin = tempdir()?;
    write_class(ide.path(), "com/intellij/Base", "java/lang/Object");
    write_class(plugin.path(), "com/example/Main", "com/intellij/Base");

    check_command(ide.path(), plugin.path())
        .arg("--since-build")
        .arg("143.0")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "com.example.plugin against IU-143.1532: Compatible",
        ));
    Ok(())
}

#[test]
fn test_incompatible_plugin() -> Result<(), Box<dyn std::error::Error>> {
    let ide = tempdir()?;
    let plugin = tempdir()?;
    write_class(plugin.path(), "com/example/Main", "com/intellij/Removed");

    check_command(ide.path(), plugin.path())
        .arg("--since-build")
        .arg("143.0")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Incompatible"))
        .stdout(predicate::str::contains("Class com.intellij.Removed is not found"));
    Ok(())
}

#[test]
fn test_plugin_outside_build_range() -> Result<(), Box<dyn std::error::Error>> {
    let ide = tempdir()?;
    let plugin = tempdir()?;
    write_class(plugin.path(), "com/example/Main", "com/intellij/Removed");

    check_command(ide.path(), plugin.path())
        .arg("--since-build")
        .arg("145.0")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not applicable"))
        .stdout(predicate::str::contains("Removed").not());
    Ok(())
}

#[test]
fn test_malformed_version_is_an_input_error() -> Result<(), Box<dyn std::error::Error>> {
    let ide = tempdir()?;
    let plugin = tempdir()?;

    check_command(ide.path(), plugin.path())
        .arg("--since-build")
        .arg("not-a-version")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not-a-version"));
    Ok(())
}

#[test]
fn test_config_file_external_prefixes() -> Result<(), Box<dyn std::error::Error>> {
    let ide = tempdir()?;
    let plugin = tempdir()?;
    write_class(plugin.path(), "com/example/Main", "com/intellij/Removed");
    let config = tempdir()?;
    let config_path = config.path().join("verifier.json");
    fs::write(&config_path, r#"{ "external_class_prefixes": ["com.intellij."] }"#)?;

    check_command(ide.path(), plugin.path())
        .arg("--since-build")
        .arg("143.0")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compatible"));
    Ok(())
}
