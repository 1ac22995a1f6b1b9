#![cfg(test)]

use std::collections::BTreeSet;

use serde_json::json;

use crate::classes::node::{AccessLevel, MemberSignature, TypeKind};
use crate::ide::dependency::MissingDependency;
use crate::ide::plugin::PluginDependency;
use crate::ide::version::IdeVersion;
use crate::verification::problem::Problem;
use crate::verification::result::{IneligibleReason, Verdict, VerificationResult};

fn v(text: &str) -> IdeVersion {
    IdeVersion::parse(text).unwrap()
}

fn method_not_found() -> Problem {
    Problem::MethodNotFound {
        owner: "com.intellij.Api".to_string(),
        signature: MemberSignature::new("call", "(I)V"),
    }
}

#[test]
fn test_problem_display() {
    assert_eq!(
        Problem::ClassNotFound {
            name: "com.example.Removed".to_string()
        }
        .to_string(),
        "Class com.example.Removed is not found"
    );
    assert_eq!(
        method_not_found().to_string(),
        "Method com.intellij.Api.call(I)V is not found"
    );
    assert_eq!(
        Problem::FieldNotFound {
            owner: "com.intellij.Api".to_string(),
            signature: MemberSignature::new("count", "I"),
        }
        .to_string(),
        "Field com.intellij.Api.count:I is not found"
    );
    assert_eq!(
        Problem::IllegalAccess {
            owner: "com.intellij.Impl".to_string(),
            member: Some(MemberSignature::new("secret", "()V")),
            accessor_class: "com.example.Caller".to_string(),
            access: AccessLevel::Private,
        }
        .to_string(),
        "Illegal access to private member com.intellij.Impl.secret()V from com.example.Caller"
    );
    assert_eq!(
        Problem::IllegalAccess {
            owner: "com.intellij.Hidden".to_string(),
            member: None,
            accessor_class: "com.example.Caller".to_string(),
            access: AccessLevel::PackagePrivate,
        }
        .to_string(),
        "Illegal access to package-private class com.intellij.Hidden from com.example.Caller"
    );
    assert_eq!(
        Problem::IncompatibleClassChange {
            name: "com.intellij.Service".to_string(),
            expected: TypeKind::Interface,
            actual: TypeKind::Class,
        }
        .to_string(),
        "Incompatible change of com.intellij.Service: expected interface but found class"
    );
}

#[test]
fn test_link_problem_display() {
    let count = MemberSignature::new("count", "I");
    assert_eq!(
        Problem::OverridingFinalMethod {
            owner: "com.example.Sub".to_string(),
            signature: MemberSignature::new("sealed", "()V"),
            final_in: "com.intellij.Api".to_string(),
        }
        .to_string(),
        "Method com.example.Sub.sealed()V overrides final method com.intellij.Api.sealed()V"
    );
    assert_eq!(
        Problem::InvokeStaticOnInstanceMethod {
            owner: "com.intellij.Api".to_string(),
            signature: MemberSignature::new("present", "()V"),
        }
        .to_string(),
        "Instance method com.intellij.Api.present()V is invoked as static"
    );
    assert_eq!(
        Problem::StaticAccessOfInstanceField {
            owner: "com.intellij.Api".to_string(),
            signature: count.clone(),
        }
        .to_string(),
        "Instance field com.intellij.Api.count:I is accessed as static"
    );
    assert_eq!(
        Problem::InstanceAccessOfStaticField {
            owner: "com.intellij.Api".to_string(),
            signature: count,
        }
        .kind(),
        "instance_access_of_static_field"
    );
    assert_eq!(
        Problem::InterfaceInstantiation {
            name: "com.intellij.Listener".to_string()
        }
        .to_string(),
        "Interface com.intellij.Listener is instantiated"
    );
    assert_eq!(
        serde_json::to_value(Problem::AbstractClassInstantiation {
            name: "com.intellij.Action".to_string()
        })
        .unwrap(),
        json!({ "kind": "abstract_class_instantiation", "name": "com.intellij.Action" })
    );
}

#[test]
fn test_equal_problems_collapse() {
    let mut problems = BTreeSet::new();
    for _ in 0..5 {
        problems.insert(method_not_found());
    }
    problems.insert(Problem::MethodNotFound {
        owner: "com.intellij.Api".to_string(),
        signature: MemberSignature::new("call", "(J)V"),
    });
    assert_eq!(problems.len(), 2);
}

#[test]
fn test_problem_kinds() {
    assert_eq!(method_not_found().kind(), "method_not_found");
    assert_eq!(
        Problem::InheritFromFinalClass {
            child: "a.B".to_string(),
            parent: "a.A".to_string()
        }
        .kind(),
        "inherit_from_final_class"
    );
}

#[test]
fn test_problem_serialization() {
    let value = serde_json::to_value(method_not_found()).unwrap();
    assert_eq!(
        value,
        json!({
            "kind": "method_not_found",
            "owner": "com.intellij.Api",
            "signature": { "name": "call", "descriptor": "(I)V" }
        })
    );

    let value = serde_json::to_value(Problem::IllegalAccess {
        owner: "a.Holder".to_string(),
        member: None,
        accessor_class: "b.Caller".to_string(),
        access: AccessLevel::PackagePrivate,
    })
    .unwrap();
    assert_eq!(value["access"], "package-private");
    assert_eq!(value["member"], serde_json::Value::Null);
}

#[test]
fn test_completed_result_verdict() {
    let compatible = VerificationResult::completed("plugin", v("143.1"), BTreeSet::new(), Vec::new());
    assert!(compatible.is_compatible());
    assert!(compatible.is_applicable());
    assert_eq!(compatible.verdict.to_string(), "Compatible");

    let problems = BTreeSet::from([method_not_found()]);
    let incompatible = VerificationResult::completed("plugin", v("143.1"), problems, Vec::new());
    assert!(!incompatible.is_compatible());
    assert!(incompatible.is_applicable());
    assert_eq!(incompatible.verdict, Verdict::Incompatible);
}

#[test]
fn test_missing_dependencies_do_not_decide_verdict() {
    let missing = vec![MissingDependency {
        plugin_id: "plugin".to_string(),
        dependency: PluginDependency::plugin("absent"),
        reason: "plugin absent is not found in IDE 143.1".to_string(),
    }];
    let result = VerificationResult::completed("plugin", v("143.1"), BTreeSet::new(), missing);
    assert!(result.is_compatible());
    assert_eq!(result.missing_dependencies.len(), 1);
}

#[test]
fn test_not_applicable_result() {
    let reason = IneligibleReason::VersionRange {
        since: v("100.0"),
        until: Some(v("100.99")),
        target: v("101.0"),
    };
    let result = VerificationResult::not_applicable("plugin", v("101.0"), reason);
    assert!(!result.is_applicable());
    assert!(!result.is_compatible());
    assert!(result.problems.is_empty());
    assert_eq!(
        result.verdict.to_string(),
        "Not applicable: IDE 101.0 is outside the supported range [100.0, 100.99]"
    );

    let open_ended = IneligibleReason::VersionRange {
        since: v("IU-200.1"),
        until: None,
        target: v("IU-143.1"),
    };
    assert_eq!(
        open_ended.to_string(),
        "IDE IU-143.1 is older than since-build IU-200.1"
    );
}

#[test]
fn test_result_serialization() {
    let result = VerificationResult::completed(
        "com.example.plugin",
        v("IU-143.1532"),
        BTreeSet::from([Problem::ClassNotFound {
            name: "com.example.Removed".to_string(),
        }]),
        Vec::new(),
    );
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["plugin_id"], "com.example.plugin");
    assert_eq!(value["target_version"], "IU-143.1532");
    assert_eq!(value["verdict"]["verdict"], "incompatible");
    assert_eq!(value["problems"][0]["kind"], "class_not_found");
}
