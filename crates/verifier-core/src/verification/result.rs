use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::ide::dependency::MissingDependency;
use crate::ide::version::IdeVersion;
use crate::verification::problem::Problem;

/// Why a plugin was not verified against an IDE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibleReason {
    /// The IDE build lies outside the plugin's declared build range
    VersionRange {
        since: IdeVersion,
        until: Option<IdeVersion>,
        target: IdeVersion,
    },
    /// The verification run did not complete
    Aborted { message: String },
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::VersionRange {
                since,
                until: Some(until),
                target,
            } => write!(
                f,
                "IDE {} is outside the supported range [{}, {}]",
                target, since, until
            ),
            IneligibleReason::VersionRange {
                since,
                until: None,
                target,
            } => write!(f, "IDE {} is older than since-build {}", target, since),
            IneligibleReason::Aborted { message } => {
                write!(f, "verification aborted: {}", message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Compatible,
    Incompatible,
    NotApplicable(IneligibleReason),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Compatible => write!(f, "Compatible"),
            Verdict::Incompatible => write!(f, "Incompatible"),
            Verdict::NotApplicable(reason) => write!(f, "Not applicable: {}", reason),
        }
    }
}

/// Outcome of verifying one plugin against one IDE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub plugin_id: String,
    pub target_version: IdeVersion,
    pub problems: BTreeSet<Problem>,
    pub verdict: Verdict,
    /// Dependency declarations the IDE could not satisfy
    pub missing_dependencies: Vec<MissingDependency>,
}

impl VerificationResult {
    /// A completed walk; the verdict follows from `problems`.
    pub fn completed(
        plugin_id: &str,
        target_version: IdeVersion,
        problems: BTreeSet<Problem>,
        missing_dependencies: Vec<MissingDependency>,
    ) -> Self {
        let verdict = if problems.is_empty() {
            Verdict::Compatible
        } else {
            Verdict::Incompatible
        };
        Self {
            plugin_id: plugin_id.to_string(),
            target_version,
            problems,
            verdict,
            missing_dependencies,
        }
    }

    pub fn not_applicable(plugin_id: &str, target_version: IdeVersion, reason: IneligibleReason) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            target_version,
            problems: BTreeSet::new(),
            verdict: Verdict::NotApplicable(reason),
            missing_dependencies: Vec::new(),
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.verdict == Verdict::Compatible
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self.verdict, Verdict::NotApplicable(_))
    }
}
