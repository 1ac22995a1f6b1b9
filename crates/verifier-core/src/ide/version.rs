use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for IDE build number parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed IDE version '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

/// Position of a build among the releases of the same `branch.build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum AttemptKey {
    Base,
    Numbered(u32),
    Snapshot,
}

/// An IDE build number such as `IU-143.1532.7`, `143.1532.SNAPSHOT` or the
/// legacy bare baseline `7341`.
///
/// Ordering and equality consider only branch, build and attempt. The
/// product code is metadata, and a baseline `7341` compares equal to
/// `0.7341` while still rendering in its own form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdeVersion {
    product_code: Option<String>,
    branch: u32,
    build: u32,
    attempt: Option<u32>,
    is_snapshot: bool,
    is_baseline: bool,
}

impl IdeVersion {
    /// Parses `[CODE-]branch.build[.SNAPSHOT|.attempt]` or a bare baseline
    /// integer.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let malformed = |reason: &str| VersionError::Malformed {
            input: text.to_string(),
            reason: reason.to_string(),
        };

        let (product_code, numbers) = match text.split_once('-') {
            Some((code, rest)) => {
                if code.is_empty() {
                    return Err(malformed("empty product code"));
                }
                if !code
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
                {
                    return Err(malformed("product code must be uppercase letters or digits"));
                }
                (Some(code.to_string()), rest)
            }
            None => (None, text),
        };

        let parse_number = |segment: &str, what: &str| -> Result<u32, VersionError> {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(&format!("{} is not a number", what)));
            }
            segment
                .parse::<u32>()
                .map_err(|_| malformed(&format!("{} is out of range", what)))
        };

        let segments: Vec<&str> = numbers.split('.').collect();
        let mut version = Self {
            product_code,
            branch: 0,
            build: 0,
            attempt: None,
            is_snapshot: false,
            is_baseline: false,
        };

        match segments.as_slice() {
            [baseline] => {
                version.build = parse_number(baseline, "baseline")?;
                version.is_baseline = true;
            }
            [branch, build, rest @ ..] => {
                version.branch = parse_number(branch, "branch")?;
                version.build = parse_number(build, "build")?;
                match rest {
                    [] => {}
                    ["SNAPSHOT"] => version.is_snapshot = true,
                    [attempt] => version.attempt = Some(parse_number(attempt, "attempt")?),
                    _ => return Err(malformed("too many segments")),
                }
            }
            [] => return Err(malformed("empty version")),
        }

        Ok(version)
    }

    /// Renders the version in the textual form it was parsed from.
    pub fn full_presentation(&self) -> String {
        let mut text = String::new();
        if let Some(code) = &self.product_code {
            text.push_str(code);
            text.push('-');
        }
        if self.is_baseline {
            text.push_str(&self.build.to_string());
        } else {
            text.push_str(&format!("{}.{}", self.branch, self.build));
        }
        if self.is_snapshot {
            text.push_str(".SNAPSHOT");
        } else if let Some(attempt) = self.attempt {
            text.push_str(&format!(".{}", attempt));
        }
        text
    }

    /// Builds a version directly from its components. A snapshot carries no
    /// attempt number.
    pub fn new(branch: u32, build: u32, attempt: Option<u32>, is_snapshot: bool) -> Self {
        Self {
            product_code: None,
            branch,
            build,
            attempt: if is_snapshot { None } else { attempt },
            is_snapshot,
            is_baseline: false,
        }
    }

    pub fn with_product_code(mut self, code: &str) -> Self {
        self.product_code = Some(code.to_string());
        self
    }

    pub fn product_code(&self) -> Option<&str> {
        self.product_code.as_deref()
    }

    pub fn branch(&self) -> u32 {
        self.branch
    }

    pub fn build(&self) -> u32 {
        self.build
    }

    pub fn attempt(&self) -> Option<u32> {
        self.attempt
    }

    pub fn is_snapshot(&self) -> bool {
        self.is_snapshot
    }

    pub fn is_baseline(&self) -> bool {
        self.is_baseline
    }

    fn key(&self) -> (u32, u32, AttemptKey) {
        let attempt = if self.is_snapshot {
            AttemptKey::Snapshot
        } else {
            match self.attempt {
                Some(attempt) => AttemptKey::Numbered(attempt),
                None => AttemptKey::Base,
            }
        };
        (self.branch, self.build, attempt)
    }
}

impl PartialEq for IdeVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for IdeVersion {}

impl PartialOrd for IdeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for IdeVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl FromStr for IdeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdeVersion::parse(s)
    }
}

impl TryFrom<String> for IdeVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        IdeVersion::parse(&value)
    }
}

impl From<IdeVersion> for String {
    fn from(version: IdeVersion) -> Self {
        version.full_presentation()
    }
}

impl fmt::Display for IdeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_presentation())
    }
}

/// Builds a plugin declares itself compatible with: `since` inclusive and,
/// when present, `until` inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRange {
    pub since: IdeVersion,
    pub until: Option<IdeVersion>,
}

impl BuildRange {
    pub fn new(since: IdeVersion, until: Option<IdeVersion>) -> Self {
        Self { since, until }
    }

    /// Checks whether `target` falls within the range. A range whose
    /// `until` precedes its `since` includes nothing.
    pub fn includes(&self, target: &IdeVersion) -> bool {
        if self.since > *target {
            return false;
        }
        match &self.until {
            Some(until) => target <= until,
            None => true,
        }
    }
}

impl fmt::Display for BuildRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.until {
            Some(until) => write!(f, "[{}, {}]", self.since, until),
            None => write!(f, "[{}, *)", self.since),
        }
    }
}
