//! Version tags. Every artifact tag needs the `v<major>.<minor>.<patch>` shape
//! to take part in version resolution.
//!
//! Tags are parsed once at the boundary into [`Version`]; anything that does
//! not match the shape is dropped from a [`TagSet`] instead of failing
//! resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

/// A three-component release version, ordered major → minor → patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("tag {0:?} does not start with 'v'")]
    MissingPrefix(String),
    #[error("tag {0:?} must have exactly three dot-separated components")]
    ComponentCount(String),
    #[error("tag {tag:?} has an invalid component {component:?}")]
    InvalidComponent { tag: String, component: String },
    #[error("tag {0:?} has no room for a further patch release")]
    PatchExhausted(String),
}

impl Version {
    /// The version used when no artifact has ever been built.
    pub const BOOTSTRAP: Version = Version::new(1, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Same major/minor, patch + 1. `None` once the patch is at `u64::MAX`.
    pub fn next_patch(&self) -> Option<Self> {
        Some(Self {
            patch: self.patch.checked_add(1)?,
            ..*self
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('v')
            .ok_or_else(|| VersionError::MissingPrefix(s.to_string()))?;

        let parts: Vec<&str> = rest.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::ComponentCount(s.to_string()));
        }

        let component = |part: &str| -> Result<u64, VersionError> {
            let invalid = || VersionError::InvalidComponent {
                tag: s.to_string(),
                component: part.to_string(),
            };
            // Digits only, and no leading zeros, so Display reproduces the tag.
            if part.is_empty()
                || !part.bytes().all(|b| b.is_ascii_digit())
                || (part.len() > 1 && part.starts_with('0'))
            {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        };

        let version = Version {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(parts[2])?,
        };
        // A parsed version can always be followed by another patch release.
        if version.next_patch().is_none() {
            return Err(VersionError::PatchExhausted(s.to_string()));
        }
        Ok(version)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The well-formed versions retained by the artifact store, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    versions: Vec<Version>,
}

impl TagSet {
    /// Build a tag set from raw tag strings, skipping anything malformed
    /// (including the floating `latest` alias) and duplicates.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut versions = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            match tag.parse::<Version>() {
                Ok(v) => versions.push(v),
                Err(e) => debug!(%tag, error = %e, "ignoring non-version tag"),
            }
        }
        versions.sort_unstable_by(|a, b| b.cmp(a));
        versions.dedup();
        Self { versions }
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Newest retained version.
    pub fn latest(&self) -> Option<Version> {
        self.versions.first().copied()
    }

    /// The version one step older than the newest.
    pub fn previous(&self) -> Option<Version> {
        self.versions.get(1).copied()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.versions.binary_search_by(|v| version.cmp(v)).is_ok()
    }

    /// Versions in descending order.
    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    /// Comma-separated rendering for diagnostics.
    pub fn display_list(&self) -> String {
        if self.versions.is_empty() {
            return "(none)".to_string();
        }
        self.versions
            .iter()
            .map(Version::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The tag a deploy acts on.
///
/// Explicit tags are taken as given: a well-formed one becomes
/// [`TargetTag::Version`], anything else is carried through unchecked and
/// will simply fail to match an artifact later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetTag {
    Version(Version),
    Unchecked(String),
}

impl TargetTag {
    pub fn parse_lenient(tag: &str) -> Self {
        match tag.parse::<Version>() {
            Ok(v) => TargetTag::Version(v),
            Err(_) => TargetTag::Unchecked(tag.to_string()),
        }
    }

    pub fn as_version(&self) -> Option<Version> {
        match self {
            TargetTag::Version(v) => Some(*v),
            TargetTag::Unchecked(_) => None,
        }
    }
}

impl Serialize for TargetTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Version> for TargetTag {
    fn from(v: Version) -> Self {
        TargetTag::Version(v)
    }
}

impl fmt::Display for TargetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetTag::Version(v) => v.fmt(f),
            TargetTag::Unchecked(s) => f.write_str(s),
        }
    }
}
