//! Build-or-reuse decision.

use serde::Serialize;
use tracing::debug;

use fleet_core::TargetTag;

/// What to do about the artifact for a deploy target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildAction {
    /// Build and tag as `<version>` and `latest`.
    Build,
    /// Bind the existing artifact unchanged. Nothing is re-tagged.
    Reuse,
}

/// Reuse only when the caller named the version and it already exists.
///
/// That is the only true rollback path; an auto-resolved version, or an
/// explicit one with no artifact behind it, is always built.
pub fn decide(target: &TargetTag, explicit: bool, exists: bool) -> BuildAction {
    let action = if explicit && exists {
        BuildAction::Reuse
    } else {
        BuildAction::Build
    };
    debug!(%target, explicit, exists, ?action, "build-or-reuse decided");
    action
}
