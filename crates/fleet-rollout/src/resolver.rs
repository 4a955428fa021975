//! Picks the version a deploy acts on.

use tracing::{debug, warn};

use fleet_core::{TagSet, TargetTag, Version};

/// Resolve the deploy target.
///
/// An explicit tag wins and is passed through even when it is not a
/// well-formed version. Otherwise the newest retained version gets its patch
/// bumped, or [`Version::BOOTSTRAP`] is used when nothing has been built yet.
pub fn resolve(explicit: Option<&str>, tags: &TagSet) -> TargetTag {
    if let Some(tag) = explicit {
        let target = TargetTag::parse_lenient(tag);
        if target.as_version().is_none() {
            warn!(%tag, "explicit tag is not of the form vX.Y.Z, using it as-is");
        }
        return target;
    }

    // Every member of a TagSet has a successor, so `None` means no history.
    match tags.latest().and_then(|latest| latest.next_patch()) {
        Some(next) => {
            debug!(%next, "auto-incrementing patch version");
            TargetTag::Version(next)
        }
        None => {
            debug!("no versions retained, bootstrapping");
            TargetTag::Version(Version::BOOTSTRAP)
        }
    }
}
