//! Picks which retained version a rollback redeploys.
//!
//! Without an explicit version the policy is fixed: skip the newest and take
//! the next older one. There is no memory of which versions were healthy.

use tracing::{info, warn};

use fleet_core::{TagSet, TargetTag};

use crate::backend::StoreError;
use crate::error::{RolloutError, RolloutResult};

/// Pick the rollback target.
///
/// `exists` is consulted only for an explicit version; a missing artifact is
/// terminal ([`RolloutError::ImageNotFound`]) with no fallback.
pub fn select<F>(
    explicit: Option<&str>,
    image: &str,
    tags: &TagSet,
    exists: F,
) -> RolloutResult<TargetTag>
where
    F: FnOnce(&str) -> Result<bool, StoreError>,
{
    if let Some(tag) = explicit {
        if !exists(tag)? {
            warn!(%image, %tag, "rollback target not found");
            return Err(RolloutError::ImageNotFound {
                image: image.to_string(),
                requested: tag.to_string(),
                available: tags.clone(),
            });
        }
        info!(%tag, "rolling back to explicit version");
        return Ok(TargetTag::parse_lenient(tag));
    }

    match (tags.latest(), tags.previous()) {
        (Some(current), Some(previous)) => {
            info!(%current, %previous, "rolling back to previous version");
            Ok(TargetTag::Version(previous))
        }
        _ => Err(RolloutError::InsufficientHistory {
            available: tags.clone(),
        }),
    }
}
