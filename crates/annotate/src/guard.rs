//! Pre-condition gate evaluated before any edit is attempted.

use std::sync::Arc;

use tracing::debug;

use crate::preferences::PreferenceRead;

/// Set to `false` when the picture's location does not match the nearby
/// place it was uploaded for.
pub const CORRECT_LOCATION_KEY: &str = "picture_has_correct_location";

/// Decides whether an edit may proceed at all.
pub trait EditGuardPolicy: Send + Sync {
    fn allow(&self) -> bool;
}

/// Refuses edits when the stored location check failed. Absent means allowed.
pub struct LocationGuard {
    preferences: Arc<dyn PreferenceRead>,
}

impl LocationGuard {
    #[must_use]
    pub fn new(preferences: Arc<dyn PreferenceRead>) -> Self {
        Self { preferences }
    }
}

impl EditGuardPolicy for LocationGuard {
    fn allow(&self) -> bool {
        let allowed = self.preferences.get_bool(CORRECT_LOCATION_KEY, true);
        if !allowed {
            debug!("Image location and nearby place location mismatched");
        }
        allowed
    }
}

/// Allows every edit.
#[derive(Debug, Default)]
pub struct AlwaysAllow;

impl EditGuardPolicy for AlwaysAllow {
    fn allow(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::JsonKvStore;

    fn guard(store: JsonKvStore) -> LocationGuard {
        LocationGuard::new(Arc::new(store))
    }

    #[test]
    fn test_absent_flag_allows() {
        assert!(guard(JsonKvStore::default()).allow());
    }

    #[test]
    fn test_mismatch_denies() {
        let store = JsonKvStore::default().with(CORRECT_LOCATION_KEY, false);
        assert!(!guard(store).allow());
    }

    #[test]
    fn test_match_allows() {
        let store = JsonKvStore::default().with(CORRECT_LOCATION_KEY, true);
        assert!(guard(store).allow());
    }
}
