//! User preference flags

use std::fmt;

use serde::{Deserialize, Serialize};

/// Preference flags supplied with a recommendation request.
///
/// Missing keys default to `false`; unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub prefers_fishing: bool,
    pub prefers_hiking: bool,
    pub prefers_solitude: bool,
    pub require_availability: bool,
}

impl fmt::Display for UserPreferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prefers_fishing={}, prefers_hiking={}, prefers_solitude={}, require_availability={}",
            self.prefers_fishing, self.prefers_hiking, self.prefers_solitude, self.require_availability
        )
    }
}
