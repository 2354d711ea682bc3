//! Light-pollution readings and their polarity convention

use serde::{Deserialize, Serialize};

use crate::{CampfinderError, Result};

/// Lowest level a reading can take
pub const MIN_LEVEL: u8 = 1;
/// Highest level a reading can take
pub const MAX_LEVEL: u8 = 9;
/// Level reported when the provider is unconfigured or failing
pub const FALLBACK_LEVEL: u8 = 5;

/// How raw readings map onto sky darkness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightPollutionPolarity {
    /// Bortle-like scale: 1 is a pristine dark sky, 9 is inner-city glow
    #[default]
    LowerIsDarker,
    /// 9 is the darkest sky, 1 the brightest
    HigherIsDarker,
}

impl LightPollutionPolarity {
    /// Darkness on the 1..=9 scale where 9 is always the darkest sky
    #[must_use]
    pub(crate) fn darkness(self, level: u8) -> u8 {
        let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        match self {
            Self::LowerIsDarker => (MIN_LEVEL + MAX_LEVEL).saturating_sub(level),
            Self::HigherIsDarker => level,
        }
    }
}

/// A bounded light-pollution level at a coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReading")]
pub struct LightPollutionReading {
    level: u8,
    /// True when the provider could not supply a real measurement
    is_fallback: bool,
}

#[derive(Deserialize)]
struct RawReading {
    level: u8,
    #[serde(default)]
    is_fallback: bool,
}

impl TryFrom<RawReading> for LightPollutionReading {
    type Error = CampfinderError;

    fn try_from(raw: RawReading) -> Result<Self> {
        let mut reading = Self::new(raw.level)?;
        reading.is_fallback = raw.is_fallback;
        Ok(reading)
    }
}

impl LightPollutionReading {
    /// Create a measured reading, rejecting levels outside 1..=9
    pub fn new(level: u8) -> Result<Self> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(CampfinderError::validation(format!(
                "light pollution level {level} is outside {MIN_LEVEL}..={MAX_LEVEL}"
            )));
        }
        Ok(Self {
            level,
            is_fallback: false,
        })
    }

    /// Neutral reading used when no measurement is available
    #[must_use]
    pub fn fallback(level: u8) -> Self {
        Self {
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            is_fallback: true,
        }
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    #[must_use]
    pub fn darkness(&self, polarity: LightPollutionPolarity) -> u8 {
        polarity.darkness(self.level)
    }
}

impl Default for LightPollutionReading {
    fn default() -> Self {
        Self::fallback(FALLBACK_LEVEL)
    }
}
