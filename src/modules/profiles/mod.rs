//! Pacing profile catalog and initial profile selection.
//!
//! A profile bundles the delay/scroll envelope and the risk thresholds for
//! one posture, from cautious to aggressive. The catalog is fixed and
//! immutable; a session only swaps which entry is current.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Names of the catalog entries, ordered from most careful to most
/// aggressive. Promotion and demotion walk this order one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileName {
    Cautious,
    Normal,
    Aggressive,
}

impl ProfileName {
    pub const ALL: [ProfileName; 3] = [
        ProfileName::Cautious,
        ProfileName::Normal,
        ProfileName::Aggressive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileName::Cautious => "cautious",
            ProfileName::Normal => "normal",
            ProfileName::Aggressive => "aggressive",
        }
    }

    fn rank(self) -> usize {
        match self {
            ProfileName::Cautious => 0,
            ProfileName::Normal => 1,
            ProfileName::Aggressive => 2,
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a caller-supplied profile hint does not name a catalog entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pacing profile: {0}")]
pub struct UnknownProfile(pub String);

impl FromStr for ProfileName {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cautious" => Ok(ProfileName::Cautious),
            "normal" => Ok(ProfileName::Normal),
            "aggressive" => Ok(ProfileName::Aggressive),
            other => Err(UnknownProfile(other.to_string())),
        }
    }
}

/// Inclusive bounds used for uniform draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Span {
    pub min: u32,
    pub max: u32,
}

impl Span {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Immutable pacing posture.
///
/// `risk_ceiling` is the accumulated risk above which the profile is no
/// longer considered safe; `risk_floor` the level at or below which the
/// session may upgrade to the next more aggressive entry. Faster postures
/// tolerate less accumulated risk.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PacingProfile {
    pub name: ProfileName,
    pub delay_range_ms: Span,
    pub scroll_range_px: Span,
    pub risk_ceiling: i32,
    pub risk_floor: i32,
}

static CATALOG: [PacingProfile; 3] = [
    PacingProfile {
        name: ProfileName::Cautious,
        delay_range_ms: Span::new(2_500, 6_000),
        scroll_range_px: Span::new(400, 900),
        risk_ceiling: 9,
        risk_floor: 2,
    },
    PacingProfile {
        name: ProfileName::Normal,
        delay_range_ms: Span::new(1_200, 3_500),
        scroll_range_px: Span::new(600, 1_400),
        risk_ceiling: 7,
        risk_floor: 1,
    },
    PacingProfile {
        name: ProfileName::Aggressive,
        delay_range_ms: Span::new(600, 1_800),
        scroll_range_px: Span::new(900, 2_000),
        risk_ceiling: 5,
        risk_floor: 0,
    },
];

/// Full catalog, ordered cautious to aggressive.
pub fn catalog() -> &'static [PacingProfile] {
    &CATALOG
}

/// Catalog entry for a name.
pub fn profile(name: ProfileName) -> &'static PacingProfile {
    &CATALOG[name.rank()]
}

/// One step toward the careful end, if any remains.
pub fn demoted(name: ProfileName) -> Option<&'static PacingProfile> {
    name.rank().checked_sub(1).map(|rank| &CATALOG[rank])
}

/// One step toward the aggressive end, if any remains.
pub fn promoted(name: ProfileName) -> Option<&'static PacingProfile> {
    CATALOG.get(name.rank() + 1)
}

/// Choose the starting profile for a new session.
///
/// A known hint wins outright. Without a hint the draw is weighted
/// (70% normal, 20% cautious, 10% aggressive) so a fleet of concurrent
/// sessions does not share one fingerprint; identical pacing across many
/// sessions is itself a bot signal.
pub fn select_initial_profile<R: Rng + ?Sized>(
    hint: Option<ProfileName>,
    rng: &mut R,
) -> &'static PacingProfile {
    if let Some(name) = hint {
        return profile(name);
    }
    match rng.gen_range(0u8..100) {
        0..=69 => profile(ProfileName::Normal),
        70..=89 => profile(ProfileName::Cautious),
        _ => profile(ProfileName::Aggressive),
    }
}
