use std::fmt;

use serde::Serialize;

/// Dense handle assigned by the vessel registry on first sighting.
/// Stable across years; the registry owns the name/coop identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VesselId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Year(pub i32);

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Day offset within one simulated year, relative to the year's first
/// recorded landing (offset 0). There is no cross-year day arithmetic;
/// every year re-anchors at its own first landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Day(pub usize);

/// The two fixed sub-periods of a fishing year, split at the season
/// boundary date. Each carries its own credit budget and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Season {
    A,
    B,
}

impl Season {
    pub const BOTH: [Season; 2] = [Season::A, Season::B];

    pub fn index(self) -> usize {
        match self {
            Season::A => 0,
            Season::B => 1,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::A => write!(f, "A"),
            Season::B => write!(f, "B"),
        }
    }
}
