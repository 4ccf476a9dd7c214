use std::collections::HashMap;

use serde::Serialize;

use crate::calendar;
use crate::error::SimError;
use crate::landings::Landing;
use crate::types::{Day, Season, VesselId, Year};

/// Vessel identity: name plus cooperative. Two hulls with the same name in
/// different coops are distinct vessels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VesselKey {
    pub name: String,
    pub coop: String,
}

/// Process-wide registry assigning each identity a dense handle on first
/// sighting. Handles are stable for the life of the run, which is what lets
/// the factor history survive across years.
#[derive(Debug, Default)]
pub struct VesselRegistry {
    index: HashMap<VesselKey, VesselId>,
    keys: Vec<VesselKey>,
}

impl VesselRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str, coop: &str) -> VesselId {
        let key = VesselKey { name: name.to_string(), coop: coop.to_string() };
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = VesselId(self.keys.len());
        self.keys.push(key.clone());
        self.index.insert(key, id);
        id
    }

    pub fn key(&self, id: VesselId) -> &VesselKey {
        &self.keys[id.0]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One catch event as consumed by the season simulator: a landing resolved
/// to a day offset and a vessel handle. Chinook stays unrounded here;
/// rounding happens where credits are charged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchEvent {
    pub day: Day,
    pub vessel: VesselId,
    pub pollock: f64,
    pub chinook: f64,
}

/// Per-season slice of a vessel's year.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonSide {
    /// Recorded (unconstrained) season pollock total.
    pub pollock: f64,
    /// Incentive-weighted recorded season bycatch total.
    pub bycatch: f64,
    /// Recorded bycatch rate; `None` when no pollock was recorded.
    pub rate: Option<f64>,
    /// Incentive multiplier in effect for this season.
    pub cim: f64,
    pub credit_factor: f64,
    pub credit_share: f64,
    pub init_credits: i64,
    /// Pollock actually credited under the simulated credit constraint.
    pub actual_pollock: f64,
    /// Credits actually burned (equals credited bycatch).
    pub actual_bycatch: f64,
    pub actual_rate: Option<f64>,
    pub uncaught_pollock: f64,
    pub z: Option<f64>,
    pub q: Option<f64>,
    /// First day the balance ran out while the schedule was unfinished.
    pub out_day: Option<Day>,
    pub hit_limit: bool,
    pub done: bool,
}

impl Default for SeasonSide {
    fn default() -> Self {
        SeasonSide {
            pollock: 0.0,
            bycatch: 0.0,
            rate: None,
            cim: 1.0,
            credit_factor: 1.0,
            credit_share: 0.0,
            init_credits: 0,
            actual_pollock: 0.0,
            actual_bycatch: 0.0,
            actual_rate: None,
            uncaught_pollock: 0.0,
            z: None,
            q: None,
            out_day: None,
            hit_limit: false,
            done: false,
        }
    }
}

/// One vessel's state for one simulated year: daily series, running
/// cumulative sums (restarting at the season boundary), the mutable credit
/// balance, and both season sides.
#[derive(Debug, Clone, Serialize)]
pub struct VesselYear {
    pub id: VesselId,
    /// Daily recorded pollock, indexed by day offset.
    pub pollock: Vec<f64>,
    /// Daily recorded bycatch, rounded half-up per landing at ingestion.
    pub bycatch: Vec<i64>,
    /// Per-season cumulative pollock (resets at the B boundary).
    pub cum_pollock: Vec<f64>,
    /// Per-season cumulative incentive-weighted bycatch.
    pub cum_bycatch: Vec<f64>,
    pub credits: f64,
    pub seasons: [SeasonSide; 2],
}

impl VesselYear {
    fn new(id: VesselId, num_days: usize) -> Self {
        VesselYear {
            id,
            pollock: vec![0.0; num_days],
            bycatch: vec![0; num_days],
            cum_pollock: vec![0.0; num_days],
            cum_bycatch: vec![0.0; num_days],
            credits: 0.0,
            seasons: [SeasonSide::default(), SeasonSide::default()],
        }
    }

    pub fn season(&self, season: Season) -> &SeasonSide {
        &self.seasons[season.index()]
    }

    pub fn season_mut(&mut self, season: Season) -> &mut SeasonSide {
        &mut self.seasons[season.index()]
    }
}

/// All vessels active in one year, with the year's day geometry.
#[derive(Debug)]
pub struct Fleet {
    pub year: Year,
    /// 1-based day-of-year of the first landing (offset 0 anchors here).
    pub start_day: u32,
    pub num_days: usize,
    /// Day offset where the B season begins, clamped into [0, num_days].
    pub b_start: usize,
    pub vessels: Vec<VesselYear>,
    slots: HashMap<VesselId, usize>,
}

impl Fleet {
    pub fn vessel(&self, id: VesselId) -> &VesselYear {
        &self.vessels[self.slots[&id]]
    }

    pub fn vessel_mut(&mut self, id: VesselId) -> &mut VesselYear {
        let slot = self.slots[&id];
        &mut self.vessels[slot]
    }

    /// Season a given day offset falls in.
    pub fn season_of(&self, day: Day) -> Season {
        if day.0 < self.b_start { Season::A } else { Season::B }
    }
}

/// Group one year's landings into per-vessel daily series and the flat
/// event sequence the simulator replays.
///
/// The landings must already be filtered to `year` and in date order; an
/// out-of-order sequence indicates a broken upstream sort and aborts the
/// year rather than silently reordering fished days.
pub fn group_landings(
    year: Year,
    landings: &[Landing],
    registry: &mut VesselRegistry,
) -> Result<(Fleet, Vec<CatchEvent>), SimError> {
    if landings.is_empty() {
        return Err(SimError::EmptyYear(year));
    }

    let day_of = |l: &Landing| calendar::day_of_year(l.year, l.month, l.day);

    let start_day = day_of(&landings[0]);
    let end_day = day_of(landings.last().expect("non-empty"));
    if end_day < start_day {
        return Err(SimError::UnorderedLandings { year });
    }
    let num_days = (end_day - start_day + 1) as usize;

    let b_open = calendar::b_season_open_day(year.0) as i64;
    let b_start = (b_open - start_day as i64).clamp(0, num_days as i64) as usize;

    let mut fleet = Fleet {
        year,
        start_day,
        num_days,
        b_start,
        vessels: Vec::new(),
        slots: HashMap::new(),
    };

    let mut events = Vec::with_capacity(landings.len());
    let mut prev_day = 0usize;

    for landing in landings {
        let abs = day_of(landing);
        if abs < start_day || abs > end_day {
            return Err(SimError::UnorderedLandings { year });
        }
        let day = (abs - start_day) as usize;
        if day < prev_day {
            return Err(SimError::UnorderedLandings { year });
        }
        prev_day = day;

        let id = registry.intern(&landing.vessel, &landing.coop);
        let slot = *fleet.slots.entry(id).or_insert_with(|| {
            fleet.vessels.push(VesselYear::new(id, num_days));
            fleet.vessels.len() - 1
        });

        let vessel = &mut fleet.vessels[slot];
        vessel.pollock[day] += landing.pollock;
        vessel.bycatch[day] += landing.chinook.round() as i64;

        events.push(CatchEvent {
            day: Day(day),
            vessel: id,
            pollock: landing.pollock,
            chinook: landing.chinook,
        });
    }

    Ok((fleet, events))
}
