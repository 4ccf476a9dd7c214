use std::collections::HashMap;

use crate::allocation::YearAllocation;
use crate::config::RegimeConfig;
use crate::error::SimError;
use crate::fleet::{Fleet, VesselRegistry};
use crate::types::{Season, VesselId};

/// Empirical scaling of the fleet bycatch-rate spread. The standardization
/// deliberately uses this smoothed figure instead of the sample standard
/// deviation, which whipsaws on thin seasons.
const STDEV_SCALE: f64 = 0.6855;

/// One vessel's persistent record: past allocation weights and penalty
/// values per season, plus the compounding incentive multiplier. Created
/// with neutral seeds on first sighting, never deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRecord {
    pub weights: [Vec<f64>; 2],
    pub penalties: [Vec<f64>; 2],
    pub cim: [f64; 2],
}

impl FactorRecord {
    fn neutral() -> Self {
        FactorRecord {
            weights: [vec![1.0], vec![1.0]],
            penalties: [vec![1.0], vec![1.0]],
            cim: [1.0, 1.0],
        }
    }
}

/// Process-wide credit-factor store. Lives for the whole run; each year's
/// allocation reads the latest entries and each year's feedback pass
/// appends new ones.
#[derive(Debug, Default)]
pub struct FactorHistory {
    records: HashMap<VesselId, FactorRecord>,
}

impl FactorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: VesselId) -> Option<&FactorRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seed newly sighted vessels and load each vessel's credit factor and
    /// incentive multiplier for the coming year:
    /// factor = alpha + beta·lastWeight + gamma·lastPenalty.
    pub fn load_into(&mut self, fleet: &mut Fleet, config: &RegimeConfig) {
        for vessel in &mut fleet.vessels {
            let record = self.records.entry(vessel.id).or_insert_with(FactorRecord::neutral);
            for season in Season::BOTH {
                let i = season.index();
                let last_weight = *record.weights[i].last().expect("seeded non-empty");
                let last_penalty = *record.penalties[i].last().expect("seeded non-empty");
                let side = vessel.season_mut(season);
                side.credit_factor =
                    config.alpha + config.beta * last_weight + config.gamma * last_penalty;
                side.cim = record.cim[i];
            }
        }
    }

    /// Post-season feedback: standardize each vessel's realized bycatch
    /// rate against the fleet, map it through the penalty curve and fold
    /// the result into the vessel's persistent record.
    ///
    /// Vessels with an undefined realized rate (no credited pollock) are
    /// excluded from the statistics and receive no new entry this season.
    pub fn update(
        &mut self,
        fleet: &mut Fleet,
        alloc: &YearAllocation,
        config: &RegimeConfig,
        registry: &VesselRegistry,
    ) -> Result<(), SimError> {
        for season in Season::BOTH {
            self.update_season(fleet, alloc, config, registry, season)?;
        }
        Ok(())
    }

    fn update_season(
        &mut self,
        fleet: &mut Fleet,
        alloc: &YearAllocation,
        config: &RegimeConfig,
        registry: &VesselRegistry,
        season: Season,
    ) -> Result<(), SimError> {
        let i = season.index();

        // Skip seasons the fleet did not fish at all.
        if alloc.season_pollock[i] <= 0.0 {
            return Ok(());
        }

        let mut rate_sum = 0.0;
        let mut count = 0usize;
        let mut actual_pollock = 0.0;
        let mut actual_bycatch = 0.0;
        for vessel in fleet.vessels.iter() {
            let side = vessel.season(season);
            if side.pollock > 0.0
                && let Some(rate) = side.actual_rate
            {
                rate_sum += rate;
                count += 1;
            }
            actual_pollock += side.actual_pollock;
            actual_bycatch += side.actual_bycatch;
        }

        if count == 0 {
            return Err(SimError::UndefinedSeasonStats { year: fleet.year, season });
        }

        let mean = (rate_sum / count as f64).min(alloc.rate_cap[i]);
        let stdev = STDEV_SCALE * actual_bycatch / actual_pollock;

        for vessel in fleet.vessels.iter_mut() {
            let side = vessel.season(season);
            if side.pollock <= 0.0 {
                continue;
            }
            let Some(rate) = side.actual_rate else {
                continue;
            };

            // Spread widens for a small fleet and narrows for vessels that
            // carry a large share of the season's pollock.
            let adj_stdev = stdev * (1.0 + 1.0 / count as f64).sqrt()
                / (1.0 + side.pollock / alloc.season_pollock[i]).sqrt();
            let z = if adj_stdev > 0.0 { (mean - rate) / adj_stdev } else { 0.0 };
            let p = config.penalty.weight(z);
            let q = config.epsilon * p + config.delta;

            let record = self.records.get_mut(&vessel.id).ok_or_else(|| {
                let key = registry.key(vessel.id);
                SimError::MissingHistory { name: key.name.clone(), coop: key.coop.clone() }
            })?;
            record.weights[i].push(side.credit_factor);
            record.penalties[i].push(q);
            record.cim[i] *= 1.0 - config.psi / (1.0 + q);

            let side = vessel.season_mut(season);
            side.z = Some(z);
            side.q = Some(q);
        }
        Ok(())
    }
}
