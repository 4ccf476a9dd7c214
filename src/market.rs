use crate::config::TradingPolicy;
use crate::fleet::{CatchEvent, Fleet};
use crate::types::{Day, Season, VesselId};

/// Season-scoped shared credit pool. `available` can be re-credited to any
/// needy vessel, `held` is withheld under the active stranding/tax policy,
/// `transferred` accumulates gross vessel-to-vessel movement for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditPool {
    pub available: f64,
    pub held: f64,
    pub transferred: f64,
}

impl CreditPool {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One vessel's unmet demand for a single market day. Rebuilt from scratch
/// every day; never outlives the day's clearing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedyEntry {
    pub vessel: VesselId,
    pub shortfall: f64,
    pub bycatch_rate: f64,
}

/// Clear the transfer market for one day.
///
/// `day_events` must start at the first event of `day`; scanning stops at
/// the first later-day event, so the full same-day batch has to be present.
/// Ranking is ascending by bycatch rate to date: liquidity goes to the
/// cleanest vessels first. Runs at most once per distinct day (the caller
/// enforces that), and not at all under `NoTrading`.
pub fn clear_day(
    fleet: &mut Fleet,
    day_events: &[CatchEvent],
    day: Day,
    season: Season,
    pool: &mut CreditPool,
    trading: &TradingPolicy,
) {
    if pool.available <= 0.0 || !trading.market_active() {
        return;
    }

    let needy = collect_needy(fleet, day_events, day, season);

    for entry in needy {
        if pool.available <= 0.0 {
            break;
        }
        let gross = entry.shortfall.min(pool.available);
        let (delivered, levy) = trading.transfer_levy(gross);
        fleet.vessel_mut(entry.vessel).credits += delivered;
        pool.available -= gross;
        pool.transferred += gross;
        pool.held += levy;
    }
}

/// Scan the day's events for vessels whose requirement exceeds their
/// balance, sorted cleanest-first. Sorting is stable, so same-rate vessels
/// keep event order.
fn collect_needy(
    fleet: &Fleet,
    day_events: &[CatchEvent],
    day: Day,
    season: Season,
) -> Vec<NeedyEntry> {
    let mut needy = Vec::new();
    for event in day_events {
        if event.day != day {
            break;
        }
        let vessel = fleet.vessel(event.vessel);
        let side = vessel.season(season);
        let needed = (side.cim * event.chinook).round();
        if needed > vessel.credits {
            let shortfall = needed - vessel.credits.max(0.0);
            let bycatch_rate = if side.actual_pollock > 0.0 {
                side.actual_bycatch / side.actual_pollock
            } else {
                0.0
            };
            needy.push(NeedyEntry { vessel: event.vessel, shortfall, bycatch_rate });
        }
    }
    needy.sort_by(|a, b| {
        a.bycatch_rate
            .partial_cmp(&b.bycatch_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    needy
}
