use crate::config::RegimeConfig;
use crate::fleet::Fleet;
use crate::types::{Day, Season};

/// Per-year allocation results shared by the simulator, the stranding
/// controller and the feedback pass.
#[derive(Debug, Clone, PartialEq)]
pub struct YearAllocation {
    /// Fleet recorded pollock per season.
    pub season_pollock: [f64; 2],
    /// Fleet recorded incentive-weighted bycatch per season.
    pub season_bycatch: [f64; 2],
    /// Upper clamp on the fleet mean bycatch rate: budget / season pollock.
    pub rate_cap: [f64; 2],
    /// Nominal credit budget per season.
    pub budget: [f64; 2],
    /// First B-season day whose cumulative fleet pollock reaches two thirds
    /// of the B total; the dynamic stranding controller fires there.
    pub ssr_day: Option<Day>,
}

/// Compute season totals, cumulative series, credit shares and initial
/// credit allocations for every vessel in the fleet.
///
/// Credit factors and incentive multipliers must already be loaded onto the
/// vessels (the bycatch accumulation is cim-weighted).
pub fn allocate(fleet: &mut Fleet, config: &RegimeConfig) -> YearAllocation {
    let b_start = fleet.b_start;
    let num_days = fleet.num_days;

    let mut season_pollock = [0.0f64; 2];
    let mut season_bycatch = [0.0f64; 2];

    // Season totals and per-season cumulative series. The cumulative sums
    // restart at the B boundary so completion checks compare within-season.
    for vessel in &mut fleet.vessels {
        for season in Season::BOTH {
            let (lo, hi) = match season {
                Season::A => (0, b_start),
                Season::B => (b_start, num_days),
            };
            let cim = vessel.season(season).cim;
            let mut cum_p = 0.0;
            let mut cum_b = 0.0;
            for day in lo..hi {
                cum_p += vessel.pollock[day];
                cum_b += cim * vessel.bycatch[day] as f64;
                vessel.cum_pollock[day] = cum_p;
                vessel.cum_bycatch[day] = cum_b;
            }
            let side = vessel.season_mut(season);
            side.pollock = cum_p;
            side.bycatch = cum_b;
            side.rate = (cum_p > 0.0).then(|| cum_b / cum_p);
            season_pollock[season.index()] += cum_p;
            season_bycatch[season.index()] += cum_b;
        }
    }

    // SSR-set day: first B day where fleet cumulative pollock reaches 2/3
    // of the B-season total.
    let mut ssr_day = None;
    if season_pollock[Season::B.index()] > 0.0 {
        let threshold = 2.0 / 3.0 * season_pollock[Season::B.index()];
        for day in b_start..num_days {
            let fleet_cum: f64 = fleet.vessels.iter().map(|v| v.cum_pollock[day]).sum();
            if fleet_cum >= threshold {
                ssr_day = Some(Day(day));
                break;
            }
        }
    }

    // Credit shares, rescaled so the distributed total respects the hard
    // cap, then floor-truncated into whole credits. A and B never mix.
    let mut budget = [0.0f64; 2];
    let mut rate_cap = [0.0f64; 2];
    for season in Season::BOTH {
        let i = season.index();
        budget[i] = config.season_budget(season);
        let cap = config.season_budget_cap(season);

        if season_pollock[i] <= 0.0 {
            rate_cap[i] = 0.0;
            continue;
        }
        rate_cap[i] = budget[i] / season_pollock[i];

        let mut total_share = 0.0;
        for vessel in &mut fleet.vessels {
            let share =
                vessel.season(season).pollock / season_pollock[i] * vessel.season(season).credit_factor;
            vessel.season_mut(season).credit_share = share;
            total_share += share;
        }

        if total_share * budget[i] > cap {
            let scale = cap / (total_share * budget[i]);
            for vessel in &mut fleet.vessels {
                vessel.season_mut(season).credit_share *= scale;
            }
        }

        for vessel in &mut fleet.vessels {
            let side = vessel.season_mut(season);
            side.init_credits = (side.credit_share * budget[i]).floor() as i64;
        }
    }

    YearAllocation { season_pollock, season_bycatch, rate_cap, budget, ssr_day }
}
