use std::collections::BTreeSet;

use serde::Serialize;

use crate::allocation::{self, YearAllocation};
use crate::config::{RegimeConfig, TradingPolicy};
use crate::error::SimError;
use crate::feedback::FactorHistory;
use crate::fleet::{self, CatchEvent, Fleet, VesselRegistry};
use crate::landings::Landing;
use crate::market::{self, CreditPool};
use crate::stranding::StrandingController;
use crate::types::{Day, Season, Year};

/// A vessel is done for the season once its cumulative recorded pollock is
/// within this much of its season total (the daily sums are floats summed
/// from ticket weights).
const COMPLETION_TOLERANCE: f64 = 0.01;

/// One row of the cross-year summary log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub year: i32,
    pub target_level: f64,
    pub credits_distributed: f64,
    pub credits_used: f64,
    pub credits_transferred: f64,
    pub credits_held: f64,
    /// Unconstrained (recorded) incentive-weighted bycatch for the year.
    pub original_bycatch: f64,
}

/// Everything one simulated year leaves behind for reporting.
#[derive(Debug)]
pub struct YearOutcome {
    pub year: Year,
    pub fleet: Fleet,
    pub allocation: YearAllocation,
    pub pool: CreditPool,
    pub summary: AnnualSummary,
}

/// Multi-year driver. Years run strictly in ascending order because the
/// factor history each year writes is what the next year allocates from.
pub struct Simulation {
    pub config: RegimeConfig,
    pub registry: VesselRegistry,
    pub history: FactorHistory,
    pub years: Vec<YearOutcome>,
}

impl Simulation {
    pub fn new(config: RegimeConfig) -> Self {
        Simulation {
            config,
            registry: VesselRegistry::new(),
            history: FactorHistory::new(),
            years: Vec::new(),
        }
    }

    /// Run every year present in the landings, ascending.
    pub fn run(&mut self, landings: &[Landing]) -> Result<(), SimError> {
        let years: BTreeSet<i32> = landings.iter().map(|l| l.year).collect();
        for year in years {
            let rows: Vec<Landing> =
                landings.iter().filter(|l| l.year == year).cloned().collect();
            self.process_year(Year(year), &rows)?;
        }
        Ok(())
    }

    /// One year: group → load factors → allocate → simulate A then B →
    /// feedback update. The outcome is appended to `self.years`.
    pub fn process_year(&mut self, year: Year, rows: &[Landing]) -> Result<(), SimError> {
        let (mut fleet, events) = fleet::group_landings(year, rows, &mut self.registry)?;
        self.history.load_into(&mut fleet, &self.config);
        let alloc = allocation::allocate(&mut fleet, &self.config);
        let pool = self.simulate_year(&mut fleet, &events, &alloc);
        self.history.update(&mut fleet, &alloc, &self.config, &self.registry)?;

        let summary = self.build_summary(year, &fleet, &alloc, &pool);
        eprintln!(
            "{year} complete: {} vessels, {} used of {} distributed",
            fleet.vessels.len(),
            summary.credits_used.round(),
            summary.credits_distributed.round()
        );
        self.years.push(YearOutcome { year, fleet, allocation: alloc, pool, summary });
        Ok(())
    }

    fn simulate_year(
        &self,
        fleet: &mut Fleet,
        events: &[CatchEvent],
        alloc: &YearAllocation,
    ) -> CreditPool {
        for vessel in &mut fleet.vessels {
            vessel.credits = vessel.season(Season::A).init_credits as f64;
        }
        let mut pool = CreditPool::new();
        let mut stranding_rate = self.config.trading.initial_stranding_rate();
        let mut controller = StrandingController::new(alloc.ssr_day);

        let split = events
            .iter()
            .position(|e| e.day.0 >= fleet.b_start)
            .unwrap_or(events.len());
        let (a_events, b_events) = events.split_at(split);

        self.simulate_season(Season::A, a_events, fleet, &mut pool, &mut stranding_rate, None);

        // B influx: negative A balances are forgiven, not carried as debt.
        for vessel in &mut fleet.vessels {
            vessel.credits =
                vessel.credits.max(0.0) + vessel.season(Season::B).init_credits as f64;
        }

        self.simulate_season(
            Season::B,
            b_events,
            fleet,
            &mut pool,
            &mut stranding_rate,
            Some(&mut controller),
        );

        for vessel in &mut fleet.vessels {
            for season in Season::BOTH {
                let side = vessel.season_mut(season);
                side.uncaught_pollock = side.pollock - side.actual_pollock;
                side.actual_rate =
                    (side.actual_pollock > 0.0).then(|| side.actual_bycatch / side.actual_pollock);
            }
        }
        pool
    }

    /// Chronological replay of one season's events. Per vessel the season
    /// walks FISHING → (OUT_OF_CREDIT) → DONE; the out-of-credit mark only
    /// gates duplicate recording; a transfer can put the vessel back to
    /// work.
    fn simulate_season(
        &self,
        season: Season,
        events: &[CatchEvent],
        fleet: &mut Fleet,
        pool: &mut CreditPool,
        stranding_rate: &mut f64,
        mut controller: Option<&mut StrandingController>,
    ) {
        let si = season.index();
        let mut prev_day: Option<Day> = None;

        for (i, event) in events.iter().enumerate() {
            if let Some(ctl) = controller.as_deref_mut()
                && let TradingPolicy::DynamicSavings { stranding_limit } = &self.config.trading
                && let Some(rate) = ctl.on_day(event.day, fleet, pool, *stranding_limit)
            {
                *stranding_rate = rate;
                eprintln!("{}: stranding rate reset to {rate:.3}", fleet.year);
            }

            // The market clears once per distinct day, before that day's
            // hauls are charged.
            if prev_day != Some(event.day) {
                market::clear_day(fleet, &events[i..], event.day, season, pool, &self.config.trading);
                prev_day = Some(event.day);
            }

            let day = event.day.0;
            let vessel = fleet.vessel_mut(event.vessel);

            if vessel.credits > 0.0 {
                let needed = (vessel.seasons[si].cim * event.chinook).round();
                if needed > vessel.credits {
                    // Partial haul: only the affordable fraction of the
                    // pollock is credited, and the balance burns to zero.
                    let ratio = vessel.credits / needed;
                    vessel.seasons[si].actual_pollock += ratio * event.pollock;
                    vessel.seasons[si].actual_bycatch += vessel.credits;
                    vessel.credits = 0.0;
                } else {
                    vessel.seasons[si].actual_pollock += event.pollock;
                    vessel.seasons[si].actual_bycatch += needed;
                    vessel.credits -= needed;
                }
            }

            if !vessel.seasons[si].hit_limit
                && (vessel.credits < 0.0
                    || (vessel.credits == 0.0
                        && vessel.seasons[si].pollock > vessel.cum_pollock[day]))
            {
                vessel.seasons[si].out_day = Some(event.day);
                vessel.seasons[si].hit_limit = true;
            }

            if !vessel.seasons[si].done
                && vessel.cum_pollock[day] > vessel.seasons[si].pollock - COMPLETION_TOLERANCE
            {
                vessel.seasons[si].done = true;
                let unused = vessel.credits;
                let (available, held) =
                    self.config.trading.release_split(unused, *stranding_rate);
                pool.available += available;
                pool.held += held;
                vessel.credits = 0.0;
            }
        }
    }

    fn build_summary(
        &self,
        year: Year,
        fleet: &Fleet,
        alloc: &YearAllocation,
        pool: &CreditPool,
    ) -> AnnualSummary {
        let mut credits_distributed = 0.0;
        let mut credits_used = 0.0;
        for vessel in &fleet.vessels {
            for season in Season::BOTH {
                let side = vessel.season(season);
                if side.pollock > 0.0 {
                    credits_distributed += side.init_credits as f64;
                    credits_used += side.actual_bycatch;
                }
            }
        }
        AnnualSummary {
            year: year.0,
            target_level: self.config.annual_target(),
            credits_distributed,
            credits_used,
            credits_transferred: pool.transferred,
            credits_held: pool.held,
            original_bycatch: alloc.season_bycatch[0] + alloc.season_bycatch[1],
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::penalty::PenaltyCurve;

    fn landing(
        year: i32,
        month: u32,
        day: u32,
        vessel: &str,
        pollock: f64,
        chinook: f64,
    ) -> Landing {
        Landing {
            year,
            month,
            day,
            ticket: String::new(),
            vessel: vessel.to_string(),
            coop: "AKP".to_string(),
            pollock,
            chinook,
        }
    }

    fn config(target: f64, trading: TradingPolicy) -> RegimeConfig {
        RegimeConfig {
            hard_cap: target * 10.0,
            target_cap: target,
            season_frac: [1.0, 1.0],
            sector_frac: [1.0, 1.0],
            alpha: 1.0 / 3.0,
            beta: 1.0 / 3.0,
            gamma: 1.0 / 3.0,
            penalty: PenaltyCurve::Linear,
            delta: 1.0 / 3.0,
            epsilon: 4.0 / 3.0,
            trading,
            psi: 0.0,
        }
    }

    // ── End-to-end: single vessel, no trading ─────────────────────────────────

    /// Ten 100 t hauls at 150 chinook each against a 500-credit allocation:
    /// three full hauls, one rationed at a third, then nothing.
    #[test]
    fn single_vessel_rations_when_credits_run_out() {
        let rows: Vec<Landing> = (0..10)
            .map(|d| landing(2003, 2, 1 + d, "V1", 100.0, 150.0))
            .collect();
        let mut sim = Simulation::new(config(500.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();

        let outcome = &sim.years[0];
        let side = outcome.fleet.vessels[0].season(Season::A);
        assert_eq!(side.init_credits, 500);
        // 3 × 100 full + 100 × (50/150) rationed.
        assert!((side.actual_pollock - (300.0 + 100.0 * (50.0 / 150.0))).abs() < 1e-9);
        assert!((side.actual_bycatch - 500.0).abs() < 1e-9, "all credits burned");
        assert!(side.uncaught_pollock > 0.0, "rationing must strand pollock");
        assert_eq!(side.out_day, Some(Day(3)), "out of credit on the rationed haul");
        assert!(side.hit_limit);
        assert!(side.done, "season completes when the recorded schedule ends");
    }

    #[test]
    fn partial_haul_zeroes_the_balance_exactly() {
        let rows = vec![
            landing(2003, 2, 1, "V1", 100.0, 30.0),
            landing(2003, 2, 2, "V1", 100.0, 30.0),
        ];
        // 40 credits: day 1 takes 30, day 2 is a partial at ratio 10/30.
        let mut sim = Simulation::new(config(40.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();

        let side = sim.years[0].fleet.vessels[0].season(Season::A);
        assert!((side.actual_pollock - (100.0 + 100.0 * (10.0 / 30.0))).abs() < 1e-9);
        assert!((side.actual_bycatch - 40.0).abs() < 1e-9);
    }

    #[test]
    fn unconstrained_vessel_finishes_its_schedule() {
        let rows = vec![
            landing(2003, 2, 1, "V1", 100.0, 1.0),
            landing(2003, 2, 5, "V1", 200.0, 2.0),
        ];
        let mut sim = Simulation::new(config(10_000.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();

        let outcome = &sim.years[0];
        let side = outcome.fleet.vessels[0].season(Season::A);
        assert!((side.actual_pollock - 300.0).abs() < 1e-9);
        assert!(side.uncaught_pollock.abs() < 1e-9);
        assert_eq!(side.out_day, None);
        assert!(side.done);
        // Unused balance was released to the pool on completion.
        assert!(outcome.pool.available > 0.0);
        assert_eq!(outcome.fleet.vessels[0].credits, 0.0);
    }

    // ── Season split and B influx ─────────────────────────────────────────────

    #[test]
    fn b_season_gets_its_own_allocation() {
        let rows = vec![
            landing(2003, 2, 1, "V1", 100.0, 10.0),
            landing(2003, 7, 1, "V1", 200.0, 20.0),
        ];
        let mut sim = Simulation::new(config(900.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();

        let fleet = &sim.years[0].fleet;
        let a = fleet.vessels[0].season(Season::A);
        let b = fleet.vessels[0].season(Season::B);
        assert_eq!(a.init_credits, 900, "sole vessel takes the whole A budget");
        assert_eq!(b.init_credits, 900, "and separately the whole B budget");
        assert!((a.actual_pollock - 100.0).abs() < 1e-9);
        assert!((b.actual_pollock - 200.0).abs() < 1e-9);
        assert!(a.done && b.done);
    }

    #[test]
    fn a_and_b_rates_are_independent() {
        let rows = vec![
            landing(2003, 2, 1, "V1", 100.0, 10.0),
            landing(2003, 7, 1, "V1", 100.0, 40.0),
        ];
        let mut sim = Simulation::new(config(10_000.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();
        let fleet = &sim.years[0].fleet;
        let a = fleet.vessels[0].season(Season::A).actual_rate.unwrap();
        let b = fleet.vessels[0].season(Season::B).actual_rate.unwrap();
        assert!((a - 0.1).abs() < 1e-9);
        assert!((b - 0.4).abs() < 1e-9);
    }

    // ── Transfer market, end to end ───────────────────────────────────────────

    /// A donor finishes early; of two vessels short on the same later day,
    /// the cleaner one is made whole first.
    #[test]
    fn pool_credit_flows_to_the_cleanest_needy_vessel() {
        let rows = vec![
            // Donor: one clean haul, finished on day 0.
            landing(2003, 2, 1, "DONOR", 1000.0, 0.0),
            // Both fish cleanly on day 1, diverging rates.
            landing(2003, 2, 2, "CLEAN", 500.0, 1.0),
            landing(2003, 2, 2, "DIRTY", 500.0, 25.0),
            // Day 3: both want more than they have left.
            landing(2003, 2, 4, "CLEAN", 500.0, 60.0),
            landing(2003, 2, 4, "DIRTY", 500.0, 60.0),
        ];
        let mut sim = Simulation::new(config(
            120.0,
            TradingPolicy::DynamicSavings { stranding_limit: 0.0 },
        ));
        sim.run(&rows).unwrap();

        let fleet = &sim.years[0].fleet;
        let clean = fleet.vessels[1].season(Season::A);
        let dirty = fleet.vessels[2].season(Season::A);
        assert!(
            clean.actual_bycatch > dirty.actual_bycatch,
            "transfers must favor the cleaner vessel: {} vs {}",
            clean.actual_bycatch,
            dirty.actual_bycatch
        );
        assert!(sim.years[0].pool.transferred > 0.0);
    }

    #[test]
    fn no_trading_leaves_the_pool_untransferred() {
        let rows = vec![
            landing(2003, 2, 1, "DONOR", 1000.0, 0.0),
            landing(2003, 2, 2, "NEEDY", 500.0, 500.0),
        ];
        let mut sim = Simulation::new(config(200.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();
        assert_eq!(sim.years[0].pool.transferred, 0.0);
    }

    // ── Feedback across years ─────────────────────────────────────────────────

    #[test]
    fn dirty_vessel_loses_share_next_year() {
        let year = |y: i32| {
            vec![
                landing(y, 2, 1, "CLEAN", 1000.0, 5.0),
                landing(y, 2, 1, "DIRTY", 1000.0, 50.0),
            ]
        };
        let mut rows = year(2003);
        rows.extend(year(2004));
        let mut sim = Simulation::new(config(10_000.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();

        let y1 = &sim.years[0].fleet;
        let y2 = &sim.years[1].fleet;
        assert_eq!(
            y1.vessels[0].season(Season::A).init_credits,
            y1.vessels[1].season(Season::A).init_credits,
            "first year is factor-neutral"
        );
        assert!(
            y2.vessels[0].season(Season::A).init_credits
                > y2.vessels[1].season(Season::A).init_credits,
            "second year must tilt allocation toward the cleaner vessel"
        );
    }

    #[test]
    fn years_process_in_ascending_order_even_if_interleaved() {
        let rows = vec![
            landing(2004, 2, 1, "V1", 100.0, 1.0),
            landing(2003, 2, 1, "V1", 100.0, 1.0),
        ];
        let mut sim = Simulation::new(config(1000.0, TradingPolicy::NoTrading));
        sim.run(&rows).unwrap();
        let years: Vec<i32> = sim.years.iter().map(|o| o.year.0).collect();
        assert_eq!(years, vec![2003, 2004]);
    }

    // ── Conservation ──────────────────────────────────────────────────────────

    fn check_conservation(trading: TradingPolicy, rows: &[Landing]) {
        let mut sim = Simulation::new(config(500.0, trading.clone()));
        sim.run(rows).unwrap();
        for outcome in &sim.years {
            let summary = &outcome.summary;
            let balances: f64 = outcome.fleet.vessels.iter().map(|v| v.credits).sum();
            let lhs = summary.credits_distributed;
            let rhs =
                summary.credits_used + balances + outcome.pool.available + outcome.pool.held;
            assert!(
                (lhs - rhs).abs() < 1e-6,
                "conservation violated under {trading:?}: {lhs} != {rhs}"
            );
        }
    }

    proptest! {
        /// Distributed credits always equal used + balances + available +
        /// held, under every trading policy.
        #[test]
        fn credits_are_conserved(
            hauls in proptest::collection::vec(
                (0u32..2, 1u32..25, 10.0f64..500.0, 0.0f64..80.0),
                1..24,
            ),
            tax in 0.05f64..0.5,
            limit in 0.0f64..0.9,
        ) {
            // (vessel, day-in-window, pollock, chinook) → ordered landings
            // spanning the season boundary (window starts May 25).
            let mut rows: Vec<Landing> = hauls
                .iter()
                .map(|&(v, d, p, c)| {
                    let (month, day) = if d <= 6 { (5, 25 + d) } else { (6, d - 6) };
                    landing(2003, month, day, &format!("V{v}"), p, c)
                })
                .collect();
            rows.sort_by_key(|l| (l.month, l.day));

            check_conservation(TradingPolicy::NoTrading, &rows);
            check_conservation(TradingPolicy::FixedTax { tax_rate: tax }, &rows);
            check_conservation(
                TradingPolicy::DynamicSavings { stranding_limit: limit },
                &rows,
            );
        }

        /// Credited pollock never exceeds the recorded schedule, and the
        /// realized rate only exists when pollock was credited.
        #[test]
        fn actuals_never_exceed_plan(
            hauls in proptest::collection::vec(
                (0u32..3, 1u32..20, 10.0f64..300.0, 0.0f64..50.0),
                1..16,
            ),
        ) {
            let mut rows: Vec<Landing> = hauls
                .iter()
                .map(|&(v, d, p, c)| landing(2003, 3, d, &format!("V{v}"), p, c))
                .collect();
            rows.sort_by_key(|l| l.day);

            let mut sim = Simulation::new(config(300.0, TradingPolicy::NoTrading));
            sim.run(&rows).unwrap();
            for vessel in &sim.years[0].fleet.vessels {
                for season in Season::BOTH {
                    let side = vessel.season(season);
                    prop_assert!(side.actual_pollock <= side.pollock + 1e-9);
                    prop_assert!(side.uncaught_pollock >= -1e-9);
                    if side.actual_rate.is_some() {
                        prop_assert!(side.actual_pollock > 0.0);
                    }
                }
            }
        }
    }
}
